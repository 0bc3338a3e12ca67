use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::FailResponse;

use crate::ddb::prediction_store::StoreError;
use crate::inference::model::ModelError;
use crate::inference::preprocess::PreprocessError;
use crate::upload::UploadError;

pub const MISSING_IMAGE_MESSAGE: &str = "Tidak ada gambar yang diunggah";
pub const PREDICTION_FAILED_MESSAGE: &str = "Terjadi kesalahan dalam melakukan prediksi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    PayloadTooLarge,
    Upstream,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("No image was uploaded")]
    MissingImage,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Blocking task failed: {0}")]
    Blocking(String),
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::MissingImage => ErrorKind::Validation,
            PredictError::Upload(UploadError::TooLarge { .. }) => ErrorKind::PayloadTooLarge,
            PredictError::Upload(UploadError::Multipart(_)) => ErrorKind::Validation,
            PredictError::Preprocess(_) => ErrorKind::Validation,
            PredictError::Store(_) => ErrorKind::Upstream,
            PredictError::Model(_) | PredictError::Blocking(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            PredictError::MissingImage => MISSING_IMAGE_MESSAGE.to_string(),
            PredictError::Upload(err @ UploadError::TooLarge { .. }) => err.to_string(),
            _ => PREDICTION_FAILED_MESSAGE.to_string(),
        }
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(FailResponse::new(self.public_message()))
    }
}
