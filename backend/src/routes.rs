use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use log::{debug, error, info};
use shared::PredictResponse;

use crate::ddb::model::PredictionRecord;
use crate::ddb::prediction_store::PredictionStore;
use crate::error::PredictError;
use crate::inference::model::{Classifier, classify};
use crate::inference::preprocess::preprocess;
use crate::upload::{UploadLimits, read_image_field};

#[derive(Debug, Clone, Copy)]
enum Stage {
    Validating,
    Preprocessing,
    Predicting,
    Persisting,
    Responding,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(handle_predict)));
}

async fn handle_predict(
    classifier: web::Data<dyn Classifier>,
    store: web::Data<dyn PredictionStore>,
    limits: web::Data<UploadLimits>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    run_prediction(classifier, store, *limits.get_ref(), payload)
        .await
        .map_err(|e| {
            error!("Prediction error ({:?}): {}", e.kind(), e);
            e
        })
}

async fn run_prediction(
    classifier: web::Data<dyn Classifier>,
    store: web::Data<dyn PredictionStore>,
    limits: UploadLimits,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    debug!("predict stage: {:?}", Stage::Validating);
    let upload = read_image_field(payload, limits)
        .await?
        .ok_or(PredictError::MissingImage)?;
    info!(
        "Predicting {} ({} bytes, {})",
        upload.file_name,
        upload.bytes.len(),
        upload.content_type.as_deref().unwrap_or("unknown type")
    );

    let classifier = classifier.into_inner();
    let score = web::block(move || -> Result<f32, PredictError> {
        debug!("predict stage: {:?}", Stage::Preprocessing);
        let tensor = preprocess(&upload.bytes)?;
        debug!("predict stage: {:?}", Stage::Predicting);
        Ok(classifier.predict(&tensor)?)
    })
    .await
    .map_err(|e| PredictError::Blocking(e.to_string()))??;

    let result = classify(score);
    let record = PredictionRecord::new(result);
    debug!("Score {} classified as {}", score, result);

    debug!("predict stage: {:?}", Stage::Persisting);
    store.save(&record).await?;

    debug!("predict stage: {:?}", Stage::Responding);
    Ok(HttpResponse::Ok().json(PredictResponse::success(record.into())))
}
