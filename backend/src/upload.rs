use actix_multipart::{Multipart, MultipartError};
use futures::{StreamExt, TryStreamExt};
use log::debug;

pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Payload content length greater than maximum allowed: {limit}")]
    TooLarge { limit: usize },
    #[error("Malformed multipart payload: {0}")]
    Multipart(String),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Multipart(err.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_image_bytes: usize,
}

#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Returns the first file sent under `image`, or `None` if there is none
/// (including when the body is not multipart). Other fields are drained and ignored.
pub async fn read_image_field(
    mut payload: Multipart,
    limits: UploadLimits,
) -> Result<Option<ImageUpload>, UploadError> {
    let mut upload = None;
    let mut first_read = true;

    loop {
        let next = match payload.try_next().await {
            Ok(next) => next,
            // A body that is not multipart at all carries no file.
            Err(MultipartError::ContentTypeMissing | MultipartError::ContentTypeIncompatible)
                if first_read =>
            {
                debug!("Request is not multipart/form-data, no image attached");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        first_read = false;
        let Some(mut field) = next else { break };

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let is_image = upload.is_none() && field.name() == Some(IMAGE_FIELD);

        let file_name = match file_name {
            Some(name) if is_image => name,
            _ => {
                debug!("Skipping multipart field {:?}", field.name());
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
                continue;
            }
        };

        let content_type = field.content_type().map(|mime| mime.to_string());
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            if bytes.len() + data.len() > limits.max_image_bytes {
                return Err(UploadError::TooLarge {
                    limit: limits.max_image_bytes,
                });
            }
            bytes.extend_from_slice(&data);
        }

        debug!("Received upload {} ({} bytes)", file_name, bytes.len());
        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    Ok(upload)
}
