use async_trait::async_trait;
use aws_sdk_s3::Client;
use log::debug;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Read-only view of an object store, enough to fetch model artifacts.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

#[derive(Clone)]
pub struct S3Service {
    client: Client,
    bucket_name: String,
}

impl S3Service {
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }
}

#[async_trait]
impl BlobStore for S3Service {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| StorageError::S3(e.to_string()))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match page.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(
            "Listed {} objects under s3://{}/{}",
            keys.len(),
            self.bucket_name,
            prefix
        );
        Ok(keys)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.as_service_error();
                if service_error.is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3(e.to_string())
                }
            })?;

        let body = result
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;
        Ok(body.into_bytes().to_vec())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub struct MemoryBlobStore {
        objects: BTreeMap<String, Vec<u8>>,
    }

    impl MemoryBlobStore {
        pub fn with_object(mut self, key: &str, data: impl Into<Vec<u8>>) -> Self {
            self.objects.insert(key.to_string(), data.into());
            self
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        fn bucket(&self) -> &str {
            "memory"
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
            Ok(self
                .objects
                .keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(key.to_string()))
        }
    }
}
