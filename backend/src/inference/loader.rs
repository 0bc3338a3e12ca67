use log::{debug, info};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

use crate::storage::s3_service::{BlobStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Model not found in bucket {bucket} under prefix {prefix}")]
    ManifestNotFound { bucket: String, prefix: String },
    #[error("Invalid model manifest: {0}")]
    InvalidManifest(#[from] serde_json::Error),
    #[error("Manifest lists no weight files")]
    NoWeights,
    #[error("Invalid weight shard path: {0}")]
    InvalidShardPath(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelManifest {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub generated_by: Option<String>,
    pub weights_manifest: Vec<WeightGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightGroup {
    pub paths: Vec<String>,
}

impl ModelManifest {
    pub fn shard_paths(&self) -> impl Iterator<Item = &str> {
        self.weights_manifest
            .iter()
            .flat_map(|group| group.paths.iter().map(String::as_str))
    }
}

/// Manifest and shards as they sit on local disk after a fetch.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub manifest: ModelManifest,
    pub manifest_path: PathBuf,
    pub shard_paths: Vec<PathBuf>,
}

impl ModelArtifacts {
    /// Shards concatenated in manifest order.
    #[cfg(any(feature = "torch", test))]
    pub fn read_weights(&self) -> std::io::Result<Vec<u8>> {
        let mut weights = Vec::new();
        for path in &self.shard_paths {
            weights.extend(std::fs::read(path)?);
        }
        Ok(weights)
    }
}

pub struct ModelLoader<'a> {
    store: &'a dyn BlobStore,
    prefix: &'a str,
    manifest_name: &'a str,
    local_dir: &'a Path,
}

impl<'a> ModelLoader<'a> {
    pub fn new(
        store: &'a dyn BlobStore,
        prefix: &'a str,
        manifest_name: &'a str,
        local_dir: &'a Path,
    ) -> Self {
        Self {
            store,
            prefix,
            manifest_name,
            local_dir,
        }
    }

    pub async fn fetch(&self) -> Result<ModelArtifacts, LoaderError> {
        let keys = self.store.list_keys(self.prefix).await?;
        let manifest_key = keys
            .iter()
            .find(|key| key.ends_with(self.manifest_name))
            .ok_or_else(|| LoaderError::ManifestNotFound {
                bucket: self.store.bucket().to_string(),
                prefix: self.prefix.to_string(),
            })?;
        info!(
            "Downloading model manifest s3://{}/{}",
            self.store.bucket(),
            manifest_key
        );

        tokio::fs::create_dir_all(self.local_dir).await?;

        let manifest_bytes = self.store.get_object(manifest_key).await?;
        let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)?;
        debug!(
            "Manifest format {:?}, generated by {:?}",
            manifest.format, manifest.generated_by
        );
        let manifest_path = self.local_dir.join(self.manifest_name);
        tokio::fs::write(&manifest_path, &manifest_bytes).await?;

        let key_dir = match manifest_key.rfind('/') {
            Some(idx) => &manifest_key[..=idx],
            None => "",
        };

        let mut shard_paths = Vec::new();
        for shard in manifest.shard_paths() {
            let relative = validate_shard_path(shard)?;
            let key = format!("{}{}", key_dir, shard);
            debug!("Downloading weight shard {}", key);
            let data = self.store.get_object(&key).await?;

            let local = self.local_dir.join(relative);
            if let Some(parent) = local.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&local, &data).await?;
            shard_paths.push(local);
        }

        if shard_paths.is_empty() {
            return Err(LoaderError::NoWeights);
        }

        info!(
            "Model artifacts stored in {} ({} shards)",
            self.local_dir.display(),
            shard_paths.len()
        );
        Ok(ModelArtifacts {
            manifest,
            manifest_path,
            shard_paths,
        })
    }
}

fn validate_shard_path(shard: &str) -> Result<&Path, LoaderError> {
    let path = Path::new(shard);
    let only_normal = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if shard.is_empty() || !only_normal {
        return Err(LoaderError::InvalidShardPath(shard.to_string()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::s3_service::memory::MemoryBlobStore;

    const MANIFEST: &str = r#"{
        "format": "torchscript",
        "generatedBy": "export.py",
        "weightsManifest": [
            {"paths": ["group1-shard1of2.bin", "group1-shard2of2.bin"]}
        ]
    }"#;

    #[actix_web::test]
    async fn downloads_manifest_and_shards() {
        let store = MemoryBlobStore::default()
            .with_object("model/model.json", MANIFEST)
            .with_object("model/group1-shard1of2.bin", b"abc".to_vec())
            .with_object("model/group1-shard2of2.bin", b"def".to_vec())
            .with_object("other/model.json", "{}");
        let dir = tempfile::tempdir().unwrap();

        let artifacts = ModelLoader::new(&store, "model/", "model.json", dir.path())
            .fetch()
            .await
            .unwrap();

        assert_eq!(artifacts.manifest.format.as_deref(), Some("torchscript"));
        assert_eq!(artifacts.manifest.generated_by.as_deref(), Some("export.py"));
        assert_eq!(artifacts.manifest_path, dir.path().join("model.json"));
        assert!(artifacts.manifest_path.exists());
        assert_eq!(artifacts.shard_paths.len(), 2);
        assert_eq!(artifacts.read_weights().unwrap(), b"abcdef");
    }

    #[actix_web::test]
    async fn resolves_shards_next_to_nested_manifest() {
        let store = MemoryBlobStore::default()
            .with_object(
                "model/v2/model.json",
                r#"{"weightsManifest":[{"paths":["weights.bin"]}]}"#,
            )
            .with_object("model/v2/weights.bin", b"w".to_vec());
        let dir = tempfile::tempdir().unwrap();

        let artifacts = ModelLoader::new(&store, "model/", "model.json", dir.path())
            .fetch()
            .await
            .unwrap();

        assert!(artifacts.manifest.format.is_none());
        assert_eq!(artifacts.shard_paths, vec![dir.path().join("weights.bin")]);
    }

    #[actix_web::test]
    async fn missing_manifest_is_reported() {
        let store = MemoryBlobStore::default().with_object("model/weights.bin", b"w".to_vec());
        let dir = tempfile::tempdir().unwrap();

        let err = ModelLoader::new(&store, "model/", "model.json", dir.path())
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::ManifestNotFound { .. }));
        assert_eq!(
            err.to_string(),
            "Model not found in bucket memory under prefix model/"
        );
    }

    #[actix_web::test]
    async fn missing_shard_propagates_storage_error() {
        let store = MemoryBlobStore::default().with_object("model/model.json", MANIFEST);
        let dir = tempfile::tempdir().unwrap();

        let err = ModelLoader::new(&store, "model/", "model.json", dir.path())
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::Storage(StorageError::NotFound(_))));
    }

    #[actix_web::test]
    async fn rejects_escaping_shard_paths() {
        let store = MemoryBlobStore::default().with_object(
            "model/model.json",
            r#"{"weightsManifest":[{"paths":["../secrets.bin"]}]}"#,
        );
        let dir = tempfile::tempdir().unwrap();

        let err = ModelLoader::new(&store, "model/", "model.json", dir.path())
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::InvalidShardPath(_)));
    }

    #[actix_web::test]
    async fn manifest_without_weights_fails() {
        let store = MemoryBlobStore::default()
            .with_object("model/model.json", r#"{"weightsManifest":[]}"#);
        let dir = tempfile::tempdir().unwrap();

        let err = ModelLoader::new(&store, "model/", "model.json", dir.path())
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::NoWeights));
    }

    #[actix_web::test]
    async fn malformed_manifest_fails() {
        let store = MemoryBlobStore::default().with_object("model/model.json", "not json");
        let dir = tempfile::tempdir().unwrap();

        let err = ModelLoader::new(&store, "model/", "model.json", dir.path())
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::InvalidManifest(_)));
    }
}
