use shared::PredictionResult;
use std::sync::Arc;

use crate::inference::loader::ModelArtifacts;
use crate::inference::preprocess::ImageTensor;

pub const DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[cfg(feature = "torch")]
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),
    #[cfg(any(feature = "torch", test))]
    #[error("Input tensor has shape {actual:?}, expected {expected:?}")]
    InvalidInput {
        actual: Vec<usize>,
        expected: [usize; 4],
    },
    #[cfg(any(feature = "torch", test))]
    #[error("Model produced no output")]
    EmptyOutput,
    #[cfg(feature = "torch")]
    #[error("Failed to read model weights: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "torch")]
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),
    #[cfg(feature = "torch")]
    #[error("Model lock poisoned")]
    Poisoned,
    #[cfg(not(feature = "torch"))]
    #[error("Binary was built without an inference backend")]
    BackendUnavailable,
}

/// Binary classifier returning the raw score of the positive class.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<f32, ModelError>;
}

pub fn classify(score: f32) -> PredictionResult {
    if score > DECISION_THRESHOLD {
        PredictionResult::Cancer
    } else {
        PredictionResult::NonCancer
    }
}

#[cfg(any(feature = "torch", test))]
pub fn check_input(input: &ImageTensor) -> Result<(), ModelError> {
    if input.has_expected_shape() {
        Ok(())
    } else {
        Err(ModelError::InvalidInput {
            actual: input.shape().to_vec(),
            expected: ImageTensor::expected_shape(),
        })
    }
}

#[cfg(feature = "torch")]
pub fn load_classifier(artifacts: &ModelArtifacts) -> Result<Arc<dyn Classifier>, ModelError> {
    let model = crate::inference::torch::TorchClassifier::from_artifacts(artifacts)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "torch"))]
pub fn load_classifier(artifacts: &ModelArtifacts) -> Result<Arc<dyn Classifier>, ModelError> {
    log::error!(
        "Cannot load {} ({:?}, {} shards): enable the `torch` feature",
        artifacts.manifest_path.display(),
        artifacts.manifest.format,
        artifacts.shard_paths.len()
    );
    Err(ModelError::BackendUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(classify(0.5), PredictionResult::NonCancer);
        assert_eq!(classify(0.500_000_1), PredictionResult::Cancer);
        assert_eq!(classify(0.0), PredictionResult::NonCancer);
        assert_eq!(classify(0.99), PredictionResult::Cancer);
    }

    #[test]
    fn rejects_malformed_input() {
        let bad = ImageTensor::from(Array4::<f32>::zeros((1, 3, 224, 224)));
        let err = check_input(&bad).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput { .. }));

        let good = ImageTensor::from(Array4::<f32>::zeros((1, 224, 224, 3)));
        assert!(check_input(&good).is_ok());
    }

    #[cfg(not(feature = "torch"))]
    #[test]
    fn no_backend_refuses_to_load() {
        use crate::inference::loader::{ModelManifest, WeightGroup};

        let artifacts = ModelArtifacts {
            manifest: ModelManifest {
                format: Some("torchscript".into()),
                generated_by: None,
                weights_manifest: vec![WeightGroup {
                    paths: vec!["weights.bin".into()],
                }],
            },
            manifest_path: "model/model.json".into(),
            shard_paths: vec!["model/weights.bin".into()],
        };
        assert!(matches!(
            load_classifier(&artifacts),
            Err(ModelError::BackendUnavailable)
        ));
    }
}
