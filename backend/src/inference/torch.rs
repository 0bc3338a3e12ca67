use log::info;
use std::io::Cursor;
use std::sync::Mutex;
use tch::{CModule, Device, Kind, Tensor};

use crate::inference::loader::ModelArtifacts;
use crate::inference::model::{Classifier, ModelError, check_input};
use crate::inference::preprocess::ImageTensor;

const TORCHSCRIPT_FORMAT: &str = "torchscript";

pub struct TorchClassifier {
    module: Mutex<CModule>,
    device: Device,
}

impl TorchClassifier {
    pub fn from_artifacts(artifacts: &ModelArtifacts) -> Result<Self, ModelError> {
        if let Some(format) = artifacts.manifest.format.as_deref() {
            if format != TORCHSCRIPT_FORMAT {
                return Err(ModelError::UnsupportedFormat(format.to_string()));
            }
        }

        let device = Device::cuda_if_available();
        let weights = artifacts.read_weights()?;
        let mut module = CModule::load_data_on_device(&mut Cursor::new(weights), device)?;
        module.set_eval();
        info!(
            "Loaded TorchScript model from {} on {:?}",
            artifacts.manifest_path.display(),
            device
        );

        Ok(Self {
            module: Mutex::new(module),
            device,
        })
    }
}

impl Classifier for TorchClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<f32, ModelError> {
        check_input(input)?;
        let data: Vec<f32> = input.as_array().iter().copied().collect();
        let shape: Vec<i64> = input.shape().iter().map(|d| *d as i64).collect();
        let tensor = Tensor::from_slice(&data).view(shape.as_slice()).to_device(self.device);

        let output = {
            let module = self.module.lock().map_err(|_| ModelError::Poisoned)?;
            tch::no_grad(|| module.forward_ts(&[tensor]))?
        };

        let output_flat = output.to_kind(Kind::Float).view([-1]);
        if output_flat.numel() == 0 {
            return Err(ModelError::EmptyOutput);
        }
        Ok(output_flat.double_value(&[0]) as f32)
    }
}
