//! ONNX Runtime backend for YOLO-style detectors.

use std::path::Path;

use crate::engine::{EngineError, Result};
use crate::types::VideoEngineConfig;

/// Input tensor name of YOLOv8 exports
pub const INPUT_NAME: &str = "images";
/// Output tensor name of YOLOv8 exports
pub const OUTPUT_NAME: &str = "output0";

/// Raw model output: flat values plus their shape.
pub struct RawOutput {
    pub values: Vec<f32>,
    pub shape: Vec<usize>,
}

#[cfg(feature = "onnx")]
pub use imp::OnnxBackend;

#[cfg(not(feature = "onnx"))]
pub use stub::OnnxBackend;

fn check_model_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EngineError::ModelLoad("no model path configured".to_string()));
    }
    if !Path::new(path).exists() {
        return Err(EngineError::ModelLoad(format!("model file not found: {path}")));
    }
    Ok(())
}

#[cfg(feature = "onnx")]
mod imp {
    use ndarray::Array4;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use tracing::info;

    use super::*;

    pub struct OnnxBackend {
        session: Session,
    }

    impl OnnxBackend {
        pub fn load(config: &VideoEngineConfig) -> Result<Self> {
            check_model_path(&config.model_path)?;
            info!("Loading detector model from {}", config.model_path);

            let mut builder = Session::builder()
                .map_err(|e| EngineError::ModelLoad(e.to_string()))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| EngineError::ModelLoad(e.to_string()))?;

            if config.num_threads > 0 {
                builder = builder
                    .with_intra_threads(config.num_threads as usize)
                    .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
            }

            let session = builder
                .commit_from_file(&config.model_path)
                .map_err(|e| EngineError::ModelLoad(e.to_string()))?;

            info!("Detector model loaded");
            Ok(Self { session })
        }

        /// Run the model on a planar `[1, 3, height, width]` input.
        pub fn infer(&self, input: &[f32], width: u32, height: u32) -> Result<RawOutput> {
            let input = Array4::from_shape_vec((1, 3, height as usize, width as usize), input.to_vec())
                .map_err(|e| EngineError::Inference(format!("failed to create input tensor: {e}")))?;

            let outputs = self
                .session
                .run(
                    ort::inputs! {
                        INPUT_NAME => input,
                    }
                    .map_err(|e| EngineError::Inference(e.to_string()))?,
                )
                .map_err(|e| EngineError::Inference(e.to_string()))?;

            let output = outputs
                .get(OUTPUT_NAME)
                .ok_or_else(|| EngineError::Inference(format!("model has no {OUTPUT_NAME} output")))?;

            let output: ndarray::ArrayViewD<f32> = output
                .try_extract_tensor()
                .map_err(|e| EngineError::Inference(e.to_string()))?;

            Ok(RawOutput {
                shape: output.shape().to_vec(),
                values: output.iter().copied().collect(),
            })
        }
    }
}

#[cfg(not(feature = "onnx"))]
mod stub {
    use super::*;

    pub struct OnnxBackend;

    impl OnnxBackend {
        pub fn load(config: &VideoEngineConfig) -> Result<Self> {
            check_model_path(&config.model_path)?;
            Err(EngineError::BackendUnavailable)
        }

        pub fn infer(&self, _input: &[f32], _width: u32, _height: u32) -> Result<RawOutput> {
            Err(EngineError::BackendUnavailable)
        }
    }
}
