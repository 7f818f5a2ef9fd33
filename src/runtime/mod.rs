//! Model Runtime - load and run trained artifacts
//!
//! The registry and predictor only see these traits, so the
//! inference backend can be swapped (ONNX, test stubs, ...).

pub mod onnx;
#[cfg(test)]
pub mod stub;

use std::path::Path;
use std::sync::Arc;

pub use onnx::OnnxRuntime;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to load model: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// A loaded, ready-to-run model
pub trait Model: Send + Sync {
    /// Static width of the input row, if the artifact declares one
    fn input_width(&self) -> Option<usize>;

    /// Run the model on a single input row, returning the flattened output
    fn infer(&self, input: &[f32]) -> Result<Vec<f32>, RuntimeError>;
}

/// Backend able to turn an artifact on disk into a [`Model`]
pub trait ModelRuntime: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<dyn Model>, RuntimeError>;

    /// Short backend name for status reporting
    fn name(&self) -> &'static str;
}
