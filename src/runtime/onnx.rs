//! ONNX Runtime backend
//!
//! Loads exported artifacts with `ort` and runs them on CPU.

use std::path::Path;
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use parking_lot::Mutex;

use super::{Model, ModelRuntime, RuntimeError};

/// Rank assumed when the artifact does not declare its input shape
const DEFAULT_INPUT_RANK: usize = 2;

#[derive(Debug, Default, Clone)]
pub struct OnnxRuntime;

impl OnnxRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl ModelRuntime for OnnxRuntime {
    fn load(&self, path: &Path) -> Result<Arc<dyn Model>, RuntimeError> {
        tracing::info!("Loading ONNX model from: {}", path.display());

        let session = Session::builder()
            .map_err(|e| RuntimeError::Load(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RuntimeError::Load(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| RuntimeError::Load(format!("Failed to load model: {}", e)))?;

        let declared: Option<Vec<i64>> = session.inputs.first().and_then(|input| {
            match &input.input_type {
                ValueType::Tensor { shape, .. } => Some(shape.to_vec()),
                _ => None,
            }
        });

        let input_rank = declared
            .as_ref()
            .map(|dims| dims.len())
            .filter(|rank| *rank > 0)
            .unwrap_or(DEFAULT_INPUT_RANK);

        // Dynamic dimensions are reported as -1
        let input_width = declared
            .as_ref()
            .and_then(|dims| dims.last().copied())
            .filter(|width| *width > 0)
            .map(|width| width as usize);

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| RuntimeError::Load("No output defined".to_string()))?;

        tracing::debug!(
            "ONNX model ready: rank={}, width={:?}, output={}",
            input_rank,
            input_width,
            output_name
        );

        Ok(Arc::new(OnnxModel {
            session: Mutex::new(session),
            input_rank,
            input_width,
            output_name,
        }))
    }

    fn name(&self) -> &'static str {
        "ONNX Runtime (CPU)"
    }
}

/// Loaded ONNX session. `Session::run` needs `&mut`, hence the lock.
pub struct OnnxModel {
    session: Mutex<Session>,
    input_rank: usize,
    input_width: Option<usize>,
    output_name: String,
}

impl OnnxModel {
    /// Shape of a single row: `[1, .., 1, len]` at the declared rank
    fn row_shape(&self, len: usize) -> Vec<usize> {
        let mut shape = vec![1; self.input_rank];
        if let Some(last) = shape.last_mut() {
            *last = len;
        }
        shape
    }
}

impl Model for OnnxModel {
    fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    fn infer(&self, input: &[f32]) -> Result<Vec<f32>, RuntimeError> {
        let array = ArrayD::<f32>::from_shape_vec(IxDyn(&self.row_shape(input.len())), input.to_vec())
            .map_err(|e| RuntimeError::Inference(format!("Array error: {}", e)))?;

        let tensor = Tensor::from_array(array)
            .map_err(|e| RuntimeError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| RuntimeError::Inference(e.to_string()))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| RuntimeError::Inference("No output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| RuntimeError::Inference(format!("Extract error: {}", e)))?;

        Ok(data.to_vec())
    }
}
