//! Scripted runtime for tests

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Model, ModelRuntime, RuntimeError};

/// Runtime that records every load and hands out [`StubModel`]s
#[derive(Default)]
pub struct StubRuntime {
    loads: AtomicUsize,
    loaded_paths: Mutex<Vec<PathBuf>>,
    output: Vec<f32>,
    input_width: Option<usize>,
    fail_load: Option<String>,
    fail_infer: Option<String>,
    load_delay: Option<Duration>,
    last_input: Arc<Mutex<Option<Vec<f32>>>>,
}

impl StubRuntime {
    pub fn returning(output: Vec<f32>) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    pub fn with_input_width(mut self, width: usize) -> Self {
        self.input_width = Some(width);
        self
    }

    pub fn failing_load(mut self, message: &str) -> Self {
        self.fail_load = Some(message.to_string());
        self
    }

    pub fn failing_infer(mut self, message: &str) -> Self {
        self.fail_infer = Some(message.to_string());
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.loaded_paths.lock().clone()
    }

    /// Input row seen by the most recent `infer` call
    pub fn last_input(&self) -> Option<Vec<f32>> {
        self.last_input.lock().clone()
    }
}

impl ModelRuntime for StubRuntime {
    fn load(&self, path: &Path) -> Result<Arc<dyn Model>, RuntimeError> {
        if let Some(delay) = self.load_delay {
            std::thread::sleep(delay);
        }
        if let Some(message) = &self.fail_load {
            return Err(RuntimeError::Load(message.clone()));
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        self.loaded_paths.lock().push(path.to_path_buf());

        Ok(Arc::new(StubModel {
            output: self.output.clone(),
            input_width: self.input_width,
            fail_infer: self.fail_infer.clone(),
            last_input: Arc::clone(&self.last_input),
        }))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub struct StubModel {
    output: Vec<f32>,
    input_width: Option<usize>,
    fail_infer: Option<String>,
    last_input: Arc<Mutex<Option<Vec<f32>>>>,
}

impl Model for StubModel {
    fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    fn infer(&self, input: &[f32]) -> Result<Vec<f32>, RuntimeError> {
        *self.last_input.lock() = Some(input.to_vec());
        match &self.fail_infer {
            Some(message) => Err(RuntimeError::Inference(message.clone())),
            None => Ok(self.output.clone()),
        }
    }
}
