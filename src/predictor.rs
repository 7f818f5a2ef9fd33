//! Predictor - request handling independent of the HTTP layer
//!
//! Validates the lag, fetches the model, builds the input row,
//! runs inference and shapes the output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::config::Config;
use crate::models::{shape_output, LagPolicy, OutputLength, PlaceholderInput};
use crate::registry::ModelRegistry;
use crate::{AppError, AppResult};

/// Engine status for `/models`
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    /// `None` when any positive lag is accepted
    pub allowed_lags: Option<Vec<i64>>,
    pub cached_lags: Vec<i64>,
    pub cache_capacity: Option<usize>,
    pub loads: u64,
    pub cache_hits: u64,
    pub inference_count: u64,
    pub avg_latency_ms: f32,
    /// `None` when raw model output is returned
    pub output_length: Option<usize>,
    pub placeholder_input: &'static str,
    pub runtime: &'static str,
}

pub struct Predictor {
    registry: ModelRegistry,
    lag_policy: LagPolicy,
    output_length: OutputLength,
    placeholder: PlaceholderInput,
    inference_count: AtomicU64,
    latency_sum_us: AtomicU64,
}

impl Predictor {
    pub fn new(
        registry: ModelRegistry,
        lag_policy: LagPolicy,
        output_length: OutputLength,
        placeholder: PlaceholderInput,
    ) -> Self {
        Self {
            registry,
            lag_policy,
            output_length,
            placeholder,
            inference_count: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config, registry: ModelRegistry) -> Self {
        Self::new(
            registry,
            config.lag_policy.clone(),
            config.output_length,
            config.placeholder,
        )
    }

    /// Run a prediction for `lag`.
    ///
    /// Explicit `features` must hold exactly `lag` values. Without them a
    /// placeholder row is synthesized.
    pub fn predict(&self, lag: i64, features: Option<Vec<f32>>) -> AppResult<Vec<f32>> {
        let width = self.validate_lag(lag)?;

        if let Some(features) = &features {
            if features.len() != width {
                return Err(AppError::ValidationError(format!(
                    "'features' must contain exactly lag ({}) values, got {}",
                    lag,
                    features.len()
                )));
            }
        }

        let model = self.registry.get_model(lag)?;

        let input = match features {
            Some(features) => features,
            None => self.placeholder.build(width, model.input_width()),
        };

        let start = Instant::now();
        let raw = model.infer(&input)?;
        let elapsed_us = start.elapsed().as_micros() as u64;

        self.latency_sum_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "lag={} inference took {}us, raw output len {}",
            lag,
            elapsed_us,
            raw.len()
        );

        Ok(shape_output(raw, self.output_length))
    }

    /// Check `lag` against the policy, returning it as a row width
    fn validate_lag(&self, lag: i64) -> AppResult<usize> {
        if !self.lag_policy.permits(lag) {
            return Err(AppError::ValidationError(format!(
                "'lag' must be {}, got {}",
                self.lag_policy.describe(),
                lag
            )));
        }

        usize::try_from(lag)
            .map_err(|_| AppError::ValidationError(format!("'lag' out of range: {}", lag)))
    }

    pub fn status(&self) -> EngineStatus {
        let registry = self.registry.snapshot();
        let count = self.inference_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        EngineStatus {
            allowed_lags: self.lag_policy.allowed(),
            cached_lags: registry.cached_lags,
            cache_capacity: registry.capacity,
            loads: registry.loads,
            cache_hits: registry.hits,
            inference_count: count,
            avg_latency_ms: avg,
            output_length: match self.output_length {
                OutputLength::Fixed(n) => Some(n),
                OutputLength::Raw => None,
            },
            placeholder_input: self.placeholder.as_str(),
            runtime: self.registry.runtime_name(),
        }
    }
}
