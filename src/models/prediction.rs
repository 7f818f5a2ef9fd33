//! Prediction request/response models and input/output shaping

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub lag: i64,
    /// Last `lag` observations; a placeholder input is used when absent
    #[serde(default)]
    pub features: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionResponse {
    pub predictions: Vec<f32>,
}

/// How many values a prediction response carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLength {
    /// Truncate or zero-pad to exactly `n` values
    Fixed(usize),
    /// Return whatever the model produced
    Raw,
}

/// Input synthesized when a request does not carry features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderInput {
    /// Zeros sized to the model's declared input width
    Zeros,
    /// Uniform [0, 1) values sized to the lag. Not reproducible.
    Random,
}

impl PlaceholderInput {
    /// Build the placeholder row.
    ///
    /// `model_width` is the model's static input width when it declares one.
    pub fn build(self, lag: usize, model_width: Option<usize>) -> Vec<f32> {
        match self {
            PlaceholderInput::Zeros => vec![0.0; model_width.unwrap_or(lag)],
            PlaceholderInput::Random => {
                let mut rng = rand::thread_rng();
                (0..lag).map(|_| rng.gen::<f32>()).collect()
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderInput::Zeros => "zeros",
            PlaceholderInput::Random => "random",
        }
    }
}

/// Flatten raw model output to the configured length
pub fn shape_output(raw: Vec<f32>, length: OutputLength) -> Vec<f32> {
    match length {
        OutputLength::Raw => raw,
        OutputLength::Fixed(n) => {
            let mut out = raw;
            out.resize(n, 0.0);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_output_is_zero_padded() {
        let out = shape_output(vec![0.1, 0.2, 0.3], OutputLength::Fixed(7));
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_long_output_is_truncated() {
        let raw: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let out = shape_output(raw, OutputLength::Fixed(7));
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_raw_output_untouched() {
        let raw = vec![1.5; 10];
        assert_eq!(shape_output(raw.clone(), OutputLength::Raw), raw);
    }

    #[test]
    fn test_zero_placeholder_prefers_model_width() {
        assert_eq!(PlaceholderInput::Zeros.build(7, Some(3)), vec![0.0; 3]);
        assert_eq!(PlaceholderInput::Zeros.build(7, None), vec![0.0; 7]);
    }

    #[test]
    fn test_random_placeholder_sized_to_lag() {
        let row = PlaceholderInput::Random.build(14, Some(3));
        assert_eq!(row.len(), 14);
        assert!(row.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_request_features_optional() {
        let req: PredictRequest = serde_json::from_str(r#"{"lag": 7}"#).unwrap();
        assert_eq!(req.lag, 7);
        assert!(req.features.is_none());

        let req: PredictRequest =
            serde_json::from_str(r#"{"lag": 3, "features": [1.0, 2.0, 3.0]}"#).unwrap();
        assert_eq!(req.features, Some(vec![1.0, 2.0, 3.0]));
    }
}
