//! Configuration module

use std::collections::BTreeSet;
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::models::{LagPolicy, OutputLength, PlaceholderInput};

/// Lags served when `ALLOWED_LAGS` is not set
pub const DEFAULT_ALLOWED_LAGS: [i64; 4] = [7, 14, 21, 28];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Root directory holding `lag_<L>/` artifact folders
    pub models_dir: PathBuf,

    /// Artifact file extension (without the dot)
    pub model_extension: String,

    /// Which lags may be requested
    pub lag_policy: LagPolicy,

    /// Max number of loaded models kept in memory (`None` = unbounded)
    pub cache_capacity: Option<NonZeroUsize>,

    /// Length of the returned prediction vector
    pub output_length: OutputLength,

    /// Input used when a request carries no features
    pub placeholder: PlaceholderInput,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            models_dir: PathBuf::from("models"),
            model_extension: "keras".to_string(),
            lag_policy: LagPolicy::Allowed(DEFAULT_ALLOWED_LAGS.into_iter().collect()),
            cache_capacity: NonZeroUsize::new(16),
            output_length: OutputLength::Fixed(7),
            placeholder: PlaceholderInput::Zeros,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: parse_or("PORT", lookup("PORT"), defaults.port, |v| v.parse().ok()),

            models_dir: lookup("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),

            model_extension: lookup("MODEL_EXTENSION")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .unwrap_or(defaults.model_extension),

            lag_policy: parse_or(
                "ALLOWED_LAGS",
                lookup("ALLOWED_LAGS"),
                defaults.lag_policy,
                parse_lag_policy,
            ),

            cache_capacity: parse_or(
                "MODEL_CACHE_CAPACITY",
                lookup("MODEL_CACHE_CAPACITY"),
                defaults.cache_capacity,
                |v| v.parse::<usize>().ok().map(NonZeroUsize::new),
            ),

            output_length: parse_or(
                "PREDICTION_LENGTH",
                lookup("PREDICTION_LENGTH"),
                defaults.output_length,
                parse_output_length,
            ),

            placeholder: parse_or(
                "PLACEHOLDER_INPUT",
                lookup("PLACEHOLDER_INPUT"),
                defaults.placeholder,
                |v| match v.to_ascii_lowercase().as_str() {
                    "zeros" | "zero" => Some(PlaceholderInput::Zeros),
                    "random" => Some(PlaceholderInput::Random),
                    _ => None,
                },
            ),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T, F>(key: &str, raw: Option<String>, default: T, parse: F) -> T
where
    F: FnOnce(&str) -> Option<T>,
{
    let Some(raw) = raw else {
        return default;
    };

    match parse(raw.trim()) {
        Some(value) => value,
        None => {
            tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }
    }
}

fn parse_lag_policy(raw: &str) -> Option<LagPolicy> {
    if raw.eq_ignore_ascii_case("any") || raw == "*" {
        return Some(LagPolicy::Any);
    }

    let lags = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().ok().filter(|lag| *lag > 0))
        .collect::<Option<BTreeSet<i64>>>()?;

    if lags.is_empty() {
        None
    } else {
        Some(LagPolicy::Allowed(lags))
    }
}

fn parse_output_length(raw: &str) -> Option<OutputLength> {
    if raw.eq_ignore_ascii_case("raw") {
        return Some(OutputLength::Raw);
    }
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(OutputLength::Fixed(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert_eq!(config.model_extension, "keras");
        assert_eq!(config.cache_capacity, NonZeroUsize::new(16));
        assert_eq!(config.output_length, OutputLength::Fixed(7));
        assert_eq!(config.placeholder, PlaceholderInput::Zeros);
        assert!(config.lag_policy.permits(7));
        assert!(config.lag_policy.permits(28));
        assert!(!config.lag_policy.permits(8));
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9100"),
            ("MODELS_DIR", "/srv/models"),
            ("MODEL_EXTENSION", ".onnx"),
            ("ALLOWED_LAGS", "3, 5"),
            ("MODEL_CACHE_CAPACITY", "0"),
            ("PREDICTION_LENGTH", "raw"),
            ("PLACEHOLDER_INPUT", "random"),
            ("ENVIRONMENT", "production"),
        ]);

        assert_eq!(config.port, 9100);
        assert_eq!(config.models_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.model_extension, "onnx");
        assert_eq!(config.lag_policy, LagPolicy::Allowed([3, 5].into_iter().collect()));
        assert_eq!(config.cache_capacity, None);
        assert_eq!(config.output_length, OutputLength::Raw);
        assert_eq!(config.placeholder, PlaceholderInput::Random);
        assert!(config.is_production());
    }

    #[test]
    fn test_any_lag_policy() {
        let config = config_from(&[("ALLOWED_LAGS", "any")]);
        assert_eq!(config.lag_policy, LagPolicy::Any);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("ALLOWED_LAGS", "7,x"),
            ("PREDICTION_LENGTH", "0"),
            ("PLACEHOLDER_INPUT", "ones"),
        ]);

        assert_eq!(config.port, 8000);
        assert!(config.lag_policy.permits(14));
        assert_eq!(config.output_length, OutputLength::Fixed(7));
        assert_eq!(config.placeholder, PlaceholderInput::Zeros);
    }
}
