//! Lag model - which trained variant a request targets

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Lags a deployment accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LagPolicy {
    /// Only the listed lags
    Allowed(BTreeSet<i64>),
    /// Any positive lag; a missing artifact surfaces as 404
    Any,
}

impl LagPolicy {
    pub fn permits(&self, lag: i64) -> bool {
        match self {
            LagPolicy::Allowed(lags) => lags.contains(&lag),
            LagPolicy::Any => lag > 0,
        }
    }

    /// Explicit lag list, `None` when any lag is accepted
    pub fn allowed(&self) -> Option<Vec<i64>> {
        match self {
            LagPolicy::Allowed(lags) => Some(lags.iter().copied().collect()),
            LagPolicy::Any => None,
        }
    }

    /// Human readable description used in 400 responses
    pub fn describe(&self) -> String {
        match self {
            LagPolicy::Allowed(lags) => {
                let list = lags
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("one of [{}]", list)
            }
            LagPolicy::Any => "a positive integer".to_string(),
        }
    }
}

/// Path of the artifact trained for `lag`:
/// `<models_dir>/lag_<L>/mejor_fold_lag_<L>.<extension>`
pub fn artifact_path(models_dir: &Path, lag: i64, extension: &str) -> PathBuf {
    models_dir
        .join(format!("lag_{}", lag))
        .join(format!("mejor_fold_lag_{}.{}", lag, extension))
}
