//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::registry::RegistryError;
use crate::runtime::RuntimeError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),

    // Model errors
    ArtifactNotFound(String),
    LoadError(String),
    InferenceError(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ArtifactNotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoadError(_)
            | AppError::InferenceError(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::ValidationError(msg)
            | AppError::ArtifactNotFound(msg)
            | AppError::LoadError(msg)
            | AppError::InferenceError(msg)
            | AppError::InternalError(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::LoadError(msg) => tracing::error!("Model load error: {}", msg),
            AppError::InferenceError(msg) => tracing::error!("Inference error: {}", msg),
            AppError::InternalError(msg) => tracing::error!("Internal error: {}", msg),
            AppError::ArtifactNotFound(msg) => tracing::warn!("{}", msg),
            AppError::ValidationError(msg) => tracing::debug!("Rejected request: {}", msg),
        }

        let body = Json(json!({
            "error": self.message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } => AppError::ArtifactNotFound(err.to_string()),
            RegistryError::Load { .. } => AppError::LoadError(err.to_string()),
        }
    }
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Load(_) => AppError::LoadError(err.to_string()),
            RuntimeError::Inference(msg) => {
                AppError::InferenceError(format!("Error during prediction: {}", msg))
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("Prediction task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::ValidationError("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ArtifactNotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::LoadError("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::InferenceError("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_registry_errors_convert() {
        let not_found = AppError::from(RegistryError::NotFound {
            lag: 7,
            path: PathBuf::from("models/lag_7/mejor_fold_lag_7.keras"),
        });
        assert!(matches!(not_found, AppError::ArtifactNotFound(_)));
        assert!(not_found.message().contains("models/lag_7/mejor_fold_lag_7.keras"));

        let load = AppError::from(RegistryError::Load {
            lag: 7,
            path: PathBuf::from("m.keras"),
            message: "bad header".to_string(),
        });
        assert!(matches!(load, AppError::LoadError(_)));
        assert!(load.message().contains("bad header"));
    }

    #[test]
    fn test_inference_error_keeps_runtime_message() {
        let err = AppError::from(RuntimeError::Inference("shape mismatch".into()));
        assert!(matches!(err, AppError::InferenceError(_)));
        assert!(err.message().contains("shape mismatch"));
    }
}
