//! Model status handler

use axum::{extract::State, Json};

use crate::AppState;
use crate::predictor::EngineStatus;

/// Registry and inference counters
pub async fn status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.predictor.status())
}
