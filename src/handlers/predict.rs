//! Prediction handlers

use axum::{extract::{rejection::JsonRejection, State, Path}, Json};

use crate::{AppState, AppResult};
use crate::models::{PredictRequest, PredictionResponse};

/// Predict from an explicit request body
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let Json(req) = body?;
    run(state, req.lag, req.features).await
}

/// Predict for a lag given in the URL, using a placeholder input
pub async fn predict_by_lag(
    State(state): State<AppState>,
    Path(lag): Path<i64>,
) -> AppResult<Json<PredictionResponse>> {
    run(state, lag, None).await
}

// Loading and inference block, keep them off the async workers
async fn run(
    state: AppState,
    lag: i64,
    features: Option<Vec<f32>>,
) -> AppResult<Json<PredictionResponse>> {
    let predictor = state.predictor.clone();
    let predictions = tokio::task::spawn_blocking(move || predictor.predict(lag, features)).await??;

    Ok(Json(PredictionResponse { predictions }))
}
