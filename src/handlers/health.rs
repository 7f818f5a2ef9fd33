//! Health check handlers

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

#[derive(Serialize)]
pub struct WelcomeResponse {
    message: &'static str,
    docs: [&'static str; 4],
}

pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Volatility Forecast API",
        docs: ["GET /health", "POST /predict", "GET /predict/{lag}", "GET /models"],
    })
}
