//! Volatility Forecast API Server
//!
//! Serves pre-trained volatility forecasting models, one per lag.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  VOLATILITY FORECAST API                 │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌─────────────┐   ┌──────────────────┐  │
//! │  │  HTTP     │──▶│  Predictor  │──▶│  Model Registry  │  │
//! │  │  (Axum)   │   │  (validate, │   │  (LRU, lag ->    │  │
//! │  │           │   │   shape)    │   │   loaded model)  │  │
//! │  └───────────┘   └─────────────┘   └────────┬─────────┘  │
//! │                                             ▼            │
//! │                                    ┌──────────────────┐  │
//! │                                    │  Model Runtime   │  │
//! │                                    │  (ONNX)          │  │
//! │                                    └──────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod models;
mod predictor;
mod registry;
mod runtime;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use predictor::Predictor;
use registry::ModelRegistry;
use runtime::OnnxRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "volatility_api=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Volatility Forecast API starting ({})...", config.environment);
    tracing::info!("Models directory: {}", config.models_dir.display());
    if !config.models_dir.is_dir() {
        tracing::warn!("Models directory does not exist yet, predictions will return 404");
    }

    let registry = ModelRegistry::new(
        config.models_dir.clone(),
        config.model_extension.clone(),
        Arc::new(OnnxRuntime::new()),
        config.cache_capacity,
    );
    let predictor = Predictor::from_config(&config, registry);

    // Build application state
    let state = AppState {
        predictor: Arc::new(predictor),
        config: config.clone(),
    };

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);
    if !state.config.is_production() {
        cors = cors.allow_origin(Any);
    }

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/predict/:lag", get(handlers::predict::predict_by_lag))
        .route("/models", get(handlers::models::status))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
