//! fxgate Gateway
//!
//! HTTP front end for currency conversion. Every request gets a trace ID,
//! is timed into the metrics registry and logged as structured JSON.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use fxgate_fx::{FxEngine, HttpRateProvider, RateProvider};

pub use config::GatewayConfig;
pub use error::{ApiError, GatewayError};
pub use state::AppState;

/// Build the router with all routes and the request tracking layer.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/currencies", get(handlers::currencies))
        .route("/convert", get(handlers::convert))
        .route("/metrics", get(handlers::metrics))
        .route("/cache/clear", post(handlers::clear_cache))
        .route("/trace", get(handlers::trace))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            context::track_requests,
        ))
        .with_state(state)
}

/// Build application state backed by the HTTP rate provider.
pub fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let provider = HttpRateProvider::new(config.http_provider())?;
    Ok(build_state_with_provider(Arc::new(provider), config))
}

/// Build application state around an arbitrary rate provider.
pub fn build_state_with_provider(
    provider: Arc<dyn RateProvider>,
    config: &GatewayConfig,
) -> AppState {
    let engine = FxEngine::new(provider, config.fx_engine());
    AppState::new(Arc::new(engine))
}
