//! Application state.

use std::sync::Arc;

use fxgate_fx::FxEngine;

use crate::metrics::Metrics;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Rate cache, provider and conversion.
    pub engine: Arc<FxEngine>,
    /// Request and conversion metrics.
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(engine: Arc<FxEngine>) -> Self {
        Self {
            engine,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
