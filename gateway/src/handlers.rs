//! HTTP handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use fxgate_common::{format_timestamp, now, ValidationError, SUPPORTED_CURRENCIES};
use fxgate_fx::{ConversionRequest, ConversionResult, FxError};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::context::RequestContext;
use crate::error::{ApiResult, GatewayError};
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Raw `/convert` query. Every field is optional so that missing values are
/// reported by validation rather than by the extractor.
#[derive(Debug, Default, PartialEq)]
pub struct ConvertParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
}

impl ConvertParams {
    /// Pick the parameters out of decoded query pairs. When a key repeats,
    /// its first value wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "from" => &mut params.from,
                "to" => &mut params.to,
                "amount" => &mut params.amount,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub conversion: ConversionResult,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub cache_size: usize,
    pub cache_status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CurrenciesResponse {
    pub supported_currencies: Vec<&'static str>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub message: &'static str,
    pub cache_size: usize,
}

#[derive(Debug, Serialize)]
pub struct TraceResponse {
    pub trace_id: String,
    pub headers: BTreeMap<String, String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Service metadata and endpoint list.
pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Currency Converter API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "/convert?from=EUR&to=USD&amount=100",
            "currencies": "/currencies",
            "metrics": "/metrics",
            "health": "/health",
            "cache_clear": "POST /cache/clear",
            "trace": "/trace"
        }
    }))
}

/// Liveness plus cache occupancy.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_size = state.engine.cache().len();
    Json(HealthResponse {
        status: "healthy",
        timestamp: format_timestamp(now()),
        cache_size,
        cache_status: if cache_size == 0 { "empty" } else { "warm" },
    })
}

/// Static list of supported currency codes.
pub async fn currencies() -> Json<CurrenciesResponse> {
    let supported_currencies = SUPPORTED_CURRENCIES.to_vec();
    Json(CurrenciesResponse {
        count: supported_currencies.len(),
        supported_currencies,
    })
}

/// Convert an amount between two currencies.
pub async fn convert(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ConvertResponse>> {
    let params = ConvertParams::from_pairs(pairs);
    let request = ConversionRequest::parse(
        params.from.as_deref(),
        params.to.as_deref(),
        params.amount.as_deref(),
    )
    .map_err(|e| {
        warn!(error = %e, "Conversion request rejected");
        ctx.fail(e)
    })?;

    let conversion = match state.engine.convert(&request).await {
        Ok(conversion) => conversion,
        Err(FxError::Validation(e)) => return Err(ctx.fail(e)),
        Err(FxError::Overflow) => return Err(ctx.fail(ValidationError::AmountTooLarge)),
        Err(e @ (FxError::RateUnavailable { .. } | FxError::InvalidRate { .. })) => {
            state.metrics.upstream_failed();
            let cause = std::error::Error::source(&e)
                .map(ToString::to_string)
                .unwrap_or_default();
            error!(
                error = %e,
                cause = %cause,
                from_currency = %request.pair.from,
                to_currency = %request.pair.to,
                "Exchange rate unavailable"
            );
            return Err(ctx.fail(GatewayError::RateUnavailable));
        }
    };

    state.metrics.conversion_completed();
    info!(
        from_currency = %conversion.from,
        to_currency = %conversion.to,
        amount = %conversion.amount,
        converted_amount = %conversion.converted_amount,
        rate = %conversion.rate,
        rate_source = ?conversion.source,
        "Conversion successful"
    );

    Ok(Json(ConvertResponse { conversion }))
}

/// Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.to_prometheus(&state.engine.stats());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Drop every cached rate.
pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheClearResponse> {
    state.engine.clear_cache();
    Json(CacheClearResponse {
        message: "cache cleared",
        cache_size: state.engine.cache().len(),
    })
}

/// Echo the trace ID and request headers.
pub async fn trace(
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
) -> Json<TraceResponse> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(TraceResponse {
        trace_id: ctx.trace_id.to_string(),
        headers,
    })
}

/// Fallback for unknown routes.
pub async fn not_found(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    ctx.fail(GatewayError::NotFound)
}

/// Fallback for known routes hit with the wrong method.
pub async fn method_not_allowed(
    Extension(ctx): Extension<RequestContext>,
) -> impl IntoResponse {
    ctx.fail(GatewayError::MethodNotAllowed)
}
