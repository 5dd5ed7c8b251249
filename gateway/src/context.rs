//! Request-scoped context and the middleware that creates it.

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use fxgate_common::TraceId;
use tracing::{error, info, info_span, Instrument};

use crate::error::{ApiError, GatewayError};
use crate::state::AppState;

/// Header carrying the correlation ID in both directions.
pub const TRACE_HEADER: &str = "x-trace-id";

/// Per-request values handed to every handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: TraceId,
    pub started_at: Instant,
}

impl RequestContext {
    /// Bind an error to this request.
    pub fn fail(&self, error: impl Into<GatewayError>) -> ApiError {
        ApiError::new(error, &self.trace_id)
    }
}

/// Assign a trace ID, time the request, record metrics and stamp `X-Trace-ID`.
///
/// Handler panics are turned into a 500 JSON body here so the caller still
/// gets the trace ID.
pub async fn track_requests(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let trace_id = TraceId::from_header_or_generate(
        req.headers()
            .get(TRACE_HEADER)
            .and_then(|value| value.to_str().ok()),
    );
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let ctx = RequestContext {
        trace_id: trace_id.clone(),
        started_at: Instant::now(),
    };
    req.extensions_mut().insert(ctx.clone());

    let span = info_span!("request", trace_id = %trace_id, method = %method, path = %path);

    async move {
        info!(ip = client_ip.as_deref().unwrap_or("unknown"), "Request started");
        let _active = state.metrics.request_started();

        let mut response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
            Ok(response) => response,
            Err(panic) => {
                error!(error = panic_message(&*panic), "Internal server error");
                ctx.fail(GatewayError::Internal).into_response()
            }
        };

        let elapsed = ctx.started_at.elapsed();
        let status = response.status().as_u16();
        state
            .metrics
            .request_completed(&method, &path, status, elapsed);

        info!(
            status_code = status,
            response_time = elapsed.as_secs_f64(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(ctx.trace_id.as_str()) {
            response.headers_mut().insert(TRACE_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
