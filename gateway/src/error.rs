//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fxgate_common::{TraceId, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Everything a request can fail with, before it is tied to a trace.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("exchange rate unavailable")]
    RateUnavailable,
    #[error("endpoint not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("internal server error")]
    Internal,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) | GatewayError::RateUnavailable => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "VALIDATION_ERROR",
            GatewayError::RateUnavailable => "RATE_UNAVAILABLE",
            GatewayError::NotFound => "NOT_FOUND",
            GatewayError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            GatewayError::Internal => "INTERNAL_ERROR",
        }
    }
}

/// A [`GatewayError`] bound to the request that produced it.
#[derive(Debug)]
pub struct ApiError {
    pub error: GatewayError,
    pub trace_id: TraceId,
}

impl ApiError {
    pub fn new(error: impl Into<GatewayError>, trace_id: &TraceId) -> Self {
        Self {
            error: error.into(),
            trace_id: trace_id.clone(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    /// Which validation rule failed, e.g. `NON_POSITIVE_AMOUNT`.
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<[&'static str; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<&'static str>,
    trace_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let (reason, required, example) = match &self.error {
            GatewayError::Validation(e @ ValidationError::MissingParameters) => (
                Some(e.error_code()),
                Some(ValidationError::REQUIRED_PARAMETERS),
                Some(ValidationError::EXAMPLE),
            ),
            GatewayError::Validation(e) => {
                (Some(e.error_code()), None, Some(ValidationError::EXAMPLE))
            }
            _ => (None, None, None),
        };
        let body = Json(ErrorBody {
            error: self.error.to_string(),
            code: self.error.error_code(),
            reason,
            required,
            example,
            trace_id: self.trace_id.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
