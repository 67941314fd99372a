use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use moneta_core::{errors::MarketDataError, Error, ResolveError};
use serde_json::{json, Value};

const NOT_FOUND_QUOTE: &str = "No price data found for this symbol.";
const NOT_FOUND_TICKER: &str =
    "No ticker found for this name. Please enter the exchange symbol directly.";
const RESOLVER_UNAVAILABLE: &str = "Ticker resolution service temporarily unavailable.";
const QUOTES_UNAVAILABLE: &str = "Quote service temporarily unavailable.";

/// Errors returned by HTTP handlers.
///
/// Messages are user-facing. Upstream bodies and keys stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("Daily quote limit reached. Please retry after the window resets.")]
    RateLimited { reset_at: Option<DateTime<Utc>> },
    #[error("{0}")]
    BadGateway(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("Internal server error")]
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });
        if let ApiError::RateLimited { reset_at } = &self {
            body["limitReached"] = Value::Bool(true);
            if let Some(reset_at) = reset_at {
                body["resetAt"] = json!(reset_at);
            }
        }
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => ApiError::BadRequest(message),
            Error::RateLimited { reset_at } => ApiError::RateLimited {
                reset_at: Some(reset_at),
            },
            Error::MarketData(e) if !e.is_unavailable() => {
                tracing::debug!("{}", e);
                ApiError::NotFound(NOT_FOUND_QUOTE.to_string())
            }
            Error::MarketData(e) => {
                match e.upstream_status() {
                    Some(status) => {
                        tracing::warn!(upstream_status = status, "Quote provider failure: {}", e)
                    }
                    None => tracing::warn!("Quote provider failure: {}", e),
                }
                ApiError::ServiceUnavailable(QUOTES_UNAVAILABLE.to_string())
            }
            Error::Resolve(ResolveError::Unresolvable(input)) => {
                tracing::debug!("Unresolvable input '{}'", input);
                ApiError::NotFound(NOT_FOUND_TICKER.to_string())
            }
            Error::Resolve(e) => {
                tracing::warn!("Ticker resolution failure: {}", e);
                ApiError::BadGateway(RESOLVER_UNAVAILABLE.to_string())
            }
            Error::Database(e) => {
                tracing::error!("Database error: {}", e);
                ApiError::Internal
            }
            Error::Unexpected(e) => {
                tracing::error!("Unexpected error: {}", e);
                ApiError::Internal
            }
        }
    }
}
