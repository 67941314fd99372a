//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while fetching or normalizing a quote.
///
/// Only [`QuoteNotFound`](Self::QuoteNotFound) means "the provider answered,
/// but has nothing for this symbol". Every other variant is a flavour of the
/// provider being unavailable and is safe to paper over with a stale quote.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider answered but has no data for the symbol (unknown or delisted).
    #[error("Quote not found: {0}")]
    QuoteNotFound(String),

    /// Transport failure or non-2xx HTTP status.
    #[error("Provider unavailable: {provider} - HTTP {status}: {message}")]
    UpstreamUnavailable {
        provider: String,
        /// HTTP status code, `0` when the request never got a response.
        status: u16,
        message: String,
    },

    /// The provider itself throttled the request (HTTP 429 or a frequency notice).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider returned a 2xx body that could not be decoded.
    #[error("Invalid payload from {provider}: {message}")]
    InvalidPayload { provider: String, message: String },
}

impl MarketDataError {
    /// Whether the failure is a provider-availability problem rather than a
    /// definitive "no data" answer.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, Self::QuoteNotFound(_))
    }

    /// HTTP status reported by the provider, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamUnavailable { status, .. } if *status != 0 => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_not_found_is_not_unavailable() {
        let error = MarketDataError::QuoteNotFound("DELISTED".to_string());
        assert!(!error.is_unavailable());
        assert_eq!(error.upstream_status(), None);
    }

    #[test]
    fn test_transport_failures_are_unavailable() {
        let errors = [
            MarketDataError::UpstreamUnavailable {
                provider: "ALPHA_VANTAGE".to_string(),
                status: 502,
                message: "Bad Gateway".to_string(),
            },
            MarketDataError::RateLimited {
                provider: "ALPHA_VANTAGE".to_string(),
            },
            MarketDataError::Timeout {
                provider: "ALPHA_VANTAGE".to_string(),
            },
            MarketDataError::InvalidPayload {
                provider: "ALPHA_VANTAGE".to_string(),
                message: "expected value".to_string(),
            },
        ];
        for error in errors {
            assert!(error.is_unavailable(), "{error} should be unavailable");
        }
    }

    #[test]
    fn test_upstream_status() {
        let error = MarketDataError::UpstreamUnavailable {
            provider: "ALPHA_VANTAGE".to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(error.upstream_status(), Some(503));

        let error = MarketDataError::UpstreamUnavailable {
            provider: "ALPHA_VANTAGE".to_string(),
            status: 0,
            message: "connection refused".to_string(),
        };
        assert_eq!(error.upstream_status(), None);

        let error = MarketDataError::RateLimited {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        assert_eq!(error.upstream_status(), Some(429));
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::QuoteNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Quote not found: INVALID");

        let error = MarketDataError::RateLimited {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: ALPHA_VANTAGE");

        let error = MarketDataError::UpstreamUnavailable {
            provider: "ALPHA_VANTAGE".to_string(),
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider unavailable: ALPHA_VANTAGE - HTTP 500: Internal Server Error"
        );
    }
}
