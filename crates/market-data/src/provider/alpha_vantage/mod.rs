//! Alpha Vantage quote provider implementation.
//!
//! Latest quotes come from the `GLOBAL_QUOTE` function, reachable two ways:
//! - directly at alphavantage.co with the key as `apikey` query parameter
//! - through RapidAPI with the key in the `x-rapidapi-key` header
//!
//! Note: the Alpha Vantage free tier allows 5 calls per minute and 25 per day.

use async_trait::async_trait;
use log::{debug, warn};
use num_traits::ToPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{currency_for_symbol, NormalizedQuote};
use crate::parse::parse_number;
use crate::provider::{QuoteProvider, RateLimit};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const RAPIDAPI_HOST: &str = "alpha-vantage.p.rapidapi.com";
const RAPIDAPI_URL: &str = "https://alpha-vantage.p.rapidapi.com/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Longest slice of an upstream error body kept in error messages.
const MAX_ERROR_BODY: usize = 200;

// GLOBAL_QUOTE field names
const FIELD_SYMBOL: &str = "01. symbol";
const FIELD_PRICE: &str = "05. price";
const FIELD_VOLUME: &str = "06. volume";
const FIELD_CHANGE: &str = "09. change";
const FIELD_CHANGE_PERCENT: &str = "10. change percent";

/// How requests are authenticated and routed.
#[derive(Clone)]
pub enum AlphaVantageTransport {
    /// alphavantage.co, key passed as `apikey` query parameter.
    Direct { api_key: String },
    /// RapidAPI gateway, key passed as `x-rapidapi-key` header.
    RapidApi { api_key: String },
}

impl AlphaVantageTransport {
    fn api_key(&self) -> &str {
        match self {
            Self::Direct { api_key } | Self::RapidApi { api_key } => api_key,
        }
    }
}

impl std::fmt::Debug for AlphaVantageTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct { .. } => f.write_str("Direct { api_key: *** }"),
            Self::RapidApi { .. } => f.write_str("RapidApi { api_key: *** }"),
        }
    }
}

/// Alpha Vantage quote provider.
pub struct AlphaVantageProvider {
    client: Client,
    transport: AlphaVantageTransport,
    rate_limit: RateLimit,
}

impl AlphaVantageProvider {
    /// Create a provider talking to alphavantage.co directly.
    pub fn new(api_key: String) -> Self {
        Self::with_transport(AlphaVantageTransport::Direct { api_key })
    }

    /// Create a provider routed through the RapidAPI gateway.
    pub fn rapidapi(api_key: String) -> Self {
        Self::with_transport(AlphaVantageTransport::RapidApi { api_key })
    }

    pub fn with_transport(transport: AlphaVantageTransport) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            transport,
            rate_limit: RateLimit {
                requests_per_minute: 5,
                requests_per_day: 25,
            },
        }
    }

    /// Override the plan limits (premium keys allow far more than the free tier).
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    fn provider_error(status: u16, message: impl Into<String>) -> MarketDataError {
        MarketDataError::UpstreamUnavailable {
            provider: PROVIDER_ID.to_string(),
            status,
            message: message.into(),
        }
    }

    /// Make a request to the Alpha Vantage API.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let (base, mut all_params) = match &self.transport {
            AlphaVantageTransport::Direct { .. } => (BASE_URL, params.to_vec()),
            AlphaVantageTransport::RapidApi { .. } => (RAPIDAPI_URL, params.to_vec()),
        };
        if let AlphaVantageTransport::Direct { api_key } = &self.transport {
            all_params.push(("apikey", api_key));
        }

        let url = reqwest::Url::parse_with_params(base, &all_params)
            .map_err(|e| Self::provider_error(0, format!("Failed to build URL: {}", e)))?;

        let api_key = self.transport.api_key();
        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(api_key, "***")
        );

        let mut request = self.client.get(url);
        if let AlphaVantageTransport::RapidApi { api_key } = &self.transport {
            request = request
                .header("x-rapidapi-host", RAPIDAPI_HOST)
                .header("x-rapidapi-key", api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                Self::provider_error(0, e.to_string().replace(api_key, "***"))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Alpha Vantage HTTP {}: {}", status, body);
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(Self::provider_error(status.as_u16(), message));
        }

        response
            .text()
            .await
            .map_err(|e| Self::provider_error(status.as_u16(), e.to_string()))
    }

    /// Check for API-level errors in the response.
    ///
    /// Alpha Vantage answers 200 for almost everything and reports problems
    /// in one of three top-level keys.
    fn check_api_error(symbol: &str, body: &Map<String, Value>) -> Result<(), MarketDataError> {
        if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
            warn!("Alpha Vantage error for {}: {}", symbol, msg);
            return Err(MarketDataError::QuoteNotFound(symbol.to_string()));
        }

        for key in ["Note", "Information"] {
            if let Some(msg) = body.get(key).and_then(Value::as_str) {
                if Self::is_throttle_notice(msg) {
                    return Err(MarketDataError::RateLimited {
                        provider: PROVIDER_ID.to_string(),
                    });
                }
                warn!("Alpha Vantage {}: {}", key.to_lowercase(), msg);
            }
        }

        Ok(())
    }

    fn is_throttle_notice(msg: &str) -> bool {
        let msg = msg.to_lowercase();
        msg.contains("call frequency") || msg.contains("rate limit") || msg.contains("requests per day")
    }

    /// Read a field that may be sent as a string or as a bare number.
    fn field(quote: &Map<String, Value>, key: &str) -> Option<Decimal> {
        match quote.get(key)? {
            Value::String(s) => parse_number(s),
            Value::Number(n) => parse_number(&n.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }

    async fn fetch_raw(&self, symbol: &str) -> Result<String, MarketDataError> {
        let mut params = vec![("function", "GLOBAL_QUOTE"), ("symbol", symbol)];
        if matches!(self.transport, AlphaVantageTransport::RapidApi { .. }) {
            params.push(("datatype", "json"));
        }
        self.fetch(&params).await
    }

    fn normalize(&self, symbol: &str, raw: &str) -> Result<NormalizedQuote, MarketDataError> {
        let body: Value =
            serde_json::from_str(raw).map_err(|e| MarketDataError::InvalidPayload {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;
        let body = body
            .as_object()
            .ok_or_else(|| MarketDataError::InvalidPayload {
                provider: PROVIDER_ID.to_string(),
                message: "expected a JSON object".to_string(),
            })?;

        Self::check_api_error(symbol, body)?;

        // Either wrapped in "Global Quote" or the bare quote object.
        let quote = match body.get("Global Quote") {
            Some(Value::Object(inner)) => inner,
            Some(_) => return Err(MarketDataError::QuoteNotFound(symbol.to_string())),
            None if body.contains_key(FIELD_PRICE) => body,
            None if body.contains_key("Information") || body.contains_key("Note") => {
                return Err(Self::provider_error(200, "provider returned a notice instead of a quote"));
            }
            None => return Err(MarketDataError::QuoteNotFound(symbol.to_string())),
        };

        if quote.is_empty() || !quote.contains_key(FIELD_PRICE) {
            return Err(MarketDataError::QuoteNotFound(symbol.to_string()));
        }

        let price = Self::field(quote, FIELD_PRICE).ok_or_else(|| MarketDataError::InvalidPayload {
            provider: PROVIDER_ID.to_string(),
            message: format!("unparseable price for {}", symbol),
        })?;

        let resolved_symbol = quote
            .get(FIELD_SYMBOL)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(symbol)
            .trim()
            .to_uppercase();

        Ok(NormalizedQuote {
            currency: currency_for_symbol(&resolved_symbol),
            symbol: resolved_symbol,
            price,
            change: Self::field(quote, FIELD_CHANGE).unwrap_or_default(),
            change_percent: Self::field(quote, FIELD_CHANGE_PERCENT).unwrap_or_default(),
            volume: Self::field(quote, FIELD_VOLUME)
                .and_then(|v| v.trunc().to_u64())
                .unwrap_or(0),
        })
    }
}
