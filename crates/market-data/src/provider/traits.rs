//! Quote provider trait definition.
//!
//! A provider adapter is split in two halves: the network half
//! ([`fetch_raw`](QuoteProvider::fetch_raw)) and the brittle field mapping
//! ([`normalize`](QuoteProvider::normalize)). Keeping them apart lets the
//! mapping be tested against captured payloads without any HTTP.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::NormalizedQuote;

use super::capabilities::RateLimit;

/// Trait for quote providers.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use moneta_market_data::{MarketDataError, NormalizedQuote, QuoteProvider, RateLimit};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     async fn fetch_raw(&self, symbol: &str) -> Result<String, MarketDataError> {
///         // HTTP call
///     }
///
///     fn normalize(&self, symbol: &str, raw: &str) -> Result<NormalizedQuote, MarketDataError> {
///         // field mapping
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier, e.g. "ALPHA_VANTAGE". Used in logs and errors.
    fn id(&self) -> &'static str;

    /// The call budget of the configured plan.
    fn rate_limit(&self) -> RateLimit;

    /// Perform the upstream request and return the raw body.
    ///
    /// `symbol` must already be in provider-native format. No retries happen
    /// here; the caller owns retry and budget policy.
    async fn fetch_raw(&self, symbol: &str) -> Result<String, MarketDataError>;

    /// Map a raw provider payload onto [`NormalizedQuote`].
    fn normalize(&self, symbol: &str, raw: &str) -> Result<NormalizedQuote, MarketDataError>;

    /// Fetch and normalize in one go.
    async fn fetch_quote(&self, symbol: &str) -> Result<NormalizedQuote, MarketDataError> {
        let raw = self.fetch_raw(symbol).await?;
        self.normalize(symbol, &raw)
    }
}
