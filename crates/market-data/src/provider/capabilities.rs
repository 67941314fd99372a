//! Provider rate limiting configuration.

/// Call budget a provider's plan allows.
///
/// The governor in `moneta-core` turns this into a [`RateBudget`](crate::RateBudget);
/// deployments may override either ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Maximum requests allowed in any trailing 60 seconds.
    pub requests_per_minute: u32,

    /// Maximum requests allowed per UTC calendar day.
    pub requests_per_day: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_day: 10_000,
        }
    }
}
