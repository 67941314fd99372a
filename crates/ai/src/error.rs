//! Reasoning client error types.

use moneta_core::ResolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// Missing API key for a provider.
    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),

    /// Provider error (from rig-core or the API).
    #[error("Provider error: {0}")]
    Provider(String),
}

impl AiError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}

impl From<AiError> for ResolveError {
    fn from(err: AiError) -> Self {
        ResolveError::Upstream(err.to_string())
    }
}
