use async_trait::async_trait;

use super::tickers_model::{NewTickerEntry, TickerEntry};
use crate::errors::{ResolveError, Result};

/// Trait defining the contract for ticker directory storage.
#[async_trait]
pub trait TickerStore: Send + Sync {
    /// Exact match on the (already uppercased) symbol.
    fn find_by_symbol(&self, symbol: &str) -> Result<Option<TickerEntry>>;

    /// Case-insensitive substring match on the company name; first hit only.
    fn find_by_name_like(&self, fragment: &str) -> Result<Option<TickerEntry>>;

    /// Insert a new row. Fails with `DatabaseError::UniqueViolation` if the
    /// symbol already exists.
    async fn insert(&self, entry: NewTickerEntry) -> Result<TickerEntry>;

    /// Insert missing symbols, refine metadata of existing ones. Returns the
    /// number of rows written.
    async fn upsert_many(&self, entries: Vec<NewTickerEntry>) -> Result<usize>;
}

/// External reasoning service used to map names to tickers.
///
/// Implementations send `prompt` and return the raw text of the answer; the
/// resolver owns all parsing. `max_output_tokens` bounds the size (and so the
/// latency) of the answer.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete_json(
        &self,
        prompt: &str,
        max_output_tokens: u32,
    ) -> std::result::Result<String, ResolveError>;
}
