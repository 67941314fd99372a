//! Moneta Core - ticker resolution, quote governance and price persistence.
//!
//! This crate holds the domain types, services and storage traits. It is
//! database-agnostic: the traits are implemented by the `storage-sqlite`
//! crate and the reasoning client lives in the `ai` crate.

pub mod errors;
pub mod financial_data;
pub mod prices;
pub mod quotes;
pub mod tickers;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::DatabaseError;
pub use errors::Error;
pub use errors::ResolveError;
pub use errors::Result;
