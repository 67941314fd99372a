//! Core error types for Moneta.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use moneta_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ticker and quote services.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Ticker resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    /// Local call budget exhausted and nothing cached to fall back on.
    #[error("Quote budget exhausted until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Input validation failed: {0}")]
    Validation(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Failures of the name-to-ticker resolution path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The reasoning service could not map the input to any ticker.
    #[error("No ticker found for '{0}'")]
    Unresolvable(String),

    /// The reasoning service answered with something that is not the expected JSON.
    #[error("Reasoning service returned malformed output: {0}")]
    UpstreamFormat(String),

    /// Transport or HTTP failure talking to the reasoning service.
    #[error("Reasoning service error: {0}")]
    Upstream(String),

    /// The reasoning call exceeded its time budget.
    #[error("Reasoning service timed out")]
    Timeout,
}

impl Error {
    /// True for the expected outcome of two writers racing on the same key.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::UniqueViolation(_)))
    }
}
