//! SQLite storage implementation for Moneta.
//!
//! Implements the `TickerStore` and `PriceStore` traits defined in
//! `moneta-core` with Diesel over a pooled SQLite database. Reads use the
//! pool directly; every write goes through the single writer actor.
//!
//! ```text
//! core (traits)
//!       │
//!       ▼
//! storage-sqlite (this crate)
//!       │
//!       ▼
//!   SQLite DB  (ticker_mapping, price_cache)
//! ```

pub mod db;
pub mod errors;
pub mod prices;
pub mod schema;
pub mod tickers;
pub mod utils;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use prices::PriceRepository;
pub use tickers::TickerRepository;
