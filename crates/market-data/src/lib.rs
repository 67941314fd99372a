//! Moneta Market Data Crate
//!
//! Provider-facing half of the quote pipeline: everything that talks to a
//! quote provider or keeps per-process quote state, and nothing that needs a
//! database.
//!
//! # Architecture
//!
//! ```text
//!                 +-------------------+
//!   symbol  --->  |    QuoteCache     |  (per-process, TTL-demoted, never evicted)
//!                 +-------------------+
//!                          |  miss / stale
//!                          v
//!                 +-------------------+
//!                 |    RateBudget     |  (sliding minute + UTC day ceilings)
//!                 +-------------------+
//!                          |  budget available
//!                          v
//!                 +-------------------+
//!                 |   QuoteProvider   |  (fetch_raw + normalize, e.g. Alpha Vantage)
//!                 +-------------------+
//!                          |
//!                          v
//!                 +-------------------+
//!                 |  NormalizedQuote  |
//!                 +-------------------+
//! ```
//!
//! The governor that strings these together lives in `moneta-core`, because it
//! also needs name resolution and durable price persistence.
//!
//! # Core Types
//!
//! - [`NormalizedQuote`] - Provider-independent quote shape
//! - [`QuoteProvider`] - Adapter trait, one implementation per upstream provider
//! - [`QuoteCache`] - In-memory cache tier keyed by resolved ticker
//! - [`RateBudget`] - Per-process call accounting
//! - [`Clock`] - Time source shared by the cache and the budget

pub mod clock;
pub mod errors;
pub mod models;
pub mod parse;
pub mod provider;
pub mod registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::MarketDataError;
pub use models::{currency_for_symbol, CachedQuote, Currency, NormalizedQuote};
pub use parse::parse_number;
pub use provider::alpha_vantage::{AlphaVantageProvider, AlphaVantageTransport};
pub use provider::{QuoteProvider, RateLimit};
pub use registry::{
    BudgetExhausted, BudgetLimits, BudgetUsage, BudgetWindow, QuoteCache, RateBudget,
};
