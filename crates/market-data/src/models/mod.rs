//! Market data models
//!
//! - `quote` - Quote data structures (NormalizedQuote, CachedQuote) and the
//!   currency inferred from an exchange suffix

mod quote;

pub use quote::{currency_for_symbol, CachedQuote, Currency, NormalizedQuote};
