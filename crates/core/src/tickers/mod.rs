//! Tickers module - persistent ticker directory and name resolution.

mod directory;
mod name_resolver;
mod symbol;
mod ticker_resolver;
mod tickers_model;
mod tickers_traits;

pub use directory::TickerDirectory;
pub use name_resolver::{NameResolver, DEFAULT_RESOLVER_TIMEOUT, MAX_BATCH_SIZE};
pub use symbol::{is_isin, is_ticker_shaped, normalize_symbol};
pub use ticker_resolver::TickerResolver;
pub use tickers_model::{NewTickerEntry, ResolvedTicker, TickerEntry};
pub use tickers_traits::{ReasoningClient, TickerStore};
