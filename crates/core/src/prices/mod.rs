//! Prices module - durable last-known price per directory ticker.

mod prices_model;
mod prices_traits;
mod writeback;

pub use prices_model::{PriceCacheEntry, PriceUpdate};
pub use prices_traits::{NoOpPriceSink, PriceSink, PriceStore};
pub use writeback::PriceWriteback;
