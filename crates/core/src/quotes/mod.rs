//! Quotes module - the quote cache and rate governor.

mod quotes_model;
mod service;


pub use quotes_model::QuoteLookup;
pub use service::{QuoteService, DEFAULT_QUOTE_TTL_SECS};
