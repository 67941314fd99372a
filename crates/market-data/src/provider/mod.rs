//! Quote provider abstractions and implementations.
//!
//! The core system only sees [`QuoteProvider`]; each upstream gets its own
//! adapter module that owns the provider-specific URL, authentication and
//! field names.

mod capabilities;
mod traits;

pub mod alpha_vantage;

// Re-exports
pub use capabilities::RateLimit;
pub use traits::QuoteProvider;
