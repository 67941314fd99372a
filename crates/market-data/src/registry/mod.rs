//! Per-process quote state.
//!
//! - [`QuoteCache`]: last quote per resolved ticker, TTL-demoted, never evicted
//! - [`RateBudget`]: minute and UTC-day call ceilings for one provider

mod quote_cache;
mod rate_budget;

pub use quote_cache::QuoteCache;
pub use rate_budget::{BudgetExhausted, BudgetLimits, BudgetUsage, BudgetWindow, RateBudget};
