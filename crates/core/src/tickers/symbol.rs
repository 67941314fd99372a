//! Shape checks for user input: ticker, ISIN, or free-form name.

use std::sync::LazyLock;

use regex::Regex;

/// `AAPL`, `MBG.DE`, `BRK-B`, `XETR:SAP`
static TICKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{1,10}([.\-:][A-Z0-9]{1,5})?$").expect("Invalid regex pattern")
});

/// ISO 6166: two-letter country code, nine alphanumerics, one check digit.
static ISIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{9}[0-9]$").expect("Invalid regex pattern"));

/// Trim and uppercase.
pub fn normalize_symbol(input: &str) -> String {
    input.trim().to_uppercase()
}

pub fn is_isin(input: &str) -> bool {
    ISIN_REGEX.is_match(&normalize_symbol(input))
}

/// Whether `input` can be used as a ticker without asking the resolver.
///
/// Only input the caller already typed in upper case qualifies, so that
/// `Mercedes` or `apple` go through name resolution while `SAP.DE` does not.
pub fn is_ticker_shaped(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed != trimmed.to_uppercase() {
        return false;
    }
    TICKER_REGEX.is_match(trimmed) && !ISIN_REGEX.is_match(trimmed)
}
