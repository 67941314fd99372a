//! Tolerant parsing of provider-formatted numbers.
//!
//! Providers and spreadsheets hand out numbers as strings in either US
//! (`1,234.56`) or European (`1.234,56`) notation, sometimes with a currency
//! sign, a leading `+` or a trailing `%`.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse a formatted number, accepting both US and European conventions.
///
/// Rules:
/// - whitespace, quotes, currency signs, `%` and a leading `+` are dropped
/// - if both `,` and `.` occur, the one appearing last is the decimal separator
/// - a single `,` on its own is a decimal separator (`"0,74"` is `0.74`);
///   several are thousands separators
/// - several `.` are thousands separators; a single one is decimal
///
/// Returns `None` for empty or non-numeric input.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(*c, '"' | '\'' | '%' | '$' | '€' | '£'))
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let normalized = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned.to_string(),
    };

    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}
