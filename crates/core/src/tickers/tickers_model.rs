//! Ticker directory domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical identity of a tradable security, shared by every user.
///
/// `symbol` is unique and never changes once the row exists; later writes may
/// only refine the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerEntry {
    pub id: i64,
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub static_description: Option<String>,
    pub static_pe_ratio: Option<Decimal>,
    pub competitors: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input model for creating or refining a directory row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTickerEntry {
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub static_description: Option<String>,
    pub static_pe_ratio: Option<Decimal>,
    pub competitors: Option<String>,
}

impl NewTickerEntry {
    pub fn new(symbol: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: company_name.into(),
            ..Default::default()
        }
    }

    /// Uppercase the symbol and drop blank optional fields.
    pub fn normalized(self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
        }

        let symbol = super::normalize_symbol(&self.symbol);
        let company_name = match self.company_name.trim() {
            "" => symbol.clone(),
            name => name.to_string(),
        };

        Self {
            symbol,
            company_name,
            sector: non_blank(self.sector),
            industry: non_blank(self.industry),
            static_description: non_blank(self.static_description),
            static_pe_ratio: self.static_pe_ratio,
            competitors: non_blank(self.competitors),
        }
    }
}

/// Result of resolving a free-form name to a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTicker {
    pub symbol: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitors: Option<String>,
}

impl From<ResolvedTicker> for NewTickerEntry {
    fn from(resolved: ResolvedTicker) -> Self {
        NewTickerEntry {
            symbol: resolved.symbol,
            company_name: resolved.company_name,
            sector: resolved.sector,
            industry: resolved.industry,
            static_description: resolved.description,
            static_pe_ratio: None,
            competitors: resolved.competitors,
        }
        .normalized()
    }
}

impl From<&TickerEntry> for ResolvedTicker {
    fn from(entry: &TickerEntry) -> Self {
        ResolvedTicker {
            symbol: entry.symbol.clone(),
            company_name: entry.company_name.clone(),
            sector: entry.sector.clone(),
            industry: entry.industry.clone(),
            description: entry.static_description.clone(),
            competitors: entry.competitors.clone(),
        }
    }
}
