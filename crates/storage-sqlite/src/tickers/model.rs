//! Database models for the ticker directory.

use diesel::prelude::*;
use moneta_core::tickers::{NewTickerEntry, TickerEntry};

use crate::errors::StorageError;
use crate::utils::{format_timestamp, parse_optional_decimal, parse_timestamp};

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::ticker_mapping)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TickerMappingDB {
    pub id: i64,
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub static_description: Option<String>,
    pub static_pe_ratio: Option<String>,
    pub competitors: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::ticker_mapping)]
pub struct NewTickerMappingDB {
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub static_description: Option<String>,
    pub static_pe_ratio: Option<String>,
    pub competitors: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl NewTickerMappingDB {
    pub fn from_domain(entry: NewTickerEntry, now: chrono::DateTime<chrono::Utc>) -> Self {
        let entry = entry.normalized();
        let stamp = format_timestamp(now);
        Self {
            symbol: entry.symbol,
            company_name: entry.company_name,
            sector: entry.sector,
            industry: entry.industry,
            static_description: entry.static_description,
            static_pe_ratio: entry.static_pe_ratio.map(|pe| pe.to_string()),
            competitors: entry.competitors,
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }
}

impl TryFrom<TickerMappingDB> for TickerEntry {
    type Error = StorageError;

    fn try_from(db: TickerMappingDB) -> Result<Self, Self::Error> {
        Ok(TickerEntry {
            id: db.id,
            static_pe_ratio: parse_optional_decimal(db.static_pe_ratio.as_deref())?,
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            symbol: db.symbol,
            company_name: db.company_name,
            sector: db.sector,
            industry: db.industry,
            static_description: db.static_description,
            competitors: db.competitors,
        })
    }
}
