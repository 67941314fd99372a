use diesel::prelude::*;
use moneta_core::prices::PriceCacheEntry;

use crate::errors::StorageError;
use crate::utils::{parse_optional_decimal, parse_timestamp};

/// Database model for the durable last-known price of a ticker.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::price_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceCacheDB {
    pub id: i64,
    pub ticker_id: i64,
    pub price: Option<String>,
    pub last_updated: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::price_cache)]
pub(crate) struct NewPriceCacheDB {
    pub ticker_id: i64,
    pub price: Option<String>,
    pub last_updated: String,
}

impl TryFrom<PriceCacheDB> for PriceCacheEntry {
    type Error = StorageError;

    fn try_from(db: PriceCacheDB) -> Result<Self, Self::Error> {
        Ok(PriceCacheEntry {
            ticker_id: db.ticker_id,
            price: parse_optional_decimal(db.price.as_deref())?,
            last_updated: parse_timestamp(&db.last_updated)?,
        })
    }
}
