use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use moneta_core::prices::{PriceCacheEntry, PriceStore};
use moneta_core::Result;
use rust_decimal::Decimal;

use super::model::{NewPriceCacheDB, PriceCacheDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::price_cache;
use crate::utils::format_timestamp;

pub struct PriceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PriceStore for PriceRepository {
    fn get_cached_price(&self, ticker_id: i64) -> Result<Option<PriceCacheEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let row = price_cache::table
            .filter(price_cache::ticker_id.eq(ticker_id))
            .select(PriceCacheDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(PriceCacheEntry::try_from).transpose()?)
    }

    async fn upsert_price(
        &self,
        ticker_id: i64,
        price: Option<Decimal>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let row = NewPriceCacheDB {
            ticker_id,
            price: price.map(|p| p.to_string()),
            last_updated: format_timestamp(at),
        };
        self.writer
            .exec(move |conn| -> Result<()> {
                diesel::insert_into(price_cache::table)
                    .values(&row)
                    .on_conflict(price_cache::ticker_id)
                    .do_update()
                    .set((
                        price_cache::price.eq(&row.price),
                        price_cache::last_updated.eq(&row.last_updated),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
