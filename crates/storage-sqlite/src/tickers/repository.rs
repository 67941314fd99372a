use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use moneta_core::tickers::{NewTickerEntry, TickerEntry, TickerStore};
use moneta_core::Result;

use super::model::{NewTickerMappingDB, TickerMappingDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::ticker_mapping;
use crate::utils::{contains_pattern, format_timestamp, LIKE_ESCAPE};

/// Metadata refinement for an existing row. `None` fields are left untouched.
#[derive(AsChangeset)]
#[diesel(table_name = ticker_mapping)]
struct TickerRefinementDB {
    sector: Option<String>,
    industry: Option<String>,
    static_description: Option<String>,
    static_pe_ratio: Option<String>,
    competitors: Option<String>,
    updated_at: String,
}

pub struct TickerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TickerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn first_matching<F>(&self, query: F) -> Result<Option<TickerEntry>>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<Option<TickerMappingDB>>,
    {
        let mut conn = get_connection(&self.pool)?;
        let row = query(&mut conn).map_err(StorageError::from)?;
        Ok(row.map(TickerEntry::try_from).transpose()?)
    }
}

fn insert_row(conn: &mut SqliteConnection, row: &NewTickerMappingDB) -> Result<TickerMappingDB> {
    Ok(diesel::insert_into(ticker_mapping::table)
        .values(row)
        .returning(TickerMappingDB::as_returning())
        .get_result(conn)
        .map_err(StorageError::from)?)
}

#[async_trait]
impl TickerStore for TickerRepository {
    fn find_by_symbol(&self, symbol: &str) -> Result<Option<TickerEntry>> {
        self.first_matching(|conn| {
            ticker_mapping::table
                .filter(ticker_mapping::symbol.eq(symbol))
                .select(TickerMappingDB::as_select())
                .first(conn)
                .optional()
        })
    }

    fn find_by_name_like(&self, fragment: &str) -> Result<Option<TickerEntry>> {
        let pattern = contains_pattern(fragment);
        // SQLite LIKE is case-insensitive for ASCII; oldest row wins.
        self.first_matching(|conn| {
            ticker_mapping::table
                .filter(ticker_mapping::company_name.like(pattern).escape(LIKE_ESCAPE))
                .order(ticker_mapping::id.asc())
                .select(TickerMappingDB::as_select())
                .first(conn)
                .optional()
        })
    }

    async fn insert(&self, entry: NewTickerEntry) -> Result<TickerEntry> {
        let row = NewTickerMappingDB::from_domain(entry, Utc::now());
        self.writer
            .exec(move |conn| -> Result<TickerEntry> {
                let inserted = insert_row(conn, &row)?;
                debug!("Inserted ticker {} (id {})", inserted.symbol, inserted.id);
                Ok(TickerEntry::try_from(inserted)?)
            })
            .await
    }

    async fn upsert_many(&self, entries: Vec<NewTickerEntry>) -> Result<usize> {
        let now = Utc::now();
        let rows: Vec<NewTickerMappingDB> = entries
            .into_iter()
            .map(|entry| NewTickerMappingDB::from_domain(entry, now))
            .collect();

        self.writer
            .exec(move |conn| -> Result<usize> {
                let mut written = 0;
                for row in rows {
                    let existing = ticker_mapping::table
                        .filter(ticker_mapping::symbol.eq(&row.symbol))
                        .select(ticker_mapping::id)
                        .first::<i64>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    match existing {
                        Some(id) => {
                            let refinement = TickerRefinementDB {
                                sector: row.sector,
                                industry: row.industry,
                                static_description: row.static_description,
                                static_pe_ratio: row.static_pe_ratio,
                                competitors: row.competitors,
                                updated_at: format_timestamp(now),
                            };
                            written += diesel::update(ticker_mapping::table.find(id))
                                .set(&refinement)
                                .execute(conn)
                                .map_err(StorageError::from)?;
                        }
                        None => {
                            insert_row(conn, &row)?;
                            written += 1;
                        }
                    }
                }
                Ok(written)
            })
            .await
    }
}
