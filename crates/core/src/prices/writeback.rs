//! Background persistence of fetched prices.
//!
//! Live fetches hand their result to [`PriceWriteback::submit`] and move on.
//! A single worker task drains the queue, maps the symbol to its directory
//! row and upserts the durable price. Failures are logged and dropped: the
//! caller's response never depends on this write.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::prices_model::PriceUpdate;
use super::prices_traits::{PriceSink, PriceStore};
use crate::errors::Result;
use crate::tickers::TickerDirectory;

pub struct PriceWriteback {
    tx: mpsc::UnboundedSender<PriceUpdate>,
}

impl PriceWriteback {
    /// Start the worker on the current tokio runtime.
    ///
    /// The worker stops once every `PriceWriteback` handle is dropped and the
    /// queue is drained.
    pub fn spawn(
        directory: Arc<TickerDirectory>,
        prices: Arc<dyn PriceStore>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(price_writeback_worker(rx, directory, prices));
        (Self { tx }, handle)
    }
}

impl PriceSink for PriceWriteback {
    fn submit(&self, update: PriceUpdate) {
        if let Err(e) = self.tx.send(update) {
            warn!(
                "Price writeback worker is gone, dropping price for {}",
                e.0.symbol
            );
        }
    }
}

async fn price_writeback_worker(
    mut rx: mpsc::UnboundedReceiver<PriceUpdate>,
    directory: Arc<TickerDirectory>,
    prices: Arc<dyn PriceStore>,
) {
    info!("Price writeback worker started");
    while let Some(update) = rx.recv().await {
        if let Err(e) = persist(&update, &directory, prices.as_ref()).await {
            warn!("Failed to persist price for {}: {}", update.symbol, e);
        }
    }
    info!("Price writeback worker shutting down");
}

async fn persist(
    update: &PriceUpdate,
    directory: &TickerDirectory,
    prices: &dyn PriceStore,
) -> Result<()> {
    let Some(entry) = directory.find_by_symbol(&update.symbol)? else {
        // Quotes for tickers typed directly by the user are not in the
        // directory; there is no row to attach the price to.
        debug!("No directory row for {}, skipping durable price", update.symbol);
        return Ok(());
    };
    prices
        .upsert_price(entry.id, Some(update.price), update.fetched_at)
        .await?;
    debug!("Persisted price {} for {}", update.price, update.symbol);
    Ok(())
}
