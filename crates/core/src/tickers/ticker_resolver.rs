use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use super::directory::TickerDirectory;
use super::name_resolver::NameResolver;
use super::symbol::{is_ticker_shaped, normalize_symbol};
use super::tickers_model::TickerEntry;
use crate::errors::{Error, Result};

/// Upper bound on remembered aliases. The memo is dropped wholesale when full;
/// the directory and the reasoning service remain the source of truth.
const MAX_ALIASES: usize = 4096;

/// Turns whatever the user typed into a canonical ticker.
///
/// Lookup order: exact symbol, company-name substring, then the reasoning
/// service (whose answer is persisted). Inputs that never match a directory
/// row by themselves, such as ISINs, are remembered per process so the
/// reasoning service is asked only once.
pub struct TickerResolver {
    directory: Arc<TickerDirectory>,
    names: Arc<NameResolver>,
    aliases: Mutex<HashMap<String, String>>,
}

impl TickerResolver {
    pub fn new(directory: Arc<TickerDirectory>, names: Arc<NameResolver>) -> Self {
        Self {
            directory,
            names,
            aliases: Mutex::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Arc<TickerDirectory> {
        &self.directory
    }

    pub fn names(&self) -> &Arc<NameResolver> {
        &self.names
    }

    fn lock_aliases(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.aliases.lock().unwrap_or_else(|poisoned| {
            warn!("Ticker alias mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn remember_alias(&self, alias: String, symbol: String) {
        let mut aliases = self.lock_aliases();
        if aliases.len() >= MAX_ALIASES && !aliases.contains_key(&alias) {
            debug!("Alias memo reached {} entries, clearing", aliases.len());
            aliases.clear();
        }
        aliases.insert(alias, symbol);
    }

    /// Symbol to quote. Ticker-shaped input is used as is, without touching
    /// the directory or the reasoning service.
    pub async fn resolve_symbol(&self, input: &str) -> Result<String> {
        if is_ticker_shaped(input) {
            return Ok(normalize_symbol(input));
        }
        Ok(self.resolve_entry(input).await?.symbol)
    }

    /// Directory row for `input`, creating it through the reasoning service
    /// on a miss.
    pub async fn resolve_entry(&self, input: &str) -> Result<TickerEntry> {
        let query = input.trim();
        if query.is_empty() {
            return Err(Error::Validation("query must not be empty".to_string()));
        }

        if let Some(entry) = self.directory.lookup(query)? {
            return Ok(entry);
        }

        let alias_key = normalize_symbol(query);
        let known = self.lock_aliases().get(&alias_key).cloned();
        if let Some(symbol) = known {
            if let Some(entry) = self.directory.find_by_symbol(&symbol)? {
                debug!("Resolved '{}' via alias {}", query, symbol);
                return Ok(entry);
            }
        }

        let entry = self.names.resolve_entry(query).await?;
        if alias_key != entry.symbol {
            self.remember_alias(alias_key, entry.symbol.clone());
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockTickerStore, StubReasoner};
    use crate::tickers::NewTickerEntry;
    use std::sync::atomic::Ordering;

    fn resolver(
        store: MockTickerStore,
        reasoner: StubReasoner,
    ) -> (TickerResolver, Arc<MockTickerStore>, Arc<StubReasoner>) {
        let store = Arc::new(store);
        let reasoner = Arc::new(reasoner);
        let directory = Arc::new(TickerDirectory::new(store.clone()));
        let names = Arc::new(NameResolver::new(reasoner.clone(), directory.clone()));
        (TickerResolver::new(directory, names), store, reasoner)
    }

    #[tokio::test]
    async fn test_ticker_shaped_input_skips_everything() {
        let (resolver, store, reasoner) =
            resolver(MockTickerStore::default(), StubReasoner::answering("{}"));

        assert_eq!(resolver.resolve_symbol(" EUNL ").await.unwrap(), "EUNL");
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 0);
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_name_found_in_directory() {
        let (resolver, _, reasoner) = resolver(
            MockTickerStore::with_rows(vec![NewTickerEntry::new("MBG.DE", "Mercedes-Benz Group AG")]),
            StubReasoner::answering("{}"),
        );

        assert_eq!(resolver.resolve_symbol("Mercedes").await.unwrap(), "MBG.DE");
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_name_goes_to_reasoning_once() {
        let (resolver, store, reasoner) = resolver(
            MockTickerStore::default(),
            StubReasoner::answering(r#"{"symbol": "SAP.DE", "company_name": "SAP SE"}"#),
        );

        assert_eq!(resolver.resolve_symbol("sap").await.unwrap(), "SAP.DE");
        // Second lookup hits the directory through the company-name match.
        assert_eq!(resolver.resolve_symbol("sap").await.unwrap(), "SAP.DE");
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.count("SAP.DE"), 1);
    }

    #[tokio::test]
    async fn test_isin_is_remembered() {
        let (resolver, _, reasoner) = resolver(
            MockTickerStore::default(),
            StubReasoner::answering(
                r#"{"symbol": "EUNL.DE", "company_name": "iShares Core MSCI World UCITS ETF"}"#,
            ),
        );

        let first = resolver.resolve_entry("IE00B4L5Y983").await.unwrap();
        let second = resolver.resolve_entry("ie00b4l5y983").await.unwrap();
        assert_eq!(first.symbol, "EUNL.DE");
        assert_eq!(second.id, first.id);
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ticker_shaped_unknown_symbol_resolves_for_entry() {
        // The financial-data path needs a directory row even for symbols.
        let (resolver, store, _) = resolver(
            MockTickerStore::default(),
            StubReasoner::answering(r#"{"symbol": "AAPL", "company_name": "Apple Inc."}"#),
        );
        let entry = resolver.resolve_entry("AAPL").await.unwrap();
        assert_eq!(entry.company_name, "Apple Inc.");
        assert_eq!(store.count("AAPL"), 1);
    }

    #[test]
    fn test_alias_memo_is_bounded() {
        let (resolver, _, _) = resolver(MockTickerStore::default(), StubReasoner::answering("{}"));
        for i in 0..MAX_ALIASES {
            resolver.remember_alias(format!("ALIAS{i}"), "AAPL".to_string());
        }
        assert_eq!(resolver.lock_aliases().len(), MAX_ALIASES);

        // Re-remembering a known alias does not evict anything.
        resolver.remember_alias("ALIAS0".to_string(), "MSFT".to_string());
        assert_eq!(resolver.lock_aliases().len(), MAX_ALIASES);

        resolver.remember_alias("IE00B4L5Y983".to_string(), "EUNL.DE".to_string());
        let aliases = resolver.lock_aliases();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.get("IE00B4L5Y983").map(String::as_str), Some("EUNL.DE"));
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let (resolver, _, _) = resolver(MockTickerStore::default(), StubReasoner::answering("{}"));
        assert!(matches!(
            resolver.resolve_entry("  ").await,
            Err(Error::Validation(_))
        ));
    }
}
