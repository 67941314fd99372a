use std::sync::Arc;

use moneta_ai::GeminiReasoningClient;
use moneta_core::{
    financial_data::FinancialDataService,
    prices::{PriceStore, PriceWriteback},
    quotes::QuoteService,
    tickers::{NameResolver, ReasoningClient, TickerDirectory, TickerResolver, TickerStore},
};
use moneta_market_data::{AlphaVantageProvider, BudgetLimits, QuoteProvider, RateBudget};
use moneta_storage_sqlite::{
    db::{self, write_actor},
    PriceRepository, TickerRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    auth::AuthManager,
    config::{Config, QuoteProviderConfig},
};

pub struct AppState {
    pub directory: Arc<TickerDirectory>,
    pub names: Arc<NameResolver>,
    pub quote_service: Arc<QuoteService>,
    pub financial_data_service: Arc<FinancialDataService>,
    /// `None` when no JWT secret is configured.
    pub auth: Option<AuthManager>,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(false))
        .init();
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let provider: Arc<dyn QuoteProvider> = Arc::new(match &config.quote_provider {
        QuoteProviderConfig::AlphaVantage { api_key } => AlphaVantageProvider::new(api_key.clone()),
        QuoteProviderConfig::RapidApi { api_key } => AlphaVantageProvider::rapidapi(api_key.clone()),
    });
    let gemini = match &config.gemini_base_url {
        Some(base_url) => GeminiReasoningClient::with_base_url(
            &config.gemini_api_key,
            config.gemini_model.clone(),
            base_url,
        )?,
        None => GeminiReasoningClient::new(&config.gemini_api_key, config.gemini_model.clone())?,
    };
    let reasoner: Arc<dyn ReasoningClient> = Arc::new(gemini);
    build_state_with(config, provider, reasoner).await
}

/// Wire the services around the given upstream clients.
pub async fn build_state_with(
    config: &Config,
    provider: Arc<dyn QuoteProvider>,
    reasoner: Arc<dyn ReasoningClient>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let ticker_store: Arc<dyn TickerStore> =
        Arc::new(TickerRepository::new(pool.clone(), writer.clone()));
    let price_store: Arc<dyn PriceStore> = Arc::new(PriceRepository::new(pool.clone(), writer));

    let directory = Arc::new(TickerDirectory::new(ticker_store));
    let names = Arc::new(
        NameResolver::new(reasoner, directory.clone()).with_timeout(config.resolver_timeout),
    );
    let resolver = Arc::new(TickerResolver::new(directory.clone(), names.clone()));

    let (writeback, _writeback_handle) =
        PriceWriteback::spawn(directory.clone(), price_store.clone());

    let default_limits = BudgetLimits::from(provider.rate_limit());
    let limits = BudgetLimits {
        per_minute: config
            .quote_limit_per_minute
            .unwrap_or(default_limits.per_minute),
        per_day: config.quote_limit_per_day.unwrap_or(default_limits.per_day),
    };
    tracing::info!(
        "Quote provider {} with {} calls/minute and {} calls/day",
        provider.id(),
        limits.per_minute,
        limits.per_day
    );

    let quote_service = Arc::new(
        QuoteService::new(provider, resolver.clone())
            .with_ttl(config.quote_ttl)
            .with_budget(Arc::new(RateBudget::new(limits)))
            .with_price_sink(Arc::new(writeback)),
    );
    let financial_data_service = Arc::new(FinancialDataService::new(
        resolver,
        price_store,
        quote_service.clone(),
    ));

    let auth = match &config.jwt_secret {
        Some(secret) => Some(AuthManager::new(secret)),
        None => {
            tracing::warn!("MONETA_JWT_SECRET is not set; protected routes will reject all requests");
            None
        }
    };

    Ok(Arc::new(AppState {
        directory,
        names,
        quote_service,
        financial_data_service,
        auth,
    }))
}
