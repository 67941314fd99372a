//! Server configuration, read from the environment (and `.env`).

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use moneta_ai::DEFAULT_GEMINI_MODEL;
use moneta_core::quotes::DEFAULT_QUOTE_TTL_SECS;
use moneta_core::tickers::DEFAULT_RESOLVER_TIMEOUT;

/// Which Alpha Vantage endpoint to use and the key for it.
#[derive(Clone)]
pub enum QuoteProviderConfig {
    AlphaVantage { api_key: String },
    RapidApi { api_key: String },
}

impl std::fmt::Debug for QuoteProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlphaVantage { .. } => f.write_str("AlphaVantage { api_key: *** }"),
            Self::RapidApi { .. } => f.write_str("RapidApi { api_key: *** }"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow_origins: Vec<String>,
    pub request_timeout: Duration,
    pub quote_ttl: chrono::Duration,
    pub quote_limit_per_minute: Option<u32>,
    pub quote_limit_per_day: Option<u32>,
    pub quote_provider: QuoteProviderConfig,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Overrides the Gemini endpoint, e.g. for a proxy.
    pub gemini_base_url: Option<String>,
    pub resolver_timeout: Duration,
    /// HS256 secret for bearer tokens. Without it protected routes reject
    /// every request.
    pub jwt_secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("db_path", &self.db_path)
            .field("cors_allow_origins", &self.cors_allow_origins)
            .field("request_timeout", &self.request_timeout)
            .field("quote_ttl", &self.quote_ttl)
            .field("quote_limit_per_minute", &self.quote_limit_per_minute)
            .field("quote_limit_per_day", &self.quote_limit_per_day)
            .field("quote_provider", &self.quote_provider)
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("resolver_timeout", &self.resolver_timeout)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen_addr = get("MONETA_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid MONETA_LISTEN_ADDR")?;
        let db_path = get("MONETA_DB_PATH").unwrap_or_else(|| "./db/moneta.db".to_string());
        let cors_allow_origins = get("MONETA_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout = match get("MONETA_REQUEST_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_value("MONETA_REQUEST_TIMEOUT_MS", &v)?),
            None => Duration::from_secs(30),
        };
        let quote_ttl_secs: i64 = match get("MONETA_QUOTE_TTL_SECS") {
            Some(v) => parse_value("MONETA_QUOTE_TTL_SECS", &v)?,
            None => DEFAULT_QUOTE_TTL_SECS,
        };
        if quote_ttl_secs <= 0 {
            bail!("MONETA_QUOTE_TTL_SECS must be positive");
        }
        let quote_ttl = chrono::Duration::try_seconds(quote_ttl_secs)
            .context("MONETA_QUOTE_TTL_SECS is out of range")?;
        let quote_limit_per_minute = get("MONETA_QUOTE_LIMIT_PER_MINUTE")
            .map(|v| parse_value("MONETA_QUOTE_LIMIT_PER_MINUTE", &v))
            .transpose()?;
        let quote_limit_per_day = get("MONETA_QUOTE_LIMIT_PER_DAY")
            .map(|v| parse_value("MONETA_QUOTE_LIMIT_PER_DAY", &v))
            .transpose()?;

        let quote_provider = match (get("ALPHA_VANTAGE_API_KEY"), get("RAPIDAPI_KEY")) {
            (Some(api_key), _) => QuoteProviderConfig::AlphaVantage { api_key },
            (None, Some(api_key)) => QuoteProviderConfig::RapidApi { api_key },
            (None, None) => bail!("Set ALPHA_VANTAGE_API_KEY or RAPIDAPI_KEY"),
        };
        let gemini_api_key = get("GEMINI_API_KEY").ok_or_else(|| anyhow!("Set GEMINI_API_KEY"))?;
        let gemini_model =
            get("MONETA_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_base_url = get("MONETA_GEMINI_BASE_URL");
        let resolver_timeout = match get("MONETA_RESOLVER_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_value("MONETA_RESOLVER_TIMEOUT_SECS", &v)?),
            None => DEFAULT_RESOLVER_TIMEOUT,
        };
        let jwt_secret = get("MONETA_JWT_SECRET").map(|s| decode_secret(&s));

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow_origins,
            request_timeout,
            quote_ttl,
            quote_limit_per_minute,
            quote_limit_per_day,
            quote_provider,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            resolver_timeout,
            jwt_secret,
        })
    }
}

fn parse_value<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow!("Invalid {}: {} ({})", key, value, e))
}

/// Base64 secrets of at least 32 bytes are decoded; anything else is used
/// as raw bytes.
fn decode_secret(value: &str) -> Vec<u8> {
    match BASE64.decode(value) {
        Ok(bytes) if bytes.len() >= 32 => bytes,
        _ => value.as_bytes().to_vec(),
    }
}
