//! Name → ticker resolution through the reasoning service.
//!
//! Every successful answer is written to the [`TickerDirectory`], so the
//! reasoning service is only consulted once per security across all users.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::directory::TickerDirectory;
use super::symbol::normalize_symbol;
use super::tickers_model::{NewTickerEntry, ResolvedTicker, TickerEntry};
use super::tickers_traits::ReasoningClient;
use crate::errors::{Error, ResolveError, Result};

/// Default hard timeout for one reasoning call.
pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_secs(20);

/// Output budget for a single-name answer.
const SINGLE_MAX_TOKENS: u32 = 200;
/// Output budget per name in a batch, and the overall cap.
const BATCH_TOKENS_PER_NAME: u32 = 160;
const BATCH_MAX_TOKENS: u32 = 8192;

/// Names accepted by one batch call.
pub const MAX_BATCH_SIZE: usize = 50;

/// Longest input forwarded to the reasoning service.
const MAX_INPUT_CHARS: usize = 200;

const UNKNOWN_SENTINEL: &str = "UNKNOWN";

const RULES: &str = "Rules:
- XETRA listings get the suffix \".DE\" (e.g. \"SAP.DE\", \"MBG.DE\")
- US listings get no suffix (e.g. \"AAPL\", \"MSFT\")
- For an ISIN, answer with the ticker of the primary listing
- sector and industry in English, or null
- If you cannot identify the security: symbol = \"UNKNOWN\"";

/// One answer object as the reasoning service writes it.
#[derive(Debug, Deserialize)]
struct RawResolution {
    #[serde(default)]
    input: Option<String>,
    #[serde(default, alias = "ticker")]
    symbol: Option<String>,
    #[serde(default, alias = "companyName", alias = "name")]
    company_name: Option<String>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    competitors: Option<String>,
}

/// Accept `"A, B"` as well as `["A", "B"]`.
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Array(items) => {
            let names: Vec<String> = items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            (!names.is_empty()).then(|| names.join(", "))
        }
        _ => None,
    })
}

impl RawResolution {
    /// `None` when the service signalled it does not know the security.
    fn into_resolved(self, fallback_name: &str) -> Option<ResolvedTicker> {
        let symbol = normalize_symbol(self.symbol.as_deref().unwrap_or_default());
        if symbol.is_empty() || symbol == UNKNOWN_SENTINEL {
            return None;
        }
        let company_name = self
            .company_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| fallback_name.trim().to_string());

        Some(ResolvedTicker {
            symbol,
            company_name,
            sector: self.sector,
            industry: self.industry,
            description: self.description,
            competitors: self.competitors,
        })
    }
}

/// Resolves free-form names (or ISINs) to canonical tickers.
pub struct NameResolver {
    client: Arc<dyn ReasoningClient>,
    directory: Arc<TickerDirectory>,
    timeout: Duration,
}

impl NameResolver {
    pub fn new(client: Arc<dyn ReasoningClient>, directory: Arc<TickerDirectory>) -> Self {
        Self {
            client,
            directory,
            timeout: DEFAULT_RESOLVER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve `raw_input` and persist the result.
    ///
    /// Returns the directory's view of the ticker, which is the other writer's
    /// row if a concurrent resolution inserted it first.
    pub async fn resolve(&self, raw_input: &str) -> Result<ResolvedTicker> {
        let entry = self.resolve_entry(raw_input).await?;
        Ok(ResolvedTicker::from(&entry))
    }

    /// Like [`resolve`](Self::resolve) but returns the stored directory row.
    pub async fn resolve_entry(&self, raw_input: &str) -> Result<TickerEntry> {
        let resolved = self.ask(raw_input).await?;
        info!(
            "Resolved '{}' to {} ({})",
            raw_input.trim(),
            resolved.symbol,
            resolved.company_name
        );
        self.directory
            .insert_or_get(NewTickerEntry::from(resolved))
            .await
    }

    /// Resolve several names with one reasoning call.
    ///
    /// Names the service cannot identify are left out of the result. Results
    /// are persisted with `upsert_many`; a failed write is logged and does not
    /// fail the batch.
    pub async fn resolve_many(&self, names: &[String]) -> Result<Vec<ResolvedTicker>> {
        let mut seen = HashSet::new();
        let names: Vec<&str> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty() && seen.insert(n.to_lowercase()))
            .collect();

        if names.is_empty() {
            return Ok(Vec::new());
        }
        if names.len() > MAX_BATCH_SIZE {
            return Err(Error::Validation(format!(
                "at most {} names per batch, got {}",
                MAX_BATCH_SIZE,
                names.len()
            )));
        }

        let prompt = Self::batch_prompt(&names);
        let budget = (BATCH_TOKENS_PER_NAME * names.len() as u32).min(BATCH_MAX_TOKENS);
        let text = self.call(&prompt, budget).await?;

        let items = match Self::parse_json(&text)? {
            Value::Object(mut body) => match body.remove("results") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ResolveError::UpstreamFormat(
                        "batch answer has no \"results\" array".to_string(),
                    )
                    .into())
                }
            },
            Value::Array(items) => items,
            _ => {
                return Err(ResolveError::UpstreamFormat(
                    "batch answer is neither an object nor an array".to_string(),
                )
                .into())
            }
        };

        let mut resolved = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            let raw: RawResolution = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping malformed batch item #{}: {}", i, e);
                    continue;
                }
            };
            let fallback = raw
                .input
                .clone()
                .or_else(|| names.get(i).map(|n| n.to_string()))
                .unwrap_or_default();
            match raw.into_resolved(&fallback) {
                Some(ticker) => resolved.push(ticker),
                None => debug!("Batch resolution: no ticker for '{}'", fallback),
            }
        }

        let entries: Vec<NewTickerEntry> = resolved.iter().cloned().map(NewTickerEntry::from).collect();
        if let Err(e) = self.directory.upsert_many(entries).await {
            warn!("Failed to persist {} batch resolutions: {}", resolved.len(), e);
        }

        info!("Batch resolution: {} of {} names resolved", resolved.len(), names.len());
        Ok(resolved)
    }

    /// Ask the reasoning service about a single name, without persisting.
    async fn ask(&self, raw_input: &str) -> Result<ResolvedTicker> {
        let input = raw_input.trim();
        if input.is_empty() {
            return Err(Error::Validation("name must not be empty".to_string()));
        }

        let text = self.call(&Self::single_prompt(input), SINGLE_MAX_TOKENS).await?;
        let raw: RawResolution = serde_json::from_value(Self::parse_json(&text)?)
            .map_err(|e| ResolveError::UpstreamFormat(e.to_string()))?;

        raw.into_resolved(input)
            .ok_or_else(|| ResolveError::Unresolvable(input.to_string()).into())
    }

    async fn call(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.client.complete_json(prompt, max_output_tokens))
            .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                warn!("Reasoning call exceeded {:?}", self.timeout);
                Err(ResolveError::Timeout.into())
            }
        }
    }

    /// Remove a ```json ... ``` wrapper if the service added one anyway.
    fn strip_fences(text: &str) -> &str {
        let t = text.trim();
        let t = t
            .strip_prefix("```json")
            .or_else(|| t.strip_prefix("```JSON"))
            .or_else(|| t.strip_prefix("```"))
            .unwrap_or(t);
        t.strip_suffix("```").unwrap_or(t).trim()
    }

    fn parse_json(text: &str) -> Result<Value> {
        serde_json::from_str(Self::strip_fences(text)).map_err(|e| {
            warn!("Reasoning service returned non-JSON output: {}", text);
            ResolveError::UpstreamFormat(e.to_string()).into()
        })
    }

    /// Quote-safe, length-bounded input for embedding in a prompt.
    fn sanitize(input: &str) -> String {
        input
            .chars()
            .filter(|c| !c.is_control())
            .map(|c| if c == '"' { '\'' } else { c })
            .take(MAX_INPUT_CHARS)
            .collect()
    }

    fn single_prompt(input: &str) -> String {
        format!(
            "You are a financial markets expert. Determine the exchange ticker for \"{}\".\n\n\
             Answer ONLY with one JSON object, no other text, no backticks:\n\
             {{\"symbol\": \"TICKER.EXCHANGE\", \"company_name\": \"official company name\", \
             \"sector\": \"sector or null\", \"industry\": \"industry or null\", \
             \"description\": \"one sentence or null\", \"competitors\": \"comma-separated names or null\"}}\n\n{}",
            Self::sanitize(input),
            RULES
        )
    }

    fn batch_prompt(names: &[&str]) -> String {
        let list = names
            .iter()
            .map(|n| format!("- \"{}\"", Self::sanitize(n)))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "You are a financial markets expert. Determine the exchange ticker for each of these names:\n{}\n\n\
             Answer ONLY with one JSON object, no other text, no backticks:\n\
             {{\"results\": [{{\"input\": \"name as given\", \"symbol\": \"TICKER.EXCHANGE\", \
             \"company_name\": \"official company name\", \"sector\": \"sector or null\", \
             \"industry\": \"industry or null\"}}]}}\n\
             One result per name, in the given order.\n\n{}",
            list, RULES
        )
    }
}
