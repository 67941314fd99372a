//! Gemini-backed reasoning client.

use async_trait::async_trait;
use log::debug;
use moneta_core::tickers::ReasoningClient;
use moneta_core::ResolveError;
use reqwest::Client as HttpClient;
use rig::{
    client::CompletionClient,
    completion::Prompt,
    providers::gemini,
};

use crate::error::AiError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const PROVIDER_ID: &str = "gemini";

/// Asks Gemini for a JSON answer at temperature 0.
///
/// No request timeout is set here: the name resolver bounds every call.
pub struct GeminiReasoningClient {
    client: gemini::Client<HttpClient>,
    model: String,
}

impl std::fmt::Debug for GeminiReasoningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiReasoningClient")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiReasoningClient {
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self, AiError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AiError::MissingApiKey(PROVIDER_ID.to_string()));
        }
        let client = gemini::Client::new(api_key).map_err(|e| AiError::provider(e.to_string()))?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }

    /// Same as [`GeminiReasoningClient::new`] but against a non-default endpoint.
    pub fn with_base_url(
        api_key: &str,
        model: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, AiError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AiError::MissingApiKey(PROVIDER_ID.to_string()));
        }
        let client = gemini::Client::<HttpClient>::builder()
            .api_key(api_key.to_string())
            .base_url(base_url)
            .build()
            .map_err(|e| AiError::provider(e.to_string()))?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReasoningClient for GeminiReasoningClient {
    async fn complete_json(
        &self,
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, ResolveError> {
        debug!(
            "Gemini request: model {}, {} prompt chars, {} max tokens",
            self.model,
            prompt.len(),
            max_output_tokens
        );

        // Temperature and max tokens only reach the wire when a generationConfig is present.
        let agent = self
            .client
            .agent(&self.model)
            .temperature(0.0)
            .max_tokens(u64::from(max_output_tokens))
            .additional_params(serde_json::json!({
                "generationConfig": { "responseMimeType": "application/json" }
            }))
            .build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| ResolveError::from(AiError::provider(e.to_string())))
    }
}
