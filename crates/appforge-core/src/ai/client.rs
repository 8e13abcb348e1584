//! Generation API client
//!
//! Non-streaming chat-completion calls against Anthropic- or
//! OpenAI-format endpoints. One request per generation; there is no
//! streaming surface because the caller only ever wants the finished
//! document.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use super::error::ProviderError;
use super::providers::{ApiFormat, AuthHeader, ProviderId};
use crate::constants;

/// API version header for Anthropic
const API_VERSION: &str = "2023-06-01";

/// Configuration for the generation client
#[derive(Debug, Clone)]
pub struct GenClientConfig {
    /// Model ID to use for API calls
    pub model: String,
    /// Maximum output tokens
    pub max_tokens: usize,
    /// Optional base URL override (defaults to provider default)
    pub base_url: Option<String>,
    /// Which provider this config is for
    pub provider_id: ProviderId,
}

impl Default for GenClientConfig {
    fn default() -> Self {
        Self {
            model: constants::ai::DEFAULT_MODEL.to_string(),
            max_tokens: constants::ai::MAX_OUTPUT_TOKENS,
            base_url: None,
            provider_id: ProviderId::Anthropic,
        }
    }
}

impl GenClientConfig {
    /// Config for a provider with its default endpoint and model override
    pub fn for_provider(provider_id: ProviderId, model: Option<&str>) -> Self {
        Self {
            model: model
                .map(str::to_string)
                .unwrap_or_else(|| constants::ai::DEFAULT_MODEL.to_string()),
            provider_id,
            ..Self::default()
        }
    }

    /// Get the API URL to use
    pub fn api_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider_id.api_url().to_string())
    }

    fn api_format(&self) -> ApiFormat {
        self.provider_id.api_format()
    }
}

/// Chat-completion client for the generation collaborator
pub struct GenClient {
    http: Client,
    config: GenClientConfig,
    api_key: String,
}

impl GenClient {
    /// Create the HTTP client with generation-friendly timeouts
    fn create_http_client() -> Client {
        Client::builder()
            .user_agent("AppForge/1.0")
            .connect_timeout(constants::http::CONNECT_TIMEOUT)
            .timeout(constants::http::REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client: {}. Using default client.", e);
                Client::new()
            })
    }

    /// Create a new client with API key
    pub fn new(config: GenClientConfig, api_key: String) -> Self {
        Self {
            http: Self::create_http_client(),
            config,
            api_key,
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &GenClientConfig {
        &self.config
    }

    /// Build a request with proper authentication headers
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.post(url);

        match self.config.provider_id.auth_header() {
            AuthHeader::Bearer => {
                request = request.header("authorization", format!("Bearer {}", self.api_key));
            }
            AuthHeader::XApiKey => {
                request = request.header("x-api-key", &self.api_key);
            }
        }

        if self.config.api_format() == ApiFormat::Anthropic {
            request = request.header("anthropic-version", API_VERSION);
        }

        request.header("content-type", "application/json")
    }

    /// Handle an error response and return a formatted error
    async fn handle_error_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!("API error response: {} - {}", status, message);
        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Make a non-streaming chat-completion call
    ///
    /// Returns the text content of the response, routed through the
    /// provider's wire format.
    pub async fn call_simple(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, ProviderError> {
        match self.config.api_format() {
            ApiFormat::Anthropic => self.call_simple_anthropic(system_prompt, user_message).await,
            ApiFormat::OpenAi => self.call_simple_openai(system_prompt, user_message).await,
        }
    }

    /// Simple non-streaming call using Anthropic format
    async fn call_simple_anthropic(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{
                "role": "user",
                "content": user_message
            }],
            "system": system_prompt
        });

        debug!(model = %self.config.model, "Anthropic-format generation call");

        let request = self.build_request(&self.config.api_url());
        let response = request.json(&body).send().await?;
        let response = self.handle_error_response(response).await?;

        let json: Value = response.json().await?;

        // Some providers emit thinking blocks before text blocks, so walk
        // every block and keep only text content
        let text = json
            .get("content")
            .and_then(|c| c.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|block| {
                        if block.get("type").and_then(|t| t.as_str()) == Some("text") {
                            block.get("text").and_then(|t| t.as_str())
                        } else {
                            None
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(text)
    }

    /// Simple non-streaming call using OpenAI format
    async fn call_simple_openai(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_message}
            ]
        });

        debug!(model = %self.config.model, "OpenAI-format generation call");

        let request = self.build_request(&self.config.api_url());
        let response = request.json(&body).send().await?;
        let response = self.handle_error_response(response).await?;

        let json: Value = response.json().await?;

        let text = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(text)
    }
}
