//! Generation provider configuration
//!
//! Defines the supported chat-completion providers and how to talk to
//! them. Formats and endpoints are fixed per provider; model choice is
//! configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for each supported provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    #[default]
    Anthropic,
    OpenAi,
    OpenRouter,
}

impl ProviderId {
    /// All available provider IDs, default first
    pub fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Anthropic,
            ProviderId::OpenAi,
            ProviderId::OpenRouter,
        ]
    }

    /// Parse a user-supplied provider name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Some(ProviderId::Anthropic),
            "openai" => Some(ProviderId::OpenAi),
            "openrouter" => Some(ProviderId::OpenRouter),
            _ => None,
        }
    }

    /// Get the storage key for this provider (used in credentials.json)
    pub fn storage_key(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::OpenAi => "openai",
            ProviderId::OpenRouter => "openrouter",
        }
    }

    /// Default chat endpoint for this provider
    pub fn api_url(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "https://api.anthropic.com/v1/messages",
            ProviderId::OpenAi => "https://api.openai.com/v1/chat/completions",
            ProviderId::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
        }
    }

    /// Request/response format this provider speaks
    pub fn api_format(&self) -> ApiFormat {
        match self {
            ProviderId::Anthropic => ApiFormat::Anthropic,
            ProviderId::OpenAi | ProviderId::OpenRouter => ApiFormat::OpenAi,
        }
    }

    /// How this provider expects the API key
    pub fn auth_header(&self) -> AuthHeader {
        match self {
            ProviderId::Anthropic => AuthHeader::XApiKey,
            ProviderId::OpenAi | ProviderId::OpenRouter => AuthHeader::Bearer,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Anthropic => write!(f, "Anthropic"),
            ProviderId::OpenAi => write!(f, "OpenAI"),
            ProviderId::OpenRouter => write!(f, "OpenRouter"),
        }
    }
}

/// How to send the API key in requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthHeader {
    /// Use `x-api-key: <key>` header (Anthropic style)
    #[default]
    XApiKey,
    /// Use `Authorization: Bearer <key>` header (OpenAI style)
    Bearer,
}

/// Wire format of the chat-completion API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ApiFormat {
    #[default]
    Anthropic,
    OpenAi,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_providers() {
        assert_eq!(ProviderId::parse("anthropic"), Some(ProviderId::Anthropic));
        assert_eq!(ProviderId::parse("OpenAI"), Some(ProviderId::OpenAi));
        assert_eq!(ProviderId::parse("openrouter"), Some(ProviderId::OpenRouter));
    }

    #[test]
    fn test_parse_unknown_provider_is_none() {
        assert_eq!(ProviderId::parse("mistral"), None);
    }

    #[test]
    fn test_every_provider_has_endpoint_and_format() {
        for provider in ProviderId::all() {
            assert!(provider.api_url().starts_with("https://"));
            let _ = provider.api_format();
            let _ = provider.auth_header();
        }
    }
}
