//! Suggestion client interface and types

use crate::error::{FeatureError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Hosted or local LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
    /// Local models, no API key
    Ollama,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4",
            ProviderKind::Anthropic => "claude-3-sonnet-20240229",
            ProviderKind::Google => "gemini-pro",
            ProviderKind::Ollama => "llama2",
        }
    }

    /// Environment variable holding the API key, `None` for keyless providers
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Google => Some("GOOGLE_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }
}

impl FromStr for ProviderKind {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "google" => Ok(ProviderKind::Google),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(FeatureError::invalid_parameter(
                "provider",
                other,
                "expected one of openai, anthropic, google, ollama",
            )),
        }
    }
}

/// Where API keys come from
pub trait CredentialSource {
    fn api_key(&self, provider: ProviderKind) -> Option<String>;
}

/// Reads `{PROVIDER}_API_KEY` from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        let var = provider.api_key_env()?;
        std::env::var(var).ok().filter(|key| !key.is_empty())
    }
}

/// Explicit key first, then `source`. A missing key is logged, not raised.
pub fn resolve_api_key(
    provider: ProviderKind,
    explicit: Option<String>,
    source: &dyn CredentialSource,
) -> Option<String> {
    let key = explicit.or_else(|| source.api_key(provider));
    if key.is_none() && provider.requires_api_key() {
        tracing::warn!(
            provider = provider.name(),
            env = provider.api_key_env().unwrap_or_default(),
            "No API key found"
        );
    }
    key
}

/// Request to a suggestion client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub prompt: String,
    pub model: String,
    /// System message/instructions
    pub system: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SuggestionRequest {
    pub fn new(prompt: String, model: String) -> Self {
        Self {
            prompt,
            model,
            system: None,
            temperature: 0.7,
            max_tokens: 500,
        }
    }

    pub fn with_system(mut self, system: String) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text completion backend
pub trait SuggestionClient: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Complete `request`, returning the generated text
    fn complete(&self, request: &SuggestionRequest) -> Result<String>;
}

/// Canned client for tests and offline use
#[derive(Debug, Clone)]
pub struct StaticClient {
    provider: ProviderKind,
    response: std::result::Result<String, String>,
}

impl StaticClient {
    /// Always answers `response`
    pub fn new(provider: ProviderKind, response: impl Into<String>) -> Self {
        Self {
            provider,
            response: Ok(response.into()),
        }
    }

    /// Always fails with `message`
    pub fn failing(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            response: Err(message.into()),
        }
    }
}

impl SuggestionClient for StaticClient {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn complete(&self, _request: &SuggestionRequest) -> Result<String> {
        self.response
            .clone()
            .map_err(|message| FeatureError::ComputationError(format!("{} client: {}", self.provider.name(), message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCredentials(Option<&'static str>);

    impl CredentialSource for FixedCredentials {
        fn api_key(&self, _provider: ProviderKind) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn test_provider_defaults() {
        assert_eq!(ProviderKind::OpenAi.default_model(), "gpt-4");
        assert_eq!(ProviderKind::Anthropic.api_key_env(), Some("ANTHROPIC_API_KEY"));
        assert!(!ProviderKind::Ollama.requires_api_key());
        assert_eq!("Google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert!("cohere".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_resolve_api_key() {
        let source = FixedCredentials(Some("from-source"));
        assert_eq!(
            resolve_api_key(ProviderKind::OpenAi, Some("explicit".to_string()), &source).as_deref(),
            Some("explicit")
        );
        assert_eq!(
            resolve_api_key(ProviderKind::OpenAi, None, &source).as_deref(),
            Some("from-source")
        );
        assert_eq!(resolve_api_key(ProviderKind::OpenAi, None, &FixedCredentials(None)), None);
    }

    #[test]
    fn test_static_client() {
        let request = SuggestionRequest::new("hi".to_string(), "gpt-4".to_string());
        assert_eq!(
            StaticClient::new(ProviderKind::OpenAi, "hello").complete(&request).unwrap(),
            "hello"
        );
        assert!(StaticClient::failing(ProviderKind::OpenAi, "down").complete(&request).is_err());
    }
}
