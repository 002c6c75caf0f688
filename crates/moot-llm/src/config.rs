//! Configuration management for Moot's LLM layer
//!
//! Handles API keys, provider selection, and call timeouts.

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::openai::OpenAIProvider;
use crate::resilient_provider::{LlmCircuitConfig, ResilientProvider};
use crate::{EmbeddingProvider, LlmProvider, MockProvider};

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI API key (env: OPENAI_API_KEY)
    pub openai_api_key: Option<String>,
    /// Google API key for Gemini (env: GOOGLE_API_KEY)
    pub google_api_key: Option<String>,
    /// Override for the OpenAI-compatible API root (env: MOOT_LLM_BASE_URL)
    pub base_url: Option<String>,
    /// Chat model override (env: MOOT_LLM_MODEL)
    pub model: Option<String>,
    /// Embedding model override (env: MOOT_EMBEDDING_MODEL)
    pub embedding_model: Option<String>,
    /// Per-call timeout in seconds (env: MOOT_LLM_TIMEOUT_SECS)
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_api_key: None,
            base_url: None,
            model: None,
            embedding_model: None,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            google_api_key: env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("MOOT_LLM_BASE_URL").ok(),
            model: env::var("MOOT_LLM_MODEL").ok(),
            embedding_model: env::var("MOOT_EMBEDDING_MODEL").ok(),
            timeout_secs: env::var("MOOT_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Name of the provider this config selects
    pub fn provider_name(&self) -> &'static str {
        if self.google_api_key.is_some() {
            "gemini"
        } else if self.openai_api_key.is_some() {
            "openai"
        } else {
            "mock"
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("MOOT_LLM_TIMEOUT_SECS must be > 0".to_string()));
        }
        if self.base_url.is_some() && self.provider_name() == "mock" {
            return Err(ConfigError::MissingEnvVar(
                "OPENAI_API_KEY or GOOGLE_API_KEY (required with MOOT_LLM_BASE_URL)".to_string(),
            ));
        }
        Ok(())
    }

    fn remote_provider(&self) -> Option<OpenAIProvider> {
        let mut provider = match (&self.google_api_key, &self.openai_api_key) {
            (Some(key), _) => OpenAIProvider::gemini(key),
            (None, Some(key)) => OpenAIProvider::new(key, "gpt-4o-mini"),
            (None, None) => return None,
        };

        if let Some(model) = &self.model {
            provider = provider.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            provider = provider.with_base_url(base_url);
        }
        if let Some(embedding_model) = &self.embedding_model {
            provider = provider.with_embedding_model(embedding_model);
        }
        Some(provider.with_timeout(self.timeout()))
    }

    /// Build the chat and embedding providers this config describes.
    ///
    /// Remote providers are wrapped in a [`ResilientProvider`]; without any
    /// API key the smart mock is used so everything still runs offline.
    pub fn build_providers(&self) -> ProviderSet {
        match self.remote_provider() {
            Some(remote) => {
                tracing::info!(provider = self.provider_name(), model = remote.model(), "Initializing resilient LLM provider");
                let circuit = LlmCircuitConfig::conservative().with_call_timeout(self.timeout());
                let provider = Arc::new(ResilientProvider::new(remote, circuit));
                ProviderSet {
                    chat: provider.clone(),
                    embeddings: provider,
                    is_mock: false,
                }
            }
            None => {
                tracing::warn!("No OPENAI_API_KEY or GOOGLE_API_KEY found. Using Mock Provider.");
                let provider = Arc::new(MockProvider::smart());
                ProviderSet {
                    chat: provider.clone(),
                    embeddings: provider,
                    is_mock: true,
                }
            }
        }
    }
}

/// One backend seen through both of its interfaces
#[derive(Debug, Clone)]
pub struct ProviderSet {
    pub chat: Arc<dyn LlmProvider>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub is_mock: bool,
}
