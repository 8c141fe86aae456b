//! Pluggable text-generation backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: one chat-completion call plus health/identity
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! Prompt construction and response parsing live in `advisor`; backends
//! only move text.
//!
//! # Configuration
//!
//! From `[ai]` in the config file, overridable by environment variables:
//! - `AI_BACKEND`: ollama, openai_compatible, mock or none. Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::config::{AiBackendKind, AiConfig};
use crate::error::Result;

/// Trait implemented by every text-generation backend
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Run one completion and return the raw response text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (OpenAI, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build a client from configuration
    ///
    /// Returns None when the backend is `none` or its host is not set.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        match config.backend {
            AiBackendKind::Ollama => OllamaBackend::from_config(config).map(AIClient::Ollama),
            AiBackendKind::OpenaiCompatible => {
                OpenAICompatibleBackend::from_config(config).map(AIClient::OpenAICompatible)
            }
            AiBackendKind::Mock => Some(AIClient::Mock(MockBackend::new())),
            AiBackendKind::None => None,
        }
    }

    /// Build a client from the default config plus environment variables
    pub fn from_env() -> Option<Self> {
        let mut config = crate::config::Config::default();
        config.apply_env(|key| std::env::var(key).ok());
        Self::from_config(&config.ai)
    }

    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.complete(request).await,
            AIClient::OpenAICompatible(b) => b.complete(request).await,
            AIClient::Mock(b) => b.complete(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_from_config_requires_host() {
        let mut config = Config::default().ai;
        config.backend = AiBackendKind::Ollama;
        config.ollama_host = String::new();
        assert!(AIClient::from_config(&config).is_none());

        config.ollama_host = "http://localhost:11434".into();
        let client = AIClient::from_config(&config).unwrap();
        assert_eq!(client.backend_name(), "ollama");
        assert_eq!(client.host(), "http://localhost:11434");
    }

    #[test]
    fn test_from_config_variants() {
        let mut config = Config::default().ai;
        config.backend = AiBackendKind::None;
        assert!(AIClient::from_config(&config).is_none());

        config.backend = AiBackendKind::Mock;
        assert_eq!(AIClient::from_config(&config).unwrap().backend_name(), "mock");

        config.backend = AiBackendKind::OpenaiCompatible;
        config.openai_host = "http://localhost:8000/".into();
        config.openai_model = "qwen".into();
        let client = AIClient::from_config(&config).unwrap();
        assert_eq!(client.backend_name(), "openai_compatible");
        assert_eq!(client.host(), "http://localhost:8000");
        assert_eq!(client.model(), "qwen");
    }
}
