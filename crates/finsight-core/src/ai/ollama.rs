//! Ollama backend implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AiConfig;
use crate::error::{Error, Result};

use super::types::CompletionRequest;
use super::AIBackend;

/// Ollama backend using `/api/generate`
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from config; `None` if no host is set
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let host = config.ollama_host.trim();
        if host.is_empty() {
            return None;
        }
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();
        Some(Self {
            http_client,
            base_url: host.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
        })
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    /// Ollama's name for the token budget
    num_predict: u32,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = OllamaRequest {
            model: &self.model,
            prompt: &request.user,
            system: request.system.as_deref(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Ai(format!("Ollama error {}: {}", status, body)));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(
            task = request.task.as_str(),
            "Ollama response: {}", ollama_response.response
        );
        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
