//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - OpenAI itself (https://api.openai.com)
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AiConfig;
use crate::error::{Error, Result};

use super::types::CompletionRequest;
use super::AIBackend;

/// OpenAI-compatible backend
///
/// ```rust,ignore
/// // vLLM
/// export AI_BACKEND="openai_compatible"
/// export OPENAI_COMPATIBLE_HOST="http://192.168.1.100:8000"
/// export OPENAI_COMPATIBLE_MODEL="meta-llama/Llama-3.2-3B-Instruct"
/// ```
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
        }
    }

    /// Create from config; `None` if no host is set
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let host = config.openai_host.trim();
        if host.is_empty() {
            return None;
        }
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();
        let api_key = Some(config.openai_api_key.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Some(Self {
            http_client,
            base_url: host.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            api_key,
        })
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user,
        });

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Ai(format!("OpenAI API error {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Ai("Empty response from OpenAI-compatible API".into()))?;

        debug!(task = request.task.as_str(), "OpenAI-compatible response: {}", content);
        Ok(content)
    }

    async fn health_check(&self) -> bool {
        // /v1/models is standard; /health covers llama-server and LocalAI
        for path in ["/v1/models", "/health"] {
            let mut req = self.http_client.get(format!("{}{}", self.base_url, path));
            if let Some(ref api_key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
            if let Ok(resp) = req.send().await {
                if resp.status().is_success() {
                    return true;
                }
            }
        }
        false
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
