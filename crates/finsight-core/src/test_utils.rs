//! Test utilities for finsight-core
//!
//! A mock OpenAI-compatible completion server for integration tests of the
//! advisor and the HTTP API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::ai::OpenAICompatibleBackend;

#[derive(Clone)]
enum Behavior {
    /// Answer based on which prompt was sent
    Canned,
    /// Always return this content
    Fixed(String),
    /// Always fail with this status
    Fail(StatusCode),
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

/// Mock chat completions server bound to a random local port
pub struct MockCompletionServer {
    addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCompletionServer {
    /// Start a server that answers each prompt type with plausible JSON
    pub async fn start() -> Self {
        Self::spawn(Behavior::Canned).await
    }

    /// Start a server that returns `content` for every completion
    pub async fn with_response(content: &str) -> Self {
        Self::spawn(Behavior::Fixed(content.to_string())).await
    }

    /// Start a server that fails every completion with `status`
    pub async fn failing(status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::spawn(Behavior::Fail(status)).await
    }

    async fn spawn(behavior: Behavior) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            behavior,
            calls: calls.clone(),
        };
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_completion))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            calls,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Backend pointed at this server
    pub fn backend(&self) -> OpenAICompatibleBackend {
        OpenAICompatibleBackend::new(&self.url(), "mock-model")
    }

    /// Completions served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockCompletionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct Message {
    role: String,
    content: String,
}

async fn handle_models() -> Json<serde_json::Value> {
    Json(json!({"object": "list", "data": [{"id": "mock-model", "object": "model"}]}))
}

async fn handle_completion(
    State(state): State<MockState>,
    Json(request): Json<CompletionRequest>,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let prompt = request
        .messages
        .iter()
        .filter(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let content = match &state.behavior {
        Behavior::Fail(status) => {
            return (*status, Json(json!({"error": {"message": "mock failure"}})))
                .into_response()
        }
        Behavior::Fixed(content) => content.clone(),
        Behavior::Canned => canned_content(&prompt),
    };

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": request.model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

/// These markers match the prompt files in prompts/*.md
fn canned_content(prompt: &str) -> String {
    if prompt.contains("trustScore") {
        json!({
            "anomalies": [{
                "transactionId": "tx-1",
                "description": "Unusually large purchase",
                "severity": "high",
                "reason": "Five times the usual amount for this category",
                "amount": -950.0
            }],
            "trustScore": 80
        })
        .to_string()
    } else if prompt.contains("savings strategies") {
        format!(
            "Here are some ideas:\n```json\n{}\n```",
            json!({
                "strategies": [{
                    "title": "Meal planning",
                    "description": "Plan weekly meals to cut takeout.",
                    "potentialSavings": 150,
                    "difficulty": "easy",
                    "timeframe": "1 month",
                    "steps": ["Plan meals on Sunday", "Shop with a list"]
                }]
            })
        )
    } else if prompt.contains("healthScore") {
        json!({
            "insights": [{
                "type": "saving",
                "title": "You are saving steadily",
                "description": "Your savings rate is above 20%.",
                "impact": "low",
                "actionItems": ["Automate transfers to savings"],
                "confidence": 0.9
            }],
            "healthScore": 81
        })
        .to_string()
    } else if prompt.contains("Pick exactly one category") {
        let lower = prompt.to_lowercase();
        let category = if lower.contains("coffee") || lower.contains("restaurant") {
            "Food & Dining"
        } else if lower.contains("netflix") {
            "Subscriptions"
        } else {
            "Other"
        };
        json!({"category": category}).to_string()
    } else {
        "You are on track. Keep your dining spending under control.".to_string()
    }
}
