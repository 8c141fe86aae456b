//! Finsight Web Server
//!
//! Axum-based REST API for the Finsight personal finance dashboard.
//!
//! Security features:
//! - Bearer API-key authentication when keys are configured
//! - Restrictive CORS policy
//! - Input validation (pagination limits, transaction validation)
//! - Sanitized error responses

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use finsight_core::{AIBackend, AnalysisGuard, Config, FinancialAdvisor, Store};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether requests must carry a valid API key
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Accepted keys, sent as "Bearer <key>" in the Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

impl ServerConfig {
    /// Auth is required exactly when at least one key is configured
    pub fn from_config(config: &Config) -> Self {
        Self {
            require_auth: !config.server.api_keys.is_empty(),
            allowed_origins: config.server.cors_origins.clone(),
            api_keys: config.server.api_keys.clone(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub store: Store,
    pub config: ServerConfig,
    pub advisor: Option<FinancialAdvisor>,
    /// Last full financial analysis, reused for identical inputs
    pub analysis_cache: Mutex<AnalysisGuard>,
    /// Fixed date for tests; `None` means the local calendar date
    pub today_override: Option<NaiveDate>,
}

impl AppState {
    pub fn new(store: Store, config: ServerConfig, advisor: Option<FinancialAdvisor>) -> Self {
        Self {
            store,
            config,
            advisor,
            analysis_cache: Mutex::new(AnalysisGuard::new()),
            today_override: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Authentication middleware - validates the Bearer API key
///
/// Keys are compared in constant time to prevent timing attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key.trim(), &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
/// to prevent timing attacks.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
        {
            return true;
        }
    }
    false
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    ai_configured: bool,
}

/// GET /api/health - Liveness plus whether an AI backend is configured
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        ai_configured: state.advisor.is_some(),
    })
}

/// Create the application router from loaded configuration
pub fn create_router(store: Store, config: &Config, server_config: ServerConfig) -> Router {
    let advisor = FinancialAdvisor::from_config(&config.ai)
        .map(|a| a.with_currency(&config.display.currency));
    if let Some(ref advisor) = advisor {
        info!(
            "AI backend configured: {} at {} (model: {})",
            advisor.client().backend_name(),
            advisor.client().host(),
            advisor.client().model()
        );
    } else {
        info!("ℹ️  AI backend not configured (set OLLAMA_HOST or OPENAI_COMPATIBLE_HOST to enable AI features)");
    }

    create_router_with_state(AppState::new(store, server_config, advisor))
}

/// Create the application router around prepared state (for testing)
pub fn create_router_with_state(state: AppState) -> Router {
    let state = Arc::new(state);
    let config = state.config.clone();

    let api_routes = Router::new()
        // AI
        .route("/ai/categorize", post(handlers::categorize))
        .route("/ai/financial-analysis", post(handlers::financial_analysis))
        .route("/ai/chat", post(handlers::chat))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/import", post(handlers::import_transactions))
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Dashboard
        .route("/metrics", get(handlers::get_metrics))
        .route("/patterns", get(handlers::get_patterns))
        .route("/forecast", get(handlers::get_forecast))
        .route("/reports", get(handlers::get_report))
        // Goals
        .route("/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route(
            "/goals/:id",
            axum::routing::put(handlers::update_goal).delete(handlers::delete_goal),
        )
        .route("/goals/:id/contribute", post(handlers::contribute_to_goal))
        // Budgets
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::create_budget),
        )
        .route(
            "/budgets/:id",
            axum::routing::put(handlers::update_budget).delete(handlers::delete_budget),
        )
        // Insights
        .route("/insights", get(handlers::list_insights))
        .route("/insights/generate", post(handlers::generate_insights))
        .route("/insights/:id/dismiss", post(handlers::dismiss_insight))
        .route("/insights/:id/restore", post(handlers::restore_insight))
        // Settings
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Health stays reachable without a key
    let public_routes = Router::new().route("/health", get(health));

    // Build CORS layer
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", public_routes.merge(api_routes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

/// Start the server
pub async fn serve(
    store: Store,
    config: &Config,
    server_config: ServerConfig,
) -> anyhow::Result<()> {
    if !server_config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    }

    check_ai_connection(config).await;

    let app = create_router(store, config, server_config);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(config: &Config) {
    match finsight_core::AIClient::from_config(&config.ai) {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured; AI endpoints will use fallbacks");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    details: Option<String>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            details: None,
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::with_status(StatusCode::CONFLICT, msg)
    }

    /// Extra context returned to the client as `details`
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = match self.details {
            Some(details) => serde_json::json!({
                "error": self.message,
                "details": details
            }),
            None => serde_json::json!({
                "error": self.message
            }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Client errors from the core carry a message safe to return
        if let Some(core) = err.downcast_ref::<finsight_core::Error>() {
            match core {
                finsight_core::Error::Validation(msg) => return Self::bad_request(msg),
                finsight_core::Error::NotFound(what) => {
                    return Self::not_found(&format!("{} not found", what))
                }
                finsight_core::Error::Conflict(msg) => return Self::conflict(msg),
                _ => {}
            }
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            details: None,
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
