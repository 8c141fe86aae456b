//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use finsight_core::test_utils::MockCompletionServer;
use finsight_core::{AIClient, PromptLibrary};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
}

fn open_config() -> ServerConfig {
    ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        api_keys: vec![],
    }
}

fn setup_app_with(store: Store, advisor: Option<FinancialAdvisor>) -> Router {
    create_router_with_state(AppState::new(store, open_config(), advisor).with_today(today()))
}

fn setup_test_app() -> Router {
    setup_app_with(Store::in_memory(), None)
}

fn mock_advisor(server: &MockCompletionServer) -> FinancialAdvisor {
    FinancialAdvisor::new(AIClient::OpenAICompatible(server.backend()))
        .with_prompts(PromptLibrary::embedded_only())
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn analysis_body(income: Value) -> Value {
    json!({
        "transactions": [
            {"id": "tx-1", "name": "Salary", "amount": 5000, "category": "Salary", "date": "2024-03-01"},
            {"id": "tx-2", "name": "TV", "amount": -950, "category": "Shopping", "date": "2024-03-05"}
        ],
        "monthlyIncome": income,
        "financialGoals": ["Emergency fund", {"name": "Vacation"}]
    })
}

// ========== Health & Auth Tests ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();
    let (status, json) = send(&app, request("GET", "/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["ai_configured"], false);
}

#[tokio::test]
async fn test_api_key_auth() {
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        api_keys: vec!["secret-key".to_string()],
    };
    let app = create_router_with_state(AppState::new(Store::in_memory(), config, None));

    let (status, json) = send(&app, request("GET", "/api/transactions", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Authentication required");

    let wrong = Request::builder()
        .uri("/api/transactions")
        .header("authorization", "Bearer wrong-key")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

    let ok = Request::builder()
        .uri("/api/transactions")
        .header("authorization", "Bearer secret-key")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, ok).await.0, StatusCode::OK);

    // Health stays public
    let (status, _) = send(&app, request("GET", "/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[test]
fn test_validate_api_key() {
    let keys = vec!["abc123".to_string(), "other".to_string()];
    assert!(validate_api_key("abc123", &keys));
    assert!(validate_api_key("other", &keys));
    assert!(!validate_api_key("abc124", &keys));
    assert!(!validate_api_key("", &keys));
    assert!(!validate_api_key("abc123", &[]));
}

#[tokio::test]
async fn test_security_headers() {
    let app = setup_test_app();
    let response = app
        .oneshot(request("GET", "/api/health", None))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

// ========== Error Mapping Tests ==========

#[test]
fn test_core_errors_map_to_status_codes() {
    let cases = [
        (
            finsight_core::Error::Validation("bad".into()),
            StatusCode::BAD_REQUEST,
        ),
        (
            finsight_core::Error::NotFound("Goal x".into()),
            StatusCode::NOT_FOUND,
        ),
        (
            finsight_core::Error::Conflict("stale".into()),
            StatusCode::CONFLICT,
        ),
        (
            finsight_core::Error::Storage("corrupt".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];
    for (err, expected) in cases {
        assert_eq!(AppError::from(err).status(), expected);
    }
}

// ========== Transaction API Tests ==========

#[tokio::test]
async fn test_create_and_list_transactions() {
    let app = setup_test_app();

    let (status, created) = send(
        &app,
        request(
            "POST",
            "/api/transactions",
            Some(json!({
                "name": "Coffee",
                "amount": "-4.50",
                "category": "Food & Dining",
                "date": "2024-03-18",
                "tags": ["morning"]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["amount"], -4.5);
    assert_eq!(created["type"], "expense");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, list) = send(&app, request("GET", "/api/transactions", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["limit"], 50);
    assert_eq!(list["transactions"][0]["id"], id.as_str());

    let (_, filtered) = send(
        &app,
        request("GET", "/api/transactions?search=morning&type=expense", None),
    )
    .await;
    assert_eq!(filtered["total"], 1);

    let (_, filtered) = send(&app, request("GET", "/api/transactions?type=income", None)).await;
    assert_eq!(filtered["total"], 0);
}

#[tokio::test]
async fn test_create_transaction_validation() {
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/transactions",
            Some(json!({"name": "Future", "amount": -10, "category": "Other", "date": "2024-03-21"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("future"));

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/transactions",
            Some(json!({"name": "Nothing", "amount": "abc", "category": "Other", "date": "2024-03-01"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, request("GET", "/api/transactions", None)).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_update_and_delete_transaction() {
    let app = setup_test_app();

    let (_, created) = send(
        &app,
        request(
            "POST",
            "/api/transactions",
            Some(json!({"name": "Lunch", "amount": -12, "category": "Food & Dining", "date": "2024-03-10"})),
        ),
    )
    .await;
    let uri = format!("/api/transactions/{}", created["id"].as_str().unwrap());

    let (status, updated) = send(
        &app,
        request(
            "PUT",
            &uri,
            Some(json!({"name": "Team lunch", "amount": -48, "category": "Food & Dining", "date": "2024-03-10"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Team lunch");
    assert_eq!(updated["id"], created["id"]);

    let (status, json) = send(&app, request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, _) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_transactions() {
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/transactions/import",
            Some(json!([
                {"id": 7, "description": "Paycheck", "amount": 3000, "category": "Salary", "date": "2024-03-01"},
                {"name": "Groceries", "amount": -80, "category": "Groceries", "date": "2024-03-02"},
                {"name": "Broken", "amount": "n/a", "date": "2024-03-02"},
                {"name": "Zero", "amount": 0, "category": "Other", "date": "2024-03-02"}
            ])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["imported"], 2);
    assert_eq!(json["skipped"], 2);

    let (status, tx) = send(&app, request("GET", "/api/transactions/7", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tx["name"], "Paycheck");

    let (status, _) = send(
        &app,
        request("POST", "/api/transactions/import", Some(json!("nope"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ========== Dashboard API Tests ==========

async fn seed_month(app: &Router) {
    for (name, amount, category) in [("Salary", 5000, "Salary"), ("Rent", -1200, "Housing")] {
        let (status, _) = send(
            app,
            request(
                "POST",
                "/api/transactions",
                Some(json!({"name": name, "amount": amount, "category": category, "date": "2024-03-01"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_metrics_month() {
    let app = setup_test_app();
    seed_month(&app).await;

    let (status, json) = send(&app, request("GET", "/api/metrics?period=month", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["income"], 5000.0);
    assert_eq!(json["expenses"], 1200.0);
    assert_eq!(json["net_worth"], 3800.0);
    assert_eq!(json["savings_rate"], 76.0);
    assert_eq!(json["top_category"], "Housing");
}

#[tokio::test]
async fn test_metrics_week_has_no_comparison() {
    let app = setup_test_app();
    send(
        &app,
        request(
            "POST",
            "/api/transactions",
            Some(json!({"name": "Snacks", "amount": -20, "category": "Groceries", "date": "2024-03-18"})),
        ),
    )
    .await;

    let (status, json) = send(&app, request("GET", "/api/metrics?period=week", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["expenses"], 20.0);
    assert_eq!(json["expense_change"], 0.0);
    assert_eq!(json["income_change"], 0.0);

    let (status, _) = send(&app, request("GET", "/api/metrics?period=decade", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patterns_forecast_and_report() {
    let app = setup_test_app();
    seed_month(&app).await;

    let (status, patterns) = send(&app, request("GET", "/api/patterns", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patterns[0]["category"], "Housing");

    let (status, forecast) = send(&app, request("GET", "/api/forecast", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(forecast.get("next_month").is_some());

    let (status, report) = send(&app, request("GET", "/api/reports?period=month", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["period"], "month");
    assert_eq!(report["start"], "2024-03-01");
    assert_eq!(report["income"]["total"], 5000.0);
    assert_eq!(report["savings"]["rate"], 76.0);

    let (status, _) = send(&app, request("GET", "/api/reports?period=fortnight", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ========== Goals & Budgets API Tests ==========

#[tokio::test]
async fn test_goal_lifecycle() {
    let app = setup_test_app();

    let (status, goal) = send(
        &app,
        request(
            "POST",
            "/api/goals",
            Some(json!({"name": "Emergency fund", "target_amount": 1000})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = goal["id"].as_str().unwrap().to_string();

    let (status, goal) = send(
        &app,
        request(
            "POST",
            &format!("/api/goals/{}/contribute", id),
            Some(json!({"amount": 250})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(goal["current_amount"], 250.0);

    let (_, goals) = send(&app, request("GET", "/api/goals", None)).await;
    assert_eq!(goals[0]["progress"], 25.0);
    assert_eq!(goals[0]["remaining"], 750.0);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/goals/{}", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/api/goals/{}/contribute", id),
            Some(json!({"amount": 10})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_budgets_refresh_spent() {
    let app = setup_test_app();
    send(
        &app,
        request(
            "POST",
            "/api/transactions",
            Some(json!({"name": "Market", "amount": -120, "category": "Groceries", "date": "2024-03-12"})),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/budgets",
            Some(json!({"category": "Groceries", "allocated": 400, "period": "monthly"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, budgets) = send(&app, request("GET", "/api/budgets", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(budgets[0]["spent"], 120.0);
    assert_eq!(budgets[0]["remaining"], 280.0);
    assert_eq!(budgets[0]["over_budget"], false);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/budgets",
            Some(json!({"category": "Groceries", "allocated": 500, "period": "monthly"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ========== Settings API Tests ==========

#[tokio::test]
async fn test_settings_roundtrip() {
    let app = setup_test_app();

    let (status, settings) = send(&app, request("GET", "/api/settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "system");
    assert_eq!(settings["currency"], "USD");

    let (status, settings) = send(
        &app,
        request(
            "PUT",
            "/api/settings",
            Some(json!({"theme": "dark", "authenticated": true, "currency": "EUR"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "dark");

    let (_, settings) = send(&app, request("GET", "/api/settings", None)).await;
    assert_eq!(settings["currency"], "EUR");
}

// ========== AI API Tests ==========

#[tokio::test]
async fn test_financial_analysis_validation() {
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        request("POST", "/api/ai/financial-analysis", Some(analysis_body(json!(0)))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid monthly income");

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/ai/financial-analysis",
            Some(json!({"transactions": "oops", "monthlyIncome": 4000})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid transactions data");

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/ai/financial-analysis",
            Some(analysis_body(json!("not a number"))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid monthly income");
}

#[tokio::test]
async fn test_financial_analysis_without_ai_backend() {
    let app = setup_test_app();
    let (status, json) = send(
        &app,
        request("POST", "/api/ai/financial-analysis", Some(analysis_body(json!(5000)))),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());
    assert!(json["details"].is_string());
}

#[tokio::test]
async fn test_financial_analysis_with_mock_server() {
    let server = MockCompletionServer::start().await;
    let app = setup_app_with(Store::in_memory(), Some(mock_advisor(&server)));

    let (status, json) = send(
        &app,
        request("POST", "/api/ai/financial-analysis", Some(analysis_body(json!(5000)))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["insights"]["healthScore"], 81.0);
    assert_eq!(json["anomalies"]["trustScore"], 80.0);
    assert_eq!(json["anomalies"]["anomalies"][0]["transactionId"], "tx-1");
    assert_eq!(json["savingsStrategies"][0]["title"], "Meal planning");
    assert_eq!(server.call_count(), 3);

    // Identical inputs are served from the cache
    let (status, again) = send(
        &app,
        request("POST", "/api/ai/financial-analysis", Some(analysis_body(json!(5000)))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, json);
    assert_eq!(server.call_count(), 3);

    // A different income is a new analysis
    send(
        &app,
        request("POST", "/api/ai/financial-analysis", Some(analysis_body(json!(5200)))),
    )
    .await;
    assert_eq!(server.call_count(), 6);
}

#[tokio::test]
async fn test_financial_analysis_falls_back_when_backend_fails() {
    let server = MockCompletionServer::failing(503).await;
    let app = setup_app_with(Store::in_memory(), Some(mock_advisor(&server)));

    let (status, json) = send(
        &app,
        request("POST", "/api/ai/financial-analysis", Some(analysis_body(json!(5000)))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["anomalies"]["anomalies"], json!([]));
    assert_eq!(json["anomalies"]["trustScore"], 95.0);
    assert_eq!(json["insights"]["healthScore"], 50.0);
    assert_eq!(json["savingsStrategies"], json!([]));
}

#[tokio::test]
async fn test_chat() {
    let app = setup_test_app();
    let (status, _) = send(
        &app,
        request("POST", "/api/ai/chat", Some(json!({"message": 42}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let server = MockCompletionServer::start().await;
    let app = setup_app_with(Store::in_memory(), Some(mock_advisor(&server)));
    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/ai/chat",
            Some(json!({"message": "Am I saving enough?", "metrics": {"savings_rate": 12.5}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["response"].as_str().unwrap().contains("on track"));
}

#[tokio::test]
async fn test_chat_backend_failure_is_500() {
    let server = MockCompletionServer::failing(500).await;
    let app = setup_app_with(Store::in_memory(), Some(mock_advisor(&server)));
    let (status, json) = send(
        &app,
        request("POST", "/api/ai/chat", Some(json!({"message": "Hello"}))),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to process chat message");
    assert!(json["details"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_categorize() {
    let app = setup_test_app();
    let (status, _) = send(
        &app,
        request("POST", "/api/ai/categorize", Some(json!({"description": "  "}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        request("POST", "/api/ai/categorize", Some(json!({"description": "Coffee"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "Other");

    let server = MockCompletionServer::start().await;
    let app = setup_app_with(Store::in_memory(), Some(mock_advisor(&server)));
    let (_, json) = send(
        &app,
        request(
            "POST",
            "/api/ai/categorize",
            Some(json!({"description": "Coffee with friends"})),
        ),
    )
    .await;
    assert_eq!(json["category"], "Food & Dining");

    let server = MockCompletionServer::with_response(r#"{"category": "Crypto"}"#).await;
    let app = setup_app_with(Store::in_memory(), Some(mock_advisor(&server)));
    let (_, json) = send(
        &app,
        request("POST", "/api/ai/categorize", Some(json!({"description": "BTC"}))),
    )
    .await;
    assert_eq!(json["category"], "Other");
}

// ========== Insights API Tests ==========

#[tokio::test]
async fn test_generate_and_dismiss_insights() {
    let server = MockCompletionServer::start().await;
    let store = Store::in_memory();
    let app = setup_app_with(store.clone(), Some(mock_advisor(&server)));
    seed_month(&app).await;

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/insights/generate",
            Some(json!({"monthlyIncome": 5000})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["healthScore"], 81.0);
    assert_eq!(json["saved"], true);
    let id = json["insights"][0]["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(store.list_insights(false).unwrap().len(), 1);

    let (status, _) = send(
        &app,
        request("POST", &format!("/api/insights/{}/dismiss", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, visible) = send(&app, request("GET", "/api/insights", None)).await;
    assert_eq!(visible, json!([]));
    let (_, all) = send(
        &app,
        request("GET", "/api/insights?include_dismissed=true", None),
    )
    .await;
    assert_eq!(all[0]["dismissed"], true);

    send(
        &app,
        request("POST", &format!("/api/insights/{}/restore", id), None),
    )
    .await;
    let (_, visible) = send(&app, request("GET", "/api/insights", None)).await;
    assert_eq!(visible.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        request("POST", "/api/insights/missing/dismiss", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_insights_backend_failure_is_not_stored() {
    let server = MockCompletionServer::failing(503).await;
    let store = Store::in_memory();
    let app = setup_app_with(store.clone(), Some(mock_advisor(&server)));
    seed_month(&app).await;

    for _ in 0..2 {
        let (status, json) = send(
            &app,
            request(
                "POST",
                "/api/insights/generate",
                Some(json!({"monthlyIncome": 5000})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["saved"], false);
        assert_eq!(json["healthScore"], 50.0);
        assert_eq!(json["insights"].as_array().unwrap().len(), 1);
    }

    assert!(store.list_insights(true).unwrap().is_empty());
    let (_, all) = send(
        &app,
        request("GET", "/api/insights?include_dismissed=true", None),
    )
    .await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_file_backed_store_persists_across_routers() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app_with(Store::open(dir.path()).unwrap(), None);
    seed_month(&app).await;

    let app = setup_app_with(Store::open(dir.path()).unwrap(), None);
    let (_, list) = send(&app, request("GET", "/api/transactions", None)).await;
    assert_eq!(list["total"], 2);
}
