//! AI handlers: categorization, full financial analysis and chat

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{AppError, AppState};
use finsight_core::ai::FALLBACK_CATEGORY;
use finsight_core::store::normalize::normalize_transaction;
use finsight_core::{parse_amount, AnalysisKey, FinancialAnalysis, Transaction};

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub category: String,
}

/// Loose body; shape errors are reported with specific messages
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalysisRequest {
    #[serde(default)]
    pub transactions: Value,
    #[serde(default)]
    pub monthly_income: Value,
    #[serde(default)]
    pub financial_goals: Value,
}

#[derive(Debug, Serialize)]
pub struct FinancialAnalysisResponse {
    #[serde(flatten)]
    pub analysis: FinancialAnalysis,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub transactions: Value,
    #[serde(default)]
    pub metrics: Value,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub success: bool,
}

/// Normalize a JSON list of client-side records; `None` if not a list
pub(crate) fn parse_transactions(value: &Value) -> Option<Vec<Transaction>> {
    let items = value.as_array()?;
    let now = Utc::now();
    let transactions = items
        .iter()
        .filter_map(|item| match normalize_transaction(item.clone(), now) {
            Ok(tx) => Some(tx),
            Err(reason) => {
                warn!(%reason, "Ignoring malformed transaction in request");
                None
            }
        })
        .collect();
    Some(transactions)
}

/// Goal names from a list of strings or of `{name}` objects
pub(crate) fn parse_goal_names(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|g| match g {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Object(o) => o
                        .get("name")
                        .and_then(Value::as_str)
                        .map(|s| s.trim().to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Positive monthly income from a number or numeric string
pub(crate) fn parse_monthly_income(value: &Value) -> Result<f64, AppError> {
    parse_amount(value)
        .filter(|income| *income > 0.0)
        .ok_or_else(|| AppError::bad_request("Invalid monthly income"))
}

/// POST /api/ai/categorize - Suggest a category for a description
pub async fn categorize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, AppError> {
    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::bad_request("Description is required"))?;

    let category = match &state.advisor {
        Some(advisor) => advisor.categorize(description).await,
        None => FALLBACK_CATEGORY,
    };

    Ok(Json(CategorizeResponse {
        category: category.to_string(),
    }))
}

/// POST /api/ai/financial-analysis - Insights, anomalies and savings strategies
///
/// Identical inputs (same transaction count, income and goals) return the
/// cached result of the previous call.
pub async fn financial_analysis(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FinancialAnalysisRequest>,
) -> Result<Json<FinancialAnalysisResponse>, AppError> {
    let transactions = parse_transactions(&body.transactions)
        .ok_or_else(|| AppError::bad_request("Invalid transactions data"))?;
    let monthly_income = parse_monthly_income(&body.monthly_income)?;
    let goals = parse_goal_names(&body.financial_goals);

    let advisor = state.advisor.as_ref().ok_or_else(|| {
        AppError::internal("Failed to generate financial analysis")
            .with_details("AI service is not configured")
    })?;

    let key = AnalysisKey::new(transactions.len(), monthly_income, &goals);
    let cached = state
        .analysis_cache
        .lock()
        .ok()
        .and_then(|guard| guard.cached(&key).cloned());
    if let Some(analysis) = cached {
        info!("Returning cached financial analysis");
        return Ok(Json(FinancialAnalysisResponse {
            analysis,
            success: true,
        }));
    }

    let analysis = advisor
        .financial_analysis(&transactions, monthly_income, &goals)
        .await;

    if let Ok(mut guard) = state.analysis_cache.lock() {
        guard.record(key, analysis.clone());
    }

    Ok(Json(FinancialAnalysisResponse {
        analysis,
        success: true,
    }))
}

/// POST /api/ai/chat - Answer a question about the user's finances
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = body
        .message
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::bad_request("Message is required"))?;

    let advisor = state.advisor.as_ref().ok_or_else(|| {
        AppError::internal("Failed to process chat message")
            .with_details("AI service is not configured")
    })?;

    let transactions = parse_transactions(&body.transactions).unwrap_or_default();
    let metrics = Some(&body.metrics).filter(|m| !m.is_null());

    match advisor.chat(message, &transactions, metrics).await {
        Ok(response) => Ok(Json(ChatResponse {
            response,
            success: true,
        })),
        Err(e) => {
            warn!("Chat request failed: {}", e);
            Err(AppError::internal("Failed to process chat message").with_details(e.to_string()))
        }
    }
}
