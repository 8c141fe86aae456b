//! Insight handlers
//!
//! Generated insights are persisted so they survive reloads and can be
//! dismissed or restored.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::ai::{parse_goal_names, parse_monthly_income};
use crate::{AppError, AppState, SuccessResponse};
use finsight_core::advisor::fallback_insights;
use finsight_core::AIInsight;

/// Query parameters for listing insights
#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    #[serde(default)]
    pub include_dismissed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInsightsRequest {
    #[serde(default)]
    pub monthly_income: Value,
    #[serde(default)]
    pub financial_goals: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInsightsResponse {
    pub insights: Vec<AIInsight>,
    pub health_score: f64,
    /// False when the backend failed and the generic fallback was returned
    pub saved: bool,
}

/// GET /api/insights - Stored insights, newest first
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InsightQuery>,
) -> Result<Json<Vec<AIInsight>>, AppError> {
    let mut insights = state.store.list_insights(params.include_dismissed)?;
    insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(insights))
}

/// POST /api/insights/generate - Generate insights from stored transactions
///
/// Only model output is persisted. When the AI backend fails the generic
/// fallback insight is returned with `saved: false` and not stored.
pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateInsightsRequest>,
) -> Result<Json<GenerateInsightsResponse>, AppError> {
    let monthly_income = parse_monthly_income(&body.monthly_income)?;
    let mut goals = parse_goal_names(&body.financial_goals);
    if goals.is_empty() {
        goals = state
            .store
            .list_goals()?
            .into_iter()
            .map(|g| g.name)
            .collect();
    }

    let advisor = state.advisor.as_ref().ok_or_else(|| {
        AppError::internal("Failed to generate insights")
            .with_details("AI service is not configured")
    })?;

    let transactions = state.store.list_transactions()?;
    match advisor
        .try_generate_insights(&transactions, monthly_income, &goals)
        .await
    {
        Ok(report) => {
            let insights = state.store.add_insights(report.insights)?;
            Ok(Json(GenerateInsightsResponse {
                insights,
                health_score: report.health_score,
                saved: true,
            }))
        }
        Err(e) => {
            warn!("Insight generation failed, returning unsaved fallback: {}", e);
            let report = fallback_insights();
            Ok(Json(GenerateInsightsResponse {
                insights: report.insights,
                health_score: report.health_score,
                saved: false,
            }))
        }
    }
}

/// POST /api/insights/:id/dismiss
pub async fn dismiss_insight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.set_insight_dismissed(&id, true)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/insights/:id/restore
pub async fn restore_insight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.set_insight_dismissed(&id, false)?;
    Ok(Json(SuccessResponse { success: true }))
}
