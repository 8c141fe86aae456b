//! Goal handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use finsight_core::{goal_statuses, FinancialGoal, GoalStatus, NewGoal};

#[derive(Debug, Deserialize)]
pub struct ContributeRequest {
    pub amount: f64,
}

/// GET /api/goals - Goals with progress
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GoalStatus>>, AppError> {
    let goals = state.store.list_goals()?;
    Ok(Json(goal_statuses(&goals, state.today())))
}

/// POST /api/goals
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewGoal>,
) -> Result<(StatusCode, Json<FinancialGoal>), AppError> {
    let goal = state.store.add_goal(&body)?;
    Ok((StatusCode::CREATED, Json(goal)))
}

/// PUT /api/goals/:id
pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<NewGoal>,
) -> Result<Json<FinancialGoal>, AppError> {
    Ok(Json(state.store.update_goal(&id, &body)?))
}

/// POST /api/goals/:id/contribute - Add to the goal's current amount
pub async fn contribute_to_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ContributeRequest>,
) -> Result<Json<FinancialGoal>, AppError> {
    Ok(Json(state.store.contribute_to_goal(&id, body.amount)?))
}

/// DELETE /api/goals/:id
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.delete_goal(&id)?;
    Ok(Json(SuccessResponse { success: true }))
}
