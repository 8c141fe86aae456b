//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{AppError, AppState, SuccessResponse};
use finsight_core::{budget_statuses, Budget, BudgetStatus, NewBudget};

/// GET /api/budgets - Budgets with spent refreshed from transactions
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BudgetStatus>>, AppError> {
    let budgets = state.store.list_budgets()?;
    let transactions = state.store.list_transactions()?;
    Ok(Json(budget_statuses(&budgets, &transactions, state.today())))
}

/// POST /api/budgets
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewBudget>,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let budget = state.store.add_budget(&body)?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// PUT /api/budgets/:id
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<NewBudget>,
) -> Result<Json<Budget>, AppError> {
    Ok(Json(state.store.update_budget(&id, &body)?))
}

/// DELETE /api/budgets/:id
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.delete_budget(&id)?;
    Ok(Json(SuccessResponse { success: true }))
}
