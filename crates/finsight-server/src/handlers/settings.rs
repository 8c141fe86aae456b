//! Settings handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{AppError, AppState};
use finsight_core::Settings;

/// GET /api/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.store.get_settings()?))
}

/// PUT /api/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.store.update_settings(body)?))
}
