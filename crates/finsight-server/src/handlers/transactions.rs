//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppError, AppState, SuccessResponse, MAX_PAGE_LIMIT};
use finsight_core::{
    ImportStats, NewTransaction, SortField, SortOrder, Transaction, TransactionFilter,
    TransactionType,
};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    /// Search query (name, merchant, category, notes, tags)
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
    /// Bounds on the absolute amount
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub tag: Option<String>,
    /// Sort field (date, amount, name, category)
    pub sort: Option<String>,
    /// Sort direction (asc or desc)
    pub order: Option<String>,
}

fn default_limit() -> usize {
    50
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub transactions: Vec<Transaction>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

fn parse_date_param(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::bad_request(&format!("Invalid {} date: {}", name, s))),
        None => Ok(None),
    }
}

/// GET /api/transactions - List transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<TransactionResponse>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset;

    let from = parse_date_param(params.from.as_deref(), "from")?;
    let to = parse_date_param(params.to.as_deref(), "to")?;

    let sort_field: SortField = match params.sort.as_deref() {
        Some(s) => s.parse().map_err(|e: String| AppError::bad_request(&e))?,
        None => SortField::default(),
    };
    let sort_order: SortOrder = match params.order.as_deref() {
        Some(s) => s.parse().map_err(|e: String| AppError::bad_request(&e))?,
        None => SortOrder::default(),
    };

    let all = state.store.list_transactions()?;
    let result = TransactionFilter::new()
        .search(params.search.as_deref())
        .category(params.category.as_deref())
        .transaction_type(params.transaction_type)
        .date_range(from, to)
        .amount_range(params.min_amount, params.max_amount)
        .tag(params.tag.as_deref())
        .sort(sort_field, sort_order)
        .paginate(offset, Some(limit))
        .apply(&all);

    Ok(Json(TransactionResponse {
        transactions: result.transactions,
        total: result.total,
        limit,
        offset,
    }))
}

/// GET /api/transactions/:id
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(state.store.get_transaction(&id)?))
}

/// POST /api/transactions - Validate and store a new transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let tx = state.store.add_transaction(&body, state.today())?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// PUT /api/transactions/:id
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(
        state.store.update_transaction(&id, &body, state.today())?,
    ))
}

/// DELETE /api/transactions/:id
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.delete_transaction(&id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/transactions/import - Import raw records, skipping invalid ones
pub async fn import_transactions(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<ImportStats>, AppError> {
    let records = match body {
        Value::Array(records) => records,
        // Also accept {"transactions": [...]}, the shape of an export file
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(records)) => records,
            _ => return Err(AppError::bad_request("Expected a list of transactions")),
        },
        _ => return Err(AppError::bad_request("Expected a list of transactions")),
    };

    Ok(Json(
        state.store.import_transactions(records, state.today())?,
    ))
}
