//! Dashboard handlers: metrics, patterns, forecast and reports
//!
//! Everything here is derived from the stored transactions on each request.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use finsight_core::{
    compute_metrics, forecast, spending_patterns, FinancialMetrics, FinancialReport, Period,
    PortfolioForecast, ReportGenerator, ReportPeriod, SpendingPattern,
};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

/// GET /api/metrics?period=week|month|year
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<FinancialMetrics>, AppError> {
    let period: Period = match params.period.as_deref() {
        Some(p) => p.parse().map_err(|e: String| AppError::bad_request(&e))?,
        None => Period::default(),
    };
    let transactions = state.store.list_transactions()?;
    Ok(Json(compute_metrics(&transactions, period, state.today())))
}

/// GET /api/patterns
pub async fn get_patterns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SpendingPattern>>, AppError> {
    let transactions = state.store.list_transactions()?;
    Ok(Json(spending_patterns(&transactions)))
}

/// GET /api/forecast
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PortfolioForecast>, AppError> {
    let transactions = state.store.list_transactions()?;
    Ok(Json(forecast(&transactions)))
}

/// GET /api/reports?period=week|month|quarter|year
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<FinancialReport>, AppError> {
    let period: ReportPeriod = match params.period.as_deref() {
        Some(p) => p.parse().map_err(|e: String| AppError::bad_request(&e))?,
        None => ReportPeriod::default(),
    };
    let currency = state.store.get_settings()?.currency;
    let transactions = state.store.list_transactions()?;
    let report = ReportGenerator::new(&currency).generate(&transactions, period, state.today());
    Ok(Json(report))
}
