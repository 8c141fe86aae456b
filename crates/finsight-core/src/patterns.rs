//! Spending patterns and forecasts
//!
//! Looks at the whole transaction history (not a dashboard period):
//! - Per-category averages, trend and next-period forecast
//! - A one-month-ahead forecast over all expenses

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::metrics::growth_percentage;
use crate::models::{PortfolioForecast, SpendingPattern, Transaction, Trend};

/// Analyzer with the window sizes and trend thresholds it uses
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    /// Observations counted as "recent" per category
    recent_observations: usize,
    /// Months on each side of the portfolio comparison
    forecast_months: usize,
    /// Trend percentage beyond which a category is increasing/decreasing
    trend_threshold: f64,
}

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self {
            recent_observations: 5,
            forecast_months: 3,
            trend_threshold: 10.0,
        }
    }

    fn classify(&self, trend_percentage: f64) -> Trend {
        if trend_percentage > self.trend_threshold {
            Trend::Increasing
        } else if trend_percentage < -self.trend_threshold {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }

    /// One pattern per expense category, largest average first
    pub fn spending_patterns(&self, transactions: &[Transaction]) -> Vec<SpendingPattern> {
        let mut by_category: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for tx in transactions.iter().filter(|t| t.is_expense()) {
            by_category
                .entry(tx.category.as_str())
                .or_default()
                .push((tx.date, tx.amount.abs()));
        }

        let mut patterns: Vec<SpendingPattern> = by_category
            .into_iter()
            .map(|(category, mut observations)| {
                // Stable sort keeps insertion order for same-day entries
                observations.sort_by_key(|(date, _)| *date);
                self.category_pattern(category, &observations)
            })
            .collect();

        patterns.sort_by(|a, b| {
            b.average_monthly
                .total_cmp(&a.average_monthly)
                .then_with(|| a.category.cmp(&b.category))
        });
        patterns
    }

    fn category_pattern(&self, category: &str, observations: &[(NaiveDate, f64)]) -> SpendingPattern {
        let amounts: Vec<f64> = observations.iter().map(|(_, a)| *a).collect();
        let split = amounts.len().saturating_sub(self.recent_observations);
        let (older, recent) = amounts.split_at(split);

        let trend_percentage = growth_percentage(mean(recent), mean(older));

        let months: BTreeSet<String> = observations
            .iter()
            .map(|(date, _)| date.format("%Y-%m").to_string())
            .collect();
        let total: f64 = amounts.iter().sum();
        let average_monthly = if months.is_empty() {
            0.0
        } else {
            total / months.len() as f64
        };

        SpendingPattern {
            category: category.to_string(),
            average_monthly,
            trend: self.classify(trend_percentage),
            trend_percentage,
            forecast_next_period: average_monthly * (1.0 + trend_percentage / 100.0),
            confidence: (50.0 + amounts.len() as f64 * 2.0).min(90.0),
            observation_count: amounts.len(),
        }
    }

    /// Forecast next month's total expenses from calendar-month totals
    pub fn forecast(&self, transactions: &[Transaction]) -> PortfolioForecast {
        let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
        for tx in transactions.iter().filter(|t| t.is_expense()) {
            *monthly
                .entry(tx.date.format("%Y-%m").to_string())
                .or_insert(0.0) += tx.amount.abs();
        }

        if monthly.is_empty() {
            return PortfolioForecast {
                next_month: 0.0,
                trend_percentage: 0.0,
                trend: Trend::Stable,
                confidence: 0.0,
                months_observed: 0,
            };
        }

        let totals: Vec<f64> = monthly.into_values().collect();
        let recent_start = totals.len().saturating_sub(self.forecast_months);
        let older_start = recent_start.saturating_sub(self.forecast_months);
        let recent = &totals[recent_start..];
        let older = &totals[older_start..recent_start];

        let trend_percentage = growth_percentage(mean(recent), mean(older));

        PortfolioForecast {
            next_month: mean(recent) * (1.0 + trend_percentage / 100.0),
            trend_percentage,
            trend: self.classify(trend_percentage),
            confidence: (60.0 + totals.len() as f64 * 5.0).min(95.0),
            months_observed: totals.len(),
        }
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Patterns with the default analyzer
pub fn spending_patterns(transactions: &[Transaction]) -> Vec<SpendingPattern> {
    PatternAnalyzer::new().spending_patterns(transactions)
}

/// Portfolio forecast with the default analyzer
pub fn forecast(transactions: &[Transaction]) -> PortfolioForecast {
    PatternAnalyzer::new().forecast(transactions)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
