//! AI request and response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

use crate::models::AIInsight;

/// Categories the classifier may return; anything else becomes `Other`
pub const CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Groceries",
    "Shopping",
    "Transportation",
    "Housing",
    "Utilities",
    "Entertainment",
    "Healthcare",
    "Education",
    "Travel",
    "Insurance",
    "Personal Care",
    "Subscriptions",
    "Salary",
    "Investment",
    "Other",
];

pub const FALLBACK_CATEGORY: &str = "Other";

/// What a completion is for; lets backends and mocks tell calls apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Insights,
    Anomalies,
    Savings,
    Categorize,
    Chat,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::Anomalies => "anomalies",
            Self::Savings => "savings",
            Self::Categorize => "categorize",
            Self::Chat => "chat",
        }
    }
}

/// One chat completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub task: TaskType,
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Insight list plus overall health score (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    #[serde(default)]
    pub insights: Vec<AIInsight>,
    #[serde(default = "default_health_score")]
    pub health_score: f64,
}

fn default_health_score() -> f64 {
    50.0
}

/// A transaction the model considers unusual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub amount: Option<f64>,
}

fn default_severity() -> String {
    "medium".to_string()
}

/// Anomaly list plus a trust score (100 = nothing unusual)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default = "default_trust_score")]
    pub trust_score: f64,
}

fn default_trust_score() -> f64 {
    95.0
}

/// A suggested way to save money
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsStrategy {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Monthly
    #[serde(default)]
    pub potential_savings: f64,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Combined result of the three analysis calls
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalysis {
    pub insights: InsightReport,
    pub anomalies: AnomalyReport,
    pub savings_strategies: Vec<SavingsStrategy>,
}

/// Map a model's label onto the closed category set
pub fn normalize_category(label: &str) -> &'static str {
    let label = label.trim().trim_matches(|c| c == '"' || c == '.');
    CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(label))
        .copied()
        .unwrap_or(FALLBACK_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("groceries"), "Groceries");
        assert_eq!(normalize_category(" \"Food & Dining\". "), "Food & Dining");
        assert_eq!(normalize_category("Crypto"), "Other");
        assert_eq!(normalize_category(""), "Other");
    }

    #[test]
    fn test_report_defaults() {
        let report: AnomalyReport = serde_json::from_str("{}").unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.trust_score, 95.0);

        let report: InsightReport = serde_json::from_str(r#"{"insights": []}"#).unwrap();
        assert_eq!(report.health_score, 50.0);
    }
}
