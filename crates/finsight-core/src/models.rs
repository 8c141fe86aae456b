//! Domain models for Finsight

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest absolute amount accepted for a single transaction
pub const MAX_TRANSACTION_AMOUNT: f64 = 1_000_000_000.0;

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// The sign of the amount is the source of truth
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            Self::Expense
        } else {
            Self::Income
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub name: String,
    /// Negative = expense, positive = income
    pub amount: f64,
    /// Redundant with the sign of `amount`; recomputed on load
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction from validated fields with a fresh id
    pub fn new(fields: TransactionFields, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: fields.name,
            amount: fields.amount,
            transaction_type: TransactionType::from_amount(fields.amount),
            category: fields.category,
            date: fields.date,
            merchant: fields.merchant,
            notes: fields.notes,
            tags: fields.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace editable fields, keeping id and creation time
    pub fn apply(&mut self, fields: TransactionFields, now: DateTime<Utc>) {
        self.name = fields.name;
        self.amount = fields.amount;
        self.transaction_type = TransactionType::from_amount(fields.amount);
        self.category = fields.category;
        self.date = fields.date;
        self.merchant = fields.merchant;
        self.notes = fields.notes;
        self.tags = fields.tags;
        self.updated_at = now;
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Merchant label for rankings: explicit merchant, else the transaction name
    pub fn merchant_or_name(&self) -> &str {
        match self.merchant.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => &self.name,
        }
    }
}

/// Transaction input from a form, API body or import file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(default, alias = "description")]
    pub name: String,
    /// Kept loose so non-numeric input can be reported instead of rejected by serde
    #[serde(default)]
    pub amount: serde_json::Value,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    /// Optional hint; only used to sign a positive magnitude as an expense
    #[serde(rename = "type", default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Validated transaction fields
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub merchant: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

impl NewTransaction {
    /// Validate user input. Nothing is persisted when this fails.
    pub fn validate(&self, today: NaiveDate) -> Result<TransactionFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Name is required".into()));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::Validation("Category is required".into()));
        }

        let mut amount = parse_amount(&self.amount)
            .ok_or_else(|| Error::Validation("Amount must be a number".into()))?;
        if amount == 0.0 {
            return Err(Error::Validation("Amount must not be zero".into()));
        }
        if amount.abs() > MAX_TRANSACTION_AMOUNT {
            return Err(Error::Validation(format!(
                "Amount exceeds the maximum of {}",
                MAX_TRANSACTION_AMOUNT
            )));
        }
        if amount > 0.0 && self.transaction_type == Some(TransactionType::Expense) {
            amount = -amount;
        }

        let date_str = self.date.trim();
        if date_str.is_empty() {
            return Err(Error::Validation("Date is required".into()));
        }
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| Error::Validation("Invalid date format (use YYYY-MM-DD)".into()))?;
        if date > today {
            return Err(Error::Validation(
                "Transaction date cannot be in the future".into(),
            ));
        }

        Ok(TransactionFields {
            name: name.to_string(),
            amount,
            category: category.to_string(),
            date,
            merchant: non_blank(self.merchant.as_deref()),
            notes: non_blank(self.notes.as_deref()),
            tags: clean_tags(&self.tags),
        })
    }
}

/// Parse a numeric JSON value or numeric string ("1,200.50", "$12")
pub fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != ',' && *c != '$')
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    amount.is_finite().then_some(amount)
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

// ============================================================================
// Goals and budgets
// ============================================================================

/// A savings goal declared by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialGoal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Goal input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" => Ok(Self::Yearly),
            _ => Err(format!("Unknown budget period: {}", s)),
        }
    }
}

/// A spending allowance for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub allocated: f64,
    /// Refreshed from transactions when read
    #[serde(default)]
    pub spent: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
}

/// Budget input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBudget {
    pub category: String,
    pub allocated: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
}

// ============================================================================
// AI insights
// ============================================================================

/// Kind of AI insight. Unknown labels from the model become `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum InsightKind {
    Spending,
    Saving,
    Budget,
    Goal,
    Anomaly,
    General,
}

impl From<String> for InsightKind {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "spending" => Self::Spending,
            "saving" | "savings" => Self::Saving,
            "budget" => Self::Budget,
            "goal" | "goals" => Self::Goal,
            "anomaly" | "alert" => Self::Anomaly,
            _ => Self::General,
        }
    }
}

/// Impact level of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl From<String> for Impact {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

fn default_impact() -> Impact {
    Impact::Medium
}

fn default_kind() -> InsightKind {
    InsightKind::General
}

/// Structured insight returned by the text-generation service.
/// Stored as returned; only `id`, `dismissed` and `created_at` are ours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIInsight {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: InsightKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_impact")]
    pub impact: Impact,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub potential_savings: Option<f64>,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Settings
// ============================================================================

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Per-user preferences persisted alongside the collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            authenticated: false,
            currency: default_currency(),
        }
    }
}

// ============================================================================
// Derived values
// ============================================================================

/// Period-scoped aggregates, recomputed on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialMetrics {
    pub net_worth: f64,
    /// Relative change vs previous period (%)
    pub net_worth_change: f64,
    pub income: f64,
    pub income_change: f64,
    pub expenses: f64,
    pub expense_change: f64,
    pub savings_rate: f64,
    /// Absolute difference in percentage points
    pub savings_rate_change: f64,
    pub top_category: String,
    pub transaction_count: usize,
    pub average_transaction: f64,
}

/// Trend classification for spending patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Historical spending behaviour of one expense category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingPattern {
    pub category: String,
    pub average_monthly: f64,
    pub trend: Trend,
    pub trend_percentage: f64,
    pub forecast_next_period: f64,
    pub confidence: f64,
    pub observation_count: usize,
}

/// One-month-ahead forecast over all expenses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioForecast {
    pub next_month: f64,
    pub trend_percentage: f64,
    pub trend: Trend,
    pub confidence: f64,
    pub months_observed: usize,
}

/// Merchant spend for ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantSpending {
    pub merchant: String,
    pub amount: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeSection {
    pub total: f64,
    pub by_category: BTreeMap<String, f64>,
    /// Growth vs the previous window (%)
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSection {
    pub total: f64,
    pub by_category: BTreeMap<String, f64>,
    pub top_merchants: Vec<MerchantSpending>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsSection {
    pub amount: f64,
    pub rate: f64,
}

/// Composed report for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub period: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: IncomeSection,
    pub expenses: ExpenseSection,
    pub savings: SavingsSection,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn input(amount: serde_json::Value, date: &str) -> NewTransaction {
        NewTransaction {
            name: "Coffee".into(),
            amount,
            category: "Food & Dining".into(),
            date: date.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_type_follows_sign() {
        assert_eq!(TransactionType::from_amount(-3.0), TransactionType::Expense);
        assert_eq!(TransactionType::from_amount(3.0), TransactionType::Income);
        assert_eq!(TransactionType::from_amount(0.0), TransactionType::Income);
    }

    #[test]
    fn test_validate_accepts_numeric_string() {
        let fields = input(json!("1,200.50"), "2026-03-01")
            .validate(today())
            .unwrap();
        assert_eq!(fields.amount, 1200.5);
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_validate_expense_hint_signs_magnitude() {
        let mut tx = input(json!(45.0), "2026-03-01");
        tx.transaction_type = Some(TransactionType::Expense);
        assert_eq!(tx.validate(today()).unwrap().amount, -45.0);

        // Sign wins over a disagreeing hint
        let mut tx = input(json!(-45.0), "2026-03-01");
        tx.transaction_type = Some(TransactionType::Income);
        assert_eq!(tx.validate(today()).unwrap().amount, -45.0);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            input(json!("abc"), "2026-03-01").validate(today()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            input(json!(null), "2026-03-01").validate(today()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            input(json!(0), "2026-03-01").validate(today()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            input(json!(2_000_000_000.0), "2026-03-01").validate(today()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            input(json!(10), "2026-03-16").validate(today()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            input(json!(10), "03/01/2026").validate(today()),
            Err(Error::Validation(_))
        ));

        let mut blank_name = input(json!(10), "2026-03-01");
        blank_name.name = "  ".into();
        assert!(blank_name.validate(today()).is_err());
    }

    #[test]
    fn test_validate_cleans_optional_fields() {
        let mut tx = input(json!(-12), "2026-03-01");
        tx.merchant = Some("  ".into());
        tx.notes = Some(" team lunch ".into());
        tx.tags = vec!["work".into(), " work ".into(), "".into(), "food".into()];
        let fields = tx.validate(today()).unwrap();
        assert_eq!(fields.merchant, None);
        assert_eq!(fields.notes.as_deref(), Some("team lunch"));
        assert_eq!(fields.tags, vec!["work", "food"]);
    }

    #[test]
    fn test_merchant_falls_back_to_name() {
        let fields = input(json!(-5), "2026-03-01").validate(today()).unwrap();
        let mut tx = Transaction::new(fields, Utc::now());
        assert_eq!(tx.merchant_or_name(), "Coffee");
        tx.merchant = Some("Blue Bottle".into());
        assert_eq!(tx.merchant_or_name(), "Blue Bottle");
    }

    #[test]
    fn test_insight_parses_model_output() {
        let insight: AIInsight = serde_json::from_value(json!({
            "type": "savings",
            "title": "Cut dining out",
            "description": "Dining is 30% of spending",
            "impact": "HIGH",
            "actionItems": ["Cook twice a week"],
            "potentialSavings": 120.0,
            "timeframe": "1 month",
            "confidence": 0.8
        }))
        .unwrap();
        assert_eq!(insight.kind, InsightKind::Saving);
        assert_eq!(insight.impact, Impact::High);
        assert_eq!(insight.action_items.len(), 1);
        assert!(!insight.dismissed);

        let odd: AIInsight =
            serde_json::from_value(json!({"type": "weird", "impact": "??"})).unwrap();
        assert_eq!(odd.kind, InsightKind::General);
        assert_eq!(odd.impact, Impact::Medium);
    }
}
