//! Insight requests against the text-generation backend
//!
//! `FinancialAdvisor` turns transactions into prompts, calls the configured
//! `AIClient` and parses the answer. Analysis calls never fail: a network
//! error, a non-success status or unparseable output yields a fixed fallback
//! and a warning. Chat is the exception and returns the error.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::ai::parsing::{parse_anomalies, parse_category, parse_insights, parse_strategies};
use crate::ai::{
    AIBackend, AIClient, AnomalyReport, CompletionRequest, FinancialAnalysis, InsightReport,
    SavingsStrategy, TaskType, CATEGORIES, FALLBACK_CATEGORY,
};
use crate::config::AiConfig;
use crate::error::{Error, Result};
use crate::format::format_currency;
use crate::models::{AIInsight, Impact, InsightKind, Transaction};
use crate::prompts::{PromptId, PromptLibrary};

pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Upper bound for `retry_with_delay`
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Transactions listed line by line in anomaly and chat prompts
const PROMPT_TRANSACTION_LIMIT: usize = 50;
const CHAT_TRANSACTION_LIMIT: usize = 20;
const SUMMARY_TOP_CATEGORIES: usize = 5;

/// Insight-request façade over an `AIClient`
#[derive(Clone)]
pub struct FinancialAdvisor {
    client: AIClient,
    prompts: Arc<RwLock<PromptLibrary>>,
    max_tokens: u32,
    temperature: f64,
    currency: String,
}

impl FinancialAdvisor {
    pub fn new(client: AIClient) -> Self {
        Self {
            client,
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            currency: "USD".to_string(),
        }
    }

    /// `None` when no backend is configured
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let client = AIClient::from_config(config)?;
        Some(Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            ..Self::new(client)
        })
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Currency used for amounts in prompts
    pub fn currency(&self) -> &str {
        &self.currency
    }

    fn build_request(
        &self,
        id: PromptId,
        task: TaskType,
        vars: &HashMap<&str, &str>,
    ) -> Result<CompletionRequest> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let prompt = prompts.get(id)?;
        Ok(CompletionRequest {
            task,
            system: prompt.system.clone(),
            user: prompt.render(vars),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }

    async fn run(
        &self,
        id: PromptId,
        task: TaskType,
        vars: &HashMap<&str, &str>,
    ) -> Result<String> {
        let request = self.build_request(id, task, vars)?;
        debug!(
            task = task.as_str(),
            backend = self.client.backend_name(),
            model = self.client.model(),
            "Requesting completion"
        );
        self.client.complete(&request).await
    }

    /// Insights and health score; errors are returned
    pub async fn try_generate_insights(
        &self,
        transactions: &[Transaction],
        monthly_income: f64,
        goals: &[String],
    ) -> Result<InsightReport> {
        let income = format_currency(monthly_income, &self.currency);
        let count = transactions.len().to_string();
        let summary = build_summary(transactions, monthly_income, &self.currency);
        let goals = goals.join(", ");

        let mut vars = HashMap::new();
        vars.insert("monthly_income", income.as_str());
        vars.insert("transaction_count", count.as_str());
        vars.insert("summary", summary.as_str());
        vars.insert("goals", goals.as_str());

        let response = self
            .run(PromptId::FinancialInsights, TaskType::Insights, &vars)
            .await?;
        parse_insights(&response)
    }

    /// Insights and health score, falling back to a generic insight
    pub async fn generate_insights(
        &self,
        transactions: &[Transaction],
        monthly_income: f64,
        goals: &[String],
    ) -> InsightReport {
        match self
            .try_generate_insights(transactions, monthly_income, goals)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!("Insight generation failed, using fallback: {}", e);
                fallback_insights()
            }
        }
    }

    pub async fn detect_anomalies(
        &self,
        transactions: &[Transaction],
        monthly_income: f64,
    ) -> AnomalyReport {
        let summary = build_summary(transactions, monthly_income, &self.currency);
        let lines = transaction_lines(transactions, PROMPT_TRANSACTION_LIMIT);

        let mut vars = HashMap::new();
        vars.insert("summary", summary.as_str());
        vars.insert("transactions", lines.as_str());

        let result = match self
            .run(PromptId::DetectAnomalies, TaskType::Anomalies, &vars)
            .await
        {
            Ok(response) => parse_anomalies(&response),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!("Anomaly detection failed, using fallback: {}", e);
            fallback_anomalies()
        })
    }

    pub async fn savings_strategies(
        &self,
        transactions: &[Transaction],
        monthly_income: f64,
        goals: &[String],
    ) -> Vec<SavingsStrategy> {
        let income = format_currency(monthly_income, &self.currency);
        let summary = build_summary(transactions, monthly_income, &self.currency);
        let goals = goals.join(", ");

        let mut vars = HashMap::new();
        vars.insert("monthly_income", income.as_str());
        vars.insert("summary", summary.as_str());
        vars.insert("goals", goals.as_str());

        let result = match self
            .run(PromptId::SavingsStrategies, TaskType::Savings, &vars)
            .await
        {
            Ok(response) => parse_strategies(&response),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!("Savings strategy request failed, using fallback: {}", e);
            Vec::new()
        })
    }

    /// Category for a free-text description; `Other` on any failure
    pub async fn categorize(&self, description: &str) -> &'static str {
        let categories = CATEGORIES
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("description", description);
        vars.insert("categories", categories.as_str());

        match self
            .run(PromptId::CategorizeTransaction, TaskType::Categorize, &vars)
            .await
        {
            Ok(response) => parse_category(&response),
            Err(e) => {
                warn!("Categorization failed for {:?}: {}", description, e);
                FALLBACK_CATEGORY
            }
        }
    }

    /// Free-form answer to a user question
    pub async fn chat(
        &self,
        message: &str,
        transactions: &[Transaction],
        metrics: Option<&serde_json::Value>,
    ) -> Result<String> {
        let context = metrics
            .filter(|m| !m.is_null())
            .map(serde_json::to_string_pretty)
            .transpose()?
            .unwrap_or_default();
        let lines = transaction_lines(transactions, CHAT_TRANSACTION_LIMIT);

        let mut vars = HashMap::new();
        vars.insert("message", message);
        vars.insert("context", context.as_str());
        vars.insert("transactions", lines.as_str());

        let response = self
            .run(PromptId::FinancialChat, TaskType::Chat, &vars)
            .await?;
        let response = response.trim();
        if response.is_empty() {
            return Err(Error::Ai("Empty chat response".into()));
        }
        Ok(response.to_string())
    }

    /// Insights, anomalies and strategies requested concurrently
    pub async fn financial_analysis(
        &self,
        transactions: &[Transaction],
        monthly_income: f64,
        goals: &[String],
    ) -> FinancialAnalysis {
        let (insights, anomalies, savings_strategies) = tokio::join!(
            self.generate_insights(transactions, monthly_income, goals),
            self.detect_anomalies(transactions, monthly_income),
            self.savings_strategies(transactions, monthly_income, goals),
        );
        FinancialAnalysis {
            insights,
            anomalies,
            savings_strategies,
        }
    }
}

/// Fixed insight used when the backend fails
pub fn fallback_insights() -> InsightReport {
    InsightReport {
        insights: vec![AIInsight {
            id: uuid::Uuid::new_v4().to_string(),
            kind: InsightKind::General,
            title: "Keep tracking your spending".to_string(),
            description: "Personalized insights are unavailable right now. \
                          Reviewing your largest categories each month is a good start."
                .to_string(),
            impact: Impact::Medium,
            action_items: vec![
                "Review your top spending categories".to_string(),
                "Set a budget for your largest category".to_string(),
            ],
            potential_savings: None,
            timeframe: "ongoing".to_string(),
            confidence: 0.5,
            dismissed: false,
            created_at: None,
        }],
        health_score: 50.0,
    }
}

pub fn fallback_anomalies() -> AnomalyReport {
    AnomalyReport {
        anomalies: Vec::new(),
        trust_score: 95.0,
    }
}

/// Compact numeric summary embedded in analysis prompts
pub fn build_summary(transactions: &[Transaction], monthly_income: f64, currency: &str) -> String {
    if transactions.is_empty() {
        return format!(
            "No transactions recorded. Stated monthly income: {}.",
            format_currency(monthly_income, currency)
        );
    }

    let mut income = 0.0;
    let mut expenses = 0.0;
    let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
    for tx in transactions {
        if tx.is_income() {
            income += tx.amount;
        } else if tx.is_expense() {
            let spent = tx.amount.abs();
            expenses += spent;
            *by_category.entry(tx.category.as_str()).or_insert(0.0) += spent;
        }
    }

    let first = transactions.iter().map(|t| t.date).min();
    let last = transactions.iter().map(|t| t.date).max();

    let mut lines = Vec::new();
    if let (Some(first), Some(last)) = (first, last) {
        lines.push(format!("Period: {} to {}", first, last));
    }
    lines.push(format!("Transactions: {}", transactions.len()));
    lines.push(format!("Total income: {}", format_currency(income, currency)));
    lines.push(format!("Total expenses: {}", format_currency(expenses, currency)));
    lines.push(format!("Net: {}", format_currency(income - expenses, currency)));

    let mut categories: Vec<_> = by_category.into_iter().collect();
    categories.sort_by(|a, b| b.1.total_cmp(&a.1));
    if !categories.is_empty() {
        lines.push("Top expense categories:".to_string());
        for (category, amount) in categories.iter().take(SUMMARY_TOP_CATEGORIES) {
            let share = if expenses > 0.0 {
                amount / expenses * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "- {}: {} ({:.0}%)",
                category,
                format_currency(*amount, currency),
                share
            ));
        }
    }

    lines.join("\n")
}

/// Most recent transactions as `id | date | name | category | amount`
fn transaction_lines(transactions: &[Transaction], limit: usize) -> String {
    let mut recent: Vec<&Transaction> = transactions.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent
        .into_iter()
        .take(limit)
        .map(|t| {
            format!(
                "{} | {} | {} | {} | {:.2}",
                t.id, t.date, t.name, t.category, t.amount
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inputs that identify an analysis run
///
/// Approximate: two different transaction lists of the same length compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisKey {
    transaction_count: usize,
    income_cents: i64,
    goals: Vec<String>,
}

impl AnalysisKey {
    pub fn new(transaction_count: usize, monthly_income: f64, goals: &[String]) -> Self {
        Self {
            transaction_count,
            income_cents: (monthly_income * 100.0).round() as i64,
            goals: goals.to_vec(),
        }
    }
}

/// Remembers the last analysis so identical inputs are not re-requested
#[derive(Debug, Default)]
pub struct AnalysisGuard {
    last: Option<(AnalysisKey, FinancialAnalysis)>,
}

impl AnalysisGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `key`, if it was the last one recorded
    pub fn cached(&self, key: &AnalysisKey) -> Option<&FinancialAnalysis> {
        match &self.last {
            Some((k, analysis)) if k == key => Some(analysis),
            _ => None,
        }
    }

    pub fn should_run(&self, key: &AnalysisKey) -> bool {
        self.cached(key).is_none()
    }

    pub fn record(&mut self, key: AnalysisKey, analysis: FinancialAnalysis) {
        self.last = Some((key, analysis));
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Run `op` up to `attempts` times (capped at 3), sleeping `delay` between tries
pub async fn retry_with_delay<T, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.clamp(1, MAX_RETRY_ATTEMPTS);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(attempt, "Attempt failed, retrying in {:?}: {}", delay, e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
