//! Finsight Core Library
//!
//! Shared functionality for the Finsight personal finance dashboard:
//! - Versioned JSON collection store (transactions, goals, budgets, insights, settings)
//! - Financial metrics, spending patterns and portfolio forecast
//! - Period reports with rule-based commentary
//! - Goal progress and budget tracking
//! - Pluggable text-generation backends (Ollama, OpenAI-compatible)
//! - Advisor façade for insights, anomalies, savings strategies and chat
//! - Prompt library for customizable AI prompts

pub mod advisor;
pub mod ai;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod goals;
pub mod metrics;
pub mod models;
pub mod patterns;
pub mod prompts;
pub mod reports;
pub mod store;

/// Test utilities including a mock completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::{retry_with_delay, AnalysisGuard, AnalysisKey, FinancialAdvisor};
pub use ai::{
    AIBackend, AIClient, Anomaly, AnomalyReport, FinancialAnalysis, InsightReport, MockBackend,
    OllamaBackend, OpenAICompatibleBackend, SavingsStrategy,
};
pub use config::{AiBackendKind, AiConfig, Config};
pub use error::{Error, Result};
pub use filter::{FilterResult, SortField, SortOrder, TransactionFilter};
pub use goals::{budget_statuses, goal_statuses, BudgetStatus, GoalStatus};
pub use metrics::{compute_metrics, Period};
pub use models::*;
pub use patterns::{forecast, spending_patterns, PatternAnalyzer};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use reports::{generate_report, ReportGenerator, ReportPeriod};
pub use store::{ImportStats, JsonFileBackend, MemoryBackend, StorageBackend, Store};
