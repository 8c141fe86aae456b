//! Integration tests for finsight-core
//!
//! These tests exercise the import → store → metrics/report → advisor workflow.

use chrono::NaiveDate;
use serde_json::{json, Value};

use finsight_core::{
    compute_metrics, generate_report, spending_patterns, AIClient, Error, FinancialAdvisor,
    MockBackend, NewBudget, NewGoal, NewTransaction, OpenAICompatibleBackend, Period,
    PromptLibrary, ReportPeriod, SortField, SortOrder, Store, TransactionFilter,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
}

/// Two months of records in the mixed shapes older exports produced
fn import_records() -> Vec<Value> {
    vec![
        json!({"id": 1, "description": "Salary", "amount": 5000, "category": "Salary", "date": "2024-03-01"}),
        json!({"name": "Rent", "amount": -1500, "category": "Housing", "date": "2024-03-02"}),
        json!({"name": "Groceries", "amount": "-250.50", "category": "Groceries", "date": "2024-03-10", "tags": "food,weekly"}),
        json!({"name": "February salary", "amount": 4000, "category": "Salary", "date": "2024-02-01"}),
        json!({"name": "February rent", "amount": -1500, "category": "Housing", "date": "2024-02-02"}),
        // Skipped: zero amount, future date, duplicate id
        json!({"name": "Nothing", "amount": 0, "category": "Other", "date": "2024-03-03"}),
        json!({"name": "Later", "amount": -20, "category": "Other", "date": "2024-04-01"}),
        json!({"id": "1", "name": "Duplicate", "amount": 10, "category": "Other", "date": "2024-03-04"}),
    ]
}

// =============================================================================
// Store Integration Tests
// =============================================================================

#[test]
fn test_import_metrics_and_report_workflow() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = Store::open(dir.path()).expect("Failed to open store");

    let stats = store
        .import_transactions(import_records(), today())
        .expect("Failed to import");
    assert_eq!(stats.imported, 5);
    assert_eq!(stats.skipped, 3);

    // Reopen to make sure everything was persisted
    let store = Store::open(dir.path()).expect("Failed to reopen store");
    let transactions = store.list_transactions().unwrap();
    assert_eq!(transactions.len(), 5);

    let groceries = transactions.iter().find(|t| t.name == "Groceries").unwrap();
    assert_eq!(groceries.amount, -250.5);
    assert_eq!(groceries.tags, vec!["food", "weekly"]);

    let metrics = compute_metrics(&transactions, Period::Month, today());
    assert_eq!(metrics.income, 5000.0);
    assert_eq!(metrics.expenses, 1750.5);
    assert_eq!(metrics.income_change, 25.0);
    assert_eq!(metrics.top_category, "Housing");
    assert_eq!(metrics.transaction_count, 3);

    let report = generate_report(&transactions, ReportPeriod::Month, today());
    assert_eq!(report.period, "month");
    assert_eq!(report.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(report.income.total, 5000.0);
    assert_eq!(report.income.growth, 25.0);
    assert_eq!(report.expenses.by_category.get("Housing"), Some(&1500.0));
    assert!(!report.insights.is_empty());

    let patterns = spending_patterns(&transactions);
    assert!(patterns.iter().any(|p| p.category == "Housing"));
}

#[test]
fn test_crud_and_filter_workflow() {
    let store = Store::in_memory();

    let coffee = store
        .add_transaction(
            &NewTransaction {
                name: "Blue Bottle".into(),
                amount: json!(-6.5),
                category: "Food & Dining".into(),
                date: "2024-03-18".into(),
                tags: vec!["coffee".into()],
                ..Default::default()
            },
            today(),
        )
        .unwrap();
    store
        .add_transaction(
            &NewTransaction {
                name: "Paycheck".into(),
                amount: json!("3200"),
                category: "Salary".into(),
                date: "2024-03-15".into(),
                ..Default::default()
            },
            today(),
        )
        .unwrap();

    let invalid = store.add_transaction(
        &NewTransaction {
            name: "Tomorrow".into(),
            amount: json!(-5),
            category: "Other".into(),
            date: "2024-03-21".into(),
            ..Default::default()
        },
        today(),
    );
    assert!(matches!(invalid, Err(Error::Validation(_))));

    let all = store.list_transactions().unwrap();
    let result = TransactionFilter::new()
        .search(Some("coffee"))
        .sort(SortField::Amount, SortOrder::Asc)
        .apply(&all);
    assert_eq!(result.total, 1);
    assert_eq!(result.transactions[0].id, coffee.id);

    store.delete_transaction(&coffee.id).unwrap();
    assert!(matches!(
        store.get_transaction(&coffee.id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_goals_and_budgets() {
    let store = Store::in_memory();

    let goal = store
        .add_goal(&NewGoal {
            name: "Emergency fund".into(),
            target_amount: 1000.0,
            ..Default::default()
        })
        .unwrap();
    let goal = store.contribute_to_goal(&goal.id, 250.0).unwrap();
    assert_eq!(goal.current_amount, 250.0);
    assert_eq!(goal.progress(), 25.0);
    assert!(store.contribute_to_goal(&goal.id, -5.0).is_err());

    store
        .add_budget(&NewBudget {
            category: "Groceries".into(),
            allocated: 400.0,
            ..Default::default()
        })
        .unwrap();
    let duplicate = store.add_budget(&NewBudget {
        category: "Groceries".into(),
        allocated: 500.0,
        ..Default::default()
    });
    assert!(matches!(duplicate, Err(Error::Validation(_))));
}

// =============================================================================
// Advisor Integration Tests
// =============================================================================

#[tokio::test]
async fn test_advisor_analysis_with_mock_backend() {
    let store = Store::in_memory();
    store.import_transactions(import_records(), today()).unwrap();
    let transactions = store.list_transactions().unwrap();

    let mock = MockBackend::new();
    let advisor = FinancialAdvisor::new(AIClient::Mock(mock.clone()))
        .with_prompts(PromptLibrary::embedded_only());

    let analysis = advisor
        .financial_analysis(&transactions, 5000.0, &["Vacation".to_string()])
        .await;
    assert_eq!(mock.call_count(), 3);
    assert!(!analysis.insights.insights.is_empty());
    assert!(analysis.anomalies.anomalies.is_empty());

    let saved = store.add_insights(analysis.insights.insights).unwrap();
    assert!(saved.iter().all(|i| !i.id.is_empty() && i.created_at.is_some()));
    assert_eq!(store.list_insights(false).unwrap().len(), saved.len());
}

#[tokio::test]
async fn test_advisor_unreachable_backend_falls_back() {
    // Nothing listens on the discard port
    let backend = OpenAICompatibleBackend::new("http://127.0.0.1:9", "none");
    let advisor = FinancialAdvisor::new(AIClient::OpenAICompatible(backend))
        .with_prompts(PromptLibrary::embedded_only());

    let analysis = advisor.financial_analysis(&[], 3000.0, &[]).await;
    assert_eq!(analysis.insights.health_score, 50.0);
    assert_eq!(analysis.insights.insights.len(), 1);
    assert_eq!(analysis.anomalies.trust_score, 95.0);
    assert!(analysis.savings_strategies.is_empty());

    assert_eq!(advisor.categorize("Coffee shop").await, "Other");
    assert!(advisor.chat("Hello?", &[], None).await.is_err());
}
