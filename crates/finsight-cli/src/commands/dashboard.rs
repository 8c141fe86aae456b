//! Dashboard command implementations (metrics, patterns, forecast, report)

use anyhow::Result;
use chrono::NaiveDate;
use finsight_core::format::{format_change, format_currency, format_date, format_percentage};
use finsight_core::{
    compute_metrics, forecast, spending_patterns, FinancialMetrics, FinancialReport, Period,
    ReportGenerator, ReportPeriod, Store,
};

use super::truncate;

pub fn cmd_metrics(
    store: &Store,
    period: &str,
    today: NaiveDate,
    currency: &str,
) -> Result<FinancialMetrics> {
    let period: Period = period.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let transactions = store.list_transactions()?;
    let metrics = compute_metrics(&transactions, period, today);

    println!();
    println!("📊 Dashboard ({})", period);
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Net worth:     {:>14}  {}",
        format_currency(metrics.net_worth, currency),
        change_label(metrics.net_worth_change, period)
    );
    println!(
        "   Income:        {:>14}  {}",
        format_currency(metrics.income, currency),
        change_label(metrics.income_change, period)
    );
    println!(
        "   Expenses:      {:>14}  {}",
        format_currency(metrics.expenses, currency),
        change_label(metrics.expense_change, period)
    );
    println!(
        "   Savings rate:  {:>14}",
        format_percentage(metrics.savings_rate, 1)
    );
    if !metrics.top_category.is_empty() {
        println!("   Top category:  {:>14}", metrics.top_category);
    }
    println!(
        "   Transactions:  {:>14}  (avg {})",
        metrics.transaction_count,
        format_currency(metrics.average_transaction, currency)
    );

    Ok(metrics)
}

fn change_label(change: f64, period: Period) -> String {
    if period.supports_comparison() {
        format!("{} vs last {}", format_change(change), period)
    } else {
        String::new()
    }
}

pub fn cmd_patterns(store: &Store, currency: &str) -> Result<()> {
    let transactions = store.list_transactions()?;
    let patterns = spending_patterns(&transactions);

    if patterns.is_empty() {
        println!("No expenses recorded yet.");
        return Ok(());
    }

    println!();
    println!("📈 Spending Patterns");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:<22} {:>12} {:>10} {:>9} {:>12}",
        "Category", "Avg/month", "Trend", "Change", "Next"
    );
    for p in &patterns {
        println!(
            "   {:<22} {:>12} {:>10} {:>9} {:>12}",
            truncate(&p.category, 22),
            format_currency(p.average_monthly, currency),
            p.trend.to_string(),
            format_change(p.trend_percentage),
            format_currency(p.forecast_next_period, currency)
        );
    }

    Ok(())
}

pub fn cmd_forecast(store: &Store, currency: &str) -> Result<()> {
    let transactions = store.list_transactions()?;
    let forecast = forecast(&transactions);

    println!();
    println!("🔮 Expense Forecast");
    println!("   ─────────────────────────────");
    println!(
        "   Next month:  {}",
        format_currency(forecast.next_month, currency)
    );
    println!(
        "   Trend:       {} ({})",
        forecast.trend,
        format_change(forecast.trend_percentage)
    );
    println!(
        "   Confidence:  {} over {} month(s)",
        format_percentage(forecast.confidence, 0),
        forecast.months_observed
    );

    Ok(())
}

pub fn cmd_report(
    store: &Store,
    period: &str,
    json: bool,
    today: NaiveDate,
    currency: &str,
) -> Result<FinancialReport> {
    let period: ReportPeriod = period.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let transactions = store.list_transactions()?;
    let report = ReportGenerator::new(currency).generate(&transactions, period, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    println!();
    println!(
        "📄 Financial Report: {} to {}",
        format_date(report.start),
        format_date(report.end)
    );
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Income:    {:>14}  ({} vs previous)",
        format_currency(report.income.total, currency),
        format_change(report.income.growth)
    );
    println!(
        "   Expenses:  {:>14}",
        format_currency(report.expenses.total, currency)
    );
    println!(
        "   Saved:     {:>14}  ({})",
        format_currency(report.savings.amount, currency),
        format_percentage(report.savings.rate, 1)
    );

    if !report.expenses.by_category.is_empty() {
        println!();
        println!("   By category:");
        let mut categories: Vec<_> = report.expenses.by_category.iter().collect();
        categories.sort_by(|a, b| b.1.total_cmp(a.1));
        for (category, amount) in categories {
            println!(
                "     {:<24} {:>12}",
                truncate(category, 24),
                format_currency(*amount, currency)
            );
        }
    }

    if !report.expenses.top_merchants.is_empty() {
        println!();
        println!("   Top merchants:");
        for m in &report.expenses.top_merchants {
            println!(
                "     {:<24} {:>12}  ({} transactions)",
                truncate(&m.merchant, 24),
                format_currency(m.amount, currency),
                m.transaction_count
            );
        }
    }

    if !report.insights.is_empty() {
        println!();
        println!("   💡 Insights:");
        for insight in &report.insights {
            println!("     • {}", insight);
        }
    }
    if !report.recommendations.is_empty() {
        println!();
        println!("   ✅ Recommendations:");
        for rec in &report.recommendations {
            println!("     • {}", rec);
        }
    }

    Ok(report)
}
