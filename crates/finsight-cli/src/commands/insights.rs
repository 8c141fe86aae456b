//! AI insight and categorization command implementations

use anyhow::{Context, Result};
use finsight_core::format::format_currency;
use finsight_core::{
    retry_with_delay, AIBackend, AIInsight, Config, FinancialAdvisor, Impact, InsightReport, Store,
};

use super::truncate;

/// Advisor from config, formatting amounts in `currency`
pub(crate) fn advisor_from_config(config: &Config, currency: &str) -> Option<FinancialAdvisor> {
    FinancialAdvisor::from_config(&config.ai).map(|a| a.with_currency(currency))
}

fn impact_icon(impact: Impact) -> &'static str {
    match impact {
        Impact::High => "🔴",
        Impact::Medium => "🟡",
        Impact::Low => "🟢",
    }
}

fn print_insight(insight: &AIInsight, currency: &str) {
    println!(
        "{} {}{}",
        impact_icon(insight.impact),
        insight.title,
        if insight.dismissed { " (dismissed)" } else { "" }
    );
    if !insight.description.is_empty() {
        println!("   {}", insight.description);
    }
    for item in &insight.action_items {
        println!("   • {}", item);
    }
    if let Some(savings) = insight.potential_savings {
        println!("   Potential savings: {}", format_currency(savings, currency));
    }
    println!("   ID: {}", insight.id);
}

pub fn cmd_insights_list(store: &Store, include_dismissed: bool, currency: &str) -> Result<()> {
    let mut insights = store.list_insights(include_dismissed)?;

    if insights.is_empty() {
        println!("No insights yet. Generate some with:");
        println!("  finsight insights generate --income 5000");
        return Ok(());
    }

    insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    println!();
    println!("💡 Insights");
    println!("   ─────────────────────────────────────────────────────────────");
    for insight in &insights {
        print_insight(insight, currency);
    }

    Ok(())
}

pub async fn cmd_insights_generate(
    store: &Store,
    config: &Config,
    income: f64,
    goals: Vec<String>,
    currency: &str,
) -> Result<InsightReport> {
    let Some(advisor) = advisor_from_config(config, currency) else {
        println!("💡 Tip: Set OLLAMA_HOST or OPENAI_COMPATIBLE_HOST to enable AI insights");
        anyhow::bail!("AI backend not configured");
    };

    generate_with_advisor(store, &advisor, config, income, goals, currency).await
}

/// Generate insights with bounded retries, persisting the result
///
/// Nothing is stored when every attempt fails.
pub async fn generate_with_advisor(
    store: &Store,
    advisor: &FinancialAdvisor,
    config: &Config,
    income: f64,
    goals: Vec<String>,
    currency: &str,
) -> Result<InsightReport> {
    if !income.is_finite() || income <= 0.0 {
        anyhow::bail!("Monthly income must be greater than zero");
    }

    let goals = if goals.is_empty() {
        store.list_goals()?.into_iter().map(|g| g.name).collect()
    } else {
        goals
    };
    let transactions = store.list_transactions()?;

    println!(
        "🤖 Generating insights with {} ({})...",
        advisor.client().backend_name(),
        advisor.client().model()
    );

    let report = retry_with_delay(
        config.ai.retry_attempts,
        config.ai.retry_delay(),
        || advisor.try_generate_insights(&transactions, income, &goals),
    )
    .await
    .with_context(|| {
        format!(
            "AI backend at {} did not return insights",
            advisor.client().host()
        )
    })?;

    let insights = store.add_insights(report.insights)?;

    println!();
    println!("💡 Financial health score: {:.0}/100", report.health_score);
    println!("   ─────────────────────────────────────────────────────────────");
    for insight in &insights {
        print_insight(insight, currency);
    }

    Ok(InsightReport {
        insights,
        health_score: report.health_score,
    })
}

pub fn cmd_insights_dismiss(store: &Store, id: &str) -> Result<()> {
    let insight = store.set_insight_dismissed(id, true)?;
    println!("✅ Dismissed insight: {}", truncate(&insight.title, 50));
    Ok(())
}

pub async fn cmd_categorize(config: &Config, description: &str) -> Result<&'static str> {
    let description = description.trim();
    if description.is_empty() {
        anyhow::bail!("Description is required");
    }

    let category = match FinancialAdvisor::from_config(&config.ai) {
        Some(advisor) => {
            if !advisor.client().health_check().await {
                println!(
                    "   ⚠️  AI backend not responding at {}",
                    advisor.client().host()
                );
            }
            advisor.categorize(description).await
        }
        None => {
            println!("💡 Tip: Set OLLAMA_HOST or OPENAI_COMPATIBLE_HOST for AI categorization");
            finsight_core::ai::FALLBACK_CATEGORY
        }
    };

    println!("🏷️  {} → {}", description, category);

    Ok(category)
}
