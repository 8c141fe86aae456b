//! Goal and budget command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use finsight_core::format::{format_currency, format_date, format_percentage};
use finsight_core::{
    budget_statuses, goal_statuses, Budget, BudgetPeriod, FinancialGoal, NewBudget, NewGoal, Store,
};

use super::truncate;

/// Text progress bar, e.g. `[######----]`
fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

// ========== Goals ==========

pub fn cmd_goals_list(store: &Store, today: NaiveDate, currency: &str) -> Result<()> {
    let goals = store.list_goals()?;

    if goals.is_empty() {
        println!("No goals yet. Add one with:");
        println!("  finsight goals add \"Emergency fund\" 5000 --deadline 2025-12-31");
        return Ok(());
    }

    println!();
    println!("🎯 Goals");
    println!("   ─────────────────────────────────────────────────────────────");

    for status in goal_statuses(&goals, today) {
        let goal = &status.goal;
        let marker = if status.complete { "✅" } else { "  " };
        println!(
            "{} {} {} {} / {} ({})",
            marker,
            progress_bar(status.progress, 20),
            truncate(&goal.name, 28),
            format_currency(goal.current_amount, currency),
            format_currency(goal.target_amount, currency),
            format_percentage(status.progress, 0)
        );
        if let Some(deadline) = goal.deadline {
            match status.monthly_needed {
                Some(monthly) => println!(
                    "      Due {}: {} per month to stay on track",
                    format_date(deadline),
                    format_currency(monthly, currency)
                ),
                None => println!("      Due {}", format_date(deadline)),
            }
        }
        println!("      ID: {}", goal.id);
    }

    Ok(())
}

pub fn cmd_goals_add(
    store: &Store,
    name: &str,
    target: f64,
    deadline: Option<&str>,
    category: Option<String>,
    currency: &str,
) -> Result<FinancialGoal> {
    let deadline = deadline
        .map(|d| {
            NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid deadline '{}' (use YYYY-MM-DD)", d))
        })
        .transpose()?;

    let goal = store.add_goal(&NewGoal {
        name: name.to_string(),
        target_amount: target,
        current_amount: 0.0,
        deadline,
        category,
    })?;

    println!(
        "✅ Added goal '{}' with target {}",
        goal.name,
        format_currency(goal.target_amount, currency)
    );
    println!("   ID: {}", goal.id);

    Ok(goal)
}

pub fn cmd_goals_contribute(
    store: &Store,
    id: &str,
    amount: f64,
    currency: &str,
) -> Result<FinancialGoal> {
    let goal = store.contribute_to_goal(id, amount)?;

    println!(
        "💰 Added {} to '{}': {} / {} ({})",
        format_currency(amount, currency),
        goal.name,
        format_currency(goal.current_amount, currency),
        format_currency(goal.target_amount, currency),
        format_percentage(goal.progress(), 0)
    );
    if goal.is_complete() {
        println!("🎉 Goal reached!");
    }

    Ok(goal)
}

pub fn cmd_goals_delete(store: &Store, id: &str) -> Result<()> {
    store.delete_goal(id)?;
    println!("🗑️  Deleted goal {}", id);
    Ok(())
}

// ========== Budgets ==========

pub fn cmd_budgets_list(store: &Store, today: NaiveDate, currency: &str) -> Result<()> {
    let budgets = store.list_budgets()?;

    if budgets.is_empty() {
        println!("No budgets yet. Add one with:");
        println!("  finsight budgets add Groceries 400 --period monthly");
        return Ok(());
    }

    let transactions = store.list_transactions()?;

    println!();
    println!("💼 Budgets");
    println!("   ─────────────────────────────────────────────────────────────");

    for status in budget_statuses(&budgets, &transactions, today) {
        let budget = &status.budget;
        let marker = if status.over_budget { "⚠️ " } else { "  " };
        println!(
            "{} {} {:<20} {} / {} {}",
            marker,
            progress_bar(status.progress, 20),
            truncate(&budget.category, 20),
            format_currency(budget.spent, currency),
            format_currency(budget.allocated, currency),
            budget.period.as_str()
        );
        println!("      ID: {}", budget.id);
    }

    Ok(())
}

pub fn cmd_budgets_add(
    store: &Store,
    category: &str,
    allocated: f64,
    period: &str,
    currency: &str,
) -> Result<Budget> {
    let period: BudgetPeriod = period.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let budget = store.add_budget(&NewBudget {
        category: category.to_string(),
        allocated,
        period,
    })?;

    println!(
        "✅ Added {} budget for {}: {}",
        budget.period.as_str(),
        budget.category,
        format_currency(budget.allocated, currency)
    );
    println!("   ID: {}", budget.id);

    Ok(budget)
}

pub fn cmd_budgets_delete(store: &Store, id: &str) -> Result<()> {
    store.delete_budget(id)?;
    println!("🗑️  Deleted budget {}", id);
    Ok(())
}
