//! Goal progress and budget spending

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::metrics::{Membership, WEEK_WINDOW_DAYS};
use crate::models::{Budget, BudgetPeriod, FinancialGoal, Transaction};

impl FinancialGoal {
    /// Percent complete, capped at 100; 0 when the target is 0
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }

    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.target_amount > 0.0 && self.current_amount >= self.target_amount
    }

    /// Monthly amount needed to hit the deadline, if one is set and not passed
    pub fn monthly_contribution_needed(&self, today: NaiveDate) -> Option<f64> {
        let deadline = self.deadline?;
        if deadline <= today || self.is_complete() {
            return None;
        }
        let months = (deadline.year() - today.year()) * 12 + deadline.month() as i32
            - today.month() as i32;
        Some(self.remaining() / months.max(1) as f64)
    }
}

impl BudgetPeriod {
    /// Membership rule for the budget's current period
    pub fn membership(&self, today: NaiveDate) -> Membership {
        match self {
            Self::Weekly => Membership::RollingWindow {
                end: today,
                days: WEEK_WINDOW_DAYS,
            },
            Self::Monthly => Membership::month_of(today),
            Self::Yearly => Membership::year_of(today.year()),
        }
    }
}

impl Budget {
    /// Copy with `spent` recomputed from transactions in the budget's period
    pub fn with_spent(&self, transactions: &[Transaction], today: NaiveDate) -> Budget {
        let membership = self.period.membership(today);
        let spent = transactions
            .iter()
            .filter(|t| {
                t.is_expense()
                    && t.category.eq_ignore_ascii_case(&self.category)
                    && membership.contains(t.date)
            })
            .map(|t| t.amount.abs())
            .sum();
        Budget {
            spent,
            ..self.clone()
        }
    }

    /// Percent of the allocation spent; not capped
    pub fn progress(&self) -> f64 {
        if self.allocated <= 0.0 {
            return 0.0;
        }
        self.spent / self.allocated * 100.0
    }

    pub fn remaining(&self) -> f64 {
        self.allocated - self.spent
    }

    pub fn over_budget(&self) -> bool {
        self.spent > self.allocated
    }
}

/// Budget plus derived figures, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub budget: Budget,
    pub progress: f64,
    pub remaining: f64,
    pub over_budget: bool,
}

/// Goal plus derived figures, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalStatus {
    #[serde(flatten)]
    pub goal: FinancialGoal,
    pub progress: f64,
    pub remaining: f64,
    pub complete: bool,
    pub monthly_needed: Option<f64>,
}

/// Refresh `spent` on every budget and attach progress
pub fn budget_statuses(
    budgets: &[Budget],
    transactions: &[Transaction],
    today: NaiveDate,
) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .map(|b| {
            let budget = b.with_spent(transactions, today);
            BudgetStatus {
                progress: budget.progress(),
                remaining: budget.remaining(),
                over_budget: budget.over_budget(),
                budget,
            }
        })
        .collect()
}

pub fn goal_statuses(goals: &[FinancialGoal], today: NaiveDate) -> Vec<GoalStatus> {
    goals
        .iter()
        .map(|g| GoalStatus {
            progress: g.progress(),
            remaining: g.remaining(),
            complete: g.is_complete(),
            monthly_needed: g.monthly_contribution_needed(today),
            goal: g.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target: f64, current: f64) -> FinancialGoal {
        FinancialGoal {
            id: "g".into(),
            name: "Trip".into(),
            target_amount: target,
            current_amount: current,
            deadline: None,
            category: None,
            created_at: Utc::now(),
        }
    }

    fn spend(amount: f64, category: &str, on: NaiveDate) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            name: category.into(),
            amount: -amount,
            transaction_type: TransactionType::Expense,
            category: category.into(),
            date: on,
            merchant: None,
            notes: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_goal_progress() {
        assert_eq!(goal(1000.0, 250.0).progress(), 25.0);
        assert_eq!(goal(1000.0, 1500.0).progress(), 100.0);
        assert_eq!(goal(0.0, 10.0).progress(), 0.0);
        assert!(goal(100.0, 100.0).is_complete());
        assert_eq!(goal(100.0, 150.0).remaining(), 0.0);
    }

    #[test]
    fn test_monthly_contribution_needed() {
        let mut g = goal(1200.0, 0.0);
        g.deadline = Some(date(2026, 12, 1));
        assert_eq!(g.monthly_contribution_needed(date(2026, 6, 15)), Some(200.0));
        assert_eq!(g.monthly_contribution_needed(date(2027, 1, 1)), None);
    }

    #[test]
    fn test_budget_spent_from_current_month() {
        let today = date(2026, 3, 20);
        let budget = Budget {
            id: "b".into(),
            category: "Groceries".into(),
            allocated: 200.0,
            spent: 0.0,
            period: BudgetPeriod::Monthly,
            created_at: Utc::now(),
        };
        let txs = vec![
            spend(150.0, "Groceries", date(2026, 3, 2)),
            spend(100.0, "groceries", date(2026, 3, 18)),
            spend(500.0, "Groceries", date(2026, 2, 28)),
            spend(40.0, "Dining", date(2026, 3, 3)),
        ];
        let status = &budget_statuses(&[budget], &txs, today)[0];
        assert_eq!(status.budget.spent, 250.0);
        assert_eq!(status.progress, 125.0);
        assert_eq!(status.remaining, -50.0);
        assert!(status.over_budget);
    }

    #[test]
    fn test_weekly_budget_uses_rolling_window() {
        let today = date(2026, 3, 20);
        let budget = Budget {
            id: "b".into(),
            category: "Coffee".into(),
            allocated: 30.0,
            spent: 0.0,
            period: BudgetPeriod::Weekly,
            created_at: Utc::now(),
        };
        let txs = vec![
            spend(5.0, "Coffee", date(2026, 3, 13)),
            spend(5.0, "Coffee", date(2026, 3, 12)),
        ];
        assert_eq!(budget.with_spent(&txs, today).spent, 5.0);
    }
}
