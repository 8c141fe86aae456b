//! Period-scoped financial metrics
//!
//! Two membership strategies decide whether a transaction belongs to a
//! period, and they are kept separate:
//!
//! - `RollingWindow`: the last N days up to and including today (week)
//! - `CalendarPrefix`: the date string starts with the current `YYYY-MM` or
//!   `YYYY` (month, year), so any day of the current calendar month counts
//!
//! Only calendar periods have a previous period to compare against; the
//! rolling week reports every change figure as 0.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{FinancialMetrics, Transaction};

/// Length of the rolling week window
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// Label used when a period has no expenses
pub const NO_CATEGORY: &str = "None";

/// Dashboard period for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Whether a previous period exists to compute changes against
    pub fn supports_comparison(&self) -> bool {
        !matches!(self, Self::Week)
    }

    /// Membership rule for the period containing `today`
    pub fn current(&self, today: NaiveDate) -> Membership {
        match self {
            Self::Week => Membership::RollingWindow {
                end: today,
                days: WEEK_WINDOW_DAYS,
            },
            Self::Month => Membership::month_of(today),
            Self::Year => Membership::year_of(today.year()),
        }
    }

    /// Membership rule for the period before the current one
    pub fn previous(&self, today: NaiveDate) -> Option<Membership> {
        match self {
            Self::Week => None,
            Self::Month => Some(Membership::month_of(previous_month_start(today))),
            Self::Year => Some(Membership::year_of(today.year() - 1)),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!("Unknown period: {} (use week, month or year)", s)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a date is tested for membership in a period
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    /// `end - days <= date <= end`
    RollingWindow { end: NaiveDate, days: i64 },
    /// The `YYYY-MM-DD` rendering of the date starts with `prefix`
    CalendarPrefix { prefix: String },
}

impl Membership {
    pub fn month_of(date: NaiveDate) -> Self {
        Self::CalendarPrefix {
            prefix: date.format("%Y-%m").to_string(),
        }
    }

    pub fn year_of(year: i32) -> Self {
        Self::CalendarPrefix {
            prefix: format!("{:04}", year),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::RollingWindow { end, days } => {
                let start = *end - Duration::days(*days);
                start <= date && date <= *end
            }
            Self::CalendarPrefix { prefix } => {
                date.format("%Y-%m-%d").to_string().starts_with(prefix.as_str())
            }
        }
    }
}

/// `(current - previous) / previous * 100`, 0 when previous is 0
pub fn growth_percentage(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    let growth = (current - previous) / previous * 100.0;
    if growth.is_finite() {
        growth
    } else {
        0.0
    }
}

/// `(income - expenses) / income * 100`, 0 when income is 0
pub fn savings_rate(income: f64, expenses: f64) -> f64 {
    if income == 0.0 {
        return 0.0;
    }
    (income - expenses) / income * 100.0
}

/// Running sums over the transactions of one period
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PeriodTotals {
    pub income: f64,
    /// Absolute
    pub expenses: f64,
    pub count: usize,
    pub absolute_sum: f64,
    pub expenses_by_category: BTreeMap<String, f64>,
}

impl PeriodTotals {
    pub fn collect<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
        membership: &Membership,
    ) -> Self {
        let mut totals = Self::default();
        for tx in transactions {
            if !membership.contains(tx.date) {
                continue;
            }
            totals.count += 1;
            totals.absolute_sum += tx.amount.abs();
            if tx.is_income() {
                totals.income += tx.amount;
            } else if tx.is_expense() {
                totals.expenses += tx.amount.abs();
                *totals
                    .expenses_by_category
                    .entry(tx.category.clone())
                    .or_insert(0.0) += tx.amount.abs();
            }
        }
        totals
    }

    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }

    pub fn savings_rate(&self) -> f64 {
        savings_rate(self.income, self.expenses)
    }

    /// Largest expense category; ties go to the alphabetically first
    pub fn top_category(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (category, amount) in &self.expenses_by_category {
            if best.map_or(true, |(_, b)| *amount > b) {
                best = Some((category.as_str(), *amount));
            }
        }
        best
    }

    pub fn average_transaction(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.absolute_sum / self.count as f64
        }
    }
}

/// Compute dashboard metrics for `period` as of `today`
pub fn compute_metrics(
    transactions: &[Transaction],
    period: Period,
    today: NaiveDate,
) -> FinancialMetrics {
    let current = PeriodTotals::collect(transactions, &period.current(today));
    let previous = period
        .previous(today)
        .map(|membership| PeriodTotals::collect(transactions, &membership));

    let (net_worth_change, income_change, expense_change, savings_rate_change) = match &previous
    {
        Some(prev) => (
            growth_percentage(current.net(), prev.net()),
            growth_percentage(current.income, prev.income),
            growth_percentage(current.expenses, prev.expenses),
            current.savings_rate() - prev.savings_rate(),
        ),
        None => (0.0, 0.0, 0.0, 0.0),
    };

    FinancialMetrics {
        net_worth: current.net(),
        net_worth_change,
        income: current.income,
        income_change,
        expenses: current.expenses,
        expense_change,
        savings_rate: current.savings_rate(),
        savings_rate_change,
        top_category: current
            .top_category()
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| NO_CATEGORY.to_string()),
        transaction_count: current.count,
        average_transaction: current.average_transaction(),
    }
}

fn previous_month_start(today: NaiveDate) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    let last_of_previous = first - Duration::days(1);
    last_of_previous.with_day(1).unwrap_or(last_of_previous)
}
