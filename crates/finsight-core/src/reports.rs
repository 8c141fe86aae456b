//! Period reports
//!
//! A report is a pure value built from the transaction list: income and
//! expense breakdowns, top merchants, savings, and rule-generated insights
//! and recommendations.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::format::{format_currency, format_percentage};
use crate::metrics::{growth_percentage, savings_rate, WEEK_WINDOW_DAYS};
use crate::models::{
    ExpenseSection, FinancialReport, IncomeSection, MerchantSpending, SavingsSection, Transaction,
};

/// Merchants listed in a report
pub const TOP_MERCHANTS: usize = 10;

/// Share of spending above which a category gets a budget recommendation
const CATEGORY_SHARE_WARNING: f64 = 40.0;

/// Share of spending above which a single merchant is called out
const MERCHANT_SHARE_WARNING: f64 = 25.0;

/// Reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// Inclusive date range of the period containing `today`
    pub fn current(&self, today: NaiveDate) -> DateRange {
        match self {
            Self::Week => DateRange {
                start: today - Duration::days(WEEK_WINDOW_DAYS),
                end: today,
            },
            Self::Month => month_range(today.year(), today.month()),
            Self::Quarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                let start = ymd(today.year(), first_month, 1);
                let end = month_range(today.year(), first_month + 2).end;
                DateRange { start, end }
            }
            Self::Year => DateRange {
                start: ymd(today.year(), 1, 1),
                end: ymd(today.year(), 12, 31),
            },
        }
    }

    /// The range immediately before `current(today)`
    pub fn previous(&self, today: NaiveDate) -> DateRange {
        let current = self.current(today);
        let before = current.start - Duration::days(1);
        match self {
            Self::Week => DateRange {
                start: before - (current.end - current.start),
                end: before,
            },
            _ => self.current(before),
        }
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(format!(
                "Unknown report period: {} (use week, month, quarter or year)",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn month_range(year: i32, month: u32) -> DateRange {
    let start = ymd(year, month, 1);
    let next = if month == 12 {
        ymd(year + 1, 1, 1)
    } else {
        ymd(year, month + 1, 1)
    };
    DateRange {
        start,
        end: next - Duration::days(1),
    }
}

/// Builds reports, formatting amounts in the given currency
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    currency: String,
}

impl ReportGenerator {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn generate(
        &self,
        transactions: &[Transaction],
        period: ReportPeriod,
        today: NaiveDate,
    ) -> FinancialReport {
        let range = period.current(today);
        let previous = period.previous(today);

        let in_range: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| range.contains(t.date))
            .collect();
        let previous_income: f64 = transactions
            .iter()
            .filter(|t| previous.contains(t.date) && t.is_income())
            .map(|t| t.amount)
            .sum();

        let mut income_by_category: BTreeMap<String, f64> = BTreeMap::new();
        let mut expense_by_category: BTreeMap<String, f64> = BTreeMap::new();
        let mut income_total = 0.0;
        let mut expense_total = 0.0;
        for tx in &in_range {
            if tx.is_income() {
                income_total += tx.amount;
                *income_by_category.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
            } else if tx.is_expense() {
                expense_total += tx.amount.abs();
                *expense_by_category.entry(tx.category.clone()).or_insert(0.0) += tx.amount.abs();
            }
        }

        let report = FinancialReport {
            period: period.as_str().to_string(),
            start: range.start,
            end: range.end,
            income: IncomeSection {
                total: income_total,
                by_category: income_by_category,
                growth: growth_percentage(income_total, previous_income),
            },
            expenses: ExpenseSection {
                total: expense_total,
                by_category: expense_by_category,
                top_merchants: top_merchants(in_range.iter().copied(), TOP_MERCHANTS),
            },
            savings: SavingsSection {
                amount: income_total - expense_total,
                rate: savings_rate(income_total, expense_total),
            },
            insights: Vec::new(),
            recommendations: Vec::new(),
        };

        let (insights, recommendations) =
            self.commentary(&report, period, in_range.len(), previous_income);
        FinancialReport {
            insights,
            recommendations,
            ..report
        }
    }

    fn money(&self, amount: f64) -> String {
        format_currency(amount, &self.currency)
    }

    fn commentary(
        &self,
        report: &FinancialReport,
        period: ReportPeriod,
        count: usize,
        previous_income: f64,
    ) -> (Vec<String>, Vec<String>) {
        let mut insights = Vec::new();
        let mut recommendations = Vec::new();

        if count == 0 {
            insights.push(format!("No transactions recorded this {}.", period));
            recommendations
                .push("Add or import transactions to see spending insights.".to_string());
            return (insights, recommendations);
        }

        // Income trend
        if previous_income > 0.0 {
            let growth = report.income.growth;
            if growth > 0.0 {
                insights.push(format!(
                    "Income grew {} compared to the previous {}.",
                    format_percentage(growth, 1),
                    period
                ));
            } else if growth < 0.0 {
                insights.push(format!(
                    "Income fell {} compared to the previous {}.",
                    format_percentage(growth.abs(), 1),
                    period
                ));
                if growth < -10.0 {
                    recommendations.push(
                        "Review fixed costs while income is below the previous period."
                            .to_string(),
                    );
                }
            }
        }

        // Largest expense category
        let expenses = &report.expenses;
        if expenses.total > 0.0 {
            let mut largest: Option<(&String, f64)> = None;
            for (category, amount) in &expenses.by_category {
                if largest.map_or(true, |(_, best)| *amount > best) {
                    largest = Some((category, *amount));
                }
            }
            if let Some((category, amount)) = largest {
                let share = amount / expenses.total * 100.0;
                insights.push(format!(
                    "{} was the largest expense category at {} of spending ({}).",
                    category,
                    format_percentage(share, 1),
                    self.money(amount)
                ));
                if share > CATEGORY_SHARE_WARNING {
                    recommendations.push(format!(
                        "Set a budget for {}; it takes more than {} of spending.",
                        category,
                        format_percentage(CATEGORY_SHARE_WARNING, 0)
                    ));
                }
            }
        }

        // Savings rate
        if report.income.total > 0.0 {
            let rate = report.savings.rate;
            if rate < 0.0 {
                insights.push(format!(
                    "Spending exceeded income by {}.",
                    self.money(report.savings.amount.abs())
                ));
                recommendations.push(
                    "Cut discretionary spending until expenses are back below income."
                        .to_string(),
                );
            } else if rate < 10.0 {
                insights.push(format!(
                    "Savings rate is low at {}.",
                    format_percentage(rate, 1)
                ));
                recommendations.push(
                    "Aim to save at least 10% of income by automating a transfer on payday."
                        .to_string(),
                );
            } else if rate >= 20.0 {
                insights.push(format!(
                    "Strong savings rate of {}.",
                    format_percentage(rate, 1)
                ));
                recommendations.push(
                    "Consider moving surplus savings into an emergency fund or investments."
                        .to_string(),
                );
            } else {
                insights.push(format!("Savings rate is {}.", format_percentage(rate, 1)));
            }
        } else if expenses.total > 0.0 {
            insights.push(format!("No income recorded this {}.", period));
        }

        // Merchant concentration
        if let Some(top) = expenses.top_merchants.first() {
            if expenses.top_merchants.len() > 1 && expenses.total > 0.0 {
                let share = top.amount / expenses.total * 100.0;
                if share > MERCHANT_SHARE_WARNING {
                    insights.push(format!(
                        "{} accounts for {} of spending.",
                        top.merchant,
                        format_percentage(share, 1)
                    ));
                    recommendations.push(format!(
                        "Check whether spending at {} can be reduced or replaced.",
                        top.merchant
                    ));
                }
            }
        }

        (insights, recommendations)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new("USD")
    }
}

/// Report with the default (USD) generator
pub fn generate_report(
    transactions: &[Transaction],
    period: ReportPeriod,
    today: NaiveDate,
) -> FinancialReport {
    ReportGenerator::default().generate(transactions, period, today)
}

/// Expense merchants by summed absolute spend; ties by name
pub fn top_merchants<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    limit: usize,
) -> Vec<MerchantSpending> {
    let mut by_merchant: HashMap<&str, (f64, usize)> = HashMap::new();
    for tx in transactions.into_iter().filter(|t| t.is_expense()) {
        let entry = by_merchant.entry(tx.merchant_or_name()).or_insert((0.0, 0));
        entry.0 += tx.amount.abs();
        entry.1 += 1;
    }

    let mut merchants: Vec<MerchantSpending> = by_merchant
        .into_iter()
        .map(|(merchant, (amount, transaction_count))| MerchantSpending {
            merchant: merchant.to_string(),
            amount,
            transaction_count,
        })
        .collect();
    merchants.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    merchants.truncate(limit);
    merchants
}
