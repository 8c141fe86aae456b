//! Transaction filter builder for list views
//!
//! Filters, sorts and paginates an in-memory transaction slice. The
//! lifetime `'query` is how long the borrowed filter inputs (search text,
//! category, tag) must stay valid.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::{Transaction, TransactionType};

/// Field to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Name,
    Category,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "name" | "description" => Ok(Self::Name),
            "category" => Ok(Self::Category),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// Builder for transaction list queries
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter<'query> {
    pub search: Option<&'query str>,
    pub category: Option<&'query str>,
    pub transaction_type: Option<TransactionType>,
    pub date_range: (Option<NaiveDate>, Option<NaiveDate>),
    /// Bounds on the absolute amount
    pub amount_range: (Option<f64>, Option<f64>),
    pub tag: Option<&'query str>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// One page of filtered transactions
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    pub transactions: Vec<Transaction>,
    /// Matches before pagination
    pub total: usize,
}

impl<'query> TransactionFilter<'query> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive search over name, merchant, category, notes and tags
    pub fn search(mut self, query: Option<&'query str>) -> Self {
        self.search = query;
        self
    }

    pub fn category(mut self, category: Option<&'query str>) -> Self {
        self.category = category;
        self
    }

    pub fn transaction_type(mut self, transaction_type: Option<TransactionType>) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Inclusive; either end may be open
    pub fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_range = (from, to);
        self
    }

    pub fn amount_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.amount_range = (min, max);
        self
    }

    pub fn tag(mut self, tag: Option<&'query str>) -> Self {
        self.tag = tag;
        self
    }

    pub fn sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = field;
        self.sort_order = order;
        self
    }

    pub fn paginate(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Whether one transaction passes every condition
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(q) = non_empty(self.search) {
            let q = q.to_lowercase();
            let hit = tx.name.to_lowercase().contains(&q)
                || tx.category.to_lowercase().contains(&q)
                || tx
                    .merchant
                    .as_deref()
                    .is_some_and(|m| m.to_lowercase().contains(&q))
                || tx
                    .notes
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&q))
                || tx.tags.iter().any(|t| t.to_lowercase().contains(&q));
            if !hit {
                return false;
            }
        }

        if let Some(category) = non_empty(self.category) {
            if !tx.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }

        if let Some(kind) = self.transaction_type {
            if TransactionType::from_amount(tx.amount) != kind {
                return false;
            }
        }

        let (from, to) = self.date_range;
        if from.is_some_and(|from| tx.date < from) || to.is_some_and(|to| tx.date > to) {
            return false;
        }

        let (min, max) = self.amount_range;
        let magnitude = tx.amount.abs();
        if min.is_some_and(|min| magnitude < min) || max.is_some_and(|max| magnitude > max) {
            return false;
        }

        if let Some(tag) = non_empty(self.tag) {
            if !tx.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }

        true
    }

    /// Filter, sort and paginate
    pub fn apply(&self, transactions: &[Transaction]) -> FilterResult {
        let mut matched: Vec<&Transaction> =
            transactions.iter().filter(|t| self.matches(t)).collect();

        matched.sort_by(|a, b| {
            let ordering = compare(a, b, self.sort_field)
                // Creation time breaks ties
                .then_with(|| a.created_at.cmp(&b.created_at));
            match self.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        FilterResult {
            transactions: page,
            total,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn compare(a: &Transaction, b: &Transaction, field: SortField) -> Ordering {
    match field {
        SortField::Date => a.date.cmp(&b.date),
        SortField::Amount => a.amount.total_cmp(&b.amount),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
    }
}
