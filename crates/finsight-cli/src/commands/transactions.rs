//! Transaction command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use finsight_core::{
    NewTransaction, SortField, SortOrder, Store, Transaction, TransactionFilter, TransactionType,
};
use serde_json::Value;

use super::{colored_amount, truncate};

/// Build transaction input from command-line values
///
/// The amount stays a string so the core validation reports bad input the
/// same way the API does.
pub fn new_transaction(
    name: String,
    amount: &str,
    category: String,
    date: String,
    merchant: Option<String>,
    notes: Option<String>,
    tags: Vec<String>,
) -> NewTransaction {
    NewTransaction {
        name,
        amount: Value::String(amount.to_string()),
        category,
        date,
        merchant,
        notes,
        tags: tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        ..Default::default()
    }
}

pub fn cmd_add(
    store: &Store,
    input: &NewTransaction,
    today: NaiveDate,
    currency: &str,
) -> Result<Transaction> {
    let tx = store.add_transaction(input, today)?;

    println!("✅ Added transaction {}", tx.id);
    print_transaction_line(&tx, currency);

    Ok(tx)
}

/// Filters for `list`
pub struct ListOptions<'a> {
    pub limit: usize,
    pub search: Option<&'a str>,
    pub category: Option<&'a str>,
    pub transaction_type: Option<&'a str>,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub sort: &'a str,
    pub order: &'a str,
}

pub fn cmd_list(store: &Store, options: &ListOptions<'_>, currency: &str) -> Result<()> {
    let transaction_type = options
        .transaction_type
        .map(str::parse::<TransactionType>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let sort: SortField = options.sort.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let order: SortOrder = options.order.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let filter = TransactionFilter::new()
        .search(options.search)
        .category(options.category)
        .transaction_type(transaction_type)
        .date_range(parse_date_arg(options.from)?, parse_date_arg(options.to)?)
        .sort(sort, order)
        .paginate(0, Some(options.limit));

    let transactions = store.list_transactions()?;
    let result = filter.apply(&transactions);

    if result.transactions.is_empty() {
        println!("No transactions found. Add one with:");
        println!("  finsight add \"Coffee\" -4.50 --category \"Food & Dining\"");
        return Ok(());
    }

    println!();
    println!(
        "📝 Transactions ({} of {})",
        result.transactions.len(),
        result.total
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in &result.transactions {
        print_transaction_line(tx, currency);
    }

    Ok(())
}

/// Replacement values for `edit`; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct TransactionEdit {
    pub name: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub merchant: Option<String>,
    pub notes: Option<String>,
}

pub fn cmd_edit(
    store: &Store,
    id: &str,
    edit: TransactionEdit,
    today: NaiveDate,
    currency: &str,
) -> Result<Transaction> {
    let current = store.get_transaction(id)?;

    let input = NewTransaction {
        name: edit.name.unwrap_or(current.name),
        amount: match edit.amount {
            Some(amount) => Value::String(amount),
            None => Value::from(current.amount),
        },
        category: edit.category.unwrap_or(current.category),
        date: edit.date.unwrap_or_else(|| current.date.to_string()),
        merchant: edit.merchant.or(current.merchant),
        notes: edit.notes.or(current.notes),
        tags: current.tags,
        ..Default::default()
    };

    let tx = store.update_transaction(id, &input, today)?;

    println!("✅ Updated transaction {}", tx.id);
    print_transaction_line(&tx, currency);

    Ok(tx)
}

pub fn cmd_delete(store: &Store, id: &str) -> Result<()> {
    let tx = store.get_transaction(id)?;
    store.delete_transaction(id)?;

    println!("🗑️  Deleted transaction {}: {}", id, truncate(&tx.name, 40));

    Ok(())
}

pub fn cmd_import(store: &Store, file: &Path, today: NaiveDate) -> Result<()> {
    println!("📥 Importing transactions from {}...", file.display());

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&content).context("Import file is not valid JSON")?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(records)) => records,
            _ => bail!("Expected a list of transactions or {{\"transactions\": [...]}}"),
        },
        _ => bail!("Expected a list of transactions or {{\"transactions\": [...]}}"),
    };

    let stats = store.import_transactions(records, today)?;

    println!();
    println!("📊 Import Results");
    println!("   ─────────────────────────────");
    println!("   Imported: {}", stats.imported);
    println!("   Skipped:  {}", stats.skipped);
    if stats.skipped > 0 {
        println!();
        println!("   Skipped records were malformed, zero, future-dated or duplicates.");
        println!("   Run with --verbose to see why each one was skipped.");
    }

    Ok(())
}

fn print_transaction_line(tx: &Transaction, currency: &str) {
    println!(
        "   {} │ {:>14} │ {:<18} │ {}  [{}]",
        tx.date,
        colored_amount(tx.amount, currency),
        truncate(&tx.category, 18),
        truncate(&tx.name, 36),
        tx.id
    );
}

fn parse_date_arg(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", s))
        })
        .transpose()
}
