//! Normalization of persisted or imported transaction records
//!
//! Older records may be missing fields, carry numeric ids, store the amount as
//! a string, use `description` instead of `name`, or have a `type` that
//! disagrees with the sign of `amount`. The sign is ground truth.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::models::{
    clean_tags, non_blank, parse_amount, Transaction, TransactionType, MAX_TRANSACTION_AMOUNT,
};

const DEFAULT_CATEGORY: &str = "Other";
const DEFAULT_NAME: &str = "Untitled";

/// Namespace for ids derived from stored records that have none
const STORED_RECORD_NAMESPACE: uuid::Uuid =
    uuid::Uuid::from_u128(0x6f1c_2a4e_8b3d_4c57_9e21_d0a8_53f4_7b19);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTransaction {
    id: serde_json::Value,
    #[serde(alias = "description", alias = "title")]
    name: Option<String>,
    amount: serde_json::Value,
    category: Option<String>,
    date: Option<String>,
    merchant: Option<String>,
    notes: Option<String>,
    tags: serde_json::Value,
    #[serde(alias = "createdAt")]
    created_at: Option<String>,
    #[serde(alias = "updatedAt")]
    updated_at: Option<String>,
}

/// Normalize one record. Returns the reason when the record is unusable.
///
/// A record without an id gets a fresh random one.
pub fn normalize_transaction(
    value: serde_json::Value,
    now: DateTime<Utc>,
) -> std::result::Result<Transaction, String> {
    normalize_with_id(value, now, || uuid::Uuid::new_v4().to_string())
}

/// Id for a stored record that lacks one, stable across loads of the same list
pub(crate) fn stored_record_id(index: usize, record: &serde_json::Value) -> String {
    let key = format!("{}:{}", index, record);
    uuid::Uuid::new_v5(&STORED_RECORD_NAMESPACE, key.as_bytes()).to_string()
}

fn normalize_with_id(
    value: serde_json::Value,
    now: DateTime<Utc>,
    missing_id: impl FnOnce() -> String,
) -> std::result::Result<Transaction, String> {
    let raw: RawTransaction =
        serde_json::from_value(value).map_err(|e| format!("not a transaction record: {}", e))?;

    let amount = parse_amount(&raw.amount).ok_or("missing or non-numeric amount")?;
    let date = raw
        .date
        .as_deref()
        .and_then(parse_record_date)
        .ok_or("missing or invalid date")?;

    let id = match raw.id {
        serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => missing_id(),
    };

    let merchant = non_blank(raw.merchant.as_deref());
    let name = non_blank(raw.name.as_deref())
        .or_else(|| merchant.clone())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let category =
        non_blank(raw.category.as_deref()).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let created_at = raw
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let updated_at = raw
        .updated_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(created_at);

    Ok(Transaction {
        id,
        name,
        amount,
        transaction_type: TransactionType::from_amount(amount),
        category,
        date,
        merchant,
        notes: non_blank(raw.notes.as_deref()),
        tags: parse_tags(&raw.tags),
        created_at,
        updated_at,
    })
}

/// Normalize a stored list, dropping unusable records and repeated ids
pub fn normalize_transactions(
    records: Vec<serde_json::Value>,
    now: DateTime<Utc>,
) -> (Vec<Transaction>, usize) {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (index, record) in records.into_iter().enumerate() {
        let fallback_id = stored_record_id(index, &record);
        match normalize_with_id(record, now, || fallback_id) {
            Ok(tx) if seen.insert(tx.id.clone()) => out.push(tx),
            Ok(tx) => {
                warn!(id = %tx.id, "Duplicate transaction id in stored list");
                skipped += 1;
            }
            Err(reason) => {
                warn!(%reason, "Unreadable transaction record");
                skipped += 1;
            }
        }
    }

    (out, skipped)
}

/// Checks applied to imported records on top of normalization
pub fn check_importable(tx: &Transaction, today: NaiveDate) -> std::result::Result<(), String> {
    if tx.amount == 0.0 {
        return Err("zero amount".into());
    }
    if tx.amount.abs() > MAX_TRANSACTION_AMOUNT {
        return Err("amount out of range".into());
    }
    if tx.date > today {
        return Err("future-dated".into());
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` with or without a trailing time component
fn parse_record_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Tags may be a list or a comma-separated string
fn parse_tags(value: &serde_json::Value) -> Vec<String> {
    let tags: Vec<String> = match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        serde_json::Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    clean_tags(&tags)
}
