//! Persistence for the dashboard's collections
//!
//! Each logical collection (transactions, goals, budgets, insights, settings)
//! is stored as one serialized blob under a single key, and the whole blob is
//! rewritten after every mutation.
//!
//! # Architecture
//!
//! - `StorageBackend` trait: raw blob access (`read` / `write`) keyed by `CollectionKey`
//! - Backends: `JsonFileBackend` (one JSON file per key), `MemoryBackend` (tests)
//! - `Repository<T>`: typed `load()` / `save()` for one collection
//! - `Store`: the operations the server and CLI call
//!
//! # Revisions
//!
//! Every blob carries a revision counter. `write` only succeeds when the
//! caller's expected revision still matches what is stored, so two writers
//! that loaded the same snapshot cannot silently overwrite each other; the
//! second one gets `Error::Conflict`.
//!
//! Within one process, `Store` serializes its own load-modify-save cycles,
//! so a conflict only surfaces when another process (or another `Store` over
//! the same directory) wrote in between.

mod json_file;
mod memory;
pub mod normalize;

pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;

use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{
    AIInsight, Budget, FinancialGoal, NewBudget, NewGoal, NewTransaction, Settings, Transaction,
};

/// Keys of the persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Transactions,
    Goals,
    Budgets,
    Insights,
    Settings,
}

impl CollectionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Goals => "goals",
            Self::Budgets => "budgets",
            Self::Insights => "insights",
            Self::Settings => "settings",
        }
    }

    pub fn all() -> &'static [CollectionKey] {
        &[
            Self::Transactions,
            Self::Goals,
            Self::Budgets,
            Self::Insights,
            Self::Settings,
        ]
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted blob with its revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub revision: u64,
    pub data: serde_json::Value,
}

/// Raw blob storage
pub trait StorageBackend: Send + Sync {
    /// Backend name (for logging)
    fn name(&self) -> &str;

    /// Read the blob for a key, `None` if nothing was ever written
    fn read(&self, key: CollectionKey) -> Result<Option<StoredBlob>>;

    /// Replace the blob if the stored revision equals `expected_revision`.
    /// Returns the new revision.
    fn write(
        &self,
        key: CollectionKey,
        data: serde_json::Value,
        expected_revision: u64,
    ) -> Result<u64>;
}

/// A collection type that can be loaded from a persisted blob
pub trait Collection: Serialize + Sized {
    const KEY: CollectionKey;

    /// Value used when nothing is stored yet
    fn empty() -> Self;

    /// Decode a stored blob, normalizing legacy or partial records
    fn from_stored(data: serde_json::Value) -> Result<Self>;
}

impl Collection for Vec<Transaction> {
    const KEY: CollectionKey = CollectionKey::Transactions;

    fn empty() -> Self {
        Vec::new()
    }

    fn from_stored(data: serde_json::Value) -> Result<Self> {
        let records = expect_array(Self::KEY, data)?;
        let (transactions, skipped) = normalize::normalize_transactions(records, Utc::now());
        if skipped > 0 {
            warn!(skipped, "Dropped unreadable transaction records on load");
        }
        Ok(transactions)
    }
}

impl Collection for Vec<FinancialGoal> {
    const KEY: CollectionKey = CollectionKey::Goals;

    fn empty() -> Self {
        Vec::new()
    }

    fn from_stored(data: serde_json::Value) -> Result<Self> {
        lenient_list(Self::KEY, data)
    }
}

impl Collection for Vec<Budget> {
    const KEY: CollectionKey = CollectionKey::Budgets;

    fn empty() -> Self {
        Vec::new()
    }

    fn from_stored(data: serde_json::Value) -> Result<Self> {
        lenient_list(Self::KEY, data)
    }
}

impl Collection for Vec<AIInsight> {
    const KEY: CollectionKey = CollectionKey::Insights;

    fn empty() -> Self {
        Vec::new()
    }

    fn from_stored(data: serde_json::Value) -> Result<Self> {
        let records = expect_array(Self::KEY, data)?;
        let mut insights = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let fallback_id = normalize::stored_record_id(index, &record);
            match serde_json::from_value::<AIInsight>(record) {
                Ok(mut insight) => {
                    if insight.id.is_empty() {
                        insight.id = fallback_id;
                    }
                    insights.push(insight);
                }
                Err(e) => warn!(collection = %Self::KEY, error = %e, "Skipping unreadable record"),
            }
        }
        Ok(insights)
    }
}

impl Collection for Settings {
    const KEY: CollectionKey = CollectionKey::Settings;

    fn empty() -> Self {
        Settings::default()
    }

    fn from_stored(data: serde_json::Value) -> Result<Self> {
        serde_json::from_value(data)
            .map_err(|e| Error::Storage(format!("Unreadable {} blob: {}", Self::KEY, e)))
    }
}

fn expect_array(key: CollectionKey, data: serde_json::Value) -> Result<Vec<serde_json::Value>> {
    match data {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(Error::Storage(format!(
            "Expected a list for {}, found {}",
            key,
            json_kind(&other)
        ))),
    }
}

/// Decode each record independently, skipping the ones that do not parse
fn lenient_list<T: DeserializeOwned>(key: CollectionKey, data: serde_json::Value) -> Result<Vec<T>> {
    let records = expect_array(key, data)?;
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value(record) {
            Ok(item) => out.push(item),
            Err(e) => warn!(collection = %key, error = %e, "Skipping unreadable record"),
        }
    }
    Ok(out)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A loaded collection and the revision it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub revision: u64,
    pub items: T,
}

/// Typed access to one collection
pub struct Repository<T> {
    backend: Arc<dyn StorageBackend>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Collection> Repository<T> {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            _marker: PhantomData,
        }
    }

    /// Load the collection (empty if nothing is stored)
    pub fn load(&self) -> Result<Snapshot<T>> {
        match self.backend.read(T::KEY)? {
            Some(blob) => Ok(Snapshot {
                revision: blob.revision,
                items: T::from_stored(blob.data)?,
            }),
            None => Ok(Snapshot {
                revision: 0,
                items: T::empty(),
            }),
        }
    }

    /// Save the whole collection; fails with `Error::Conflict` if it changed since `load`
    pub fn save(&self, snapshot: &Snapshot<T>) -> Result<u64> {
        let data = serde_json::to_value(&snapshot.items)?;
        let revision = self.backend.write(T::KEY, data, snapshot.revision)?;
        debug!(collection = %T::KEY, revision, "Saved collection");
        Ok(revision)
    }
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

/// Operations over all persisted collections
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StorageBackend>,
    /// Held for the whole load-modify-save cycle; shared by clones
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open a file-backed store in `dir` (created if missing)
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let backend = JsonFileBackend::new(dir.as_ref())?;
        info!("Opened store at {}", backend.dir().display());
        Ok(Self::new(Arc::new(backend)))
    }

    /// Non-persistent store for tests and demos
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn repository<T: Collection>(&self) -> Repository<T> {
        Repository::new(self.backend.clone())
    }

    /// Load, mutate and save one collection
    fn modify<T: Collection, R>(&self, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        // The guard protects no data, so a poisoned lock is still usable
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let repo = self.repository::<T>();
        let mut snapshot = repo.load()?;
        let out = f(&mut snapshot.items)?;
        repo.save(&snapshot)?;
        Ok(out)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.repository::<Vec<Transaction>>().load()?.items)
    }

    pub fn get_transaction(&self, id: &str) -> Result<Transaction> {
        self.list_transactions()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
    }

    /// Validate and add a transaction
    pub fn add_transaction(&self, input: &NewTransaction, today: NaiveDate) -> Result<Transaction> {
        let fields = input.validate(today)?;
        let transaction = Transaction::new(fields, Utc::now());
        let created = transaction.clone();
        self.modify(|list: &mut Vec<Transaction>| {
            list.push(transaction);
            Ok(())
        })?;
        info!(id = %created.id, amount = created.amount, "Added transaction");
        Ok(created)
    }

    /// Validate and replace the editable fields of a transaction
    pub fn update_transaction(
        &self,
        id: &str,
        input: &NewTransaction,
        today: NaiveDate,
    ) -> Result<Transaction> {
        let fields = input.validate(today)?;
        self.modify(|list: &mut Vec<Transaction>| {
            let tx = list
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))?;
            tx.apply(fields, Utc::now());
            Ok(tx.clone())
        })
    }

    pub fn delete_transaction(&self, id: &str) -> Result<()> {
        self.modify(|list: &mut Vec<Transaction>| {
            let before = list.len();
            list.retain(|t| t.id != id);
            if list.len() == before {
                return Err(Error::NotFound(format!("Transaction {}", id)));
            }
            Ok(())
        })?;
        info!(id, "Deleted transaction");
        Ok(())
    }

    /// Import raw records (current or legacy shape)
    ///
    /// Records that cannot be normalized, fail validation, or reuse an
    /// existing id are skipped.
    pub fn import_transactions(
        &self,
        records: Vec<serde_json::Value>,
        today: NaiveDate,
    ) -> Result<ImportStats> {
        let now = Utc::now();
        let stats = self.modify(|list: &mut Vec<Transaction>| {
            let mut stats = ImportStats::default();
            for record in records {
                let tx = match normalize::normalize_transaction(record, now) {
                    Ok(tx) => tx,
                    Err(reason) => {
                        debug!(%reason, "Skipping import record");
                        stats.skipped += 1;
                        continue;
                    }
                };
                if let Err(reason) = normalize::check_importable(&tx, today) {
                    debug!(id = %tx.id, %reason, "Skipping import record");
                    stats.skipped += 1;
                    continue;
                }
                if list.iter().any(|t| t.id == tx.id) {
                    stats.skipped += 1;
                    continue;
                }
                list.push(tx);
                stats.imported += 1;
            }
            Ok(stats)
        })?;
        info!(
            imported = stats.imported,
            skipped = stats.skipped,
            "Imported transactions"
        );
        Ok(stats)
    }

    // ========================================================================
    // Goals
    // ========================================================================

    pub fn list_goals(&self) -> Result<Vec<FinancialGoal>> {
        Ok(self.repository::<Vec<FinancialGoal>>().load()?.items)
    }

    pub fn add_goal(&self, input: &NewGoal) -> Result<FinancialGoal> {
        validate_goal(input)?;
        let goal = FinancialGoal {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            target_amount: input.target_amount,
            current_amount: input.current_amount,
            deadline: input.deadline,
            category: crate::models::non_blank(input.category.as_deref()),
            created_at: Utc::now(),
        };
        let created = goal.clone();
        self.modify(|list: &mut Vec<FinancialGoal>| {
            list.push(goal);
            Ok(())
        })?;
        Ok(created)
    }

    pub fn update_goal(&self, id: &str, input: &NewGoal) -> Result<FinancialGoal> {
        validate_goal(input)?;
        self.modify(|list: &mut Vec<FinancialGoal>| {
            let goal = list
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| Error::NotFound(format!("Goal {}", id)))?;
            goal.name = input.name.trim().to_string();
            goal.target_amount = input.target_amount;
            goal.current_amount = input.current_amount;
            goal.deadline = input.deadline;
            goal.category = crate::models::non_blank(input.category.as_deref());
            Ok(goal.clone())
        })
    }

    /// Add money to a goal's current amount
    pub fn contribute_to_goal(&self, id: &str, amount: f64) -> Result<FinancialGoal> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::Validation(
                "Contribution must be a positive number".into(),
            ));
        }
        self.modify(|list: &mut Vec<FinancialGoal>| {
            let goal = list
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| Error::NotFound(format!("Goal {}", id)))?;
            goal.current_amount += amount;
            Ok(goal.clone())
        })
    }

    pub fn delete_goal(&self, id: &str) -> Result<()> {
        self.modify(|list: &mut Vec<FinancialGoal>| {
            let before = list.len();
            list.retain(|g| g.id != id);
            if list.len() == before {
                return Err(Error::NotFound(format!("Goal {}", id)));
            }
            Ok(())
        })
    }

    // ========================================================================
    // Budgets
    // ========================================================================

    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        Ok(self.repository::<Vec<Budget>>().load()?.items)
    }

    pub fn add_budget(&self, input: &NewBudget) -> Result<Budget> {
        validate_budget(input)?;
        let budget = Budget {
            id: uuid::Uuid::new_v4().to_string(),
            category: input.category.trim().to_string(),
            allocated: input.allocated,
            spent: 0.0,
            period: input.period,
            created_at: Utc::now(),
        };
        let created = budget.clone();
        self.modify(|list: &mut Vec<Budget>| {
            if list
                .iter()
                .any(|b| b.category.eq_ignore_ascii_case(&budget.category) && b.period == budget.period)
            {
                return Err(Error::Validation(format!(
                    "A {} budget for {} already exists",
                    budget.period.as_str(),
                    budget.category
                )));
            }
            list.push(budget);
            Ok(())
        })?;
        Ok(created)
    }

    pub fn update_budget(&self, id: &str, input: &NewBudget) -> Result<Budget> {
        validate_budget(input)?;
        self.modify(|list: &mut Vec<Budget>| {
            let budget = list
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| Error::NotFound(format!("Budget {}", id)))?;
            budget.category = input.category.trim().to_string();
            budget.allocated = input.allocated;
            budget.period = input.period;
            Ok(budget.clone())
        })
    }

    pub fn delete_budget(&self, id: &str) -> Result<()> {
        self.modify(|list: &mut Vec<Budget>| {
            let before = list.len();
            list.retain(|b| b.id != id);
            if list.len() == before {
                return Err(Error::NotFound(format!("Budget {}", id)));
            }
            Ok(())
        })
    }

    // ========================================================================
    // Insights
    // ========================================================================

    pub fn list_insights(&self, include_dismissed: bool) -> Result<Vec<AIInsight>> {
        let mut insights = self.repository::<Vec<AIInsight>>().load()?.items;
        if !include_dismissed {
            insights.retain(|i| !i.dismissed);
        }
        Ok(insights)
    }

    /// Append insights returned by the AI service, assigning ids and timestamps
    pub fn add_insights(&self, insights: Vec<AIInsight>) -> Result<Vec<AIInsight>> {
        let now = Utc::now();
        let stamped: Vec<AIInsight> = insights
            .into_iter()
            .map(|mut insight| {
                if insight.id.is_empty() {
                    insight.id = uuid::Uuid::new_v4().to_string();
                }
                insight.created_at.get_or_insert(now);
                insight
            })
            .collect();
        let added = stamped.clone();
        self.modify(|list: &mut Vec<AIInsight>| {
            list.extend(stamped);
            Ok(())
        })?;
        Ok(added)
    }

    /// Toggle the dismissed flag in place
    pub fn set_insight_dismissed(&self, id: &str, dismissed: bool) -> Result<AIInsight> {
        self.modify(|list: &mut Vec<AIInsight>| {
            let insight = list
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| Error::NotFound(format!("Insight {}", id)))?;
            insight.dismissed = dismissed;
            Ok(insight.clone())
        })
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn get_settings(&self) -> Result<Settings> {
        Ok(self.repository::<Settings>().load()?.items)
    }

    pub fn update_settings(&self, settings: Settings) -> Result<Settings> {
        self.modify(|current: &mut Settings| {
            *current = settings;
            Ok(current.clone())
        })
    }
}

fn validate_goal(input: &NewGoal) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation("Goal name is required".into()));
    }
    if !input.target_amount.is_finite() || input.target_amount <= 0.0 {
        return Err(Error::Validation(
            "Goal target must be a positive number".into(),
        ));
    }
    if !input.current_amount.is_finite() || input.current_amount < 0.0 {
        return Err(Error::Validation(
            "Goal current amount cannot be negative".into(),
        ));
    }
    Ok(())
}

fn validate_budget(input: &NewBudget) -> Result<()> {
    if input.category.trim().is_empty() {
        return Err(Error::Validation("Budget category is required".into()));
    }
    if !input.allocated.is_finite() || input.allocated <= 0.0 {
        return Err(Error::Validation(
            "Budget amount must be a positive number".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn coffee() -> NewTransaction {
        NewTransaction {
            name: "Coffee".into(),
            amount: json!(-4.5),
            category: "Food & Dining".into(),
            date: "2026-03-10".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_store_loads_empty_collections() {
        let store = Store::in_memory();
        assert!(store.list_transactions().unwrap().is_empty());
        assert!(store.list_goals().unwrap().is_empty());
        assert_eq!(store.get_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_add_update_delete_transaction() {
        let store = Store::in_memory();
        let tx = store.add_transaction(&coffee(), today()).unwrap();
        assert_eq!(store.list_transactions().unwrap().len(), 1);

        let mut edit = coffee();
        edit.amount = json!(-6.0);
        let updated = store.update_transaction(&tx.id, &edit, today()).unwrap();
        assert_eq!(updated.amount, -6.0);
        assert_eq!(updated.created_at, tx.created_at);
        assert!(updated.updated_at >= tx.updated_at);

        store.delete_transaction(&tx.id).unwrap();
        assert!(store.list_transactions().unwrap().is_empty());
        assert!(matches!(
            store.delete_transaction(&tx.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_transaction_not_persisted() {
        let store = Store::in_memory();
        let mut bad = coffee();
        bad.date = "2026-04-01".into();
        assert!(matches!(
            store.add_transaction(&bad, today()),
            Err(Error::Validation(_))
        ));
        assert!(store.list_transactions().unwrap().is_empty());
    }

    #[test]
    fn test_stale_snapshot_conflicts() {
        let store = Store::in_memory();
        let repo = store.repository::<Vec<Transaction>>();
        let first = repo.load().unwrap();
        let second = repo.load().unwrap();

        repo.save(&first).unwrap();
        assert!(matches!(repo.save(&second), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_concurrent_adds_all_persist() {
        let store = Store::in_memory();
        let failures: Vec<Error> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let store = store.clone();
                    scope.spawn(move || store.add_transaction(&coffee(), today()))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap().err())
                .collect()
        });

        assert!(failures.is_empty(), "failed adds: {:?}", failures);
        assert_eq!(store.list_transactions().unwrap().len(), 16);
    }

    #[test]
    fn test_stored_records_without_ids_are_addressable() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("transactions.json"),
            r#"[
                {"name": "Coffee", "amount": -4, "category": "Food & Dining", "date": "2026-03-01"},
                {"name": "Lunch", "amount": -12, "category": "Food & Dining", "date": "2026-03-02"}
            ]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("insights.json"), r#"[{"title": "Old tip"}]"#).unwrap();
        let store = Store::open(dir.path()).unwrap();

        let ids = |txs: Vec<Transaction>| txs.into_iter().map(|t| t.id).collect::<Vec<_>>();
        let listed = store.list_transactions().unwrap();
        assert_eq!(ids(store.list_transactions().unwrap()), ids(listed.clone()));
        let coffee_id = listed[0].id.clone();
        assert_eq!(store.get_transaction(&coffee_id).unwrap().name, "Coffee");

        store.delete_transaction(&coffee_id).unwrap();
        let remaining = store.list_transactions().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, listed[1].id);

        let insight_id = store.list_insights(false).unwrap()[0].id.clone();
        store.set_insight_dismissed(&insight_id, true).unwrap();
        assert!(store.list_insights(false).unwrap().is_empty());
    }

    #[test]
    fn test_import_skips_invalid_and_duplicates() {
        let store = Store::in_memory();
        let records = vec![
            json!({"id": "a", "name": "Salary", "amount": 5000, "category": "Salary", "date": "2026-03-01"}),
            json!({"id": "a", "name": "Dup", "amount": 10, "category": "Other", "date": "2026-03-01"}),
            json!({"id": "b", "name": "Future", "amount": -10, "category": "Other", "date": "2027-01-01"}),
            json!({"id": "c", "name": "Broken", "amount": "n/a", "category": "Other", "date": "2026-03-01"}),
            json!({"id": "d", "description": "Legacy", "amount": "-12.50", "type": "income", "date": "2026-03-02T10:00:00Z"}),
        ];
        let stats = store.import_transactions(records, today()).unwrap();
        assert_eq!(stats, ImportStats { imported: 2, skipped: 3 });

        let legacy = store.get_transaction("d").unwrap();
        assert_eq!(legacy.name, "Legacy");
        assert_eq!(legacy.amount, -12.5);
        assert_eq!(legacy.category, "Other");
    }

    #[test]
    fn test_goal_lifecycle() {
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
        assert!(store.contribute_to_goal(&goal.id, -5.0).is_err());
        store.delete_goal(&goal.id).unwrap();
        assert!(store.list_goals().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_budget_rejected() {
        let store = Store::in_memory();
        let input = NewBudget {
            category: "Groceries".into(),
            allocated: 400.0,
            period: crate::models::BudgetPeriod::Monthly,
        };
        store.add_budget(&input).unwrap();
        assert!(matches!(
            store.add_budget(&input),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_insight_dismissal_in_place() {
        let store = Store::in_memory();
        let added = store
            .add_insights(vec![serde_json::from_value(json!({"title": "Hi"})).unwrap()])
            .unwrap();
        let id = added[0].id.clone();
        assert!(!id.is_empty());

        store.set_insight_dismissed(&id, true).unwrap();
        assert!(store.list_insights(false).unwrap().is_empty());
        let all = store.list_insights(true).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].dismissed);
    }
}
