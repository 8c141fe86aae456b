//! In-memory storage backend

use std::collections::HashMap;
use std::sync::Mutex;

use super::{CollectionKey, StorageBackend, StoredBlob};
use crate::error::{Error, Result};

/// Keeps blobs in a map; nothing survives the process
#[derive(Default)]
pub struct MemoryBackend {
    blobs: Mutex<HashMap<CollectionKey, StoredBlob>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key with raw data at revision 0, as if written by an older version
    pub fn with_raw(self, key: CollectionKey, data: serde_json::Value) -> Self {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key, StoredBlob { revision: 0, data });
        }
        self
    }
}

impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, key: CollectionKey) -> Result<Option<StoredBlob>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::Storage("Memory store lock poisoned".into()))?;
        Ok(blobs.get(&key).cloned())
    }

    fn write(
        &self,
        key: CollectionKey,
        data: serde_json::Value,
        expected_revision: u64,
    ) -> Result<u64> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::Storage("Memory store lock poisoned".into()))?;
        let current = blobs.get(&key).map(|b| b.revision).unwrap_or(0);
        if current != expected_revision {
            return Err(Error::Conflict(format!(
                "{} changed since it was loaded (revision {} != {})",
                key, current, expected_revision
            )));
        }
        let revision = current + 1;
        blobs.insert(key, StoredBlob { revision, data });
        Ok(revision)
    }
}
