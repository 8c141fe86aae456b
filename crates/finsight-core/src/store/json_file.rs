//! File-backed storage: one JSON document per collection

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use super::{CollectionKey, StorageBackend, StoredBlob};
use crate::error::{Error, Result};

/// Stores each collection in `<dir>/<key>.json` as `{"revision": n, "data": ...}`
///
/// Files written by older versions contain the bare collection (usually a
/// list); those are read as revision 0 and upgraded on the next write.
pub struct JsonFileBackend {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: CollectionKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    fn read_path(&self, key: CollectionKey, path: &Path) -> Result<Option<StoredBlob>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            Error::Storage(format!("{} is not valid JSON: {}", path.display(), e))
        })?;
        Ok(Some(decode_blob(key, value)?))
    }
}

/// Split a stored document into revision and data
fn decode_blob(key: CollectionKey, value: serde_json::Value) -> Result<StoredBlob> {
    match value {
        serde_json::Value::Object(mut map)
            if map.contains_key("revision") && map.contains_key("data") =>
        {
            let revision = map
                .get("revision")
                .and_then(|r| r.as_u64())
                .ok_or_else(|| Error::Storage(format!("Invalid revision in {} blob", key)))?;
            let data = map.remove("data").unwrap_or(serde_json::Value::Null);
            Ok(StoredBlob { revision, data })
        }
        legacy => Ok(StoredBlob {
            revision: 0,
            data: legacy,
        }),
    }
}

impl StorageBackend for JsonFileBackend {
    fn name(&self) -> &str {
        "json-file"
    }

    fn read(&self, key: CollectionKey) -> Result<Option<StoredBlob>> {
        self.read_path(key, &self.path_for(key))
    }

    fn write(
        &self,
        key: CollectionKey,
        data: serde_json::Value,
        expected_revision: u64,
    ) -> Result<u64> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Storage("Write lock poisoned".into()))?;

        let path = self.path_for(key);
        let current = self
            .read_path(key, &path)?
            .map(|blob| blob.revision)
            .unwrap_or(0);
        if current != expected_revision {
            return Err(Error::Conflict(format!(
                "{} changed since it was loaded (revision {} != {})",
                key, current, expected_revision
            )));
        }

        let revision = current + 1;
        let blob = StoredBlob { revision, data };
        let bytes = serde_json::to_vec_pretty(&blob)?;

        // Write to a sibling temp file and rename so readers never see a partial file
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %path.display(), revision, "Wrote collection file");
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path()).unwrap();
        assert!(backend.read(CollectionKey::Goals).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path()).unwrap();

        let rev = backend
            .write(CollectionKey::Budgets, json!([{"a": 1}]), 0)
            .unwrap();
        assert_eq!(rev, 1);

        let blob = backend.read(CollectionKey::Budgets).unwrap().unwrap();
        assert_eq!(blob.revision, 1);
        assert_eq!(blob.data, json!([{"a": 1}]));
        assert!(dir.path().join("budgets.json").exists());
    }

    #[test]
    fn test_stale_revision_is_conflict() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path()).unwrap();
        backend.write(CollectionKey::Goals, json!([]), 0).unwrap();
        assert!(matches!(
            backend.write(CollectionKey::Goals, json!([]), 0),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_legacy_bare_list_is_revision_zero() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("transactions.json"), r#"[{"id": 1}]"#).unwrap();
        let backend = JsonFileBackend::new(dir.path()).unwrap();

        let blob = backend.read(CollectionKey::Transactions).unwrap().unwrap();
        assert_eq!(blob.revision, 0);
        assert_eq!(blob.data, json!([{"id": 1}]));

        assert_eq!(
            backend
                .write(CollectionKey::Transactions, json!([]), 0)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("insights.json"), "{not json").unwrap();
        let backend = JsonFileBackend::new(dir.path()).unwrap();
        assert!(matches!(
            backend.read(CollectionKey::Insights),
            Err(Error::Storage(_))
        ));
    }
}
