//! JSON file dismissal store.
//!
//! One file holds a map of storage key → record blob. Writes go through a
//! temp file and rename so a crash never leaves a half-written file; keys
//! other than the one being written are preserved.

use super::{DismissalRecord, DismissalStore};
use crate::error::{EngineError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type Blob = BTreeMap<String, serde_json::Value>;

pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        JsonFileStore {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_blob(&self) -> Result<Blob> {
        if !self.path.exists() {
            return Ok(Blob::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Blob::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_blob(&self, blob: &Blob) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(blob)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DismissalStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<DismissalRecord>> {
        let blob = self.read_blob()?;
        match blob.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, record: &DismissalRecord) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| EngineError::Storage("json store lock poisoned".to_string()))?;

        let mut blob = match self.read_blob() {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(
                    "Replacing unreadable dismissal file {}: {}",
                    self.path.display(),
                    e
                );
                Blob::new()
            }
        };
        blob.insert(key.to_string(), serde_json::to_value(record)?);
        self.write_blob(&blob)
    }
}
