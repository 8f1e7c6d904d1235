//! In-memory dismissal store.
//!
//! Volatile: everything is lost when the store is dropped.

use super::{DismissalRecord, DismissalStore};
use crate::error::{EngineError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, DismissalRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DismissalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<DismissalRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| EngineError::Storage("memory store lock poisoned".to_string()))?;
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, record: &DismissalRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| EngineError::Storage("memory store lock poisoned".to_string()))?;
        records.insert(key.to_string(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());

        let mut record = DismissalRecord::default();
        record.dismissed_hashes.insert("h".to_string());
        record.dismissal_count = 1;
        store.set("k", &record).unwrap();

        assert_eq!(store.get("k").unwrap(), Some(record));
        assert!(store.get("other").unwrap().is_none());
    }
}
