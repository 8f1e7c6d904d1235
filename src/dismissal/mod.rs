//! Dismissed-suggestion tracking
//!
//! Remembers which save-as-template suggestions the user declined so they
//! are not shown again, and counts dismissals so the host can offer an
//! opt-out after repeated ones. The record lives in a host-supplied
//! `DismissalStore` under a fixed key.
//!
//! Backends:
//! - `MemoryStore` — volatile, for tests and embedding
//! - `JsonFileStore` — keyed JSON blob file in the data directory
//! - `SqliteStore` — key/value table in a SQLite database

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{Config, StorageKind};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Fixed storage key of the dismissal record
pub const STORAGE_KEY: &str = "dismissed_save_suggestions";

/// Persisted dismissal state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissalRecord {
    #[serde(default)]
    pub dismissed_hashes: BTreeSet<String>,
    #[serde(default)]
    pub dismissal_count: u32,
}

/// Durable keyed storage for dismissal records
pub trait DismissalStore: Send + Sync {
    /// Record stored under `key`, `None` if never written
    fn get(&self, key: &str) -> Result<Option<DismissalRecord>>;

    /// Replace the record stored under `key`
    fn set(&self, key: &str, record: &DismissalRecord) -> Result<()>;
}

/// Open the backend selected in the config, rooted at its data directory
pub fn open_store(config: &Config) -> Result<Arc<dyn DismissalStore>> {
    let data_dir = config.data_dir();
    let store: Arc<dyn DismissalStore> = match config.dismissal.storage {
        StorageKind::Sqlite => {
            let store = SqliteStore::open(data_dir.join("replog.db"))?;
            tracing::debug!("Dismissals stored in {:?}", store.path());
            Arc::new(store)
        }
        StorageKind::Json => {
            let store = JsonFileStore::new(data_dir.join("dismissals.json"));
            tracing::debug!("Dismissals stored in {}", store.path().display());
            Arc::new(store)
        }
        StorageKind::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Dismissal bookkeeping over a `DismissalStore`.
///
/// Store failures are logged and treated as an empty record: a broken store
/// must never block the logging action a suggestion decorates.
pub struct DismissalTracker {
    store: Arc<dyn DismissalStore>,
    opt_out_threshold: u32,
}

impl DismissalTracker {
    pub fn new(store: Arc<dyn DismissalStore>, opt_out_threshold: u32) -> Self {
        DismissalTracker {
            store,
            opt_out_threshold,
        }
    }

    /// Tracker over the store configured in `config`
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(open_store(config)?, config.dismissal.opt_out_threshold))
    }

    fn load(&self) -> DismissalRecord {
        match self.store.get(STORAGE_KEY) {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read dismissal record: {}", e);
                DismissalRecord::default()
            }
        }
    }

    pub fn is_dismissed(&self, hash: &str) -> bool {
        self.load().dismissed_hashes.contains(hash)
    }

    /// Record a dismissal. Returns true if the hash was new; re-dismissing a
    /// known hash changes nothing.
    pub fn dismiss(&self, hash: &str) -> bool {
        let mut record = self.load();
        if !record.dismissed_hashes.insert(hash.to_string()) {
            return false;
        }
        record.dismissal_count = record.dismissal_count.saturating_add(1);

        match self.store.set(STORAGE_KEY, &record) {
            Ok(()) => {
                tracing::debug!(
                    "Dismissed suggestion {} ({} total)",
                    hash,
                    record.dismissal_count
                );
                true
            }
            Err(e) => {
                tracing::warn!("Failed to persist dismissal of {}: {}", hash, e);
                false
            }
        }
    }

    pub fn dismissal_count(&self) -> u32 {
        self.load().dismissal_count
    }

    /// True once the user has dismissed `opt_out_threshold` suggestions
    pub fn should_show_opt_out_link(&self) -> bool {
        self.dismissal_count() >= self.opt_out_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn tracker() -> DismissalTracker {
        DismissalTracker::new(Arc::new(MemoryStore::new()), 3)
    }

    #[test]
    fn test_unknown_hash_not_dismissed() {
        let t = tracker();
        assert!(!t.is_dismissed("abc"));
        assert_eq!(t.dismissal_count(), 0);
    }

    #[test]
    fn test_dismiss_marks_and_counts() {
        let t = tracker();
        assert!(t.dismiss("abc"));
        assert!(t.is_dismissed("abc"));
        assert!(!t.is_dismissed("def"));
        assert_eq!(t.dismissal_count(), 1);
    }

    #[test]
    fn test_repeat_dismiss_counts_once() {
        let t = tracker();
        assert!(t.dismiss("abc"));
        assert!(!t.dismiss("abc"));
        assert_eq!(t.dismissal_count(), 1);
    }

    #[test]
    fn test_opt_out_link_flips_at_third_dismissal() {
        let t = tracker();
        t.dismiss("a");
        t.dismiss("b");
        assert!(!t.should_show_opt_out_link());
        t.dismiss("c");
        assert!(t.should_show_opt_out_link());
        t.dismiss("d");
        assert!(t.should_show_opt_out_link());
        assert_eq!(t.dismissal_count(), 4);
    }

    #[test]
    fn test_dismiss_order_does_not_matter() {
        let a = tracker();
        let b = tracker();
        for h in ["x", "y", "z"] {
            a.dismiss(h);
        }
        for h in ["z", "x", "y"] {
            b.dismiss(h);
        }
        assert_eq!(a.load(), b.load());
    }

    struct BrokenStore;

    impl DismissalStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<DismissalRecord>> {
            Err(EngineError::Storage("unavailable".to_string()))
        }

        fn set(&self, _key: &str, _record: &DismissalRecord) -> Result<()> {
            Err(EngineError::Storage("unavailable".to_string()))
        }
    }

    #[test]
    fn test_broken_store_degrades_quietly() {
        let t = DismissalTracker::new(Arc::new(BrokenStore), 3);
        assert!(!t.is_dismissed("abc"));
        assert!(!t.dismiss("abc"));
        assert_eq!(t.dismissal_count(), 0);
        assert!(!t.should_show_opt_out_link());
    }

    /// Reads succeed, writes fail
    struct ReadOnlyStore(MemoryStore);

    impl DismissalStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<DismissalRecord>> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _record: &DismissalRecord) -> Result<()> {
            Err(EngineError::Storage("read-only".to_string()))
        }
    }

    #[test]
    fn test_failed_write_is_distinct_from_already_dismissed() {
        let inner = MemoryStore::new();
        let existing = DismissalRecord {
            dismissed_hashes: ["old".to_string()].into_iter().collect(),
            dismissal_count: 1,
        };
        inner.set(STORAGE_KEY, &existing).unwrap();
        let t = DismissalTracker::new(Arc::new(ReadOnlyStore(inner)), 3);

        // Known hash: already dismissed, nothing to write
        assert!(t.is_dismissed("old"));
        assert!(!t.dismiss("old"));

        // New hash: the write fails and the hash stays undismissed
        assert!(!t.is_dismissed("new"));
        assert!(!t.dismiss("new"));
        assert!(!t.is_dismissed("new"));
        assert_eq!(t.dismissal_count(), 1);
    }

    #[test]
    fn test_open_json_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        config.dismissal.storage = StorageKind::Json;

        let t = DismissalTracker::open(&config).unwrap();
        assert!(t.dismiss("a"));
        assert!(dir.path().join("dismissals.json").exists());
    }

    #[test]
    fn test_open_memory_store_from_config() {
        let mut config = Config::default();
        config.dismissal.storage = StorageKind::Memory;
        config.dismissal.opt_out_threshold = 1;
        let t = DismissalTracker::open(&config).unwrap();
        t.dismiss("a");
        assert!(t.should_show_opt_out_link());
    }
}
