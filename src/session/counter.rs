//! Durable named counters.
//!
//! [`KeyValueStore`] is the string-valued persistence backend (the
//! equivalent of a browser's local storage), and [`PersistentCounter`] keeps
//! one non-negative integer in it. Storage failures never propagate out of
//! the counter: unreadable values load as 0 and failed writes are logged.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::error::StorageError;

/// Synchronous string key-value storage scoped to one installation.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` if absent.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrites the value for `key`.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key` entirely.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// Stores all keys in a single JSON object on disk.
///
/// Writes go through a temporary file and a rename so a crash never leaves
/// a half-written file behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "storage.json";

    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store in `dir` using the default file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => {
                let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)?;
                Ok(raw.into_iter().map(|(k, v)| (k, value_text(v))).collect())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read_map_for_update(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_map() {
            Err(StorageError::Corrupt(e)) => {
                warn!("Replacing corrupt storage file {}: {}", self.path.display(), e);
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }
}

/// Non-string entries (a hand-edited `150` or `true`) keep their JSON text.
fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map_for_update()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_map_for_update()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, String>,
    writes: usize,
}

/// In-memory store for tests.
///
/// Clones share the same map, so a test can inspect what a session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .state
            .lock()
            .unwrap()
            .values
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Returns the raw stored value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().values.get(key).cloned()
    }

    /// Returns how many saves and removes were made.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.values.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.values.remove(key);
        state.writes += 1;
        Ok(())
    }
}

// ============================================================================
// PersistentCounter
// ============================================================================

/// One named, durable, non-negative integer.
pub struct PersistentCounter {
    name: String,
    store: Box<dyn KeyValueStore>,
}

impl PersistentCounter {
    /// Creates a counter stored under `name`.
    pub fn new(name: impl Into<String>, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    /// Returns the storage key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stored value, or 0 if absent or unparseable.
    pub fn load(&self) -> u64 {
        match self.store.load(&self.name) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(counter = %self.name, "Ignoring unparseable value {:?}", raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(counter = %self.name, "Could not read counter: {}", e);
                0
            }
        }
    }

    /// Overwrites the stored value.
    pub fn save(&mut self, value: u64) {
        match self.store.save(&self.name, &value.to_string()) {
            Ok(()) => debug!(counter = %self.name, value, "Counter saved"),
            Err(e) => warn!(counter = %self.name, "Could not save counter: {}", e),
        }
    }

    /// Removes the stored value.
    pub fn clear(&mut self) {
        match self.store.remove(&self.name) {
            Ok(()) => debug!(counter = %self.name, "Counter cleared"),
            Err(e) => warn!(counter = %self.name, "Could not clear counter: {}", e),
        }
    }
}

impl std::fmt::Debug for PersistentCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCounter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod json_file_store_tests {
        use super::*;

        #[test]
        fn test_load_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileStore::in_dir(dir.path());
            assert_eq!(store.load("anything").unwrap(), None);
        }

        #[test]
        fn test_save_load_remove() {
            let dir = tempfile::tempdir().unwrap();
            let mut store = JsonFileStore::in_dir(&dir.path().join("nested"));

            store.save("totalWalkSeconds", "150").unwrap();
            store.save("theme", "dark").unwrap();
            assert_eq!(
                store.load("totalWalkSeconds").unwrap(),
                Some("150".to_string())
            );

            store.remove("totalWalkSeconds").unwrap();
            assert_eq!(store.load("totalWalkSeconds").unwrap(), None);
            assert_eq!(store.load("theme").unwrap(), Some("dark".to_string()));
        }

        #[test]
        fn test_survives_new_instance() {
            let dir = tempfile::tempdir().unwrap();
            JsonFileStore::in_dir(dir.path()).save("k", "v").unwrap();

            let reopened = JsonFileStore::in_dir(dir.path());
            assert_eq!(reopened.load("k").unwrap(), Some("v".to_string()));
        }

        #[test]
        fn test_corrupt_file_reports_error_then_recovers_on_save() {
            let dir = tempfile::tempdir().unwrap();
            let mut store = JsonFileStore::in_dir(dir.path());
            std::fs::write(store.path(), "][").unwrap();

            assert!(matches!(store.load("k"), Err(StorageError::Corrupt(_))));

            store.save("k", "1").unwrap();
            assert_eq!(store.load("k").unwrap(), Some("1".to_string()));
        }

        #[test]
        fn test_non_string_values_are_kept() {
            let dir = tempfile::tempdir().unwrap();
            let mut store = JsonFileStore::in_dir(dir.path());
            std::fs::write(store.path(), r#"{"totalWalkSeconds":150,"theme":"dark"}"#).unwrap();

            assert_eq!(
                store.load("totalWalkSeconds").unwrap(),
                Some("150".to_string())
            );

            store.save("totalWalkSeconds", "160").unwrap();
            assert_eq!(store.load("theme").unwrap(), Some("dark".to_string()));
            assert_eq!(
                store.load("totalWalkSeconds").unwrap(),
                Some("160".to_string())
            );
        }
    }

    mod persistent_counter_tests {
        use super::*;

        #[test]
        fn test_load_absent_is_zero() {
            let counter = PersistentCounter::new("total", Box::new(MemoryStore::new()));
            assert_eq!(counter.load(), 0);
        }

        #[test]
        fn test_load_unparseable_is_zero() {
            let store = MemoryStore::with_entry("total", "twelve");
            let counter = PersistentCounter::new("total", Box::new(store));
            assert_eq!(counter.load(), 0);
        }

        #[test]
        fn test_load_numeric_prefix_is_zero() {
            let store = MemoryStore::with_entry("total", "150abc");
            let counter = PersistentCounter::new("total", Box::new(store));
            assert_eq!(counter.load(), 0);
        }

        #[test]
        fn test_numeric_entry_loads_and_other_keys_survive_save() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileStore::in_dir(dir.path());
            std::fs::write(store.path(), r#"{"totalWalkSeconds":150,"theme":"dark"}"#).unwrap();

            let mut counter = PersistentCounter::new("totalWalkSeconds", Box::new(store.clone()));
            assert_eq!(counter.load(), 150);

            counter.save(160);
            assert_eq!(store.load("theme").unwrap(), Some("dark".to_string()));
            assert_eq!(counter.load(), 160);
        }

        #[test]
        fn test_load_corrupt_file_is_zero() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileStore::in_dir(dir.path());
            std::fs::write(store.path(), "nope").unwrap();

            let counter = PersistentCounter::new("total", Box::new(store));
            assert_eq!(counter.load(), 0);
        }

        #[test]
        fn test_save_and_clear() {
            let store = MemoryStore::new();
            let mut counter = PersistentCounter::new("total", Box::new(store.clone()));

            counter.save(120);
            assert_eq!(store.get("total"), Some("120".to_string()));
            assert_eq!(counter.load(), 120);

            counter.clear();
            assert_eq!(store.get("total"), None);
            assert_eq!(counter.load(), 0);
            assert_eq!(store.writes(), 2);
        }
    }
}
