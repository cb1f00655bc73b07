//! Persistence of the seen ledger.
//!
//! Stores exchange full snapshots: the ledger is loaded once at the start
//! of a run and saved once after every emitted post has been marked.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info};

use captionbrief_core::SeenLedger;

use crate::error::{RunnerError, RunnerResult};

/// File name of the ledger inside the data directory.
pub const LEDGER_FILE_NAME: &str = "seen_posts.json";

/// Where the seen ledger lives between runs.
pub trait LedgerStore: Send + Sync {
    /// Loads the ledger. A store that has never been saved yields an empty
    /// ledger.
    fn load(&self) -> RunnerResult<SeenLedger>;

    /// Replaces the stored ledger with `ledger`.
    fn save(&self, ledger: &SeenLedger) -> RunnerResult<()>;
}

/// Writes `value` as pretty JSON next to `path`, then renames it in place.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> RunnerResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(value)?;
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Ledger stored as a JSON object of `shortcode: true` entries.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location inside the data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(LEDGER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> RunnerResult<SeenLedger> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no ledger yet");
            return Ok(SeenLedger::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SeenLedger::new());
        }
        let ledger: SeenLedger = serde_json::from_str(&content).map_err(|e| {
            RunnerError::config(format!(
                "failed to parse ledger {}: {e}",
                self.path.display()
            ))
        })?;
        info!(path = %self.path.display(), count = ledger.len(), "loaded ledger");
        Ok(ledger)
    }

    fn save(&self, ledger: &SeenLedger) -> RunnerResult<()> {
        write_json_atomic(&self.path, ledger)?;
        info!(path = %self.path.display(), count = ledger.len(), "saved ledger");
        Ok(())
    }
}

/// Ledger kept in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledger: Mutex<SeenLedger>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: SeenLedger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> RunnerResult<SeenLedger> {
        self.ledger
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| RunnerError::config("ledger lock poisoned"))
    }

    fn save(&self, ledger: &SeenLedger) -> RunnerResult<()> {
        let mut guard = self
            .ledger
            .lock()
            .map_err(|_| RunnerError::config("ledger lock poisoned"))?;
        *guard = ledger.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    mod json_store {
        use super::*;

        #[test]
        fn missing_file_is_empty() {
            let dir = tempdir().unwrap();
            let store = JsonLedgerStore::in_dir(dir.path());
            assert!(store.load().unwrap().is_empty());
        }

        #[test]
        fn save_then_load() {
            let dir = tempdir().unwrap();
            let store = JsonLedgerStore::in_dir(&dir.path().join("data"));
            let mut ledger = SeenLedger::new();
            ledger.mark_seen("ABC");
            ledger.mark_seen("XYZ");
            store.save(&ledger).unwrap();

            let loaded = store.load().unwrap();
            assert_eq!(loaded.len(), 2);
            assert!(!loaded.is_new("ABC"));
            assert!(!store.path().with_extension("json.tmp").exists());
        }

        #[test]
        fn on_disk_format() {
            let dir = tempdir().unwrap();
            let store = JsonLedgerStore::in_dir(dir.path());
            let mut ledger = SeenLedger::new();
            ledger.mark_seen("ABC");
            store.save(&ledger).unwrap();

            let raw: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
            assert_eq!(raw, serde_json::json!({"ABC": true}));
        }

        #[test]
        fn reads_existing_file() {
            let dir = tempdir().unwrap();
            let path = dir.path().join(LEDGER_FILE_NAME);
            fs::write(&path, r#"{"OLD": true, "SKIPPED": false}"#).unwrap();
            let ledger = JsonLedgerStore::new(&path).load().unwrap();
            assert!(!ledger.is_new("OLD"));
            assert!(ledger.is_new("SKIPPED"));
        }

        #[test]
        fn corrupt_file() {
            let dir = tempdir().unwrap();
            let path = dir.path().join(LEDGER_FILE_NAME);
            fs::write(&path, "[1, 2").unwrap();
            let result = JsonLedgerStore::new(&path).load();
            assert!(matches!(result, Err(RunnerError::Config { .. })));
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryLedgerStore::new();
        let mut ledger = store.load().unwrap();
        assert!(ledger.mark_seen("A"));
        store.save(&ledger).unwrap();
        assert!(!store.load().unwrap().is_new("A"));
    }
}
