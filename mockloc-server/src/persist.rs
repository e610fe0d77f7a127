//! Persisted-run snapshot store
//!
//! Only the minimal resumable state is kept: the route, the speed, and
//! the next target index. The file store writes a single JSON snapshot
//! under the platform data directory; read/write failures degrade the
//! resume-after-restart feature and nothing else.

use anyhow::{anyhow, Context, Result};
use mockloc_core::model::PersistedRun;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

const SNAPSHOT_FILE: &str = "run_state.json";

/// Get/set access to the persisted run snapshot.
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<Option<PersistedRun>>;
    fn save(&self, run: &PersistedRun) -> Result<()>;
    /// Overwrite only the target index of the existing snapshot.
    fn save_target_index(&self, index: usize) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Snapshot store backed by one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store under the user data directory (`<data_dir>/mockloc/`).
    pub fn new() -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("no data directory available"))?
            .join("mockloc");
        Ok(Self {
            path: dir.join(SNAPSHOT_FILE),
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedRun>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("failed to read run snapshot"),
        };
        let run = serde_json::from_str(&data).context("corrupt run snapshot")?;
        Ok(Some(run))
    }

    fn save(&self, run: &PersistedRun) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create snapshot directory")?;
        }
        let json = serde_json::to_string(run)?;
        fs::write(&self.path, json).context("failed to write run snapshot")?;
        Ok(())
    }

    fn save_target_index(&self, index: usize) -> Result<()> {
        let mut run = self
            .load()?
            .ok_or_else(|| anyhow!("no persisted run to update"))?;
        run.target_index = index;
        self.save(&run)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("failed to remove run snapshot"),
        }
    }
}

/// In-memory store for tests. Records every persisted target index so
/// tests can assert on progress ordering.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<PersistedRun>>,
    index_history: Mutex<Vec<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preloaded(run: PersistedRun) -> Self {
        Self {
            snapshot: Mutex::new(Some(run)),
            index_history: Mutex::new(Vec::new()),
        }
    }

    /// Target indices in the order they were persisted.
    pub fn index_history(&self) -> Vec<usize> {
        self.index_history.lock().unwrap().clone()
    }

    pub fn snapshot(&self) -> Option<PersistedRun> {
        self.snapshot.lock().unwrap().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedRun>> {
        Ok(self.snapshot.lock().unwrap().clone())
    }

    fn save(&self, run: &PersistedRun) -> Result<()> {
        *self.snapshot.lock().unwrap() = Some(run.clone());
        self.index_history.lock().unwrap().push(run.target_index);
        Ok(())
    }

    fn save_target_index(&self, index: usize) -> Result<()> {
        let mut snapshot = self.snapshot.lock().unwrap();
        let run = snapshot
            .as_mut()
            .ok_or_else(|| anyhow!("no persisted run to update"))?;
        run.target_index = index;
        self.index_history.lock().unwrap().push(index);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockloc_core::model::{Route, Waypoint};
    use mockloc_core::units::KilometersPerHour;

    fn sample_run() -> PersistedRun {
        PersistedRun {
            route: Route::new(vec![
                Waypoint::new(28.61, 77.20),
                Waypoint::new(28.46, 77.02),
            ]),
            speed_kmh: KilometersPerHour(36.0),
            target_index: 0,
        }
    }

    fn temp_store(name: &str) -> JsonFileStore {
        let path = std::env::temp_dir()
            .join("mockloc-tests")
            .join(format!("{}-{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        JsonFileStore::with_path(path)
    }

    #[test]
    fn test_file_store_roundtrip() {
        let store = temp_store("roundtrip");
        assert!(store.load().unwrap().is_none());

        store.save(&sample_run()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, sample_run());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_updates_target_index() {
        let store = temp_store("index");
        store.save(&sample_run()).unwrap();
        store.save_target_index(2).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.target_index, 2);
        assert_eq!(loaded.route, sample_run().route);
    }

    #[test]
    fn test_file_store_index_update_without_snapshot_fails() {
        let store = temp_store("no-snapshot");
        assert!(store.save_target_index(1).is_err());
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let store = temp_store("clear");
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_store_records_index_history() {
        let store = MemoryStore::new();
        store.save(&sample_run()).unwrap();
        store.save_target_index(1).unwrap();
        store.save_target_index(2).unwrap();
        assert_eq!(store.index_history(), vec![0, 1, 2]);
    }
}
