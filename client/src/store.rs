//! Durable client-side state
//!
//! A small string key/value store behind the [`StateStore`] trait. The file
//! backed implementation keeps the whole map in memory and rewrites the file
//! on every change; the store holds a handful of small values (selected farm
//! id, cached weather snapshots), so that is cheap enough.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Key under which the selected farm id is remembered
pub const SELECTED_FARM_KEY: &str = "selected-farm";

/// String key/value store for durable client state
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// State store persisted as a JSON object in a single file
pub struct JsonFileStore {
    path: PathBuf,
    cells: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store, loading existing state if the file is present
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let cells = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AppError::Storage(format!("corrupt state file: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AppError::Storage(e.to_string())),
        };
        Ok(Self {
            path,
            cells: Mutex::new(cells),
        })
    }

    fn flush(&self, cells: &HashMap<String, String>) -> AppResult<()> {
        let raw = serde_json::to_string_pretty(cells)?;
        std::fs::write(&self.path, raw).map_err(|e| AppError::Storage(e.to_string()))
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.cells
            .lock()
            .map_err(|_| AppError::Storage("state store lock poisoned".into()))
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> AppResult<()> {
        let mut cells = self.lock()?;
        cells.insert(key.to_string(), value.to_string());
        self.flush(&cells)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut cells = self.lock()?;
        if cells.remove(key).is_some() {
            self.flush(&cells)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    cells: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.cells
            .lock()
            .map_err(|_| AppError::Storage("state store lock poisoned".into()))
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
