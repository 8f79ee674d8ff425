//! Persistence of process rows keyed by company and process id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::StoreError;
use crate::process::ProcessRow;

/// Loads and saves process rows. Each save replaces the whole row.
pub trait ProcessStore {
    fn save(&self, row: &ProcessRow) -> Result<(), StoreError>;
    fn load(&self, company_id: i64, id: &str) -> Result<Option<ProcessRow>, StoreError>;
}

/// Store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<(i64, String), ProcessRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(i64, String), ProcessRow>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".into()))
    }
}

impl ProcessStore for MemoryStore {
    fn save(&self, row: &ProcessRow) -> Result<(), StoreError> {
        self.rows()?
            .insert((row.company_id, row.id.clone()), row.clone());
        Ok(())
    }

    fn load(&self, company_id: i64, id: &str) -> Result<Option<ProcessRow>, StoreError> {
        Ok(self.rows()?.get(&(company_id, id.to_string())).cloned())
    }
}

/// Store writing one JSON document per process under
/// `<root>/<company_id>/<id>.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, company_id: i64, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(StoreError::Corrupt(format!("invalid process id '{id}'")));
        }
        Ok(self
            .root
            .join(company_id.to_string())
            .join(format!("{id}.json")))
    }
}

impl ProcessStore for FileStore {
    fn save(&self, row: &ProcessRow) -> Result<(), StoreError> {
        let path = self.path_for(row.company_id, &row.id)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        // Replace atomically.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(row)?)?;
        std::fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "process row saved");
        Ok(())
    }

    fn load(&self, company_id: i64, id: &str) -> Result<Option<ProcessRow>, StoreError> {
        let path = self.path_for(company_id, id)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&contents)?))
    }
}
