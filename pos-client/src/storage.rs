//! ClientStorage - persisted client preferences
//!
//! A small JSON key-value file (`client_state.json` in the data directory).
//! The only key the engine writes is [`ACTIVE_BRANCH_KEY`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// File name inside the data directory
pub const STORAGE_FILE: &str = "client_state.json";

/// Last selected branch id
pub const ACTIVE_BRANCH_KEY: &str = "active_branch_id";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store backed by a JSON file, or memory only
#[derive(Debug, Default)]
pub struct ClientStorage {
    /// None for an in-memory store
    file_path: Option<PathBuf>,
    data: HashMap<String, String>,
}

impl ClientStorage {
    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `{data_dir}/client_state.json`, starting empty when the file
    /// does not exist yet
    pub fn load(data_dir: &Path) -> Result<Self, StorageError> {
        let file_path = data_dir.join(STORAGE_FILE);

        let data = if file_path.exists() {
            let content = std::fs::read_to_string(&file_path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            file_path: Some(file_path),
            data,
        })
    }

    /// Like [`load`](Self::load), but an unreadable or corrupt file yields an
    /// empty store. The path is kept, so the next write replaces the file.
    pub fn load_or_empty(data_dir: &Path) -> Self {
        match Self::load(data_dir) {
            Ok(storage) => storage,
            Err(e) => {
                let file_path = data_dir.join(STORAGE_FILE);
                warn!(path = %file_path.display(), error = %e, "Client storage unreadable, starting empty");
                Self {
                    file_path: Some(file_path),
                    data: HashMap::new(),
                }
            }
        }
    }

    /// Write to disk (no-op for in-memory stores)
    pub fn save(&self) -> Result<(), StorageError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Set a value and persist
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), value.into());
        self.save()
    }

    /// Remove a value and persist
    pub fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.data.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}
