//! Storage layer for the prompt library
//!
//! The whole library is one JSON document (`{folders: [...], prompts: [...]}`)
//! read and written through the [`RecordStore`] trait. [`Storage`] owns the
//! on-disk layout: base directory, data file, config file and log directory.

use anyhow::{Context, Result};
use chrono::Utc;
use dirs::home_dir;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::Settings;
use crate::error::StorageError;
use crate::models::Snapshot;

/// A place the full record set can be loaded from and saved to.
///
/// Each `save` replaces the stored snapshot as a whole.
pub trait RecordStore: Send {
    fn load(&self) -> Result<Snapshot, StorageError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError>;
}

/// Directory layout for a prompt library
#[derive(Debug, Clone)]
pub struct Storage {
    base_dir: PathBuf,
}

impl Storage {
    /// Create a new Storage rooted at `~/.promptrepo`, or at
    /// `PROMPTREPO_BASE_DIR` when set.
    pub fn new() -> Result<Self> {
        let base_dir = if let Ok(custom_dir) = std::env::var("PROMPTREPO_BASE_DIR") {
            PathBuf::from(custom_dir)
        } else {
            home_dir()
                .context("Could not find home directory")?
                .join(".promptrepo")
        };

        Ok(Self { base_dir })
    }

    pub fn new_with_base(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the base directory and a default config file if missing
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create {:?}", self.base_dir))?;

        let config_path = self.config_path();
        if !config_path.exists() {
            Settings::default().write(&config_path)?;
        }

        Ok(())
    }

    /// Data file, overridable with `PROMPTREPO_DATA_FILE`
    pub fn data_path(&self) -> PathBuf {
        match std::env::var("PROMPTREPO_DATA_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => self.base_dir.join("library.json"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    pub fn file_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.data_path())
    }
}

/// Snapshot persisted as a single pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Result<Snapshot, StorageError> {
        if !self.path.exists() {
            debug!(path = ?self.path, "No library file yet, starting empty");
            return Ok(Snapshot::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let mut value: Value =
            serde_json::from_str(&content).map_err(|source| StorageError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        migrate_legacy(&mut value);

        serde_json::from_value(value).map_err(|source| StorageError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a temp file beside the target, then rename over it
    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(snapshot)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut file = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(
            path = ?self.path,
            folders = snapshot.folders.len(),
            prompts = snapshot.prompts.len(),
            "Library saved"
        );
        Ok(())
    }
}

/// In-process store, shareable between handles
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Snapshot,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.inner.lock() {
            state.snapshot = snapshot;
        }
        store
    }

    /// Make every following `save` fail with `StorageError::Unavailable`
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.fail_writes = fail;
        }
    }

    /// The last successfully saved snapshot
    pub fn stored(&self) -> Snapshot {
        self.inner
            .lock()
            .map(|state| state.snapshot.clone())
            .unwrap_or_default()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StorageError> {
        self.inner
            .lock()
            .map(|state| state.snapshot.clone())
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))?;
        if state.fail_writes {
            return Err(StorageError::Unavailable(
                "memory store is rejecting writes".to_string(),
            ));
        }
        state.snapshot = snapshot.clone();
        Ok(())
    }
}

/// Bring documents written by older clients up to the current shape.
///
/// Prompts missing `versions` get version 1 seeded from their name/text,
/// missing counters default to zero, and folders without `order` are
/// ranked by their position among siblings.
pub fn migrate_legacy(document: &mut Value) {
    let Some(root) = document.as_object_mut() else {
        return;
    };
    root.entry("folders").or_insert_with(|| json!([]));
    root.entry("prompts").or_insert_with(|| json!([]));

    let now = Utc::now().timestamp_millis();
    if let Some(prompts) = root.get_mut("prompts").and_then(Value::as_array_mut) {
        for prompt in prompts.iter_mut().filter_map(Value::as_object_mut) {
            let name = prompt.get("name").cloned().unwrap_or_else(|| json!(""));
            let text = prompt.get("text").cloned().unwrap_or_else(|| json!(""));

            let has_history = prompt
                .get("versions")
                .and_then(Value::as_array)
                .is_some_and(|v| !v.is_empty());
            if !has_history {
                prompt.insert(
                    "versions".to_string(),
                    json!([{ "version": 1, "name": name, "text": text, "timestamp": now }]),
                );
                prompt.insert("currentVersion".to_string(), json!(1));
            }

            if !prompt.contains_key("currentVersion") {
                let latest = prompt
                    .get("versions")
                    .and_then(Value::as_array)
                    .and_then(|versions| {
                        versions
                            .iter()
                            .filter_map(|v| v.get("version").and_then(Value::as_u64))
                            .max()
                    })
                    .unwrap_or(1);
                prompt.insert("currentVersion".to_string(), json!(latest));
            }

            prompt.entry("usageCount").or_insert_with(|| json!(0));
            if prompt.get("folderId") == Some(&json!("")) {
                prompt.insert("folderId".to_string(), Value::Null);
            }
        }
    }

    if let Some(folders) = root.get_mut("folders").and_then(Value::as_array_mut) {
        let mut seen_parents: Vec<Value> = Vec::new();
        for folder in folders.iter_mut().filter_map(Value::as_object_mut) {
            let parent = folder.get("parentId").cloned().unwrap_or(Value::Null);
            let rank = seen_parents.iter().filter(|p| **p == parent).count();
            seen_parents.push(parent);

            folder.entry("order").or_insert_with(|| json!(rank));
            folder.entry("expanded").or_insert_with(|| json!(true));
        }
    }
}
