use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Stored data in '{location}' is unreadable: {reason}")]
    Corrupt { location: String, reason: String },
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value storage holding JSON documents.
///
/// Every operation is fallible; callers decide whether a failure matters.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError>;
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: Value) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.to_string(), value);
        store
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys in one JSON object file, replaced atomically on every write.
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

    fn read_entries(&self) -> Result<Map<String, Value>, StorageError> {
        let raw_json = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str::<Value>(&raw_json) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(self.corrupt("top-level value is not an object")),
            Err(error) => Err(self.corrupt(&error.to_string())),
        }
    }

    fn read_entries_for_write(&self) -> Result<Map<String, Value>, StorageError> {
        match self.read_entries() {
            Err(StorageError::Corrupt { reason, .. }) => {
                tracing::warn!(
                    store_path = %self.path.display(),
                    corrupt_reason = %reason,
                    "Replacing unreadable store file"
                );
                Ok(Map::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent_directory) = self.path.parent() {
            if !parent_directory.as_os_str().is_empty() {
                std::fs::create_dir_all(parent_directory).map_err(|source| StorageError::Io {
                    path: parent_directory.to_path_buf(),
                    source,
                })?;
            }
        }

        let temp_path = temporary_store_path(&self.path);
        let serialized = serde_json::to_string_pretty(entries)
            .map_err(|error| self.corrupt(&format!("failed to serialize entries: {error}")))?;

        std::fs::write(&temp_path, serialized).map_err(|source| StorageError::Io {
            path: temp_path.clone(),
            source,
        })?;

        if let Err(source) = std::fs::rename(&temp_path, &self.path) {
            if let Err(cleanup_error) = std::fs::remove_file(&temp_path) {
                tracing::warn!(
                    temp_path = %temp_path.display(),
                    cleanup_error = %cleanup_error,
                    "Failed to remove temporary store file"
                );
            }
            return Err(StorageError::Io {
                path: self.path.clone(),
                source,
            });
        }

        Ok(())
    }

    fn corrupt(&self, reason: &str) -> StorageError {
        StorageError::Corrupt {
            location: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self.read_entries_for_write()?;
        entries.insert(key.to_string(), value);
        self.write_entries(&entries)
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut entries = self.read_entries_for_write()?;
        entries.remove(key);
        self.write_entries(&entries)
    }
}

fn temporary_store_path(store_path: &Path) -> PathBuf {
    let Some(file_name) = store_path.file_name().and_then(|value| value.to_str()) else {
        return store_path.with_extension("json.tmp");
    };

    store_path.with_file_name(format!("{file_name}.tmp"))
}
