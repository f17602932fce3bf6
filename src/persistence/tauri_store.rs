use std::sync::Arc;

use serde_json::Value;
use tauri::Runtime;
use tauri_plugin_store::Store;

use super::store::{KeyValueStore, StorageError};

/// Session storage backed by a `tauri-plugin-store` file in the app data directory.
pub struct TauriStore<R: Runtime> {
    store: Arc<Store<R>>,
}

impl<R: Runtime> TauriStore<R> {
    pub fn new(store: Arc<Store<R>>) -> Self {
        Self { store }
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.store
            .save()
            .map_err(|error| StorageError::Unavailable(format!("Failed to save store: {error}")))
    }
}

impl<R: Runtime> KeyValueStore for TauriStore<R> {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.store.get(key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.store.set(key, value);
        self.flush()
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.store.delete(key);
        self.flush()
    }
}
