mod schema;
mod store;
#[cfg(feature = "desktop")]
mod tauri_store;

use thiserror::Error;

use crate::ledger::RecordVariant;
use crate::session::Session;

pub use schema::{decode_session, encode_session, migrate, SchemaError, CURRENT_SCHEMA_VERSION};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
#[cfg(feature = "desktop")]
pub use tauri_store::TauriStore;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Reads and writes the one versioned session document kept under `key`.
pub struct SessionPersistence<S> {
    store: S,
    key: String,
    variant: RecordVariant,
}

impl<S: KeyValueStore> SessionPersistence<S> {
    pub fn new(store: S, key: impl Into<String>, variant: RecordVariant) -> Self {
        Self {
            store,
            key: key.into(),
            variant,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn save(&mut self, session: &Session) -> Result<(), PersistenceError> {
        self.store.set(&self.key, encode_session(session))?;
        Ok(())
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Session>, PersistenceError> {
        let Some(blob) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        if blob.is_null() {
            return Ok(None);
        }

        Ok(Some(decode_session(blob, self.variant)?))
    }

    pub fn load_or_default(&self) -> Session {
        match self.load() {
            Ok(Some(session)) => {
                tracing::info!(
                    storage_key = %self.key,
                    record_count = session.ledger.len(),
                    "Restored saved session"
                );
                session
            }
            Ok(None) => Session::new(self.variant),
            Err(error) => {
                tracing::warn!(
                    storage_key = %self.key,
                    persistence_error = %error,
                    "Saved session is unreadable, starting empty"
                );
                Session::new(self.variant)
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.store.delete(&self.key)?;
        Ok(())
    }
}
