//! Async facade over the history store.
//!
//! `HistoryClient` is cheap to clone and safe to share between request
//! handlers. SQLite work runs on the blocking pool behind a mutex, so
//! concurrent `record` calls are applied one at a time.

use std::sync::Arc;

use agriwx_core::{HistoryConfig, StoreError};
use parking_lot::Mutex;

use crate::record::{LookupRecord, NewLookupRecord};
use crate::store::SqliteHistoryStore;

#[derive(Clone)]
pub enum HistoryClient {
    /// No persistence configured; writes succeed and store nothing.
    Disabled,

    /// Local SQLite storage.
    Sqlite(Arc<Mutex<SqliteHistoryStore>>),
}

impl HistoryClient {
    pub fn disabled() -> Self {
        Self::Disabled
    }

    pub fn sqlite(store: SqliteHistoryStore) -> Self {
        Self::Sqlite(Arc::new(Mutex::new(store)))
    }

    /// Open the configured database, or return a disabled client when none is set.
    pub fn from_config(config: &HistoryConfig) -> Result<Self, StoreError> {
        match config.database_path() {
            Some(path) => Ok(Self::sqlite(SqliteHistoryStore::open(
                &path,
                config.max_retained,
            )?)),
            None => {
                tracing::info!("No history database configured; lookups will not be retained");
                Ok(Self::Disabled)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Sqlite(_))
    }

    /// Store a lookup and apply the retention limit.
    pub async fn record(&self, entry: NewLookupRecord) -> Result<(), StoreError> {
        match self {
            Self::Disabled => Ok(()),
            Self::Sqlite(store) => {
                let store = store.clone();
                tokio::task::spawn_blocking(move || store.lock().record(&entry).map(|_| ()))
                    .await
                    .map_err(|e| StoreError::Join(e.to_string()))?
            }
        }
    }

    /// Retained lookups, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<LookupRecord>, StoreError> {
        match self {
            Self::Disabled => Ok(Vec::new()),
            Self::Sqlite(store) => {
                let store = store.clone();
                tokio::task::spawn_blocking(move || store.lock().recent(limit))
                    .await
                    .map_err(|e| StoreError::Join(e.to_string()))?
            }
        }
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        match self {
            Self::Disabled => Ok(0),
            Self::Sqlite(store) => {
                let store = store.clone();
                tokio::task::spawn_blocking(move || store.lock().count())
                    .await
                    .map_err(|e| StoreError::Join(e.to_string()))?
            }
        }
    }
}

impl std::fmt::Debug for HistoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.debug_tuple("HistoryClient::Disabled").finish(),
            Self::Sqlite(_) => f.debug_tuple("HistoryClient::Sqlite").finish(),
        }
    }
}
