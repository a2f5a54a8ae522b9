//! In-memory catalog implementation for testing.
//!
//! This module provides [`InMemoryCatalog`], a simple in-memory
//! implementation of the [`CatalogStore`] trait suitable for testing and
//! development.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No durability, no cross-process
//!   coordination
//! - **Single-process only**: State is not shared across process boundaries
//! - **No persistence**: All state is lost when the process exits

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use strata_core::{Environment, ExecutionId};

use crate::entry::{CatalogEntry, DatasetStatus, Layer};
use crate::error::{Error, Result};
use crate::store::CatalogStore;

/// Full key of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    environment: String,
    qualified_name: String,
    layer: Layer,
}

impl EntryKey {
    fn of(entry: &CatalogEntry) -> Self {
        Self {
            environment: entry.environment.as_str().to_string(),
            qualified_name: entry.qualified_name.clone(),
            layer: entry.layer,
        }
    }
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("lock poisoned")
}

/// In-memory catalog for testing.
///
/// The write lock serializes `upsert`/`set_status`, which satisfies the
/// single-writer-per-key contract within one process.
///
/// ## Example
///
/// ```rust
/// use strata_catalog::memory::InMemoryCatalog;
///
/// let catalog = InMemoryCatalog::new();
/// // Use catalog in tests...
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    entries: RwLock<HashMap<EntryKey, CatalogEntry>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn entry_count(&self) -> Result<usize> {
        let entries = self.entries.read().map_err(poison_err)?;
        Ok(entries.len())
    }

    /// Finds the entry for a name regardless of layer.
    ///
    /// Qualified names are expected to be unique across layers; if the same
    /// name somehow exists in several, the most refined layer wins.
    fn find_by_name(
        entries: &HashMap<EntryKey, CatalogEntry>,
        qualified_name: &str,
        environment: &Environment,
    ) -> Option<EntryKey> {
        entries
            .keys()
            .filter(|key| {
                key.qualified_name == qualified_name && key.environment == environment.as_str()
            })
            .max_by_key(|key| key.layer.rank())
            .cloned()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn upsert(&self, entry: CatalogEntry) -> Result<CatalogEntry> {
        let mut entries = self.entries.write().map_err(poison_err)?;
        let key = EntryKey::of(&entry);

        let stored = if let Some(existing) = entries.get_mut(&key) {
            tracing::debug!(
                dataset = %entry.qualified_name,
                layer = %entry.layer,
                "updating existing catalog entry"
            );
            existing.location = entry.location;
            existing.schema = entry.schema;
            existing.row_count = entry.row_count;
            existing.byte_size = entry.byte_size;
            existing.parent_tables = entry.parent_tables;
            existing.status = entry.status;
            existing.last_execution_id = entry.last_execution_id;
            existing.updated_at = Utc::now();
            existing.clone()
        } else {
            tracing::debug!(
                dataset = %entry.qualified_name,
                layer = %entry.layer,
                "creating new catalog entry"
            );
            entries.insert(key, entry.clone());
            entry
        };

        Ok(stored)
    }

    async fn set_status(
        &self,
        qualified_name: &str,
        environment: &Environment,
        status: DatasetStatus,
        execution_id: Option<ExecutionId>,
    ) -> Result<()> {
        let mut entries = self.entries.write().map_err(poison_err)?;

        let Some(key) = Self::find_by_name(&entries, qualified_name, environment) else {
            tracing::warn!(
                dataset = qualified_name,
                environment = %environment,
                target = %status,
                "status update for unknown dataset ignored"
            );
            return Ok(());
        };

        let entry = entries.get_mut(&key).ok_or_else(|| {
            Error::storage(format!("entry vanished during status update: {qualified_name}"))
        })?;
        entry.transition_to(status)?;
        if execution_id.is_some() {
            entry.last_execution_id = execution_id;
        }
        Ok(())
    }

    async fn resolve(
        &self,
        names: &[String],
        environment: &Environment,
    ) -> Result<BTreeMap<String, CatalogEntry>> {
        let entries = self.entries.read().map_err(poison_err)?;

        let mut found = BTreeMap::new();
        for name in names {
            if let Some(key) = Self::find_by_name(&entries, name, environment) {
                if let Some(entry) = entries.get(&key) {
                    found.insert(name.clone(), entry.clone());
                }
            }
        }
        Ok(found)
    }

    async fn get(
        &self,
        layer: Layer,
        qualified_name: &str,
        environment: &Environment,
    ) -> Result<Option<CatalogEntry>> {
        let entries = self.entries.read().map_err(poison_err)?;
        let key = EntryKey {
            environment: environment.as_str().to_string(),
            qualified_name: qualified_name.to_string(),
            layer,
        };
        Ok(entries.get(&key).cloned())
    }
}
