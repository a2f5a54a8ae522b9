//! Batch I/O over opaque storage locations.
//!
//! The engine never interprets locations: they are opaque keys handed to the
//! external tabular engine, which owns physical formats and transport. The
//! [`TableStore`] trait is the capability the engine is injected with;
//! [`MemoryTableStore`] is the in-memory implementation used by tests and
//! local development.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::batch::RowBatch;
use crate::error::{Error, Result};

/// Capability to read and write row batches at opaque locations.
///
/// `copy` exists so callers can archive a current artifact under a new key
/// *before* overwriting it; implementations must make the copy visible
/// before `copy` returns.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Reads the batch stored at `location`.
    ///
    /// Returns `Error::ResourceNotFound` if nothing is stored there.
    async fn read_batch(&self, location: &str) -> Result<RowBatch>;

    /// Writes a batch at `location`, replacing any previous content.
    ///
    /// Returns the stored size in bytes as reported by the backing engine.
    async fn write_batch(&self, location: &str, batch: &RowBatch) -> Result<u64>;

    /// Returns true if something is stored at `location`.
    async fn exists(&self, location: &str) -> Result<bool>;

    /// Copies the content at `from` to `to`.
    ///
    /// Returns `Error::ResourceNotFound` if `from` is empty.
    async fn copy(&self, from: &str, to: &str) -> Result<()>;
}

/// Shared handles delegate to the underlying store.
#[async_trait]
impl<T: TableStore + ?Sized> TableStore for Arc<T> {
    async fn read_batch(&self, location: &str) -> Result<RowBatch> {
        self.as_ref().read_batch(location).await
    }

    async fn write_batch(&self, location: &str, batch: &RowBatch) -> Result<u64> {
        self.as_ref().write_batch(location, batch).await
    }

    async fn exists(&self, location: &str) -> Result<bool> {
        self.as_ref().exists(location).await
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        self.as_ref().copy(from, to).await
    }
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("lock poisoned")
}

/// In-memory table store for testing.
///
/// ## Limitations
///
/// - **NOT suitable for production**: No durability, no cross-process
///   coordination
/// - **Single-process only**: State is not shared across process boundaries
/// - **No persistence**: All state is lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    objects: RwLock<HashMap<String, RowBatch>>,
}

impl MemoryTableStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn object_count(&self) -> Result<usize> {
        let objects = self.objects.read().map_err(poison_err)?;
        Ok(objects.len())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn read_batch(&self, location: &str) -> Result<RowBatch> {
        let objects = self.objects.read().map_err(poison_err)?;
        objects
            .get(location)
            .cloned()
            .ok_or_else(|| Error::resource_not_found("table", location))
    }

    async fn write_batch(&self, location: &str, batch: &RowBatch) -> Result<u64> {
        let bytes = serde_json::to_vec(batch).map_err(|e| Error::Serialization {
            message: format!("failed to encode batch for '{location}': {e}"),
        })?;
        let mut objects = self.objects.write().map_err(poison_err)?;
        objects.insert(location.to_string(), batch.clone());
        Ok(bytes.len() as u64)
    }

    async fn exists(&self, location: &str) -> Result<bool> {
        let objects = self.objects.read().map_err(poison_err)?;
        Ok(objects.contains_key(location))
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let mut objects = self.objects.write().map_err(poison_err)?;
        let batch = objects
            .get(from)
            .cloned()
            .ok_or_else(|| Error::resource_not_found("table", from))?;
        objects.insert(to.to_string(), batch);
        Ok(())
    }
}
