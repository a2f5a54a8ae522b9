//! The catalog repository capability.
//!
//! Components never reach for a global catalog: they are handed a
//! [`CatalogStore`] implementation explicitly, which keeps every consumer
//! testable against [`crate::memory::InMemoryCatalog`] and lets production
//! deployments back the same trait with a relational metadata store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use strata_core::{Environment, ExecutionId};

use crate::entry::{CatalogEntry, DatasetStatus, Layer};
use crate::error::Result;

/// CRUD surface over catalog entries.
///
/// Implementations must treat `upsert` and `set_status` as
/// single-writer-per-key operations: two pipelines racing on the same
/// `(layer, qualified_name, environment)` triple must serialize, by lock or
/// by compare-and-swap on `updated_at`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts the entry, or updates all mutable fields of the existing
    /// entry with the same `(layer, qualified_name, environment)` triple.
    ///
    /// On update, `created_at` is preserved and `updated_at` is bumped.
    /// Entries with different qualified names are never merged.
    ///
    /// Returns the stored entry.
    async fn upsert(&self, entry: CatalogEntry) -> Result<CatalogEntry>;

    /// Applies a status transition to the entry with the given name.
    ///
    /// A missing entry is a logged-warning no-op, not an error: a job may
    /// set its output `RUNNING` before the output has ever been cataloged.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the entry exists but the
    /// transition violates the state machine.
    async fn set_status(
        &self,
        qualified_name: &str,
        environment: &Environment,
        status: DatasetStatus,
        execution_id: Option<ExecutionId>,
    ) -> Result<()>;

    /// Batch lookup by qualified name.
    ///
    /// Names with no entry are absent from the returned map; the caller is
    /// responsible for distinguishing "not found" from "found but not
    /// ready".
    async fn resolve(
        &self,
        names: &[String],
        environment: &Environment,
    ) -> Result<BTreeMap<String, CatalogEntry>>;

    /// Single-entry lookup by full key.
    async fn get(
        &self,
        layer: Layer,
        qualified_name: &str,
        environment: &Environment,
    ) -> Result<Option<CatalogEntry>>;
}

/// Shared handles delegate to the underlying store.
#[async_trait]
impl<C: CatalogStore + ?Sized> CatalogStore for Arc<C> {
    async fn upsert(&self, entry: CatalogEntry) -> Result<CatalogEntry> {
        self.as_ref().upsert(entry).await
    }

    async fn set_status(
        &self,
        qualified_name: &str,
        environment: &Environment,
        status: DatasetStatus,
        execution_id: Option<ExecutionId>,
    ) -> Result<()> {
        self.as_ref()
            .set_status(qualified_name, environment, status, execution_id)
            .await
    }

    async fn resolve(
        &self,
        names: &[String],
        environment: &Environment,
    ) -> Result<BTreeMap<String, CatalogEntry>> {
        self.as_ref().resolve(names, environment).await
    }

    async fn get(
        &self,
        layer: Layer,
        qualified_name: &str,
        environment: &Environment,
    ) -> Result<Option<CatalogEntry>> {
        self.as_ref().get(layer, qualified_name, environment).await
    }
}
