//! The transform-compute seam.
//!
//! The engine never computes transforms itself — filtering, joining, and
//! SQL execution belong to the external tabular engine. [`JobRunner`] is
//! the capability the coordinator is injected with; [`StaticRunner`]
//! returns canned batches for tests.

use std::collections::HashMap;

use async_trait::async_trait;

use strata_catalog::CatalogEntry;
use strata_core::RowBatch;

use crate::error::{Error, Result};
use crate::job::JobSpec;

/// One resolved, readable job input.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// The input's qualified name.
    pub name: String,
    /// Its catalog entry at resolution time.
    pub entry: CatalogEntry,
    /// Its rows, read from the entry's location.
    pub rows: RowBatch,
}

/// Executes a job's transform against its resolved inputs.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Produces the job's incoming rows.
    ///
    /// # Errors
    ///
    /// Implementations report failures as `Error::Transform`; the
    /// coordinator records them against the job and moves on.
    async fn execute(&self, job: &JobSpec, inputs: &[ResolvedInput]) -> Result<RowBatch>;
}

/// Test runner returning a preconfigured batch per output name.
#[derive(Debug, Default)]
pub struct StaticRunner {
    outputs: HashMap<String, RowBatch>,
}

impl StaticRunner {
    /// Creates a runner with no outputs configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the batch to return for a job output (builder style).
    #[must_use]
    pub fn with_output(mut self, output_name: impl Into<String>, batch: RowBatch) -> Self {
        self.outputs.insert(output_name.into(), batch);
        self
    }
}

#[async_trait]
impl JobRunner for StaticRunner {
    async fn execute(&self, job: &JobSpec, _inputs: &[ResolvedInput]) -> Result<RowBatch> {
        self.outputs
            .get(&job.output_name)
            .cloned()
            .ok_or_else(|| Error::transform(format!("no output configured for '{}'", job.output_name)))
    }
}
