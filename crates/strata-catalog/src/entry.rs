//! Catalog entries and the dataset status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use strata_core::{Environment, ExecutionId, Schema};

use crate::error::{Error, Result};

/// Refinement stage of a dataset.
///
/// Raw data lands first, cleaning produces consumable tables, aggregation
/// produces analysis-ready marts. The rank ordering drives execution
/// ordering: producers of a layer run before consumers of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Ingested as-is from sources.
    Raw,
    /// Validated and conformed.
    Cleaned,
    /// Aggregated for consumption.
    Aggregated,
}

impl Layer {
    /// Returns the ordering rank (raw first, aggregated last).
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Raw => 0,
            Self::Cleaned => 1,
            Self::Aggregated => 2,
        }
    }

    /// Returns the lowercase name used in storage keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Cleaned => "cleaned",
            Self::Aggregated => "aggregated",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dataset status state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetStatus {
    /// Registered, waiting for its producing job to start.
    Pending,
    /// A job is actively writing this dataset.
    Running,
    /// Written and consumable by downstream jobs.
    Ready,
    /// The last producing job failed.
    Failed,
}

impl DatasetStatus {
    /// Returns true if downstream jobs may consume the dataset.
    #[must_use]
    pub const fn is_consumable(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the transition from self to target is valid.
    ///
    /// `READY -> RUNNING` is a rebuild, `FAILED -> RUNNING` is a retry, and
    /// `RUNNING -> RUNNING` lets a later run reclaim an entry a crashed
    /// pipeline left behind.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        match self {
            Self::Pending => matches!(target, Self::Running),
            Self::Running => matches!(target, Self::Running | Self::Ready | Self::Failed),
            Self::Ready | Self::Failed => matches!(target, Self::Running),
        }
    }
}

impl Default for DatasetStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for DatasetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Ready => write!(f, "READY"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// One dataset version's registration in the catalog.
///
/// Keyed by `(layer, qualified_name, environment)`; the store enforces
/// uniqueness of the triple. Lineage pointers in `parent_tables` reference
/// the entries that existed at write time — a parent rebuilt later does not
/// update them, so consumers must re-check parent `status` rather than trust
/// the pointer's freshness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Refinement layer.
    pub layer: Layer,
    /// Logical dataset identifier, unique within layer and environment.
    pub qualified_name: String,
    /// Deployment environment this entry belongs to.
    pub environment: Environment,
    /// Opaque storage locator; never interpreted by the engine.
    pub location: String,
    /// Ordered column schema of the stored version.
    pub schema: Schema,
    /// Number of rows in the stored version.
    pub row_count: u64,
    /// Stored size in bytes, as reported by the tabular engine.
    pub byte_size: u64,
    /// Qualified names of the datasets this version was derived from.
    pub parent_tables: BTreeSet<String>,
    /// Current state-machine status.
    pub status: DatasetStatus,
    /// Correlation ID of the run that last wrote this entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_execution_id: Option<ExecutionId>,
    /// When the entry was first registered.
    pub created_at: DateTime<Utc>,
    /// When the entry was last modified.
    pub updated_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Creates a new entry in `PENDING` status with empty lineage.
    #[must_use]
    pub fn new(
        layer: Layer,
        qualified_name: impl Into<String>,
        environment: Environment,
        location: impl Into<String>,
        schema: Schema,
    ) -> Self {
        let now = Utc::now();
        Self {
            layer,
            qualified_name: qualified_name.into(),
            environment,
            location: location.into(),
            schema,
            row_count: 0,
            byte_size: 0,
            parent_tables: BTreeSet::new(),
            status: DatasetStatus::Pending,
            last_execution_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the initial status (builder style).
    #[must_use]
    pub fn with_status(mut self, status: DatasetStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the lineage parents (builder style).
    #[must_use]
    pub fn with_parents(mut self, parents: impl IntoIterator<Item = String>) -> Self {
        self.parent_tables = parents.into_iter().collect();
        self
    }

    /// Sets the row count and byte size (builder style).
    #[must_use]
    pub const fn with_size(mut self, row_count: u64, byte_size: u64) -> Self {
        self.row_count = row_count;
        self.byte_size = byte_size;
        self
    }

    /// Transitions to a new status, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is invalid.
    #[tracing::instrument(
        skip(self),
        fields(dataset = %self.qualified_name, from = %self.status, to = %target)
    )]
    pub fn transition_to(&mut self, target: DatasetStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: self.status.to_string(),
                to: target.to_string(),
                reason: "invalid dataset status transition".into(),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}
