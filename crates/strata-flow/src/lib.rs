//! # strata-flow
//!
//! Pipeline consistency engine for the Strata lakehouse.
//!
//! This crate keeps a multi-layer lakehouse consistent while many
//! independently-scheduled transform jobs write into it:
//!
//! - **Dependency Resolution**: Execution order inferred from declared
//!   inputs and outputs — dependencies are matched by output-name equality,
//!   no explicit edge list exists
//! - **Readiness Gating**: A job never runs against inputs that are
//!   missing, still being written, or failed
//! - **Quality Enforcement**: Rows are validated and quarantined before
//!   they become visible to downstream jobs
//! - **Incremental Merging**: New batches fold into versioned datasets
//!   without losing history or violating key uniqueness
//!
//! ## Core Concepts
//!
//! - **Job**: A declared transform — inputs it reads, the output it
//!   produces, and the strategy for folding new rows in
//! - **Order**: The resolver's execution sequence; on a dependency cycle it
//!   degrades to the declared order instead of failing the run
//! - **Coordinator**: Composes resolver, gate, quality engine, and merge
//!   engine per job, isolating each job's failures from the rest
//!
//! ## Guarantees
//!
//! - Jobs run after the jobs that produce their inputs
//! - A job consuming a failed or half-written input fails with a
//!   diagnosable error, not silently
//! - Failures are local: one broken job never stops independent jobs

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod coordinator;
pub mod error;
pub mod gate;
pub mod job;
pub mod merge;
pub mod paths;
pub mod resolver;
pub mod runner;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::coordinator::{
        JobResult, JobStatus, PipelineCoordinator, PipelineReport, PipelineStatus, RuleSource,
        RunOptions, StaticRuleSource, WaitOutcome,
    };
    pub use crate::error::{Error, Result};
    pub use crate::gate::{NotReadyInput, ReadinessGate, ReadinessReport};
    pub use crate::job::JobSpec;
    pub use crate::merge::{MergeEngine, MergeOptions, MergePlan, MergeStrategy};
    pub use crate::paths::DatasetPaths;
    pub use crate::resolver::{resolve_order, ExecutionOrder};
    pub use crate::runner::{JobRunner, ResolvedInput, StaticRunner};
}

pub use coordinator::{PipelineCoordinator, PipelineReport, RunOptions};
pub use error::{Error, Result};
pub use gate::{ReadinessGate, ReadinessReport};
pub use job::JobSpec;
pub use merge::{MergeEngine, MergeStrategy};
pub use resolver::{resolve_order, ExecutionOrder};
