//! # strata-quality
//!
//! Quality rule engine for the Strata lakehouse consistency engine.
//!
//! The engine is a pure evaluator: given a batch of rows and a rule set it
//! returns per-rule verdicts and an aggregate quarantine decision. It holds
//! no state, performs no I/O, and never consults the catalog — the same
//! rows and rules always produce the same report.
//!
//! ## Core Concepts
//!
//! - **Rule**: A declarative check against one column (`not_null`,
//!   `unique`, `range`, `pattern`, `one_of`)
//! - **Verdict**: Per-rule pass/warn/fail accounting with a bounded sample
//!   of failing rows
//! - **Quarantine**: The union of rows failed by *error*-severity rules;
//!   warning rules report but never quarantine
//!
//! ## Degradation, never abortion
//!
//! A misconfigured rule — unknown column, invalid regex, empty allowed
//! list, unsupported kind — degrades to a failed verdict for that rule
//! alone. The rest of the rule set still runs.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod engine;
pub mod report;
pub mod rule;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::QualityEngine;
    pub use crate::report::{QualityReport, RuleExecutionResult, RuleStatus};
    pub use crate::rule::{QualityRule, RuleKind, Severity};
}

pub use engine::QualityEngine;
pub use report::{QualityReport, RuleExecutionResult, RuleStatus};
pub use rule::{QualityRule, RuleKind, Severity};
