//! Rule verdicts and the aggregate quality report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use strata_core::RowBatch;

/// Outcome of evaluating one rule against a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    /// Every checked row satisfied the rule.
    Passed,
    /// Rows failed a warning-severity rule; nothing is quarantined.
    Warning,
    /// Rows failed an error-severity rule, or the rule itself could not
    /// be evaluated.
    Failed,
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Warning => write!(f, "WARNING"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Per-rule accounting.
///
/// `failed_row_sample` retains only the first few failing indices for
/// operator diagnostics; the full failing set feeds the aggregate
/// quarantine decision but is not carried per rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleExecutionResult {
    /// Stable rule identifier.
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    /// The column the rule checked.
    pub column: String,
    /// The verdict.
    pub status: RuleStatus,
    /// Rows the rule examined.
    pub records_checked: usize,
    /// Rows that satisfied the rule.
    pub records_passed: usize,
    /// Rows that violated the rule.
    pub records_failed: usize,
    /// Share of passing rows, rounded to two decimals.
    pub pass_percentage: f64,
    /// Bounded sample of failing row indices.
    pub failed_row_sample: Vec<usize>,
    /// Failure description, when there is something to describe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate outcome of evaluating a rule set against a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Per-rule verdicts, in rule order.
    pub rule_results: Vec<RuleExecutionResult>,
    /// Union of rows failed by error-severity rules.
    pub quarantined_rows: BTreeSet<usize>,
    /// Rows in the evaluated batch.
    pub total_records: usize,
    /// Rows surviving quarantine.
    pub passed_records: usize,
    /// Rows quarantined.
    pub failed_records: usize,
    /// Rules whose verdict was `PASSED`.
    pub rules_passed: usize,
    /// Rules whose verdict was `FAILED`.
    pub rules_failed: usize,
    /// Rules whose verdict was `WARNING`.
    pub rules_warned: usize,
    /// `passed_records / total_records * 100`, rounded to two decimals.
    /// An empty batch scores 100.
    pub quality_score: f64,
}

impl QualityReport {
    /// Returns true if nothing was quarantined and no rule failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.quarantined_rows.is_empty() && self.rules_failed == 0
    }

    /// Returns the batch with quarantined rows removed.
    ///
    /// Surviving rows keep their relative order.
    #[must_use]
    pub fn apply_quarantine(&self, batch: &RowBatch) -> RowBatch {
        if self.quarantined_rows.is_empty() {
            return batch.clone();
        }
        batch.without_rows(&self.quarantined_rows)
    }
}
