//! Folding incoming batches into versioned datasets.
//!
//! The merge engine is pure row math: given the incoming batch (already
//! quarantined), the prior snapshot, and the strategy, it produces the
//! output rows, a fresh version identifier, and an archive instruction.
//! Reading the prior snapshot and writing the output are the caller's job,
//! with one hard ordering rule: when the plan says `archive_prior`, the
//! current artifact must be copied to its archive key **before** the
//! overwrite, so a crash mid-write never loses the prior version.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use strata_core::{RowBatch, VersionId};

use crate::error::{Error, Result};

/// Name of the synthetic row-identity column appended to every write.
pub const SURROGATE_KEY_COLUMN: &str = "_sk";

/// How new rows fold into the existing dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Every run produces a new, uniquely named version; prior data is
    /// never touched.
    Versioned,
    /// Every run overwrites a fixed "current" artifact, archiving the
    /// previous one first.
    Replace,
    /// Key-based upsert against the current artifact; incoming rows win
    /// on key collision.
    Merge,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Versioned => write!(f, "versioned"),
            Self::Replace => write!(f, "replace"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

/// Behavior knobs for the merge engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// When true, a `merge` without primary keys is an error instead of
    /// degrading to concatenation.
    pub strict_merge_keys: bool,
}

/// The computed outcome of one merge.
#[derive(Debug, Clone)]
pub struct MergePlan {
    /// Output rows, surrogate-keyed and ready to write.
    pub rows: RowBatch,
    /// Fresh identifier for the written version.
    pub version: VersionId,
    /// True when the caller must archive the current artifact before
    /// overwriting it.
    pub archive_prior: bool,
}

/// Computes merge plans.
///
/// Stateless; safe to share and to run concurrently against different
/// datasets.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    options: MergeOptions,
}

impl MergeEngine {
    /// Creates an engine with default (lenient) options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given options.
    #[must_use]
    pub const fn with_options(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Computes the output rows for one write.
    ///
    /// `prior` is only consulted by the `merge` strategy; `versioned` and
    /// `replace` pass the incoming rows through. Every output row receives
    /// a monotonically increasing surrogate key: starting at 1 for
    /// `versioned`/`replace`, continuing from the prior snapshot's row
    /// count for `merge`.
    ///
    /// # Errors
    ///
    /// - `Error::MergeConflict` if `merge` has no primary keys and strict
    ///   mode is enabled
    /// - `Error::Core` if a key column is missing or the prior and
    ///   incoming schemas are incompatible
    #[tracing::instrument(skip_all, fields(output, strategy = %strategy, incoming = incoming.len()))]
    pub fn apply(
        &self,
        strategy: MergeStrategy,
        incoming: &RowBatch,
        prior: Option<&RowBatch>,
        primary_keys: &[String],
        output: &str,
    ) -> Result<MergePlan> {
        let version = VersionId::generate();

        match strategy {
            MergeStrategy::Versioned => Ok(MergePlan {
                rows: incoming.with_surrogate_keys(SURROGATE_KEY_COLUMN, 1),
                version,
                archive_prior: false,
            }),
            MergeStrategy::Replace => Ok(MergePlan {
                rows: incoming.with_surrogate_keys(SURROGATE_KEY_COLUMN, 1),
                version,
                archive_prior: true,
            }),
            MergeStrategy::Merge => {
                let combined = self.upsert(incoming, prior, primary_keys, output)?;
                #[allow(clippy::cast_possible_wrap)]
                let start = prior.map_or(0, RowBatch::len) as i64 + 1;
                Ok(MergePlan {
                    rows: combined.with_surrogate_keys(SURROGATE_KEY_COLUMN, start),
                    version,
                    archive_prior: false,
                })
            }
        }
    }

    /// Key-based upsert: prior rows whose key tuple collides with an
    /// incoming row are dropped, then the incoming batch is appended.
    fn upsert(
        &self,
        incoming: &RowBatch,
        prior: Option<&RowBatch>,
        primary_keys: &[String],
        output: &str,
    ) -> Result<RowBatch> {
        // The prior snapshot carries the surrogate keys of its own write;
        // they are re-assigned below, so strip them before aligning schemas.
        let prior = prior.map(|p| p.without_column(SURROGATE_KEY_COLUMN));

        if primary_keys.is_empty() {
            if self.options.strict_merge_keys {
                return Err(Error::MergeConflict {
                    output: output.to_string(),
                });
            }
            tracing::warn!(
                output,
                "merge without primary keys degrades to concatenation"
            );
            return match prior {
                Some(mut combined) if !combined.is_empty() => {
                    combined.extend_from(incoming).map_err(Error::Core)?;
                    Ok(combined)
                }
                _ => Ok(incoming.clone()),
            };
        }

        let Some(prior) = prior else {
            return Ok(incoming.clone());
        };

        let mut incoming_keys: HashSet<String> = HashSet::with_capacity(incoming.len());
        for row in 0..incoming.len() {
            incoming_keys.insert(incoming.key_string(row, primary_keys).map_err(Error::Core)?);
        }

        let mut collided: BTreeSet<usize> = BTreeSet::new();
        for row in 0..prior.len() {
            let key = prior.key_string(row, primary_keys).map_err(Error::Core)?;
            if incoming_keys.contains(&key) {
                collided.insert(row);
            }
        }

        let mut combined = prior.without_rows(&collided);
        combined.extend_from(incoming).map_err(Error::Core)?;
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Field, ScalarValue, Schema, SemanticType};

    fn kv_schema() -> Schema {
        Schema::new(vec![
            Field::new("k", SemanticType::Integer),
            Field::new("v", SemanticType::String),
        ])
    }

    fn kv(rows: &[(i64, &str)]) -> RowBatch {
        RowBatch::from_rows(
            kv_schema(),
            rows.iter()
                .map(|(k, v)| vec![ScalarValue::Int64(*k), ScalarValue::from(*v)])
                .collect(),
        )
        .unwrap()
    }

    fn keys() -> Vec<String> {
        vec!["k".to_string()]
    }

    #[test]
    fn versioned_passes_rows_through_with_fresh_keys() {
        let engine = MergeEngine::new();
        let incoming = kv(&[(1, "a"), (2, "b")]);

        let first = engine
            .apply(MergeStrategy::Versioned, &incoming, None, &[], "out")
            .unwrap();
        let second = engine
            .apply(MergeStrategy::Versioned, &incoming, None, &[], "out")
            .unwrap();

        // Re-running identical input mints a distinct version every time.
        assert_ne!(first.version, second.version);
        assert!(!first.archive_prior);
        assert_eq!(first.rows.len(), 2);
        assert_eq!(
            first.rows.value_at(0, SURROGATE_KEY_COLUMN),
            Some(&ScalarValue::Int64(1))
        );
    }

    #[test]
    fn replace_instructs_archive_before_overwrite() {
        let engine = MergeEngine::new();
        let plan = engine
            .apply(MergeStrategy::Replace, &kv(&[(1, "a")]), None, &[], "out")
            .unwrap();
        assert!(plan.archive_prior);
        assert_eq!(
            plan.rows.value_at(0, SURROGATE_KEY_COLUMN),
            Some(&ScalarValue::Int64(1))
        );
    }

    #[test]
    fn merge_upserts_on_key_collision() {
        let engine = MergeEngine::new();
        let prior = kv(&[(1, "a"), (2, "b")]).with_surrogate_keys(SURROGATE_KEY_COLUMN, 1);
        let incoming = kv(&[(2, "B"), (3, "c")]);

        let plan = engine
            .apply(MergeStrategy::Merge, &incoming, Some(&prior), &keys(), "out")
            .unwrap();

        // Exactly three rows: key 2 updated, never duplicated.
        assert_eq!(plan.rows.len(), 3);
        let pairs: Vec<(i64, String)> = (0..plan.rows.len())
            .map(|row| {
                let k = match plan.rows.value_at(row, "k").unwrap() {
                    ScalarValue::Int64(k) => *k,
                    other => panic!("unexpected key {other:?}"),
                };
                let v = plan.rows.value_at(row, "v").unwrap().to_string();
                (k, v)
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                (1, "a".to_string()),
                (2, "B".to_string()),
                (3, "c".to_string())
            ]
        );
    }

    #[test]
    fn merge_surrogate_keys_continue_from_prior_count() {
        let engine = MergeEngine::new();
        let prior = kv(&[(1, "a"), (2, "b")]).with_surrogate_keys(SURROGATE_KEY_COLUMN, 1);
        let incoming = kv(&[(3, "c")]);

        let plan = engine
            .apply(MergeStrategy::Merge, &incoming, Some(&prior), &keys(), "out")
            .unwrap();

        assert_eq!(
            plan.rows.value_at(0, SURROGATE_KEY_COLUMN),
            Some(&ScalarValue::Int64(3))
        );
        assert_eq!(
            plan.rows.value_at(2, SURROGATE_KEY_COLUMN),
            Some(&ScalarValue::Int64(5))
        );
    }

    #[test]
    fn merge_without_keys_degrades_to_concatenation() {
        let engine = MergeEngine::new();
        let prior = kv(&[(1, "a")]).with_surrogate_keys(SURROGATE_KEY_COLUMN, 1);
        let incoming = kv(&[(1, "A")]);

        let plan = engine
            .apply(MergeStrategy::Merge, &incoming, Some(&prior), &[], "out")
            .unwrap();

        // No keys: nothing collides, rows simply append.
        assert_eq!(plan.rows.len(), 2);
    }

    #[test]
    fn strict_mode_rejects_keyless_merge() {
        let engine = MergeEngine::with_options(MergeOptions {
            strict_merge_keys: true,
        });
        let result = engine.apply(MergeStrategy::Merge, &kv(&[(1, "a")]), None, &[], "out");
        assert!(matches!(result, Err(Error::MergeConflict { .. })));
    }

    #[test]
    fn merge_with_no_prior_is_the_incoming_batch() {
        let engine = MergeEngine::new();
        let incoming = kv(&[(1, "a"), (2, "b")]);
        let plan = engine
            .apply(MergeStrategy::Merge, &incoming, None, &keys(), "out")
            .unwrap();

        assert_eq!(plan.rows.len(), 2);
        // No prior snapshot: the sequence starts at 1.
        assert_eq!(
            plan.rows.value_at(0, SURROGATE_KEY_COLUMN),
            Some(&ScalarValue::Int64(1))
        );
    }

    #[test]
    fn merge_missing_key_column_errors() {
        let engine = MergeEngine::new();
        let incoming = kv(&[(1, "a")]);
        let bad_keys = vec!["nope".to_string()];
        let prior = kv(&[(2, "b")]);

        let result = engine.apply(
            MergeStrategy::Merge,
            &incoming,
            Some(&prior),
            &bad_keys,
            "out",
        );
        assert!(result.is_err());
    }
}
