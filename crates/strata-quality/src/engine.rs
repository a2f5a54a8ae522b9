//! The pure rule evaluator.

use std::collections::{BTreeSet, HashMap};

use regex::Regex;

use strata_core::RowBatch;

use crate::report::{QualityReport, RuleExecutionResult, RuleStatus};
use crate::rule::{QualityRule, RuleKind, Severity};

/// Default bound on per-rule failing-row samples.
const DEFAULT_SAMPLE_LIMIT: usize = 10;

/// Evaluates quality rules against row batches.
///
/// The engine is stateless and performs no I/O; it is safe to share across
/// threads and to run concurrently against different datasets.
#[derive(Debug, Clone)]
pub struct QualityEngine {
    sample_limit: usize,
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self {
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

/// Outcome of evaluating a single rule: the failing row indices, or a
/// rule-level breakage (unknown column, bad configuration) that yields a
/// failed verdict without touching any rows.
enum RuleEval {
    Rows(Vec<usize>),
    Broken(String),
}

impl QualityEngine {
    /// Creates an engine with the default sample limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the bound on per-rule failing-row samples.
    #[must_use]
    pub const fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Evaluates all active rules against the batch.
    ///
    /// Misconfigured rules degrade to failed verdicts; the rest of the set
    /// still runs. Rows failed by error-severity rules form the quarantine
    /// union; warning-severity failures are reported but quarantine
    /// nothing.
    #[must_use]
    #[tracing::instrument(skip_all, fields(rows = batch.len(), rules = rules.len()))]
    pub fn evaluate(&self, batch: &RowBatch, rules: &[QualityRule]) -> QualityReport {
        let total = batch.len();
        let mut rule_results = Vec::new();
        let mut quarantined: BTreeSet<usize> = BTreeSet::new();
        let mut rules_passed = 0;
        let mut rules_failed = 0;
        let mut rules_warned = 0;

        for rule in rules {
            if !rule.active {
                tracing::debug!(rule = %rule.name, "skipping inactive rule");
                continue;
            }

            let result = match self.evaluate_rule(batch, rule) {
                RuleEval::Broken(message) => {
                    tracing::warn!(rule = %rule.name, message, "rule could not be evaluated");
                    self.broken_result(rule, message)
                }
                RuleEval::Rows(failed) => {
                    let status = if failed.is_empty() {
                        RuleStatus::Passed
                    } else if rule.severity == Severity::Warning {
                        RuleStatus::Warning
                    } else {
                        RuleStatus::Failed
                    };
                    if status == RuleStatus::Failed {
                        quarantined.extend(failed.iter().copied());
                    }
                    self.row_result(rule, total, &failed, status)
                }
            };

            match result.status {
                RuleStatus::Passed => rules_passed += 1,
                RuleStatus::Warning => rules_warned += 1,
                RuleStatus::Failed => rules_failed += 1,
            }
            rule_results.push(result);
        }

        let failed_records = quarantined.len();
        let passed_records = total - failed_records;
        if failed_records > 0 {
            tracing::warn!(
                quarantined = failed_records,
                total,
                "rows quarantined by quality rules"
            );
        }

        QualityReport {
            rule_results,
            quarantined_rows: quarantined,
            total_records: total,
            passed_records,
            failed_records,
            rules_passed,
            rules_failed,
            rules_warned,
            quality_score: percentage(passed_records, total),
        }
    }

    fn evaluate_rule(&self, batch: &RowBatch, rule: &QualityRule) -> RuleEval {
        if !batch.schema().contains(&rule.column) {
            return RuleEval::Broken(format!("column '{}' not found in dataset", rule.column));
        }

        match &rule.kind {
            RuleKind::NotNull => RuleEval::Rows(
                column_cells(batch, &rule.column)
                    .filter(|(_, value)| value.is_null())
                    .map(|(idx, _)| idx)
                    .collect(),
            ),
            RuleKind::Unique => {
                let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
                for (idx, value) in column_cells(batch, &rule.column) {
                    groups.entry(value.canonical_repr()).or_default().push(idx);
                }
                let mut failed: Vec<usize> = groups
                    .into_values()
                    .filter(|group| group.len() > 1)
                    .flatten()
                    .collect();
                failed.sort_unstable();
                RuleEval::Rows(failed)
            }
            RuleKind::Range { min, max } => RuleEval::Rows(
                column_cells(batch, &rule.column)
                    .filter(|(_, value)| {
                        value.as_f64().is_none_or(|x| {
                            min.is_some_and(|lo| x < lo) || max.is_some_and(|hi| x > hi)
                        })
                    })
                    .map(|(idx, _)| idx)
                    .collect(),
            ),
            RuleKind::Pattern { pattern } => {
                let re = match Regex::new(pattern) {
                    Ok(re) => re,
                    Err(e) => return RuleEval::Broken(format!("invalid pattern: {e}")),
                };
                RuleEval::Rows(
                    column_cells(batch, &rule.column)
                        .filter(|(_, value)| value.as_str().is_none_or(|s| !re.is_match(s)))
                        .map(|(idx, _)| idx)
                        .collect(),
                )
            }
            RuleKind::OneOf { allowed_values } => {
                if allowed_values.is_empty() {
                    return RuleEval::Broken("no allowed values specified".to_string());
                }
                RuleEval::Rows(
                    column_cells(batch, &rule.column)
                        .filter(|(_, value)| !allowed_values.contains(value))
                        .map(|(idx, _)| idx)
                        .collect(),
                )
            }
            RuleKind::Custom { .. } => {
                RuleEval::Broken("custom rules are not supported".to_string())
            }
        }
    }

    fn row_result(
        &self,
        rule: &QualityRule,
        total: usize,
        failed: &[usize],
        status: RuleStatus,
    ) -> RuleExecutionResult {
        let records_failed = failed.len();
        let records_passed = total - records_failed;
        RuleExecutionResult {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            column: rule.column.clone(),
            status,
            records_checked: total,
            records_passed,
            records_failed,
            pass_percentage: percentage(records_passed, total),
            failed_row_sample: failed.iter().copied().take(self.sample_limit).collect(),
            message: (records_failed > 0)
                .then(|| format!("{records_failed} rows violated '{}'", rule.name)),
        }
    }

    fn broken_result(&self, rule: &QualityRule, message: String) -> RuleExecutionResult {
        RuleExecutionResult {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            column: rule.column.clone(),
            status: RuleStatus::Failed,
            records_checked: 0,
            records_passed: 0,
            records_failed: 0,
            pass_percentage: 0.0,
            failed_row_sample: Vec::new(),
            message: Some(message),
        }
    }
}

/// Iterates `(row index, cell)` pairs for one column.
///
/// The column is known to exist; rows always carry full arity.
fn column_cells<'a>(
    batch: &'a RowBatch,
    column: &str,
) -> impl Iterator<Item = (usize, &'a strata_core::ScalarValue)> {
    let col = batch
        .schema()
        .index_of(column)
        .unwrap_or(usize::MAX);
    batch
        .rows()
        .iter()
        .enumerate()
        .filter_map(move |(idx, row)| row.get(col).map(|value| (idx, value)))
}

/// Share of `part` in `whole` as a percentage, rounded to two decimals.
/// A whole of zero counts as fully passing.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 100.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Field, ScalarValue, Schema, SemanticType};

    fn people() -> RowBatch {
        let schema = Schema::new(vec![
            Field::new("id", SemanticType::Integer),
            Field::new("age", SemanticType::Integer),
        ]);
        RowBatch::from_rows(
            schema,
            vec![
                vec![ScalarValue::Int64(1), ScalarValue::Int64(-5)],
                vec![ScalarValue::Int64(2), ScalarValue::Int64(30)],
                vec![ScalarValue::Int64(3), ScalarValue::Int64(30)],
            ],
        )
        .unwrap()
    }

    fn age_range(severity: Severity) -> QualityRule {
        QualityRule::new(
            "r-range",
            "age in range",
            "age",
            RuleKind::Range {
                min: Some(0.0),
                max: Some(120.0),
            },
        )
        .with_severity(severity)
    }

    fn unique_id() -> QualityRule {
        QualityRule::new("r-unique", "id unique", "id", RuleKind::Unique)
    }

    #[test]
    fn quarantine_is_the_union_of_error_failures() {
        let report = QualityEngine::new().evaluate(
            &people(),
            &[age_range(Severity::Error), unique_id()],
        );

        // Only the negative age fails: ids are unique, other ages valid.
        assert_eq!(
            report.quarantined_rows,
            [0].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(report.passed_records, 2);
        assert_eq!(report.failed_records, 1);
        assert!((report.quality_score - 66.67).abs() < f64::EPSILON);
        assert_eq!(report.rules_failed, 1);
        assert_eq!(report.rules_passed, 1);
    }

    #[test]
    fn warning_severity_reports_but_never_quarantines() {
        let report =
            QualityEngine::new().evaluate(&people(), &[age_range(Severity::Warning)]);

        assert!(report.quarantined_rows.is_empty());
        assert!((report.quality_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(report.rules_warned, 1);

        let verdict = &report.rule_results[0];
        assert_eq!(verdict.status, RuleStatus::Warning);
        assert_eq!(verdict.records_failed, 1);
        assert_eq!(verdict.failed_row_sample, vec![0]);
    }

    #[test]
    fn unique_fails_every_member_of_a_duplicate_group() {
        let schema = Schema::new(vec![Field::new("code", SemanticType::String)]);
        let batch = RowBatch::from_rows(
            schema,
            vec![
                vec![ScalarValue::from("a")],
                vec![ScalarValue::from("b")],
                vec![ScalarValue::from("a")],
                vec![ScalarValue::from("a")],
            ],
        )
        .unwrap();

        let report = QualityEngine::new().evaluate(
            &batch,
            &[QualityRule::new("r", "code unique", "code", RuleKind::Unique)],
        );

        assert_eq!(
            report.quarantined_rows,
            [0, 2, 3].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(report.rule_results[0].records_failed, 3);
    }

    #[test]
    fn not_null_flags_null_cells() {
        let schema = Schema::new(vec![Field::new("email", SemanticType::String)]);
        let batch = RowBatch::from_rows(
            schema,
            vec![
                vec![ScalarValue::from("a@x.io")],
                vec![ScalarValue::Null],
            ],
        )
        .unwrap();

        let report = QualityEngine::new().evaluate(
            &batch,
            &[QualityRule::new("r", "email present", "email", RuleKind::NotNull)],
        );
        assert_eq!(
            report.quarantined_rows,
            [1].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn range_with_one_bound_is_half_open() {
        let schema = Schema::new(vec![Field::new("n", SemanticType::Integer)]);
        let batch = RowBatch::from_rows(
            schema,
            vec![
                vec![ScalarValue::Int64(-1)],
                vec![ScalarValue::Int64(1_000_000)],
            ],
        )
        .unwrap();

        let report = QualityEngine::new().evaluate(
            &batch,
            &[QualityRule::new(
                "r",
                "non-negative",
                "n",
                RuleKind::Range {
                    min: Some(0.0),
                    max: None,
                },
            )],
        );
        assert_eq!(
            report.quarantined_rows,
            [0].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn range_fails_nulls_and_non_numeric_values() {
        let schema = Schema::new(vec![Field::new("n", SemanticType::Integer)]);
        let batch = RowBatch::from_rows(
            schema,
            vec![
                vec![ScalarValue::Null],
                vec![ScalarValue::from("not a number")],
                vec![ScalarValue::Int64(5)],
            ],
        )
        .unwrap();

        let report = QualityEngine::new().evaluate(
            &batch,
            &[QualityRule::new(
                "r",
                "in range",
                "n",
                RuleKind::Range {
                    min: Some(0.0),
                    max: Some(10.0),
                },
            )],
        );
        assert_eq!(
            report.quarantined_rows,
            [0, 1].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn pattern_matches_anywhere_in_the_value() {
        let schema = Schema::new(vec![Field::new("email", SemanticType::String)]);
        let batch = RowBatch::from_rows(
            schema,
            vec![
                vec![ScalarValue::from("ada@example.com")],
                vec![ScalarValue::from("not-an-email")],
                vec![ScalarValue::Null],
            ],
        )
        .unwrap();

        let report = QualityEngine::new().evaluate(
            &batch,
            &[QualityRule::new(
                "r",
                "looks like email",
                "email",
                RuleKind::Pattern {
                    pattern: "@".to_string(),
                },
            )],
        );
        assert_eq!(
            report.quarantined_rows,
            [1, 2].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn invalid_pattern_degrades_to_rule_failure() {
        let report = QualityEngine::new().evaluate(
            &people(),
            &[
                QualityRule::new(
                    "r-bad",
                    "broken regex",
                    "id",
                    RuleKind::Pattern {
                        pattern: "(unclosed".to_string(),
                    },
                ),
                unique_id(),
            ],
        );

        // The broken rule fails without quarantining; the other rule still ran.
        assert!(report.quarantined_rows.is_empty());
        assert_eq!(report.rules_failed, 1);
        assert_eq!(report.rules_passed, 1);
        assert_eq!(report.rule_results[0].records_checked, 0);
        assert!(report.rule_results[0]
            .message
            .as_deref()
            .unwrap()
            .contains("invalid pattern"));
    }

    #[test]
    fn unknown_column_degrades_without_aborting_the_batch() {
        let report = QualityEngine::new().evaluate(
            &people(),
            &[
                QualityRule::new("r-miss", "missing column", "ghost", RuleKind::NotNull),
                unique_id(),
            ],
        );

        assert_eq!(report.rules_failed, 1);
        assert_eq!(report.rules_passed, 1);
        assert!(report.rule_results[0]
            .message
            .as_deref()
            .unwrap()
            .contains("not found"));
    }

    #[test]
    fn one_of_requires_allowed_values() {
        let report = QualityEngine::new().evaluate(
            &people(),
            &[QualityRule::new(
                "r",
                "empty membership",
                "id",
                RuleKind::OneOf {
                    allowed_values: vec![],
                },
            )],
        );
        assert_eq!(report.rule_results[0].status, RuleStatus::Failed);
        assert_eq!(report.rule_results[0].records_checked, 0);
    }

    #[test]
    fn one_of_flags_values_outside_the_set() {
        let schema = Schema::new(vec![Field::new("status", SemanticType::String)]);
        let batch = RowBatch::from_rows(
            schema,
            vec![
                vec![ScalarValue::from("open")],
                vec![ScalarValue::from("bogus")],
            ],
        )
        .unwrap();

        let report = QualityEngine::new().evaluate(
            &batch,
            &[QualityRule::new(
                "r",
                "known status",
                "status",
                RuleKind::OneOf {
                    allowed_values: vec![
                        ScalarValue::from("open"),
                        ScalarValue::from("closed"),
                    ],
                },
            )],
        );
        assert_eq!(
            report.quarantined_rows,
            [1].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn custom_rules_are_reported_unsupported() {
        let report = QualityEngine::new().evaluate(
            &people(),
            &[QualityRule::new(
                "r",
                "custom check",
                "id",
                RuleKind::Custom {
                    expression: "id > 0".to_string(),
                },
            )],
        );
        assert_eq!(report.rule_results[0].status, RuleStatus::Failed);
        assert!(report.rule_results[0]
            .message
            .as_deref()
            .unwrap()
            .contains("not supported"));
    }

    #[test]
    fn inactive_rules_are_skipped_entirely() {
        let report = QualityEngine::new().evaluate(
            &people(),
            &[age_range(Severity::Error).disabled(), unique_id()],
        );
        assert_eq!(report.rule_results.len(), 1);
        assert!(report.quarantined_rows.is_empty());
    }

    #[test]
    fn empty_batch_scores_clean() {
        let batch = RowBatch::new(Schema::new(vec![Field::new(
            "id",
            SemanticType::Integer,
        )]));
        let report = QualityEngine::new().evaluate(&batch, &[unique_id()]);
        assert!((report.quality_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(report.rule_results[0].status, RuleStatus::Passed);
    }

    #[test]
    fn sample_limit_bounds_reported_indices() {
        let schema = Schema::new(vec![Field::new("n", SemanticType::Integer)]);
        let rows = (0..20).map(|_| vec![ScalarValue::Null]).collect();
        let batch = RowBatch::from_rows(schema, rows).unwrap();

        let report = QualityEngine::new().with_sample_limit(3).evaluate(
            &batch,
            &[QualityRule::new("r", "present", "n", RuleKind::NotNull)],
        );
        assert_eq!(report.rule_results[0].failed_row_sample.len(), 3);
        assert_eq!(report.rule_results[0].records_failed, 20);
        assert_eq!(report.quarantined_rows.len(), 20);
    }

    #[test]
    fn same_inputs_same_report() {
        let engine = QualityEngine::new();
        let rules = [age_range(Severity::Error), unique_id()];
        let a = engine.evaluate(&people(), &rules);
        let b = engine.evaluate(&people(), &rules);
        assert_eq!(a.quarantined_rows, b.quarantined_rows);
        assert_eq!(a.quality_score, b.quality_score);
        assert_eq!(a.rule_results.len(), b.rule_results.len());
    }
}
