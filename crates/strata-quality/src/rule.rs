//! Quality rule model.

use serde::{Deserialize, Serialize};

use strata_core::ScalarValue;

/// How a failing rule affects the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Failing rows are quarantined before the data becomes visible.
    Error,
    /// Failures are reported but rows pass through.
    Warning,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Error
    }
}

/// The check a rule performs against its column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Fails rows where the value is null or absent.
    NotNull,
    /// Fails every row that participates in a duplicate-value group.
    Unique,
    /// Fails rows whose numeric value falls outside `[min, max]`.
    ///
    /// Either bound may be absent, leaving that side unconstrained.
    /// Null and non-numeric values fail the check.
    Range {
        /// Inclusive lower bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Inclusive upper bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Fails rows whose string value does not match the regex.
    ///
    /// Match semantics are "contains": the pattern may match anywhere in
    /// the value. Null and non-string values fail the check.
    Pattern {
        /// The regular expression to match.
        pattern: String,
    },
    /// Fails rows whose value is not one of the allowed values.
    OneOf {
        /// The closed set of accepted values.
        allowed_values: Vec<ScalarValue>,
    },
    /// A free-form expression check.
    ///
    /// Carried for configuration compatibility; evaluation is not
    /// supported and always degrades to a failed verdict for the rule.
    Custom {
        /// The expression, opaque to this engine.
        expression: String,
    },
}

const fn default_active() -> bool {
    true
}

/// A declared quality check against one column of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityRule {
    /// Stable rule identifier from the rule source.
    pub id: String,
    /// Human-readable rule name for reports.
    pub name: String,
    /// The column the rule checks.
    pub column: String,
    /// The check to perform.
    #[serde(flatten)]
    pub kind: RuleKind,
    /// Whether failures quarantine rows or merely warn.
    #[serde(default)]
    pub severity: Severity,
    /// Inactive rules are skipped entirely.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl QualityRule {
    /// Creates an active, error-severity rule.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        column: impl Into<String>,
        kind: RuleKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column: column.into(),
            kind,
            severity: Severity::Error,
            active: true,
        }
    }

    /// Sets the severity (builder style).
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Marks the rule inactive (builder style).
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.active = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_default_to_active_error() {
        let rule = QualityRule::new("r1", "age range", "age", RuleKind::NotNull);
        assert!(rule.active);
        assert_eq!(rule.severity, Severity::Error);
    }

    #[test]
    fn kind_deserializes_from_tagged_config() {
        let json = r#"{
            "id": "r1",
            "name": "age in range",
            "column": "age",
            "type": "range",
            "min": 0.0,
            "max": 120.0,
            "severity": "warning"
        }"#;
        let rule: QualityRule = serde_json::from_str(json).unwrap();
        assert_eq!(
            rule.kind,
            RuleKind::Range {
                min: Some(0.0),
                max: Some(120.0)
            }
        );
        assert_eq!(rule.severity, Severity::Warning);
        assert!(rule.active);
    }

    #[test]
    fn one_of_roundtrips_allowed_values() {
        let rule = QualityRule::new(
            "r2",
            "known status",
            "status",
            RuleKind::OneOf {
                allowed_values: vec![ScalarValue::from("open"), ScalarValue::from("closed")],
            },
        );
        let json = serde_json::to_string(&rule).unwrap();
        let back: QualityRule = serde_json::from_str(&json).unwrap();
        assert_eq!(rule, back);
    }
}
