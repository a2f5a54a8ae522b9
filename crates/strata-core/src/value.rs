//! Scalar value types with canonical encoding.
//!
//! Rows are sequences of [`ScalarValue`]s. The canonical encoding gives every
//! value a deterministic, separator-safe string form used to compose
//! primary-key tuples for upsert matching: string payloads are base64url
//! encoded (no padding), so a composed key like `s:Zm9v,i:42` can never be
//! forged by a crafted string value containing the separator.
//!
//! ```text
//! type_tag ::=
//!   "s" (string)  | "i" (int64)     | "f" (float64) | "b" (bool)
//!   "d" (date)    | "t" (timestamp) | "n" (null)
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single typed cell value within a row.
///
/// Unlike partition-style keys, row values may carry floating-point
/// measures; callers that use floats inside primary-key tuples accept the
/// usual representational caveats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarValue {
    /// Arbitrary string (base64url encoded in canonical form).
    String(String),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point number.
    Float64(f64),
    /// Boolean value.
    Boolean(bool),
    /// Date in YYYY-MM-DD format.
    Date(String),
    /// Timestamp in ISO 8601 format, UTC.
    Timestamp(String),
    /// Explicit null value.
    Null,
}

impl ScalarValue {
    /// Returns the canonical representation with type tag.
    ///
    /// String values are base64url encoded (no padding) so canonical forms
    /// compose safely into multi-column key tuples.
    #[must_use]
    pub fn canonical_repr(&self) -> String {
        match self {
            Self::String(s) => {
                let encoded = URL_SAFE_NO_PAD.encode(s.as_bytes());
                format!("s:{encoded}")
            }
            Self::Int64(n) => format!("i:{n}"),
            Self::Float64(x) => format!("f:{x}"),
            Self::Boolean(b) => format!("b:{}", if *b { "true" } else { "false" }),
            Self::Date(d) => format!("d:{d}"),
            Self::Timestamp(ts) => format!("t:{ts}"),
            Self::Null => "n:null".to_string(),
        }
    }

    /// Returns the type tag character.
    #[must_use]
    pub const fn type_tag(&self) -> char {
        match self {
            Self::String(_) => 's',
            Self::Int64(_) => 'i',
            Self::Float64(_) => 'f',
            Self::Boolean(_) => 'b',
            Self::Date(_) => 'd',
            Self::Timestamp(_) => 't',
            Self::Null => 'n',
        }
    }

    /// Returns true for the explicit null value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the numeric value for integer and float variants.
    ///
    /// Non-numeric variants (including null) return `None`; rule
    /// evaluation treats them as failing numeric checks rather than
    /// coercing.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int64(n) => Some(*n as f64),
            Self::Float64(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the string payload for string-like variants.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Date(d) => Some(d),
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Int64(n) => write!(f, "{n}"),
            Self::Float64(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        Self::Int64(n)
    }
}

impl From<f64> for ScalarValue {
    fn from(x: f64) -> Self {
        Self::Float64(x)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
