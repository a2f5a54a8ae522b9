//! Ordered, semantically-typed dataset schemas.
//!
//! A [`Schema`] is the ordered list of named columns a dataset version
//! carries. Types are *semantic* (what the value means to consumers), not
//! physical (how a file format stores it) — physical encodings are the
//! concern of the external tabular engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Free-form text.
    String,
    /// Whole numbers of any width.
    Integer,
    /// Floating point numbers of any width.
    Float,
    /// True/false.
    Boolean,
    /// Calendar date without time-of-day.
    Date,
    /// Date with time-of-day.
    Datetime,
    /// Time-of-day without a date.
    Time,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::Datetime => write!(f, "datetime"),
            Self::Time => write!(f, "time"),
        }
    }
}

/// A single named column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Column name, unique within a schema.
    pub name: String,
    /// Semantic type of the column's values.
    pub semantic_type: SemanticType,
}

impl Field {
    /// Creates a new field.
    #[must_use]
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// An ordered sequence of columns.
///
/// Column order is construction order and is significant: rows are stored
/// positionally against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a schema from an ordered list of fields.
    #[must_use]
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the positional index of a column by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns true if a column with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Appends a column to the end of the schema.
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }
}
