//! Row batches: the semantic table surface of the engine.
//!
//! A [`RowBatch`] is an ordered schema plus positionally-stored rows. The
//! engine only ever manipulates row indices and cell values; reading and
//! writing physical files is the external tabular engine's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{Field, Schema, SemanticType};
use crate::value::ScalarValue;

/// A single row of cell values, positionally aligned to a [`Schema`].
pub type Row = Vec<ScalarValue>;

/// A schema plus its rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowBatch {
    schema: Schema,
    rows: Vec<Row>,
}

impl RowBatch {
    /// Creates an empty batch with the given schema.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Creates a batch from a schema and pre-built rows.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if any row's arity does not match the
    /// schema.
    pub fn from_rows(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let mut batch = Self::new(schema);
        for row in rows {
            batch.push_row(row)?;
        }
        Ok(batch)
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the rows in order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the batch has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the row's arity does not match the
    /// schema.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(Error::InvalidInput(format!(
                "row arity {} does not match schema arity {}",
                row.len(),
                self.schema.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the cell at `(row, column)` by column name.
    ///
    /// Returns `None` if the row index or the column does not exist.
    #[must_use]
    pub fn value_at(&self, row: usize, column: &str) -> Option<&ScalarValue> {
        let col = self.schema.index_of(column)?;
        self.rows.get(row)?.get(col)
    }

    /// Returns an iterator over one column's values, in row order.
    ///
    /// Returns `None` if the column does not exist.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = &'a ScalarValue>> {
        let col = self.schema.index_of(column)?;
        Some(self.rows.iter().filter_map(move |row| row.get(col)))
    }

    /// Composes the canonical key tuple for one row over the given columns.
    ///
    /// Canonical cell encodings are joined with `,`; because string payloads
    /// are base64url encoded the composition is unambiguous.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if a key column is missing from the
    /// schema or the row index is out of bounds.
    pub fn key_string(&self, row: usize, key_columns: &[String]) -> Result<String> {
        let cells = self
            .rows
            .get(row)
            .ok_or_else(|| Error::InvalidInput(format!("row index {row} out of bounds")))?;

        let mut parts = Vec::with_capacity(key_columns.len());
        for column in key_columns {
            let col = self.schema.index_of(column).ok_or_else(|| {
                Error::InvalidInput(format!("key column '{column}' not present in schema"))
            })?;
            let cell = cells.get(col).ok_or_else(|| Error::Internal {
                message: format!("row {row} shorter than schema"),
            })?;
            parts.push(cell.canonical_repr());
        }
        Ok(parts.join(","))
    }

    /// Returns a new batch without the rows at the given indices.
    ///
    /// Row order of survivors is preserved. Unknown indices are ignored.
    #[must_use]
    pub fn without_rows(&self, excluded: &BTreeSet<usize>) -> Self {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(idx, _)| !excluded.contains(idx))
            .map(|(_, row)| row.clone())
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Returns a new batch with an appended monotonically increasing
    /// integer column.
    ///
    /// The first row receives `start`, the second `start + 1`, and so on.
    /// An existing column with the same name is replaced in place so the
    /// operation is safe to re-run after a partial failure.
    #[must_use]
    pub fn with_surrogate_keys(&self, column: &str, start: i64) -> Self {
        if let Some(col) = self.schema.index_of(column) {
            let mut out = self.clone();
            for (offset, row) in out.rows.iter_mut().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                if let Some(cell) = row.get_mut(col) {
                    *cell = ScalarValue::Int64(start + offset as i64);
                }
            }
            return out;
        }

        let mut schema = self.schema.clone();
        schema.push(Field::new(column, SemanticType::Integer));
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(offset, row)| {
                let mut row = row.clone();
                #[allow(clippy::cast_possible_wrap)]
                row.push(ScalarValue::Int64(start + offset as i64));
                row
            })
            .collect();
        Self { schema, rows }
    }

    /// Returns a new batch without the named column.
    ///
    /// Returns a clone of the batch if the column does not exist.
    #[must_use]
    pub fn without_column(&self, column: &str) -> Self {
        let Some(col) = self.schema.index_of(column) else {
            return self.clone();
        };
        let fields = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != col)
            .map(|(_, field)| field.clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != col)
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();
        Self {
            schema: Schema::new(fields),
            rows,
        }
    }

    /// Appends all rows of another batch.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the schemas differ.
    pub fn extend_from(&mut self, other: &Self) -> Result<()> {
        if self.schema != other.schema {
            return Err(Error::InvalidInput(
                "cannot extend a batch with rows of a different schema".to_string(),
            ));
        }
        self.rows.extend(other.rows.iter().cloned());
        Ok(())
    }
}
