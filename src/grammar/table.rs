//! In-memory table supplied to the compiler.
//!
//! Rows are stored row-major and aligned to an ordered field list, so a field
//! can be known to exist even when the table has no rows.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Error, Result};

use super::value::Value;

/// An ordered, immutable-by-convention table of flat rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    fields: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given fields.
    #[must_use]
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row aligned to the field list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowLengthMismatch`] if the row length differs from the field count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(Error::RowLengthMismatch {
                expected: self.fields.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Build a table from named columns. Shorter columns are padded with nulls.
    #[must_use]
    pub fn from_columns(columns: Vec<(&str, Vec<Value>)>) -> Self {
        let n_rows = columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        let fields: Vec<String> = columns.iter().map(|(name, _)| (*name).to_string()).collect();
        let mut rows = vec![Vec::with_capacity(fields.len()); n_rows];
        for (_, column) in columns {
            let mut values = column.into_iter();
            for row in &mut rows {
                row.push(values.next().unwrap_or_default());
            }
        }
        Self { fields, rows }
    }

    /// Build a table from a JSON array of flat records.
    ///
    /// Fields are taken in first-appearance order; missing values become null.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableData`] if the input is not an array of objects with primitive values.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(json).map_err(|e| Error::TableData(e.to_string()))?;

        let mut fields: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    fields.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            let mut row = Vec::with_capacity(fields.len());
            for field in &fields {
                let value = match record.get(field) {
                    None => Value::Null,
                    Some(v) => serde_json::from_value::<Value>(v.clone()).map_err(|_| {
                        Error::TableData(format!("field '{field}' holds a non-primitive value"))
                    })?,
                };
                row.push(value);
            }
            rows.push(row);
        }
        Ok(Self { fields, rows })
    }

    /// Field names in order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Position of a field, if present.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Check if a field exists.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    /// Get number of rows.
    #[must_use]
    pub fn nrow(&self) -> usize {
        self.rows.len()
    }

    /// Get number of fields.
    #[must_use]
    pub fn ncol(&self) -> usize {
        self.fields.len()
    }

    /// Rows in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Value at a row for a field, if both exist.
    #[must_use]
    pub fn value(&self, row: usize, field: &str) -> Option<&Value> {
        let idx = self.field_index(field)?;
        self.rows.get(row)?.get(idx)
    }

    /// Iterate a column, if the field exists.
    pub fn column(&self, field: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.field_index(field)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Distinct values of a field in first-appearance order.
    #[must_use]
    pub fn distinct(&self, field: &str) -> Option<Vec<Value>> {
        let mut seen = HashSet::new();
        let values = self
            .column(field)?
            .filter(|v| seen.insert(*v))
            .cloned()
            .collect();
        Some(values)
    }

    /// New table holding only rows whose `field` equals `value`.
    #[must_use]
    pub fn filter_eq(&self, field: &str, value: &Value) -> Self {
        let Some(idx) = self.field_index(field) else {
            return Self::new(self.fields.clone());
        };
        Self {
            fields: self.fields.clone(),
            rows: self.rows.iter().filter(|row| &row[idx] == value).cloned().collect(),
        }
    }

    /// New table with `name` set to `values`, replacing an existing field of that name.
    ///
    /// `values` is padded with nulls or truncated to the row count.
    #[must_use]
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Self {
        let mut out = self.clone();
        let mut values = values.into_iter();
        match out.field_index(name) {
            Some(idx) => {
                for row in &mut out.rows {
                    row[idx] = values.next().unwrap_or_default();
                }
            }
            None => {
                out.fields.push(name.to_string());
                for row in &mut out.rows {
                    row.push(values.next().unwrap_or_default());
                }
            }
        }
        out
    }

    pub(crate) fn from_parts(fields: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { fields, rows }
    }
}
