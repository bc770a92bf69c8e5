use std::collections::HashMap;

use crate::error::DbError;
use crate::value::Value;

/// Ordered column names of a table plus a name-to-position index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { columns, index }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Result<usize, DbError> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| DbError::UnknownColumn(column.to_string()))
    }

    pub fn indexes_of(&self, columns: &[&str]) -> Result<Vec<usize>, DbError> {
        columns.iter().map(|c| self.index_of(c)).collect()
    }

    /// Lays `values` out as a full row.
    ///
    /// Without `columns` the values must cover the schema in order. With
    /// `columns` each value lands at its named position and every other field
    /// is left empty.
    pub fn build_row(
        &self,
        columns: Option<&[&str]>,
        values: &[Value],
    ) -> Result<Vec<String>, DbError> {
        match columns {
            None => {
                if values.len() != self.columns.len() {
                    return Err(DbError::ArgumentCount {
                        expected: self.columns.len(),
                        got: values.len(),
                    });
                }
                Ok(values.iter().map(Value::to_field).collect())
            }
            Some(columns) => {
                if values.len() != columns.len() {
                    return Err(DbError::ArgumentCount {
                        expected: columns.len(),
                        got: values.len(),
                    });
                }
                let mut row = vec![String::new(); self.columns.len()];
                for (col, value) in columns.iter().zip(values) {
                    row[self.index_of(col)?] = value.to_field();
                }
                Ok(row)
            }
        }
    }

    /// Resolves `(column, value)` pairs to `(position, field)` pairs.
    pub fn resolve_updates(
        &self,
        updates: &[(&str, Value)],
    ) -> Result<Vec<(usize, String)>, DbError> {
        updates
            .iter()
            .map(|(col, value)| Ok((self.index_of(col)?, value.to_field())))
            .collect()
    }
}
