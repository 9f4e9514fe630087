use std::collections::HashMap;

use crate::error::TableError;
use crate::value::{ColumnMeta, Value};

static MISSING: Value = Value::Missing;

/// One named column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub meta: ColumnMeta,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, meta: ColumnMeta, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            meta,
            values,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> &Value {
        self.values.get(row).unwrap_or(&MISSING)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column-oriented table of nullable values.
///
/// Columns keep insertion order. Every column has exactly `row_count()`
/// values; reading an absent column yields `Value::Missing`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from whole columns. All columns must have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut table = Table::new();
        if let Some(first) = columns.first() {
            table.rows = first.len();
        }
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn meta(&self, name: &str) -> Option<&ColumnMeta> {
        self.column(name).map(|c| &c.meta)
    }

    pub fn set_meta(&mut self, name: &str, meta: ColumnMeta) -> Result<(), TableError> {
        let i = self.column_position(name)?;
        self.columns[i].meta = meta;
        Ok(())
    }

    /// Cell value, `Missing` when the column does not exist.
    pub fn value(&self, row: usize, name: &str) -> &Value {
        self.column(name).map(|c| c.get(row)).unwrap_or(&MISSING)
    }

    pub fn set(&mut self, row: usize, name: &str, value: Value) -> Result<(), TableError> {
        if row >= self.rows {
            return Err(TableError::RowOutOfRange { row, rows: self.rows });
        }
        let i = self.column_position(name)?;
        self.columns[i].values[row] = value;
        Ok(())
    }

    /// Append an all-missing column.
    pub fn add_column(&mut self, name: &str, meta: ColumnMeta) -> Result<(), TableError> {
        let values = vec![Value::Missing; self.rows];
        self.push_column(Column::new(name, meta, values))
    }

    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.index.contains_key(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        if self.columns.is_empty() && self.rows == 0 {
            self.rows = column.len();
        }
        let found = column.len();
        if found != self.rows {
            return Err(TableError::LengthMismatch {
                column: column.name,
                expected: self.rows,
                found,
            });
        }
        self.index.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Append an all-missing row and return its index.
    pub fn push_empty_row(&mut self) -> usize {
        for column in &mut self.columns {
            column.values.push(Value::Missing);
        }
        self.rows += 1;
        self.rows - 1
    }

    /// Append a row from `(column, value)` pairs; unnamed columns stay missing.
    pub fn push_row<'a, I>(&mut self, cells: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let cells: Vec<(&str, Value)> = cells.into_iter().collect();
        for (name, _) in &cells {
            self.column_position(name)?;
        }
        let row = self.push_empty_row();
        for (name, value) in cells {
            self.set(row, name, value)?;
        }
        Ok(row)
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<(), TableError> {
        if self.index.contains_key(new) {
            return Err(TableError::DuplicateColumn(new.to_string()));
        }
        let i = self.column_position(old)?;
        self.index.remove(old);
        self.index.insert(new.to_string(), i);
        self.columns[i].name = new.to_string();
        Ok(())
    }

    /// Apply `f` to every value of a column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<(), TableError>
    where
        F: FnMut(&Value) -> Value,
    {
        let i = self.column_position(name)?;
        for v in &mut self.columns[i].values {
            *v = f(v);
        }
        Ok(())
    }

    /// Rows whose `column` cell is exactly `key`.
    pub fn find_rows(&self, column: &str, key: &str) -> Vec<usize> {
        let Some(col) = self.column(column) else {
            return Vec::new();
        };
        col.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_present() && v.to_display() == key)
            .map(|(i, _)| i)
            .collect()
    }

    /// Locate the row for `key` in `column`.
    ///
    /// An exact match wins. Otherwise a single row containing `key` is
    /// accepted; several candidates are reported as ambiguous.
    pub fn index_of(&self, column: &str, key: &str) -> Result<usize, TableError> {
        let col = self
            .column(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;

        // Names are compared as printed, so "1234" finds a numeric cell.
        let names: Vec<(usize, String)> = col
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_present())
            .map(|(i, v)| (i, v.to_display()))
            .collect();

        if let Some((i, _)) = names.iter().find(|(_, s)| s == key) {
            return Ok(*i);
        }

        let candidates: Vec<&(usize, String)> =
            names.iter().filter(|(_, s)| s.contains(key)).collect();

        match candidates.as_slice() {
            [] => Err(TableError::NotFound {
                column: column.to_string(),
                key: key.to_string(),
            }),
            [(i, _)] => Ok(*i),
            many => Err(TableError::Ambiguous {
                column: column.to_string(),
                key: key.to_string(),
                candidates: many.iter().map(|(_, s)| s.clone()).collect(),
            }),
        }
    }

    /// Columns that have a full set of error siblings.
    ///
    /// For each suffix set (e.g. `["err1", "err2"]`) returns
    /// `[col, col+"err1", col+"err2"]` for every `col` where all siblings exist.
    pub fn error_columns(&self, suffix_sets: &[Vec<String>]) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        for set in suffix_sets {
            if set.is_empty() {
                continue;
            }
            for column in &self.columns {
                if set.iter().all(|s| self.has_column(&format!("{}{s}", column.name))) {
                    let mut cols = vec![column.name.clone()];
                    cols.extend(set.iter().map(|s| format!("{}{s}", column.name)));
                    out.push(cols);
                }
            }
        }
        out
    }

    fn column_position(&self, name: &str) -> Result<usize, TableError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }
}
