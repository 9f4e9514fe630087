use std::collections::{BTreeMap, HashMap};

use exofile_core::{Column, ColumnMeta, Table, TableError, Value};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A named, already loaded source table (archive snapshot, extended table...).
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub table: Table,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// One source row belonging to the entity being merged.
#[derive(Debug, Clone, Copy)]
pub struct CandidateRow<'a> {
    pub source: usize,
    pub row: usize,
    pub table: &'a Table,
    pub reference: &'a str,
}

impl<'a> CandidateRow<'a> {
    pub fn value(&self, column: &str) -> &'a Value {
        self.table.value(self.row, column)
    }
}

/// All source rows of one entity, in input order (table order, then row order).
#[derive(Debug, Clone)]
pub struct EntityRows<'a> {
    pub entity: &'a str,
    pub rows: Vec<CandidateRow<'a>>,
}

impl<'a> EntityRows<'a> {
    /// Rows contributed by `reference`, in input order.
    pub fn rows_for<'s>(&'s self, reference: &'s str) -> impl Iterator<Item = &'s CandidateRow<'a>> + 's {
        self.rows.iter().filter(move |c| c.reference == reference)
    }

    /// Distinct references in first-appearance order.
    pub fn references(&self) -> Vec<&'a str> {
        let mut seen: Vec<&'a str> = Vec::new();
        for c in &self.rows {
            if !seen.contains(&c.reference) {
                seen.push(c.reference);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The merged table plus where every cell came from.
///
/// Wraps a plain [`Table`] rather than extending it; read access goes
/// through [`MergedTable::table`].
#[derive(Debug, Clone)]
pub struct MergedTable {
    pub(crate) table: Table,
    pub(crate) entity_column: String,
    pub(crate) rows_by_entity: HashMap<String, usize>,
    /// Per row: column → reference (or override label).
    pub(crate) provenance: Vec<BTreeMap<String, String>>,
    pub(crate) report: MergeReport,
}

impl MergedTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn entity_column(&self) -> &str {
        &self.entity_column
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    pub fn entity_count(&self) -> usize {
        self.table.row_count()
    }

    /// Entity names in output order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        let column = self.table.column(&self.entity_column);
        (0..self.table.row_count()).filter_map(move |i| column.and_then(|c| c.get(i).as_str()))
    }

    pub fn row_index(&self, entity: &str) -> Option<usize> {
        self.rows_by_entity.get(entity).copied()
    }

    /// Cell for an exact entity name; `None` if the entity is unknown.
    pub fn value(&self, entity: &str, column: &str) -> Option<&Value> {
        self.row_index(entity).map(|row| self.table.value(row, column))
    }

    /// Reference (or override label) that supplied a cell.
    pub fn reference_of(&self, entity: &str, column: &str) -> Option<&str> {
        let row = self.row_index(entity)?;
        self.provenance[row].get(column).map(String::as_str)
    }

    /// Full row for `name`, accepting an unambiguous partial name.
    pub fn row(&self, name: &str) -> Result<Vec<(String, Value)>, TableError> {
        let row = self.table.index_of(&self.entity_column, name)?;
        Ok(self
            .table
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.get(row).clone()))
            .collect())
    }

    /// Same shape as the merged table, each cell holding its reference.
    pub fn reference_table(&self) -> Table {
        let columns = self
            .table
            .columns()
            .iter()
            .map(|c| {
                if c.name == self.entity_column {
                    return c.clone();
                }
                let values = self
                    .provenance
                    .iter()
                    .map(|p| Value::from(p.get(&c.name).cloned()))
                    .collect();
                Column::new(c.name.clone(), ColumnMeta::default(), values)
            })
            .collect();
        // Every column has one value per provenance row, so lengths agree.
        Table::from_columns(columns).unwrap_or_default()
    }

    pub(crate) fn set_cell(
        &mut self,
        row: usize,
        column: &str,
        value: Value,
        reference: &str,
    ) -> Result<(), TableError> {
        self.table.set(row, column, value)?;
        self.provenance[row].insert(column.to_string(), reference.to_string());
        Ok(())
    }

    pub(crate) fn push_entity(&mut self, entity: &str) -> Result<usize, TableError> {
        let row = self.table.push_empty_row();
        self.table.set(row, &self.entity_column, Value::text(entity))?;
        self.rows_by_entity.insert(entity.to_string(), row);
        self.provenance.push(BTreeMap::new());
        Ok(row)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub meta: MergeMeta,
    pub entities: usize,
    pub columns: usize,
    pub sources: Vec<SourceSummary>,
    /// Cells masked while sanitising sources.
    pub masked_cells: usize,
    /// Non-missing cells produced by the merge (before overrides).
    pub filled_cells: usize,
    /// Cells taken from a reference other than the entity's best one.
    pub backfilled_cells: usize,
    /// (entity, group) pairs filled from more than one reference.
    pub split_groups: usize,
    pub overrides: Vec<OverrideSummary>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeMeta {
    pub engine_version: String,
    pub entity_column: String,
    pub reference_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch_jd: Option<f64>,
    pub groups: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub rows: usize,
    pub references: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OverrideSummary {
    pub label: String,
    pub applied: usize,
    pub skipped_missing: usize,
    pub added_rows: usize,
    pub added_columns: usize,
}
