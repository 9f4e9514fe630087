//! Manual corrections applied on top of a merged table.

use std::collections::BTreeMap;

use exofile_core::{units, ColumnMeta, Table, Value};

use crate::error::{MergeError, MergeResult};
use crate::model::{MergedTable, OverrideSummary};

/// One corrected cell.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideEntry {
    pub entity: String,
    pub column: String,
    pub value: Value,
}

impl OverrideEntry {
    pub fn new(entity: impl Into<String>, column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            entity: entity.into(),
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A labelled set of corrections (a local custom file, a shared sheet...).
///
/// The label becomes the provenance of every cell the source changes.
#[derive(Debug, Clone, Default)]
pub struct OverrideSource {
    pub label: String,
    pub entries: Vec<OverrideEntry>,
    /// Column metadata, used for unit conversion and new columns.
    pub meta: BTreeMap<String, ColumnMeta>,
}

impl OverrideSource {
    pub fn from_entries(label: impl Into<String>, entries: Vec<OverrideEntry>) -> Self {
        Self {
            label: label.into(),
            entries,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, column: impl Into<String>, meta: ColumnMeta) -> Self {
        self.meta.insert(column.into(), meta);
        self
    }

    /// One entry per cell of a full-row table keyed by `entity_column`.
    ///
    /// Rows without an entity name are ignored. Missing cells are kept as
    /// entries; applying them is a no-op.
    pub fn from_table(label: impl Into<String>, table: &Table, entity_column: &str) -> MergeResult<Self> {
        let label = label.into();
        let names = table.column(entity_column).ok_or_else(|| MergeError::MissingColumn {
            table: label.clone(),
            column: entity_column.to_string(),
        })?;

        let mut source = OverrideSource {
            label,
            ..Default::default()
        };
        for column in table.columns() {
            if column.name != entity_column {
                source.meta.insert(column.name.clone(), column.meta.clone());
            }
        }

        for row in 0..table.row_count() {
            let entity = names.get(row);
            if entity.is_missing() {
                tracing::debug!(source = %source.label, row, "override row without entity name ignored");
                continue;
            }
            let entity = entity.to_display();
            for column in table.columns() {
                if column.name == entity_column {
                    continue;
                }
                source.entries.push(OverrideEntry {
                    entity: entity.clone(),
                    column: column.name.clone(),
                    value: column.get(row).clone(),
                });
            }
        }

        Ok(source)
    }
}

/// Apply override sources in slice order; a later source wins over an
/// earlier one for the same cell.
///
/// Missing values never erase merged data and the entity column is never
/// rewritten. Unknown columns and entities are appended.
pub fn apply_overrides(mut merged: MergedTable, sources: &[OverrideSource]) -> MergeResult<MergedTable> {
    for source in sources {
        let summary = apply_source(&mut merged, source)?;
        tracing::info!(
            source = %summary.label,
            applied = summary.applied,
            added_rows = summary.added_rows,
            added_columns = summary.added_columns,
            "overrides applied"
        );
        merged.report.overrides.push(summary);
    }
    merged.report.entities = merged.table.row_count();
    merged.report.columns = merged.table.column_count();
    Ok(merged)
}

fn apply_source(merged: &mut MergedTable, source: &OverrideSource) -> MergeResult<OverrideSummary> {
    let mut summary = OverrideSummary {
        label: source.label.clone(),
        ..Default::default()
    };

    // Declared columns are added even when all their values are missing.
    for (column, meta) in &source.meta {
        if *column != merged.entity_column && !merged.table.has_column(column) {
            merged.table.add_column(column, meta.clone())?;
            summary.added_columns += 1;
        }
    }

    for entry in &source.entries {
        if entry.column == merged.entity_column {
            continue;
        }
        if entry.value.is_missing() {
            summary.skipped_missing += 1;
            continue;
        }

        if !merged.table.has_column(&entry.column) {
            let meta = source.meta.get(&entry.column).cloned().unwrap_or_default();
            merged.table.add_column(&entry.column, meta)?;
            summary.added_columns += 1;
        }

        let row = match merged.row_index(&entry.entity) {
            Some(row) => row,
            None => {
                tracing::warn!(
                    source = %source.label,
                    entity = %entry.entity,
                    "entity not in merged table, adding it"
                );
                summary.added_rows += 1;
                merged.push_entity(&entry.entity)?
            }
        };

        let value = convert_units(merged, source, entry);
        merged.set_cell(row, &entry.column, value, &source.label)?;
        summary.applied += 1;
    }

    Ok(summary)
}

/// Override value expressed in the merged column's unit.
fn convert_units(merged: &MergedTable, source: &OverrideSource, entry: &OverrideEntry) -> Value {
    let target = merged.table.meta(&entry.column).and_then(|m| m.unit.as_deref());
    let unit = source.meta.get(&entry.column).and_then(|m| m.unit.as_deref());

    match (unit, target) {
        (Some(unit), Some(target)) if !units::same_unit(unit, target) => {
            match units::conversion_factor(unit, target) {
                Some(factor) => {
                    tracing::warn!(
                        source = %source.label,
                        column = %entry.column,
                        from = unit,
                        to = target,
                        "override units differ from merged column, converting"
                    );
                    entry.value.scaled(factor)
                }
                None => {
                    tracing::warn!(
                        source = %source.label,
                        column = %entry.column,
                        unit,
                        expected = target,
                        "override units cannot be converted, value kept as-is"
                    );
                    entry.value.clone()
                }
            }
        }
        (None, Some(target)) => {
            tracing::debug!(
                source = %source.label,
                column = %entry.column,
                assumed = target,
                "override without units"
            );
            entry.value.clone()
        }
        _ => entry.value.clone(),
    }
}
