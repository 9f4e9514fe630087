use std::collections::{HashMap, HashSet};

use exofile_core::{units, ColumnMeta, Table, Value};

use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};
use crate::group::{build_plan, fill_group, references_used, MergePlan};
use crate::model::{
    CandidateRow, EntityRows, MergeMeta, MergeReport, MergedTable, SourceSummary, SourceTable,
};
use crate::overrides::{apply_overrides, OverrideSource};
use crate::rank::rank_references;
use crate::resolve::resolve_column;
use crate::sanitize::sanitize_source;

/// Merge, then apply override sources in order.
pub fn run(
    sources: &[SourceTable],
    overrides: &[OverrideSource],
    config: &MergeConfig,
) -> MergeResult<MergedTable> {
    let merged = merge(sources, config)?;
    apply_overrides(merged, overrides)
}

/// Build one row per entity from all source tables.
///
/// Sources are cleaned copies; the caller's tables are not modified. Output
/// rows follow the first appearance of each entity (table order, then row
/// order) and output columns the first appearance of each column.
pub fn merge(sources: &[SourceTable], config: &MergeConfig) -> MergeResult<MergedTable> {
    config.validate()?;

    for source in sources {
        for column in [&config.entity_column, &config.reference_column] {
            if !source.table.has_column(column) {
                return Err(MergeError::MissingColumn {
                    table: source.name.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    // Clean
    let mut masked_cells = 0;
    let mut tables: Vec<Table> = Vec::with_capacity(sources.len());
    for source in sources {
        let mut table = source.table.clone();
        let masked = sanitize_source(&mut table, config)?;
        tracing::debug!(source = %source.name, rows = table.row_count(), masked, "source sanitized");
        masked_cells += masked;
        tables.push(table);
    }

    let schema = harmonize_schema(sources, &mut tables, config)?;
    let references = row_references(sources, &tables, config);

    let entities = index_entities(sources, &tables, &references, config);

    let names: Vec<String> = schema.iter().map(|(name, _)| name.clone()).collect();
    let plan = build_plan(&names, config);
    tracing::debug!(
        groups = plan.groups.len(),
        plain = plan.plain.len(),
        "merge plan built"
    );

    let mut table = Table::new();
    for (name, meta) in &schema {
        table.add_column(name, meta.clone())?;
    }

    let mut merged = MergedTable {
        table,
        entity_column: config.entity_column.clone(),
        rows_by_entity: HashMap::new(),
        provenance: Vec::new(),
        report: MergeReport::default(),
    };

    let mut stats = FillStats::default();
    for rows in &entities {
        merge_entity(&mut merged, rows, &plan, config, &mut stats)?;
    }

    merged.report = MergeReport {
        meta: MergeMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            entity_column: config.entity_column.clone(),
            reference_column: config.reference_column.clone(),
            epoch_jd: config.epoch_jd,
            groups: plan.groups.iter().filter(|g| g.configured).count(),
        },
        entities: merged.table.row_count(),
        columns: merged.table.column_count(),
        sources: sources
            .iter()
            .zip(&references)
            .map(|(source, refs)| {
                let mut distinct: Vec<&str> = refs.iter().map(String::as_str).collect();
                distinct.sort_unstable();
                distinct.dedup();
                SourceSummary {
                    name: source.name.clone(),
                    rows: source.table.row_count(),
                    references: distinct.len(),
                }
            })
            .collect(),
        masked_cells,
        filled_cells: stats.filled,
        backfilled_cells: stats.backfilled,
        split_groups: stats.split_groups,
        overrides: Vec::new(),
    };

    tracing::info!(
        entities = merged.report.entities,
        columns = merged.report.columns,
        filled = stats.filled,
        backfilled = stats.backfilled,
        "merge complete"
    );

    Ok(merged)
}

#[derive(Debug, Default)]
struct FillStats {
    filled: usize,
    backfilled: usize,
    split_groups: usize,
}

fn merge_entity(
    merged: &mut MergedTable,
    rows: &EntityRows<'_>,
    plan: &MergePlan,
    config: &MergeConfig,
    stats: &mut FillStats,
) -> MergeResult<()> {
    let ranking = rank_references(rows, config);
    let row = merged.push_entity(rows.entity)?;
    let Some(&best) = ranking.first() else {
        return Ok(());
    };

    // Private names are not written to the reference column.
    if rows
        .rows_for(best)
        .any(|c| c.value(&config.reference_column).is_present())
    {
        merged.set_cell(row, &config.reference_column, Value::text(best), best)?;
    }

    for group in &plan.groups {
        let filled = fill_group(rows, &ranking, group);
        if references_used(&filled) > 1 {
            stats.split_groups += 1;
        }
        for cell in filled {
            stats.filled += 1;
            if cell.reference != best {
                stats.backfilled += 1;
            }
            merged.set_cell(row, cell.column, cell.value, cell.reference)?;
        }
    }

    for column in &plan.plain {
        let resolved = resolve_column(rows, &ranking, column);
        if let Some(reference) = resolved.reference {
            stats.filled += 1;
            if reference != best {
                stats.backfilled += 1;
            }
            merged.set_cell(row, column, resolved.value, reference)?;
        }
    }

    Ok(())
}

/// Ordered union of source columns with the metadata of their first source.
///
/// Values of later sources are converted in place to the first unit when
/// both units are known. The default flag column is dropped.
fn harmonize_schema(
    sources: &[SourceTable],
    tables: &mut [Table],
    config: &MergeConfig,
) -> MergeResult<Vec<(String, ColumnMeta)>> {
    let mut schema: Vec<(String, ColumnMeta)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    schema.push((config.entity_column.clone(), ColumnMeta::default()));
    position.insert(config.entity_column.clone(), 0);

    for (source, table) in sources.iter().zip(tables.iter_mut()) {
        let columns: Vec<(String, ColumnMeta)> = table
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.meta.clone()))
            .collect();

        for (name, meta) in columns {
            if config.default_flag_column.as_deref() == Some(name.as_str()) {
                continue;
            }
            let Some(&i) = position.get(&name) else {
                position.insert(name.clone(), schema.len());
                schema.push((name, meta));
                continue;
            };
            if i == 0 && schema[0].1 == ColumnMeta::default() {
                schema[0].1 = meta;
                continue;
            }

            let (Some(target), Some(unit)) = (schema[i].1.unit.clone(), meta.unit.clone()) else {
                continue;
            };
            if units::same_unit(&unit, &target) {
                continue;
            }
            match units::conversion_factor(&unit, &target) {
                Some(factor) => {
                    tracing::info!(
                        source = %source.name,
                        column = %name,
                        from = %unit,
                        to = %target,
                        "converting column units"
                    );
                    table.map_column(&name, |v| v.scaled(factor))?;
                    table.set_meta(&name, ColumnMeta { unit: Some(target), ..meta })?;
                }
                None => {
                    tracing::warn!(
                        source = %source.name,
                        column = %name,
                        unit = %unit,
                        expected = %target,
                        "column units differ and cannot be converted; values kept as-is"
                    );
                }
            }
        }
    }

    Ok(schema)
}

/// Reference of every source row.
///
/// Rows without one get a private name, `<source>#<row>`, made unique
/// against every real reference and every other private name.
fn row_references(sources: &[SourceTable], tables: &[Table], config: &MergeConfig) -> Vec<Vec<String>> {
    let mut taken: HashSet<String> = tables
        .iter()
        .flat_map(|t| (0..t.row_count()).map(move |row| t.value(row, &config.reference_column)))
        .filter(|v| v.is_present())
        .map(Value::to_display)
        .collect();

    sources
        .iter()
        .zip(tables)
        .map(|(source, table)| {
            (0..table.row_count())
                .map(|row| match table.value(row, &config.reference_column) {
                    Value::Missing => {
                        let mut name = format!("{}#{row}", source.name);
                        while !taken.insert(name.clone()) {
                            name.push('#');
                        }
                        name
                    }
                    v => v.to_display(),
                })
                .collect()
        })
        .collect()
}

/// Group source rows by entity, in first-appearance order.
fn index_entities<'a>(
    sources: &[SourceTable],
    tables: &'a [Table],
    references: &'a [Vec<String>],
    config: &MergeConfig,
) -> Vec<EntityRows<'a>> {
    let mut out: Vec<EntityRows<'a>> = Vec::new();
    let mut position: HashMap<&'a str, usize> = HashMap::new();

    for (source, table) in tables.iter().enumerate() {
        let Some(column) = table.column(&config.entity_column) else {
            continue;
        };
        for row in 0..table.row_count() {
            // Present names were stored as text while sanitising.
            let Some(entity) = column.get(row).as_str() else {
                tracing::warn!(source = %sources[source].name, row, "row without entity name skipped");
                continue;
            };
            let candidate = CandidateRow {
                source,
                row,
                table,
                reference: references[source][row].as_str(),
            };
            match position.get(entity) {
                Some(&i) => out[i].rows.push(candidate),
                None => {
                    position.insert(entity, out.len());
                    out.push(EntityRows {
                        entity,
                        rows: vec![candidate],
                    });
                }
            }
        }
    }

    out
}
