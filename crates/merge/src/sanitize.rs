//! Source clean-up applied before ranking: reference links, legacy units and
//! masking of values whose uncertainties are unusable.

use std::sync::OnceLock;

use exofile_core::{units, Table, TableError, Value};
use regex::Regex;

use crate::config::MergeConfig;

/// Clean one source table in place. Returns the number of cells masked.
///
/// Entity names are always stored as text, so a numeric planet key read
/// from CSV keys the same entity as its text form.
pub fn sanitize_source(table: &mut Table, config: &MergeConfig) -> Result<usize, TableError> {
    let opts = &config.sanitize;

    text_keys(table, &config.entity_column)?;
    if opts.correct_units {
        correct_units(table)?;
    }
    if opts.normalize_reflinks {
        normalize_reflinks(table, &config.reference_column, &config.reflink_suffix)?;
    }

    let mut masked = 0;
    if opts.mask_incomplete_errors {
        masked += mask_incomplete_errors(table, &config.error_suffixes)?;
    }
    if opts.mask_zero_errors {
        masked += mask_zero_errors(table, &config.error_suffixes)?;
    }
    Ok(masked)
}

/// Store every present cell of `column` as text.
pub fn text_keys(table: &mut Table, column: &str) -> Result<(), TableError> {
    if !table.has_column(column) {
        return Ok(());
    }
    table.map_column(column, |v| match v {
        Value::Number(_) => Value::text(v.to_display()),
        other => other.clone(),
    })
}

fn reflink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r">(.*)</a>").expect("reflink pattern is valid"))
}

/// Text of an HTML reference link; plain names pass through unchanged.
pub fn refname_from_link(link: &str) -> String {
    if let Some(caps) = reflink_regex().captures(link) {
        return caps[1].trim().to_string();
    }
    if link.contains("<a") {
        tracing::warn!(link, "cannot extract reference name from link, keeping it as-is");
    }
    link.trim().to_string()
}

/// Reduce the reference column and every `*<suffix>` column to plain names.
pub fn normalize_reflinks(table: &mut Table, reference_column: &str, suffix: &str) -> Result<(), TableError> {
    let columns: Vec<String> = table
        .column_names()
        .filter(|name| *name == reference_column || (!suffix.is_empty() && name.ends_with(suffix)))
        .map(str::to_string)
        .collect();

    for name in columns {
        table.map_column(&name, |v| match v {
            Value::Text(s) => Value::text(refname_from_link(s)),
            other => other.clone(),
        })?;
    }
    Ok(())
}

/// Rewrite legacy unit spellings in column metadata.
pub fn correct_units(table: &mut Table) -> Result<(), TableError> {
    let fixes: Vec<(String, &'static str)> = table
        .columns()
        .iter()
        .filter_map(|c| {
            let unit = c.meta.unit.as_deref()?;
            units::correct_unit(unit).map(|good| (c.name.clone(), good))
        })
        .collect();

    for (name, good) in fixes {
        if let Some(mut meta) = table.meta(&name).cloned() {
            tracing::info!(
                column = %name,
                from = meta.unit.as_deref().unwrap_or(""),
                to = good,
                "corrected column unit"
            );
            meta.unit = Some(good.to_string());
            table.set_meta(&name, meta)?;
        }
    }
    Ok(())
}

/// Mask a value and its errors in rows where any of them is missing.
pub fn mask_incomplete_errors(table: &mut Table, suffix_sets: &[Vec<String>]) -> Result<usize, TableError> {
    mask_rows_where(table, suffix_sets, |cells| cells.iter().any(|v| v.is_missing()))
}

/// Mask a value and its errors in rows where an error is exactly zero.
pub fn mask_zero_errors(table: &mut Table, suffix_sets: &[Vec<String>]) -> Result<usize, TableError> {
    mask_rows_where(table, suffix_sets, |cells| {
        cells[1..].iter().any(|v| v.as_f64() == Some(0.0))
    })
}

fn mask_rows_where<F>(table: &mut Table, suffix_sets: &[Vec<String>], predicate: F) -> Result<usize, TableError>
where
    F: Fn(&[Value]) -> bool,
{
    let mut masked = 0;
    for cols in table.error_columns(suffix_sets) {
        for row in 0..table.row_count() {
            let cells: Vec<Value> = cols.iter().map(|c| table.value(row, c).clone()).collect();
            if !predicate(&cells) {
                continue;
            }
            for (col, cell) in cols.iter().zip(&cells) {
                if cell.is_present() {
                    masked += 1;
                    table.set(row, col, Value::Missing)?;
                }
            }
        }
    }
    Ok(masked)
}
