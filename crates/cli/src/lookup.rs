//! `exofile lookup`: one planet's row from a merged table.

use std::path::{Path, PathBuf};

use exofile_core::{Table, TableError};
use exofile_io::{csv, json};
use serde_json::{Map, Value as Json};

use crate::exit_codes::EXIT_LOOKUP;
use crate::CliError;

pub fn cmd_lookup(
    table_path: PathBuf,
    name: String,
    entity_column: String,
    refs_path: Option<PathBuf>,
    json_output: bool,
    units_row: bool,
) -> Result<(), CliError> {
    let table = if units_row {
        csv::import_with_units(&table_path)
    } else {
        csv::import(&table_path)
    }
    .map_err(CliError::file)?;
    let row = table.index_of(&entity_column, &name).map_err(lookup_err)?;
    let entity = table.value(row, &entity_column).to_display();

    let refs = match refs_path {
        Some(path) => Some(load_refs(&path, &entity_column, &entity)?),
        None => None,
    };

    if json_output {
        let mut object = Map::new();
        for column in table.columns() {
            let value = json::to_json(column.get(row));
            let entry = if refs.is_some() {
                let mut cell = Map::new();
                cell.insert("value".into(), value);
                cell.insert("unit".into(), column.meta.unit.clone().map_or(Json::Null, Json::String));
                cell.insert(
                    "reference".into(),
                    reference_of(&refs, &column.name).map_or(Json::Null, Json::String),
                );
                Json::Object(cell)
            } else {
                value
            };
            object.insert(column.name.clone(), entry);
        }
        let json_str = serde_json::to_string_pretty(&object)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    let width = table.column_names().map(str::len).max().unwrap_or(0);
    for column in table.columns() {
        let value = column.get(row);
        let mut line = format!("{:<width$}  {}", column.name, value.to_display());
        if let (Some(unit), false) = (&column.meta.unit, value.is_missing()) {
            line.push(' ');
            line.push_str(unit);
        }
        if let Some(r) = reference_of(&refs, &column.name).filter(|_| column.name != entity_column) {
            line.push_str(&format!("  ({r})"));
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}

/// Provenance table and the row holding `entity`.
fn load_refs(path: &Path, entity_column: &str, entity: &str) -> Result<(Table, usize), CliError> {
    let refs = csv::import(path).map_err(CliError::file)?;
    let row = refs
        .find_rows(entity_column, entity)
        .first()
        .copied()
        .ok_or_else(|| {
            CliError::table(format!("{}: no row for '{entity}'", path.display()))
                .with_hint("was it written by the same `exofile merge` run?")
        })?;
    Ok((refs, row))
}

fn lookup_err(err: TableError) -> CliError {
    match err {
        TableError::NotFound { .. } | TableError::Ambiguous { .. } => {
            CliError { code: EXIT_LOOKUP, message: err.to_string(), hint: None }
        }
        other => CliError::table(other.to_string()),
    }
}

/// Printed reference for `column`; `None` when the cell is empty.
fn reference_of(refs: &Option<(Table, usize)>, column: &str) -> Option<String> {
    let (refs, row) = refs.as_ref()?;
    let value = refs.column(column)?.get(*row);
    value.is_present().then(|| value.to_display())
}
