// JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use exofile_core::{Table, Value};
use serde_json::{Map, Value as Json};

use crate::error::{IoError, IoResult};

/// Export a table as a JSON array of row objects.
///
/// Keys follow column order; missing cells are `null`.
pub fn export(table: &Table, path: &Path) -> IoResult<()> {
    let file = File::create(path).map_err(|e| IoError::file(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &to_rows(table))?;
    writer.flush().map_err(|e| IoError::file(path, e))?;
    Ok(())
}

/// Row objects of `table`, one per row.
pub fn to_rows(table: &Table) -> Vec<Map<String, Json>> {
    (0..table.row_count())
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|c| (c.name.clone(), to_json(c.get(row))))
                .collect()
        })
        .collect()
}

/// JSON form of one cell. Non-finite numbers become `null`.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Missing => Json::Null,
        Value::Number(n) => serde_json::Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
        Value::Text(s) => Json::String(s.clone()),
    }
}
