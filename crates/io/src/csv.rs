// CSV/TSV import/export of tables

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use exofile_core::{Column, ColumnMeta, Table, Value};

use crate::error::{IoError, IoResult};

/// Load a table whose first row holds the column names.
pub fn import(path: &Path) -> IoResult<Table> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> IoResult<Table> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter)
}

/// Load a table with a second header row of units (`""` or `None`: no unit).
pub fn import_with_units(path: &Path) -> IoResult<Table> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    parse_table(&content, delimiter, true)
}

pub fn import_from_string(content: &str, delimiter: u8) -> IoResult<Table> {
    parse_table(content, delimiter, false)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> IoResult<String> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::file(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::file(path, e))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            tracing::debug!(path = %path.display(), "file is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn parse_table(content: &str, delimiter: u8, units_row: bool) -> IoResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(IoError::Header("empty file".into())),
    };
    let names = header_names(header.iter())?;

    let units: Vec<Option<String>> = if units_row {
        let record = records
            .next()
            .transpose()?
            .ok_or_else(|| IoError::Header("missing units row".into()))?;
        (0..names.len()).map(|i| parse_unit(record.get(i).unwrap_or(""))).collect()
    } else {
        vec![None; names.len()]
    };

    let mut values: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for (i, record) in records.enumerate() {
        let record = record?;
        // Blank lines come through as a single empty field.
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        if record.len() > names.len() {
            return Err(IoError::Ragged {
                row: i + 1,
                found: record.len(),
                expected: names.len(),
            });
        }
        for (col, column) in values.iter_mut().enumerate() {
            column.push(Value::from_input(record.get(col).unwrap_or("")));
        }
    }

    let columns = names
        .into_iter()
        .zip(units)
        .zip(values)
        .map(|((name, unit), values)| {
            Column::new(
                name,
                ColumnMeta {
                    unit,
                    description: None,
                },
                values,
            )
        })
        .collect();

    Ok(Table::from_columns(columns)?)
}

fn header_names<'a>(fields: impl Iterator<Item = &'a str>) -> IoResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for (i, field) in fields.enumerate() {
        let name = field.trim().trim_start_matches('\u{feff}').to_string();
        if name.is_empty() {
            return Err(IoError::Header(format!("column {} has no name", i + 1)));
        }
        if !seen.insert(name.clone()) {
            return Err(IoError::Header(format!("duplicate column '{name}'")));
        }
        names.push(name);
    }
    Ok(names)
}

pub(crate) fn parse_unit(raw: &str) -> Option<String> {
    let unit = raw.trim();
    if unit.is_empty() || unit == "None" {
        None
    } else {
        Some(unit.to_string())
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub fn export(table: &Table, path: &Path) -> IoResult<()> {
    export_with_options(table, path, b',', false)
}

/// Export with a units row under the header, readable by [`import_with_units`].
pub fn export_with_units(table: &Table, path: &Path) -> IoResult<()> {
    export_with_options(table, path, b',', true)
}

pub fn export_tsv(table: &Table, path: &Path) -> IoResult<()> {
    export_with_options(table, path, b'\t', false)
}

fn export_with_options(table: &Table, path: &Path, delimiter: u8, units_row: bool) -> IoResult<()> {
    let file = std::fs::File::create(path).map_err(|e| IoError::file(path, e))?;
    write_table(table, file, delimiter, units_row)
}

pub fn export_to_string(table: &Table, units_row: bool) -> IoResult<String> {
    let mut buf = Vec::new();
    write_table(table, &mut buf, b',', units_row)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `table` as delimited text. Missing cells are empty fields.
pub fn write_table<W: Write>(table: &Table, writer: W, delimiter: u8, units_row: bool) -> IoResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer.write_record(table.column_names())?;
    if units_row {
        writer.write_record(
            table
                .columns()
                .iter()
                .map(|c| c.meta.unit.as_deref().unwrap_or("")),
        )?;
    }

    let mut record: Vec<String> = Vec::with_capacity(table.column_count());
    for row in 0..table.row_count() {
        record.clear();
        record.extend(table.columns().iter().map(|c| c.get(row).to_display()));
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| IoError::Csv(e.into()))?;
    Ok(())
}
