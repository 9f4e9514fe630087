// Crowdsourced sheet exports: CSV whose headers read "name [unit]"

use std::path::Path;

use exofile_core::{ColumnMeta, Table};

use crate::csv::{import_from_string, parse_unit, read_file_as_utf8, sniff_delimiter};
use crate::error::IoResult;

/// Split a `"name [unit]"` header. `None` and empty units mean no unit.
pub fn split_header(header: &str) -> (String, Option<String>) {
    match header.split_once(" [") {
        Some((name, rest)) => {
            let unit = rest.split(']').next().unwrap_or("");
            (name.trim().to_string(), parse_unit(unit))
        }
        None => (header.trim().to_string(), None),
    }
}

/// Load a sheet export and move the units from the headers into column metadata.
///
/// With `keep_units` false every unit is dropped, as for the reference sheet.
pub fn import_sheet_export(path: &Path, keep_units: bool) -> IoResult<Table> {
    let content = read_file_as_utf8(path)?;
    import_sheet_from_string(&content, keep_units)
}

pub fn import_sheet_from_string(content: &str, keep_units: bool) -> IoResult<Table> {
    let mut table = import_from_string(content, sniff_delimiter(content))?;

    let headers: Vec<String> = table.column_names().map(str::to_string).collect();
    for header in headers {
        let (name, unit) = split_header(&header);
        if name != header {
            table.rename_column(&header, &name)?;
        }
        let meta = ColumnMeta {
            unit: unit.filter(|_| keep_units),
            ..table.meta(&name).cloned().unwrap_or_default()
        };
        table.set_meta(&name, meta)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exofile_core::Value;

    #[test]
    fn split_header_variants() {
        assert_eq!(split_header("pl_orbper [day]"), ("pl_orbper".into(), Some("day".into())));
        assert_eq!(split_header("pl_name [None]"), ("pl_name".into(), None));
        assert_eq!(split_header("pl_name"), ("pl_name".into(), None));
        assert_eq!(split_header("pl_masse [earthMass"), ("pl_masse".into(), Some("earthMass".into())));
    }

    #[test]
    fn sheet_headers_become_units() {
        let content = "pl_name [None],pl_orbper [day],pl_refname [None]\nWASP-12 b,1.0914,Custom 2024\n";
        let t = import_sheet_from_string(content, true).unwrap();
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["pl_name", "pl_orbper", "pl_refname"]);
        assert_eq!(t.meta("pl_orbper").unwrap().unit.as_deref(), Some("day"));
        assert_eq!(t.value(0, "pl_orbper"), &Value::Number(1.0914));

        let t = import_sheet_from_string(content, false).unwrap();
        assert_eq!(t.meta("pl_orbper").unwrap().unit, None);
    }
}
