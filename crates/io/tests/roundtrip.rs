use std::path::PathBuf;

use exofile_core::Value;
use exofile_io::csv::{export_to_string, export_with_units, import_from_string, import_with_units};
use tempfile::tempdir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn archive_sample_loads_with_units() {
    let table = import_with_units(&fixtures_dir().join("archive_sample.csv")).unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_count(), 7);
    assert_eq!(table.meta("pl_orbper").unwrap().unit.as_deref(), Some("day"));
    assert_eq!(table.meta("pl_name").unwrap().unit, None);
    assert_eq!(table.value(2, "pl_orbper"), &Value::Number(11.38014));
    assert!(table.value(1, "pl_rade").is_missing());
    assert!(table.value(0, "pl_refname").as_str().unwrap().contains("Collins et al. 2017"));
    assert_eq!(
        table.value(2, "disc_facility"),
        &Value::text("Transiting Exoplanet Survey Satellite (TESS)")
    );
}

#[test]
fn export_then_import_is_stable() {
    let dir = tempdir().unwrap();
    let original = import_with_units(&fixtures_dir().join("archive_sample.csv")).unwrap();

    let path = dir.path().join("copy.csv");
    export_with_units(&original, &path).unwrap();
    let reloaded = import_with_units(&path).unwrap();
    assert_eq!(reloaded, original);

    // Second pass writes byte-identical text.
    let first = export_to_string(&reloaded, true).unwrap();
    let again = import_with_units(&path).unwrap();
    assert_eq!(export_to_string(&again, true).unwrap(), first);
}

#[test]
fn numbers_keep_full_precision() {
    let table = import_from_string("x\n0.00000014\n1.0914222\n-3e-9\n", b',').unwrap();
    let text = export_to_string(&table, false).unwrap();
    let back = import_from_string(&text, b',').unwrap();
    assert_eq!(back, table);
}
