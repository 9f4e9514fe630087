use std::path::PathBuf;

use exofile_core::Value;
use exofile_io::csv::{export_to_string, import_with_units};
use exofile_io::sheet::import_sheet_export;
use exofile_merge::{merge, run, MergeConfig, MergedTable, OverrideSource, SourceTable};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config() -> MergeConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("orbit.merge.toml")).unwrap();
    MergeConfig::from_toml(&toml).unwrap()
}

fn sources() -> Vec<SourceTable> {
    ["source_a.csv", "source_b.csv"]
        .iter()
        .map(|file| {
            let path = fixtures_dir().join(file);
            let table = import_with_units(&path)
                .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
            SourceTable::new(*file, table)
        })
        .collect()
}

fn overrides() -> Vec<OverrideSource> {
    let dir = fixtures_dir();
    let sheet = import_sheet_export(&dir.join("sheet.csv"), true).unwrap();
    let custom = import_with_units(&dir.join("custom.csv")).unwrap();
    vec![
        OverrideSource::from_table("sheet", &sheet, "pl_name").unwrap(),
        OverrideSource::from_table("custom", &custom, "pl_name").unwrap(),
    ]
}

fn num(merged: &MergedTable, entity: &str, column: &str) -> Option<f64> {
    merged.value(entity, column).and_then(Value::as_f64)
}

// -------------------------------------------------------------------------
// Merge
// -------------------------------------------------------------------------

#[test]
fn full_group_comes_from_best_reference() {
    let merged = merge(&sources(), &config()).unwrap();

    assert_eq!(merged.value("X", "pl_refname"), Some(&Value::text("Ref A")));
    assert_eq!(num(&merged, "X", "pl_orbper"), Some(10.0));
    assert_eq!(num(&merged, "X", "pl_orbeccen"), Some(0.1));
    for column in ["pl_orbper", "pl_orbpererr1", "pl_orbpererr2", "pl_orbeccen"] {
        assert_eq!(merged.reference_of("X", column), Some("Ref A"), "{column}");
    }
}

#[test]
fn group_gap_backfilled_from_next_reference() {
    let merged = merge(&sources(), &config()).unwrap();

    assert_eq!(num(&merged, "Y", "pl_orbper"), Some(5.0));
    assert_eq!(merged.reference_of("Y", "pl_orbper"), Some("Ref C"));
    assert_eq!(num(&merged, "Y", "pl_orbeccen"), Some(0.05));
    assert_eq!(merged.reference_of("Y", "pl_orbeccen"), Some("Ref D"));
    assert_eq!(merged.report().split_groups, 1);
}

#[test]
fn plain_columns_use_best_available_reference() {
    let merged = merge(&sources(), &config()).unwrap();

    assert_eq!(num(&merged, "X", "pl_rade"), Some(2.5));
    assert_eq!(merged.reference_of("X", "pl_rade"), Some("Ref B"));
    assert_eq!(num(&merged, "Y", "pl_rade"), Some(1.2));
    assert_eq!(num(&merged, "X", "pl_trandur"), Some(3.0));
    assert!(merged.value("Z", "pl_trandur").unwrap().is_missing());
}

#[test]
fn one_row_per_entity_and_union_of_columns() {
    let merged = merge(&sources(), &config()).unwrap();

    assert_eq!(merged.entities().collect::<Vec<_>>(), vec!["X", "Y", "Z", "W"]);
    assert_eq!(
        merged.table().column_names().collect::<Vec<_>>(),
        vec![
            "pl_name",
            "pl_refname",
            "pl_orbper",
            "pl_orbpererr1",
            "pl_orbpererr2",
            "pl_orbeccen",
            "pl_rade",
            "pl_trandur",
        ]
    );
    assert_eq!(merged.table().meta("pl_orbper").unwrap().unit.as_deref(), Some("day"));

    let report = merged.report();
    assert_eq!(report.entities, 4);
    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[1].rows, 3);
    assert_eq!(report.meta.groups, 1);
}

#[test]
fn merging_twice_is_identical() {
    let first = merge(&sources(), &config()).unwrap();
    let second = merge(&sources(), &config()).unwrap();

    assert_eq!(first.table(), second.table());
    assert_eq!(
        export_to_string(first.table(), true).unwrap(),
        export_to_string(second.table(), true).unwrap()
    );
    assert_eq!(first.reference_table(), second.reference_table());
}

#[test]
fn reference_table_mirrors_merged_table() {
    let merged = merge(&sources(), &config()).unwrap();
    let refs = merged.reference_table();

    assert_eq!(refs.row_count(), merged.entity_count());
    assert_eq!(
        refs.column_names().collect::<Vec<_>>(),
        merged.table().column_names().collect::<Vec<_>>()
    );
    let y = merged.row_index("Y").unwrap();
    assert_eq!(refs.value(y, "pl_name"), &Value::text("Y"));
    assert_eq!(refs.value(y, "pl_orbeccen"), &Value::text("Ref D"));
    assert!(refs.value(y, "pl_trandur").as_str().is_some());
}

#[test]
fn lookup_by_partial_name() {
    let merged = merge(&sources(), &config()).unwrap();
    let row = merged.row("W").unwrap();
    assert!(row.contains(&("pl_rade".to_string(), Value::Number(4.1))));
}

// -------------------------------------------------------------------------
// Overrides
// -------------------------------------------------------------------------

#[test]
fn custom_file_wins_over_sheet() {
    let merged = run(&sources(), &overrides(), &config()).unwrap();

    // 240.48 hours in the custom file.
    let period = num(&merged, "X", "pl_orbper").unwrap();
    assert!((period - 10.02).abs() < 1e-9);
    assert_eq!(merged.reference_of("X", "pl_orbper"), Some("custom"));
}

#[test]
fn empty_override_cells_do_not_erase() {
    let merged = run(&sources(), &overrides(), &config()).unwrap();

    assert_eq!(num(&merged, "Y", "pl_orbper"), Some(5.0));
    assert_eq!(num(&merged, "X", "pl_rade"), Some(2.5));
    assert_eq!(merged.reference_of("X", "pl_rade"), Some("Ref B"));
}

#[test]
fn override_columns_are_added() {
    let merged = run(&sources(), &overrides(), &config()).unwrap();

    assert_eq!(num(&merged, "Y", "pl_masse"), Some(300.0));
    assert_eq!(merged.table().meta("pl_masse").unwrap().unit.as_deref(), Some("earthMass"));
    assert!(merged.value("Z", "pl_masse").unwrap().is_missing());

    let summaries = &merged.report().overrides;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].label, "sheet");
    assert_eq!(summaries[0].added_columns, 1);
    assert_eq!(summaries[1].applied, 1);
}
