//! `exofile merge` and `exofile validate`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use exofile_core::Table;
use exofile_io::{csv, json, sheet};
use exofile_merge::{MergeConfig, MergeReport, MergedTable, OverrideSource, SourceTable};

use crate::config_cmd::load_settings;
use crate::CliError;

/// Julian date of 1970-01-01T00:00Z.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Override labels, in application order.
const SHEET_LABEL: &str = "sheet";
const CUSTOM_LABEL: &str = "custom";

pub struct MergeArgs {
    pub sources: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub sheet: Option<PathBuf>,
    pub custom: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub refs_output: Option<PathBuf>,
    pub json: bool,
    pub epoch_jd: Option<f64>,
    pub units_row: bool,
    pub settings: Option<PathBuf>,
}

pub fn cmd_merge(args: MergeArgs) -> Result<(), CliError> {
    let settings = load_settings(args.settings.as_deref())?;

    let mut config = match args.config.or(settings.merge_config) {
        Some(path) => load_config(&path)?,
        None => MergeConfig::default(),
    };
    config.epoch_jd = args
        .epoch_jd
        .or(config.epoch_jd)
        .or_else(|| Some(julian_date(Utc::now())));

    let sources = args
        .sources
        .iter()
        .map(|path| load_source(path, args.units_row))
        .collect::<Result<Vec<_>, _>>()?;

    let mut overrides = Vec::new();
    if let Some(path) = args.sheet.or(settings.sheet_file) {
        let table = sheet::import_sheet_export(&path, true).map_err(CliError::file)?;
        overrides.push(override_source(SHEET_LABEL, &path, &table, &config)?);
    }
    if let Some(path) = args.custom.or(settings.custom_file) {
        let table = csv::import_with_units(&path).map_err(CliError::file)?;
        overrides.push(override_source(CUSTOM_LABEL, &path, &table, &config)?);
    }

    let merged = exofile_merge::run(&sources, &overrides, &config).map_err(CliError::merge)?;

    match args.output.or(settings.exofile) {
        Some(path) => {
            write_merged(merged.table(), &path)?;
            eprintln!("wrote {}", path.display());
        }
        None if !args.json => {
            let text = csv::export_to_string(merged.table(), true).map_err(CliError::file)?;
            print!("{text}");
        }
        None => {}
    }

    if let Some(path) = args.refs_output.or(settings.ref_file) {
        csv::export(&merged.reference_table(), &path).map_err(CliError::file)?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(merged.report())
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&merged);
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "{}: valid ({} groups, {} ranking keys, entity '{}', reference '{}')",
        config_path.display(),
        config.groups.len(),
        config.ranking.keys.len(),
        config.entity_column,
        config.reference_column,
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<MergeConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    MergeConfig::from_toml(&text)
        .map_err(|e| CliError::merge(e).with_hint(format!("in {}", path.display())))
}

fn load_source(path: &Path, units_row: bool) -> Result<SourceTable, CliError> {
    let table = if units_row {
        csv::import_with_units(path)
    } else {
        csv::import(path)
    }
    .map_err(CliError::file)?;
    tracing::debug!(path = %path.display(), rows = table.row_count(), "loaded source");
    Ok(SourceTable::new(path.display().to_string(), table))
}

fn override_source(
    label: &str,
    path: &Path,
    table: &Table,
    config: &MergeConfig,
) -> Result<OverrideSource, CliError> {
    OverrideSource::from_table(label, table, &config.entity_column)
        .map_err(|e| CliError::merge(e).with_hint(format!("in {}", path.display())))
}

/// `.json` gets row objects; anything else is CSV with a units row.
fn write_merged(table: &Table, path: &Path) -> Result<(), CliError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        json::export(table, path)
    } else {
        csv::export_with_units(table, path)
    }
    .map_err(CliError::file)
}

fn print_summary(merged: &MergedTable) {
    let report: &MergeReport = merged.report();
    eprintln!(
        "merged {} sources: {} planets, {} columns; {} cells filled, {} backfilled, {} split groups, {} masked",
        report.sources.len(),
        report.entities,
        report.columns,
        report.filled_cells,
        report.backfilled_cells,
        report.split_groups,
        report.masked_cells,
    );
    for o in &report.overrides {
        eprintln!(
            "override {}: {} applied, {} empty skipped, {} planets added, {} columns added",
            o.label, o.applied, o.skipped_missing, o.added_rows, o.added_columns,
        );
    }
}

/// Julian date of an instant.
pub fn julian_date(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JD
}
