// End-to-end tests for the `exofile` binary.
// Run with: cargo test -p exofile-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use exofile_core::Value;
use exofile_io::csv;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../merge/tests/fixtures")
        .join(name)
}

/// Binary with its own empty settings file, so the user's settings never leak in.
fn exofile(settings: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_exofile"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env("EXOFILE_SETTINGS", settings.path().join("settings.toml"));
    cmd.env_remove("EXOFILE_LOG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn merge_cmd(settings: &TempDir) -> Command {
    let mut cmd = exofile(settings);
    cmd.arg("merge")
        .arg(fixture("source_a.csv"))
        .arg(fixture("source_b.csv"))
        .arg("--config")
        .arg(fixture("orbit.merge.toml"))
        .args(["--epoch-jd", "2460000.5"]);
    cmd
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// merge
// ============================================================================

#[test]
fn merge_writes_table_and_references() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("exofile.csv");
    let refs = dir.path().join("refs.csv");

    let output = merge_cmd(&dir)
        .arg("--sheet")
        .arg(fixture("sheet.csv"))
        .arg("--custom")
        .arg(fixture("custom.csv"))
        .arg("--output")
        .arg(&out)
        .arg("--refs-output")
        .arg(&refs)
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("4 planets"));

    let table = csv::import_with_units(&out).unwrap();
    let x = table.index_of("pl_name", "X").unwrap();
    let period = table.value(x, "pl_orbper").as_f64().unwrap();
    assert!((period - 10.02).abs() < 1e-9);
    assert_eq!(table.meta("pl_orbper").unwrap().unit.as_deref(), Some("day"));
    let y = table.index_of("pl_name", "Y").unwrap();
    assert_eq!(table.value(y, "pl_masse"), &Value::Number(300.0));

    let refs = csv::import(&refs).unwrap();
    assert_eq!(refs.row_count(), table.row_count());
    assert_eq!(refs.value(x, "pl_orbper"), &Value::text("custom"));
    assert_eq!(refs.value(y, "pl_orbeccen"), &Value::text("Ref D"));
}

#[test]
fn merge_without_output_prints_csv() {
    let dir = TempDir::new().unwrap();
    let output = merge_cmd(&dir).output().unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("pl_name,pl_refname,pl_orbper"));
    assert_eq!(stdout.lines().count(), 2 + 4);
}

#[test]
fn merge_is_byte_identical_across_runs() {
    let dir = TempDir::new().unwrap();
    let first = merge_cmd(&dir).output().unwrap();
    let second = merge_cmd(&dir).output().unwrap();
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn merge_json_report() {
    let dir = TempDir::new().unwrap();
    let output = merge_cmd(&dir)
        .arg("--custom")
        .arg(fixture("custom.csv"))
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["entities"], 4);
    assert_eq!(report["split_groups"], 1);
    assert_eq!(report["meta"]["epoch_jd"], 2460000.5);
    assert_eq!(report["overrides"][0]["label"], "custom");
    assert_eq!(report["overrides"][0]["applied"], 1);
}

#[test]
fn merge_json_output_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("exofile.json");
    let output = merge_cmd(&dir).arg("--output").arg(&out).output().unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3]["pl_name"], "W");
    assert!(rows[3]["pl_orbper"].is_null());
}

#[test]
fn merge_falls_back_to_settings() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("from-settings.csv");

    let set = |key: &str, value: &Path| {
        let output = exofile(&dir)
            .args(["config", "set", key])
            .arg(value)
            .output()
            .unwrap();
        assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    };
    set("custom_file", &fixture("custom.csv"));
    set("exofile", &out);

    let output = merge_cmd(&dir).output().unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());

    let table = csv::import_with_units(&out).unwrap();
    let x = table.index_of("pl_name", "X").unwrap();
    assert!((table.value(x, "pl_orbper").as_f64().unwrap() - 10.02).abs() < 1e-9);
}

#[test]
fn merge_missing_source_is_io_error() {
    let dir = TempDir::new().unwrap();
    let output = exofile(&dir)
        .args(["merge", "no-such-file.csv", "--epoch-jd", "2460000.5"])
        .output()
        .unwrap();
    assert_eq!(code(&output), 5);
    assert!(stderr(&output).starts_with("error: "));
}

#[test]
fn merge_missing_entity_column_is_table_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("merge.toml");
    std::fs::write(&config, "entity_column = \"hostname\"\n").unwrap();

    let output = exofile(&dir)
        .arg("merge")
        .arg(fixture("source_a.csv"))
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(code(&output), 4);
    assert!(stderr(&output).contains("hostname"));
    assert!(stderr(&output).contains("hint:"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn validate_accepts_good_config() {
    let dir = TempDir::new().unwrap();
    let output = exofile(&dir)
        .arg("validate")
        .arg(fixture("orbit.merge.toml"))
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("1 groups"));
}

#[test]
fn validate_rejects_overlapping_groups() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(
        &config,
        r#"
[[groups]]
name = "orbit"
columns = ["pl_orbper", "pl_orbeccen"]

[[groups]]
name = "transit"
columns = ["pl_orbper", "pl_trandur"]
"#,
    )
    .unwrap();

    let output = exofile(&dir).arg("validate").arg(&config).output().unwrap();
    assert_eq!(code(&output), 3);
}

#[test]
fn validate_rejects_unknown_field() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("typo.toml");
    std::fs::write(&config, "entity_colum = \"pl_name\"\n").unwrap();

    let output = exofile(&dir).arg("validate").arg(&config).output().unwrap();
    assert_eq!(code(&output), 3);
}

// ============================================================================
// lookup
// ============================================================================

fn merged_fixture(dir: &TempDir) -> (PathBuf, PathBuf) {
    let out = dir.path().join("exofile.csv");
    let refs = dir.path().join("refs.csv");
    let output = merge_cmd(dir)
        .arg("--output")
        .arg(&out)
        .arg("--refs-output")
        .arg(&refs)
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    (out, refs)
}

#[test]
fn lookup_prints_row_with_units_and_references() {
    let dir = TempDir::new().unwrap();
    let (table, refs) = merged_fixture(&dir);

    let output = exofile(&dir)
        .arg("lookup")
        .arg(&table)
        .arg("Y")
        .arg("--refs")
        .arg(&refs)
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let eccen = stdout.lines().find(|l| l.starts_with("pl_orbeccen")).unwrap();
    assert!(eccen.contains("0.05"));
    assert!(eccen.ends_with("(Ref D)"));
    let period = stdout.lines().find(|l| l.starts_with("pl_orbper ")).unwrap();
    assert!(period.contains("5 day"));
}

#[test]
fn lookup_json() {
    let dir = TempDir::new().unwrap();
    let (table, _) = merged_fixture(&dir);

    let output = exofile(&dir)
        .arg("lookup")
        .arg(&table)
        .arg("W")
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let row: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(row["pl_name"], "W");
    assert_eq!(row["pl_rade"], 4.1);

    // Keys come out in table column order, not sorted.
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.find("\"pl_refname\"").unwrap() < stdout.find("\"pl_orbper\"").unwrap());
}

#[test]
fn lookup_unknown_name() {
    let dir = TempDir::new().unwrap();
    let (table, _) = merged_fixture(&dir);

    let output = exofile(&dir).arg("lookup").arg(&table).arg("Q").output().unwrap();
    assert_eq!(code(&output), 6);
    assert!(stderr(&output).contains("'Q'"));
}

// ============================================================================
// version
// ============================================================================

#[test]
fn long_version_names_build() {
    let dir = TempDir::new().unwrap();
    let output = exofile(&dir).arg("--version").output().unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with(&format!("exofile {}", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.contains("\ntarget:  "));
    let profile = stdout.lines().find(|l| l.starts_with("build:")).unwrap();
    assert!(profile.ends_with("debug") || profile.ends_with("release"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn config_set_get_reset() {
    let dir = TempDir::new().unwrap();

    let output = exofile(&dir).args(["config", "set", "sheet_key", "abc123"]).output().unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let output = exofile(&dir).args(["config", "get", "sheet_key"]).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "abc123");

    let output = exofile(&dir).args(["config", "show"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    assert!(stdout.contains("sheet_key = abc123"));
    assert!(stdout.contains("url = (unset)"));

    let output = exofile(&dir).args(["config", "reset"]).output().unwrap();
    assert_eq!(code(&output), 0);
    assert!(!dir.path().join("settings.toml").exists());
}

#[test]
fn config_unknown_key_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = exofile(&dir).args(["config", "set", "colour", "blue"]).output().unwrap();
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn config_path_honours_env() {
    let dir = TempDir::new().unwrap();
    let output = exofile(&dir).args(["config", "path"]).output().unwrap();
    let printed = String::from_utf8(output.stdout).unwrap();
    assert_eq!(PathBuf::from(printed.trim()), dir.path().join("settings.toml"));
}
