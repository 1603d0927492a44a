// End-to-end tests for `rowsync import` and `rowsync validate`.
// Run with: cargo test -p rowsync-cli --test import_cli

use std::path::Path;
use std::process::Command;

const SCHEMA: &str = r#"
[entities.categories.columns]
name = { type = "text", required = true }

[entities.items.columns]
name  = { type = "text", required = true }
price = { type = "float" }

[entities.items.belongs_to]
category = { entity = "categories" }
"#;

fn rowsync() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rowsync"))
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn import_args(schema: &Path, store: &Path, csv: &Path) -> Vec<String> {
    vec![
        "import".into(),
        csv.to_str().unwrap().into(),
        "--schema".into(),
        schema.to_str().unwrap().into(),
        "--store".into(),
        store.to_str().unwrap().into(),
        "--model".into(),
        "items".into(),
        "--uid".into(),
        "name".into(),
    ]
}

// ---------------------------------------------------------------------------
// import: create, then re-import updates
// ---------------------------------------------------------------------------

#[test]
fn import_creates_then_updates() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "catalog.toml", SCHEMA);
    let store = dir.path().join("store.json");
    let csv = write(dir.path(), "items.csv", "name,price\nBeer,2.5\n");

    let output = rowsync()
        .args(import_args(&schema, &store, &csv))
        .arg("--json")
        .output()
        .expect("rowsync import");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("valid JSON");
    assert_eq!(summary["created"], 1);
    assert_eq!(summary["failed"], 0);

    // snapshot written
    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(snapshot["tables"]["items"].as_array().unwrap().len(), 1);

    // second import with a new price is a pure update
    let csv = write(dir.path(), "items.csv", "name,price\nBeer,3.0\n");
    let output = rowsync()
        .args(import_args(&schema, &store, &csv))
        .arg("--json")
        .output()
        .expect("rowsync import (second)");
    assert!(output.status.success());

    let summary: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(summary["updated"], 1);
    assert_eq!(summary["created"], 0);

    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    let items = snapshot["tables"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["attrs"]["price"]["float"], 3.0);
}

// ---------------------------------------------------------------------------
// import: failed rows exit 1, store untouched by failing rows
// ---------------------------------------------------------------------------

#[test]
fn failed_rows_exit_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "catalog.toml", SCHEMA);
    let store = dir.path().join("store.json");
    // second row has no uid value
    let csv = write(dir.path(), "items.csv", "name,price\nBeer,2.5\n,9.9\n");

    let output = rowsync()
        .args(import_args(&schema, &store, &csv))
        .arg("--json")
        .output()
        .expect("rowsync import");
    assert_eq!(output.status.code(), Some(1));

    let summary: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(summary["created"], 1);
    assert_eq!(summary["failed"], 1);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing uid value"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// import: --delete-missing sweeps, --dry-run does not persist
// ---------------------------------------------------------------------------

#[test]
fn delete_missing_sweeps_absent_records() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "catalog.toml", SCHEMA);
    let store = dir.path().join("store.json");

    let csv = write(dir.path(), "seed.csv", "name\nBeer 1\nBeer 2\nWine 1\n");
    assert!(rowsync().args(import_args(&schema, &store, &csv)).output().unwrap().status.success());

    let csv = write(dir.path(), "keep.csv", "name\nBeer 1\n");
    let output = rowsync()
        .args(import_args(&schema, &store, &csv))
        .args(["--delete-missing", "--json"])
        .output()
        .expect("rowsync import --delete-missing");
    assert!(output.status.success());

    let summary: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(summary["deleted"], 2);

    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    let items = snapshot["tables"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["attrs"]["name"]["text"], "Beer 1");
}

#[test]
fn dry_run_leaves_snapshot_absent() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "catalog.toml", SCHEMA);
    let store = dir.path().join("store.json");
    let csv = write(dir.path(), "items.csv", "name\nBeer\n");

    let output = rowsync()
        .args(import_args(&schema, &store, &csv))
        .arg("--dry-run")
        .output()
        .expect("rowsync import --dry-run");
    assert!(output.status.success());
    assert!(!store.exists());
}

// ---------------------------------------------------------------------------
// usage errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_model_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "catalog.toml", SCHEMA);
    let store = dir.path().join("store.json");
    let csv = write(dir.path(), "items.csv", "name\nBeer\n");

    let output = rowsync()
        .args([
            "import",
            csv.to_str().unwrap(),
            "--schema",
            schema.to_str().unwrap(),
            "--store",
            store.to_str().unwrap(),
            "--model",
            "widgets",
        ])
        .output()
        .expect("rowsync import");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn malformed_default_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "catalog.toml", SCHEMA);
    let store = dir.path().join("store.json");
    let csv = write(dir.path(), "items.csv", "name\nBeer\n");

    let output = rowsync()
        .args(import_args(&schema, &store, &csv))
        .args(["--default", "price"])
        .output()
        .expect("rowsync import");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("FIELD=VALUE"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_entities() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "catalog.toml", SCHEMA);

    let output = rowsync()
        .args(["validate", schema.to_str().unwrap()])
        .output()
        .expect("rowsync validate");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("items"));
    assert!(stdout.contains("1 association(s)"));
}

#[test]
fn validate_rejects_bad_schema() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(
        dir.path(),
        "bad.toml",
        "[entities.items.belongs_to]\ncategory = { entity = \"categories\" }\n",
    );

    let output = rowsync()
        .args(["validate", schema.to_str().unwrap()])
        .output()
        .expect("rowsync validate");
    assert_eq!(output.status.code(), Some(2));
}
