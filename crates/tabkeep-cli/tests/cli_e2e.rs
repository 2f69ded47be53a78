#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn tabkeep(dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("tabkeep"));
    cmd.env("TABKEEP_DATA_DIR", dir.path())
        .env_remove("RUST_LOG")
        .env_remove("TABKEEP_QUOTA_BYTES")
        .env_remove("TABKEEP_BACKUP_POLICY");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

fn save(dir: &TempDir, url: &str, title: &str) -> String {
    let response = json_output(tabkeep(dir).args(["save", url, title]));
    assert_eq!(response["success"], true);
    response["data"]["id"].as_str().unwrap().to_string()
}

#[test]
fn test_save_then_list() {
    let dir = TempDir::new().unwrap();

    tabkeep(&dir)
        .args(["save", "https://example.com/rust", "Rust Book", "-t", "Rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("\"domain\": \"example.com\""));

    tabkeep(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust Book"))
        .stdout(predicate::str::contains("\"rust\""));

    assert!(dir.path().join("savedPages.json").exists());
}

#[test]
fn test_invalid_page_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    tabkeep(&dir)
        .args(["save", "not a url", "Title"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"));
}

#[test]
fn test_show_missing_page_fails() {
    let dir = TempDir::new().unwrap();
    tabkeep(&dir)
        .args(["show", "nope"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Page not found: nope"));
}

#[test]
fn test_delete_then_recover() {
    let dir = TempDir::new().unwrap();
    let id = save(&dir, "https://example.com/a", "A");

    tabkeep(&dir)
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"deleted\""));

    let backups = json_output(tabkeep(&dir).arg("backups"));
    assert_eq!(backups["data"].as_array().unwrap().len(), 1);
    assert_eq!(backups["data"][0]["reason"], "before_delete");

    tabkeep(&dir)
        .arg("recover")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"recoveredPageCount\": 1"));

    let list = json_output(tabkeep(&dir).arg("list"));
    assert_eq!(list["data"][0]["id"], id.as_str());
}

#[test]
fn test_query_filters_and_paginates() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        save(&dir, &format!("https://a.example/{}", i), &format!("A{}", i));
    }
    save(&dir, "https://b.example/x", "B");

    let result = json_output(tabkeep(&dir).args([
        "query",
        "--domain",
        "a.example",
        "--limit",
        "2",
    ]));
    assert_eq!(result["data"]["totalCount"], 5);
    assert_eq!(result["data"]["filteredCount"], 2);
    assert_eq!(result["data"]["hasMore"], true);
}

#[test]
fn test_tag_batch() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "https://example.com/a", "A");
    let b = save(&dir, "https://example.com/b", "B");

    let report = json_output(tabkeep(&dir).args(["tag", "add", "Later", &a, &b, "ghost"]));
    assert_eq!(report["data"]["affected"], 2);
    assert_eq!(report["data"]["missing"], serde_json::json!(["ghost"]));

    tabkeep(&dir)
        .args(["search", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"later\""));
}

#[test]
fn test_export_import_between_stores() {
    let source = TempDir::new().unwrap();
    save(&source, "https://example.com/a", "A");
    save(&source, "https://example.com/b", "B");

    let out = TempDir::new().unwrap();
    let export_file = out.path().join("export.json");
    tabkeep(&source)
        .arg("export")
        .arg(&export_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pageCount\": 2"));

    let target = TempDir::new().unwrap();
    let report = json_output(tabkeep(&target).arg("import").arg(&export_file));
    assert_eq!(report["success"], true);
    assert_eq!(report["data"]["imported"], 2);
    assert_eq!(report["data"]["totalPages"], 2);
}

#[test]
fn test_import_rejects_non_export_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("junk.json");
    fs::write(&file, "this is not json").unwrap();

    tabkeep(&dir)
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_settings_set_and_reset() {
    let dir = TempDir::new().unwrap();

    tabkeep(&dir)
        .args(["settings", "set", r#"{"theme": "dark", "maxStorageItems": 50}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"theme\": \"dark\""));

    tabkeep(&dir)
        .args(["settings", "set", r#"{"theme": "purple"}"#])
        .assert()
        .failure();

    let reset = json_output(tabkeep(&dir).args(["settings", "reset"]));
    assert_eq!(reset["data"]["theme"], "auto");
}

#[test]
fn test_config_file_quota_shows_in_info() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tabkeep.toml"), "quota_bytes = 1000000\n").unwrap();

    let info = json_output(tabkeep(&dir).arg("info"));
    assert_eq!(info["data"]["quota"]["quotaBytes"], 1_000_000);
}

#[test]
fn test_clear_removes_everything() {
    let dir = TempDir::new().unwrap();
    save(&dir, "https://example.com/a", "A");

    tabkeep(&dir).arg("clear").assert().success();
    let list = json_output(tabkeep(&dir).arg("list"));
    assert_eq!(list["data"], serde_json::json!([]));
}
