//! Integration tests for the replace CLI
//!
//! These tests run the actual binary against temp component / sheet files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn replace_cmd() -> Command {
    Command::cargo_bin("replace").unwrap()
}

const SHEET: &str = r#"
config:
  ttl_ticks: 1
  tick_millis: 1
values:
  name: Steve
  coins: [10, 20, 30]
"#;

#[test]
fn test_help_flag() {
    replace_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("placeholder"));
}

#[test]
fn test_scan_lists_tokens() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("greeting.json");
    fs::write(
        &file,
        r#"{"text": "Hi %name%, ", "extra": [{"text": "%coins_total% coins", "color": "gold"}]}"#,
    )
    .unwrap();

    replace_cmd()
        .args(["scan", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 placeholder(s)"))
        .stdout(predicate::str::contains("%name%"))
        .stdout(predicate::str::contains("%coins_total%"));
}

#[test]
fn test_scan_without_tokens() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("plain.json");
    fs::write(&file, r#"{"text": "nothing here"}"#).unwrap();

    replace_cmd()
        .args(["scan", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No placeholders"));
}

#[test]
fn test_scan_invalid_json_fails_with_fix() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("broken.json");
    fs::write(&file, "{not json").unwrap();

    replace_cmd()
        .args(["scan", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("REPLACE-030"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_scan_missing_file_fails() {
    replace_cmd()
        .args(["scan", "/nonexistent/component.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_render_resolves_tokens() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("greeting.json");
    let sheet = temp_dir.path().join("values.yaml");
    fs::write(&file, r#"{"text": "Hi %name_upper%, unknown %nope% stays"}"#).unwrap();
    fs::write(&sheet, SHEET).unwrap();

    replace_cmd()
        .args(["render", file.to_str().unwrap(), "--values", sheet.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hi STEVE, unknown %nope% stays"));
}

#[test]
fn test_render_json_keeps_structure() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("styled.json");
    let sheet = temp_dir.path().join("values.yaml");
    fs::write(&file, r#"{"text": "%name%", "color": "red", "bold": true}"#).unwrap();
    fs::write(&sheet, SHEET).unwrap();

    replace_cmd()
        .args([
            "render",
            file.to_str().unwrap(),
            "--values",
            sheet.to_str().unwrap(),
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""text":"Steve""#))
        .stdout(predicate::str::contains(r#""color":"red""#));
}

#[test]
fn test_render_stack_over_ticks() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("stack.json");
    let sheet = temp_dir.path().join("values.yaml");
    fs::write(
        &file,
        r#"{"id": "minecraft:gold_ingot", "name": {"text": "Wallet of %name%"}, "lore": [{"text": "%coins% coins"}]}"#,
    )
    .unwrap();
    fs::write(&sheet, SHEET).unwrap();

    replace_cmd()
        .args([
            "render",
            file.to_str().unwrap(),
            "--values",
            sheet.to_str().unwrap(),
            "--stack",
            "--ticks",
            "3",
            "--interval-ms",
            "20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wallet of Steve"))
        .stdout(predicate::str::contains("10 coins"))
        .stdout(predicate::str::contains("20 coins"))
        .stdout(predicate::str::contains("30 coins"));
}

#[test]
fn test_render_invalid_sheet_fails() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("greeting.json");
    let sheet = temp_dir.path().join("values.yaml");
    fs::write(&file, r#"{"text": "%name%"}"#).unwrap();
    fs::write(&sheet, "config:\n  ttl_ticks: lots\n").unwrap();

    replace_cmd()
        .args(["render", file.to_str().unwrap(), "--values", sheet.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("REPLACE-020"));
}
