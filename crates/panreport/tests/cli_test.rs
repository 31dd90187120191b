//! Integration tests for the `panreport` CLI binary.
//!
//! Argument parsing, catalog listing, settings persistence and artifact
//! management, all without a live firewall.
#![allow(clippy::unwrap_used)]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `panreport` binary with env isolation.
///
/// Points HOME and the XDG config dir at `home`, clears `PANREPORT_*`
/// variables, and routes settings and exports into the temp dir.
fn panreport_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("panreport");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("PANREPORT_OUTPUT")
        .env_remove("PANREPORT_API_KEY")
        .env_remove("PANREPORT_VAULT_KEY")
        .env_remove("PANREPORT_REPORTS_DIR")
        .env_remove("PANREPORT_SETTINGS_FILE")
        .env_remove("PANREPORT_INSECURE")
        .env_remove("PANREPORT_TIMEOUT")
        .env_remove("RUST_LOG")
        .arg("--settings")
        .arg(home.path().join("settings.json"))
        .arg("--reports-dir")
        .arg(home.path().join("Reports"));
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = cargo_bin_cmd!("panreport").output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("generate")
            .and(predicate::str::contains("batch"))
            .and(predicate::str::contains("search"))
            .and(predicate::str::contains("filter")),
    );
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Catalog ─────────────────────────────────────────────────────────

#[test]
fn test_types_plain() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["types", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("securityRules")
                .and(predicate::str::contains("traffic"))
                .and(predicate::str::contains("systemInfo")),
        );
}

#[test]
fn test_types_by_category() {
    let home = TempDir::new().unwrap();
    let output = panreport_cmd(&home)
        .args(["types", "--category", "logs", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("threat"));
    assert!(!stdout.contains("securityRules"));
}

#[test]
fn test_unknown_category_is_usage_error() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["types", "--category", "bogus"])
        .assert()
        .code(2);
}

// ── Settings ────────────────────────────────────────────────────────

#[test]
fn test_generate_without_settings_fails() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["generate", "securityRules"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn test_config_set_then_show() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args([
            "config",
            "set",
            "--url",
            "https://fw01.example.net/",
            "--api-key",
            "LUFRPT1secret",
            "--max-rows",
            "250",
            "--format",
            "complete",
        ])
        .assert()
        .success();

    let raw = fs::read_to_string(home.path().join("settings.json")).unwrap();
    assert!(!raw.contains("LUFRPT1secret"), "API key stored in clear");

    panreport_cmd(&home)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"api_url\": \"https://fw01.example.net\"")
                .and(predicate::str::contains("\"api_key_set\": true"))
                .and(predicate::str::contains("\"max_rows\": 250"))
                .and(predicate::str::contains("\"format\": \"complete\""))
                .and(predicate::str::contains("LUFRPT1secret").not()),
        );
}

#[test]
fn test_config_set_replaces_unreadable_key() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("settings.json"),
        r#"{"api_url": "https://fw01.example.net", "encrypted_key": "AAAA", "max_rows": 250}"#,
    )
    .unwrap();

    panreport_cmd(&home)
        .args(["generate", "securityRules"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("could not be decrypted"));

    panreport_cmd(&home)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"api_key_set\": false"));

    panreport_cmd(&home)
        .args([
            "config",
            "set",
            "--url",
            "https://fw02.example.net",
            "--api-key",
            "LUFRPT1fresh",
        ])
        .assert()
        .success();

    panreport_cmd(&home)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"api_url\": \"https://fw02.example.net\"")
                .and(predicate::str::contains("\"api_key_set\": true"))
                .and(predicate::str::contains("\"max_rows\": 250")),
        );
}

#[test]
fn test_connection_probe_failures_exit_nonzero() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["test", "-o", "plain"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("unconfigured"));

    panreport_cmd(&home)
        .args(["config", "set", "--url", "http://127.0.0.1:9", "--api-key", "k"])
        .assert()
        .success();
    panreport_cmd(&home)
        .args(["test", "-o", "plain"])
        .assert()
        .code(7)
        .stdout(predicate::str::contains("error"));
}

#[test]
fn test_config_set_rejects_bad_url() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["config", "set", "--url", "not a url", "--api-key", "k"])
        .assert()
        .code(2);
}

#[test]
fn test_config_path() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("settings.json"));
}

// ── Arguments ───────────────────────────────────────────────────────

#[test]
fn test_filter_requires_field_value_pairs() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["filter", "securityRules", "--where", "action"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("FIELD=VALUE"));
}

#[test]
fn test_half_date_range_rejected_by_parser() {
    let home = TempDir::new().unwrap();
    let output = panreport_cmd(&home)
        .args(["generate", "traffic", "--start", "2024-06-01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--end"));
}

#[test]
fn test_invalid_batch_format() {
    let home = TempDir::new().unwrap();
    panreport_cmd(&home)
        .args(["batch", "zones", "--format", "xlsx"])
        .assert()
        .failure();
}

// ── Artifacts ───────────────────────────────────────────────────────

#[test]
fn test_reports_list_and_delete() {
    let home = TempDir::new().unwrap();
    let reports = home.path().join("Reports");
    fs::create_dir_all(&reports).unwrap();
    fs::write(reports.join("zones_20240601_101500.csv"), "a,b\n").unwrap();

    panreport_cmd(&home)
        .args(["reports", "history", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"report_type\": \"zones\""));

    // Non-interactive delete needs --yes.
    panreport_cmd(&home)
        .args(["reports", "delete", "zones_20240601_101500.csv"])
        .write_stdin("")
        .assert()
        .code(2);
    assert!(reports.join("zones_20240601_101500.csv").exists());

    panreport_cmd(&home)
        .args(["--yes", "reports", "delete", "zones_20240601_101500.csv"])
        .assert()
        .success();
    assert!(!reports.join("zones_20240601_101500.csv").exists());

    panreport_cmd(&home)
        .args(["reports", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
