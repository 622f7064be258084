// crates/security-gate-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for envelope, policy, and run commands.
// Purpose: Pin exit codes and key output lines CI pipelines rely on.
// Dependencies: security-gate-cli binary
// ============================================================================
//! ## Overview
//! Runs the `security-gate` binary against temporary input files.
//! Exit codes: 0 passed, 1 validation failed, 2 operational error.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn security_gate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_security-gate"))
}

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(security_gate_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("SECURITY_GATE_CONFIG")
        .output()
        .expect("run security-gate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_json(dir: &TempDir, name: &str, value: &Value) -> String {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn fresh_envelope() -> Value {
    let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap();
    json!({
        "version": 1,
        "algorithm": "XChaCha20Poly1305",
        "kdfParams": {"algorithm": "Argon2id", "memory": 131_072, "iterations": 3, "parallelism": 2},
        "salt": STANDARD.encode([7_u8; 32]),
        "nonce": STANDARD.encode([9_u8; 24]),
        "keyId": "v1_20231201_abc123",
        "aad": {
            "userId": "3f2b8c1e-9a4d-4e6f-8b7a-1c2d3e4f5a6b",
            "recordId": "r1",
            "tableName": "notes",
            "version": 1,
            "timestamp": now
        }
    })
}

fn short_salt_envelope() -> Value {
    let mut envelope = fresh_envelope();
    envelope["salt"] = Value::String(STANDARD.encode([7_u8; 16]));
    envelope
}

// ============================================================================
// SECTION: Policy
// ============================================================================

#[test]
fn policy_list_prints_every_preset() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["policy", "list"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    let names: Vec<&str> =
        text.lines().filter_map(|line| line.split_whitespace().next()).collect();
    assert_eq!(names, vec!["production", "staging", "development", "future-proof"]);
}

#[test]
fn policy_list_json_carries_toggles() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["policy", "list", "--format", "json"]);
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value[3]["name"], json!("future-proof"));
    assert_eq!(value[3]["config"]["quantumResistanceCheck"], json!(true));
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

#[test]
fn envelope_validate_passes_a_compliant_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(&dir, "envelope.json", &fresh_envelope());
    let output = run_cli(dir.path(), &["envelope", "validate", &file]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Status: VALID"));
    assert!(text.contains("  Key ID: v1_20231201_abc123"));
    assert!(text.ends_with("Summary: 1 envelopes, 1 valid, 0 invalid (0 errors, 0 warnings)\n"));
}

#[test]
fn envelope_validate_exits_one_for_invalid_envelopes() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(&dir, "batch.json", &json!([fresh_envelope(), short_salt_envelope()]));
    let output = run_cli(dir.path(), &["envelope", "validate", &file, "--policy", "production"]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("Salt too short: 16 bytes (minimum 32 bytes)"));
    assert!(text.contains("Summary: 2 envelopes, 1 valid, 1 invalid"));
}

#[test]
fn envelope_validate_json_output_reports_each_result() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(&dir, "batch.json", &json!([short_salt_envelope(), fresh_envelope()]));
    let output = run_cli(dir.path(), &["envelope", "validate", &file, "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["policy"], json!("staging"));
    assert_eq!(value["results"][0]["valid"], json!(false));
    assert_eq!(value["results"][1]["valid"], json!(true));
    assert_eq!(value["summary"]["invalid"], json!(1));
}

#[test]
fn envelope_validate_rejects_unknown_policy() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(&dir, "envelope.json", &fresh_envelope());
    let output = run_cli(dir.path(), &["envelope", "validate", &file, "--policy", "paranoid"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Unknown security policy: paranoid"));
}

#[test]
fn envelope_validate_reports_unreadable_input() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["envelope", "validate", "missing.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).starts_with("missing.json: "));

    let path = dir.path().join("broken.json");
    fs::write(&path, b"{not json").unwrap();
    let output = run_cli(dir.path(), &["envelope", "validate", "broken.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid JSON"));
}

// ============================================================================
// SECTION: Run
// ============================================================================

#[test]
fn run_selected_crypto_gate_passes() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_json(&dir, "input.json", &json!({"envelopes": [fresh_envelope()]}));
    let output = run_cli(dir.path(), &["run", "--input", &input, "--gate", "crypto-envelope"]);
    assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));
    let text = stdout(&output);
    assert!(text.starts_with("PASS crypto-envelope ("));
    assert!(text.ends_with("Gates: 1 total, 1 passed, 0 failed\n"));
}

#[test]
fn run_fails_on_leaky_capture() {
    let dir = tempfile::tempdir().unwrap();
    let input = json!({
        "envelopes": [fresh_envelope()],
        "capture": {
            "packets": [
                {"timestamp_ms": 0, "size": 90, "protocol": "http", "payload": "ssn 123-45-6789"},
                {"timestamp_ms": 40, "size": 90, "protocol": "http", "payload": "ok"}
            ]
        }
    });
    let input = write_json(&dir, "input.json", &input);
    let config = dir.path().join("gates.toml");
    fs::write(&config, "[runner]\nparallel = false\nfail_fast = false\n").unwrap();
    let config = config.to_string_lossy().into_owned();

    let output = run_cli(dir.path(), &["run", "--input", &input, "--config", &config]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.starts_with("PASS crypto-envelope ("));
    assert!(text.contains("FAIL network-security ("));
    assert!(!text.contains("123-45-6789"));
    assert!(text.ends_with("Gates: 2 total, 1 passed, 1 failed\n"));
}

#[test]
fn run_json_output_serializes_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_json(&dir, "input.json", &json!({"capture": {}}));
    let output = run_cli(
        dir.path(),
        &["run", "--input", &input, "--gate", "network-security", "--format", "json"],
    );
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["results"][0]["name"], json!("network-security"));
    assert_eq!(value["summary"]["total"], json!(1));
}

#[test]
fn run_reads_default_config_from_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("security-gate.toml"), "[runner]\ntimeout_ms = 0\n").unwrap();
    let input = write_json(&dir, "input.json", &json!({}));
    let output = run_cli(dir.path(), &["run", "--input", &input]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("runner.timeout_ms must be between 1 and 600000"));
}

#[test]
fn run_writes_file_audit_events() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_json(&dir, "input.json", &json!({"envelopes": [fresh_envelope()]}));
    let audit = dir.path().join("audit.jsonl");
    let config = dir.path().join("gates.toml");
    fs::write(&config, format!("[audit]\nsink = \"file\"\npath = {:?}\n", audit.to_string_lossy()))
        .unwrap();
    let config = config.to_string_lossy().into_owned();

    let output = run_cli(
        dir.path(),
        &["run", "--input", &input, "--config", &config, "--gate", "crypto-envelope"],
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let log = fs::read_to_string(&audit).unwrap();
    let events: Vec<Value> =
        log.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["gate_name"], json!("crypto-envelope"));
    assert_eq!(events[1]["event"], json!("gate_run"));
}
