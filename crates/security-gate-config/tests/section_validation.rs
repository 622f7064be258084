//! Section validation tests for security-gate-config.
// crates/security-gate-config/tests/section_validation.rs
// =============================================================================
// Module: Config Section Validation Tests
// Description: Validate per-section ranges and exclusivity rules.
// Purpose: Ensure invalid settings fail closed with specific messages.
// =============================================================================

#![allow(clippy::use_debug, reason = "Failure messages include debug-formatted settings.")]

use security_gate_config::AuditSinkKind;
use security_gate_config::SecurityGateConfig;
use security_gate_core::SecurityGate;
use security_gate_crypto::SecurityPolicy;

type TestResult = Result<(), String>;

fn expect_error(content: &str, needle: &str) -> TestResult {
    match SecurityGateConfig::from_toml(content) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected {needle} for {content}")),
    }
}

#[test]
fn runner_timeout_must_be_in_range() -> TestResult {
    expect_error("[runner]\ntimeout_ms = 0", "runner.timeout_ms must be between 1 and 600000")?;
    expect_error("[runner]\ntimeout_ms = 600001", "runner.timeout_ms must be between 1 and 600000")?;
    expect_error("[testing]\ntimeout_ms = 0", "testing.timeout_ms must be between 1 and 600000")
}

#[test]
fn runner_retries_are_capped() -> TestResult {
    expect_error("[runner]\nretries = 11", "runner.retries must be between 0 and 10")
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    expect_error("[runner]\nworkers = 4", "config parse error")?;
    expect_error("[telemetry]\nenabled = true", "config parse error")?;
    expect_error("[runner]\nenvironment = \"qa\"", "config parse error")
}

#[test]
fn file_audit_sink_requires_path() -> TestResult {
    expect_error("[audit]\nsink = \"file\"", "audit.path is required for the file sink")?;
    expect_error("[audit]\nsink = \"stderr\"\npath = \"audit.log\"", "only valid for the file sink")?;
    expect_error("[audit]\nsink = \"file\"\npath = \"  \"", "audit.path must be non-empty")
}

#[test]
fn file_audit_sink_builds_and_appends() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("audit.log");
    let content = format!("[audit]\nsink = \"file\"\npath = {:?}", path.to_string_lossy());
    let config = SecurityGateConfig::from_toml(&content).map_err(|err| err.to_string())?;
    if config.audit.sink != AuditSinkKind::File {
        return Err("file sink not selected".to_string());
    }
    config.audit.build_sink().map_err(|err| err.to_string())?;
    if !path.exists() {
        return Err("audit log was not created".to_string());
    }
    Ok(())
}

#[test]
fn crypto_policy_must_be_known() -> TestResult {
    expect_error("[crypto]\npolicy = \"paranoid\"", "crypto.policy: Unknown security policy: paranoid")
}

#[test]
fn crypto_policy_excludes_toggles() -> TestResult {
    expect_error(
        "[crypto]\npolicy = \"staging\"\nstrict_mode = true",
        "crypto.policy cannot be combined with explicit toggles",
    )
}

#[test]
fn crypto_toggles_override_staging_defaults() -> TestResult {
    let config = SecurityGateConfig::from_toml("[crypto]\nstrict_mode = true\nallow_warnings = false")
        .map_err(|err| err.to_string())?;
    let settings = config.crypto.settings().map_err(|err| err.to_string())?;
    let staging = SecurityPolicy::Staging.config();
    if !settings.strict_mode || settings.allow_warnings {
        return Err(format!("toggles not applied: {settings:?}"));
    }
    if settings.timing_attack_check != staging.timing_attack_check {
        return Err("unset toggles should keep staging defaults".to_string());
    }
    let gate = config.crypto.build_gate().map_err(|err| err.to_string())?;
    if gate.policy_label() != "custom" {
        return Err(format!("expected custom policy label, got {}", gate.policy_label()));
    }
    Ok(())
}

#[test]
fn network_section_is_validated() -> TestResult {
    expect_error("[network]\nrisk_threshold = 101", "network: risk_threshold must be between 0 and 100")?;
    expect_error(
        "[network]\npii_detection = false\nencryption_ratio = false\ntls_strength = false\nmetadata_leakage = false",
        "network: at least one network analyzer must be enabled",
    )
}

#[test]
fn testing_section_configures_testing_gate() -> TestResult {
    let config = SecurityGateConfig::from_toml(
        "[testing]\nparallel = false\nfail_fast = false\ntimeout_ms = 1234\nretries = 2",
    )
    .map_err(|err| err.to_string())?;
    let gate = config.build_testing_gate();
    let settings = gate.config();
    if settings["timeout_ms"] != 1234 || settings["retries"] != 2 {
        return Err(format!("testing runner settings not applied: {settings}"));
    }
    if settings["parallel"] != false || settings["fail_fast"] != false {
        return Err(format!("testing runner flags not applied: {settings}"));
    }
    if !gate.suite_names().is_empty() {
        return Err("built testing gate should start without suites".to_string());
    }
    Ok(())
}
