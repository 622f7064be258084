// crates/security-gate-crypto/tests/policies.rs
// ============================================================================
// Module: Security Policy Tests
// Description: Named policy presets and unknown-policy handling.
// ============================================================================
//! ## Overview
//! Validates preset behavior through `validate_security_policy`.

#![allow(
    clippy::unwrap_used,
    clippy::use_debug,
    reason = "Tests use unwrap and debug output on deterministic fixtures."
)]

mod common;

use security_gate_crypto::CryptoGate;
use security_gate_crypto::CryptoGateConfig;
use security_gate_crypto::CryptoGateError;
use security_gate_crypto::SecurityPolicy;
use security_gate_crypto::gate::STRICT_MODE_ERROR;

use crate::common::fresh_envelope;

#[test]
fn production_accepts_a_fully_compliant_envelope() {
    let result =
        CryptoGate::validate_security_policy(&fresh_envelope("XChaCha20Poly1305"), "production")
            .unwrap();
    assert!(result.valid, "{result:?}");
    assert!(result.warnings.is_empty());
}

#[test]
fn production_rejects_gcm_because_warnings_are_not_allowed() {
    let result =
        CryptoGate::validate_security_policy(&fresh_envelope("AES-256-GCM"), "production").unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors.last().map(String::as_str), Some(STRICT_MODE_ERROR));
}

#[test]
fn staging_and_development_accept_gcm_with_warnings() {
    for name in ["staging", "development"] {
        let result =
            CryptoGate::validate_security_policy(&fresh_envelope("AES-256-GCM"), name).unwrap();
        assert!(result.valid, "{name}: {result:?}");
        assert!(!result.warnings.is_empty());
    }
}

#[test]
fn future_proof_escalates_the_quantum_advisory() {
    let result =
        CryptoGate::validate_security_policy(&fresh_envelope("XChaCha20Poly1305"), "future-proof")
            .unwrap();
    assert!(!result.valid);
    assert!(result.errors.iter().any(|error| error.contains("not post-quantum resistant")));
}

#[test]
fn unknown_policy_is_a_configuration_error() {
    let err = CryptoGate::validate_security_policy(&fresh_envelope("XChaCha20Poly1305"), "paranoid")
        .unwrap_err();
    assert_eq!(err, CryptoGateError::UnknownPolicy("paranoid".to_string()));
    assert_eq!(err.to_string(), "Unknown security policy: paranoid");
}

#[test]
fn presets_round_trip_by_name() {
    let names: Vec<&str> = SecurityPolicy::all().iter().map(|policy| policy.name()).collect();
    assert_eq!(names, vec!["production", "staging", "development", "future-proof"]);
    for policy in SecurityPolicy::all() {
        assert_eq!(SecurityPolicy::from_name(policy.name()).unwrap(), policy);
    }
}

#[test]
fn preset_toggles_match_their_descriptions() {
    let production = SecurityPolicy::Production.config();
    assert!(production.strict_mode && !production.allow_warnings);
    assert!(production.timing_attack_check && !production.quantum_resistance_check);

    let development = SecurityPolicy::Development.config();
    assert!(!development.strict_mode && !development.timing_attack_check);

    let future_proof = SecurityPolicy::FutureProof.config();
    assert!(future_proof.strict_mode && future_proof.quantum_resistance_check);

    assert_eq!(CryptoGateConfig::default(), SecurityPolicy::Staging.config());
}

#[test]
fn config_deserializes_camel_case_with_defaults() {
    let config: CryptoGateConfig =
        serde_json::from_value(serde_json::json!({"strictMode": true})).unwrap();
    assert!(config.strict_mode);
    assert!(config.allow_warnings);
    assert!(config.timing_attack_check);

    let unknown: Result<CryptoGateConfig, _> =
        serde_json::from_value(serde_json::json!({"strict": true}));
    assert!(unknown.is_err());
}
