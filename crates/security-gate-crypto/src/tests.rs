// crates/security-gate-crypto/src/tests.rs
// ============================================================================
// Module: Crypto Unit Tests
// Description: Unit tests for validation primitives and structural checks.
// Purpose: Cover rule functions independently of the staged pipeline.
// Dependencies: security-gate-crypto
// ============================================================================

//! ## Overview
//! Unit tests for [`crate::primitives`], [`crate::structure`], and
//! [`crate::schema`].

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

use serde_json::json;
use time::macros::datetime;

use crate::envelope::EnvelopeAad;
use crate::envelope::KdfParams;
use crate::primitives::base64_byte_length;
use crate::primitives::estimate_derivation_ms;
use crate::primitives::expected_nonce_length;
use crate::primitives::is_deprecated_algorithm;
use crate::primitives::quantum_advisory;
use crate::primitives::validate_algorithm;
use crate::primitives::validate_nonce_length;
use crate::primitives::validate_timing_resistance;
use crate::schema::validate_schema;
use crate::structure::validate_aad;
use crate::structure::validate_key_id;

fn kdf(memory: u64, iterations: u32, parallelism: u32) -> KdfParams {
    KdfParams {
        algorithm: "Argon2id".to_string(),
        memory,
        iterations,
        parallelism,
    }
}

#[test]
fn byte_length_uses_padding_formula() {
    assert_eq!(base64_byte_length(""), 0);
    assert_eq!(base64_byte_length("QQ=="), 1);
    assert_eq!(base64_byte_length("QUI="), 2);
    assert_eq!(base64_byte_length("QUJD"), 3);
    assert_eq!(base64_byte_length(&format!("{}=", "A".repeat(43))), 32);
}

#[test]
fn nonce_table_lookup() {
    assert_eq!(expected_nonce_length("XChaCha20Poly1305"), Some(24));
    assert_eq!(expected_nonce_length("AES-256-GCM-128"), Some(16));
    assert_eq!(expected_nonce_length("Serpent"), None);
    assert!(validate_nonce_length("ChaCha20Poly1305", "AAAAAAAAAAAAAAAA").valid);
    let mismatch = validate_nonce_length("XChaCha20Poly1305", "AAAAAAAAAAAAAAAA");
    assert_eq!(
        mismatch.errors,
        vec!["Nonce length mismatch for XChaCha20Poly1305: expected 24 bytes, got 12"]
    );
    let unknown = validate_nonce_length("Serpent", "AAAA");
    assert!(unknown.valid);
    assert_eq!(unknown.warnings.len(), 1);
}

#[test]
fn deprecated_markers_match_case_insensitively() {
    assert!(is_deprecated_algorithm("aes-256-cbc"));
    assert!(is_deprecated_algorithm("TripleDES"));
    assert!(!is_deprecated_algorithm("XChaCha20Poly1305"));
    assert!(validate_algorithm("ChaCha20Poly1305").warnings.is_empty());
    assert_eq!(validate_algorithm("AES-256-GCM-128").warnings.len(), 1);
}

#[test]
fn derivation_estimate_follows_formula() {
    assert!((estimate_derivation_ms(&kdf(65_536, 3, 1)) - 300.0).abs() < f64::EPSILON);
    assert!((estimate_derivation_ms(&kdf(131_072, 3, 4)) - 300.0).abs() < f64::EPSILON);
    assert!((estimate_derivation_ms(&kdf(65_536, 1, 2)) - 50.0).abs() < f64::EPSILON);
    assert!((estimate_derivation_ms(&kdf(65_536, 1, 0)) - 100.0).abs() < f64::EPSILON);
}

#[test]
fn timing_findings_escalate_under_strict() {
    let fast = kdf(65_536, 1, 2);
    let lenient = validate_timing_resistance(&fast, false);
    assert!(lenient.valid);
    assert!(lenient.warnings[0].starts_with("Key derivation too fast"));
    let strict = validate_timing_resistance(&fast, true);
    assert!(!strict.valid);
    assert!(strict.errors[0].starts_with("Key derivation too fast"));
    assert!(validate_timing_resistance(&kdf(131_072, 3, 2), true).valid);
}

#[test]
fn quantum_advisory_always_reports() {
    assert_eq!(quantum_advisory("XChaCha20Poly1305", false).warnings.len(), 1);
    assert!(!quantum_advisory("XChaCha20Poly1305", true).valid);
}

#[test]
fn key_id_checks() {
    assert!(validate_key_id("v12_20240101_deadbeef").warnings.is_empty());
    assert_eq!(validate_key_id("v1_2024_abcdef").warnings.len(), 1);
    assert_eq!(validate_key_id("V1_20240101_ABCDEF").warnings.len(), 1);
    assert!(!validate_key_id("v1_2024").valid);
}

#[test]
fn aad_timestamp_must_parse() {
    let aad = EnvelopeAad {
        user_id: "u".to_string(),
        record_id: "r".to_string(),
        table_name: "t".to_string(),
        version: 1,
        timestamp: "2024-13-01T00:00:00Z".to_string(),
    };
    let result = validate_aad(&aad, datetime!(2024-06-01 00:00:00 UTC));
    assert!(!result.valid);
    assert!(result.errors[0].starts_with("AAD timestamp is not a valid ISO-8601 date-time"));
}

#[test]
fn schema_reports_each_violation() {
    let result = validate_schema(&json!({"version": 1}));
    assert!(!result.valid);
    assert!(!result.errors.is_empty());
    assert!(result.errors.iter().all(|error| error.starts_with("Schema validation failed: ")));
}
