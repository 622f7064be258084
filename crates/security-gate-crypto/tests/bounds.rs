// crates/security-gate-crypto/tests/bounds.rs
// ============================================================================
// Module: KDF Bound Property Tests
// Description: Monotonic bound checks and base64 length arithmetic.
// ============================================================================
//! ## Overview
//! Property tests over the KDF bound tables and batch order independence.

mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use proptest::prelude::*;
use security_gate_crypto::CryptoGate;
use security_gate_crypto::KdfParams;
use security_gate_crypto::primitives::MAX_KDF_MEMORY_KB;
use security_gate_crypto::primitives::MIN_KDF_MEMORY_KB;
use security_gate_crypto::primitives::base64_byte_length;
use security_gate_crypto::primitives::validate_kdf_params;
use serde_json::json;

use crate::common::reference_time;
use crate::common::valid_envelope;
use crate::common::with;

fn params(memory: u64, iterations: u32, parallelism: u32) -> KdfParams {
    KdfParams {
        algorithm: "Argon2id".to_string(),
        memory,
        iterations,
        parallelism,
    }
}

fn mentions(errors: &[String], needle: &str) -> bool {
    errors.iter().any(|error| error.contains(needle))
}

#[test]
fn memory_bounds_are_inclusive() {
    assert!(validate_kdf_params(&params(65_536, 3, 1)).valid);
    assert!(mentions(&validate_kdf_params(&params(65_535, 3, 1)).errors, "memory too low"));
    assert!(validate_kdf_params(&params(2_097_152, 3, 1)).valid);
    assert!(mentions(&validate_kdf_params(&params(2_097_153, 3, 1)).errors, "memory too high"));
}

#[test]
fn iteration_and_parallelism_bounds_are_inclusive() {
    assert!(validate_kdf_params(&params(131_072, 3, 1)).valid);
    assert!(validate_kdf_params(&params(131_072, 100, 32)).valid);
    assert!(mentions(&validate_kdf_params(&params(131_072, 2, 1)).errors, "iterations too low"));
    assert!(mentions(
        &validate_kdf_params(&params(131_072, 101, 1)).errors,
        "iterations too high"
    ));
    assert!(mentions(&validate_kdf_params(&params(131_072, 3, 0)).errors, "parallelism too low"));
    assert!(mentions(
        &validate_kdf_params(&params(131_072, 3, 33)).errors,
        "parallelism too high"
    ));
}

#[test]
fn memory_near_bounds_only_warns() {
    let low = validate_kdf_params(&params(100_000, 3, 1));
    assert!(low.valid);
    assert!(mentions(&low.warnings, "close to the minimum"));
    let high = validate_kdf_params(&params(1_800_000, 3, 1));
    assert!(high.valid);
    assert!(mentions(&high.warnings, "close to the maximum"));
}

proptest! {
    #[test]
    fn memory_in_range_never_errors(memory in MIN_KDF_MEMORY_KB..=MAX_KDF_MEMORY_KB) {
        prop_assert!(validate_kdf_params(&params(memory, 3, 1)).valid);
    }

    #[test]
    fn memory_below_range_is_too_low(memory in 0..MIN_KDF_MEMORY_KB) {
        let result = validate_kdf_params(&params(memory, 3, 1));
        prop_assert!(mentions(&result.errors, "memory too low"));
    }

    #[test]
    fn memory_above_range_is_too_high(memory in (MAX_KDF_MEMORY_KB + 1)..u64::MAX) {
        let result = validate_kdf_params(&params(memory, 3, 1));
        prop_assert!(mentions(&result.errors, "memory too high"));
    }

    #[test]
    fn iterations_follow_bounds(iterations in 0_u32..200) {
        let result = validate_kdf_params(&params(131_072, iterations, 1));
        prop_assert_eq!(result.valid, (3..=100).contains(&iterations));
    }

    #[test]
    fn parallelism_follows_bounds(parallelism in 0_u32..64) {
        let result = validate_kdf_params(&params(131_072, 3, parallelism));
        prop_assert_eq!(result.valid, (1..=32).contains(&parallelism));
    }

    #[test]
    fn byte_length_matches_decoded_length(bytes in proptest::collection::vec(any::<u8>(), 0..96)) {
        let encoded = STANDARD.encode(&bytes);
        prop_assert_eq!(base64_byte_length(&encoded), bytes.len());
    }

    #[test]
    fn batch_summary_is_order_independent(
        flags in proptest::collection::vec(any::<bool>(), 1..8),
        rotate in 0_usize..8,
    ) {
        let invalid = with(valid_envelope(), "/salt", json!("c2hvcnQ="));
        let envelopes: Vec<_> = flags
            .iter()
            .map(|ok| if *ok { valid_envelope() } else { invalid.clone() })
            .collect();
        let mut rotated = envelopes.clone();
        rotated.rotate_left(rotate % envelopes.len());

        let gate = CryptoGate::default();
        let forward = gate.validate_batch_at(&envelopes, reference_time());
        let shifted = gate.validate_batch_at(&rotated, reference_time());
        prop_assert_eq!(forward.summary, shifted.summary);
        prop_assert_eq!(forward.summary.valid, flags.iter().filter(|ok| **ok).count());
        prop_assert_eq!(forward.summary.total, flags.len());
    }
}

#[test]
fn batch_of_valid_and_invalid_counts_both() {
    let gate = CryptoGate::default();
    let invalid = with(valid_envelope(), "/kdfParams/iterations", json!(1));
    for batch in [vec![valid_envelope(), invalid.clone()], vec![invalid, valid_envelope()]] {
        let outcome = gate.validate_batch_at(&batch, reference_time());
        assert_eq!(outcome.summary.total, 2);
        assert_eq!(outcome.summary.valid, 1);
        assert_eq!(outcome.summary.invalid, 1);
        assert_eq!(outcome.summary.total_errors, 1);
        assert_eq!(outcome.results.len(), 2);
    }
}
