// crates/security-gate-crypto/src/primitives.rs
// ============================================================================
// Module: Crypto Validation Primitives
// Description: Static bound tables and per-rule validation functions.
// Purpose: Provide the composable rules the envelope pipeline is built from.
// Dependencies: security-gate-core
// ============================================================================

//! ## Overview
//! Every function here is pure and returns a [`ValidationResult`] so stages
//! can be concatenated. Bound tables are versioned constants; changing them
//! changes what the gate accepts.
//!
//! Security posture: envelopes are untrusted input. Lengths are computed from
//! the base64 text without decoding so oversized fields cost nothing extra.

// ============================================================================
// SECTION: Imports
// ============================================================================

use security_gate_core::ValidationResult;

use crate::envelope::KdfParams;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// AEAD ciphers accepted by the gate.
pub const ALLOWED_ALGORITHMS: [&str; 5] =
    ["XChaCha20Poly1305", "ChaCha20Poly1305", "AES-256-GCM", "AES-256-GCM-96", "AES-256-GCM-128"];

/// Substrings marking deprecated cipher modes.
pub const DEPRECATED_ALGORITHM_MARKERS: [&str; 4] = ["AES-256-CBC", "AES-256-ECB", "DES", "3DES"];

/// KDF algorithms accepted by the gate.
pub const ALLOWED_KDF_ALGORITHMS: [&str; 3] = ["Argon2id", "Argon2i", "Argon2d"];

/// Recommended KDF algorithm.
pub const PREFERRED_KDF_ALGORITHM: &str = "Argon2id";

/// Required nonce length in bytes per cipher.
pub const NONCE_LENGTHS: [(&str, usize); 5] = [
    ("XChaCha20Poly1305", 24),
    ("ChaCha20Poly1305", 12),
    ("AES-256-GCM", 12),
    ("AES-256-GCM-96", 12),
    ("AES-256-GCM-128", 16),
];

/// Minimum KDF memory cost in KiB.
pub const MIN_KDF_MEMORY_KB: u64 = 65_536;
/// Maximum KDF memory cost in KiB.
pub const MAX_KDF_MEMORY_KB: u64 = 2_097_152;
/// Memory below this is accepted with a warning.
pub const LOW_KDF_MEMORY_ADVISORY_KB: u64 = 131_072;
/// Memory above this is accepted with a warning.
pub const HIGH_KDF_MEMORY_ADVISORY_KB: u64 = 1_572_864;
/// Minimum KDF iterations.
pub const MIN_KDF_ITERATIONS: u32 = 3;
/// Maximum KDF iterations.
pub const MAX_KDF_ITERATIONS: u32 = 100;
/// Minimum KDF parallelism.
pub const MIN_KDF_PARALLELISM: u32 = 1;
/// Maximum KDF parallelism.
pub const MAX_KDF_PARALLELISM: u32 = 32;

/// Minimum decoded salt length in bytes.
pub const MIN_SALT_BYTES: usize = 32;
/// Minimum key identifier length in characters.
pub const MIN_KEY_ID_CHARS: usize = 8;

/// AAD timestamps older than this produce a warning.
pub const MAX_AAD_AGE_SECONDS: i64 = 24 * 60 * 60;
/// AAD timestamps further in the future than this produce a warning.
pub const MAX_AAD_FUTURE_SKEW_SECONDS: i64 = 5 * 60;

/// Derivation estimates below this are too cheap to brute-force resist.
pub const MIN_DERIVATION_MS: f64 = 100.0;
/// Derivation estimates above this degrade interactive use.
pub const MAX_DERIVATION_MS: f64 = 5_000.0;
/// Cost of one iteration at the minimum memory setting.
const BASE_ITERATION_MS: f64 = 100.0;

// ============================================================================
// SECTION: Lookups
// ============================================================================

/// Returns the decoded byte length of a base64 string without decoding it.
///
/// Computed as `floor(len * 3 / 4)` minus the number of trailing `=`.
#[must_use]
pub fn base64_byte_length(encoded: &str) -> usize {
    let padding = encoded.bytes().rev().take_while(|byte| *byte == b'=').count();
    (encoded.len() * 3 / 4).saturating_sub(padding)
}

/// Returns the required nonce length for a cipher, if the cipher is known.
#[must_use]
pub fn expected_nonce_length(algorithm: &str) -> Option<usize> {
    NONCE_LENGTHS.iter().find(|(name, _)| *name == algorithm).map(|(_, length)| *length)
}

/// Returns true when the cipher name contains a deprecated mode marker.
#[must_use]
pub fn is_deprecated_algorithm(algorithm: &str) -> bool {
    let upper = algorithm.to_ascii_uppercase();
    DEPRECATED_ALGORITHM_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Returns true for AES-GCM family ciphers.
fn is_gcm(algorithm: &str) -> bool {
    algorithm.starts_with("AES-256-GCM")
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Checks a base64 nonce against the required length for its cipher.
///
/// Unknown ciphers produce a warning; the algorithm stage rejects them later.
#[must_use]
pub fn validate_nonce_length(algorithm: &str, nonce: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let actual = base64_byte_length(nonce);
    match expected_nonce_length(algorithm) {
        Some(expected) if expected != actual => result.push_error(format!(
            "Nonce length mismatch for {algorithm}: expected {expected} bytes, got {actual}"
        )),
        Some(_) => {}
        None => result.push_warning(format!(
            "Unknown algorithm {algorithm}: nonce length not verified"
        )),
    }
    result
}

/// Checks the cipher against the deprecated list and the allowlist.
#[must_use]
pub fn validate_algorithm(algorithm: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    if is_deprecated_algorithm(algorithm) {
        result.push_error(format!("Deprecated algorithm not allowed: {algorithm}"));
        return result;
    }
    if !ALLOWED_ALGORITHMS.contains(&algorithm) {
        result.push_error(format!(
            "Unsupported algorithm: {algorithm} (allowed: {})",
            ALLOWED_ALGORITHMS.join(", ")
        ));
        return result;
    }
    if is_gcm(algorithm) {
        result.push_warning(format!(
            "{algorithm} fails catastrophically on nonce reuse; prefer XChaCha20Poly1305"
        ));
    }
    result
}

/// Checks KDF algorithm and cost parameters against the bound tables.
#[must_use]
pub fn validate_kdf_params(params: &KdfParams) -> ValidationResult {
    let mut result = ValidationResult::new();

    if !ALLOWED_KDF_ALGORITHMS.contains(&params.algorithm.as_str()) {
        result.push_error(format!(
            "Unsupported KDF algorithm: {} (allowed: {})",
            params.algorithm,
            ALLOWED_KDF_ALGORITHMS.join(", ")
        ));
    } else if params.algorithm != PREFERRED_KDF_ALGORITHM {
        result.push_warning(format!(
            "KDF algorithm {} is accepted but {PREFERRED_KDF_ALGORITHM} is recommended",
            params.algorithm
        ));
    }

    let memory = params.memory;
    if memory < MIN_KDF_MEMORY_KB {
        result.push_error(format!(
            "KDF memory too low: {memory} KB (minimum {MIN_KDF_MEMORY_KB} KB)"
        ));
    } else if memory > MAX_KDF_MEMORY_KB {
        result.push_error(format!(
            "KDF memory too high: {memory} KB (maximum {MAX_KDF_MEMORY_KB} KB)"
        ));
    } else if memory < LOW_KDF_MEMORY_ADVISORY_KB {
        result.push_warning(format!(
            "KDF memory {memory} KB is close to the minimum; {LOW_KDF_MEMORY_ADVISORY_KB} KB or \
             more is recommended"
        ));
    } else if memory > HIGH_KDF_MEMORY_ADVISORY_KB {
        result.push_warning(format!(
            "KDF memory {memory} KB is close to the maximum and may exhaust client devices"
        ));
    }

    let iterations = params.iterations;
    if iterations < MIN_KDF_ITERATIONS {
        result.push_error(format!(
            "KDF iterations too low: {iterations} (minimum {MIN_KDF_ITERATIONS})"
        ));
    } else if iterations > MAX_KDF_ITERATIONS {
        result.push_error(format!(
            "KDF iterations too high: {iterations} (maximum {MAX_KDF_ITERATIONS})"
        ));
    }

    let parallelism = params.parallelism;
    if parallelism < MIN_KDF_PARALLELISM {
        result.push_error(format!(
            "KDF parallelism too low: {parallelism} (minimum {MIN_KDF_PARALLELISM})"
        ));
    } else if parallelism > MAX_KDF_PARALLELISM {
        result.push_error(format!(
            "KDF parallelism too high: {parallelism} (maximum {MAX_KDF_PARALLELISM})"
        ));
    }

    result
}

/// Estimates key-derivation time in milliseconds.
///
/// `iterations * 100ms * (memory / 65536) * max(0.5, 1 / parallelism)`. A
/// parallelism of zero is treated as single-lane.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "KDF bounds are far below f64 precision limits.")]
pub fn estimate_derivation_ms(params: &KdfParams) -> f64 {
    let lanes = if params.parallelism == 0 { 1.0 } else { 1.0 / f64::from(params.parallelism) };
    let memory_factor = params.memory as f64 / MIN_KDF_MEMORY_KB as f64;
    f64::from(params.iterations) * BASE_ITERATION_MS * memory_factor * lanes.max(0.5)
}

/// Flags derivation estimates outside the acceptable timing window.
///
/// Findings are warnings, escalated to errors when `strict` is set.
#[must_use]
pub fn validate_timing_resistance(params: &KdfParams, strict: bool) -> ValidationResult {
    let mut result = ValidationResult::new();
    let estimate = estimate_derivation_ms(params);
    if estimate < MIN_DERIVATION_MS {
        result.push_advisory(
            format!(
                "Key derivation too fast ({estimate:.0}ms < {MIN_DERIVATION_MS:.0}ms): weak \
                 brute-force resistance"
            ),
            strict,
        );
    } else if estimate > MAX_DERIVATION_MS {
        result.push_advisory(
            format!(
                "Key derivation too slow ({estimate:.0}ms > {MAX_DERIVATION_MS:.0}ms): poor \
                 interactive performance"
            ),
            strict,
        );
    }
    result
}

/// Reports that the cipher offers no post-quantum guarantees.
///
/// Every allowed cipher is symmetric AEAD, so this always emits a finding,
/// escalated to an error when `strict` is set.
#[must_use]
pub fn quantum_advisory(algorithm: &str, strict: bool) -> ValidationResult {
    let mut result = ValidationResult::new();
    result.push_advisory(
        format!("Algorithm {algorithm} is not post-quantum resistant"),
        strict,
    );
    result
}
