// crates/security-gate-crypto/tests/common/mod.rs
// ============================================================================
// Module: Envelope Fixtures
// Description: Shared envelope builders for crypto gate tests.
// ============================================================================
//! ## Overview
//! Builds envelopes with exact decoded salt and nonce lengths.

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use time::macros::datetime;

/// Fixed user id for AAD fixtures.
pub const USER_ID: &str = "3f2b8c1e-9a4d-4e6f-8b7a-1c2d3e4f5a6b";

/// Reference time every fixture is validated against.
pub fn reference_time() -> OffsetDateTime {
    datetime!(2024-06-01 12:00:00 UTC)
}

/// AAD timestamp thirty minutes before the reference time.
pub const FRESH_TIMESTAMP: &str = "2024-06-01T11:30:00Z";

/// Base64 encoding of `len` bytes.
pub fn encoded(len: usize) -> String {
    STANDARD.encode(vec![0xA5_u8; len])
}

/// Nonce length expected for each cipher.
pub fn nonce_len(algorithm: &str) -> usize {
    match algorithm {
        "XChaCha20Poly1305" => 24,
        "AES-256-GCM-128" => 16,
        _ => 12,
    }
}

/// Fully compliant envelope for the given cipher.
pub fn envelope_for(algorithm: &str) -> Value {
    json!({
        "version": 1,
        "algorithm": algorithm,
        "kdfParams": {
            "algorithm": "Argon2id",
            "memory": 131_072,
            "iterations": 3,
            "parallelism": 2
        },
        "salt": encoded(32),
        "nonce": encoded(nonce_len(algorithm)),
        "keyId": "v1_20231201_abc123",
        "aad": {
            "userId": USER_ID,
            "recordId": "r1",
            "tableName": "t",
            "version": 1,
            "timestamp": FRESH_TIMESTAMP
        }
    })
}

/// Fully compliant `XChaCha20Poly1305` envelope.
pub fn valid_envelope() -> Value {
    envelope_for("XChaCha20Poly1305")
}

/// Returns `envelope` with the value at `pointer` replaced.
pub fn with(mut envelope: Value, pointer: &str, value: Value) -> Value {
    if let Some(slot) = envelope.pointer_mut(pointer) {
        *slot = value;
    }
    envelope
}

/// Returns `envelope` with a top-level or nested key removed.
pub fn without(mut envelope: Value, parent: &str, key: &str) -> Value {
    if let Some(Value::Object(map)) = envelope.pointer_mut(parent) {
        map.remove(key);
    }
    envelope
}

/// Compliant envelope whose AAD timestamp is the current time.
pub fn fresh_envelope(algorithm: &str) -> Value {
    let now = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    with(envelope_for(algorithm), "/aad/timestamp", Value::String(now))
}
