// crates/security-gate-crypto/src/schema.rs
// ============================================================================
// Module: Envelope Schema
// Description: JSON Schema for the crypto envelope wire format.
// Purpose: Reject malformed envelopes before any value-level rule runs.
// Dependencies: jsonschema, serde_json
// ============================================================================

//! ## Overview
//! The schema checks shape and primitive types only: required fields, integer
//! ranges that keep the typed model representable, the base64 alphabet for
//! `salt`/`nonce`, a UUID `aad.userId`, and an ISO-8601 `aad.timestamp`.
//! Lengths and policy bounds are left to later stages so their messages stay
//! specific.
//!
//! The schema is compiled once per process and shared.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use jsonschema::Draft;
use jsonschema::Validator;
use security_gate_core::ValidationResult;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix attached to every schema-stage error.
pub const SCHEMA_ERROR_PREFIX: &str = "Schema validation failed: ";

/// Standard base64 alphabet with optional padding.
const BASE64_PATTERN: &str = "^[A-Za-z0-9+/]*={0,2}$";

/// Canonical hyphenated UUID.
const UUID_PATTERN: &str =
    "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// ISO-8601 date-time with explicit offset.
const ISO_8601_PATTERN: &str =
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$";

/// Largest value representable by the typed `u32` fields.
const U32_MAX: u64 = u32::MAX as u64;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the envelope JSON Schema document.
#[must_use]
pub fn envelope_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CryptoEnvelope",
        "type": "object",
        "required": ["version", "algorithm", "kdfParams", "salt", "nonce", "keyId", "aad"],
        "properties": {
            "version": { "type": "integer", "minimum": 1, "maximum": U32_MAX },
            "algorithm": { "type": "string", "minLength": 1 },
            "kdfParams": {
                "type": "object",
                "required": ["algorithm", "memory", "iterations", "parallelism"],
                "properties": {
                    "algorithm": { "type": "string", "minLength": 1 },
                    "memory": { "type": "integer", "minimum": 0 },
                    "iterations": { "type": "integer", "minimum": 0, "maximum": U32_MAX },
                    "parallelism": { "type": "integer", "minimum": 0, "maximum": U32_MAX }
                }
            },
            "salt": { "type": "string", "pattern": BASE64_PATTERN },
            "nonce": { "type": "string", "pattern": BASE64_PATTERN },
            "keyId": { "type": "string" },
            "aad": {
                "type": "object",
                "required": ["userId", "recordId", "tableName", "version", "timestamp"],
                "properties": {
                    "userId": { "type": "string", "pattern": UUID_PATTERN },
                    "recordId": { "type": "string" },
                    "tableName": { "type": "string" },
                    "version": { "type": "integer", "minimum": 0, "maximum": U32_MAX },
                    "timestamp": { "type": "string", "pattern": ISO_8601_PATTERN }
                }
            }
        }
    })
}

/// Returns the compiled envelope validator, compiling it on first use.
fn compiled() -> &'static Result<Validator, String> {
    static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&envelope_schema())
            .map_err(|err| format!("invalid envelope schema: {err}"))
    })
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a raw envelope value against the envelope schema.
///
/// Each schema violation becomes one error prefixed with
/// [`SCHEMA_ERROR_PREFIX`].
#[must_use]
pub fn validate_schema(value: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();
    match compiled() {
        Ok(validator) => {
            for error in validator.iter_errors(value) {
                result.push_error(format!("{SCHEMA_ERROR_PREFIX}{error}"));
            }
        }
        Err(message) => result.push_error(format!("{SCHEMA_ERROR_PREFIX}{message}")),
    }
    result
}
