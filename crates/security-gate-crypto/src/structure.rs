// crates/security-gate-crypto/src/structure.rs
// ============================================================================
// Module: Envelope Structure Checks
// Description: Decoded-length, key id, and AAD checks for envelopes.
// Purpose: Enforce structural rules the schema cannot express.
// Dependencies: regex, security-gate-core, time
// ============================================================================

//! ## Overview
//! Runs after the schema stage on a typed envelope. Length failures and empty
//! AAD fields are errors; an unrecognized cipher, a non-canonical key id, and
//! stale or future-dated AAD timestamps are warnings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use regex::Regex;
use security_gate_core::ValidationResult;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::envelope::CryptoEnvelope;
use crate::envelope::EnvelopeAad;
use crate::primitives::MAX_AAD_AGE_SECONDS;
use crate::primitives::MAX_AAD_FUTURE_SKEW_SECONDS;
use crate::primitives::MIN_KEY_ID_CHARS;
use crate::primitives::MIN_SALT_BYTES;
use crate::primitives::base64_byte_length;
use crate::primitives::validate_nonce_length;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Canonical key id form: `v<version>_<YYYYMMDD>_<hex>`.
const KEY_ID_PATTERN: &str = r"^v\d+_\d{8}_[a-f0-9]{6,}$";

/// Returns the compiled key id pattern, if it compiles.
fn key_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(KEY_ID_PATTERN).ok()).as_ref()
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Runs every structural check against an envelope.
#[must_use]
pub fn validate_structure(envelope: &CryptoEnvelope, now: OffsetDateTime) -> ValidationResult {
    let mut result = ValidationResult::new();

    let salt_bytes = base64_byte_length(&envelope.salt);
    if salt_bytes < MIN_SALT_BYTES {
        result.push_error(format!(
            "Salt too short: {salt_bytes} bytes (minimum {MIN_SALT_BYTES} bytes)"
        ));
    }

    result.merge(validate_nonce_length(&envelope.algorithm, &envelope.nonce));
    result.merge(validate_key_id(&envelope.key_id));
    result.merge(validate_aad(&envelope.aad, now));
    result
}

/// Checks key id length and canonical form.
#[must_use]
pub fn validate_key_id(key_id: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let length = key_id.chars().count();
    if length < MIN_KEY_ID_CHARS {
        result.push_error(format!(
            "Key ID too short: {length} characters (minimum {MIN_KEY_ID_CHARS})"
        ));
        return result;
    }
    if !key_id_pattern().is_some_and(|pattern| pattern.is_match(key_id)) {
        result.push_warning(format!(
            "Key ID {key_id} does not follow the v<version>_<YYYYMMDD>_<hex> format"
        ));
    }
    result
}

/// Checks AAD binding fields and timestamp freshness.
#[must_use]
pub fn validate_aad(aad: &EnvelopeAad, now: OffsetDateTime) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (field, value) in
        [("userId", &aad.user_id), ("recordId", &aad.record_id), ("tableName", &aad.table_name)]
    {
        if value.trim().is_empty() {
            result.push_error(format!("AAD {field} must not be empty"));
        }
    }

    match OffsetDateTime::parse(&aad.timestamp, &Rfc3339) {
        Ok(timestamp) => {
            let age = now - timestamp;
            if age > Duration::seconds(MAX_AAD_AGE_SECONDS) {
                result.push_warning(format!(
                    "AAD timestamp is older than 24 hours ({} hours)",
                    age.whole_hours()
                ));
            } else if age < -Duration::seconds(MAX_AAD_FUTURE_SKEW_SECONDS) {
                result.push_warning("AAD timestamp is more than 5 minutes in the future");
            }
        }
        Err(err) => {
            result.push_error(format!("AAD timestamp is not a valid ISO-8601 date-time: {err}"));
        }
    }
    result
}
