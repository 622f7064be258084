// crates/security-gate-crypto/src/envelope.rs
// ============================================================================
// Module: Crypto Envelope Model
// Description: Typed form of the encryption envelope descriptor.
// Purpose: Provide a read-only, serde-compatible envelope representation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Wire names follow the client format (`kdfParams`, `keyId`, `userId`, ...).
//! Values are only constructed after the schema stage has accepted the raw
//! JSON, so field types are guaranteed; value-level rules are enforced by the
//! later validation stages, not by construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Key-derivation parameters recorded in an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// KDF algorithm name (`Argon2id`, `Argon2i`, `Argon2d`).
    pub algorithm: String,
    /// Memory cost in KiB.
    pub memory: u64,
    /// Iteration (time) cost.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

/// Associated authenticated data binding an envelope to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeAad {
    /// Owning user (UUID).
    pub user_id: String,
    /// Record identifier.
    pub record_id: String,
    /// Table the record lives in.
    pub table_name: String,
    /// Record schema version.
    pub version: u32,
    /// Creation time (ISO-8601).
    pub timestamp: String,
}

/// Encryption envelope descriptor.
///
/// # Invariants
/// - `salt` and `nonce` are base64 text; decoded lengths are checked by
///   validation, not enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoEnvelope {
    /// Envelope format version (positive).
    pub version: u32,
    /// AEAD cipher name.
    pub algorithm: String,
    /// Key-derivation parameters.
    pub kdf_params: KdfParams,
    /// Base64 KDF salt.
    pub salt: String,
    /// Base64 cipher nonce.
    pub nonce: String,
    /// Key identifier, recommended form `v<N>_<YYYYMMDD>_<hex>`.
    pub key_id: String,
    /// Associated authenticated data.
    pub aad: EnvelopeAad,
}
