// crates/security-gate-crypto/src/error.rs
// ============================================================================
// Module: Crypto Gate Errors
// Description: Configuration errors raised by the crypto gate.
// Purpose: Keep policy misconfiguration distinct from validation failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Validation failures are returned as data. Errors here describe a caller
//! asking for something the gate cannot interpret.

use thiserror::Error;

/// Crypto gate configuration errors.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoGateError {
    /// The requested security policy name is not defined.
    #[error("Unknown security policy: {0}")]
    UnknownPolicy(String),
}
