// crates/security-gate-crypto/src/lib.rs
// ============================================================================
// Module: Crypto Envelope Gate
// Description: Validation of encryption envelope descriptors.
// Purpose: Decide whether an envelope is acceptable under a security policy.
// Dependencies: security-gate-core, jsonschema, regex, serde, time
// ============================================================================

//! ## Overview
//! An envelope describes how a record was encrypted elsewhere: cipher, KDF
//! parameters, salt, nonce, key identifier, and the associated authenticated
//! data binding it to a user and record. This crate never performs
//! cryptography; it validates the parameters.
//!
//! The [`CryptoGate`] pipeline short-circuits on the first failing stage:
//! 1. JSON schema (shape, types, base64 alphabet, UUID, ISO-8601).
//! 2. Structure (decoded salt/nonce lengths, key id, AAD fields and age).
//! 3. Algorithm and KDF rules.
//! 4. Timing-attack resistance estimate (policy-gated).
//! 5. Quantum-resistance advisory (policy-gated).
//! 6. Strictness: warnings fail the envelope under strict, no-warning policies.
//!
//! Invariants:
//! - Envelopes are read-only inputs; validation keeps no state between calls.
//! - Unknown policy names are configuration errors ([`CryptoGateError`]), not
//!   validation failures.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod envelope;
pub mod error;
pub mod gate;
pub mod policy;
pub mod primitives;
pub mod report;
pub mod schema;
pub mod structure;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::CryptoEnvelope;
pub use envelope::EnvelopeAad;
pub use envelope::KdfParams;
pub use error::CryptoGateError;
pub use gate::BatchSummary;
pub use gate::BatchValidation;
pub use gate::CryptoGate;
pub use policy::CryptoGateConfig;
pub use policy::SecurityPolicy;
pub use report::generate_report;

#[cfg(test)]
mod tests;
