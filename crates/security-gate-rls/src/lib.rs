// crates/security-gate-rls/src/lib.rs
// ============================================================================
// Module: RLS Gate
// Description: Row-level security checks against a database collaborator.
// Purpose: Prove access policies exist and behave before deployment.
// Dependencies: security-gate-core, async-trait, regex, serde, tokio
// ============================================================================

//! ## Overview
//! The RLS gate combines three checks over a [`DatabaseClient`]:
//! - Policy existence: row-level security is enabled on each expected table
//!   and each expected policy exists with the expected command and condition.
//! - Access probes: queries run as specific users must succeed, be denied, or
//!   return no rows, depending on the probe.
//! - Migration validation: statements are screened against a deny-list and,
//!   when clean, executed inside a transaction that is always rolled back,
//!   with table expectations checked before and after.
//!
//! Invariants:
//! - A screened-out migration is never sent to the database.
//! - Migration transactions are never committed by the gate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod error;
pub mod expectations;
pub mod gate;
pub mod migration;
pub mod probes;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::DatabaseClient;
pub use client::Row;
pub use error::DatabaseError;
pub use expectations::PolicyExpectation;
pub use expectations::TableExpectation;
pub use gate::RlsGate;
pub use gate::RlsGateConfig;
pub use migration::screen_migration;
pub use migration::split_statements;
pub use migration::validate_migration;
pub use probes::AccessProbe;
pub use probes::ProbeCategory;
pub use probes::ProbeExpectation;
