// crates/security-gate-core/src/error.rs
// ============================================================================
// Module: Security Gate Errors
// Description: Operational fault types for gates, the registry, and runs.
// Purpose: Keep operational faults distinct from validation failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Validation failures are reported as data in [`crate::GateResult`]. The
//! types here model operational faults only: a gate that could not do its
//! work, a registry misuse, or a parallel fail-fast run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::runner::GateRunReport;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Operational fault raised by a gate while executing.
///
/// # Invariants
/// - Variants are stable for error classification.
/// - The runner retries every variant; none represent a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Gate input could not be interpreted.
    #[error("invalid gate input: {0}")]
    InvalidInput(String),
    /// Gate logic failed to complete.
    #[error("gate execution failed: {0}")]
    Execution(String),
    /// An external collaborator (database, capture reader) is unavailable.
    #[error("gate dependency unavailable: {0}")]
    Unavailable(String),
}

/// Gate registry misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A gate with the same name is already registered.
    #[error("security gate already registered: {0}")]
    Duplicate(String),
    /// Gate names must be non-empty.
    #[error("security gate name must be non-empty")]
    EmptyName,
}

/// Run-level error for `execute_all` in parallel fail-fast mode.
#[derive(Debug, Error)]
pub enum RunError {
    /// A gate failed validation while `fail_fast` was set.
    ///
    /// Every gate has already run to completion; the full report is attached.
    #[error("Security gate '{gate}' failed: {reason}")]
    FailFast {
        /// First failing gate in registration order.
        gate: String,
        /// Errors reported by that gate, joined.
        reason: String,
        /// Complete run report.
        report: Box<GateRunReport>,
    },
}

impl RunError {
    /// Returns the run report carried by the error.
    #[must_use]
    pub fn report(&self) -> &GateRunReport {
        match self {
            Self::FailFast {
                report, ..
            } => report,
        }
    }

    /// Consumes the error and returns the run report.
    #[must_use]
    pub fn into_report(self) -> GateRunReport {
        match self {
            Self::FailFast {
                report, ..
            } => *report,
        }
    }
}
