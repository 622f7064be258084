// crates/security-gate-rls/src/error.rs
// ============================================================================
// Module: Database Errors
// Description: Error classes reported by database collaborators.
// Purpose: Separate access denials from query and connection failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Access probes depend on telling [`DatabaseError::AccessDenied`] apart from
//! every other failure; client implementations must map permission errors
//! (for PostgreSQL, SQLSTATE `42501` and RLS violations) to that variant.

use thiserror::Error;

/// Database collaborator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    /// The statement was rejected by a permission or row-level policy.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// The statement failed for a non-permission reason.
    #[error("query failed: {0}")]
    Query(String),
    /// The database could not be reached.
    #[error("database connection failed: {0}")]
    Connection(String),
}

impl DatabaseError {
    /// Returns true for access-denied errors.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }
}
