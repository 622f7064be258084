// crates/security-gate-rls/src/client.rs
// ============================================================================
// Module: Database Client
// Description: Database collaborator interface consumed by the RLS gate.
// Purpose: Keep the gate independent of any specific driver.
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! Every method is a suspension point. Parameters use positional `$n`
//! placeholders; rows are JSON objects keyed by column name.

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::error::DatabaseError;

/// Result row keyed by column name.
pub type Row = Map<String, Value>;

/// Database access used by the RLS gate.
///
/// # Invariants
/// - `query_as_user` applies the user's identity for row-level policies for
///   the duration of that statement only.
/// - `begin`/`commit`/`rollback` act on the client's single session.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Runs a statement with the client's own privileges.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the statement fails.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DatabaseError>;

    /// Runs a statement as the given application user.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::AccessDenied`] when policies reject the
    /// statement, or another [`DatabaseError`] on failure.
    async fn query_as_user(
        &self,
        sql: &str,
        user_id: &str,
        params: &[Value],
    ) -> Result<Vec<Row>, DatabaseError>;

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the transaction cannot be opened.
    async fn begin(&self) -> Result<(), DatabaseError>;

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the commit fails.
    async fn commit(&self) -> Result<(), DatabaseError>;

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the rollback fails.
    async fn rollback(&self) -> Result<(), DatabaseError>;
}
