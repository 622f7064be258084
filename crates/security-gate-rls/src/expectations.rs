// crates/security-gate-rls/src/expectations.rs
// ============================================================================
// Module: Policy Expectations
// Description: Table-level RLS and policy existence checks.
// Purpose: Verify catalog state matches the declared access model.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Expectations are read from the PostgreSQL catalog: `pg_class` for the
//! row-level security flag and `pg_policies` for policy definitions. Missing
//! tables, disabled RLS, missing policies, and condition mismatches are
//! validation failures; catalog query failures are returned as errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use security_gate_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::client::DatabaseClient;
use crate::client::Row;
use crate::error::DatabaseError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Catalog query for a table's row-level security flag.
pub const RLS_STATUS_SQL: &str = "SELECT relrowsecurity FROM pg_class WHERE relname = $1";

/// Catalog query for a table's policies.
pub const POLICIES_SQL: &str =
    "SELECT policyname, cmd, qual, with_check FROM pg_policies WHERE tablename = $1";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Expected policy on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyExpectation {
    /// Policy name.
    pub name: String,
    /// Expected command (`ALL`, `SELECT`, `INSERT`, `UPDATE`, `DELETE`).
    #[serde(default)]
    pub command: Option<String>,
    /// Text the policy's USING or WITH CHECK expression must contain.
    #[serde(default)]
    pub condition_contains: Option<String>,
}

/// Expected access-control state for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableExpectation {
    /// Table name.
    pub table: String,
    /// Whether row-level security must be enabled.
    #[serde(default = "default_rls_enabled")]
    pub rls_enabled: bool,
    /// Policies that must exist.
    #[serde(default)]
    pub policies: Vec<PolicyExpectation>,
}

/// Row-level security is expected by default.
const fn default_rls_enabled() -> bool {
    true
}

impl TableExpectation {
    /// Expects RLS enabled on `table` with no specific policies.
    #[must_use]
    pub fn enabled(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rls_enabled: true,
            policies: Vec::new(),
        }
    }

    /// Adds a policy expectation.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyExpectation) -> Self {
        self.policies.push(policy);
        self
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Reads a text column, treating null and missing as empty.
fn text<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).and_then(Value::as_str).unwrap_or("")
}

/// Checks one table against its expectation.
///
/// # Errors
///
/// Returns [`DatabaseError`] when a catalog query fails.
pub async fn check_table(
    client: &dyn DatabaseClient,
    expectation: &TableExpectation,
) -> Result<ValidationResult, DatabaseError> {
    let mut result = ValidationResult::new();
    let table = expectation.table.as_str();
    let params = [Value::String(table.to_string())];

    let status = client.query(RLS_STATUS_SQL, &params).await?;
    let Some(row) = status.first() else {
        result.push_error(format!("Table {table} not found"));
        return Ok(result);
    };
    let enabled = row.get("relrowsecurity").and_then(Value::as_bool).unwrap_or(false);
    if expectation.rls_enabled && !enabled {
        result.push_error(format!("Row level security is not enabled on table {table}"));
    } else if !expectation.rls_enabled && enabled {
        result.push_warning(format!("Row level security is unexpectedly enabled on table {table}"));
    }

    if expectation.policies.is_empty() {
        return Ok(result);
    }
    let policies = client.query(POLICIES_SQL, &params).await?;
    for expected in &expectation.policies {
        let Some(actual) = policies.iter().find(|row| text(row, "policyname") == expected.name)
        else {
            result.push_error(format!("Policy {} missing on table {table}", expected.name));
            continue;
        };
        if let Some(command) = &expected.command {
            let actual_command = text(actual, "cmd");
            if !actual_command.eq_ignore_ascii_case(command) {
                result.push_error(format!(
                    "Policy {} on table {table} applies to {actual_command}, expected {command}",
                    expected.name
                ));
            }
        }
        if let Some(fragment) = &expected.condition_contains {
            let using = text(actual, "qual");
            let check = text(actual, "with_check");
            if !using.contains(fragment.as_str()) && !check.contains(fragment.as_str()) {
                result.push_error(format!(
                    "Policy {} on table {table} condition does not contain '{fragment}'",
                    expected.name
                ));
            }
        }
    }
    Ok(result)
}

/// Checks every table expectation in order.
///
/// # Errors
///
/// Returns [`DatabaseError`] when a catalog query fails.
pub async fn check_tables(
    client: &dyn DatabaseClient,
    expectations: &[TableExpectation],
) -> Result<ValidationResult, DatabaseError> {
    let mut result = ValidationResult::new();
    for expectation in expectations {
        result.merge(check_table(client, expectation).await?);
    }
    Ok(result)
}
