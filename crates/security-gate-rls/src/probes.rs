// crates/security-gate-rls/src/probes.rs
// ============================================================================
// Module: Access Probes
// Description: Behavioral queries run as specific users.
// Purpose: Prove policies allow, deny, and isolate as declared.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A probe runs one statement through
//! [`DatabaseClient::query_as_user`] and compares the outcome against its
//! expectation:
//! - `authorized`: the statement must succeed.
//! - `denied`: the statement must fail with an access-denied error.
//! - `isolated`: the statement must return no rows. An access-denied error
//!   also satisfies isolation.
//!
//! Connection failures are returned as errors; every other outcome is data.

use std::fmt;

use security_gate_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::client::DatabaseClient;
use crate::error::DatabaseError;

/// What a probe is trying to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeCategory {
    /// Legitimate access paths keep working.
    #[default]
    Authorization,
    /// A user cannot gain privileges beyond their role.
    PrivilegeEscalation,
    /// A user cannot read or modify another user's rows.
    CrossUserIsolation,
}

impl ProbeCategory {
    /// Returns the snake-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::PrivilegeEscalation => "privilege_escalation",
            Self::CrossUserIsolation => "cross_user_isolation",
        }
    }
}

impl fmt::Display for ProbeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeExpectation {
    /// The statement succeeds.
    Authorized,
    /// The statement fails with access denied.
    Denied,
    /// The statement returns no rows.
    Isolated,
}

/// One behavioral access probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessProbe {
    /// Probe name used in messages.
    pub name: String,
    /// Category label.
    #[serde(default)]
    pub category: ProbeCategory,
    /// Application user the statement runs as.
    pub user_id: String,
    /// Statement to run.
    pub sql: String,
    /// Positional parameters.
    #[serde(default)]
    pub params: Vec<Value>,
    /// Expected outcome.
    pub expect: ProbeExpectation,
}

impl AccessProbe {
    /// Runs the probe.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Connection`] when the database is unreachable.
    pub async fn run(
        &self,
        client: &dyn DatabaseClient,
    ) -> Result<ValidationResult, DatabaseError> {
        let outcome = client.query_as_user(&self.sql, &self.user_id, &self.params).await;
        let mut result = ValidationResult::new();
        let label = format!("Probe {} ({})", self.name, self.category);
        match (self.expect, outcome) {
            (_, Err(err @ DatabaseError::Connection(_))) => return Err(err),
            (ProbeExpectation::Authorized, Ok(_))
            | (
                ProbeExpectation::Denied | ProbeExpectation::Isolated,
                Err(DatabaseError::AccessDenied(_)),
            ) => {}
            (ProbeExpectation::Isolated, Ok(rows)) if rows.is_empty() => {}
            (ProbeExpectation::Authorized, Err(err)) => {
                result.push_error(format!("{label}: expected success, got {err}"));
            }
            (ProbeExpectation::Denied, Ok(rows)) => result.push_error(format!(
                "{label}: expected access denied, query succeeded with {} rows",
                rows.len()
            )),
            (ProbeExpectation::Denied, Err(err)) => {
                result.push_error(format!("{label}: expected access denied, got {err}"));
            }
            (ProbeExpectation::Isolated, Err(err)) => {
                result.push_error(format!("{label}: expected no visible rows, got {err}"));
            }
            (ProbeExpectation::Isolated, Ok(rows)) => result.push_error(format!(
                "{label}: returned {} rows that should be invisible to user {}",
                rows.len(),
                self.user_id
            )),
        }
        Ok(result)
    }
}

/// Runs probes in order.
///
/// # Errors
///
/// Returns [`DatabaseError::Connection`] when the database is unreachable.
pub async fn run_probes(
    client: &dyn DatabaseClient,
    probes: &[AccessProbe],
) -> Result<ValidationResult, DatabaseError> {
    let mut result = ValidationResult::new();
    for probe in probes {
        result.merge(probe.run(client).await?);
    }
    Ok(result)
}
