// crates/security-gate-core/src/context.rs
// ============================================================================
// Module: Gate Execution Context
// Description: Per-invocation environment and identity values for gates.
// Purpose: Give every gate an immutable snapshot of where and when it runs.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A [`GateExecutionContext`] is created fresh for every gate invocation by
//! the runner and handed to the gate by value. Callers may supply request and
//! user identifiers through [`ContextOverrides`]; the timestamp and
//! environment are always set by the runner.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Deployment environment a gate run targets.
///
/// # Invariants
/// - Labels are stable for configuration and audit output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Pre-production staging.
    Staging,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Returns the stable label for the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Parses an environment label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "production" => Some(Self::Production),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Caller-supplied context values merged into each execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    /// Request identifier for correlation.
    pub request_id: Option<String>,
    /// User identifier the run is performed for.
    pub user_id: Option<String>,
}

impl ContextOverrides {
    /// Returns overrides carrying only a request identifier.
    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            user_id: None,
        }
    }
}

/// Immutable execution context handed to a gate.
///
/// # Invariants
/// - Never mutated after creation; each invocation receives its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateExecutionContext {
    /// Environment configured on the runner.
    pub environment: Environment,
    /// Wall-clock time the context was created.
    pub timestamp: OffsetDateTime,
    /// Optional request identifier.
    pub request_id: Option<String>,
    /// Optional user identifier.
    pub user_id: Option<String>,
}

impl GateExecutionContext {
    /// Creates a context stamped with the current UTC time.
    #[must_use]
    pub fn new(environment: Environment, overrides: ContextOverrides) -> Self {
        Self::at(environment, OffsetDateTime::now_utc(), overrides)
    }

    /// Creates a context with an explicit timestamp.
    #[must_use]
    pub fn at(
        environment: Environment,
        timestamp: OffsetDateTime,
        overrides: ContextOverrides,
    ) -> Self {
        Self {
            environment,
            timestamp,
            request_id: overrides.request_id,
            user_id: overrides.user_id,
        }
    }

    /// Returns the timestamp formatted as RFC 3339.
    #[must_use]
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string())
    }
}
