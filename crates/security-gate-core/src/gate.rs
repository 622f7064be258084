// crates/security-gate-core/src/gate.rs
// ============================================================================
// Module: Security Gate Contract
// Description: Uniform interface implemented by every security gate.
// Purpose: Enable registry-based orchestration of heterogeneous gates.
// Dependencies: async-trait, serde, serde_json
// ============================================================================

//! ## Overview
//! A security gate is a named, versioned unit that validates one security
//! concern. The runner only ever sees this contract, so crypto, network,
//! access-control, and testing gates are interchangeable from its view.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::context::GateExecutionContext;
use crate::error::GateError;
use crate::result::GateResult;

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Security gate interface.
///
/// # Invariants
/// - `name` is stable for the lifetime of the gate and unique per runner.
/// - `execute` reports validation failures as `Ok` with `valid == false` and
///   reserves `Err` for operational faults.
/// - Gates own any external resources they hold and synchronize them
///   internally; the runner treats gates as opaque.
#[async_trait]
pub trait SecurityGate: Send + Sync {
    /// Returns the unique gate name.
    fn name(&self) -> &str;

    /// Returns a short description of the concern the gate validates.
    fn description(&self) -> &str;

    /// Returns the gate implementation version.
    fn version(&self) -> &str;

    /// Executes the gate against the supplied input.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when the gate cannot complete its checks.
    async fn execute(
        &self,
        input: &Value,
        context: GateExecutionContext,
    ) -> Result<GateResult, GateError>;

    /// Returns the active gate configuration.
    fn config(&self) -> Value;

    /// Validates a candidate configuration for this gate.
    fn validate_config(&self, config: &Value) -> GateResult;
}

/// Introspection record for a registered gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDescriptor {
    /// Gate name.
    pub name: String,
    /// Gate description.
    pub description: String,
    /// Gate version.
    pub version: String,
}

impl GateDescriptor {
    /// Builds a descriptor from a gate.
    #[must_use]
    pub fn of(gate: &dyn SecurityGate) -> Self {
        Self {
            name: gate.name().to_string(),
            description: gate.description().to_string(),
            version: gate.version().to_string(),
        }
    }
}
