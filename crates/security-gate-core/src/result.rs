// crates/security-gate-core/src/result.rs
// ============================================================================
// Module: Gate Results
// Description: Validation and gate outcome records shared by every gate.
// Purpose: Provide composable, serializable pass/fail records with messages.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`ValidationResult`] is the composable unit returned by validation
//! primitives; gates concatenate them across pipeline stages. [`GateResult`]
//! is the outcome of one gate execution as seen by the runner and callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Validation Result
// ============================================================================

/// Outcome of a single validation concern.
///
/// # Invariants
/// - `valid` is false whenever `errors` is non-empty.
/// - Warnings never affect `valid` on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the validated value is acceptable.
    pub valid: bool,
    /// Ordered, human-readable error messages.
    pub errors: Vec<String>,
    /// Ordered, non-fatal advisories.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns an empty, passing result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns a failing result with a single error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.push_error(message);
        result
    }

    /// Records an error and marks the result invalid.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    /// Records a warning.
    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Records a message as an error when `escalate` is set, otherwise as a warning.
    pub fn push_advisory(&mut self, message: impl Into<String>, escalate: bool) {
        if escalate {
            self.push_error(message);
        } else {
            self.push_warning(message);
        }
    }

    /// Appends another result, preserving message order.
    pub fn merge(&mut self, other: Self) {
        self.valid &= other.valid && other.errors.is_empty();
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Returns true when any error has been recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// Outcome of one gate execution.
///
/// # Invariants
/// - `valid` doubles as the `passed` flag; [`GateResult::passed`] mirrors it.
/// - Constructors keep `valid == errors.is_empty()`; gates that promote
///   warnings under strict policies do so by adding errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Whether the gate passed.
    pub valid: bool,
    /// Ordered, human-readable error messages.
    pub errors: Vec<String>,
    /// Ordered, non-fatal advisories.
    pub warnings: Vec<String>,
    /// Free-text summary of what the gate checked.
    pub details: String,
    /// Wall-clock duration of the execution in milliseconds.
    pub execution_time_ms: u64,
    /// Open metadata bag (gate name, attempts, nested sub-results, ...).
    pub metadata: BTreeMap<String, Value>,
}

impl GateResult {
    /// Builds a passing result with a details summary.
    #[must_use]
    pub fn pass(details: impl Into<String>) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            details: details.into(),
            execution_time_ms: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Builds a failing result carrying a single error.
    #[must_use]
    pub fn fail(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            valid: false,
            details: error.clone(),
            errors: vec![error],
            warnings: Vec::new(),
            execution_time_ms: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Converts a validation result into a gate result.
    #[must_use]
    pub fn from_validation(validation: ValidationResult, details: impl Into<String>) -> Self {
        Self {
            valid: validation.valid && validation.errors.is_empty(),
            errors: validation.errors,
            warnings: validation.warnings,
            details: details.into(),
            execution_time_ms: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Returns whether the gate passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.valid
    }

    /// Adds a metadata entry, replacing any existing value for the key.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets the execution time in milliseconds.
    #[must_use]
    pub const fn with_execution_time_ms(mut self, execution_time_ms: u64) -> Self {
        self.execution_time_ms = execution_time_ms;
        self
    }
}
