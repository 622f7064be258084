// crates/security-gate-testing/src/suite.rs
// ============================================================================
// Module: Test Suite Contract
// Description: Suite trait, reports, errors, and the SecurityGate adapter.
// Purpose: Let the gate runner execute test suites like any other gate.
// Dependencies: async-trait, security-gate-core, serde, thiserror
// ============================================================================

//! ## Overview
//! Suite failures (a failing property, a crash, a violated invariant, a
//! breached threshold) are data in [`SuiteReport::failures`]. [`SuiteError`]
//! is reserved for suites that could not run at all, which the runner treats
//! as an operational fault and may retry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use security_gate_core::GateError;
use security_gate_core::GateExecutionContext;
use security_gate_core::GateResult;
use security_gate_core::SecurityGate;
use security_gate_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Kind of test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    /// Property-based tests.
    Property,
    /// Fuzz tests.
    Fuzz,
    /// Chaos-engineering tests.
    Chaos,
    /// Load tests.
    Load,
}

impl SuiteKind {
    /// Returns the snake-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Fuzz => "fuzz",
            Self::Chaos => "chaos",
            Self::Load => "load",
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one suite run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    /// Cases, iterations, rounds, or requests executed.
    pub cases: u64,
    /// Failure descriptions; empty when the suite passed.
    pub failures: Vec<String>,
    /// Non-blocking observations.
    pub notes: Vec<String>,
    /// Suite-specific measurements.
    pub metrics: BTreeMap<String, Value>,
}

impl SuiteReport {
    /// Creates an empty report for `cases` executed cases.
    #[must_use]
    pub const fn new(cases: u64) -> Self {
        Self {
            cases,
            failures: Vec::new(),
            notes: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Returns true when no failure was recorded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Records a failure.
    pub fn fail(&mut self, failure: impl Into<String>) {
        self.failures.push(failure.into());
    }

    /// Adds a metric.
    #[must_use]
    pub fn with_metric(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }
}

/// Errors preventing a suite from running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuiteError {
    /// The suite is misconfigured.
    #[error("invalid suite configuration: {0}")]
    Config(String),
    /// The suite harness failed while running.
    #[error("suite execution failed: {0}")]
    Execution(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Named asynchronous test suite.
#[async_trait]
pub trait TestSuite: Send + Sync {
    /// Unique suite name.
    fn name(&self) -> &str;

    /// Suite kind.
    fn kind(&self) -> SuiteKind;

    /// Runs the suite.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] when the suite cannot run.
    async fn run(&self) -> Result<SuiteReport, SuiteError>;
}

// ============================================================================
// SECTION: Gate Adapter
// ============================================================================

/// Exposes a [`TestSuite`] through the [`SecurityGate`] contract.
pub struct SuiteGate {
    /// Wrapped suite.
    suite: Arc<dyn TestSuite>,
    /// Cached description.
    description: String,
}

impl SuiteGate {
    /// Wraps a suite.
    #[must_use]
    pub fn new(suite: Arc<dyn TestSuite>) -> Self {
        let description = format!("{} test suite", suite.kind());
        Self {
            suite,
            description,
        }
    }
}

#[async_trait]
impl SecurityGate for SuiteGate {
    fn name(&self) -> &str {
        self.suite.name()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn execute(
        &self,
        _input: &Value,
        _context: GateExecutionContext,
    ) -> Result<GateResult, GateError> {
        let report = self.suite.run().await.map_err(|err| GateError::Execution(err.to_string()))?;
        let mut validation = ValidationResult::new();
        for failure in &report.failures {
            validation.push_error(failure.clone());
        }
        for note in &report.notes {
            validation.push_warning(note.clone());
        }
        let details = format!(
            "{} suite {} ran {} cases with {} failures",
            self.suite.kind(),
            self.suite.name(),
            report.cases,
            report.failures.len()
        );
        let metrics = serde_json::to_value(&report.metrics)
            .map_err(|err| GateError::Execution(err.to_string()))?;
        Ok(GateResult::from_validation(validation, details)
            .with_metadata("kind", self.suite.kind().as_str())
            .with_metadata("cases", report.cases)
            .with_metadata("metrics", metrics))
    }

    fn config(&self) -> Value {
        json!({"name": self.suite.name(), "kind": self.suite.kind()})
    }

    fn validate_config(&self, _config: &Value) -> GateResult {
        GateResult::from_validation(
            ValidationResult::error("test suites are configured in code"),
            "Suite configuration is not adjustable at runtime",
        )
    }
}
