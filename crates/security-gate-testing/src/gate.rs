// crates/security-gate-testing/src/gate.rs
// ============================================================================
// Module: Testing Gate
// Description: Gate orchestrating test suites through a nested gate runner.
// Purpose: Apply the runner's execution model to test suites.
// Dependencies: security-gate-core, serde_json
// ============================================================================

//! ## Overview
//! [`TestingGate`] owns a private [`GateRunner`] whose "gates" are
//! [`SuiteGate`] adapters. Parallel dispatch, sequential order, fail-fast,
//! timeouts, and retries all come from that runner's configuration. The
//! nested run report lands in the outer result's `suites` metadata.
//!
//! Input selects suites:
//! - `null` or `{}` runs every registered suite via `execute_all`.
//! - `{"suites": ["name", ...]}` runs the named suites via
//!   `execute_selected`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use security_gate_core::ContextOverrides;
use security_gate_core::GateError;
use security_gate_core::GateExecutionContext;
use security_gate_core::GateResult;
use security_gate_core::GateRunReport;
use security_gate_core::GateRunner;
use security_gate_core::GateRunnerConfig;
use security_gate_core::RegistryError;
use security_gate_core::SecurityGate;
use security_gate_core::ValidationResult;
use serde::Deserialize;
use serde_json::Value;

use crate::suite::SuiteGate;
use crate::suite::TestSuite;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registered name of the testing gate.
pub const TESTING_GATE_NAME: &str = "testing";

// ============================================================================
// SECTION: Input
// ============================================================================

/// Structured testing gate input.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TestingInput {
    /// Suites to run; all suites when absent.
    suites: Option<Vec<String>>,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Second-order gate whose checks are test suites.
pub struct TestingGate {
    /// Nested runner holding one [`SuiteGate`] per suite.
    runner: GateRunner,
}

impl TestingGate {
    /// Creates a testing gate with the given nested runner policy.
    #[must_use]
    pub fn new(config: GateRunnerConfig) -> Self {
        Self {
            runner: GateRunner::new(config),
        }
    }

    /// Registers a suite.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when a suite with the same name is
    /// already registered.
    pub fn add_suite(&self, suite: Arc<dyn TestSuite>) -> Result<(), RegistryError> {
        self.runner.register_shared(Arc::new(SuiteGate::new(suite)))
    }

    /// Returns registered suite names in registration order.
    #[must_use]
    pub fn suite_names(&self) -> Vec<String> {
        self.runner.list_gates().into_iter().map(|descriptor| descriptor.name).collect()
    }

    /// Runs all or the selected suites and returns the nested report.
    ///
    /// A fail-fast halt is reported, not raised.
    pub async fn run_suites(
        &self,
        selection: Option<&[String]>,
        overrides: ContextOverrides,
    ) -> GateRunReport {
        let overrides = Some(overrides);
        match selection {
            Some(names) => self.runner.execute_selected(names, &Value::Null, overrides).await,
            None => match self.runner.execute_all(&Value::Null, overrides).await {
                Ok(report) => report,
                Err(err) => err.into_report(),
            },
        }
    }
}

/// Folds a nested run report into one validation result.
fn fold_report(report: &GateRunReport) -> ValidationResult {
    let mut validation = ValidationResult::new();
    for outcome in &report.results {
        for error in &outcome.result.errors {
            validation.push_error(format!("{}: {error}", outcome.name));
        }
        for warning in &outcome.result.warnings {
            validation.push_warning(format!("{}: {warning}", outcome.name));
        }
    }
    if let Some(halted_by) = &report.halted_by {
        validation.push_warning(format!("Suite run halted by {halted_by}"));
    }
    validation
}

#[async_trait]
impl SecurityGate for TestingGate {
    fn name(&self) -> &str {
        TESTING_GATE_NAME
    }

    fn description(&self) -> &str {
        "Runs property, fuzz, chaos, and load test suites"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn execute(
        &self,
        input: &Value,
        context: GateExecutionContext,
    ) -> Result<GateResult, GateError> {
        let selection = if input.is_null() {
            TestingInput::default()
        } else {
            serde_json::from_value::<TestingInput>(input.clone())
                .map_err(|err| GateError::InvalidInput(format!("invalid testing input: {err}")))?
        };
        let overrides = ContextOverrides {
            request_id: context.request_id,
            user_id: context.user_id,
        };
        let report = self.run_suites(selection.suites.as_deref(), overrides).await;

        let validation = fold_report(&report);
        let summary = report.summary;
        let details = format!(
            "Ran {} test suites: {} passed, {} failed",
            summary.total, summary.passed, summary.failed
        );
        let suites = serde_json::to_value(&report.results)
            .map_err(|err| GateError::Execution(err.to_string()))?;
        let summary = serde_json::to_value(summary)
            .map_err(|err| GateError::Execution(err.to_string()))?;
        Ok(GateResult::from_validation(validation, details)
            .with_metadata("suites", suites)
            .with_metadata("summary", summary))
    }

    fn config(&self) -> Value {
        serde_json::to_value(self.runner.config()).unwrap_or(Value::Null)
    }

    fn validate_config(&self, config: &Value) -> GateResult {
        match serde_json::from_value::<GateRunnerConfig>(config.clone()) {
            Ok(candidate) if candidate.timeout_ms == 0 => {
                GateResult::fail("timeout_ms must be greater than zero")
            }
            Ok(_) => GateResult::pass("Testing gate configuration is valid"),
            Err(err) => GateResult::fail(format!("Invalid testing gate configuration: {err}")),
        }
    }
}
