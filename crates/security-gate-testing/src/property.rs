// crates/security-gate-testing/src/property.rs
// ============================================================================
// Module: Property Suite
// Description: Property-based test suite backed by a proptest runner.
// Purpose: Check a property over generated inputs with reproducible seeds.
// Dependencies: proptest, tokio
// ============================================================================

//! ## Overview
//! [`PropertySuite`] drives a proptest [`TestRunner`] seeded with the
//! deterministic ChaCha RNG, so a failing run reproduces exactly. Failure
//! persistence is disabled; the suite never writes regression files. When the
//! property fails, the shrunk input is reported in the failure message.
//! Cases run on the blocking pool so a runner timeout still fires while the
//! property is busy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use proptest::strategy::Strategy;
use proptest::test_runner::Config;
use proptest::test_runner::RngAlgorithm;
use proptest::test_runner::TestCaseError;
use proptest::test_runner::TestError;
use proptest::test_runner::TestRng;
use proptest::test_runner::TestRunner;

use crate::suite::SuiteError;
use crate::suite::SuiteKind;
use crate::suite::SuiteReport;
use crate::suite::TestSuite;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of generated cases.
pub const DEFAULT_PROPERTY_CASES: u32 = 256;

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Property checked against each generated value.
type Property<V> = Arc<dyn Fn(V) -> Result<(), String> + Send + Sync>;

/// Property-based test suite.
pub struct PropertySuite<S: Strategy> {
    /// Suite name.
    name: String,
    /// Input generator.
    strategy: Arc<S>,
    /// Property under test.
    property: Property<S::Value>,
    /// Generated cases per run.
    cases: u32,
}

impl<S> PropertySuite<S>
where
    S: Strategy + Send + Sync + 'static,
{
    /// Creates a suite running [`DEFAULT_PROPERTY_CASES`] cases.
    pub fn new(
        name: impl Into<String>,
        strategy: S,
        property: impl Fn(S::Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            strategy: Arc::new(strategy),
            property: Arc::new(property),
            cases: DEFAULT_PROPERTY_CASES,
        }
    }

    /// Overrides the number of generated cases.
    #[must_use]
    pub const fn with_cases(mut self, cases: u32) -> Self {
        self.cases = cases;
        self
    }
}

/// Runs a property synchronously.
fn check_property<S: Strategy>(
    name: &str,
    cases: u32,
    strategy: &S,
    property: &Property<S::Value>,
) -> Result<SuiteReport, SuiteError> {
    let config = Config {
        cases,
        failure_persistence: None,
        ..Config::default()
    };
    let mut runner =
        TestRunner::new_with_rng(config, TestRng::deterministic_rng(RngAlgorithm::ChaCha));
    let outcome = runner.run(strategy, |value| (**property)(value).map_err(TestCaseError::fail));

    let mut report = SuiteReport::new(u64::from(cases));
    match outcome {
        Ok(()) => {}
        Err(TestError::Fail(reason, minimal)) => {
            #[allow(clippy::use_debug, reason = "Shrunk inputs only expose Debug formatting.")]
            let failure = format!("property failed: {reason} (minimal input: {minimal:?})");
            report.fail(failure);
        }
        Err(TestError::Abort(reason)) => {
            return Err(SuiteError::Execution(format!("{name}: {reason}")));
        }
    }
    Ok(report)
}

#[async_trait]
impl<S> TestSuite for PropertySuite<S>
where
    S: Strategy + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SuiteKind {
        SuiteKind::Property
    }

    async fn run(&self) -> Result<SuiteReport, SuiteError> {
        if self.cases == 0 {
            return Err(SuiteError::Config(format!(
                "{}: cases must be greater than zero",
                self.name
            )));
        }
        let name = self.name.clone();
        let cases = self.cases;
        let strategy = Arc::clone(&self.strategy);
        let property = Arc::clone(&self.property);
        tokio::task::spawn_blocking(move || check_property(&name, cases, &*strategy, &property))
            .await
            .map_err(|err| SuiteError::Execution(format!("{}: {err}", self.name)))?
    }
}
