// crates/security-gate-testing/src/chaos.rs
// ============================================================================
// Module: Chaos Suite
// Description: Seeded fault injection against a scenario with an invariant.
// Purpose: Prove a system keeps its invariant under latency and error faults.
// Dependencies: async-trait, rand, serde, tokio
// ============================================================================

//! ## Overview
//! Each round draws a [`FaultPlan`] from a seeded RNG: an optional injected
//! latency (applied by the suite before the operation) and an optional
//! injected error (applied by the scenario itself). After every round the
//! scenario's invariant must hold.
//!
//! A round fails when:
//! - the operation errors although no error was injected, or
//! - the invariant check reports a violation.
//!
//! Operation errors under an injected fault are expected and only counted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use serde::Serialize;

use crate::suite::SuiteError;
use crate::suite::SuiteKind;
use crate::suite::SuiteReport;
use crate::suite::TestSuite;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Fault injection settings.
///
/// # Invariants
/// - `error_rate` and `latency_rate` lie in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChaosConfig {
    /// Rounds per run.
    pub rounds: u32,
    /// Probability that a round injects an error.
    pub error_rate: f64,
    /// Probability that a round injects latency.
    pub latency_rate: f64,
    /// Upper bound for injected latency.
    pub max_latency_ms: u64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            rounds: 50,
            error_rate: 0.2,
            latency_rate: 0.2,
            max_latency_ms: 100,
            seed: 0,
        }
    }
}

impl ChaosConfig {
    /// Returns configuration problems; empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.rounds == 0 {
            problems.push("rounds must be greater than zero".to_string());
        }
        let rates = [("error_rate", self.error_rate), ("latency_rate", self.latency_rate)];
        for (field, rate) in rates {
            if !(0.0 ..= 1.0).contains(&rate) {
                problems.push(format!("{field} must be between 0.0 and 1.0, got {rate}"));
            }
        }
        problems
    }
}

/// Faults injected into one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPlan {
    /// Zero-based round index.
    pub round: u32,
    /// Latency applied before the operation.
    pub latency: Option<Duration>,
    /// Whether the scenario must fail its operation this round.
    pub inject_error: bool,
}

impl FaultPlan {
    /// Returns a plan with no faults.
    #[must_use]
    pub const fn calm(round: u32) -> Self {
        Self {
            round,
            latency: None,
            inject_error: false,
        }
    }

    /// Draws the plan for `round`.
    fn draw(round: u32, config: &ChaosConfig, rng: &mut StdRng) -> Self {
        let latency = rng
            .gen_bool(config.latency_rate)
            .then(|| Duration::from_millis(rng.gen_range(0 ..= config.max_latency_ms)));
        Self {
            round,
            latency,
            inject_error: rng.gen_bool(config.error_rate),
        }
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// System under chaos.
#[async_trait]
pub trait ChaosScenario: Send + Sync {
    /// Performs one operation, failing it when `plan.inject_error` is set.
    ///
    /// # Errors
    ///
    /// Returns a description when the operation fails.
    async fn execute(&self, plan: &FaultPlan) -> Result<(), String>;

    /// Checks the scenario invariant.
    ///
    /// # Errors
    ///
    /// Returns a description of the violation.
    async fn check_invariant(&self) -> Result<(), String>;
}

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Chaos-engineering suite.
pub struct ChaosSuite {
    /// Suite name.
    name: String,
    /// Scenario under test.
    scenario: Box<dyn ChaosScenario>,
    /// Fault settings.
    config: ChaosConfig,
}

impl ChaosSuite {
    /// Creates a chaos suite.
    pub fn new(
        name: impl Into<String>,
        scenario: impl ChaosScenario + 'static,
        config: ChaosConfig,
    ) -> Self {
        Self {
            name: name.into(),
            scenario: Box::new(scenario),
            config,
        }
    }
}

#[async_trait]
impl TestSuite for ChaosSuite {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SuiteKind {
        SuiteKind::Chaos
    }

    async fn run(&self) -> Result<SuiteReport, SuiteError> {
        let problems = self.config.validate();
        if !problems.is_empty() {
            return Err(SuiteError::Config(format!("{}: {}", self.name, problems.join("; "))));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut report = SuiteReport::new(u64::from(self.config.rounds));
        let mut injected_errors = 0_u32;
        let mut injected_latency = 0_u32;
        let mut absorbed_errors = 0_u32;
        for round in 0 .. self.config.rounds {
            let plan = FaultPlan::draw(round, &self.config, &mut rng);
            if let Some(latency) = plan.latency {
                injected_latency += 1;
                tokio::time::sleep(latency).await;
            }
            if plan.inject_error {
                injected_errors += 1;
            }
            match self.scenario.execute(&plan).await {
                Ok(()) => {}
                Err(_) if plan.inject_error => absorbed_errors += 1,
                Err(err) => {
                    report.fail(format!(
                        "round {round}: operation failed without an injected fault: {err}"
                    ));
                }
            }
            if let Err(violation) = self.scenario.check_invariant().await {
                report.fail(format!("round {round}: invariant violated: {violation}"));
            }
        }
        if absorbed_errors < injected_errors {
            report.notes.push(format!(
                "{} injected errors did not surface from the operation",
                injected_errors - absorbed_errors
            ));
        }
        Ok(report
            .with_metric("rounds", self.config.rounds)
            .with_metric("injected_errors", injected_errors)
            .with_metric("injected_latency", injected_latency)
            .with_metric("seed", self.config.seed))
    }
}
