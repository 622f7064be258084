// crates/security-gate-testing/src/load.rs
// ============================================================================
// Module: Load Suite
// Description: Concurrent load generation with latency and error thresholds.
// Purpose: Fail releases whose p95 latency or error rate exceed limits.
// Dependencies: async-trait, tokio
// ============================================================================

//! ## Overview
//! [`LoadSuite`] spreads a fixed number of calls across `concurrency` workers
//! on a [`JoinSet`]. Latency is measured with [`tokio::time::Instant`], so
//! paused-clock tests observe virtual time. The p95 is the nearest-rank
//! percentile: index `ceil(0.95 * n) - 1` of the sorted latencies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::suite::SuiteError;
use crate::suite::SuiteKind;
use crate::suite::SuiteReport;
use crate::suite::TestSuite;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Operation under load.
#[async_trait]
pub trait LoadTarget: Send + Sync {
    /// Performs one call.
    ///
    /// # Errors
    ///
    /// Returns a description when the call fails.
    async fn call(&self) -> Result<(), String>;
}

/// Pass/fail limits for a load run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadThresholds {
    /// Maximum p95 latency in milliseconds.
    pub max_p95_ms: u64,
    /// Maximum share of failed calls.
    pub max_error_rate: f64,
}

impl Default for LoadThresholds {
    fn default() -> Self {
        Self {
            max_p95_ms: 500,
            max_error_rate: 0.01,
        }
    }
}

/// Per-worker latency samples and error count.
struct WorkerSamples {
    /// Call latencies in milliseconds.
    latencies_ms: Vec<u64>,
    /// Failed calls.
    errors: u64,
}

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Concurrent load suite.
pub struct LoadSuite {
    /// Suite name.
    name: String,
    /// Target under load.
    target: Arc<dyn LoadTarget>,
    /// Worker count.
    concurrency: usize,
    /// Total calls.
    requests: u64,
    /// Pass/fail limits.
    thresholds: LoadThresholds,
}

impl LoadSuite {
    /// Creates a load suite.
    pub fn new(
        name: impl Into<String>,
        target: Arc<dyn LoadTarget>,
        concurrency: usize,
        requests: u64,
        thresholds: LoadThresholds,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            concurrency,
            requests,
            thresholds,
        }
    }

    /// Returns configuration problems; empty when valid.
    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.concurrency == 0 {
            problems.push("concurrency must be greater than zero".to_string());
        }
        if self.requests == 0 {
            problems.push("requests must be greater than zero".to_string());
        }
        if !(0.0 ..= 1.0).contains(&self.thresholds.max_error_rate) {
            problems.push("max_error_rate must be between 0.0 and 1.0".to_string());
        }
        problems
    }
}

/// Runs `calls` sequential calls against the target.
async fn worker(target: Arc<dyn LoadTarget>, calls: u64) -> WorkerSamples {
    let mut samples = WorkerSamples {
        latencies_ms: Vec::new(),
        errors: 0,
    };
    for _ in 0 .. calls {
        let started = Instant::now();
        let outcome = target.call().await;
        samples.latencies_ms.push(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
        if outcome.is_err() {
            samples.errors += 1;
        }
    }
    samples
}

/// Returns the nearest-rank percentile of sorted samples.
#[must_use]
pub fn percentile(sorted: &[u64], percent: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (sorted.len() * percent).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

#[async_trait]
impl TestSuite for LoadSuite {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SuiteKind {
        SuiteKind::Load
    }

    async fn run(&self) -> Result<SuiteReport, SuiteError> {
        let problems = self.problems();
        if !problems.is_empty() {
            return Err(SuiteError::Config(format!("{}: {}", self.name, problems.join("; "))));
        }

        let workers = u64::try_from(self.concurrency).unwrap_or(u64::MAX).min(self.requests);
        let mut set = JoinSet::new();
        for index in 0 .. workers {
            let calls = self.requests / workers + u64::from(index < self.requests % workers);
            set.spawn(worker(Arc::clone(&self.target), calls));
        }

        let mut latencies = Vec::new();
        let mut errors = 0_u64;
        while let Some(joined) = set.join_next().await {
            let samples =
                joined.map_err(|err| SuiteError::Execution(format!("{}: {err}", self.name)))?;
            latencies.extend(samples.latencies_ms);
            errors += samples.errors;
        }
        latencies.sort_unstable();

        let p95 = percentile(&latencies, 95);
        #[allow(clippy::cast_precision_loss, reason = "Request counts stay far below 2^52.")]
        let error_rate = errors as f64 / self.requests as f64;

        let mut report = SuiteReport::new(self.requests);
        if p95 > self.thresholds.max_p95_ms {
            report.fail(format!("p95 latency {p95}ms exceeds {}ms", self.thresholds.max_p95_ms));
        }
        if error_rate > self.thresholds.max_error_rate {
            report.fail(format!(
                "error rate {error_rate:.3} exceeds {:.3}",
                self.thresholds.max_error_rate
            ));
        }
        Ok(report
            .with_metric("requests", self.requests)
            .with_metric("errors", errors)
            .with_metric("concurrency", workers)
            .with_metric("p50_ms", percentile(&latencies, 50))
            .with_metric("p95_ms", p95)
            .with_metric("max_ms", latencies.last().copied().unwrap_or(0))
            .with_metric("error_rate", error_rate))
    }
}
