// crates/security-gate-testing/src/fuzz.rs
// ============================================================================
// Module: Fuzz Suite
// Description: Seeded random-input fuzzing with crash capture.
// Purpose: Prove a target never panics on arbitrary byte input.
// Dependencies: rand, tokio
// ============================================================================

//! ## Overview
//! [`FuzzSuite`] feeds seeded random byte strings to a target. A target may
//! reject input by returning `Err`; that is expected and only counted. A panic
//! is a crash and fails the suite. The seed makes every input reproducible.
//! Iterations run on the blocking pool so a runner timeout still fires while
//! the target is busy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::suite::SuiteError;
use crate::suite::SuiteKind;
use crate::suite::SuiteReport;
use crate::suite::TestSuite;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Crash reports kept per run.
const MAX_REPORTED_CRASHES: usize = 5;

/// Leading input bytes included in a crash report.
const CRASH_PREVIEW_BYTES: usize = 16;

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Fuzz target over raw bytes.
type FuzzTarget = Arc<dyn Fn(&[u8]) -> Result<(), String> + Send + Sync>;

/// Seeded fuzz suite.
pub struct FuzzSuite {
    /// Suite name.
    name: String,
    /// Target under test.
    target: FuzzTarget,
    /// Inputs per run.
    iterations: u32,
    /// Longest generated input.
    max_len: usize,
    /// RNG seed.
    seed: u64,
}

impl FuzzSuite {
    /// Creates a suite with 1000 iterations of up to 256 bytes, seed 0.
    pub fn new(
        name: impl Into<String>,
        target: impl Fn(&[u8]) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            target: Arc::new(target),
            iterations: 1000,
            max_len: 256,
            seed: 0,
        }
    }

    /// Sets the iteration count.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the maximum input length.
    #[must_use]
    pub const fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Sets the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Copies the run parameters for a blocking task.
    const fn plan(&self) -> FuzzPlan {
        FuzzPlan {
            iterations: self.iterations,
            max_len: self.max_len,
            seed: self.seed,
        }
    }
}

/// Parameters of one fuzz run.
#[derive(Debug, Clone, Copy)]
struct FuzzPlan {
    /// Inputs per run.
    iterations: u32,
    /// Longest generated input.
    max_len: usize,
    /// RNG seed.
    seed: u64,
}

impl FuzzPlan {
    /// Runs every iteration synchronously.
    fn run(self, target: &FuzzTarget) -> SuiteReport {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut rejected = 0_u64;
        let mut crashes = 0_usize;
        let mut report = SuiteReport::new(u64::from(self.iterations));
        for iteration in 0 .. self.iterations {
            let len = rng.gen_range(0 ..= self.max_len);
            let mut input = vec![0_u8; len];
            rng.fill_bytes(&mut input);
            match catch_unwind(AssertUnwindSafe(|| (**target)(&input))) {
                Ok(Ok(())) => {}
                Ok(Err(_)) => rejected += 1,
                Err(_) => {
                    crashes += 1;
                    if report.failures.len() < MAX_REPORTED_CRASHES {
                        report.fail(format!(
                            "crash at iteration {iteration} (seed {}, {len} bytes, prefix {})",
                            self.seed,
                            hex_prefix(&input)
                        ));
                    }
                }
            }
        }
        if crashes > MAX_REPORTED_CRASHES {
            report
                .notes
                .push(format!("{crashes} crashes total; first {MAX_REPORTED_CRASHES} reported"));
        }
        report
            .with_metric("iterations", self.iterations)
            .with_metric("rejected", rejected)
            .with_metric("crashes", crashes)
            .with_metric("seed", self.seed)
    }
}

/// Hex-encodes the leading bytes of an input.
fn hex_prefix(input: &[u8]) -> String {
    input.iter().take(CRASH_PREVIEW_BYTES).map(|byte| format!("{byte:02x}")).collect()
}

#[async_trait]
impl TestSuite for FuzzSuite {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SuiteKind {
        SuiteKind::Fuzz
    }

    async fn run(&self) -> Result<SuiteReport, SuiteError> {
        if self.iterations == 0 {
            return Err(SuiteError::Config(format!(
                "{}: iterations must be greater than zero",
                self.name
            )));
        }
        let target = Arc::clone(&self.target);
        let plan = self.plan();
        tokio::task::spawn_blocking(move || plan.run(&target))
            .await
            .map_err(|err| SuiteError::Execution(format!("{}: {err}", self.name)))
    }
}
