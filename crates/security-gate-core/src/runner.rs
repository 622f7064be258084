// crates/security-gate-core/src/runner.rs
// ============================================================================
// Module: Gate Runner
// Description: Registry and concurrent executor for security gates.
// Purpose: Run gates under uniform timeout, retry, and fail-fast policy and
//          aggregate their results deterministically.
// Dependencies: serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! The [`GateRunner`] owns a name-keyed registry of [`SecurityGate`]s and
//! executes one, a selection, or all of them.
//!
//! Execution model:
//! - Every gate attempt runs as its own tokio task raced against the
//!   configured timeout. A timeout abandons the wait only: the task is
//!   detached, not cancelled, and may keep running in the background.
//! - Operational faults (gate `Err`, task panic, timeout) are retried up to
//!   `retries` additional times with a `2^attempt` second backoff. Validation
//!   failures are never retried.
//! - Parallel `execute_all` dispatches every gate, waits for all of them, then
//!   applies fail-fast after the fact. Sequential runs stop dispatching at the
//!   first failing gate when `fail_fast` is set.
//! - Results are always aggregated in registration (or caller list) order.
//!
//! The registry lock is never held across an await point; runs operate on a
//! snapshot of the registry taken before dispatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::audit::GateAuditSink;
use crate::audit::GateExecutionEvent;
use crate::audit::GateExecutionEventParams;
use crate::audit::GateOutcomeKind;
use crate::audit::GateRunEvent;
use crate::audit::NoopAuditSink;
use crate::audit::RunMode;
use crate::context::ContextOverrides;
use crate::context::Environment;
use crate::context::GateExecutionContext;
use crate::error::RegistryError;
use crate::error::RunError;
use crate::gate::GateDescriptor;
use crate::gate::SecurityGate;
use crate::result::GateResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-gate timeout in milliseconds.
pub const DEFAULT_GATE_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Runner execution policy.
///
/// # Invariants
/// - Missing fields take the documented defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateRunnerConfig {
    /// Stop on the first failing gate (post-hoc in parallel mode).
    pub fail_fast: bool,
    /// Dispatch gates concurrently in `execute_all`.
    pub parallel: bool,
    /// Per-gate, per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Additional attempts after an operational fault.
    pub retries: u32,
    /// Environment stamped onto every execution context.
    pub environment: Environment,
}

impl GateRunnerConfig {
    /// Returns the per-attempt timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GateRunnerConfig {
    fn default() -> Self {
        Self {
            fail_fast: true,
            parallel: true,
            timeout_ms: DEFAULT_GATE_TIMEOUT_MS,
            retries: 0,
            environment: Environment::Development,
        }
    }
}

// ============================================================================
// SECTION: Run Reports
// ============================================================================

/// Result of one gate within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateOutcome {
    /// Gate name.
    pub name: String,
    /// Gate result.
    pub result: GateResult,
}

/// Aggregate counters across the gates that ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateRunSummary {
    /// Gates that produced a result.
    pub total: usize,
    /// Gates whose result is valid.
    pub passed: usize,
    /// Gates whose result is invalid.
    pub failed: usize,
    /// Sum of error counts.
    pub total_errors: usize,
    /// Sum of warning counts.
    pub total_warnings: usize,
}

impl GateRunSummary {
    /// Computes the summary for a set of outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: &[GateOutcome]) -> Self {
        let passed = outcomes.iter().filter(|outcome| outcome.result.valid).count();
        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            total_errors: outcomes.iter().map(|outcome| outcome.result.errors.len()).sum(),
            total_warnings: outcomes.iter().map(|outcome| outcome.result.warnings.len()).sum(),
        }
    }

    /// Returns true when no gate failed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Ordered results and summary of a multi-gate run.
///
/// # Invariants
/// - `results` follow registration order (or the caller's list order).
/// - `summary` is computed from `results`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateRunReport {
    /// Per-gate results.
    pub results: Vec<GateOutcome>,
    /// Aggregate counters.
    pub summary: GateRunSummary,
    /// Gate that triggered fail-fast, when any.
    pub halted_by: Option<String>,
}

impl GateRunReport {
    /// Builds a report and computes its summary.
    #[must_use]
    pub fn new(results: Vec<GateOutcome>, halted_by: Option<String>) -> Self {
        let summary = GateRunSummary::from_outcomes(&results);
        Self {
            results,
            summary,
            halted_by,
        }
    }

    /// Returns the result for a gate name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GateResult> {
        self.results.iter().find(|outcome| outcome.name == name).map(|outcome| &outcome.result)
    }

    /// Returns gate names in report order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|outcome| outcome.name.as_str()).collect()
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Registry entry binding a gate to its unique name.
struct RegisteredGate {
    /// Registry key.
    name: String,
    /// Shared gate instance.
    gate: Arc<dyn SecurityGate>,
}

/// Per-gate execution policy copied into each dispatched task.
#[derive(Clone)]
struct ExecutionPolicy {
    /// Per-attempt timeout.
    timeout: Duration,
    /// Additional attempts after a fault.
    retries: u32,
    /// Runner environment.
    environment: Environment,
    /// Audit sink for execution events.
    audit: Arc<dyn GateAuditSink>,
}

/// Security gate registry and executor.
///
/// # Invariants
/// - Gate names are unique within the registry.
/// - Registration order is preserved and drives result order.
/// - The registry lock is released before any gate is awaited.
pub struct GateRunner {
    /// Execution policy.
    config: GateRunnerConfig,
    /// Registered gates in registration order.
    gates: RwLock<Vec<RegisteredGate>>,
    /// Audit sink for gate and run events.
    audit: Arc<dyn GateAuditSink>,
}

impl GateRunner {
    /// Creates an empty runner.
    #[must_use]
    pub fn new(config: GateRunnerConfig) -> Self {
        Self {
            config,
            gates: RwLock::new(Vec::new()),
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn GateAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the runner configuration.
    #[must_use]
    pub const fn config(&self) -> &GateRunnerConfig {
        &self.config
    }

    /// Registers a gate under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the name is empty or already registered.
    pub fn register_gate(&self, gate: impl SecurityGate + 'static) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(gate))
    }

    /// Registers an already shared gate under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the name is empty or already registered.
    pub fn register_shared(&self, gate: Arc<dyn SecurityGate>) -> Result<(), RegistryError> {
        let name = gate.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let mut gates = self.gates.write().unwrap_or_else(PoisonError::into_inner);
        if gates.iter().any(|entry| entry.name == name) {
            return Err(RegistryError::Duplicate(name));
        }
        gates.push(RegisteredGate {
            name,
            gate,
        });
        Ok(())
    }

    /// Removes a gate; returns true when a gate was removed.
    pub fn unregister_gate(&self, name: &str) -> bool {
        let mut gates = self.gates.write().unwrap_or_else(PoisonError::into_inner);
        let before = gates.len();
        gates.retain(|entry| entry.name != name);
        gates.len() != before
    }

    /// Lists registered gates in registration order.
    #[must_use]
    pub fn list_gates(&self) -> Vec<GateDescriptor> {
        self.snapshot().iter().map(|(_, gate)| GateDescriptor::of(gate.as_ref())).collect()
    }

    /// Returns the named gate's configuration, or `None` if not registered.
    #[must_use]
    pub fn gate_config(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|gate| gate.config())
    }

    /// Validates a configuration against the named gate, or `None` if not registered.
    #[must_use]
    pub fn validate_gate_config(&self, name: &str, config: &Value) -> Option<GateResult> {
        self.lookup(name).map(|gate| gate.validate_config(config))
    }

    /// Executes a single gate by name.
    ///
    /// A missing gate is reported as a failed result, never as an error.
    pub async fn execute_gate(
        &self,
        name: &str,
        input: &Value,
        overrides: Option<ContextOverrides>,
    ) -> GateResult {
        let overrides = overrides.unwrap_or_default();
        let input = Arc::new(input.clone());
        self.execute_named(name, self.lookup(name), input, overrides).await
    }

    /// Executes every registered gate.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::FailFast`] in parallel mode when `fail_fast` is set
    /// and any gate failed. Every gate has run by then; the error carries the
    /// complete report.
    pub async fn execute_all(
        &self,
        input: &Value,
        overrides: Option<ContextOverrides>,
    ) -> Result<GateRunReport, RunError> {
        let gates = self.snapshot();
        let input = Arc::new(input.clone());
        let overrides = overrides.unwrap_or_default();

        if !self.config.parallel {
            let mut results = Vec::with_capacity(gates.len());
            let mut halted_by = None;
            for (name, gate) in gates {
                let result = self
                    .execute_named(&name, Some(gate), Arc::clone(&input), overrides.clone())
                    .await;
                let failed = !result.valid;
                results.push(GateOutcome {
                    name: name.clone(),
                    result,
                });
                if failed && self.config.fail_fast {
                    halted_by = Some(name);
                    break;
                }
            }
            let report = GateRunReport::new(results, halted_by);
            self.record_run(RunMode::Sequential, &report);
            return Ok(report);
        }

        let tasks: Vec<(String, JoinHandle<GateResult>)> = gates
            .into_iter()
            .map(|(name, gate)| {
                let context = GateExecutionContext::new(self.config.environment, overrides.clone());
                let task = tokio::spawn(run_gate(
                    self.policy(),
                    name.clone(),
                    gate,
                    Arc::clone(&input),
                    context,
                ));
                (name, task)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => GateResult::fail(format!("Security gate '{name}' panicked: {err}")),
            };
            results.push(GateOutcome {
                name,
                result,
            });
        }

        let halted_by = if self.config.fail_fast {
            results.iter().find(|outcome| !outcome.result.valid).map(|outcome| outcome.name.clone())
        } else {
            None
        };
        let report = GateRunReport::new(results, halted_by.clone());
        self.record_run(RunMode::Parallel, &report);
        match halted_by {
            Some(gate) => {
                let reason =
                    report.get(&gate).map(|result| result.errors.join("; ")).unwrap_or_default();
                Err(RunError::FailFast {
                    gate,
                    reason,
                    report: Box::new(report),
                })
            }
            None => Ok(report),
        }
    }

    /// Executes caller-selected gates sequentially in list order.
    ///
    /// Unknown names yield "not found" results. `fail_fast` stops the loop at
    /// the first failing result.
    pub async fn execute_selected<S: AsRef<str>>(
        &self,
        names: &[S],
        input: &Value,
        overrides: Option<ContextOverrides>,
    ) -> GateRunReport {
        let input = Arc::new(input.clone());
        let overrides = overrides.unwrap_or_default();
        let mut results = Vec::with_capacity(names.len());
        let mut halted_by = None;
        for name in names {
            let name = name.as_ref();
            let result = self
                .execute_named(name, self.lookup(name), Arc::clone(&input), overrides.clone())
                .await;
            let failed = !result.valid;
            results.push(GateOutcome {
                name: name.to_string(),
                result,
            });
            if failed && self.config.fail_fast {
                halted_by = Some(name.to_string());
                break;
            }
        }
        let report = GateRunReport::new(results, halted_by);
        self.record_run(RunMode::Selected, &report);
        report
    }

    /// Runs a looked-up gate, or reports it missing.
    async fn execute_named(
        &self,
        name: &str,
        gate: Option<Arc<dyn SecurityGate>>,
        input: Arc<Value>,
        overrides: ContextOverrides,
    ) -> GateResult {
        let Some(gate) = gate else {
            return self.not_found(name, overrides);
        };
        let context = GateExecutionContext::new(self.config.environment, overrides);
        run_gate(self.policy(), name.to_string(), gate, input, context).await
    }

    /// Builds and audits the result for an unregistered gate.
    fn not_found(&self, name: &str, overrides: ContextOverrides) -> GateResult {
        let result = GateResult::fail(format!("Security gate '{name}' not found"))
            .with_metadata("gate_name", name)
            .with_metadata("environment", self.config.environment.as_str());
        self.audit.record_gate(&GateExecutionEvent::new(GateExecutionEventParams {
            gate_name: name.to_string(),
            environment: self.config.environment,
            request_id: overrides.request_id,
            outcome: GateOutcomeKind::NotFound,
            attempts: 0,
            error_count: result.errors.len(),
            warning_count: 0,
            execution_time_ms: 0,
        }));
        result
    }

    /// Records a run event.
    fn record_run(&self, mode: RunMode, report: &GateRunReport) {
        self.audit.record_run(&GateRunEvent::new(
            mode,
            self.config.environment,
            &report.summary,
            report.halted_by.clone(),
        ));
    }

    /// Returns the execution policy for dispatched tasks.
    fn policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            timeout: self.config.timeout(),
            retries: self.config.retries,
            environment: self.config.environment,
            audit: Arc::clone(&self.audit),
        }
    }

    /// Looks up a gate by name without holding the lock afterwards.
    fn lookup(&self, name: &str) -> Option<Arc<dyn SecurityGate>> {
        let gates = self.gates.read().unwrap_or_else(PoisonError::into_inner);
        gates.iter().find(|entry| entry.name == name).map(|entry| Arc::clone(&entry.gate))
    }

    /// Copies the registry in registration order.
    fn snapshot(&self) -> Vec<(String, Arc<dyn SecurityGate>)> {
        let gates = self.gates.read().unwrap_or_else(PoisonError::into_inner);
        gates.iter().map(|entry| (entry.name.clone(), Arc::clone(&entry.gate))).collect()
    }
}

impl Default for GateRunner {
    fn default() -> Self {
        Self::new(GateRunnerConfig::default())
    }
}

// ============================================================================
// SECTION: Attempt Loop
// ============================================================================

/// Operational fault observed on one attempt.
enum AttemptFault {
    /// Gate returned an error or its task panicked.
    Error(String),
    /// Deadline elapsed before the gate finished.
    Timeout(String),
}

impl AttemptFault {
    /// Returns the fault message.
    fn message(&self) -> &str {
        match self {
            Self::Error(message) | Self::Timeout(message) => message,
        }
    }

    /// Returns the audit outcome label.
    const fn outcome(&self) -> GateOutcomeKind {
        match self {
            Self::Error(_) => GateOutcomeKind::Fault,
            Self::Timeout(_) => GateOutcomeKind::Timeout,
        }
    }
}

/// Runs a gate with timeout and retry handling and enriches its metadata.
async fn run_gate(
    policy: ExecutionPolicy,
    name: String,
    gate: Arc<dyn SecurityGate>,
    input: Arc<Value>,
    context: GateExecutionContext,
) -> GateResult {
    let max_attempts = policy.retries.saturating_add(1);
    let started = Instant::now();
    let mut last_fault = AttemptFault::Error(format!("Security gate '{name}' did not run"));

    for attempt in 0..max_attempts {
        let attempt_started = Instant::now();
        match attempt_once(&policy, &name, &gate, &input, &context).await {
            Ok(mut result) => {
                if result.execution_time_ms == 0 {
                    result.execution_time_ms = elapsed_ms(attempt_started);
                }
                result.metadata.insert("gate_name".to_string(), Value::from(name.as_str()));
                result.metadata.insert("attempt".to_string(), Value::from(attempt + 1));
                result
                    .metadata
                    .insert("timestamp".to_string(), Value::from(context.timestamp_rfc3339()));
                result
                    .metadata
                    .insert("environment".to_string(), Value::from(policy.environment.as_str()));
                let outcome =
                    if result.valid { GateOutcomeKind::Passed } else { GateOutcomeKind::Failed };
                record_gate(&policy, &name, &context, outcome, attempt + 1, &result);
                return result;
            }
            Err(fault) => {
                last_fault = fault;
                if attempt + 1 < max_attempts {
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
            }
        }
    }

    let result = GateResult::fail(last_fault.message())
        .with_execution_time_ms(elapsed_ms(started))
        .with_metadata("gate_name", name.as_str())
        .with_metadata("attempts", max_attempts)
        .with_metadata("environment", policy.environment.as_str())
        .with_metadata("fault", true);
    record_gate(&policy, &name, &context, last_fault.outcome(), max_attempts, &result);
    result
}

/// Runs one attempt as a detached task raced against the timeout.
async fn attempt_once(
    policy: &ExecutionPolicy,
    name: &str,
    gate: &Arc<dyn SecurityGate>,
    input: &Arc<Value>,
    context: &GateExecutionContext,
) -> Result<GateResult, AttemptFault> {
    let task = tokio::spawn({
        let gate = Arc::clone(gate);
        let input = Arc::clone(input);
        let context = context.clone();
        async move { gate.execute(&input, context).await }
    });
    // Dropping the handle on timeout detaches the task; it is not aborted.
    match tokio::time::timeout(policy.timeout, task).await {
        Ok(Ok(Ok(result))) => Ok(result),
        Ok(Ok(Err(err))) => Err(AttemptFault::Error(err.to_string())),
        Ok(Err(err)) => Err(AttemptFault::Error(format!("Security gate '{name}' panicked: {err}"))),
        Err(_) => Err(AttemptFault::Timeout(format!(
            "Security gate '{name}' timed out after {}ms",
            policy.timeout.as_millis()
        ))),
    }
}

/// Emits the audit event for a finished gate execution.
fn record_gate(
    policy: &ExecutionPolicy,
    name: &str,
    context: &GateExecutionContext,
    outcome: GateOutcomeKind,
    attempts: u32,
    result: &GateResult,
) {
    policy.audit.record_gate(&GateExecutionEvent::new(GateExecutionEventParams {
        gate_name: name.to_string(),
        environment: policy.environment,
        request_id: context.request_id.clone(),
        outcome,
        attempts,
        error_count: result.errors.len(),
        warning_count: result.warnings.len(),
        execution_time_ms: result.execution_time_ms,
    }));
}

/// Returns the backoff delay after a failed attempt (`2^attempt` seconds).
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Returns elapsed milliseconds, saturating at `u64::MAX`.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
