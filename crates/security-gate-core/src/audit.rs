// crates/security-gate-core/src/audit.rs
// ============================================================================
// Module: Gate Audit Logging
// Description: Structured audit events for gate executions and runs.
// Purpose: Emit JSON-line audit records without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every gate execution and every multi-gate run produces an audit event.
//! Events carry counters and identifiers only; raw gate inputs (envelopes,
//! packet payloads, SQL parameters) are never recorded. Sinks are pluggable
//! so deployments can route events to their own logging pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::context::Environment;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Classification of a single gate execution outcome.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcomeKind {
    /// Gate ran and passed.
    Passed,
    /// Gate ran and reported a validation failure.
    Failed,
    /// Gate raised an operational fault on its final attempt.
    Fault,
    /// Gate exceeded its deadline on its final attempt.
    Timeout,
    /// Gate name was not registered.
    NotFound,
}

/// Dispatch mode of a multi-gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// All gates dispatched concurrently.
    Parallel,
    /// All gates executed one at a time.
    Sequential,
    /// Caller-selected gates executed one at a time.
    Selected,
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Audit record for one gate execution.
#[derive(Debug, Clone, Serialize)]
pub struct GateExecutionEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Gate name.
    pub gate_name: String,
    /// Runner environment.
    pub environment: Environment,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Outcome classification.
    pub outcome: GateOutcomeKind,
    /// Number of attempts made.
    pub attempts: u32,
    /// Number of errors in the result.
    pub error_count: usize,
    /// Number of warnings in the result.
    pub warning_count: usize,
    /// Execution time in milliseconds.
    pub execution_time_ms: u64,
}

/// Inputs required to construct a gate execution event.
pub struct GateExecutionEventParams {
    /// Gate name.
    pub gate_name: String,
    /// Runner environment.
    pub environment: Environment,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Outcome classification.
    pub outcome: GateOutcomeKind,
    /// Number of attempts made.
    pub attempts: u32,
    /// Number of errors in the result.
    pub error_count: usize,
    /// Number of warnings in the result.
    pub warning_count: usize,
    /// Execution time in milliseconds.
    pub execution_time_ms: u64,
}

impl GateExecutionEvent {
    /// Creates a new gate execution event with a consistent timestamp.
    #[must_use]
    pub fn new(params: GateExecutionEventParams) -> Self {
        Self {
            event: "gate_execution",
            timestamp_ms: now_ms(),
            gate_name: params.gate_name,
            environment: params.environment,
            request_id: params.request_id,
            outcome: params.outcome,
            attempts: params.attempts,
            error_count: params.error_count,
            warning_count: params.warning_count,
            execution_time_ms: params.execution_time_ms,
        }
    }
}

/// Audit record for one multi-gate run.
#[derive(Debug, Clone, Serialize)]
pub struct GateRunEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Dispatch mode.
    pub mode: RunMode,
    /// Runner environment.
    pub environment: Environment,
    /// Gates that produced a result.
    pub total: usize,
    /// Gates that passed.
    pub passed: usize,
    /// Gates that failed.
    pub failed: usize,
    /// Total error count across gates.
    pub total_errors: usize,
    /// Total warning count across gates.
    pub total_warnings: usize,
    /// Gate that triggered fail-fast, when any.
    pub halted_by: Option<String>,
}

impl GateRunEvent {
    /// Creates a new run event with a consistent timestamp.
    #[must_use]
    pub fn new(
        mode: RunMode,
        environment: Environment,
        summary: &crate::runner::GateRunSummary,
        halted_by: Option<String>,
    ) -> Self {
        Self {
            event: "gate_run",
            timestamp_ms: now_ms(),
            mode,
            environment,
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            total_errors: summary.total_errors,
            total_warnings: summary.total_warnings,
            halted_by,
        }
    }
}

/// Returns the current time in milliseconds since the unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for gate events.
pub trait GateAuditSink: Send + Sync {
    /// Record a gate execution event.
    fn record_gate(&self, event: &GateExecutionEvent);

    /// Record a run event.
    fn record_run(&self, _event: &GateRunEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl GateAuditSink for StderrAuditSink {
    fn record_gate(&self, event: &GateExecutionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_run(&self, event: &GateRunEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized payload line.
    fn append(&self, payload: &str) {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(guard, "{payload}");
        let _ = guard.flush();
    }
}

impl GateAuditSink for FileAuditSink {
    fn record_gate(&self, event: &GateExecutionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_run(&self, event: &GateRunEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl GateAuditSink for NoopAuditSink {
    fn record_gate(&self, _event: &GateExecutionEvent) {}
}
