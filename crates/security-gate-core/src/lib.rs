// crates/security-gate-core/src/lib.rs
// ============================================================================
// Module: Security Gate Core
// Description: Gate contract, result model, and the concurrent gate runner.
// Purpose: Execute independent security gates under uniform timeout, retry,
//          and fail-fast semantics with deterministic aggregation.
// Dependencies: async-trait, serde, serde_json, thiserror, time, tokio
// ============================================================================

//! ## Overview
//! `security-gate-core` defines the uniform [`SecurityGate`] contract that every
//! gate (crypto, network, access control, testing) implements, the shared
//! [`ValidationResult`] and [`GateResult`] shapes, and the [`GateRunner`] that
//! executes registered gates concurrently or sequentially.
//! Invariants:
//! - Validation failures are data ([`GateResult::valid`] is false); they are
//!   never returned as `Err`.
//! - Operational faults (missing gate, timeout, gate error, gate panic) are
//!   converted into failed [`GateResult`] values at the runner boundary.
//! - Aggregated results follow registration (or caller list) order.
//!
//! Security posture: gate inputs are untrusted; audit events never carry raw
//! gate inputs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod context;
pub mod error;
pub mod gate;
pub mod result;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::GateAuditSink;
pub use audit::GateExecutionEvent;
pub use audit::GateExecutionEventParams;
pub use audit::GateOutcomeKind;
pub use audit::GateRunEvent;
pub use audit::NoopAuditSink;
pub use audit::RunMode;
pub use audit::StderrAuditSink;
pub use context::ContextOverrides;
pub use context::Environment;
pub use context::GateExecutionContext;
pub use error::GateError;
pub use error::RegistryError;
pub use error::RunError;
pub use gate::GateDescriptor;
pub use gate::SecurityGate;
pub use result::GateResult;
pub use result::ValidationResult;
pub use runner::GateOutcome;
pub use runner::GateRunReport;
pub use runner::GateRunSummary;
pub use runner::GateRunner;
pub use runner::GateRunnerConfig;
