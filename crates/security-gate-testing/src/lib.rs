// crates/security-gate-testing/src/lib.rs
// ============================================================================
// Module: Testing Gate
// Description: Test suites orchestrated with gate runner semantics.
// Purpose: Gate releases on property, fuzz, chaos, and load test outcomes.
// Dependencies: security-gate-core, proptest, rand, tokio
// ============================================================================

//! ## Overview
//! A [`TestSuite`] is a named, asynchronous test run. [`TestingGate`] wraps
//! each suite in a [`SuiteGate`] and registers it with its own
//! [`security_gate_core::GateRunner`], so suites inherit the runner's
//! parallel, sequential, fail-fast, timeout, and retry behavior unchanged.
//!
//! Built-in suites:
//! - [`PropertySuite`]: proptest strategy plus property, deterministic RNG.
//! - [`FuzzSuite`]: seeded random byte inputs; panics are crashes.
//! - [`ChaosSuite`]: seeded latency/error injection against a scenario whose
//!   invariant must hold after every round.
//! - [`LoadSuite`]: concurrent calls with p95 latency and error-rate limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod chaos;
pub mod fuzz;
pub mod gate;
pub mod load;
pub mod property;
pub mod suite;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use chaos::ChaosConfig;
pub use chaos::ChaosScenario;
pub use chaos::ChaosSuite;
pub use chaos::FaultPlan;
pub use fuzz::FuzzSuite;
pub use gate::TestingGate;
pub use load::LoadSuite;
pub use load::LoadTarget;
pub use load::LoadThresholds;
pub use property::PropertySuite;
pub use suite::SuiteError;
pub use suite::SuiteGate;
pub use suite::SuiteKind;
pub use suite::SuiteReport;
pub use suite::TestSuite;
