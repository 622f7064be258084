// crates/security-gate-cli/src/render.rs
// ============================================================================
// Module: CLI Rendering
// Description: Text output for envelope validation, policies, and gate runs.
// Purpose: Produce stable, log-friendly output for CI pipelines.
// Dependencies: security-gate-core, security-gate-crypto, serde_json
// ============================================================================

//! ## Overview
//! Renderers are pure and return text without a trailing newline; the binary
//! adds it when printing.

use std::fmt::Write as _;

use security_gate_core::GateRunReport;
use security_gate_crypto::BatchValidation;
use security_gate_crypto::CryptoEnvelope;
use security_gate_crypto::SecurityPolicy;
use security_gate_crypto::generate_report;
use serde_json::Value;

/// Renders one report per envelope followed by a batch summary.
///
/// The envelope section is included only for envelopes that parse into the
/// typed model.
#[must_use]
pub fn render_batch(batch: &BatchValidation, envelopes: &[Value]) -> String {
    let total = batch.results.len();
    let mut out = String::new();
    for (index, result) in batch.results.iter().enumerate() {
        let typed = envelopes
            .get(index)
            .and_then(|value| serde_json::from_value::<CryptoEnvelope>(value.clone()).ok());
        let _ = writeln!(out, "[envelope {} of {total}]", index + 1);
        out.push_str(&generate_report(result, typed.as_ref()));
        out.push('\n');
    }
    let summary = &batch.summary;
    let _ = write!(
        out,
        "Summary: {} envelopes, {} valid, {} invalid ({} errors, {} warnings)",
        summary.total, summary.valid, summary.invalid, summary.total_errors, summary.total_warnings
    );
    out
}

/// Renders the policy preset table.
#[must_use]
pub fn render_policies() -> String {
    let lines: Vec<String> = SecurityPolicy::all()
        .into_iter()
        .map(|policy| {
            let config = policy.config();
            format!(
                "{:<13} strict_mode={} allow_warnings={} quantum_resistance_check={} \
                 timing_attack_check={}",
                policy.name(),
                config.strict_mode,
                config.allow_warnings,
                config.quantum_resistance_check,
                config.timing_attack_check
            )
        })
        .collect();
    lines.join("\n")
}

/// Renders a gate run as one status line per gate plus a summary.
#[must_use]
pub fn render_run(report: &GateRunReport) -> String {
    let mut out = String::new();
    for outcome in &report.results {
        let status = if outcome.result.valid { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "{status} {} ({} ms): {}",
            outcome.name, outcome.result.execution_time_ms, outcome.result.details
        );
        for error in &outcome.result.errors {
            let _ = writeln!(out, "  error: {error}");
        }
        for warning in &outcome.result.warnings {
            let _ = writeln!(out, "  warning: {warning}");
        }
    }
    if let Some(gate) = &report.halted_by {
        let _ = writeln!(out, "Halted by {gate} (fail-fast)");
    }
    let summary = report.summary;
    let _ = write!(
        out,
        "Gates: {} total, {} passed, {} failed",
        summary.total, summary.passed, summary.failed
    );
    out
}
