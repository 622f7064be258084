// crates/security-gate-crypto/src/report.rs
// ============================================================================
// Module: Validation Report
// Description: Deterministic text rendering of envelope validation results.
// Purpose: Produce human-readable output suitable for CI logs and snapshots.
// Dependencies: security-gate-core
// ============================================================================

//! ## Overview
//! [`generate_report`] is a pure function: identical inputs render identical
//! bytes. Salts and nonces are never printed.

use std::fmt::Write as _;

use security_gate_core::ValidationResult;

use crate::envelope::CryptoEnvelope;

/// Report title line.
const REPORT_TITLE: &str = "Crypto Envelope Validation Report";

/// Renders a validation result, optionally with an envelope summary.
#[must_use]
pub fn generate_report(result: &ValidationResult, envelope: Option<&CryptoEnvelope>) -> String {
    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push('\n');
    out.push_str(&"=".repeat(REPORT_TITLE.len()));
    out.push('\n');
    let status = if result.valid { "VALID" } else { "INVALID" };
    let _ = writeln!(out, "Status: {status}");
    let _ = writeln!(out, "Errors: {}", result.errors.len());
    let _ = writeln!(out, "Warnings: {}", result.warnings.len());

    write_numbered(&mut out, "Errors", &result.errors);
    write_numbered(&mut out, "Warnings", &result.warnings);

    if let Some(envelope) = envelope {
        let kdf = &envelope.kdf_params;
        out.push_str("\nEnvelope:\n");
        let _ = writeln!(out, "  Version: {}", envelope.version);
        let _ = writeln!(out, "  Algorithm: {}", envelope.algorithm);
        let _ = writeln!(
            out,
            "  KDF: {} (memory {} KB, iterations {}, parallelism {})",
            kdf.algorithm, kdf.memory, kdf.iterations, kdf.parallelism
        );
        let _ = writeln!(out, "  Key ID: {}", envelope.key_id);
        let _ = writeln!(out, "  Table: {}", envelope.aad.table_name);
        let _ = writeln!(out, "  Record: {}", envelope.aad.record_id);
        let _ = writeln!(out, "  AAD Version: {}", envelope.aad.version);
        let _ = writeln!(out, "  Timestamp: {}", envelope.aad.timestamp);
    }
    out
}

/// Appends a numbered section when `items` is non-empty.
fn write_numbered(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}:");
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {item}", index + 1);
    }
}
