// crates/security-gate-network/src/analyzer.rs
// ============================================================================
// Module: Traffic Analyzer Contract
// Description: Analyzer trait, severities, findings, and per-analyzer reports.
// Purpose: Give every analyzer the same scoring shape.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Analyzers are synchronous and pure over a [`Capture`]. An analyzer that has
//! nothing to inspect (no TLS sessions, too few packets) returns `None` and is
//! left out of the weighted score.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::capture::Capture;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational.
    Low,
    /// Should be addressed.
    Medium,
    /// Blocks release when `fail_on_high_severity` is set.
    High,
}

impl Severity {
    /// Returns the uppercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Risk contribution of a single finding at this severity.
    #[must_use]
    pub const fn risk(self) -> f64 {
        match self {
            Self::Low => 20.0,
            Self::Medium => 50.0,
            Self::High => 100.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analyzer finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Analyzer that produced the finding.
    pub analyzer: String,
    /// Finding severity.
    pub severity: Severity,
    /// Description without payload content.
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} severity finding ({}): {}", self.severity, self.analyzer, self.message)
    }
}

/// Result of one analyzer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerReport {
    /// Analyzer name.
    pub analyzer: String,
    /// Risk value in `0.0..=100.0`.
    pub risk: f64,
    /// Weight in the combined score.
    pub weight: f64,
    /// Findings in discovery order.
    pub findings: Vec<Finding>,
}

impl AnalyzerReport {
    /// Starts an empty report for an analyzer.
    #[must_use]
    pub fn new(analyzer: &dyn TrafficAnalyzer) -> Self {
        Self {
            analyzer: analyzer.name().to_string(),
            risk: 0.0,
            weight: analyzer.weight(),
            findings: Vec::new(),
        }
    }

    /// Appends a finding.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.findings.push(Finding {
            analyzer: self.analyzer.clone(),
            severity,
            message: message.into(),
        });
    }

    /// Sets the risk value, clamped to `0.0..=100.0`.
    #[must_use]
    pub fn with_risk(mut self, risk: f64) -> Self {
        self.risk = risk.clamp(0.0, 100.0);
        self
    }

    /// Returns the highest finding severity, if any.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|finding| finding.severity).max()
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Analyzer over a packet capture.
pub trait TrafficAnalyzer: Send + Sync {
    /// Stable analyzer name.
    fn name(&self) -> &'static str;

    /// Weight in the combined risk score.
    fn weight(&self) -> f64;

    /// Analyzes a capture, returning `None` when there is nothing to inspect.
    fn analyze(&self, capture: &Capture, now: OffsetDateTime) -> Option<AnalyzerReport>;
}

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Combines analyzer reports into a 0-100 score.
///
/// `sum(weight * risk) / sum(weight)` over the supplied reports, rounded and
/// clamped. An empty slice, or one with zero total weight, scores zero.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The value is clamped to 0..=100 before conversion."
)]
pub fn weighted_risk_score(reports: &[AnalyzerReport]) -> u8 {
    let total_weight: f64 = reports.iter().map(|report| report.weight.max(0.0)).sum();
    if total_weight <= 0.0 {
        return 0;
    }
    let weighted: f64 = reports.iter().map(|report| report.weight.max(0.0) * report.risk).sum();
    (weighted / total_weight).clamp(0.0, 100.0).round() as u8
}
