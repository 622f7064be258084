// crates/security-gate-network/src/config.rs
// ============================================================================
// Module: Network Gate Config
// Description: Thresholds and analyzer toggles for the network gate.
// Purpose: Provide a validated, serde-compatible gate configuration.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every field has a default so partial TOML or JSON overrides merge cleanly.
//! [`NetworkGateConfig::validate`] rejects configurations that could never
//! produce a meaningful score.

use serde::Deserialize;
use serde::Serialize;

/// Default maximum acceptable risk score.
pub const DEFAULT_RISK_THRESHOLD: u8 = 50;
/// Highest meaningful risk threshold.
pub const MAX_RISK_THRESHOLD: u8 = 100;

/// Network gate configuration.
///
/// # Invariants
/// - `risk_threshold <= 100`.
/// - At least one analyzer is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkGateConfig {
    /// Scores strictly above this fail the gate.
    pub risk_threshold: u8,
    /// Fail on any HIGH finding regardless of score.
    pub fail_on_high_severity: bool,
    /// Run the PII exposure analyzer.
    pub pii_detection: bool,
    /// Run the encryption ratio analyzer.
    pub encryption_ratio: bool,
    /// Run the TLS strength analyzer.
    pub tls_strength: bool,
    /// Run the metadata leakage analyzer.
    pub metadata_leakage: bool,
}

impl Default for NetworkGateConfig {
    fn default() -> Self {
        Self {
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            fail_on_high_severity: true,
            pii_detection: true,
            encryption_ratio: true,
            tls_strength: true,
            metadata_leakage: true,
        }
    }
}

impl NetworkGateConfig {
    /// Returns configuration problems, empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.risk_threshold > MAX_RISK_THRESHOLD {
            problems.push(format!(
                "risk_threshold must be between 0 and {MAX_RISK_THRESHOLD}, got {}",
                self.risk_threshold
            ));
        }
        let any_enabled = self.pii_detection
            || self.encryption_ratio
            || self.tls_strength
            || self.metadata_leakage;
        if !any_enabled {
            problems.push("at least one network analyzer must be enabled".to_string());
        }
        problems
    }
}
