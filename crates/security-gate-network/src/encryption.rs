// crates/security-gate-network/src/encryption.rs
// ============================================================================
// Module: Encryption Ratio Analyzer
// Description: Share of payload-bearing packets sent encrypted.
// Purpose: Flag captures where application data travels in cleartext.
// Dependencies: time
// ============================================================================

//! Encryption ratio analyzer: share of payload-bearing packets sent encrypted.

use time::OffsetDateTime;

use crate::analyzer::AnalyzerReport;
use crate::analyzer::Severity;
use crate::analyzer::TrafficAnalyzer;
use crate::capture::Capture;

/// Weight of the encryption ratio in the combined score.
pub const ENCRYPTION_WEIGHT: f64 = 0.25;
/// Ratios below this are HIGH severity.
const HIGH_RISK_RATIO: f64 = 0.5;
/// Ratios below this are MEDIUM severity.
const MEDIUM_RISK_RATIO: f64 = 0.9;

/// Measures how much application data is encrypted.
///
/// Risk is `(1 - encrypted / payload_packets) * 100`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptionRatioAnalyzer;

impl TrafficAnalyzer for EncryptionRatioAnalyzer {
    fn name(&self) -> &'static str {
        "encryption_ratio"
    }

    fn weight(&self) -> f64 {
        ENCRYPTION_WEIGHT
    }

    #[allow(clippy::cast_precision_loss, reason = "Packet counts are far below 2^52.")]
    fn analyze(&self, capture: &Capture, _now: OffsetDateTime) -> Option<AnalyzerReport> {
        let payload_packets: Vec<_> =
            capture.packets.iter().filter(|packet| packet.has_payload()).collect();
        if payload_packets.is_empty() {
            return None;
        }
        let total = payload_packets.len();
        let encrypted = payload_packets.iter().filter(|packet| packet.encrypted).count();
        let ratio = encrypted as f64 / total as f64;

        let mut report = AnalyzerReport::new(self);
        if encrypted < total {
            let severity = if ratio < HIGH_RISK_RATIO {
                Severity::High
            } else if ratio < MEDIUM_RISK_RATIO {
                Severity::Medium
            } else {
                Severity::Low
            };
            report.push(
                severity,
                format!("{} of {total} payload packets are unencrypted", total - encrypted),
            );
        }
        Some(report.with_risk((1.0 - ratio) * 100.0))
    }
}
