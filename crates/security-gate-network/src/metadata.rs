// crates/security-gate-network/src/metadata.rs
// ============================================================================
// Module: Metadata Leakage Analyzer
// Description: Size and timing regularity of payload packets.
// Purpose: Estimate how much traffic shape reveals without reading payloads.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Two signals, each measured by the coefficient of variation (stddev / mean):
//! - Packet sizes: high variation means lengths track content. Padded
//!   traffic has variation near zero.
//! - Inter-arrival times: very low variation means periodic traffic that is
//!   easy to fingerprint.
//!
//! Risk is `0.6 * size_risk + 0.4 * timing_risk`, where
//! `size_risk = min(cv_size, 1) * 100` and
//! `timing_risk = (1 - min(cv_timing, 1)) * 100`.

use time::OffsetDateTime;

use crate::analyzer::AnalyzerReport;
use crate::analyzer::Severity;
use crate::analyzer::TrafficAnalyzer;
use crate::capture::Capture;

/// Weight of metadata leakage in the combined score.
pub const METADATA_WEIGHT: f64 = 0.15;
/// Fewer payload packets than this are not analyzed.
pub const MIN_SAMPLES: usize = 4;
/// Size variation above this gets a MEDIUM finding.
const SIZE_CV_LIMIT: f64 = 0.5;
/// Timing variation below this gets a LOW finding.
const TIMING_CV_FLOOR: f64 = 0.1;
/// Share of the risk attributed to sizes.
const SIZE_SHARE: f64 = 0.6;
/// Share of the risk attributed to timing.
const TIMING_SHARE: f64 = 0.4;

/// Coefficient of variation, or `None` for empty input or zero mean.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Sample counts are far below 2^52.")]
pub fn coefficient_of_variation(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let count = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / count;
    if mean <= 0.0 {
        return None;
    }
    let variance = samples.iter().map(|sample| (sample - mean).powi(2)).sum::<f64>() / count;
    Some(variance.sqrt() / mean)
}

/// Measures size and timing regularity.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataLeakageAnalyzer;

impl TrafficAnalyzer for MetadataLeakageAnalyzer {
    fn name(&self) -> &'static str {
        "metadata_leakage"
    }

    fn weight(&self) -> f64 {
        METADATA_WEIGHT
    }

    #[allow(clippy::cast_precision_loss, reason = "Sizes and gaps are far below 2^52.")]
    fn analyze(&self, capture: &Capture, _now: OffsetDateTime) -> Option<AnalyzerReport> {
        let mut packets: Vec<_> =
            capture.packets.iter().filter(|packet| packet.has_payload()).collect();
        if packets.len() < MIN_SAMPLES {
            return None;
        }
        packets.sort_by_key(|packet| packet.timestamp_ms);

        let sizes: Vec<f64> = packets.iter().map(|packet| packet.size as f64).collect();
        let gaps: Vec<f64> = packets
            .windows(2)
            .map(|pair| pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms) as f64)
            .collect();

        let mut report = AnalyzerReport::new(self);
        let size_risk = match coefficient_of_variation(&sizes) {
            Some(cv) => {
                if cv > SIZE_CV_LIMIT {
                    let message =
                        format!("packet sizes vary widely (cv {cv:.2}); lengths may leak content");
                    report.push(Severity::Medium, message);
                }
                cv.min(1.0) * 100.0
            }
            None => 0.0,
        };
        let timing_risk = match coefficient_of_variation(&gaps) {
            Some(cv) => {
                if cv < TIMING_CV_FLOOR {
                    report.push(
                        Severity::Low,
                        format!("packet timing is highly regular (cv {cv:.2})"),
                    );
                }
                (1.0 - cv.min(1.0)) * 100.0
            }
            None => 0.0,
        };
        Some(report.with_risk(SIZE_SHARE * size_risk + TIMING_SHARE * timing_risk))
    }
}
