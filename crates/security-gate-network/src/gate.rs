// crates/security-gate-network/src/gate.rs
// ============================================================================
// Module: Network Gate
// Description: Runs traffic analyzers and applies the risk policy.
// Purpose: Expose network risk assessment through the SecurityGate contract.
// Dependencies: async-trait, security-gate-core, serde_json
// ============================================================================

//! ## Overview
//! The gate reads a capture from `input.capture` when present, otherwise from
//! its [`PacketSource`]. Enabled analyzers run in a fixed order; analyzers
//! with nothing to inspect are skipped and excluded from the score.
//!
//! Failure rules:
//! - `risk_score > risk_threshold`.
//! - Any HIGH finding when `fail_on_high_severity` is set. Otherwise HIGH
//!   findings are reported as warnings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use security_gate_core::GateError;
use security_gate_core::GateExecutionContext;
use security_gate_core::GateResult;
use security_gate_core::SecurityGate;
use security_gate_core::ValidationResult;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::analyzer::AnalyzerReport;
use crate::analyzer::Severity;
use crate::analyzer::TrafficAnalyzer;
use crate::analyzer::weighted_risk_score;
use crate::capture::Capture;
use crate::config::NetworkGateConfig;
use crate::encryption::EncryptionRatioAnalyzer;
use crate::metadata::MetadataLeakageAnalyzer;
use crate::pii::PiiExposureAnalyzer;
use crate::source::PacketSource;
use crate::tls::TlsStrengthAnalyzer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registered gate name.
pub const NETWORK_GATE_NAME: &str = "network-security";
/// Gate version reported to the runner.
const NETWORK_GATE_VERSION: &str = "1.0.0";

// ============================================================================
// SECTION: Assessment
// ============================================================================

/// Outcome of analyzing one capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkAssessment {
    /// Weighted 0-100 risk score.
    pub risk_score: u8,
    /// Reports from analyzers that ran, in execution order.
    pub reports: Vec<AnalyzerReport>,
    /// Packets inspected.
    pub packets: usize,
}

impl NetworkAssessment {
    /// Returns true when any analyzer reported a HIGH finding.
    #[must_use]
    pub fn has_high_severity(&self) -> bool {
        self.reports.iter().any(|report| report.max_severity() == Some(Severity::High))
    }

    /// Counts findings per severity label.
    #[must_use]
    pub fn severity_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for finding in self.reports.iter().flat_map(|report| &report.findings) {
            *counts.entry(finding.severity.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Network traffic security gate.
pub struct NetworkGate {
    /// Thresholds and analyzer toggles.
    config: NetworkGateConfig,
    /// Fallback capture reader.
    source: Option<Arc<dyn PacketSource>>,
}

impl NetworkGate {
    /// Creates a gate that only analyzes captures supplied in the input.
    #[must_use]
    pub fn new(config: NetworkGateConfig) -> Self {
        Self {
            config,
            source: None,
        }
    }

    /// Attaches a packet source used when the input carries no capture.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn PacketSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn settings(&self) -> &NetworkGateConfig {
        &self.config
    }

    /// Returns the analyzers enabled by the configuration.
    fn analyzers(&self) -> Vec<Box<dyn TrafficAnalyzer>> {
        let mut analyzers: Vec<Box<dyn TrafficAnalyzer>> = Vec::new();
        if self.config.pii_detection {
            analyzers.push(Box::new(PiiExposureAnalyzer));
        }
        if self.config.encryption_ratio {
            analyzers.push(Box::new(EncryptionRatioAnalyzer));
        }
        if self.config.tls_strength {
            analyzers.push(Box::new(TlsStrengthAnalyzer));
        }
        if self.config.metadata_leakage {
            analyzers.push(Box::new(MetadataLeakageAnalyzer));
        }
        analyzers
    }

    /// Runs the enabled analyzers over a capture.
    #[must_use]
    pub fn assess(&self, capture: &Capture, now: OffsetDateTime) -> NetworkAssessment {
        let reports: Vec<AnalyzerReport> =
            self.analyzers().iter().filter_map(|analyzer| analyzer.analyze(capture, now)).collect();
        NetworkAssessment {
            risk_score: weighted_risk_score(&reports),
            reports,
            packets: capture.packets.len(),
        }
    }

    /// Applies the failure rules to an assessment.
    #[must_use]
    pub fn evaluate(&self, assessment: &NetworkAssessment) -> ValidationResult {
        let mut result = ValidationResult::new();
        if assessment.reports.is_empty() {
            result.push_warning("No network analyzer had data to inspect");
        }
        if assessment.risk_score > self.config.risk_threshold {
            result.push_error(format!(
                "Network risk score {} exceeds threshold {}",
                assessment.risk_score, self.config.risk_threshold
            ));
        }
        for finding in assessment.reports.iter().flat_map(|report| &report.findings) {
            let blocking = finding.severity == Severity::High && self.config.fail_on_high_severity;
            result.push_advisory(finding.to_string(), blocking);
        }
        result
    }

    /// Resolves the capture from input or the packet source.
    async fn load_capture(&self, input: &Value) -> Result<Capture, GateError> {
        if let Some(capture) = input.get("capture") {
            return serde_json::from_value(capture.clone())
                .map_err(|err| GateError::InvalidInput(format!("invalid capture: {err}")));
        }
        match &self.source {
            Some(source) => {
                source.capture().await.map_err(|err| GateError::Unavailable(err.to_string()))
            }
            None => Err(GateError::InvalidInput(
                "input has no capture and no packet source is configured".to_string(),
            )),
        }
    }
}

#[async_trait]
impl SecurityGate for NetworkGate {
    fn name(&self) -> &str {
        NETWORK_GATE_NAME
    }

    fn description(&self) -> &str {
        "Scores captured traffic for PII exposure, encryption, TLS strength, and metadata leakage"
    }

    fn version(&self) -> &str {
        NETWORK_GATE_VERSION
    }

    async fn execute(
        &self,
        input: &Value,
        context: GateExecutionContext,
    ) -> Result<GateResult, GateError> {
        let capture = self.load_capture(input).await?;
        let assessment = self.assess(&capture, context.timestamp);
        let validation = self.evaluate(&assessment);

        let analyzers: BTreeMap<&str, f64> = assessment
            .reports
            .iter()
            .map(|report| (report.analyzer.as_str(), report.risk))
            .collect();
        let analyzers = serde_json::to_value(analyzers)
            .map_err(|err| GateError::Execution(err.to_string()))?;
        let severities = serde_json::to_value(assessment.severity_counts())
            .map_err(|err| GateError::Execution(err.to_string()))?;
        let details = format!(
            "Network risk score {} (threshold {}) across {} packets",
            assessment.risk_score, self.config.risk_threshold, assessment.packets
        );
        Ok(GateResult::from_validation(validation, details)
            .with_metadata("risk_score", assessment.risk_score)
            .with_metadata("packets", assessment.packets)
            .with_metadata("analyzers", analyzers)
            .with_metadata("findings", severities))
    }

    fn config(&self) -> Value {
        serde_json::to_value(self.config).unwrap_or(Value::Null)
    }

    fn validate_config(&self, config: &Value) -> GateResult {
        let validation = match serde_json::from_value::<NetworkGateConfig>(config.clone()) {
            Ok(parsed) => {
                let mut validation = ValidationResult::new();
                for problem in parsed.validate() {
                    validation.push_error(problem);
                }
                if !parsed.fail_on_high_severity {
                    validation.push_warning("HIGH severity findings will not fail the gate");
                }
                validation
            }
            Err(err) => ValidationResult::error(format!("invalid network gate config: {err}")),
        };
        let details = if validation.valid {
            "Network gate configuration is valid"
        } else {
            "Network gate configuration is invalid"
        };
        GateResult::from_validation(validation, details)
    }
}
