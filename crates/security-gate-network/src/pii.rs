// crates/security-gate-network/src/pii.rs
// ============================================================================
// Module: PII Exposure Analyzer
// Description: Detects personal data in cleartext packet payloads.
// Purpose: Flag captures that leak identifiers or credentials unencrypted.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Only packets not flagged as encrypted are scanned. Findings report the
//! kind of data and how many packets carried it; matched text is never
//! included. Card-number candidates must pass the Luhn checksum.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use regex::Regex;
use time::OffsetDateTime;

use crate::analyzer::AnalyzerReport;
use crate::analyzer::Severity;
use crate::analyzer::TrafficAnalyzer;
use crate::capture::Capture;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Weight of PII exposure in the combined score.
pub const PII_WEIGHT: f64 = 0.35;
/// Extra risk per additional kind of exposed data.
const ADDITIONAL_KIND_RISK: f64 = 10.0;

/// Kinds of personal data the analyzer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PiiKind {
    /// Email address.
    Email,
    /// US social security number.
    Ssn,
    /// North American phone number.
    Phone,
    /// Payment card number.
    Card,
    /// HTTP bearer token.
    BearerToken,
}

impl PiiKind {
    /// Human-readable label.
    const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email address",
            Self::Ssn => "Social security number",
            Self::Phone => "Phone number",
            Self::Card => "Payment card number",
            Self::BearerToken => "Bearer token",
        }
    }

    /// Severity of exposing this kind in cleartext.
    const fn severity(self) -> Severity {
        match self {
            Self::Email | Self::Phone => Severity::Medium,
            Self::Ssn | Self::Card | Self::BearerToken => Severity::High,
        }
    }

    /// Detection pattern.
    const fn pattern(self) -> &'static str {
        match self {
            Self::Email => r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
            Self::Ssn => r"\b\d{3}-\d{2}-\d{4}\b",
            Self::Phone => r"(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
            Self::Card => r"\b(?:\d[ -]?){12,18}\d\b",
            Self::BearerToken => r"(?i)\bbearer\s+[A-Za-z0-9\-._~+/]{8,}=*",
        }
    }
}

/// Every kind, in reporting order.
const KINDS: [PiiKind; 5] =
    [PiiKind::Ssn, PiiKind::Card, PiiKind::BearerToken, PiiKind::Email, PiiKind::Phone];

/// Returns the compiled detectors.
fn detectors() -> &'static [(PiiKind, Regex)] {
    static DETECTORS: OnceLock<Vec<(PiiKind, Regex)>> = OnceLock::new();
    DETECTORS.get_or_init(|| {
        KINDS
            .iter()
            .filter_map(|kind| Regex::new(kind.pattern()).ok().map(|regex| (*kind, regex)))
            .collect()
    })
}

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Returns true when the digits in `candidate` pass the Luhn checksum.
#[must_use]
pub fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|ch| ch.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(index, digit)| {
            if index % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                *digit
            }
        })
        .sum();
    sum % 10 == 0
}

/// Returns true when `payload` contains data of the given kind.
fn contains_kind(kind: PiiKind, regex: &Regex, payload: &str) -> bool {
    match kind {
        PiiKind::Card => regex.find_iter(payload).any(|found| luhn_valid(found.as_str())),
        _ => regex.is_match(payload),
    }
}

// ============================================================================
// SECTION: Analyzer
// ============================================================================

/// Scans cleartext payloads for personal data and credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiiExposureAnalyzer;

impl TrafficAnalyzer for PiiExposureAnalyzer {
    fn name(&self) -> &'static str {
        "pii_exposure"
    }

    fn weight(&self) -> f64 {
        PII_WEIGHT
    }

    fn analyze(&self, capture: &Capture, _now: OffsetDateTime) -> Option<AnalyzerReport> {
        if capture.packets.is_empty() {
            return None;
        }
        let mut report = AnalyzerReport::new(self);
        let cleartext: Vec<&str> = capture
            .packets
            .iter()
            .filter(|packet| !packet.encrypted)
            .filter_map(|packet| packet.payload.as_deref())
            .collect();

        let mut risk: f64 = 0.0;
        let mut kinds_found = 0_u32;
        for (kind, regex) in detectors() {
            let packets =
                cleartext.iter().filter(|payload| contains_kind(*kind, regex, payload)).count();
            if packets == 0 {
                continue;
            }
            report.push(
                kind.severity(),
                format!("{} found in {packets} cleartext packet(s)", kind.label()),
            );
            risk = risk.max(kind.severity().risk());
            kinds_found += 1;
        }
        if kinds_found > 1 {
            risk += ADDITIONAL_KIND_RISK * f64::from(kinds_found - 1);
        }
        Some(report.with_risk(risk))
    }
}
