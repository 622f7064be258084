// crates/security-gate-network/src/tls.rs
// ============================================================================
// Module: TLS Strength Analyzer
// Description: Protocol version, cipher suite, and certificate checks.
// Purpose: Flag TLS sessions negotiated with weak parameters.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Rules per session:
//! - Protocol below TLS 1.2 (including any SSL version): HIGH.
//! - Cipher suite containing a weak primitive (RC4, DES, NULL, EXPORT, MD5,
//!   anonymous key exchange): HIGH. CBC suites: LOW.
//! - Certificate expired: HIGH. Key below 2048 bits or unreadable expiry:
//!   MEDIUM. Expiring within 30 days: LOW.
//!
//! The analyzer risk is the risk of the worst finding across all sessions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::analyzer::AnalyzerReport;
use crate::analyzer::Severity;
use crate::analyzer::TrafficAnalyzer;
use crate::capture::CertificateInfo;
use crate::capture::Capture;
use crate::capture::TlsSession;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Weight of TLS strength in the combined score.
pub const TLS_WEIGHT: f64 = 0.25;
/// Minimum acceptable protocol version.
const MIN_TLS_VERSION: (u8, u8) = (1, 2);
/// Cipher suite markers that indicate a broken primitive.
const WEAK_CIPHER_MARKERS: [&str; 6] = ["RC4", "DES", "NULL", "EXPORT", "MD5", "ANON"];
/// Minimum certificate key size in bits.
const MIN_CERT_KEY_BITS: u32 = 2048;
/// Certificates expiring within this many days get a LOW finding.
const CERT_EXPIRY_NOTICE_DAYS: i64 = 30;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a protocol label such as `TLSv1.3`, `TLS 1.2`, or `SSLv3`.
///
/// SSL versions map to major version zero so they order below every TLS
/// version.
#[must_use]
pub fn parse_protocol_version(label: &str) -> Option<(u8, u8)> {
    let lower = label.trim().to_ascii_lowercase();
    let is_ssl = lower.starts_with("ssl");
    let numeric: String =
        lower.chars().skip_while(|ch| !ch.is_ascii_digit()).filter(|ch| *ch != ' ').collect();
    let mut parts = numeric.split('.');
    let major: u8 = parts.next()?.parse().ok()?;
    let minor: u8 = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    if is_ssl { Some((0, major)) } else { Some((major, minor)) }
}

/// Returns a label identifying a session in findings.
fn session_label(index: usize, session: &TlsSession) -> String {
    session.server_name.clone().unwrap_or_else(|| format!("session {index}"))
}

/// Checks a certificate summary.
fn check_certificate(
    report: &mut AnalyzerReport,
    label: &str,
    certificate: &CertificateInfo,
    now: OffsetDateTime,
) {
    if certificate.key_bits < MIN_CERT_KEY_BITS {
        report.push(
            Severity::Medium,
            format!(
                "{label}: certificate key is {} bits (minimum {MIN_CERT_KEY_BITS})",
                certificate.key_bits
            ),
        );
    }
    match OffsetDateTime::parse(&certificate.not_after, &Rfc3339) {
        Ok(not_after) if not_after <= now => {
            report.push(Severity::High, format!("{label}: certificate has expired"));
        }
        Ok(not_after) if not_after - now < Duration::days(CERT_EXPIRY_NOTICE_DAYS) => {
            report.push(
                Severity::Low,
                format!("{label}: certificate expires within {CERT_EXPIRY_NOTICE_DAYS} days"),
            );
        }
        Ok(_) => {}
        Err(_) => {
            report.push(Severity::Medium, format!("{label}: certificate expiry is unreadable"));
        }
    }
}

// ============================================================================
// SECTION: Analyzer
// ============================================================================

/// Grades negotiated TLS parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsStrengthAnalyzer;

impl TrafficAnalyzer for TlsStrengthAnalyzer {
    fn name(&self) -> &'static str {
        "tls_strength"
    }

    fn weight(&self) -> f64 {
        TLS_WEIGHT
    }

    fn analyze(&self, capture: &Capture, now: OffsetDateTime) -> Option<AnalyzerReport> {
        if capture.tls.is_empty() {
            return None;
        }
        let mut report = AnalyzerReport::new(self);
        for (index, session) in capture.tls.iter().enumerate() {
            let label = session_label(index, session);
            match parse_protocol_version(&session.protocol_version) {
                Some(version) if version < MIN_TLS_VERSION => report.push(
                    Severity::High,
                    format!("{label}: protocol {} is below TLS 1.2", session.protocol_version),
                ),
                Some(_) => {}
                None => report.push(
                    Severity::Medium,
                    format!("{label}: unrecognized protocol {}", session.protocol_version),
                ),
            }

            let cipher = session.cipher_suite.to_ascii_uppercase();
            if WEAK_CIPHER_MARKERS.iter().any(|marker| cipher.contains(marker)) {
                report.push(
                    Severity::High,
                    format!("{label}: weak cipher suite {}", session.cipher_suite),
                );
            } else if cipher.contains("CBC") {
                report.push(
                    Severity::Low,
                    format!("{label}: cipher suite {} is not AEAD", session.cipher_suite),
                );
            }

            if let Some(certificate) = &session.certificate {
                check_certificate(&mut report, &label, certificate, now);
            }
        }
        let risk = report.max_severity().map_or(0.0, Severity::risk);
        Some(report.with_risk(risk))
    }
}
