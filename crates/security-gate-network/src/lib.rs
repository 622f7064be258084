// crates/security-gate-network/src/lib.rs
// ============================================================================
// Module: Network Gate
// Description: Traffic analyzers and weighted network risk scoring.
// Purpose: Gate releases on PII exposure, encryption, TLS, and leakage risk.
// Dependencies: security-gate-core, regex, serde, time
// ============================================================================

//! ## Overview
//! The network gate inspects a packet capture supplied in the gate input or
//! read from an injected [`PacketSource`]. Each enabled [`TrafficAnalyzer`]
//! produces a 0-100 risk value and findings; the gate combines the analyzers
//! that ran into one weighted score and fails when the score exceeds the
//! configured threshold or, optionally, when any HIGH finding exists.
//!
//! Security posture: captures are untrusted. Findings describe what was seen
//! without echoing payload text.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod analyzer;
pub mod capture;
pub mod config;
pub mod encryption;
pub mod error;
pub mod gate;
pub mod metadata;
pub mod pii;
pub mod source;
pub mod tls;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use analyzer::AnalyzerReport;
pub use analyzer::Finding;
pub use analyzer::Severity;
pub use analyzer::TrafficAnalyzer;
pub use capture::Capture;
pub use capture::CertificateInfo;
pub use capture::Packet;
pub use capture::TlsSession;
pub use config::NetworkGateConfig;
pub use encryption::EncryptionRatioAnalyzer;
pub use error::CaptureError;
pub use gate::NetworkAssessment;
pub use gate::NetworkGate;
pub use metadata::MetadataLeakageAnalyzer;
pub use pii::PiiExposureAnalyzer;
pub use source::PacketSource;
pub use source::StaticPacketSource;
pub use tls::TlsStrengthAnalyzer;
