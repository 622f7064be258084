// crates/security-gate-network/src/capture.rs
// ============================================================================
// Module: Capture Model
// Description: Structured packet and TLS session records.
// Purpose: Define the capture shape analyzers consume.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Capture`] is the structured output of a packet-capture reader. Payload
//! text is optional and only inspected for packets not flagged as encrypted.

use serde::Deserialize;
use serde::Serialize;

/// One captured packet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Packet {
    /// Capture time in milliseconds from an arbitrary epoch.
    pub timestamp_ms: u64,
    /// Payload size in bytes.
    pub size: u64,
    /// Transport or application protocol label.
    pub protocol: String,
    /// Source endpoint.
    pub source: Option<String>,
    /// Destination endpoint.
    pub destination: Option<String>,
    /// Whether the payload is encrypted on the wire.
    pub encrypted: bool,
    /// Cleartext payload excerpt, when the reader captured one.
    pub payload: Option<String>,
}

impl Packet {
    /// Returns true when the packet carries application data.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.size > 0 || self.payload.as_ref().is_some_and(|payload| !payload.is_empty())
    }
}

/// Certificate presented during a TLS handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Certificate subject.
    #[serde(default)]
    pub subject: String,
    /// Public key size in bits.
    pub key_bits: u32,
    /// Expiry time (RFC 3339).
    pub not_after: String,
}

/// Negotiated TLS session parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSession {
    /// Negotiated protocol, such as `TLSv1.3`.
    pub protocol_version: String,
    /// Negotiated cipher suite name.
    pub cipher_suite: String,
    /// Server name indication, when present.
    #[serde(default)]
    pub server_name: Option<String>,
    /// Server certificate summary, when captured.
    #[serde(default)]
    pub certificate: Option<CertificateInfo>,
}

/// Structured capture handed to the analyzers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capture {
    /// Captured packets in arrival order.
    pub packets: Vec<Packet>,
    /// Observed TLS sessions.
    pub tls: Vec<TlsSession>,
}
