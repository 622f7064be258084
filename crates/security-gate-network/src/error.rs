// crates/security-gate-network/src/error.rs
// ============================================================================
// Module: Network Gate Errors
// Description: Failures reading packet captures.
// Purpose: Classify capture failures before they become gate faults.
// Dependencies: thiserror
// ============================================================================

//! Network gate errors: failures reading packet captures.

use thiserror::Error;

/// Packet capture errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The capture reader could not produce packets.
    #[error("packet capture unavailable: {0}")]
    Unavailable(String),
    /// The capture reader produced records that could not be interpreted.
    #[error("malformed packet capture: {0}")]
    Malformed(String),
}
