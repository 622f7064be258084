// crates/security-gate-network/src/source.rs
// ============================================================================
// Module: Packet Sources
// Description: Capture reader collaborator interface.
// Purpose: Decouple the network gate from how packets are captured.
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! A [`PacketSource`] yields a structured [`Capture`]. Reading a capture is an
//! external operation and therefore asynchronous. [`StaticPacketSource`]
//! replays a fixed capture.

use async_trait::async_trait;

use crate::capture::Capture;
use crate::error::CaptureError;

/// Packet-capture reader consumed by the network gate.
#[async_trait]
pub trait PacketSource: Send + Sync {
    /// Reads the current capture.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when no capture can be produced.
    async fn capture(&self) -> Result<Capture, CaptureError>;
}

/// Packet source that always returns the same capture.
#[derive(Debug, Clone, Default)]
pub struct StaticPacketSource {
    /// Capture returned on every read.
    capture: Capture,
}

impl StaticPacketSource {
    /// Creates a source replaying `capture`.
    #[must_use]
    pub const fn new(capture: Capture) -> Self {
        Self {
            capture,
        }
    }
}

#[async_trait]
impl PacketSource for StaticPacketSource {
    async fn capture(&self) -> Result<Capture, CaptureError> {
        Ok(self.capture.clone())
    }
}
