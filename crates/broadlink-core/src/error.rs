//! Error taxonomy for the Broadlink protocol core.
//!
//! Distinguishes soft, retryable conditions (`NotReady`, `NetworkTimeout`)
//! from hard protocol violations, so callers can decide what to retry
//! without string-matching error messages.

use std::time::Duration;

use broadlink_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by session, dispatch, and learning-mode operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadlinkError {
    /// UDP receive exceeded its timeout after exhausting retries.
    #[error("no response after {retries} retries ({after:?} each)")]
    NetworkTimeout {
        /// Per-attempt timeout that was used.
        after: Duration,
        /// Number of retries attempted (not counting the first try).
        retries: u32,
    },

    /// Frame parsing failed: bad magic, bad checksum, or truncated datagram.
    #[error("malformed frame: {0}")]
    BadFrame(#[from] ProtocolError),

    /// The authentication handshake did not yield usable session material.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// The device reported a non-zero, non-retryable error code.
    #[error("device reported error code {0:#06x}")]
    DeviceError(u16),

    /// The device reported `0xFFF6` ("not ready yet"). Soft and retryable;
    /// surfaced to the caller rather than retried internally, since only the
    /// caller knows the right polling cadence.
    #[error("device not ready")]
    NotReady,

    /// `device_type` has no entry in the family dispatch table.
    #[error("unsupported device type {device_type:#06x}")]
    UnsupportedDevice {
        /// The unrecognized device-type code.
        device_type: u16,
    },

    /// A learning-mode poll loop exhausted its timeout without a capture.
    #[error("learning timed out without a capture")]
    LearnTimeout,

    /// A caller-supplied argument was out of range or otherwise invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A local socket operation failed for a reason other than timeout (e.g.
    /// ICMP port-unreachable, a bad file descriptor). Distinct from
    /// `NetworkTimeout` because retrying it is pointless: the condition
    /// won't clear on its own the way a dropped datagram might.
    #[error("I/O error: {0}")]
    Io(String),
}

impl BroadlinkError {
    /// Build a [`Self::DeviceError`] or [`Self::NotReady`] from a raw device
    /// error code, per the `0xFFF6` soft/hard split in the error taxonomy.
    #[must_use]
    pub fn from_device_code(code: u16) -> Self {
        if code == broadlink_proto::ERROR_NOT_READY { Self::NotReady } else { Self::DeviceError(code) }
    }

    /// `true` for conditions a caller may reasonably retry (`NotReady`,
    /// `NetworkTimeout`); `false` for protocol violations or bad arguments.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotReady | Self::NetworkTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_code_maps_to_not_ready_variant() {
        assert_eq!(BroadlinkError::from_device_code(0xFFF6), BroadlinkError::NotReady);
    }

    #[test]
    fn other_codes_map_to_device_error() {
        assert_eq!(BroadlinkError::from_device_code(0x0001), BroadlinkError::DeviceError(0x0001));
    }

    #[test]
    fn transience_matches_error_taxonomy() {
        assert!(BroadlinkError::NotReady.is_transient());
        assert!(BroadlinkError::NetworkTimeout { after: Duration::from_secs(10), retries: 2 }.is_transient());
        assert!(!BroadlinkError::DeviceError(0x0001).is_transient());
        assert!(!BroadlinkError::LearnTimeout.is_transient());
        assert!(!BroadlinkError::UnsupportedDevice { device_type: 0xFFFF }.is_transient());
    }
}
