//! Error types for frame construction and parsing.

use thiserror::Error;

/// Errors raised while building or parsing a Broadlink frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The 8-byte magic prefix did not match `0x5AA5AA555AA5AA55`.
    #[error("invalid magic prefix")]
    InvalidMagic,

    /// Buffer too short to contain the declared header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum length required.
        expected: usize,
        /// Length actually provided.
        actual: usize,
    },

    /// Decrypted payload checksum did not match the header's stored value.
    #[error("payload checksum mismatch: header says {expected:#06x}, computed {actual:#06x}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: u16,
        /// Checksum computed over the decrypted payload.
        actual: u16,
    },

    /// The device reported a non-zero error code in the response header.
    ///
    /// Code `0xFFF6` means "not ready yet" and is usually soft/retryable;
    /// callers that need that distinction should use
    /// `broadlink-core`'s richer error taxonomy, which maps this variant.
    #[error("device reported error code {0:#06x}")]
    DeviceError(u16),

    /// AES-CBC encrypt/decrypt failed (ciphertext misalignment).
    #[error("crypto error: {0}")]
    Crypto(#[from] broadlink_crypto::CryptoError),

    /// A string field (SSID, password, device name) exceeded its fixed
    /// on-wire capacity.
    #[error("field '{field}' of length {len} exceeds the {max}-byte wire capacity")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Length of the value that was rejected.
        len: usize,
        /// Maximum byte capacity for the field.
        max: usize,
    },
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, ProtocolError>;
