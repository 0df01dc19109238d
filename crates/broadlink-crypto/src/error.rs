//! Error types for the Broadlink codec layer.

use thiserror::Error;

/// Errors raised by checksum and AES-CBC primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Ciphertext length is not a multiple of the AES block size (16 bytes).
    #[error("ciphertext length {len} is not a multiple of the AES block size (16)")]
    UnalignedCiphertext {
        /// The offending length in bytes.
        len: usize,
    },
}
