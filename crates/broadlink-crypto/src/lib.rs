//! Broadlink codec primitives
//!
//! The two low-level building blocks every Broadlink frame is built from:
//! the additive frame checksum and AES-128-CBC encryption with the device's
//! zero-padding convention. Pure functions, no I/O.
//!
//! # Key Lifecycle
//!
//! ```text
//! bootstrap key/IV (well-known, hardcoded in firmware)
//!        │
//!        ▼
//! Session::auth() ──▶ device-assigned session key (IV unchanged)
//!        │
//!        ▼
//! AES-128-CBC(session key, fixed IV) ──▶ command payload ciphertext
//! ```
//!
//! # Security
//!
//! The fixed, never-rotated IV is a known weakness of the Broadlink
//! firmware, not a design choice made here - see `DESIGN.md`. This crate
//! preserves it for wire compatibility and does not attempt to "fix" it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod aes_cbc;
mod checksum;
mod error;

pub use aes_cbc::{decrypt, encrypt};
pub use checksum::{CHECKSUM_SEED, checksum};
pub use error::CryptoError;

/// The well-known AES-128 key every device accepts before authentication.
pub const BOOTSTRAP_KEY: [u8; 16] =
    [0x09, 0x76, 0x28, 0x34, 0x3f, 0xe9, 0x9e, 0x23, 0x76, 0x5c, 0x15, 0x13, 0xac, 0xcf, 0x8b, 0x02];

/// The fixed AES IV used for every frame, before and after authentication.
pub const BOOTSTRAP_IV: [u8; 16] =
    [0x56, 0x2e, 0x17, 0x99, 0x6d, 0x09, 0x3d, 0x28, 0xdd, 0xb3, 0xba, 0x69, 0x5a, 0x2e, 0x6f, 0x58];
