//! Broadlink wire frame layout.
//!
//! Three frame shapes share the same checksum/encryption conventions from
//! `broadlink-crypto`:
//!
//! - [`Frame`] - the 56-byte command header plus AES-CBC payload used for
//!   every authenticated request/response (auth, family commands).
//! - [`discovery::DiscoveryResponse`] / [`discovery::build_probe`] - the
//!   unauthenticated 48-byte discovery probe and its response.
//! - [`provisioning::build_provisioning_frame`] - the 136-byte Wi-Fi setup
//!   broadcast.
//!
//! This crate only knows byte layout; it has no socket, no session state,
//! and no opinion about retries or timeouts.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod discovery;
pub mod errors;
pub mod frame;
pub mod header;
pub mod provisioning;

pub use discovery::{DiscoveryClock, DiscoveryResponse, build_probe};
pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::{ERROR_NOT_READY, FrameHeader, HEADER_SIZE, MAGIC, Opcode};
pub use provisioning::{SecurityMode, build_provisioning_frame};
