//! Caller-facing synchronous surface for Broadlink devices.
//!
//! Builds on `broadlink-core`'s session/dispatch/learning state machines and
//! `broadlink-proto`'s wire layout to provide the thing an application
//! actually calls: [`discover`]/[`xdiscover`]/[`hello`]/[`setup`] to find or
//! address a device, [`Device`] as the per-device handle that owns the
//! socket and session, and one module per family dialect
//! ([`family::rm`], [`family::sp1`], [`family::sp2`], [`family::mp1`],
//! [`family::a1`], [`family::lb`], [`family::hub`]) built as free functions
//! over `&mut Device` rather than a subclass hierarchy.
//!
//! All I/O in this crate is synchronous and blocking: a `Device` owns its
//! own `UdpSocket` and every method takes `&mut self`, so the borrow checker
//! enforces "one in-flight request per handle" rather than a runtime lock.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod device;
pub mod discover;
pub mod family;
pub mod transport;

pub use broadlink_proto::SecurityMode;
pub use device::Device;
pub use discover::{DEVICE_PORT, DiscoverOptions, discover, hello, setup, xdiscover};
pub use transport::{BroadcastSocket, DEFAULT_RETRIES, DEFAULT_TIMEOUT, Transport};
