//! Session management, family dispatch, and the learning-mode state machine
//! for Broadlink devices.
//!
//! Builds on `broadlink-proto`'s wire layout: [`session::Session`] owns the
//! key/IV/counter/device-ID state that turns a plaintext family payload into
//! an encrypted frame and back, [`family`] resolves a device-type code to
//! its command dialect, and [`learning`] tracks RM learning-mode state
//! across a caller-driven poll loop. No socket I/O happens here - that's
//! `broadlink-client`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod family;
pub mod learning;
pub mod session;

pub use env::{Environment, SystemEnvironment};
pub use error::BroadlinkError;
pub use family::{Family, family_for};
pub use learning::{DEFAULT_LEARN_TIMEOUT, LearningSession, LearningState};
pub use session::{AUTH_PAYLOAD_SIZE, Session};
