//! Per-family command dialects.
//!
//! Every module here is a set of pure encode/decode functions over
//! `&mut Device`, not a subclass: the dispatch happens once, at discovery
//! time, when `broadlink_core::family_for` resolves a device's `device_type`
//! to a [`broadlink_core::Family`] tag. Every entry point opens with
//! `Device::require_family`, so calling the wrong family's functions against
//! a device that resolved to a different tag - including a tag the dispatch
//! table couldn't resolve at all - fails fast with
//! `BroadlinkError::UnsupportedDevice` instead of reaching the network.

pub mod a1;
pub mod hub;
pub mod lb;
pub mod mp1;
pub mod rm;
pub mod sp1;
pub mod sp2;
