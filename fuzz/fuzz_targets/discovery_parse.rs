//! Fuzz target for `DiscoveryResponse::parse`.
//!
//! Discovery responses are unauthenticated and come from arbitrary
//! broadcast traffic on the LAN, so parsing must never panic regardless of
//! what's on the wire - short packets, garbage after the MAC field, or a
//! name field with no terminating zero byte.

#![no_main]

use broadlink_proto::DiscoveryResponse;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = DiscoveryResponse::parse(data);
});
