//! Fuzz target for `Frame::decode`.
//!
//! Exercises frame decoding with arbitrary byte sequences to find parser
//! crashes, integer overflows in size calculations, buffer over-reads, or
//! malformed headers that bypass validation. Decoding must never panic -
//! every invalid input should return an `Err`.

#![no_main]

use broadlink_proto::Frame;
use libfuzzer_sys::fuzz_target;

const KEY: [u8; 16] = [0u8; 16];
const IV: [u8; 16] = [0u8; 16];

fuzz_target!(|data: &[u8]| {
    let _ = Frame::decode(data, &KEY, &IV);
});
