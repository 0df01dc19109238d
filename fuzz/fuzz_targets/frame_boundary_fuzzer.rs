//! Fuzz target for frame header boundary conditions.
//!
//! Targets the exact offsets `Frame::decode` reads from directly (magic,
//! error code, device type, command, count, MAC, device ID, payload
//! checksum) with lengths clustered around the 56-byte header boundary,
//! rather than fully random bytes - this is more likely to exercise the
//! off-by-one edges in the header parser than uniform random fuzzing would.

#![no_main]

use arbitrary::Arbitrary;
use broadlink_proto::Frame;
use libfuzzer_sys::fuzz_target;

const KEY: [u8; 16] = [0u8; 16];
const IV: [u8; 16] = [0u8; 16];

#[derive(Debug, Arbitrary)]
struct BoundaryInput {
    /// How many bytes of the 56-byte header to include before truncating.
    header_prefix_len: u8,
    /// Extra ciphertext bytes appended after the (possibly truncated)
    /// header - not necessarily a multiple of 16.
    ciphertext_tail: Vec<u8>,
    /// Whether to corrupt the magic prefix's first byte.
    corrupt_magic: bool,
}

fuzz_target!(|input: BoundaryInput| {
    let mut buf = vec![0u8; 56];
    buf[0..8].copy_from_slice(&[0x5A, 0xA5, 0xAA, 0x55, 0x5A, 0xA5, 0xAA, 0x55]);
    if input.corrupt_magic {
        buf[0] ^= 0xFF;
    }

    let prefix_len = usize::from(input.header_prefix_len).min(56);
    buf.truncate(prefix_len);
    buf.extend_from_slice(&input.ciphertext_tail);

    let _ = Frame::decode(&buf, &KEY, &IV);
});
