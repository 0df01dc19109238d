//! The frame checksum used throughout the Broadlink wire format.
//!
//! Both the whole-frame checksum (header bytes 0x20-0x21) and the
//! plaintext-payload checksum (header bytes 0x34-0x35) use the same
//! algorithm: sum every byte, add a fixed seed, and wrap at `0x10000`.

/// Additive seed mixed into every checksum computation.
pub const CHECKSUM_SEED: u16 = 0xBEAF;

/// Compute the Broadlink frame checksum over `bytes`.
///
/// This is a 16-bit wrapping sum, not a CRC: `seed + sum(bytes) mod 0x10000`.
/// Because the sum is additive, appending zero bytes to `bytes` never changes
/// the result - this is what lets [`crate::aes_cbc`]'s zero-padding convention
/// coexist with a checksum computed before padding was added.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut sum: u32 = u32::from(CHECKSUM_SEED);
    for &byte in bytes {
        sum = sum.wrapping_add(u32::from(byte));
    }
    (sum & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_magic_plus_zeros() {
        // spec.md Scenario A: magic bytes followed by 48 zero bytes.
        let mut buf = vec![0x5A, 0xA5, 0xAA, 0x55, 0x5A, 0xA5, 0xAA, 0x55];
        buf.extend(std::iter::repeat_n(0u8, 48));

        let magic_sum: u32 = 0x5A + 0xA5 + 0xAA + 0x55 + 0x5A + 0xA5 + 0xAA + 0x55;
        let expected = ((u32::from(CHECKSUM_SEED) + magic_sum) & 0xFFFF) as u16;

        assert_eq!(checksum(&buf), expected);
    }

    #[test]
    fn empty_buffer_equals_seed() {
        assert_eq!(checksum(&[]), CHECKSUM_SEED);
    }

    #[test]
    fn wraps_at_0x10000() {
        let buf = vec![0xFFu8; 4096];
        let expected = {
            let sum: u32 = u32::from(CHECKSUM_SEED) + 4096 * 0xFF;
            (sum & 0xFFFF) as u16
        };
        assert_eq!(checksum(&buf), expected);
    }

    #[test]
    fn trailing_zero_padding_does_not_change_checksum() {
        let plain = b"hello broadlink";
        let mut padded = plain.to_vec();
        padded.extend(std::iter::repeat_n(0u8, 16 - (plain.len() % 16)));

        assert_eq!(checksum(plain), checksum(&padded));
    }

    proptest::proptest! {
        #[test]
        fn checksum_is_order_independent_of_trailing_zeros(
            data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256),
            zero_count in 0usize..32,
        ) {
            let mut padded = data.clone();
            padded.extend(std::iter::repeat_n(0u8, zero_count));
            proptest::prop_assert_eq!(checksum(&data), checksum(&padded));
        }
    }
}
