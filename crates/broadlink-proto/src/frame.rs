//! Command frame encode/decode: the 56-byte header plus AES-CBC payload.
//!
//! Layout (little-endian throughout):
//!
//! ```text
//! 0x00..0x08  magic (8 bytes, fixed)
//! 0x08..0x20  reserved, zero
//! 0x20..0x22  whole-frame checksum (computed last, with this field zeroed)
//! 0x22..0x24  error code (0 on request; device-reported on response)
//! 0x24..0x26  device type
//! 0x26..0x28  command
//! 0x28..0x2a  packet count
//! 0x2a..0x30  local MAC
//! 0x30..0x34  device id
//! 0x34..0x36  payload checksum (computed over the plaintext payload)
//! 0x36..0x38  reserved, zero
//! 0x38..      AES-128-CBC ciphertext
//! ```

use bytes::Bytes;
use broadlink_crypto::checksum;

use crate::{
    errors::{ProtocolError, Result},
    header::{FrameHeader, HEADER_SIZE, MAGIC},
};

/// A decoded command frame: the plaintext header fields plus the decrypted
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Plaintext header fields.
    pub header: FrameHeader,
    /// Decrypted payload, still zero-padded to a 16-byte multiple.
    pub payload: Bytes,
}

impl Frame {
    /// Build a new frame from its plaintext header and payload.
    #[must_use]
    pub fn new(header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        Self { header, payload: payload.into() }
    }

    /// Encode this frame to its AES-encrypted wire representation.
    ///
    /// Computes the payload checksum over the plaintext payload, encrypts
    /// the payload with `key`/`iv`, then computes the whole-frame checksum
    /// over the assembled buffer with the checksum field held at zero.
    #[must_use]
    pub fn encode(&self, key: &[u8; 16], iv: &[u8; 16]) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0x00..0x08].copy_from_slice(&MAGIC);
        buf[0x24..0x26].copy_from_slice(&self.header.device_type.to_le_bytes());
        buf[0x26..0x28].copy_from_slice(&self.header.command.to_le_bytes());
        buf[0x28..0x2a].copy_from_slice(&self.header.count.to_le_bytes());
        buf[0x2a..0x30].copy_from_slice(&self.header.local_mac);
        buf[0x30..0x34].copy_from_slice(&self.header.device_id.to_le_bytes());

        let payload_checksum = checksum(&self.payload);
        buf[0x34..0x36].copy_from_slice(&payload_checksum.to_le_bytes());

        let ciphertext = broadlink_crypto::encrypt(key, iv, &self.payload);
        buf.extend_from_slice(&ciphertext);

        // Frame checksum covers the whole buffer with this field zeroed.
        buf[0x20..0x22].copy_from_slice(&[0, 0]);
        let frame_checksum = checksum(&buf);
        buf[0x20..0x22].copy_from_slice(&frame_checksum.to_le_bytes());

        buf
    }

    /// Decode a wire frame, decrypting its payload with `key`/`iv`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTooShort`] if `bytes` is shorter than the
    ///   56-byte header.
    /// - [`ProtocolError::InvalidMagic`] if the magic prefix doesn't match.
    /// - [`ProtocolError::DeviceError`] if the header's error code is
    ///   non-zero.
    /// - [`ProtocolError::Crypto`] if the ciphertext is misaligned.
    /// - [`ProtocolError::ChecksumMismatch`] if the decrypted payload's
    ///   checksum doesn't match the header's recorded value.
    pub fn decode(bytes: &[u8], key: &[u8; 16], iv: &[u8; 16]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort { expected: HEADER_SIZE, actual: bytes.len() });
        }

        if bytes[0x00..0x08] != MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        let error_code = u16::from_le_bytes([bytes[0x22], bytes[0x23]]);
        if error_code != 0 {
            return Err(ProtocolError::DeviceError(error_code));
        }

        let device_type = u16::from_le_bytes([bytes[0x24], bytes[0x25]]);
        let command = u16::from_le_bytes([bytes[0x26], bytes[0x27]]);
        let count = u16::from_le_bytes([bytes[0x28], bytes[0x29]]);
        let mut local_mac = [0u8; 6];
        local_mac.copy_from_slice(&bytes[0x2a..0x30]);
        let device_id = u32::from_le_bytes([bytes[0x30], bytes[0x31], bytes[0x32], bytes[0x33]]);
        let expected_checksum = u16::from_le_bytes([bytes[0x34], bytes[0x35]]);

        let ciphertext = &bytes[HEADER_SIZE..];
        let decrypted = broadlink_crypto::decrypt(key, iv, ciphertext)?;

        let actual_checksum = checksum(&decrypted);
        if actual_checksum != expected_checksum {
            return Err(ProtocolError::ChecksumMismatch {
                expected: expected_checksum,
                actual: actual_checksum,
            });
        }

        let header = FrameHeader { device_type, command, count, local_mac, device_id };
        Ok(Self { header, payload: Bytes::from(decrypted) })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::header::Opcode;

    const KEY: [u8; 16] = *b"0123456789abcdef";
    const IV: [u8; 16] = *b"fedcba9876543210";

    fn sample_header() -> FrameHeader {
        FrameHeader {
            device_type: 0x2737,
            command: Opcode::Generic.to_u16(),
            count: 42,
            local_mac: [0x02, 0x00, 0x00, 0x00, 0x00, 0x01],
            device_id: 0x1234_5678,
        }
    }

    #[test]
    fn round_trip_preserves_header_and_payload() {
        let frame = Frame::new(sample_header(), vec![0xAA; 16]);
        let wire = frame.encode(&KEY, &IV);
        let decoded = Frame::decode(&wire, &KEY, &IV).unwrap();
        assert_eq!(decoded.header, sample_header());
        assert_eq!(decoded.payload, Bytes::from(vec![0xAA; 16]));
    }

    #[test]
    fn round_trip_empty_payload() {
        let frame = Frame::new(sample_header(), Vec::new());
        let wire = frame.encode(&KEY, &IV);
        assert_eq!(wire.len(), HEADER_SIZE);
        let decoded = Frame::decode(&wire, &KEY, &IV).unwrap();
        assert_eq!(decoded.payload, Bytes::new());
    }

    #[test]
    fn rejects_bad_magic() {
        let frame = Frame::new(sample_header(), vec![1, 2, 3]);
        let mut wire = frame.encode(&KEY, &IV);
        wire[0] = 0x00;
        assert_eq!(Frame::decode(&wire, &KEY, &IV), Err(ProtocolError::InvalidMagic));
    }

    #[test]
    fn rejects_short_buffer() {
        let result = Frame::decode(&[0u8; 10], &KEY, &IV);
        assert_eq!(result, Err(ProtocolError::FrameTooShort { expected: HEADER_SIZE, actual: 10 }));
    }

    #[test]
    fn surfaces_device_error_code() {
        let frame = Frame::new(sample_header(), vec![1, 2, 3]);
        let mut wire = frame.encode(&KEY, &IV);
        wire[0x22..0x24].copy_from_slice(&0xFFF6u16.to_le_bytes());
        assert_eq!(Frame::decode(&wire, &KEY, &IV), Err(ProtocolError::DeviceError(0xFFF6)));
    }

    #[test]
    fn rejects_tampered_payload_checksum() {
        let frame = Frame::new(sample_header(), vec![7; 16]);
        let mut wire = frame.encode(&KEY, &IV);
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        assert!(matches!(Frame::decode(&wire, &KEY, &IV), Err(ProtocolError::ChecksumMismatch { .. })));
    }

    proptest! {
        #[test]
        fn frame_round_trip_arbitrary_payload(
            device_type: u16,
            command: u16,
            count: u16,
            local_mac in proptest::collection::vec(any::<u8>(), 6),
            device_id: u32,
            payload in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let mut mac = [0u8; 6];
            mac.copy_from_slice(&local_mac);
            let header = FrameHeader { device_type, command, count, local_mac: mac, device_id };
            let frame = Frame::new(header, payload.clone());
            let wire = frame.encode(&KEY, &IV);
            let decoded = Frame::decode(&wire, &KEY, &IV).unwrap();
            prop_assert_eq!(decoded.header, header);
            prop_assert_eq!(&decoded.payload[..payload.len()], &payload[..]);
            prop_assert!(decoded.payload[payload.len()..].iter().all(|&b| b == 0));
        }
    }
}
