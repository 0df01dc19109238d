//! AES-128-CBC with the device's zero-padding convention.
//!
//! Unlike PKCS#7, the Broadlink firmware pads plaintext to a 16-byte multiple
//! with plain zero bytes and never removes them on decrypt - the payload
//! length is recovered by the family-specific decoder, not by unpadding.
//! The IV is fixed for the lifetime of a session and is never rotated (see
//! `DESIGN.md` for why this inherited weakness is preserved rather than
//! "fixed").

use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding};

use crate::error::CryptoError;

type Encryptor = cbc::Encryptor<Aes128>;
type Decryptor = cbc::Decryptor<Aes128>;

/// Zero-pad `plaintext` to a 16-byte multiple, then AES-128-CBC encrypt it.
///
/// # Security
///
/// This is not authenticated encryption - the wire format's integrity comes
/// from the paired checksum fields in the frame header, not from the cipher.
/// That is a property of the Broadlink firmware, not a design choice made
/// here.
#[must_use]
pub fn encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let mut buf = plaintext.to_vec();
    let pad = (16 - (buf.len() % 16)) % 16;
    buf.extend(std::iter::repeat_n(0u8, pad));

    let encryptor = Encryptor::new(key.into(), iv.into());
    // INVARIANT: `buf.len()` is always a multiple of 16 because of the padding
    // above, so `NoPadding` encryption over the full buffer cannot fail.
    let len = buf.len();
    #[allow(clippy::expect_used)]
    encryptor
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .expect("invariant: buffer length is a multiple of the AES block size")
        .to_vec()
}

/// AES-128-CBC decrypt `ciphertext`.
///
/// The output retains any zero padding the sender added; it is exactly as
/// long as `ciphertext`. Callers interpret trailing zeros via the
/// family-specific payload layout, not via this function.
///
/// # Errors
///
/// - `CryptoError::UnalignedCiphertext` if `ciphertext.len()` is not a
///   multiple of 16.
pub fn decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() % 16 != 0 {
        return Err(CryptoError::UnalignedCiphertext { len: ciphertext.len() });
    }
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }

    let mut buf = ciphertext.to_vec();
    let decryptor = Decryptor::new(key.into(), iv.into());
    // INVARIANT: length checked above, so NoPadding decryption cannot fail.
    #[allow(clippy::expect_used)]
    let plaintext = decryptor
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .expect("invariant: ciphertext length is a multiple of the AES block size");

    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = *b"0123456789abcdef";
    const IV: [u8; 16] = *b"fedcba9876543210";

    #[test]
    fn round_trip_exact_block() {
        let plaintext = [0x42u8; 16];
        let ciphertext = encrypt(&KEY, &IV, &plaintext);
        assert_eq!(ciphertext.len(), 16);
        let decrypted = decrypt(&KEY, &IV, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn round_trip_requires_zero_padding() {
        let plaintext = b"not a multiple of sixteen!!"; // 27 bytes
        let ciphertext = encrypt(&KEY, &IV, plaintext);
        assert_eq!(ciphertext.len(), 32); // padded up to next 16-byte multiple

        let decrypted = decrypt(&KEY, &IV, &ciphertext).unwrap();
        assert_eq!(&decrypted[..plaintext.len()], plaintext);
        assert!(decrypted[plaintext.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn round_trip_empty_plaintext() {
        let ciphertext = encrypt(&KEY, &IV, &[]);
        assert_eq!(ciphertext.len(), 0);
        assert_eq!(decrypt(&KEY, &IV, &ciphertext).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_unaligned_ciphertext() {
        let result = decrypt(&KEY, &IV, &[0u8; 17]);
        assert_eq!(result, Err(CryptoError::UnalignedCiphertext { len: 17 }));
    }

    #[test]
    fn different_keys_produce_different_ciphertext() {
        let plaintext = [0xAAu8; 32];
        let other_key = [0x01u8; 16];
        let a = encrypt(&KEY, &IV, &plaintext);
        let b = encrypt(&other_key, &IV, &plaintext);
        assert_ne!(a, b);
    }

    proptest::proptest! {
        #[test]
        fn round_trip_arbitrary_plaintext(data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..512)) {
            let ciphertext = encrypt(&KEY, &IV, &data);
            let decrypted = decrypt(&KEY, &IV, &ciphertext).unwrap();
            proptest::prop_assert_eq!(&decrypted[..data.len()], &data[..]);
            proptest::prop_assert!(decrypted[data.len()..].iter().all(|&b| b == 0));
        }
    }
}
