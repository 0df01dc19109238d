//! Wi-Fi provisioning ("setup") broadcast frame.
//!
//! Unlike discovery, provisioning expects no response: a device in AP mode
//! consumes the broadcast and reboots onto the configured network.

use broadlink_crypto::checksum;

use crate::errors::{ProtocolError, Result};

/// Size of the provisioning frame, in bytes.
pub const PROVISIONING_FRAME_SIZE: usize = 136;

const SSID_OFFSET: usize = 0x44;
const SSID_MAX_LEN: usize = 0x64 - 0x44;
const PASSWORD_OFFSET: usize = 0x64;
const PASSWORD_MAX_LEN: usize = 0x84 - 0x64;
const SSID_LEN_OFFSET: usize = 0x84;
const PASSWORD_LEN_OFFSET: usize = 0x85;
const SECURITY_MODE_OFFSET: usize = 0x86;

/// Wi-Fi security mode, as encoded in the provisioning frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    /// Open network, no password.
    Open,
    /// WEP.
    Wep,
    /// WPA1/WPA2 personal (PSK).
    Wpa1Wpa2,
    /// WPA2 personal (PSK) only.
    Wpa2,
    /// WPA1/WPA2/WPA3 personal, any accepted.
    Wpa1Wpa2Wpa3,
    /// WPA3 personal only.
    Wpa3,
}

impl SecurityMode {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Wep => 1,
            Self::Wpa1Wpa2 => 2,
            Self::Wpa2 => 3,
            Self::Wpa1Wpa2Wpa3 => 4,
            Self::Wpa3 => 5,
        }
    }
}

/// Build the 136-byte Wi-Fi provisioning broadcast frame.
///
/// # Errors
///
/// [`ProtocolError::FieldTooLong`] if `ssid` exceeds 32 bytes or `password`
/// exceeds 32 bytes once UTF-8 encoded.
pub fn build_provisioning_frame(
    ssid: &str,
    password: &str,
    security_mode: SecurityMode,
) -> Result<[u8; PROVISIONING_FRAME_SIZE]> {
    let ssid_bytes = ssid.as_bytes();
    if ssid_bytes.len() > SSID_MAX_LEN {
        return Err(ProtocolError::FieldTooLong { field: "ssid", len: ssid_bytes.len(), max: SSID_MAX_LEN });
    }

    let password_bytes = password.as_bytes();
    if password_bytes.len() > PASSWORD_MAX_LEN {
        return Err(ProtocolError::FieldTooLong {
            field: "password",
            len: password_bytes.len(),
            max: PASSWORD_MAX_LEN,
        });
    }

    let mut buf = [0u8; PROVISIONING_FRAME_SIZE];
    buf[SSID_OFFSET..SSID_OFFSET + ssid_bytes.len()].copy_from_slice(ssid_bytes);
    buf[PASSWORD_OFFSET..PASSWORD_OFFSET + password_bytes.len()].copy_from_slice(password_bytes);

    #[allow(clippy::cast_possible_truncation)]
    {
        buf[SSID_LEN_OFFSET] = ssid_bytes.len() as u8;
        buf[PASSWORD_LEN_OFFSET] = password_bytes.len() as u8;
    }
    buf[SECURITY_MODE_OFFSET] = security_mode.to_u8();
    buf[0x26] = 0x14;

    buf[0x20..0x22].copy_from_slice(&[0, 0]);
    let sum = checksum(&buf);
    buf[0x20..0x22].copy_from_slice(&sum.to_le_bytes());

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_ssid_and_password_at_fixed_offsets() {
        let frame = build_provisioning_frame("home-wifi", "hunter2", SecurityMode::Wpa2).unwrap();
        assert_eq!(&frame[SSID_OFFSET..SSID_OFFSET + 9], b"home-wifi");
        assert_eq!(&frame[PASSWORD_OFFSET..PASSWORD_OFFSET + 7], b"hunter2");
        assert_eq!(frame[SSID_LEN_OFFSET], 9);
        assert_eq!(frame[PASSWORD_LEN_OFFSET], 7);
        assert_eq!(frame[SECURITY_MODE_OFFSET], SecurityMode::Wpa2.to_u8());
        assert_eq!(frame[0x26], 0x14);
    }

    #[test]
    fn rejects_oversized_ssid() {
        let ssid = "x".repeat(33);
        let result = build_provisioning_frame(&ssid, "", SecurityMode::Open);
        assert_eq!(result, Err(ProtocolError::FieldTooLong { field: "ssid", len: 33, max: 32 }));
    }

    #[test]
    fn rejects_oversized_password() {
        let password = "x".repeat(33);
        let result = build_provisioning_frame("home", &password, SecurityMode::Wpa2);
        assert_eq!(result, Err(ProtocolError::FieldTooLong { field: "password", len: 33, max: 32 }));
    }

    #[test]
    fn checksum_covers_whole_frame() {
        let frame = build_provisioning_frame("home", "password1", SecurityMode::Wpa1Wpa2).unwrap();
        let mut zeroed = frame;
        zeroed[0x20..0x22].copy_from_slice(&[0, 0]);
        let expected = checksum(&zeroed);
        assert_eq!(u16::from_le_bytes([frame[0x20], frame[0x21]]), expected);
    }
}
