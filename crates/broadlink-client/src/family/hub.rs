//! Hub (S3) family command dialect: sub-device enumeration and addressed
//! state operations.
//!
//! A hub has no state of its own worth reading; every operation is either
//! "list the sub-devices behind this hub" or "get/set one sub-device's
//! state", addressed by its 32-hex-character DID. Same JSON-in-envelope
//! wire shape as [`crate::family::lb`].

use broadlink_core::{BroadlinkError, Family};
use serde::{Deserialize, Serialize};

use crate::device::Device;

const GENERIC_COMMAND: u16 = 0x006A;

const OP_LIST_SUBDEVICES: u8 = 1;
const OP_GET_STATE: u8 = 2;
const OP_SET_STATE: u8 = 3;

const HEADER_SIZE: usize = 4;

/// A sub-device identifier: 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Validate and wrap a 32-hex-character sub-device identifier.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if `value` isn't exactly 32 ASCII
    /// hex digits.
    pub fn new(value: impl Into<String>) -> Result<Self, BroadlinkError> {
        let value = value.into();
        if value.len() != 32 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BroadlinkError::InvalidArgument(format!(
                "sub-device DID must be 32 hex characters, got {value:?}"
            )));
        }
        Ok(Self(value))
    }

    /// The DID's string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Requested or reported state of one sub-device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdeviceState {
    /// DID this state belongs to (present in both requests and responses).
    pub did: Option<Did>,
    /// Primary power state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwr: Option<bool>,
    /// Secondary power state (two-gang switches).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwr1: Option<bool>,
    /// Tertiary power state (three-gang switches).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwr2: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SubdeviceList {
    #[serde(default)]
    list: Vec<SubdeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct SubdeviceEntry {
    did: Did,
}

fn build_envelope(opcode: u8, json: &[u8]) -> Result<Vec<u8>, BroadlinkError> {
    let len = u16::try_from(json.len())
        .map_err(|_| BroadlinkError::InvalidArgument("hub command payload too large to encode".to_string()))?;
    let mut payload = Vec::with_capacity(HEADER_SIZE + json.len());
    payload.push(opcode);
    payload.extend_from_slice(&len.to_le_bytes());
    payload.push(0);
    payload.extend_from_slice(json);
    Ok(payload)
}

fn parse_envelope(payload: &[u8]) -> &[u8] {
    payload.get(HEADER_SIZE..).unwrap_or(&[])
}

/// Enumerate the sub-devices attached to this hub.
///
/// # Errors
///
/// See [`Device::send_command`]. [`BroadlinkError::InvalidArgument`] if the
/// response body isn't a recognizable sub-device list.
pub fn get_subdevices(device: &mut Device) -> Result<Vec<Did>, BroadlinkError> {
    device.require_family(Family::Hub)?;
    let request = build_envelope(OP_LIST_SUBDEVICES, b"{}")?;
    let response = device.send_command(GENERIC_COMMAND, &request)?;
    let parsed: SubdeviceList = serde_json::from_slice(parse_envelope(&response))
        .map_err(|err| BroadlinkError::InvalidArgument(format!("malformed sub-device list: {err}")))?;
    Ok(parsed.list.into_iter().map(|entry| entry.did).collect())
}

/// Read one sub-device's current state.
///
/// # Errors
///
/// See [`Device::send_command`]. [`BroadlinkError::InvalidArgument`] if the
/// response body isn't valid sub-device state JSON.
pub fn get_state(device: &mut Device, did: &Did) -> Result<SubdeviceState, BroadlinkError> {
    device.require_family(Family::Hub)?;
    let request_body = serde_json::to_vec(&SubdeviceState { did: Some(did.clone()), ..SubdeviceState::default() })
        .map_err(|err| BroadlinkError::InvalidArgument(format!("failed to encode sub-device request: {err}")))?;
    let request = build_envelope(OP_GET_STATE, &request_body)?;
    let response = device.send_command(GENERIC_COMMAND, &request)?;
    serde_json::from_slice(parse_envelope(&response))
        .map_err(|err| BroadlinkError::InvalidArgument(format!("malformed sub-device state: {err}")))
}

/// Push the fields set on `state` (`did` is forced to `did`, regardless of
/// what's set on `state`).
///
/// # Errors
///
/// See [`Device::send_command`]. [`BroadlinkError::InvalidArgument`] if the
/// response body isn't valid sub-device state JSON.
pub fn set_state(device: &mut Device, did: &Did, state: &SubdeviceState) -> Result<SubdeviceState, BroadlinkError> {
    device.require_family(Family::Hub)?;
    let mut request_state = state.clone();
    request_state.did = Some(did.clone());
    let request_body = serde_json::to_vec(&request_state)
        .map_err(|err| BroadlinkError::InvalidArgument(format!("failed to encode sub-device request: {err}")))?;
    let request = build_envelope(OP_SET_STATE, &request_body)?;
    let response = device.send_command(GENERIC_COMMAND, &request)?;
    serde_json::from_slice(parse_envelope(&response))
        .map_err(|err| BroadlinkError::InvalidArgument(format!("malformed sub-device state: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_accepts_32_hex_chars() {
        let did = Did::new("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(did.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn did_rejects_wrong_length() {
        assert!(Did::new("short").is_err());
    }

    #[test]
    fn did_rejects_non_hex_characters() {
        let value = "z".repeat(32);
        assert!(Did::new(value).is_err());
    }

    #[test]
    fn subdevice_list_parses_did_entries() {
        let json = r#"{"list":[{"did":"0123456789abcdef0123456789abcdef"}]}"#;
        let parsed: SubdeviceList = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.list.len(), 1);
        assert_eq!(parsed.list[0].did.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn envelope_round_trips_json_payload() {
        let envelope = build_envelope(OP_GET_STATE, br#"{"pwr":true}"#).unwrap();
        assert_eq!(envelope[0], OP_GET_STATE);
        assert_eq!(parse_envelope(&envelope), br#"{"pwr":true}"#);
    }

    #[test]
    fn get_subdevices_without_auth_surfaces_auth_error() {
        use std::net::{Ipv4Addr, SocketAddr};

        let mut device = Device::new(
            SocketAddr::from((Ipv4Addr::LOCALHOST, 80)),
            [0; 6],
            0x520B,
            Family::Hub,
            None,
            [0x02, 0, 0, 0, 0, 1],
            Ipv4Addr::UNSPECIFIED,
            false,
        );
        assert!(matches!(get_subdevices(&mut device), Err(BroadlinkError::AuthError(_))));
    }
}
