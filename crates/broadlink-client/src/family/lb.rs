//! LB-family smart bulb command dialect: JSON state payload in a small
//! binary envelope.
//!
//! Unlike the fixed-offset binary payloads every other family uses, the
//! bulb firmware wraps a JSON object describing the requested state change
//! (or, on `get_state`, the full current state) inside a short counter +
//! opcode header. Only the fields a caller actually sets are serialized -
//! the firmware leaves any field it doesn't receive untouched.

use broadlink_core::{BroadlinkError, Family};
use serde::{Deserialize, Serialize};

use crate::device::Device;

const GENERIC_COMMAND: u16 = 0x006A;

const OP_GET: u8 = 1;
const OP_SET: u8 = 2;

/// Envelope header size: opcode byte, then a little-endian `u16` JSON
/// length, then one reserved zero byte.
const HEADER_SIZE: usize = 4;

/// Color mode reported/requested by a bulb: RGB or white/color-temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Plain white light at a given brightness/color temperature.
    White,
    /// RGB color.
    Rgb,
}

impl ColorMode {
    const fn to_u8(self) -> u8 {
        match self {
            Self::White => 0,
            Self::Rgb => 1,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Rgb,
            _ => Self::White,
        }
    }
}

/// Requested or reported bulb state. Every field is optional: when sent to
/// [`set_state`], only `Some` fields are included in the JSON payload the
/// firmware receives; [`get_state`] returns every field the firmware
/// reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulbState {
    /// Power: `Some(true)` on, `Some(false)` off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwr: Option<bool>,
    /// Brightness, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// `White` or `Rgb`.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "bulb_colormode")]
    pub colormode: Option<ColorModeWire>,
    /// Red channel, 0-255 (RGB mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red: Option<u8>,
    /// Green channel, 0-255 (RGB mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green: Option<u8>,
    /// Blue channel, 0-255 (RGB mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue: Option<u8>,
    /// Hue, 0-359 degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    /// Saturation, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<u8>,
    /// Color temperature, in the device's native 0-100 scale (not Kelvin).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colortemp: Option<u8>,
}

/// Wire representation of [`ColorMode`]: serde can't derive `Serialize` for
/// a plain enum into the bare integer the firmware expects without this
/// thin wrapper, since `ColorMode` also carries a `const fn` conversion used
/// outside serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorModeWire(u8);

impl From<ColorMode> for ColorModeWire {
    fn from(mode: ColorMode) -> Self {
        Self(mode.to_u8())
    }
}

impl From<ColorModeWire> for ColorMode {
    fn from(wire: ColorModeWire) -> Self {
        Self::from_u8(wire.0)
    }
}

fn validate(state: &BulbState) -> Result<(), BroadlinkError> {
    if let Some(b) = state.brightness {
        if b > 100 {
            return Err(BroadlinkError::InvalidArgument(format!("brightness {b} out of range 0-100")));
        }
    }
    if let Some(h) = state.hue {
        if h > 359 {
            return Err(BroadlinkError::InvalidArgument(format!("hue {h} out of range 0-359")));
        }
    }
    if let Some(s) = state.saturation {
        if s > 100 {
            return Err(BroadlinkError::InvalidArgument(format!("saturation {s} out of range 0-100")));
        }
    }
    if let Some(t) = state.colortemp {
        if t > 100 {
            return Err(BroadlinkError::InvalidArgument(format!("colortemp {t} out of range 0-100")));
        }
    }
    Ok(())
}

fn build_envelope(opcode: u8, json: &[u8]) -> Result<Vec<u8>, BroadlinkError> {
    let len = u16::try_from(json.len())
        .map_err(|_| BroadlinkError::InvalidArgument("bulb state payload too large to encode".to_string()))?;
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

/// Request every field of the bulb's current state.
///
/// # Errors
///
/// See [`Device::send_command`]. Returns [`BroadlinkError::InvalidArgument`]
/// if the response body isn't valid JSON (a malformed or unexpected reply,
/// not a caller error, but there's no more specific variant for it).
pub fn get_state(device: &mut Device) -> Result<BulbState, BroadlinkError> {
    device.require_family(Family::Lb)?;
    let request = build_envelope(OP_GET, b"{}")?;
    let response = device.send_command(GENERIC_COMMAND, &request)?;
    serde_json::from_slice(parse_envelope(&response))
        .map_err(|err| BroadlinkError::InvalidArgument(format!("malformed bulb state response: {err}")))
}

/// Push the fields set on `state`; fields left `None` are left untouched by
/// the firmware.
///
/// # Errors
///
/// [`BroadlinkError::InvalidArgument`] if any set field is out of range.
/// Otherwise see [`Device::send_command`].
pub fn set_state(device: &mut Device, state: &BulbState) -> Result<BulbState, BroadlinkError> {
    device.require_family(Family::Lb)?;
    validate(state)?;
    let json = serde_json::to_vec(state)
        .map_err(|err| BroadlinkError::InvalidArgument(format!("failed to encode bulb state: {err}")))?;
    let request = build_envelope(OP_SET, &json)?;
    let response = device.send_command(GENERIC_COMMAND, &request)?;
    serde_json::from_slice(parse_envelope(&response))
        .map_err(|err| BroadlinkError::InvalidArgument(format!("malformed bulb state response: {err}")))
}
