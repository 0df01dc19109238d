//! RM-family (universal IR/RF remote, plus RM-hosted sensors) command
//! dialect.
//!
//! Every operation here sends a fixed 16-byte payload (`<opcode> 00×15`) and
//! either discards the response or slices out a caller-facing field. Pulse
//! *encoding* (modality byte, repeat count, per-pulse byte widths) is wire
//! format and lives in [`encode_pulse_packet`]; pulse *interpretation* -
//! decoding a packet back into IR protocol semantics - is out of scope here,
//! [`send_data`] and [`check_data`] pass the bytes through untouched.

use broadlink_core::{BroadlinkError, Family};
use bytes::Bytes;

use crate::device::Device;

const GENERIC_COMMAND: u16 = 0x006A;

const OP_SEND_DATA: u8 = 0x02;
const OP_ENTER_LEARNING: u8 = 0x03;
const OP_CHECK_DATA: u8 = 0x04;
const OP_CHECK_SENSORS: u8 = 0x01;
const OP_SWEEP_FREQUENCY: u8 = 0x19;
const OP_CHECK_FREQUENCY: u8 = 0x1A;
const OP_FIND_RF_PACKET: u8 = 0x1B;
const OP_CANCEL_SWEEP_FREQUENCY: u8 = 0x1E;

/// Offset of the caller-facing data in a `check_data` response payload.
const CHECK_DATA_OFFSET: usize = 0x04;

/// Offset/width of the temperature and humidity fields in a sensor-read
/// response payload.
const TEMPERATURE_OFFSET: usize = 0x04;
const HUMIDITY_OFFSET: usize = 0x06;
const LIGHT_OFFSET: usize = 0x08;
const AIR_OFFSET: usize = 0x09;
const NOISE_OFFSET: usize = 0x0A;

/// First byte of a pulse packet: which radio/protocol the pulses target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Infrared.
    Ir,
    /// RF at 433 MHz.
    Rf433,
    /// RF at 315 MHz.
    Rf315,
}

impl Modality {
    /// Raw modality byte.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Ir => 0x26,
            Self::Rf433 => 0xB2,
            Self::Rf315 => 0xD7,
        }
    }
}

/// Decoded sensor reading from `check_sensors`/`check_temperature`/
/// `check_humidity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity, percent.
    pub humidity: f32,
    /// Raw light-sensor flag byte (models without the sensor report `0`).
    /// Unlike [`crate::family::a1`]'s categorical reading, RM exposes this
    /// byte uninterpreted - the protocol doesn't document its value space.
    pub light: u8,
    /// Raw air-quality flag byte (models without the sensor report `0`).
    pub air: u8,
    /// Raw noise flag byte (models without the sensor report `0`).
    pub noise: u8,
}

/// Convert a pulse width in microseconds to the device's native tick count
/// (factor `269/8192`, truncated toward zero).
///
/// Only needed when constructing a pulse train from scratch (e.g. from a
/// decoded IR protocol); a previously-learned packet from [`check_data`] is
/// already in device-native ticks and should be passed straight to
/// [`send_data`] without this conversion.
#[must_use]
pub fn microseconds_to_ticks(microseconds: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    let ticks = (u64::from(microseconds) * 269 / 8192) as u32;
    ticks
}

fn padded_opcode(op: u8) -> [u8; 16] {
    let mut payload = [0u8; 16];
    payload[0] = op;
    payload
}

/// Build the `02 00 00 00 || raw` envelope for `send_data`, where `raw` packs
/// `modality`, `repeat`, a little-endian pulse-byte length, then the pulses
/// themselves (values `>= 256` are written big-endian with a leading `0x00`).
///
/// Pulse widths beyond `u16::MAX` are not representable on the wire and are
/// silently truncated to `u16::MAX` - callers driving real hardware won't
/// produce such values.
#[must_use]
pub fn encode_pulse_packet(modality: Modality, repeat: u8, pulses: &[u32]) -> Vec<u8> {
    let mut encoded_pulses = Vec::new();
    for &pulse in pulses {
        if pulse < 256 {
            #[allow(clippy::cast_possible_truncation)]
            encoded_pulses.push(pulse as u8);
        } else {
            encoded_pulses.push(0x00);
            let width = u16::try_from(pulse).unwrap_or(u16::MAX);
            encoded_pulses.extend_from_slice(&width.to_be_bytes());
        }
    }

    let mut raw = Vec::with_capacity(4 + encoded_pulses.len());
    raw.push(modality.to_u8());
    raw.push(repeat);
    #[allow(clippy::cast_possible_truncation)]
    raw.extend_from_slice(&(encoded_pulses.len() as u16).to_le_bytes());
    raw.extend_from_slice(&encoded_pulses);

    let mut payload = vec![0x02, 0x00, 0x00, 0x00];
    payload.extend_from_slice(&raw);
    payload
}

/// Arm IR/RF learning mode: `Idle -> IrArmed` (or the first step of the RF
/// path, depending on what the caller polls next).
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn enter_learning(device: &mut Device) -> Result<(), BroadlinkError> {
    device.require_family(Family::Rm)?;
    device.send_command(GENERIC_COMMAND, &padded_opcode(OP_ENTER_LEARNING))?;
    Ok(())
}

/// Poll for a captured IR/RF packet.
///
/// Returns `Ok(None)` (not `Err`) when the device reports `0xFFF6` - the
/// device just hasn't captured anything yet, which is expected while
/// polling, not a failure.
///
/// # Errors
///
/// Any [`BroadlinkError`] other than [`BroadlinkError::NotReady`].
pub fn check_data(device: &mut Device) -> Result<Option<Bytes>, BroadlinkError> {
    device.require_family(Family::Rm)?;
    match device.send_command(GENERIC_COMMAND, &padded_opcode(OP_CHECK_DATA)) {
        Ok(payload) if payload.len() > CHECK_DATA_OFFSET => Ok(Some(payload.slice(CHECK_DATA_OFFSET..))),
        Ok(_) => Ok(Some(Bytes::new())),
        Err(BroadlinkError::NotReady) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Send a previously learned (or externally authored) IR/RF packet. `raw`
/// should already be a complete pulse packet - see [`encode_pulse_packet`].
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn send_data(device: &mut Device, raw: &[u8]) -> Result<(), BroadlinkError> {
    device.require_family(Family::Rm)?;
    let mut payload = vec![0x02, 0x00, 0x00, 0x00];
    payload.extend_from_slice(raw);
    device.send_command(GENERIC_COMMAND, &payload)?;
    Ok(())
}

/// Begin an RF frequency sweep: `Idle -> RfSweeping`. The caller must hold
/// the remote's button while polling [`check_frequency`].
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn sweep_frequency(device: &mut Device) -> Result<(), BroadlinkError> {
    device.require_family(Family::Rm)?;
    device.send_command(GENERIC_COMMAND, &padded_opcode(OP_SWEEP_FREQUENCY))?;
    Ok(())
}

/// Abort an in-progress frequency sweep.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn cancel_sweep_frequency(device: &mut Device) -> Result<(), BroadlinkError> {
    device.require_family(Family::Rm)?;
    device.send_command(GENERIC_COMMAND, &padded_opcode(OP_CANCEL_SWEEP_FREQUENCY))?;
    Ok(())
}

/// Poll whether the RF sweep has locked onto a frequency.
///
/// # Errors
///
/// Any [`BroadlinkError`] other than [`BroadlinkError::NotReady`], which is
/// folded into `Ok(false)` (not locked yet).
pub fn check_frequency(device: &mut Device) -> Result<bool, BroadlinkError> {
    device.require_family(Family::Rm)?;
    match device.send_command(GENERIC_COMMAND, &padded_opcode(OP_CHECK_FREQUENCY)) {
        Ok(payload) => Ok(payload.first().is_some_and(|&b| b != 0)),
        Err(BroadlinkError::NotReady) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Arm RF packet capture after a frequency lock: `RfLocked -> RfArmed`.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn find_rf_packet(device: &mut Device) -> Result<(), BroadlinkError> {
    device.require_family(Family::Rm)?;
    device.send_command(GENERIC_COMMAND, &padded_opcode(OP_FIND_RF_PACKET))?;
    Ok(())
}

/// Read temperature, humidity and the light/air/noise sensor flags present
/// on some RM models.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn check_sensors(device: &mut Device) -> Result<SensorReading, BroadlinkError> {
    device.require_family(Family::Rm)?;
    let payload = device.send_command(GENERIC_COMMAND, &padded_opcode(OP_CHECK_SENSORS))?;
    Ok(decode_sensor_reading(&payload))
}

/// Read temperature only; a thin convenience over [`check_sensors`].
///
/// # Errors
///
/// See [`check_sensors`].
pub fn check_temperature(device: &mut Device) -> Result<f32, BroadlinkError> {
    Ok(check_sensors(device)?.temperature)
}

/// Read humidity only; a thin convenience over [`check_sensors`].
///
/// # Errors
///
/// See [`check_sensors`].
pub fn check_humidity(device: &mut Device) -> Result<f32, BroadlinkError> {
    Ok(check_sensors(device)?.humidity)
}

fn decode_sensor_reading(payload: &[u8]) -> SensorReading {
    let integer_part = payload.get(TEMPERATURE_OFFSET).copied().unwrap_or(0);
    let decimal_part = payload.get(TEMPERATURE_OFFSET + 1).copied().unwrap_or(0);
    let temperature = f32::from(integer_part) + f32::from(decimal_part) / 10.0;

    let humidity_integer = payload.get(HUMIDITY_OFFSET).copied().unwrap_or(0);
    let humidity_decimal = payload.get(HUMIDITY_OFFSET + 1).copied().unwrap_or(0);
    let humidity = f32::from(humidity_integer) + f32::from(humidity_decimal) / 10.0;

    let light = payload.get(LIGHT_OFFSET).copied().unwrap_or(0);
    let air = payload.get(AIR_OFFSET).copied().unwrap_or(0);
    let noise = payload.get(NOISE_OFFSET).copied().unwrap_or(0);

    SensorReading { temperature, humidity, light, air, noise }
}
