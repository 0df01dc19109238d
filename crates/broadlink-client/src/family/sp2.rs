//! SP2/SP3/SP4-family smart plug command dialect: power control, nightlight
//! control, and energy metering.
//!
//! Some SP3-generation models have an indicator nightlight alongside the
//! relay; its state lives in the same status byte as the power bit
//! (`check_power`'s response byte 0x04), one bit over. Models without a
//! nightlight simply never set that bit, so `check_nightlight` degrades to
//! "always off" rather than failing.

use broadlink_core::{BroadlinkError, Family};

use crate::device::Device;

const GENERIC_COMMAND: u16 = 0x006A;

const OP_SET_POWER: u8 = 0x02;
const OP_CHECK_POWER: u8 = 0x01;
const OP_GET_ENERGY: u8 = 0x04;

const POWER_BIT_OFFSET: usize = 0x04;
const POWER_BIT: u8 = 0x01;
const NIGHTLIGHT_BIT: u8 = 0x02;
const ENERGY_OFFSET: usize = 0x07;

/// Set the plug's power state.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn set_power(device: &mut Device, on: bool) -> Result<(), BroadlinkError> {
    device.require_family(Family::Sp2)?;
    let payload = [0x02, 0x00, 0x00, 0x00, if on { POWER_BIT } else { 0 }];
    device.send_command(GENERIC_COMMAND, &payload)?;
    Ok(())
}

/// Read the plug's current power state.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn check_power(device: &mut Device) -> Result<bool, BroadlinkError> {
    device.require_family(Family::Sp2)?;
    let payload = device.send_command(GENERIC_COMMAND, &padded_opcode(OP_CHECK_POWER))?;
    Ok(payload.get(POWER_BIT_OFFSET).is_some_and(|&b| b & POWER_BIT != 0))
}

/// Set the plug's nightlight indicator, on models that have one.
///
/// Devices without a nightlight accept and ignore this bit rather than
/// rejecting it - the core has no way to distinguish "no nightlight" from
/// "nightlight off" without a capability flag the protocol doesn't expose.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn set_nightlight(device: &mut Device, on: bool) -> Result<(), BroadlinkError> {
    device.require_family(Family::Sp2)?;
    let payload = [0x02, 0x00, 0x00, 0x00, if on { NIGHTLIGHT_BIT } else { 0 }];
    device.send_command(GENERIC_COMMAND, &payload)?;
    Ok(())
}

/// Read the plug's current nightlight state.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn check_nightlight(device: &mut Device) -> Result<bool, BroadlinkError> {
    device.require_family(Family::Sp2)?;
    let payload = device.send_command(GENERIC_COMMAND, &padded_opcode(OP_CHECK_POWER))?;
    Ok(payload.get(POWER_BIT_OFFSET).is_some_and(|&b| b & NIGHTLIGHT_BIT != 0))
}

/// Read cumulative energy usage in kWh.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn get_energy(device: &mut Device) -> Result<f32, BroadlinkError> {
    device.require_family(Family::Sp2)?;
    let payload = device.send_command(GENERIC_COMMAND, &padded_opcode(OP_GET_ENERGY))?;
    Ok(decode_energy_bcd(payload.get(ENERGY_OFFSET..ENERGY_OFFSET + 3).unwrap_or(&[0, 0, 0])))
}

fn padded_opcode(op: u8) -> [u8; 16] {
    let mut payload = [0u8; 16];
    payload[0] = op;
    payload
}

/// Decode 3 BCD bytes (`units`, `tenths`, `hundredths`, high-to-low) into
/// kWh. The device reports energy as an integer scaled by 100.
fn decode_energy_bcd(bytes: &[u8]) -> f32 {
    let hundredths = u32::from(bcd_byte(bytes[0])) * 10000
        + u32::from(bcd_byte(bytes[1])) * 100
        + u32::from(bcd_byte(bytes[2]));
    hundredths as f32 / 100.0
}

fn bcd_byte(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0F)
}
