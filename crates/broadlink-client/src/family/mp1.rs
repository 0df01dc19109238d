//! MP1 four-socket power strip command dialect: per-socket bitmask control.

use broadlink_core::{BroadlinkError, Family};

use crate::device::Device;

const GENERIC_COMMAND: u16 = 0x006A;

const SET_POWER_HEADER: [u8; 10] = [0x0D, 0x00, 0xA5, 0xA5, 0x5A, 0x5A, 0xB2, 0xC0, 0x02, 0x03];
const CHECK_POWER_PAYLOAD: [u8; 16] =
    [0x0A, 0x00, 0xA5, 0xA5, 0x5A, 0x5A, 0xAE, 0xC0, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
const POWER_BITMAP_OFFSET: usize = 0x0E;

/// Sockets 1-4.
pub const SOCKET_COUNT: u8 = 4;

fn socket_mask(socket: u8) -> Result<u8, BroadlinkError> {
    if !(1..=SOCKET_COUNT).contains(&socket) {
        return Err(BroadlinkError::InvalidArgument(format!("socket must be in 1..={SOCKET_COUNT}, got {socket}")));
    }
    Ok(0x01 << (socket - 1))
}

/// Set one socket's power state, leaving the other three untouched.
///
/// # Errors
///
/// [`BroadlinkError::InvalidArgument`] if `socket` isn't in `1..=4`.
/// Otherwise see [`Device::send_command`].
pub fn set_power(device: &mut Device, socket: u8, on: bool) -> Result<(), BroadlinkError> {
    device.require_family(Family::Mp1)?;
    let mask = socket_mask(socket)?;
    let mut payload = Vec::with_capacity(SET_POWER_HEADER.len() + 2);
    payload.extend_from_slice(&SET_POWER_HEADER);
    payload.push(mask);
    payload.push(if on { mask } else { 0x00 });
    device.send_command(GENERIC_COMMAND, &payload)?;
    Ok(())
}

/// Read the power state of all four sockets as a bitmap (bit `n` is socket
/// `n + 1`).
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn check_power(device: &mut Device) -> Result<u8, BroadlinkError> {
    device.require_family(Family::Mp1)?;
    let payload = device.send_command(GENERIC_COMMAND, &CHECK_POWER_PAYLOAD)?;
    Ok(payload.get(POWER_BITMAP_OFFSET).copied().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_mask_shifts_from_socket_one() {
        assert_eq!(socket_mask(1).unwrap(), 0x01);
        assert_eq!(socket_mask(2).unwrap(), 0x02);
        assert_eq!(socket_mask(3).unwrap(), 0x04);
        assert_eq!(socket_mask(4).unwrap(), 0x08);
    }

    #[test]
    fn socket_mask_rejects_out_of_range() {
        assert!(socket_mask(0).is_err());
        assert!(socket_mask(5).is_err());
    }
}
