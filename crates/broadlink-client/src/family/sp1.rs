//! SP1 (first-generation smart plug) command dialect.
//!
//! SP1 predates the generic `0x006A` command and the `02 00 00 00 <state>`
//! payload shape used by every later family: power is a single byte sent
//! under its own command code, with no response to parse.

use broadlink_core::{BroadlinkError, Family};

use crate::device::Device;

/// SP1's non-standard command code (every other family uses `0x006A`).
const SP1_COMMAND: u16 = 0x0066;

/// Set the plug's power state.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn set_power(device: &mut Device, on: bool) -> Result<(), BroadlinkError> {
    device.require_family(Family::Sp1)?;
    let payload = [u8::from(on)];
    device.send_command(SP1_COMMAND, &payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use super::*;

    fn test_device() -> Device {
        Device::new(
            SocketAddr::from((Ipv4Addr::LOCALHOST, 80)),
            [0; 6],
            0x0000,
            Family::Sp1,
            None,
            [0x02, 0, 0, 0, 0, 1],
            Ipv4Addr::UNSPECIFIED,
            false,
        )
    }

    #[test]
    fn set_power_without_auth_surfaces_auth_error() {
        let mut device = test_device();
        let result = set_power(&mut device, true);
        assert!(matches!(result, Err(BroadlinkError::AuthError(_))));
    }
}
