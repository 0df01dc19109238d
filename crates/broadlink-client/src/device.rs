//! `Device`: a handle to one physical Broadlink device.
//!
//! Owns the lazily-opened unicast [`Transport`] and, once authenticated, the
//! [`Session`] that encrypts/decrypts every subsequent command. Family
//! modules (`rm`, `sp1`, ...) drive a `Device` through [`Device::send_command`]
//! rather than touching the session or transport directly.

use std::net::{Ipv4Addr, SocketAddr};

use broadlink_core::{BroadlinkError, Family, Session};
use bytes::Bytes;

use crate::{discover, transport::Transport};

/// A handle to one physical device, as returned by discovery or `hello`.
pub struct Device {
    /// Device's (IP, port) - normally port 80.
    pub host: SocketAddr,
    /// Device-assigned MAC, wire byte order (reverse of canonical display).
    pub mac: [u8; 6],
    /// 16-bit device-model code.
    pub device_type: u16,
    /// Family this device_type resolved to.
    pub family: Family,
    /// Device-reported name, if discovery/hello returned one.
    pub name: Option<String>,
    /// Caller-chosen local MAC transmitted on the wire.
    pub local_mac: [u8; 6],
    /// Local interface address used for framing.
    pub local_ip: Ipv4Addr,
    /// Discovery's locked hint.
    pub is_locked: bool,
    session: Option<Session>,
    transport: Option<Transport>,
}

impl Device {
    /// Construct a handle directly, bypassing discovery. Useful when a
    /// caller already knows a device's address and type (e.g. from static
    /// configuration).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: SocketAddr,
        mac: [u8; 6],
        device_type: u16,
        family: Family,
        name: Option<String>,
        local_mac: [u8; 6],
        local_ip: Ipv4Addr,
        is_locked: bool,
    ) -> Self {
        Self {
            host,
            mac,
            device_type,
            family,
            name,
            local_mac,
            local_ip,
            is_locked,
            session: None,
            transport: None,
        }
    }

    /// MAC address in canonical (human-display) byte order.
    #[must_use]
    pub fn mac_canonical(&self) -> [u8; 6] {
        let mut reversed = self.mac;
        reversed.reverse();
        reversed
    }

    /// `true` once [`Device::auth`] has succeeded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_authenticated)
    }

    /// Guard clause for every family module's entry points: reject a call
    /// against a handle that didn't resolve to `expected` at discovery/hello
    /// time, per the dispatch table's contract that only `auth()` is valid
    /// on an [`Family::Unsupported`] handle.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::UnsupportedDevice`] if `self.family != expected`.
    pub fn require_family(&self, expected: Family) -> Result<(), BroadlinkError> {
        if self.family == expected {
            Ok(())
        } else {
            Err(BroadlinkError::UnsupportedDevice { device_type: self.device_type })
        }
    }

    /// Run the authentication handshake, installing a fresh [`Session`].
    ///
    /// Re-running `auth()` on an already-authenticated handle is idempotent:
    /// it rotates the session key and invalidates any in-progress learning
    /// session the caller may be tracking (the device itself discards
    /// learning state across an auth rotation).
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::AuthError`] if the device rejects the handshake or
    /// returns degenerate session material. [`BroadlinkError::NetworkTimeout`]
    /// on repeated UDP timeout.
    pub fn auth(&mut self) -> Result<(), BroadlinkError> {
        let mut session = Session::new(self.local_mac);
        let identifier = device_identifier(self.mac);
        let name = self.name.clone().unwrap_or_else(|| "broadlink-rs".to_string());
        let request = session.build_auth_request(self.device_type, &identifier, &name)?;

        let transport = self.transport_mut()?;
        tracing::info!(host = %self.host, device_type = self.device_type, "authenticating");
        let response = transport.request(&request)?;

        session.complete_auth(&response)?;
        self.session = Some(session);
        Ok(())
    }

    /// Send a generic family command and return its decrypted payload.
    ///
    /// Family modules are the intended callers; `command` and `payload` are
    /// whatever that family's dialect requires.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::AuthError`] if [`Device::auth`] hasn't succeeded
    /// yet. Otherwise whatever [`Session::decode_response`] and the
    /// transport surface: [`BroadlinkError::NotReady`],
    /// [`BroadlinkError::DeviceError`], [`BroadlinkError::NetworkTimeout`].
    pub fn send_command(&mut self, command: u16, payload: &[u8]) -> Result<Bytes, BroadlinkError> {
        let wire = {
            let session = self
                .session
                .as_mut()
                .ok_or_else(|| BroadlinkError::AuthError("auth() has not been called".to_string()))?;
            session.encode_command(self.device_type, command, payload)
        };

        let transport = self.transport_mut()?;
        let response = transport.request(&wire)?;

        #[allow(clippy::expect_used)]
        let session = self.session.as_ref().expect("invariant: session was set above");
        let frame = session.decode_response(&response)?;
        Ok(frame.payload)
    }

    fn transport_mut(&mut self) -> Result<&mut Transport, BroadlinkError> {
        if self.transport.is_none() {
            self.transport = Some(discover::connect_transport(self.host)?);
        }
        #[allow(clippy::expect_used)]
        Ok(self.transport.as_mut().expect("invariant: just inserted"))
    }
}

/// Derive a stable 15-ASCII-digit identifier from a device MAC, as the auth
/// handshake's request payload requires.
fn device_identifier(mac: [u8; 6]) -> String {
    let mut padded = [0u8; 8];
    padded[2..].copy_from_slice(&mac);
    let value = u64::from_be_bytes(padded) % 1_000_000_000_000_000;
    format!("{value:015}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_identifier_is_fifteen_ascii_digits() {
        let id = device_identifier([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(id.len(), 15);
        assert!(id.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn fresh_device_is_not_authenticated() {
        let device = Device::new(
            SocketAddr::from((Ipv4Addr::LOCALHOST, 80)),
            [0; 6],
            0x2737,
            Family::Rm,
            None,
            [0x02, 0, 0, 0, 0, 1],
            Ipv4Addr::UNSPECIFIED,
            false,
        );
        assert!(!device.is_authenticated());
    }

    fn device_with_family(family: Family) -> Device {
        Device::new(
            SocketAddr::from((Ipv4Addr::LOCALHOST, 80)),
            [0; 6],
            0x2737,
            family,
            None,
            [0x02, 0, 0, 0, 0, 1],
            Ipv4Addr::UNSPECIFIED,
            false,
        )
    }

    #[test]
    fn require_family_accepts_matching_tag() {
        let device = device_with_family(Family::Rm);
        assert!(device.require_family(Family::Rm).is_ok());
    }

    #[test]
    fn require_family_rejects_mismatched_tag() {
        let device = device_with_family(Family::Lb);
        assert!(matches!(
            device.require_family(Family::Sp1),
            Err(BroadlinkError::UnsupportedDevice { device_type: 0x2737 })
        ));
    }

    #[test]
    fn require_family_rejects_unsupported_tag() {
        let device = device_with_family(Family::Unsupported);
        assert!(matches!(device.require_family(Family::Rm), Err(BroadlinkError::UnsupportedDevice { .. })));
    }
}
