//! Discovery probe (48-byte request) and response parsing.
//!
//! Discovery is unauthenticated and unencrypted - a bare broadcast (or
//! unicast, for [`crate::header::Opcode::Hello`]) UDP datagram. The request
//! carries the caller's local IP/port and wall-clock so responding devices
//! can log a readable timestamp; this crate has no I/O and no time source of
//! its own, so callers supply the clock fields explicitly.

use std::net::Ipv4Addr;

use broadlink_crypto::checksum;

/// Size of the discovery probe, in bytes.
pub const DISCOVERY_FRAME_SIZE: usize = 0x30;

/// Minimum size of a discovery response this module can parse (through the
/// MAC field at 0x3A-0x3F).
pub const DISCOVERY_RESPONSE_MIN_SIZE: usize = 0x40;

/// Offset of `is_locked` in a discovery response, if present.
const IS_LOCKED_OFFSET: usize = 0x7F;

/// Wall-clock fields embedded in a discovery probe. Broadlink firmware uses
/// these only for its own logging; no caller-observable behavior depends on
/// them being accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryClock {
    /// Offset from UTC, in seconds (matching the sign convention of
    /// `libc::timezone`: positive west of Greenwich).
    pub gmt_offset_seconds: i32,
    /// Full year, e.g. 2026.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// ISO weekday, 1 (Monday) through 7 (Sunday).
    pub weekday: u8,
}

/// Build the 48-byte discovery probe.
///
/// `local_ip` and `source_port` are written so the responding device can
/// target its unicast reply; `clock` fills the firmware's informational
/// timestamp fields.
#[must_use]
pub fn build_probe(clock: &DiscoveryClock, local_ip: Ipv4Addr, source_port: u16) -> [u8; DISCOVERY_FRAME_SIZE] {
    let mut buf = [0u8; DISCOVERY_FRAME_SIZE];

    buf[0x08..0x0C].copy_from_slice(&clock.gmt_offset_seconds.to_le_bytes());
    buf[0x0C..0x0E].copy_from_slice(&clock.year.to_le_bytes());
    buf[0x0E] = clock.minute;
    buf[0x0F] = clock.hour;
    #[allow(clippy::cast_possible_truncation)]
    let sub_year = (clock.year % 100) as u8;
    buf[0x10] = sub_year;
    buf[0x11] = clock.weekday;
    buf[0x12] = clock.day;
    buf[0x13] = clock.month;

    let octets = local_ip.octets();
    buf[0x18] = octets[3];
    buf[0x19] = octets[2];
    buf[0x1A] = octets[1];
    buf[0x1B] = octets[0];
    buf[0x1C..0x1E].copy_from_slice(&source_port.to_le_bytes());

    buf[0x26] = 0x06;

    buf[0x20..0x22].copy_from_slice(&[0, 0]);
    let sum = checksum(&buf);
    buf[0x20..0x22].copy_from_slice(&sum.to_le_bytes());

    buf
}

/// Fields recovered from a unicast or broadcast discovery response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResponse {
    /// 16-bit device-model code.
    pub device_type: u16,
    /// Device MAC as transmitted on the wire (reverse for canonical
    /// display: see [`Self::mac_canonical`]).
    pub mac: [u8; 6],
    /// Device-reported name, if the response carried one.
    pub name: Option<String>,
    /// `true` if the device reports itself as locked (won't accept new
    /// pairing/provisioning).
    pub is_locked: bool,
}

impl DiscoveryResponse {
    /// Parse a discovery response datagram.
    ///
    /// Returns `None` if `bytes` is shorter than
    /// [`DISCOVERY_RESPONSE_MIN_SIZE`]; this module does not treat a short
    /// discovery reply as a hard protocol error, since an unrelated
    /// broadcast reply on the same port is a normal occurrence.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DISCOVERY_RESPONSE_MIN_SIZE {
            return None;
        }

        let device_type = u16::from_le_bytes([bytes[0x34], bytes[0x35]]);
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[0x3A..0x40]);

        let name = bytes.get(0x40..).map(|tail| {
            let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
            String::from_utf8_lossy(&tail[..end]).into_owned()
        });
        let name = name.filter(|n| !n.is_empty());

        let is_locked = bytes.get(IS_LOCKED_OFFSET).is_some_and(|&b| b != 0);

        Some(Self { device_type, mac, name, is_locked })
    }

    /// MAC address in canonical (human-display) byte order: the reverse of
    /// the wire order.
    #[must_use]
    pub fn mac_canonical(&self) -> [u8; 6] {
        let mut reversed = self.mac;
        reversed.reverse();
        reversed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clock() -> DiscoveryClock {
        DiscoveryClock { gmt_offset_seconds: -3600, year: 2026, month: 7, day: 27, hour: 14, minute: 30, weekday: 1 }
    }

    #[test]
    fn probe_has_expected_size_and_marker_byte() {
        let probe = build_probe(&sample_clock(), Ipv4Addr::new(192, 168, 1, 42), 12345);
        assert_eq!(probe.len(), DISCOVERY_FRAME_SIZE);
        assert_eq!(probe[0x26], 0x06);
    }

    #[test]
    fn probe_encodes_local_ip_reversed() {
        let probe = build_probe(&sample_clock(), Ipv4Addr::new(192, 168, 1, 42), 12345);
        assert_eq!(&probe[0x18..0x1C], &[42, 1, 168, 192]);
    }

    #[test]
    fn probe_encodes_source_port() {
        let probe = build_probe(&sample_clock(), Ipv4Addr::new(10, 0, 0, 1), 0x1234);
        assert_eq!(&probe[0x1C..0x1E], &0x1234u16.to_le_bytes());
    }

    #[test]
    fn probe_checksum_matches_standalone_computation() {
        let probe = build_probe(&sample_clock(), Ipv4Addr::new(10, 0, 0, 1), 80);
        let mut zeroed = probe;
        zeroed[0x20..0x22].copy_from_slice(&[0, 0]);
        let expected = checksum(&zeroed);
        assert_eq!(u16::from_le_bytes([probe[0x20], probe[0x21]]), expected);
    }

    #[test]
    fn scenario_f_discovery_parse() {
        // spec.md Scenario F: device_type 0x2712 at 0x34-0x35, MAC
        // 01 02 03 04 05 06 at 0x3A-0x3F, canonical display 06:05:04:03:02:01.
        let mut bytes = vec![0u8; DISCOVERY_RESPONSE_MIN_SIZE];
        bytes[0x34..0x36].copy_from_slice(&0x2712u16.to_le_bytes());
        bytes[0x3A..0x40].copy_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);

        let response = DiscoveryResponse::parse(&bytes).unwrap();
        assert_eq!(response.device_type, 0x2712);
        assert_eq!(response.mac_canonical(), [0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn parses_name_and_lock_flag() {
        let mut bytes = vec![0u8; 0x80];
        bytes[0x40..0x44].copy_from_slice(b"rm2\0");
        bytes[IS_LOCKED_OFFSET] = 1;

        let response = DiscoveryResponse::parse(&bytes).unwrap();
        assert_eq!(response.name.as_deref(), Some("rm2"));
        assert!(response.is_locked);
    }

    #[test]
    fn rejects_short_response() {
        assert!(DiscoveryResponse::parse(&[0u8; 10]).is_none());
    }
}
