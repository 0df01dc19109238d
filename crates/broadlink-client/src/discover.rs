//! Discovery (`discover`/`xdiscover`/`hello`) and Wi-Fi provisioning
//! (`setup`).

use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use broadlink_core::{BroadlinkError, family_for};
use broadlink_proto::{DiscoveryClock, DiscoveryResponse, SecurityMode, build_probe, build_provisioning_frame};
use chrono::{Datelike, Local, Offset, Timelike};

use crate::{
    device::Device,
    transport::{BroadcastSocket, Transport},
};

/// Device UDP port.
pub const DEVICE_PORT: u16 = 80;

/// Options controlling a discovery sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoverOptions {
    /// How long to collect broadcast responses before returning.
    pub timeout: Duration,
    /// Local interface address to bind and to encode into the probe.
    pub local_ip: Ipv4Addr,
    /// Destination address for the broadcast probe.
    pub broadcast_ip: Ipv4Addr,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(5), local_ip: Ipv4Addr::UNSPECIFIED, broadcast_ip: Ipv4Addr::BROADCAST }
    }
}

fn now_clock() -> DiscoveryClock {
    let now = Local::now();
    DiscoveryClock {
        gmt_offset_seconds: now.offset().fix().local_minus_utc(),
        year: u16::try_from(now.year()).unwrap_or(0),
        month: u8::try_from(now.month()).unwrap_or(1),
        day: u8::try_from(now.day()).unwrap_or(1),
        hour: u8::try_from(now.hour()).unwrap_or(0),
        minute: u8::try_from(now.minute()).unwrap_or(0),
        weekday: u8::try_from(now.weekday().number_from_monday()).unwrap_or(1),
    }
}

fn handle_from_response(response: &DiscoveryResponse, addr: SocketAddr, local_ip: Ipv4Addr) -> Device {
    let local_mac = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
    Device::new(
        addr,
        response.mac,
        response.device_type,
        family_for(response.device_type),
        response.name.clone(),
        local_mac,
        local_ip,
        response.is_locked,
    )
}

/// Broadcast the discovery probe and collect every response received before
/// `opts.timeout` elapses.
///
/// # Errors
///
/// Only on a local socket failure (bind/send); a discovery sweep with zero
/// replies is not an error, per §7's "partial results are non-fatal" policy
/// - it simply returns an empty vector.
pub fn discover(opts: DiscoverOptions) -> Result<Vec<Device>, BroadlinkError> {
    Ok(xdiscover(opts)?.collect())
}

/// Incremental variant of [`discover`]: returns an iterator that yields each
/// handle as its response arrives, rather than accumulating them all before
/// returning.
///
/// # Errors
///
/// Only on a local socket failure (bind/send).
pub fn xdiscover(opts: DiscoverOptions) -> Result<impl Iterator<Item = Device>, BroadlinkError> {
    let socket = BroadcastSocket::bind(opts.local_ip).map_err(io_to_timeout)?;
    let source_port = socket.local_port().map_err(io_to_timeout)?;
    let probe = build_probe(&now_clock(), opts.local_ip, source_port);

    socket
        .send_to(&probe, SocketAddr::from((opts.broadcast_ip, DEVICE_PORT)))
        .map_err(io_to_timeout)?;

    let local_ip = opts.local_ip;
    Ok(socket.responses(opts.timeout).filter_map(move |(bytes, addr)| {
        let response = DiscoveryResponse::parse(&bytes)?;
        tracing::debug!(%addr, device_type = response.device_type, "discovery response");
        Some(handle_from_response(&response, addr, local_ip))
    }))
}

/// Unicast discovery: probe one address directly and parse its single
/// response. Useful for devices that don't answer broadcast discovery while
/// locked.
///
/// # Errors
///
/// [`BroadlinkError::NetworkTimeout`] if no response arrives within
/// `timeout`.
pub fn hello(ip: Ipv4Addr, local_ip: Ipv4Addr, timeout: Duration) -> Result<Device, BroadlinkError> {
    let socket = BroadcastSocket::bind(local_ip).map_err(io_to_timeout)?;
    let source_port = socket.local_port().map_err(io_to_timeout)?;
    let probe = build_probe(&now_clock(), local_ip, source_port);

    socket.send_to(&probe, SocketAddr::from((ip, DEVICE_PORT))).map_err(io_to_timeout)?;

    socket
        .responses(timeout)
        .find_map(|(bytes, addr)| {
            DiscoveryResponse::parse(&bytes).map(|response| handle_from_response(&response, addr, local_ip))
        })
        .ok_or(BroadlinkError::NetworkTimeout { after: timeout, retries: 0 })
}

/// Broadcast Wi-Fi provisioning parameters. No response is expected; a
/// device in AP-setup mode reboots onto the configured network.
///
/// # Errors
///
/// [`BroadlinkError::InvalidArgument`] if `ssid`/`password` exceed their
/// wire-format capacity.
pub fn setup(ssid: &str, password: &str, security_mode: SecurityMode) -> Result<(), BroadlinkError> {
    let frame = build_provisioning_frame(ssid, password, security_mode)
        .map_err(|err| BroadlinkError::InvalidArgument(err.to_string()))?;

    let socket = BroadcastSocket::bind(Ipv4Addr::UNSPECIFIED).map_err(io_to_timeout)?;
    socket
        .send_to(&frame, SocketAddr::from((Ipv4Addr::BROADCAST, DEVICE_PORT)))
        .map_err(io_to_timeout)?;
    Ok(())
}

/// Open a unicast [`Transport`] to `device`'s host address.
pub(crate) fn connect_transport(addr: SocketAddr) -> Result<Transport, BroadlinkError> {
    Transport::connect(addr).map_err(io_to_timeout)
}

fn io_to_timeout(err: std::io::Error) -> BroadlinkError {
    tracing::warn!(%err, "local socket error");
    BroadlinkError::NetworkTimeout { after: Duration::from_secs(0), retries: 0 }
}
