//! Synchronous UDP transport: unicast request/retry and broadcast discovery.
//!
//! One in-flight request per handle is enforced by the borrow checker, not a
//! runtime lock: [`Transport::request`] takes `&mut self`, so a caller
//! sharing a handle across threads needs its own synchronization - the same
//! contract the teacher's connection-oriented transports enforce with a
//! single-writer channel.

use std::{
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

use broadlink_core::BroadlinkError;

/// Default per-attempt receive timeout for a unicast request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after the first attempt times out.
pub const DEFAULT_RETRIES: u32 = 2;

/// A bound UDP socket used for unicast request/response with a single
/// device.
pub struct Transport {
    socket: UdpSocket,
    target: SocketAddr,
    timeout: Duration,
    retries: u32,
}

impl Transport {
    /// Bind an ephemeral local socket and configure it to talk to `target`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`std::io::Error`] wrapped in
    /// [`BroadlinkError::NetworkTimeout`] only at request time; bind/connect
    /// failures here propagate as a plain I/O error via `?` at the call
    /// site, since they indicate a local configuration problem rather than
    /// a network condition.
    pub fn connect(target: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind((std::net::Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(target)?;
        Ok(Self { socket, target, timeout: DEFAULT_TIMEOUT, retries: DEFAULT_RETRIES })
    }

    /// Override the per-attempt timeout and retry count.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if `timeout` is zero - a zero
    /// duration makes `set_read_timeout` reject it on every platform, so a
    /// request would never get a chance to receive a reply.
    pub fn with_timeout(mut self, timeout: Duration, retries: u32) -> Result<Self, BroadlinkError> {
        if timeout.is_zero() {
            return Err(BroadlinkError::InvalidArgument("timeout must be non-zero".to_string()));
        }
        self.timeout = timeout;
        self.retries = retries;
        Ok(self)
    }

    /// Address this transport sends to.
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send `request` and wait for exactly one reply datagram, retrying up
    /// to `self.retries` times on timeout.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::NetworkTimeout`] if every attempt times out.
    /// [`BroadlinkError::Io`] if a local socket call or a non-timeout
    /// `recv` error occurs - these are not retried, since the condition
    /// (e.g. ICMP port-unreachable) won't clear by itself.
    pub fn request(&mut self, request: &[u8]) -> Result<Vec<u8>, BroadlinkError> {
        let mut buf = [0u8; 2048];

        for attempt in 0..=self.retries {
            tracing::debug!(target = %self.target, attempt, "sending request");
            self.socket.send(request).map_err(io_err)?;
            self.socket.set_read_timeout(Some(self.timeout)).map_err(io_err)?;
            match self.socket.recv(&mut buf) {
                Ok(len) => return Ok(buf[..len].to_vec()),
                Err(err) if is_timeout(&err) => {
                    tracing::debug!(attempt, "request timed out, retrying");
                    continue;
                },
                Err(err) => {
                    tracing::warn!(%err, "request failed");
                    return Err(io_err(err));
                },
            }
        }

        Err(BroadlinkError::NetworkTimeout { after: self.timeout, retries: self.retries })
    }
}

fn io_err(err: std::io::Error) -> BroadlinkError {
    BroadlinkError::Io(err.to_string())
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_timeout_rejects_zero_duration() {
        let transport = Transport::connect(SocketAddr::from(([127, 0, 0, 1], 80))).unwrap();
        assert!(matches!(
            transport.with_timeout(Duration::ZERO, 2),
            Err(BroadlinkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn with_timeout_accepts_positive_duration() {
        let transport = Transport::connect(SocketAddr::from(([127, 0, 0, 1], 80))).unwrap();
        let transport = transport.with_timeout(Duration::from_secs(1), 5).unwrap();
        assert_eq!(transport.timeout, Duration::from_secs(1));
        assert_eq!(transport.retries, 5);
    }
}

/// A transient broadcast socket used only for discovery and provisioning.
pub struct BroadcastSocket {
    socket: UdpSocket,
}

impl BroadcastSocket {
    /// Bind `local_ip` to an ephemeral port and enable broadcast.
    pub fn bind(local_ip: std::net::Ipv4Addr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind((local_ip, 0))?;
        socket.set_broadcast(true)?;
        Ok(Self { socket })
    }

    /// The local port this socket is bound to - needed to fill the
    /// discovery probe's source-port field.
    pub fn local_port(&self) -> std::io::Result<u16> {
        Ok(self.socket.local_addr()?.port())
    }

    /// Send `datagram` to `target` (typically a broadcast or unicast
    /// address on port 80).
    pub fn send_to(&self, datagram: &[u8], target: SocketAddr) -> std::io::Result<()> {
        self.socket.send_to(datagram, target)?;
        Ok(())
    }

    /// Consume this socket into an iterator over responses, yielding each
    /// datagram as soon as it arrives rather than blocking until `timeout`
    /// elapses before returning anything.
    #[must_use]
    pub fn responses(self, timeout: Duration) -> Responses {
        Responses { socket: self.socket, deadline: std::time::Instant::now() + timeout }
    }
}

/// Iterator over broadcast/unicast discovery responses. Each call to
/// `next()` blocks for at most the time remaining before the overall
/// deadline, so a caller sees devices one at a time as they answer rather
/// than after the whole window has elapsed.
pub struct Responses {
    socket: UdpSocket,
    deadline: std::time::Instant,
}

impl Iterator for Responses {
    type Item = (Vec<u8>, SocketAddr);

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            return None;
        }
        if let Err(err) = self.socket.set_read_timeout(Some(remaining)) {
            tracing::warn!(%err, "failed to set discovery socket timeout");
            return None;
        }

        let mut buf = [0u8; 2048];
        match self.socket.recv_from(&mut buf) {
            Ok((len, from)) => Some((buf[..len].to_vec(), from)),
            Err(err) if is_timeout(&err) => None,
            Err(err) => {
                tracing::warn!(%err, "discovery socket error");
                None
            },
        }
    }
}
