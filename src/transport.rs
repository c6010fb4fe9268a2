//! UDP broadcast transport (spec.md §4.F/§6/§9).
//!
//! A thin wrapper around a broadcast-capable datagram socket: bind,
//! configure `SO_REUSEADDR`/`SO_BROADCAST`, send to the directed broadcast
//! address, and read back raw datagrams with their sender address so the
//! sync loop's first line of echo defense (comparing to our own bound
//! address) has something to compare against. What gets sent and how
//! incoming bytes are interpreted belongs to [`crate::sync`]; this module
//! never touches a `Worldview`.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::TransportError;

const BROADCAST_ADDR: &str = "255.255.255.255";
/// Comfortably above spec.md §6's ~2 KB expected maximum datagram size.
pub const RECV_BUFFER_SIZE: usize = 8192;

pub struct UdpBroadcastTransport {
    socket: UdpSocket,
    port: u16,
}

impl UdpBroadcastTransport {
    pub fn bind(port: u16) -> Result<Self, TransportError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|source| TransportError::Bind { port, source })?;

        socket
            .set_reuse_address(true)
            .map_err(|source| TransportError::Bind { port, source })?;
        socket
            .set_broadcast(true)
            .map_err(|source| TransportError::Bind { port, source })?;

        let addr: SocketAddr = format!("0.0.0.0:{port}")
            .parse()
            .expect("well-formed bind address");
        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::Bind { port, source })?;

        let socket: UdpSocket = socket.into();

        Ok(UdpBroadcastTransport { socket, port })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    pub fn send_broadcast(&self, payload: &[u8]) -> Result<(), TransportError> {
        let dest = format!("{BROADCAST_ADDR}:{}", self.port);
        self.socket
            .send_to(payload, dest)
            .map(|_| ())
            .map_err(TransportError::Send)
    }

    /// Blocks until a datagram arrives (or the read timeout elapses).
    /// Returns the datagram bytes and the sender address; echoes from our
    /// own bound address are NOT filtered here — that is the sync loop's
    /// job, since it also needs the `local_id` fallback check.
    pub fn recv(&self) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let (n, src) = self.socket.recv_from(&mut buf).map_err(TransportError::Recv)?;
        buf.truncate(n);
        Ok((buf, src))
    }
}
