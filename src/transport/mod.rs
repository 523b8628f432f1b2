//! Tokio-based UDP transport and the reliable frame layer.
//!
//! `datagram` and `encapsulated_packet` build and parse the bytes that
//! travel inside UDP payloads. `DatagramTransport` is the seam the
//! session drives: one send or one receive at a time. `UdpTransport` is
//! the real implementation over a tokio `UdpSocket`.

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::protocol::constants::RECV_BUFFER_SIZE;

pub mod datagram;
pub mod encapsulated_packet;

pub use datagram::{build_ack, build_frame, extract_payload};

/// A datagram pipe to a single remote peer.
///
/// The session owns its transport; dropping it closes the socket.
pub trait DatagramTransport {
    /// Address of the remote peer.
    fn peer_addr(&self) -> SocketAddr;

    /// Send one datagram to the peer.
    fn send(&mut self, buf: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Wait for the next datagram from the peer and copy it into `buf`.
    fn recv(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// UDP socket bound to an ephemeral local port, talking to one server.
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Binds a socket for talking to `peer`, with the receive buffer
    /// enlarged so bursts from the server are not dropped.
    pub async fn bind(peer: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(peer), Type::DGRAM, Some(Protocol::UDP))?;
        if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
            tracing::warn!(error = %e, size = RECV_BUFFER_SIZE, "could not enlarge receive buffer");
        }

        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        socket.bind(&local.into())?;
        socket.set_nonblocking(true)?;

        let socket = UdpSocket::from_std(socket.into())?;
        tracing::debug!(local = ?socket.local_addr().ok(), peer = %peer, "udp transport bound");
        Ok(Self { socket, peer })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramTransport for UdpTransport {
    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.socket.send_to(buf, self.peer).await?;
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.socket.recv_from(buf).await {
                Ok((len, from)) if from == self.peer => return Ok(len),
                Ok((len, from)) => {
                    tracing::debug!(from = %from, len, "dropping datagram from unknown peer");
                }
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                    // Windows ICMP port unreachable - ignore
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
