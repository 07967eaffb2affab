//! UDP implementation of [`Datagram`].
//!
//! [`Socket`] is a thin wrapper around `tokio::net::UdpSocket` that talks to
//! one fixed peer.  It stays unconnected so ICMP errors from a peer that has
//! already gone away do not surface as receive failures; datagrams from any
//! other address are silently skipped.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::channel::Datagram;

#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after the OS assigns a port).
    pub local_addr: SocketAddr,
    peer: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr` that exchanges datagrams with `peer`.
    ///
    /// Passing port 0 lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr, peer: SocketAddr) -> io::Result<Self> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        log::info!("[socket] bound {local_addr} (peer {peer})");
        Ok(Self {
            local_addr,
            peer,
            inner,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Point the socket at a different peer, e.g. once the other side's
    /// ephemeral port is known.
    pub fn set_peer(&mut self, peer: SocketAddr) {
        self.peer = peer;
    }
}

impl Datagram for Socket {
    async fn send_datagram(&self, bytes: &[u8]) -> io::Result<()> {
        self.inner.send_to(bytes, self.peer).await?;
        Ok(())
    }

    async fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let (n, addr) = self.inner.recv_from(buf).await?;
            if addr == self.peer {
                return Ok(n);
            }
            log::debug!("[socket] dropping {n}-byte datagram from stranger {addr}");
        }
    }
}
