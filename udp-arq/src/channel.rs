//! The unreliable datagram channel both engines run on.
//!
//! [`Datagram`] is the seam between protocol logic and I/O: the UDP
//! [`crate::socket::Socket`] implements it for real traffic and
//! [`crate::simulator::Simulator`] wraps any implementation to inject loss,
//! duplication and reordering.  The channel may drop or reorder datagrams
//! but must deliver each surviving one whole.
//!
//! Timeouts are applied here rather than by the channel, so every
//! implementation yields the same explicit [`Received`] result.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::timeout;

use crate::connection::ConnError;
use crate::packet::{MAX_DATAGRAM, Packet};

/// A bidirectional datagram channel bound to a single remote peer.
pub trait Datagram: Send + Sync {
    /// Send one datagram to the peer.
    fn send_datagram(&self, bytes: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Wait for the next datagram from the peer and copy it into `buf`,
    /// returning its length.  Datagrams longer than `buf` are truncated.
    fn recv_datagram(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// Outcome of one bounded receive attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Packet(Packet),
    TimedOut,
}

/// Encode `packet` and hand it to the channel.
pub async fn send_packet<C: Datagram>(channel: &C, packet: &Packet) -> Result<(), ConnError> {
    let bytes = packet.encode()?;
    channel.send_datagram(&bytes).await?;
    Ok(())
}

/// Wait at most `limit` for one packet.
///
/// A datagram shorter than the header is a hard [`ConnError::Packet`] error.
pub async fn recv_packet<C: Datagram>(channel: &C, limit: Duration) -> Result<Received, ConnError> {
    let mut buf = [0u8; MAX_DATAGRAM];
    match timeout(limit, channel.recv_datagram(&mut buf)).await {
        Ok(Ok(n)) => Ok(Received::Packet(Packet::decode(&buf[..n])?)),
        Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
            Ok(Received::TimedOut)
        }
        Ok(Err(e)) => Err(ConnError::Io(e)),
        Err(_elapsed) => Ok(Received::TimedOut),
    }
}
