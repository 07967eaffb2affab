//! Per-connection lifecycle.
//!
//! A [`Connection`] owns one [`Datagram`] channel plus the two engines that
//! run on it:
//! - [`SendEngine`] for outbound data (`next_send_seq`),
//! - [`RecvEngine`] for inbound data (`next_expected_seq`).
//!
//! There is no handshake: both counters start at `config.initial_seq` and
//! the connection is usable as soon as it is constructed.  [`Connection::close`]
//! only releases the channel; nothing tells the peer.  Dropping the
//! connection releases it just the same, on every exit path.
//!
//! ```ignore
//! let socket = Socket::bind(local, peer).await?;
//! let mut conn = Connection::new(socket, Config::default())?;
//! conn.send(b"hello").await?;
//! let reply = conn.recv(5).await?;
//! conn.close();
//! ```

use thiserror::Error;

use crate::channel::Datagram;
use crate::config::{Config, ConfigError};
use crate::packet::PacketError;
use crate::receiver::RecvEngine;
use crate::sender::SendEngine;

/// Errors surfaced by [`Connection`] and the engines.
#[derive(Debug, Error)]
pub enum ConnError {
    /// The channel failed (unreachable peer, closed socket, ...).
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A datagram could not be parsed; the channel is expected to deliver
    /// whole datagrams, so this is fatal.
    #[error("malformed datagram: {0}")]
    Packet(#[from] PacketError),
    /// The send loop hit a round of nothing but timeouts.
    #[error("retries exhausted: peer acknowledged {acknowledged} of {requested} bytes")]
    RetriesExhausted { acknowledged: usize, requested: usize },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A reliable byte stream over an unreliable datagram channel.
#[derive(Debug)]
pub struct Connection<C> {
    channel: C,
    sender: SendEngine,
    receiver: RecvEngine,
}

impl<C: Datagram> Connection<C> {
    /// Take ownership of `channel` and set up both engines.
    pub fn new(channel: C, config: Config) -> Result<Self, ConnError> {
        config.validate()?;
        Ok(Self {
            channel,
            sender: SendEngine::new(config.clone()),
            receiver: RecvEngine::new(config),
        })
    }

    /// Reliably deliver `data`; see [`SendEngine::send`].
    ///
    /// Returns `data.len()` when every byte was acknowledged, or
    /// [`ConnError::RetriesExhausted`] with the confirmed byte count.
    pub async fn send(&mut self, data: &[u8]) -> Result<usize, ConnError> {
        self.sender.send(&self.channel, data).await
    }

    /// Receive exactly `n` bytes; see [`RecvEngine::recv`].
    pub async fn recv(&mut self, n: usize) -> Result<Vec<u8>, ConnError> {
        self.receiver.recv(&self.channel, n).await
    }

    /// Next outbound stream offset not yet acknowledged.
    pub fn next_send_seq(&self) -> u32 {
        self.sender.next_seq()
    }

    /// Next inbound stream offset expected from the peer.
    pub fn next_expected_seq(&self) -> u32 {
        self.receiver.ack_number()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Release the channel and hand it back to the caller.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Release the channel.  No FIN is exchanged.
    pub fn close(self) {
        log::info!(
            "[arq] closing; sent up to {}, received up to {}",
            self.sender.next_seq(),
            self.receiver.ack_number()
        );
        drop(self.channel);
    }
}
