//! Receive side: batch draining and in-order acceptance.
//!
//! [`RecvEngine`] implements a go-back-N style receiver:
//!
//! - Datagrams are collected in batches of up to `recv_window` attempts.
//! - Each batch is sorted by sequence number and only the **contiguous
//!   prefix** starting at `rcv_nxt` is accepted.  The first gap ends the
//!   batch; everything after it is discarded and left for retransmission.
//! - Stale duplicates (seq < `rcv_nxt`) are skipped.
//! - After every batch the engine sends a **cumulative ACK** carrying
//!   `rcv_nxt`.

use std::collections::VecDeque;

use crate::channel::{Datagram, Received, recv_packet, send_packet};
use crate::config::Config;
use crate::connection::ConnError;
use crate::packet::Packet;
use crate::seq::{seq_lt, seq_offset};

/// Inbound half of a connection.
#[derive(Debug)]
pub struct RecvEngine {
    /// Next expected stream offset (`RCV.NXT`).
    ///
    /// Advances by `data.len()` each time an in-order packet is accepted.
    rcv_nxt: u32,

    /// Accepted bytes not yet handed to the application.
    app_buffer: VecDeque<u8>,

    config: Config,
}

impl RecvEngine {
    pub fn new(config: Config) -> Self {
        Self {
            rcv_nxt: config.initial_seq,
            app_buffer: VecDeque::new(),
            config,
        }
    }

    /// Cumulative ACK number to advertise (`RCV.NXT`).
    pub fn ack_number(&self) -> u32 {
        self.rcv_nxt
    }

    /// Bytes accepted by an earlier call but not yet returned.
    pub fn buffered(&self) -> usize {
        self.app_buffer.len()
    }

    /// Accept the contiguous prefix of `packets` and return its data.
    ///
    /// Packets are sorted by sequence number first, so arrival order within
    /// a batch does not matter.
    pub fn accept_batch(&mut self, mut packets: Vec<Packet>) -> Vec<u8> {
        let base = self.rcv_nxt;
        packets.sort_by_key(|p| seq_offset(base, p.header.seq));

        let mut data = Vec::new();
        for packet in packets {
            if packet.is_pure_ack() {
                continue;
            }
            let seq = packet.header.seq;
            if seq_lt(seq, self.rcv_nxt) {
                log::trace!("[arq:recv] stale seq={seq} (rcv_nxt={})", self.rcv_nxt);
                continue;
            }
            if seq != self.rcv_nxt {
                log::debug!("[arq:recv] gap at {} (next seq={seq}); dropping rest of batch", self.rcv_nxt);
                break;
            }
            self.rcv_nxt = self.rcv_nxt.wrapping_add(packet.data.len() as u32);
            data.extend_from_slice(&packet.data);
        }
        data
    }

    /// Make `recv_window` bounded receive attempts and accept what arrived.
    ///
    /// Timeouts contribute nothing and are not retried within the batch.
    pub async fn drain_batch<C: Datagram>(&mut self, channel: &C) -> Result<Vec<u8>, ConnError> {
        let mut packets = Vec::with_capacity(self.config.recv_window);
        for _ in 0..self.config.recv_window {
            if let Received::Packet(packet) = recv_packet(channel, self.config.recv_timeout).await? {
                packets.push(packet);
            }
        }
        let received = packets.len();
        let data = self.accept_batch(packets);
        if received > 0 {
            log::debug!(
                "[arq:recv] ← batch of {received} packet(s), accepted {} byte(s); rcv_nxt={}",
                data.len(),
                self.rcv_nxt
            );
        }
        Ok(data)
    }

    /// Block until `n` in-order bytes are available and return exactly `n`.
    ///
    /// Bytes accepted beyond `n` are kept for the next call.  There is no
    /// deadline: if the peer never advances the stream this never returns.
    pub async fn recv<C: Datagram>(&mut self, channel: &C, n: usize) -> Result<Vec<u8>, ConnError> {
        while self.app_buffer.len() < n {
            let data = self.drain_batch(channel).await?;
            self.app_buffer.extend(data);
            send_packet(channel, &Packet::ack(self.rcv_nxt)).await?;
            log::trace!("[arq:recv] → ACK ack={}", self.rcv_nxt);
        }
        Ok(self.app_buffer.drain(..n).collect())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
