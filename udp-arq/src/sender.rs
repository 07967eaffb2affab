//! Send side: the sliding window and the retransmission loop.
//!
//! [`SendWindow`] is pure state: a bounded FIFO of in-flight [`Segment`]s
//! ordered by stream offset (front = oldest).  [`SendEngine`] owns the
//! outbound stream counter and drives a window over a [`Datagram`] channel.
//!
//! # Protocol contract
//!
//! - At most `send_window` segments are in flight at once.
//! - ACKs are **cumulative**: `ack = K` means the peer holds every byte
//!   before offset `K`.
//! - Only an ACK strictly ahead of `next_seq` moves the window.  ACKs at or
//!   behind it never shrink the window.
//! - A timeout retransmits the **whole** window.
//!
//! ```text
//!  next_seq                 window right edge
//!      │                           │
//!  ────┼───────────────────────────┼──────────────▶ stream offset
//!      │ <──── in flight ─────────▶│ <── segmenter ──▶
//! ```

use std::collections::VecDeque;

use crate::channel::{Datagram, Received, recv_packet, send_packet};
use crate::config::Config;
use crate::connection::ConnError;
use crate::packet::Packet;
use crate::segment::{Segment, Segmenter};
use crate::seq::{seq_le, seq_lt};

// ---------------------------------------------------------------------------
// SendWindow
// ---------------------------------------------------------------------------

/// Bounded queue of segments that have been (or are about to be) transmitted
/// but not yet acknowledged.
#[derive(Debug)]
pub struct SendWindow<'a> {
    capacity: usize,
    segments: VecDeque<Segment<'a>>,
}

impl<'a> SendWindow<'a> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "send window must hold at least one segment");
        Self {
            capacity,
            segments: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.segments.len() >= self.capacity
    }

    /// Append a segment at the back.  Returns it back if the window is full.
    pub fn push_back(&mut self, segment: Segment<'a>) -> Result<(), Segment<'a>> {
        if self.is_full() {
            return Err(segment);
        }
        self.segments.push_back(segment);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<Segment<'a>> {
        self.segments.pop_front()
    }

    /// Top the window up from `source`.  Returns how many segments were added.
    pub fn fill(&mut self, source: &mut Segmenter<'a>) -> usize {
        let mut added = 0;
        while !self.is_full() {
            let Ok(segment) = source.next_segment() else {
                break;
            };
            self.segments.push_back(segment);
            added += 1;
        }
        added
    }

    /// Stream offset one past the newest segment, if any.
    pub fn right_edge(&self) -> Option<u32> {
        self.segments.back().map(|s| s.right)
    }

    /// Drop every segment fully covered by the cumulative `ack`.
    ///
    /// Returns the number of segments removed.
    pub fn acknowledge(&mut self, ack: u32) -> usize {
        let mut acked = 0;
        while let Some(front) = self.segments.front() {
            if seq_le(front.right, ack) {
                self.segments.pop_front();
                acked += 1;
            } else {
                break;
            }
        }
        acked
    }

    /// In-flight segments from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Segment<'a>> {
        self.segments.iter()
    }
}

// ---------------------------------------------------------------------------
// SendEngine
// ---------------------------------------------------------------------------

/// Outbound half of a connection.
#[derive(Debug)]
pub struct SendEngine {
    /// Offset of the first byte not yet acknowledged by the peer.
    next_seq: u32,
    config: Config,
}

/// What the engine should do with one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckOutcome {
    /// The peer is alive but has not moved past `next_seq`.
    Stalled,
    /// Window slid; `added` fresh segments were admitted.
    Advanced { added: usize },
    /// Behind `next_seq` or past anything we sent.
    Ignored,
}

impl SendEngine {
    pub fn new(config: Config) -> Self {
        Self {
            next_seq: config.initial_seq,
            config,
        }
    }

    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Reliably deliver `buf`, returning `buf.len()` once every byte is
    /// acknowledged.
    ///
    /// Each round transmits the window, then makes up to `config.retries`
    /// receive attempts.  A timeout retransmits the window; a round made of
    /// nothing but timeouts abandons the transfer with
    /// [`ConnError::RetriesExhausted`], reporting how many bytes of `buf`
    /// the peer did confirm.
    pub async fn send<C: Datagram>(&mut self, channel: &C, buf: &[u8]) -> Result<usize, ConnError> {
        let start = self.next_seq;
        let mut source = Segmenter::new(buf, start, self.config.data_capacity());
        let mut window = SendWindow::new(self.config.send_window);
        window.fill(&mut source);

        while !window.is_empty() {
            self.transmit(channel, self.packets(window.iter())).await?;

            let mut failures = 0u32;
            for _ in 0..self.config.retries {
                let packet = match recv_packet(channel, self.config.recv_timeout).await? {
                    Received::Packet(packet) => packet,
                    Received::TimedOut => {
                        failures += 1;
                        log::debug!(
                            "[arq:send] timeout {failures}/{}; retransmitting {} segment(s)",
                            self.config.retries,
                            window.len()
                        );
                        self.transmit(channel, self.packets(window.iter())).await?;
                        continue;
                    }
                };

                match self.on_ack(&mut window, &mut source, packet.header.ack) {
                    AckOutcome::Stalled => break,
                    AckOutcome::Advanced { added } => {
                        if window.is_empty() {
                            break;
                        }
                        let already_sent = window.len() - added;
                        self.transmit(channel, self.packets(window.iter().skip(already_sent))).await?;
                    }
                    AckOutcome::Ignored => {}
                }
            }

            if failures == self.config.retries {
                let acknowledged = self.next_seq.wrapping_sub(start) as usize;
                log::warn!(
                    "[arq:send] giving up after {failures} consecutive timeouts; {acknowledged}/{} bytes acknowledged",
                    buf.len()
                );
                return Err(ConnError::RetriesExhausted {
                    acknowledged,
                    requested: buf.len(),
                });
            }
        }

        Ok(buf.len())
    }

    /// Apply one cumulative ACK to the window.
    fn on_ack<'a>(
        &mut self,
        window: &mut SendWindow<'a>,
        source: &mut Segmenter<'a>,
        ack: u32,
    ) -> AckOutcome {
        if ack == self.next_seq {
            log::debug!("[arq:send] ← ACK ack={ack} (stalled)");
            return AckOutcome::Stalled;
        }
        let in_range = window
            .right_edge()
            .is_some_and(|edge| seq_lt(self.next_seq, ack) && seq_le(ack, edge));
        if !in_range {
            log::debug!("[arq:send] ← ACK ack={ack} ignored (next_seq={})", self.next_seq);
            return AckOutcome::Ignored;
        }

        let slid = window.acknowledge(ack);
        let added = window.fill(source);
        self.next_seq = ack;
        log::debug!(
            "[arq:send] ← ACK ack={ack} slid={slid} admitted={added} in_flight={}",
            window.len()
        );
        AckOutcome::Advanced { added }
    }

    /// Build the DATA packets for `segments`, stamped with the current ACK.
    fn packets<'w, 'd: 'w>(&self, segments: impl Iterator<Item = &'w Segment<'d>>) -> Vec<Packet> {
        segments
            .map(|s| Packet::data(s.left, self.next_seq, s.data))
            .collect()
    }

    async fn transmit<C: Datagram>(&self, channel: &C, packets: Vec<Packet>) -> Result<(), ConnError> {
        for packet in &packets {
            send_packet(channel, packet).await?;
            log::trace!("[arq:send] → DATA seq={} len={}", packet.header.seq, packet.data.len());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
