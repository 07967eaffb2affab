//! Fault-injecting network simulator.
//!
//! Real networks drop, reorder and duplicate packets.  To exercise the
//! retransmission and reordering logic without depending on actual network
//! conditions, [`Simulator`] wraps any [`Datagram`] channel and applies a
//! configurable fault model to outbound datagrams:
//!
//! | Fault       | Description                                                |
//! |-------------|------------------------------------------------------------|
//! | Loss        | Drop a datagram with probability `loss_rate`.              |
//! | Duplication | Deliver a datagram twice with probability `duplicate_rate`.|
//! | Reordering  | Hold a datagram back with probability `reorder_rate` and   |
//! |             | release it right after the next one, so it arrives late.   |
//!
//! Receives pass straight through.  Decisions come from a seeded RNG, so a
//! given seed and traffic pattern reproduce the same faults.

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::channel::Datagram;

/// Configuration for the fault-injection model.
///
/// All probabilities are in the range `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Probability that any given datagram is silently dropped.
    pub loss_rate: f64,
    /// Probability that a surviving datagram is sent twice.
    pub duplicate_rate: f64,
    /// Probability that a surviving datagram is held back behind the next one.
    pub reorder_rate: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // No faults by default: the simulator is a transparent pass-through.
        Self {
            loss_rate: 0.0,
            duplicate_rate: 0.0,
            reorder_rate: 0.0,
            seed: 0,
        }
    }
}

/// Counters for what the simulator did to outbound traffic.
#[derive(Debug, Default)]
pub struct SimulatorStats {
    pub offered: AtomicU64,
    pub dropped: AtomicU64,
    pub duplicated: AtomicU64,
    pub reordered: AtomicU64,
}

struct FaultState {
    rng: StdRng,
    /// Datagram waiting to be released after the next send.
    held: Option<Vec<u8>>,
}

/// A [`Datagram`] wrapper that mangles outbound traffic.
pub struct Simulator<C> {
    inner: C,
    config: SimulatorConfig,
    state: Mutex<FaultState>,
    pub stats: SimulatorStats,
}

impl<C: Datagram> Simulator<C> {
    pub fn new(inner: C, config: SimulatorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            inner,
            config,
            state: Mutex::new(FaultState { rng, held: None }),
            stats: SimulatorStats::default(),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Decide the fate of one datagram; returns what to put on the wire, in order.
    fn plan(&self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.stats.offered.fetch_add(1, Ordering::Relaxed);
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if state.rng.random_bool(self.config.loss_rate) {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("[sim] drop {} bytes", bytes.len());
            return Vec::new();
        }

        let mut out = Vec::with_capacity(3);
        let released = state.held.take();

        if released.is_none() && state.rng.random_bool(self.config.reorder_rate) {
            self.stats.reordered.fetch_add(1, Ordering::Relaxed);
            log::trace!("[sim] hold back {} bytes", bytes.len());
            state.held = Some(bytes.to_vec());
            return out;
        }

        out.push(bytes.to_vec());
        if state.rng.random_bool(self.config.duplicate_rate) {
            self.stats.duplicated.fetch_add(1, Ordering::Relaxed);
            log::trace!("[sim] duplicate {} bytes", bytes.len());
            out.push(bytes.to_vec());
        }
        if let Some(late) = released {
            out.push(late);
        }
        out
    }
}

impl<C: Datagram> Datagram for Simulator<C> {
    async fn send_datagram(&self, bytes: &[u8]) -> io::Result<()> {
        for datagram in self.plan(bytes) {
            self.inner.send_datagram(&datagram).await?;
        }
        Ok(())
    }

    async fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.recv_datagram(buf).await
    }
}
