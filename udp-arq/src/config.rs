//! Sizing and timing parameters shared by both engines.
//!
//! The defaults reproduce the reference sizing: a 508-byte datagram
//! (576-byte minimum reassembly buffer minus 60 bytes of IP header and 8 bytes
//! of UDP header), a send window of 3 segments, a receive batch of 5 datagrams,
//! 32 receive attempts per window round and a 1.5 ms receive timeout.

use std::time::Duration;

use thiserror::Error;

use crate::packet::{HEADER_LEN, MAX_DATAGRAM};

/// Segments allowed in flight at once.
pub const SEND_WINDOW: usize = 3;
/// Datagrams collected per receive batch.
pub const RECV_WINDOW: usize = 5;
/// Receive attempts per window round before the sender gives up.
pub const RETRIES: u32 = 32;
/// Upper bound on a single receive attempt.
pub const RECV_TIMEOUT: Duration = Duration::from_micros(1500);
/// Stream offset of the first byte in either direction.
pub const INITIAL_SEQ: u32 = 1;

/// Rejected [`Config`] values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max datagram size {0} leaves no room for data after the 8-byte header")]
    DatagramTooSmall(usize),
    #[error("max datagram size {0} exceeds the protocol limit of 508 bytes")]
    DatagramTooLarge(usize),
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Transport parameters.
///
/// Build one with [`Config::default`] and override fields as needed, then
/// call [`Config::validate`] (the [`crate::connection::Connection`]
/// constructor does this for you).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Largest datagram put on the wire, header included.
    pub max_datagram: usize,
    /// Send window size in segments.
    pub send_window: usize,
    /// Receive attempts per [`crate::receiver::RecvEngine::drain_batch`].
    pub recv_window: usize,
    /// Receive attempts per send round.
    pub retries: u32,
    /// Timeout applied to every single receive attempt.
    pub recv_timeout: Duration,
    /// Starting value of both stream counters.
    pub initial_seq: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_datagram: MAX_DATAGRAM,
            send_window: SEND_WINDOW,
            recv_window: RECV_WINDOW,
            retries: RETRIES,
            recv_timeout: RECV_TIMEOUT,
            initial_seq: INITIAL_SEQ,
        }
    }
}

impl Config {
    /// Payload bytes that fit in one datagram.
    pub fn data_capacity(&self) -> usize {
        self.max_datagram.saturating_sub(HEADER_LEN)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_datagram <= HEADER_LEN {
            return Err(ConfigError::DatagramTooSmall(self.max_datagram));
        }
        if self.max_datagram > MAX_DATAGRAM {
            return Err(ConfigError::DatagramTooLarge(self.max_datagram));
        }
        if self.send_window == 0 {
            return Err(ConfigError::Zero("send window"));
        }
        if self.recv_window == 0 {
            return Err(ConfigError::Zero("receive window"));
        }
        if self.retries == 0 {
            return Err(ConfigError::Zero("retry budget"));
        }
        if self.recv_timeout.is_zero() {
            return Err(ConfigError::Zero("receive timeout"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_sizing() {
        let cfg = Config::default();
        assert_eq!(cfg.max_datagram, 508);
        assert_eq!(cfg.data_capacity(), 500);
        assert_eq!(cfg.send_window, 3);
        assert_eq!(cfg.recv_window, 5);
        assert_eq!(cfg.retries, 32);
        assert_eq!(cfg.recv_timeout, Duration::from_micros(1500));
        assert_eq!(cfg.initial_seq, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn header_sized_datagram_rejected() {
        let cfg = Config {
            max_datagram: HEADER_LEN,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::DatagramTooSmall(HEADER_LEN)));
        assert_eq!(cfg.data_capacity(), 0);
    }

    #[test]
    fn oversized_datagram_rejected() {
        let cfg = Config {
            max_datagram: MAX_DATAGRAM + 1,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::DatagramTooLarge(_))));
    }

    #[test]
    fn zero_window_rejected() {
        let cfg = Config {
            send_window: 0,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::Zero("send window")));
    }

    #[test]
    fn zero_timeout_rejected() {
        let cfg = Config {
            recv_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::Zero("receive timeout")));
    }
}
