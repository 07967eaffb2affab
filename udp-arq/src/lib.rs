//! `udp-arq`: a small reliable byte stream over an unreliable datagram channel.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────┐   DATA seq=left   ┌────────────┐
//!  │ SendEngine │──────────────────▶│ RecvEngine │
//!  └─────┬──────┘                   └─────┬──────┘
//!        │        ACK ack=rcv_nxt         │
//!        │◀───────────────────────────────┘
//!        │
//!  ┌─────▼─────────────────────────────┐
//!  │            Connection             │
//!  │  (owns both engines + channel)    │
//!  └─────┬─────────────────────────────┘
//!        │ raw datagrams (Datagram trait)
//!  ┌─────▼─────┐      ┌───────────┐
//!  │  Socket   │  or  │ Simulator │ (fault-injecting wrapper)
//!  └───────────┘      └───────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]      : wire format (8-byte header + data)
//! - [`segment`]     : splitting a buffer into offset-tagged segments
//! - [`sender`]      : bounded send window and retransmission loop
//! - [`receiver`]    : batch draining and in-order acceptance
//! - [`connection`]  : owns the channel and both engines; error type
//! - [`channel`]     : the datagram channel trait and bounded receive
//! - [`socket`]      : UDP implementation of the channel
//! - [`simulator`]   : seeded loss/duplication/reorder wrapper
//! - [`config`]      : window sizes, retry budget, timeouts
//! - [`seq`]         : wrap-around offset comparisons

pub mod channel;
pub mod config;
pub mod connection;
pub mod packet;
pub mod receiver;
pub mod segment;
pub mod sender;
pub mod seq;
pub mod simulator;
pub mod socket;

pub use channel::{Datagram, Received};
pub use config::Config;
pub use connection::{ConnError, Connection};
pub use packet::{Header, Packet};
pub use socket::Socket;
