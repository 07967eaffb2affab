//! Wire-format definitions for protocol datagrams.
//!
//! Every datagram exchanged between peers is a [`Packet`]: a fixed 8-byte
//! [`Header`] followed by up to [`DATA_CAPACITY`] payload bytes.  No I/O
//! happens here.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Acknowledgment Number                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Data (0..=500) ...                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Both numbers are byte offsets into the logical stream, never packet
//! counts.  There is no length field: the payload is whatever follows the
//! header in the datagram.

use thiserror::Error;

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 8;

/// Largest datagram the protocol emits: 576 - 60 (IP) - 8 (UDP).
pub const MAX_DATAGRAM: usize = 508;

/// Payload bytes that fit after the header in a [`MAX_DATAGRAM`]-sized datagram.
pub const DATA_CAPACITY: usize = MAX_DATAGRAM - HEADER_LEN;

const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 4;

/// Errors that can arise when encoding or parsing a datagram.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    #[error("datagram of {0} bytes is shorter than the 8-byte header")]
    Truncated(usize),
    /// Header plus data would not fit in one datagram.
    #[error("packet of {0} bytes exceeds the 508-byte datagram limit")]
    Oversized(usize),
}

/// Fixed-size protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Stream offset of the first payload byte (0 in pure acknowledgments).
    pub seq: u32,
    /// Next stream offset the sender of this packet expects (cumulative).
    pub ack: u32,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seq.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.ack.to_be_bytes());
        buf
    }

    /// Parse the first [`HEADER_LEN`] bytes of `buf`; trailing bytes are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        let Some(raw) = buf.first_chunk::<HEADER_LEN>() else {
            return Err(PacketError::Truncated(buf.len()));
        };
        let [s0, s1, s2, s3, a0, a1, a2, a3] = *raw;
        Ok(Self {
            seq: u32::from_be_bytes([s0, s1, s2, s3]),
            ack: u32::from_be_bytes([a0, a1, a2, a3]),
        })
    }
}

/// A complete protocol datagram: header + data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub data: Vec<u8>,
}

impl Packet {
    /// A data-carrying packet.
    pub fn data(seq: u32, ack: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            header: Header { seq, ack },
            data: data.into(),
        }
    }

    /// A pure acknowledgment: empty data, zero sequence field.
    pub fn ack(ack: u32) -> Self {
        Self {
            header: Header { seq: 0, ack },
            data: Vec::new(),
        }
    }

    pub fn is_pure_ack(&self) -> bool {
        self.data.is_empty()
    }

    /// Total on-wire length.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.data.len()
    }

    /// Serialise into `header ++ data`.
    ///
    /// Returns [`PacketError::Oversized`] when the result would exceed
    /// [`MAX_DATAGRAM`].
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let len = self.wire_len();
        if len > MAX_DATAGRAM {
            return Err(PacketError::Oversized(len));
        }
        let mut buf = Vec::with_capacity(len);
        buf.extend_from_slice(&self.header.encode());
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }

    /// Split `buf` into header (first 8 bytes) and data (the rest).
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        let header = Header::decode(buf)?;
        Ok(Self {
            header,
            data: buf[HEADER_LEN..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip_extremes() {
        for (seq, ack) in [
            (0, 0),
            (1, 1),
            (u32::MAX, 0),
            (0, u32::MAX),
            (u32::MAX, u32::MAX),
            (0x8000_0000, 0x7fff_ffff),
        ] {
            let h = Header { seq, ack };
            assert_eq!(Header::decode(&h.encode()).unwrap(), h);
        }
    }

    #[test]
    fn seq_ack_big_endian_on_wire() {
        let bytes = Header {
            seq: 0x0102_0304,
            ack: 0x0506_0708,
        }
        .encode();
        assert_eq!(bytes, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn decode_short_header_returns_error() {
        assert_eq!(Header::decode(&[0u8; 7]), Err(PacketError::Truncated(7)));
        assert_eq!(Packet::decode(&[]), Err(PacketError::Truncated(0)));
    }

    #[test]
    fn packet_splits_header_from_data() {
        let pkt = Packet::data(501, 1, b"hello".to_vec());
        let bytes = pkt.encode().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 5);
        assert_eq!(&bytes[HEADER_LEN..], b"hello");

        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, pkt);
        assert!(!decoded.is_pure_ack());
    }

    #[test]
    fn pure_ack_is_header_only() {
        let bytes = Packet::ack(1201).encode().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN);

        let decoded = Packet::decode(&bytes).unwrap();
        assert!(decoded.is_pure_ack());
        assert_eq!(decoded.header.seq, 0);
        assert_eq!(decoded.header.ack, 1201);
    }

    #[test]
    fn full_capacity_packet_fits() {
        let pkt = Packet::data(1, 1, vec![0xab; DATA_CAPACITY]);
        assert_eq!(pkt.encode().unwrap().len(), MAX_DATAGRAM);
    }

    #[test]
    fn oversized_packet_rejected() {
        let pkt = Packet::data(1, 1, vec![0; DATA_CAPACITY + 1]);
        assert_eq!(pkt.encode(), Err(PacketError::Oversized(MAX_DATAGRAM + 1)));
    }
}
