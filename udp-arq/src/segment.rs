//! Splitting an outbound buffer into datagram-sized segments.
//!
//! A [`Segmenter`] walks a borrowed buffer and hands out [`Segment`]s of at
//! most `capacity` bytes, each tagged with the half-open stream range
//! `[left, right)` it covers.  Segments are produced lazily, in order, and
//! are contiguous by construction: `segments[i].right == segments[i + 1].left`.
//!
//! A segmenter cannot be rewound; build a new one to start over.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    #[error("no segments left in this buffer")]
    Exhausted,
}

/// A contiguous slice of the outbound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub data: &'a [u8],
    /// Stream offset of `data[0]`.
    pub left: u32,
    /// Stream offset one past the last byte of `data`.
    pub right: u32,
}

impl Segment<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Sequential cursor over the segments of one buffer.
#[derive(Debug)]
pub struct Segmenter<'a> {
    buffer: &'a [u8],
    start: u32,
    capacity: usize,
    /// Byte position of the next segment within `buffer`.
    cursor: usize,
}

impl<'a> Segmenter<'a> {
    /// Segment `buffer` into chunks of at most `capacity` bytes, with the
    /// first byte at stream offset `start`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(buffer: &'a [u8], start: u32, capacity: usize) -> Self {
        assert!(capacity >= 1, "segment capacity must be at least 1");
        Self {
            buffer,
            start,
            capacity,
            cursor: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.buffer.len()
    }

    /// Segments not yet handed out.
    pub fn remaining(&self) -> usize {
        (self.buffer.len() - self.cursor).div_ceil(self.capacity)
    }

    /// Advance the cursor and return the segment it passed over.
    pub fn next_segment(&mut self) -> Result<Segment<'a>, SegmentError> {
        if !self.has_more() {
            return Err(SegmentError::Exhausted);
        }
        let end = (self.cursor + self.capacity).min(self.buffer.len());
        let data = &self.buffer[self.cursor..end];
        let left = self.start.wrapping_add(self.cursor as u32);
        let right = self.start.wrapping_add(end as u32);
        self.cursor = end;
        Ok(Segment { data, left, right })
    }
}

impl<'a> Iterator for Segmenter<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_segment().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}
