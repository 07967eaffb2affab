//! Wrap-around comparisons for 32-bit stream offsets.
//!
//! Offsets advance with `wrapping_add`, so plain `<` breaks once a stream
//! passes 4 GiB.  Two offsets compare correctly as long as they are less than
//! `u32::MAX / 2` apart, which always holds for windows of a few segments.

/// `a < b` in wrap-around space.
#[inline]
pub fn seq_lt(a: u32, b: u32) -> bool {
    a != b && seq_le(a, b)
}

/// `a <= b` in wrap-around space.
#[inline]
pub fn seq_le(a: u32, b: u32) -> bool {
    b.wrapping_sub(a) <= (u32::MAX / 2)
}

/// Signed distance from `base` to `seq`; negative when `seq` is behind.
#[inline]
pub fn seq_offset(base: u32, seq: u32) -> i32 {
    seq.wrapping_sub(base) as i32
}
