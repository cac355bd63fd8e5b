//! Byte-slice utilities for bounds-oriented parsing.
//!
//! Replay data is held in memory as a single `&[u8]`, so every reader here works on slices at
//! fixed offsets and reports failure through `Option`. Callers map `None` to their own error
//! (or skip the record, for the heuristic scanners).
//!
//! All numeric reads are **little-endian**.

use byteorder::{ByteOrder, LittleEndian};
use memchr::memmem;

/// Read `N` raw bytes at `offset`.
///
/// Returns `None` if the range is out of bounds.
pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    let bytes: [u8; N] = buf.get(offset..end)?.try_into().ok()?;
    Some(bytes)
}

/// Read a single byte at `offset`.
pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Read a `u16` (little-endian) at `offset`.
pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    Some(LittleEndian::read_u16(&read_array::<2>(buf, offset)?))
}

/// Read a `u32` (little-endian) at `offset`.
pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    Some(LittleEndian::read_u32(&read_array::<4>(buf, offset)?))
}

/// Borrow `len` bytes at `offset`.
pub(crate) fn slice(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    buf.get(offset..offset.checked_add(len)?)
}

/// Absolute position of the first occurrence of `needle` at or after `from`.
pub(crate) fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let tail = haystack.get(from..)?;
    memmem::find(tail, needle).map(|pos| from + pos)
}
