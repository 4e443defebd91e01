//! Snapshot format detection and loading policy.
//!
//! Two families: SNA (fixed 49,179-byte 48K images) and .Z80 (v1 with a
//! non-zero PC field, v2/v3 with PC = 0 and an extended header). Decoding
//! is best-effort by default — real-world snapshots are full of
//! inconsistencies and the machine must stay continuable — with a strict
//! policy available that surfaces typed errors instead.

use thiserror::Error;

/// Exact size of a 48K SNA image: 27-byte header + 49,152 bytes of RAM.
pub const SNA_SIZE: usize = 49_179;

/// Snapshot families, distinguished before loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Sna,
    Z80,
}

/// Pick the loader for a byte image. SNA has no signature; its fixed size
/// is the discriminator.
#[must_use]
pub fn detect(data: &[u8]) -> SnapshotKind {
    if data.len() == SNA_SIZE {
        SnapshotKind::Sna
    } else {
        SnapshotKind::Z80
    }
}

/// How forgiving the loaders are about malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Leniency {
    /// Best-effort: truncated bodies stop at the buffer end, out-of-range
    /// values are clamped, nothing past the header is fatal.
    #[default]
    Permissive,
    /// Surface typed errors for truncated or inconsistent images.
    Strict,
}

/// Typed snapshot failures. None of these leave the machine in an
/// inconsistent state; a reset-and-retry is always possible.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot too short: {len} bytes")]
    TooShort { len: usize },

    #[error("SNA image must be {SNA_SIZE} bytes, got {len}")]
    SnaSize { len: usize },

    #[error("SNA stack pointer {sp:#06x} points into ROM")]
    StackInRom { sp: u16 },

    #[error("memory block for page {page} is truncated")]
    TruncatedPage { page: u8 },
}

/// Byte at `index`, 0 when past the end. The permissive loaders read
/// header fields through this so truncated images degrade instead of
/// panicking.
#[inline]
pub(crate) fn byte(data: &[u8], index: usize) -> u8 {
    data.get(index).copied().unwrap_or(0)
}

/// Little-endian word at `index`, zero-padded past the end.
#[inline]
pub(crate) fn word(data: &[u8], index: usize) -> u16 {
    u16::from(byte(data, index)) | (u16::from(byte(data, index + 1)) << 8)
}
