//! ZX Spectrum colour tables.
//!
//! The renderer emits packed 4-bit palette indices (`bright << 3 | colour`);
//! these tables give hosts the RGB values behind them, plus the border
//! colours the ULA drives directly.

/// Border colours as RGB triples, indexed by the low 3 bits of port $FE.
///
/// The white entry is deliberately dimmed to near-black grey, carried over
/// from the reference machine's display tuning.
pub const BORDER_COLORS: [[u8; 3]; 8] = [
    [0x00, 0x00, 0x00], // Black
    [0x00, 0x00, 0xD8], // Blue
    [0xD8, 0x00, 0x00], // Red
    [0xD8, 0x00, 0xD8], // Magenta
    [0x00, 0xD8, 0x00], // Green
    [0x00, 0xD8, 0xD8], // Cyan
    [0xD8, 0xD8, 0x00], // Yellow
    [0x02, 0x02, 0x02], // White
];

/// ARGB32 palette for the 16 packed indices (8 normal + 8 bright).
///
/// Bright black is the same as normal black.
pub const PALETTE: [u32; 16] = [
    // Normal (bright = 0)
    0xFF00_0000, // 0: Black
    0xFF00_00D8, // 1: Blue
    0xFFD8_0000, // 2: Red
    0xFFD8_00D8, // 3: Magenta
    0xFF00_D800, // 4: Green
    0xFF00_D8D8, // 5: Cyan
    0xFFD8_D800, // 6: Yellow
    0xFFD8_D8D8, // 7: White
    // Bright (bright = 1)
    0xFF00_0000, // 8: Black (same)
    0xFF00_00FF, // 9: Bright Blue
    0xFFFF_0000, // 10: Bright Red
    0xFFFF_00FF, // 11: Bright Magenta
    0xFF00_FF00, // 12: Bright Green
    0xFF00_FFFF, // 13: Bright Cyan
    0xFFFF_FF00, // 14: Bright Yellow
    0xFFFF_FFFF, // 15: Bright White
];
