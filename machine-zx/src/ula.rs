//! ULA state and port-decode helpers.
//!
//! The ULA is modelled purely as port-decode logic plus the handful of
//! registers real software can observe: the last port $FE write (border,
//! MIC, beeper), the flash phase, the scanline position, and the
//! floating-bus cursor. The actual port routing lives in the machine bus;
//! this module supplies the keyboard matrix composition and the
//! floating-bus read it builds on.

use crate::input::{InputState, Key};
use crate::memory::AddressSpace;
use crate::palette::BORDER_COLORS;

/// Sticky modifier latched across key-repeat frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "save-state", derive(serde::Serialize, serde::Deserialize))]
pub enum StickyKey {
    #[default]
    None,
    Shift,
    Symbol,
}

/// Observable ULA state.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "save-state", derive(serde::Serialize, serde::Deserialize))]
pub struct UlaState {
    /// Last value written to port $FE: border 0-2, MIC bit 3, beeper bit 4.
    pub port_fe: u8,
    /// Border RGB for the host's palette slot, updated on border change.
    pub border_rgb: [u8; 3],
    /// Flash phase; attribute bit 7 swaps ink/paper while set.
    pub flash_phase: bool,
    flash_timer: u8,
    /// Current scanline, 0..312 (0..311 in 128K mode).
    pub current_line: u16,
    /// True from the moment a visible line was drawn until the end of that
    /// line; gates the floating-bus quirk.
    pub screen_rendering: bool,
    /// Rotating 0-31 horizontal cursor for the floating-bus read.
    float_cursor: u8,
    sticky: StickyKey,
    plain_key_seen: bool,
}

impl UlaState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current border colour (0-7).
    #[must_use]
    pub fn border(&self) -> u8 {
        self.port_fe & 0x07
    }

    /// Beeper output bit (port $FE bit 4).
    #[must_use]
    pub fn beeper_bit(&self) -> bool {
        self.port_fe & 0x10 != 0
    }

    /// Handle a write to an even port: border and beeper latch. The border
    /// palette slot is refreshed only when the colour actually changes.
    pub fn write_fe(&mut self, value: u8) {
        if self.port_fe & 0x07 != value & 0x07 {
            self.border_rgb = BORDER_COLORS[usize::from(value & 0x07)];
        }
        self.port_fe = value;
    }

    /// Advance the flash clock by one frame. The phase toggles every 16
    /// frames, matching the real ULA.
    pub fn tick_flash(&mut self) {
        self.flash_timer += 1;
        if self.flash_timer & 0x10 != 0 {
            self.flash_timer = 0;
            self.flash_phase = !self.flash_phase;
        }
    }

    /// True on every other frame; reduced-redraw hosts skip these.
    #[must_use]
    pub fn odd_frame(&self) -> bool {
        self.flash_timer & 1 != 0
    }

    /// Compose the keyboard half of an even-port read.
    ///
    /// Returns positive-logic bits (the caller inverts the final result).
    /// Each half-row selected by a low address line contributes the keys
    /// pressed in it; the two direct host buttons inject digits 1 and 0;
    /// a latched Shift/Symbol keeps its bit asserted until a plain
    /// (alphanumeric or space) key is seen released.
    pub fn scan_keys(&mut self, port: u16, input: &InputState) -> u8 {
        let inv = !port;
        let mut key = 0u8;

        // At least one pass so buttons and the sticky latch are always seen.
        let passes = input.pressed().len().max(1);
        for slot in 0..passes {
            let pressed = input.pressed().get(slot).copied();

            if inv & 0x0800 != 0 && input.button_one {
                key |= 0x01; // '1' in the 12345 row
            }
            if inv & 0x1000 != 0 && input.button_zero {
                key |= 0x01; // '0' in the 09876 row
            }

            match self.sticky {
                StickyKey::Shift if inv & 0x0100 != 0 => key |= 0x01,
                StickyKey::Symbol if inv & 0x8000 != 0 => key |= 0x02,
                _ => {}
            }

            if let Some(k) = pressed {
                let (row, bit) = k.matrix();
                if inv & (0x0100 << row) != 0 {
                    key |= 1 << bit;
                }
                match k {
                    Key::Shift => self.sticky = StickyKey::Shift,
                    Key::Symbol => self.sticky = StickyKey::Symbol,
                    _ => {}
                }
            }

            // The latch clears once a plain key has been pressed and released.
            if pressed.is_some_and(Key::is_plain) {
                self.plain_key_seen = true;
            } else if self.plain_key_seen {
                self.sticky = StickyKey::None;
                self.plain_key_seen = false;
            }
        }

        key
    }

    /// Floating-bus read: the attribute byte under the ULA's current fetch
    /// position while a visible line is being drawn, 0xFF when idle.
    ///
    /// The horizontal position is approximated by a rotating 0-31 cursor,
    /// close enough for the titles that poll this quirk mid-scanline.
    pub fn floating_bus(&mut self, mem: &AddressSpace) -> u8 {
        if !self.screen_rendering {
            return 0xFF;
        }

        let row = usize::from(self.current_line.saturating_sub(64)) / 8;
        let index = 0x1800 + row * 32 + usize::from(self.float_cursor);
        self.float_cursor = (self.float_cursor + 1) & 0x1F;

        mem.screen_slice().get(index).copied().unwrap_or(0xFF)
    }
}
