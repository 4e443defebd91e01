//! Externally maintained keyboard and joystick input.
//!
//! The host translates its own input events into logical Spectrum keys and
//! keeps an [`InputState`] up to date; the ULA port decode reads it when the
//! running program scans the keyboard matrix.
//!
//! # Half-row layout
//!
//! | Addr bit | Row | Keys (bit 0-4)       |
//! |----------|-----|----------------------|
//! | A8       | 0   | Shift, Z, X, C, V    |
//! | A9       | 1   | A, S, D, F, G        |
//! | A10      | 2   | Q, W, E, R, T        |
//! | A11      | 3   | 1, 2, 3, 4, 5        |
//! | A12      | 4   | 0, 9, 8, 7, 6        |
//! | A13      | 5   | P, O, I, U, Y        |
//! | A14      | 6   | Enter, L, K, J, H    |
//! | A15      | 7   | Space, Sym, M, N, B  |

/// Maximum number of simultaneously tracked key presses.
pub const MAX_KEYS: usize = 12;

/// Kempston joystick bit positions (active high).
pub const KEMPSTON_RIGHT: u8 = 0x01;
pub const KEMPSTON_LEFT: u8 = 0x02;
pub const KEMPSTON_DOWN: u8 = 0x04;
pub const KEMPSTON_UP: u8 = 0x08;
pub const KEMPSTON_FIRE: u8 = 0x10;

/// Logical Spectrum keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "save-state", derive(serde::Serialize, serde::Deserialize))]
pub enum Key {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    D0, D1, D2, D3, D4, D5, D6, D7, D8, D9,
    Enter,
    Space,
    /// Caps Shift.
    Shift,
    /// Symbol Shift.
    Symbol,
}

impl Key {
    /// Matrix position as `(half_row, bit)`. Row 0 is address line A8.
    #[must_use]
    pub fn matrix(self) -> (u8, u8) {
        match self {
            Key::Shift => (0, 0),
            Key::Z => (0, 1),
            Key::X => (0, 2),
            Key::C => (0, 3),
            Key::V => (0, 4),

            Key::A => (1, 0),
            Key::S => (1, 1),
            Key::D => (1, 2),
            Key::F => (1, 3),
            Key::G => (1, 4),

            Key::Q => (2, 0),
            Key::W => (2, 1),
            Key::E => (2, 2),
            Key::R => (2, 3),
            Key::T => (2, 4),

            Key::D1 => (3, 0),
            Key::D2 => (3, 1),
            Key::D3 => (3, 2),
            Key::D4 => (3, 3),
            Key::D5 => (3, 4),

            Key::D0 => (4, 0),
            Key::D9 => (4, 1),
            Key::D8 => (4, 2),
            Key::D7 => (4, 3),
            Key::D6 => (4, 4),

            Key::P => (5, 0),
            Key::O => (5, 1),
            Key::I => (5, 2),
            Key::U => (5, 3),
            Key::Y => (5, 4),

            Key::Enter => (6, 0),
            Key::L => (6, 1),
            Key::K => (6, 2),
            Key::J => (6, 3),
            Key::H => (6, 4),

            Key::Space => (7, 0),
            Key::Symbol => (7, 1),
            Key::M => (7, 2),
            Key::N => (7, 3),
            Key::B => (7, 4),
        }
    }

    /// Alphanumeric or space. These are the keys whose release clears the
    /// sticky Shift/Symbol latch.
    #[must_use]
    pub fn is_plain(self) -> bool {
        !matches!(self, Key::Shift | Key::Symbol | Key::Enter)
    }
}

/// Joystick state, mapped to the Kempston interface on port reads.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "save-state", derive(serde::Serialize, serde::Deserialize))]
pub struct JoystickState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

/// The host-maintained input set: pressed logical keys (up to 12), two
/// direct buttons that inject digits 0/1, and the joystick.
#[derive(Debug, Default)]
#[cfg_attr(feature = "save-state", derive(serde::Serialize, serde::Deserialize))]
pub struct InputState {
    pressed: Vec<Key>,
    /// Host button injecting digit 0 into the matrix.
    pub button_zero: bool,
    /// Host button injecting digit 1 into the matrix.
    pub button_one: bool,
    pub joystick: JoystickState,
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Press a key. Presses beyond [`MAX_KEYS`] are dropped.
    pub fn press(&mut self, key: Key) {
        if self.pressed.len() < MAX_KEYS && !self.pressed.contains(&key) {
            self.pressed.push(key);
        }
    }

    /// Release a key.
    pub fn release(&mut self, key: Key) {
        self.pressed.retain(|&k| k != key);
    }

    /// Release every key and button.
    pub fn release_all(&mut self) {
        self.pressed.clear();
        self.button_zero = false;
        self.button_one = false;
    }

    /// Currently pressed keys, in press order.
    #[must_use]
    pub fn pressed(&self) -> &[Key] {
        &self.pressed
    }

    /// Kempston port value: bits 0-4 = right, left, down, up, fire.
    #[must_use]
    pub fn kempston_bits(&self) -> u8 {
        let j = self.joystick;
        let mut bits = 0u8;
        if j.right {
            bits |= KEMPSTON_RIGHT;
        }
        if j.left {
            bits |= KEMPSTON_LEFT;
        }
        if j.down {
            bits |= KEMPSTON_DOWN;
        }
        if j.up {
            bits |= KEMPSTON_UP;
        }
        if j.fire {
            bits |= KEMPSTON_FIRE;
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        input.press(Key::A);
        input.press(Key::A); // duplicate ignored
        assert_eq!(input.pressed(), &[Key::A]);

        input.release(Key::A);
        assert!(input.pressed().is_empty());
    }

    #[test]
    fn press_capacity_capped() {
        let mut input = InputState::new();
        let keys = [
            Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G,
            Key::H, Key::I, Key::J, Key::K, Key::L, Key::M, Key::N,
        ];
        for k in keys {
            input.press(k);
        }
        assert_eq!(input.pressed().len(), MAX_KEYS);
    }

    #[test]
    fn kempston_encoding() {
        let mut input = InputState::new();
        input.joystick.up = true;
        input.joystick.fire = true;
        assert_eq!(input.kempston_bits(), KEMPSTON_UP | KEMPSTON_FIRE);

        input.joystick = JoystickState::default();
        assert_eq!(input.kempston_bits(), 0x00);
    }

    #[test]
    fn matrix_positions() {
        assert_eq!(Key::A.matrix(), (1, 0));
        assert_eq!(Key::D1.matrix(), (3, 0));
        assert_eq!(Key::Space.matrix(), (7, 0));
        assert_eq!(Key::Symbol.matrix(), (7, 1));
    }

    #[test]
    fn modifiers_are_not_plain() {
        assert!(!Key::Shift.is_plain());
        assert!(!Key::Symbol.is_plain());
        assert!(!Key::Enter.is_plain());
        assert!(Key::A.is_plain());
        assert!(Key::D0.is_plain());
        assert!(Key::Space.is_plain());
    }
}
