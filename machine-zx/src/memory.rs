//! Paged address space: 8 windows of 8KB over ROM and RAM arenas.
//!
//! The 64KB logical address space is split into eight windows. Each window
//! is a tagged reference into one of four owned arenas — the 48K ROM, the
//! 128K ROM (two 16KB halves), the flat 64KB 48K RAM image, or the eight
//! 16KB banks of 128K RAM. Bank switching re-points windows; bytes are
//! never copied between banks.
//!
//! Arenas are flat byte blocks so hosts can serialise them verbatim for
//! save states.

/// Window size in bytes (8KB).
pub const WINDOW_SIZE: usize = 0x2000;

/// Number of address windows.
pub const WINDOW_COUNT: usize = 8;

/// Which arena a window points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "save-state", derive(serde::Serialize, serde::Deserialize))]
pub enum BankKind {
    /// ROM image. Bank 0 is the 16KB 48K ROM, bank 1 the 32KB 128K ROM.
    Rom,
    /// The flat 64KB 48K RAM image.
    Ram48,
    /// One of the eight 16KB 128K RAM pages.
    Ram128,
}

/// A window's backing: arena kind, bank index, byte offset within the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "save-state", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowRef {
    pub kind: BankKind,
    pub bank: u8,
    pub offset: u32,
}

/// The machine's paged address space.
pub struct AddressSpace {
    rom_48k: Box<[u8; 0x4000]>,
    rom_128k: Box<[u8; 0x8000]>,
    ram_48k: Box<[u8; 0x1_0000]>,
    ram_128k: Box<[u8; 0x2_0000]>,
    windows: [WindowRef; WINDOW_COUNT],
    /// Last value written to the 128K paging port, including the lock bit.
    bank_latch: u8,
    mode_128k: bool,
    /// A diagnostic ROM occupies windows 0-1; bank switching leaves them alone.
    rom_resident: bool,
}

impl AddressSpace {
    /// Create a 48K-mapped address space with the given ROM images.
    ///
    /// Either ROM may be empty (the arena stays zero-filled); otherwise it
    /// must be exactly 16,384 (48K) or 32,768 (128K) bytes.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty ROM image has the wrong size.
    #[must_use]
    pub fn new(rom_48k: &[u8], rom_128k: &[u8]) -> Self {
        let mut mem = Self {
            rom_48k: Box::new([0; 0x4000]),
            rom_128k: Box::new([0; 0x8000]),
            ram_48k: Box::new([0; 0x1_0000]),
            ram_128k: Box::new([0; 0x2_0000]),
            windows: [WindowRef { kind: BankKind::Ram48, bank: 0, offset: 0 }; WINDOW_COUNT],
            bank_latch: 0,
            mode_128k: false,
            rom_resident: false,
        };
        if !rom_48k.is_empty() {
            assert!(
                rom_48k.len() == 0x4000,
                "48K ROM must be exactly 16384 bytes, got {}",
                rom_48k.len()
            );
            mem.rom_48k.copy_from_slice(rom_48k);
        }
        if !rom_128k.is_empty() {
            assert!(
                rom_128k.len() == 0x8000,
                "128K ROM must be exactly 32768 bytes, got {}",
                rom_128k.len()
            );
            mem.rom_128k.copy_from_slice(rom_128k);
        }
        mem.reset_48k();
        mem
    }

    /// Re-point one window. `offset` is relative to the selected bank.
    pub fn map_window(&mut self, index: usize, kind: BankKind, bank: u8, offset: u32) {
        self.windows[index] = WindowRef { kind, bank, offset };
    }

    /// The current backing of a window.
    #[must_use]
    pub fn window(&self, index: usize) -> WindowRef {
        self.windows[index]
    }

    /// Read a byte from the logical address space.
    #[must_use]
    pub fn read8(&self, addr: u16) -> u8 {
        let w = self.windows[usize::from(addr >> 13)];
        let at = self.arena_base(w) + usize::from(addr & 0x1FFF);
        match w.kind {
            BankKind::Rom => {
                if w.bank == 0 {
                    self.rom_48k[at]
                } else {
                    self.rom_128k[at]
                }
            }
            BankKind::Ram48 => self.ram_48k[at],
            BankKind::Ram128 => self.ram_128k[at],
        }
    }

    /// Write a byte to the logical address space. Writes to ROM-backed
    /// windows are ignored, matching hardware.
    pub fn write8(&mut self, addr: u16, value: u8) {
        let w = self.windows[usize::from(addr >> 13)];
        let at = self.arena_base(w) + usize::from(addr & 0x1FFF);
        match w.kind {
            BankKind::Rom => {}
            BankKind::Ram48 => self.ram_48k[at] = value,
            BankKind::Ram128 => self.ram_128k[at] = value,
        }
    }

    fn arena_base(&self, w: WindowRef) -> usize {
        let bank_base = match w.kind {
            BankKind::Rom | BankKind::Ram48 => 0,
            BankKind::Ram128 => usize::from(w.bank) * 0x4000,
        };
        bank_base + w.offset as usize
    }

    /// Handle a write to the 128K paging port.
    ///
    /// No-op once the lock bit (bit 5) has been latched. Otherwise windows
    /// 6-7 select RAM page `value & 7`, windows 0-1 select the ROM half
    /// from bit 4 (unless a diagnostic ROM is resident), and `value`
    /// becomes the new latch.
    pub fn switch_bank(&mut self, value: u8) {
        if self.bank_latch & 0x20 != 0 {
            return;
        }

        if !self.rom_resident {
            let half = if value & 0x10 != 0 { 0x4000 } else { 0 };
            self.map_window(0, BankKind::Rom, 1, half);
            self.map_window(1, BankKind::Rom, 1, half + 0x2000);
        }

        let page = value & 0x07;
        self.map_window(6, BankKind::Ram128, page, 0);
        self.map_window(7, BankKind::Ram128, page, 0x2000);

        self.bank_latch = value;
    }

    /// Last value written to the paging port (including the lock bit).
    #[must_use]
    pub fn bank_latch(&self) -> u8 {
        self.bank_latch
    }

    #[must_use]
    pub fn is_128k(&self) -> bool {
        self.mode_128k
    }

    /// Map the 48K layout: ROM in windows 0-1, the flat RAM image behind
    /// windows 2-7 at their natural offsets. Clears the paging latch and
    /// leaves 48K mode active.
    pub fn reset_48k(&mut self) {
        self.mode_128k = false;
        self.rom_resident = false;
        self.bank_latch = 0;
        self.map_window(0, BankKind::Rom, 0, 0);
        self.map_window(1, BankKind::Rom, 0, 0x2000);
        for i in 2..WINDOW_COUNT {
            self.map_window(i, BankKind::Ram48, 0, (i * WINDOW_SIZE) as u32);
        }
    }

    /// Enter 128K mode with the standard layout: 128K ROM half 0 in
    /// windows 0-1, bank 5 at $4000, bank 2 at $8000, bank 0 at $C000.
    pub fn enter_128k(&mut self) {
        self.mode_128k = true;
        self.bank_latch = 0;
        self.map_window(0, BankKind::Rom, 1, 0);
        self.map_window(1, BankKind::Rom, 1, 0x2000);
        self.map_128k_banks();
    }

    /// Map the fixed 128K RAM banks (5 at $4000, 2 at $8000, 0 at $C000)
    /// without touching windows 0-1. Used when a diagnostic ROM must stay
    /// resident in the low windows.
    pub fn map_128k_banks(&mut self) {
        self.mode_128k = true;
        self.map_window(2, BankKind::Ram128, 5, 0);
        self.map_window(3, BankKind::Ram128, 5, 0x2000);
        self.map_window(4, BankKind::Ram128, 2, 0);
        self.map_window(5, BankKind::Ram128, 2, 0x2000);
        self.map_window(6, BankKind::Ram128, 0, 0);
        self.map_window(7, BankKind::Ram128, 0, 0x2000);
    }

    /// Install a diagnostic ROM image at the bottom of the flat RAM image
    /// and pin windows 0-1 to it. Bank switching will no longer re-point
    /// the low windows.
    pub fn load_diagnostic(&mut self, image: &[u8]) {
        let len = image.len().min(self.ram_48k.len());
        self.ram_48k[..len].copy_from_slice(&image[..len]);
        self.map_window(0, BankKind::Ram48, 0, 0);
        self.map_window(1, BankKind::Ram48, 0, 0x2000);
        self.rom_resident = true;
    }

    /// Copy bytes into the flat 48K RAM image starting at a logical
    /// address. Data running past the top of memory is clamped.
    pub fn load_flat(&mut self, addr: u16, data: &[u8]) {
        let start = usize::from(addr);
        let len = data.len().min(self.ram_48k.len() - start);
        self.ram_48k[start..start + len].copy_from_slice(&data[..len]);
    }

    /// One 16KB page of 128K RAM, for snapshot loading.
    pub fn ram_bank_mut(&mut self, bank: usize) -> &mut [u8] {
        &mut self.ram_128k[bank * 0x4000..(bank + 1) * 0x4000]
    }

    /// The active screen memory (bitmap + attributes, 6912 bytes).
    ///
    /// 48K: the flat image at $4000. 128K: bank 5, or bank 7 when the
    /// shadow-screen bit (latch bit 3) is set.
    #[must_use]
    pub fn screen_slice(&self) -> &[u8] {
        if self.mode_128k {
            let bank = if self.bank_latch & 0x08 != 0 { 7 } else { 5 };
            &self.ram_128k[bank * 0x4000..bank * 0x4000 + 0x1B00]
        } else {
            &self.ram_48k[0x4000..0x5B00]
        }
    }

    /// The flat 48K RAM image, for host save states.
    #[must_use]
    pub fn ram_48k_image(&self) -> &[u8] {
        &self.ram_48k[..]
    }

    /// The 128K RAM pages as one flat block, for host save states.
    #[must_use]
    pub fn ram_128k_image(&self) -> &[u8] {
        &self.ram_128k[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_mem() -> AddressSpace {
        let mut rom = vec![0u8; 0x4000];
        rom[0] = 0xF3; // DI
        rom[0x3FFF] = 0x42;
        let mut rom128 = vec![0u8; 0x8000];
        rom128[0] = 0xAA; // half 0 first byte
        rom128[0x4000] = 0xBB; // half 1 first byte
        AddressSpace::new(&rom, &rom128)
    }

    #[test]
    fn read_rom() {
        let mem = make_mem();
        assert_eq!(mem.read8(0x0000), 0xF3);
        assert_eq!(mem.read8(0x3FFF), 0x42);
    }

    #[test]
    fn rom_writes_ignored() {
        let mut mem = make_mem();
        mem.write8(0x0000, 0x00);
        assert_eq!(mem.read8(0x0000), 0xF3);
    }

    #[test]
    fn ram_read_write() {
        let mut mem = make_mem();
        mem.write8(0x4000, 0xAB);
        assert_eq!(mem.read8(0x4000), 0xAB);
        mem.write8(0xFFFF, 0xCD);
        assert_eq!(mem.read8(0xFFFF), 0xCD);
    }

    #[test]
    fn windows_cover_flat_ram_at_natural_offsets() {
        let mem = make_mem();
        for i in 2..WINDOW_COUNT {
            let w = mem.window(i);
            assert_eq!(w.kind, BankKind::Ram48);
            assert_eq!(w.offset as usize, i * WINDOW_SIZE);
        }
    }

    #[test]
    fn rom_half_switching_128k() {
        let mut mem = make_mem();
        mem.enter_128k();
        assert_eq!(mem.read8(0x0000), 0xAA);

        mem.switch_bank(0x10);
        assert_eq!(mem.read8(0x0000), 0xBB);

        mem.switch_bank(0x00);
        assert_eq!(mem.read8(0x0000), 0xAA);
    }

    #[test]
    fn bank_switching_repoints_upper_windows() {
        let mut mem = make_mem();
        mem.enter_128k();

        mem.write8(0xC000, 0x11); // bank 0
        mem.switch_bank(0x03);
        assert_eq!(mem.read8(0xC000), 0x00); // bank 3 is fresh
        mem.write8(0xC000, 0x33);

        mem.switch_bank(0x00);
        assert_eq!(mem.read8(0xC000), 0x11); // bank 0 preserved
    }

    #[test]
    fn fixed_banks_unaffected_by_switching() {
        let mut mem = make_mem();
        mem.enter_128k();
        mem.write8(0x4000, 0x55); // bank 5
        mem.write8(0x8000, 0x22); // bank 2

        mem.switch_bank(0x07);
        assert_eq!(mem.read8(0x4000), 0x55);
        assert_eq!(mem.read8(0x8000), 0x22);
    }

    #[test]
    fn lock_bit_freezes_latch_and_windows() {
        let mut mem = make_mem();
        mem.enter_128k();

        mem.switch_bank(0x03);
        mem.write8(0xC000, 0x33);

        // Lock (bit 5 set)
        mem.switch_bank(0x23);
        let latch = mem.bank_latch();
        let w6 = mem.window(6);
        let w7 = mem.window(7);

        mem.switch_bank(0x00);
        assert_eq!(mem.bank_latch(), latch);
        assert_eq!(mem.window(6), w6);
        assert_eq!(mem.window(7), w7);
        assert_eq!(mem.read8(0xC000), 0x33, "bank 3 still mapped");
    }

    #[test]
    fn diagnostic_rom_pins_low_windows() {
        let mut mem = make_mem();
        mem.load_diagnostic(&[0xC9; 0x100]); // RET fill
        assert_eq!(mem.read8(0x0000), 0xC9);

        mem.map_128k_banks();
        mem.switch_bank(0x10); // would select ROM half 1
        assert_eq!(mem.read8(0x0000), 0xC9, "diagnostic ROM stays mapped");
    }

    #[test]
    fn shadow_screen_follows_latch_bit_3() {
        let mut mem = make_mem();
        mem.enter_128k();

        mem.write8(0x4000, 0x55); // bank 5 first screen byte
        mem.ram_bank_mut(7)[0] = 0x77;

        assert_eq!(mem.screen_slice()[0], 0x55);
        mem.switch_bank(0x08);
        assert_eq!(mem.screen_slice()[0], 0x77);
    }

    #[test]
    fn screen_slice_48k() {
        let mut mem = make_mem();
        mem.write8(0x4000, 0x3C);
        mem.write8(0x5800, 0x47); // first attribute byte
        let screen = mem.screen_slice();
        assert_eq!(screen[0], 0x3C);
        assert_eq!(screen[0x1800], 0x47);
    }

    #[test]
    fn load_flat_clamps_at_top_of_memory() {
        let mut mem = make_mem();
        mem.load_flat(0xFFF0, &[0xEE; 0x40]);
        assert_eq!(mem.read8(0xFFFF), 0xEE);
    }

    #[test]
    #[should_panic(expected = "48K ROM must be exactly 16384 bytes")]
    fn wrong_rom_size_panics() {
        let _ = AddressSpace::new(&[0; 1024], &[]);
    }
}
