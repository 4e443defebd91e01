//! The machine bus: memory and I/O routing for the CPU core.
//!
//! Owns the address space, ULA state, input set, AY chip and the tape
//! collaborator, and decodes every port the Spectrum responds to. Port
//! decode order on even-port reads matters and follows the hardware-proven
//! sequence: loader hooks, active tape, keyboard.

use std::collections::BTreeMap;

use zx_core::{Bus, IoBus, NoTape, TapeFeed};

use crate::ay::AyChip;
use crate::input::InputState;
use crate::memory::AddressSpace;
use crate::ula::UlaState;

/// Memory, ULA, input, sound and tape behind the CPU's bus seam.
pub struct MachineBus {
    pub mem: AddressSpace,
    pub ula: UlaState,
    pub input: InputState,
    pub ay: AyChip,
    pub tape: Box<dyn TapeFeed>,
    /// Loader-acceleration hooks: program counter → hook id, serviced by
    /// the tape collaborator on even-port reads.
    hooks: BTreeMap<u16, u32>,
    /// Address of the last M1 fetch — the machine's view of the program
    /// counter when the CPU touches a port.
    last_m1: u16,
}

impl MachineBus {
    #[must_use]
    pub fn new(rom_48k: &[u8], rom_128k: &[u8]) -> Self {
        Self {
            mem: AddressSpace::new(rom_48k, rom_128k),
            ula: UlaState::new(),
            input: InputState::new(),
            ay: AyChip::new(),
            tape: Box::new(NoTape),
            hooks: BTreeMap::new(),
            last_m1: 0,
        }
    }

    /// Replace the tape collaborator.
    pub fn set_tape(&mut self, tape: Box<dyn TapeFeed>) {
        self.tape = tape;
    }

    /// Register a loader-acceleration hook at a program-counter address.
    pub fn register_hook(&mut self, pc: u16, hook: u32) {
        self.hooks.insert(pc, hook);
    }

    /// Drop all registered hooks (machine reset).
    pub fn clear_hooks(&mut self) {
        self.hooks.clear();
    }
}

impl Bus for MachineBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem.read8(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.mem.write8(addr, value);
    }

    fn fetch(&mut self, addr: u16) -> u8 {
        self.last_m1 = addr;
        self.mem.read8(addr)
    }
}

impl IoBus for MachineBus {
    fn read_io(&mut self, port: u16) -> u8 {
        // Any even address makes the ULA respond.
        if port & 0x01 == 0 {
            if let Some(&hook) = self.hooks.get(&self.last_m1) {
                self.tape.run_hook(hook);
            }

            // During active tape replay the pulse is everything — keys and
            // joystick are not consulted.
            if self.tape.is_active() {
                return !self.tape.pulse_bit();
            }

            let mut key = self.tape.pulse_bit();
            key |= self.ula.scan_keys(port, &self.input);
            return !key;
        }

        // Kempston joystick: only A5 driven low.
        if port & 0x3F == 0x1F {
            return self.input.kempston_bits();
        }

        // AY register read shares the register-select decode.
        if port & 0xC002 == 0xC000 {
            return self.ay.read_data();
        }

        self.ula.floating_bus(&self.mem)
    }

    fn write_io(&mut self, port: u16, value: u8) {
        if port & 0x01 == 0 {
            self.ula.write_fe(value);
        }

        if self.mem.is_128k() && port & 0x8002 == 0x0000 {
            self.mem.switch_bank(value);
        }

        if port & 0xC002 == 0xC000 {
            // AY register select
            self.ay.select(value);
            self.ay.index_written = true;
        } else if port & 0xC002 == 0x8000 {
            // AY data write; the chip goes live once a select has been seen
            self.ay.write_data(value);
            if self.ay.index_written {
                self.ay.enabled = true;
            }
        }
    }
}
