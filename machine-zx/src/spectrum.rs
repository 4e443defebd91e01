//! The assembled machine and its scanline-synchronous scheduler.
//!
//! `run_scanline` is the single driving loop: each call executes exactly
//! one scanline's worth of CPU time, interleaves audio sampling, renders
//! the line if it falls in the visible band, and raises the frame
//! interrupt on the last line. Callers may stop driving it between calls
//! without corrupting anything — the scanline is the atomic resumption
//! unit.
//!
//! # Cycle budgets
//!
//! |                  | 48K      | 128K     |
//! |------------------|----------|----------|
//! | tape active      | 224      | 228      |
//! | normal, 3 splits | 64/64/96 | 66/66/96 |
//! | lines per frame  | 312      | 311      |
//!
//! The three-way split exists only to interleave beeper sampling; the
//! deficit from each sub-budget carries into the next so the line total
//! stays exact.

use zx_core::{CpuCore, Interrupt, TapeFeed};

use crate::audio::{AudioPull, Mixer};
use crate::bus::MachineBus;
use crate::config::{MachineConfig, MachineModel};
use crate::snapshot::{self, Leniency, SnapshotError, SnapshotKind};
use crate::video::ScreenBuffer;
use crate::{sna, video, z80};

/// What a `run_scanline` call concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameProgress {
    /// More scanlines remain in this frame.
    InProgress,
    /// The frame interrupt fired and the line counter wrapped.
    FrameComplete,
}

/// A ZX Spectrum 48K/128K, generic over the externally supplied CPU core.
pub struct ZxSpectrum<C: CpuCore<MachineBus>> {
    cpu: C,
    bus: MachineBus,
    mixer: Mixer,
    audio_pull: Option<AudioPull>,
    screen: ScreenBuffer,
    force_128k: bool,
    reduced_redraw: bool,
    /// Frame counter for the 1-in-32 render throttle during tape replay.
    tape_frame_skip: u8,
}

impl<C: CpuCore<MachineBus>> ZxSpectrum<C> {
    /// Create a machine around a CPU core. The configuration's ROM images
    /// are installed once; everything else is per-reset state.
    #[must_use]
    pub fn new(cpu: C, config: &MachineConfig) -> Self {
        let (mixer, pull) = Mixer::new();
        let mut machine = Self {
            cpu,
            bus: MachineBus::new(&config.rom_48k, &config.rom_128k),
            mixer,
            audio_pull: Some(pull),
            screen: ScreenBuffer::new(),
            force_128k: config.force_128k,
            reduced_redraw: config.reduced_redraw,
            tape_frame_skip: 0,
        };
        machine.reset();
        machine
    }

    /// Full machine reset for a tape or bare session. Boots into 48K mode,
    /// or 128K when the configuration forces it. Loader hooks are cleared;
    /// the tape collaborator re-registers its own on the next patch pass.
    pub fn reset(&mut self) {
        self.reset_base();
        if self.force_128k {
            self.bus.mem.enter_128k();
        }
    }

    fn reset_base(&mut self) {
        self.cpu.reset();
        self.cpu.regs_mut().pc = 0x0000;
        self.bus.mem.reset_48k();
        self.bus.ula = crate::ula::UlaState::new();
        self.bus.ay.reset();
        self.bus.clear_hooks();
        self.tape_frame_skip = 0;
    }

    /// Reset and load a snapshot, auto-detecting SNA vs .Z80. The image
    /// decides the hardware mode; SNA and Z80 v1 are always 48K.
    pub fn load_snapshot(&mut self, data: &[u8], leniency: Leniency) -> Result<(), SnapshotError> {
        self.reset_base();
        match snapshot::detect(data) {
            SnapshotKind::Sna => sna::load(self.cpu.regs_mut(), &mut self.bus, data, leniency),
            SnapshotKind::Z80 => z80::load(self.cpu.regs_mut(), &mut self.bus, data, leniency),
        }
    }

    /// Reset with a diagnostic ROM resident in the low windows. Bank
    /// switching will leave windows 0-1 alone for the whole session.
    pub fn load_diagnostic_rom(&mut self, image: &[u8]) {
        self.reset_base();
        self.bus.mem.load_diagnostic(image);
        if self.force_128k {
            self.bus.mem.map_128k_banks();
        }
    }

    /// Advance the whole machine by exactly one scanline.
    pub fn run_scanline(&mut self) -> FrameProgress {
        self.bus.ula.current_line += 1;
        let is_128k = self.bus.mem.is_128k();

        if self.bus.tape.is_active() {
            // Tape timing dominates: one flat budget, no audio interleave,
            // no screen fetches.
            self.bus.ula.screen_rendering = false;
            let _ = self.cpu.run(&mut self.bus, if is_128k { 228 } else { 224 });
        } else {
            self.mixer.prefetch_ay(&mut self.bus.ay);
            let sub = if is_128k { 66 } else { 64 };

            let deficit = self.cpu.run(&mut self.bus, sub);
            self.mixer.push_sample(self.bus.ula.beeper_bit());

            let deficit = self.cpu.run(&mut self.bus, sub + deficit);
            self.mixer.push_sample(self.bus.ula.beeper_bit());

            // Final chunk is border and horizontal sync; the ULA fetches
            // nothing, so the floating bus must read idle.
            self.bus.ula.screen_rendering = false;
            let _ = self.cpu.run(&mut self.bus, 96 + deficit);
            self.mixer.push_sample(self.bus.ula.beeper_bit());
        }

        let line = self.bus.ula.current_line;
        if line & 0xC0 != 0 && line & 0x100 == 0 {
            self.render_visible_line(usize::from(line) - 64);
            self.bus.ula.screen_rendering = true;
        }

        let frame_lines = if is_128k { 311 } else { 312 };
        if line == frame_lines {
            self.cpu.raise_interrupt(&mut self.bus, Interrupt::Maskable);
            self.bus.ula.current_line = 0;
            self.bus.ula.screen_rendering = false;
            self.bus.tape.advance_frame();
            return FrameProgress::FrameComplete;
        }

        FrameProgress::InProgress
    }

    /// Render one visible line into the host pixel buffer, honouring the
    /// frame-skip rules.
    fn render_visible_line(&mut self, y: usize) {
        if y == 0 {
            self.tape_frame_skip = self.tape_frame_skip.wrapping_add(1);
            self.bus.ula.tick_flash();
        }

        // While the tape is replaying, one frame in 32 is plenty.
        if self.bus.tape.is_active() && self.tape_frame_skip & 0x1F != 0 {
            return;
        }
        // Reduced-redraw hosts drop every other frame outright.
        if self.reduced_redraw && self.bus.ula.odd_frame() {
            return;
        }

        let flash = self.bus.ula.flash_phase;
        let screen = self.bus.mem.screen_slice();
        video::render_line(screen, y, flash, self.screen.line_mut(y));
    }

    /// Take the host's audio handle. Available exactly once.
    pub fn take_audio_pull(&mut self) -> Option<AudioPull> {
        self.audio_pull.take()
    }

    /// Mute or unmute audio output. Production continues regardless.
    pub fn set_audio_paused(&self, paused: bool) {
        self.mixer.set_paused(paused);
    }

    /// Register a loader-acceleration hook at a program-counter address.
    pub fn register_loader_hook(&mut self, pc: u16, hook: u32) {
        self.bus.register_hook(pc, hook);
    }

    /// Replace the tape collaborator.
    pub fn set_tape(&mut self, tape: Box<dyn TapeFeed>) {
        self.bus.set_tape(tape);
    }

    /// The host pixel buffer: 192 lines of 4-pixel-packed palette indices.
    #[must_use]
    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    /// Current border colour (0-7).
    #[must_use]
    pub fn border(&self) -> u8 {
        self.bus.ula.border()
    }

    /// Border colour as RGB, for the host's palette slot.
    #[must_use]
    pub fn border_rgb(&self) -> [u8; 3] {
        self.bus.ula.border_rgb
    }

    #[must_use]
    pub fn is_128k(&self) -> bool {
        self.bus.mem.is_128k()
    }

    /// The active hardware model.
    #[must_use]
    pub fn model(&self) -> MachineModel {
        if self.bus.mem.is_128k() {
            MachineModel::Spectrum128K
        } else {
            MachineModel::Spectrum48K
        }
    }

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &MachineBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut MachineBus {
        &mut self.bus
    }

    /// The host-maintained input set.
    pub fn input_mut(&mut self) -> &mut crate::input::InputState {
        &mut self.bus.input
    }
}
