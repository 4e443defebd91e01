//! ZX Spectrum 48K/128K machine emulation engine.
//!
//! Scanline-synchronous: the host drives [`ZxSpectrum::run_scanline`] and
//! gets back exactly one scanline of CPU time, audio and video per call.
//! The Z80 interpreter, the tape subsystem and the display/audio plumbing
//! are external collaborators behind the `zx-core` traits; everything the
//! machine itself owns — paged memory, ULA ports, snapshot loading, the
//! beeper/AY mix — lives here.

mod audio;
mod ay;
mod bus;
mod config;
mod input;
mod memory;
mod palette;
mod sna;
mod snapshot;
mod spectrum;
mod ula;
mod video;
mod z80;

pub use audio::{AudioPull, Mixer, SAMPLE_RATE};
pub use ay::AyChip;
pub use bus::MachineBus;
pub use config::{MachineConfig, MachineModel};
pub use input::{InputState, JoystickState, Key, MAX_KEYS};
pub use memory::{AddressSpace, BankKind, WindowRef, WINDOW_COUNT, WINDOW_SIZE};
pub use palette::{BORDER_COLORS, PALETTE};
pub use snapshot::{detect, Leniency, SnapshotError, SnapshotKind, SNA_SIZE};
pub use spectrum::{FrameProgress, ZxSpectrum};
pub use ula::{StickyKey, UlaState};
pub use video::{ScreenBuffer, SCREEN_HEIGHT, SCREEN_WIDTH, WORDS_PER_LINE};
