//! Machine configuration.

/// Hardware models the engine emulates.
///
/// The active model is normally decided by the loaded snapshot (SNA and Z80
/// v1 images are always 48K; Z80 v2/v3 images carry a hardware byte), or
/// forced via [`MachineConfig::force_128k`] for tape sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineModel {
    Spectrum48K,
    Spectrum128K,
}

/// Configuration for creating a machine instance.
#[derive(Default)]
pub struct MachineConfig {
    /// 48K BASIC ROM (16,384 bytes). May be empty for bare test machines.
    pub rom_48k: Vec<u8>,
    /// 128K ROM, editor half first (32,768 bytes). May be empty.
    pub rom_128k: Vec<u8>,
    /// Boot in 128K mode even without a 128K snapshot (tape sessions).
    pub force_128k: bool,
    /// Skip rendering every other frame on hosts that can't keep up.
    pub reduced_redraw: bool,
}
