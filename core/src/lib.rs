//! Core traits for the ZX Spectrum machine engine.
//!
//! The engine treats the Z80 interpreter and the tape subsystem as external
//! collaborators. This crate defines the narrow seams they are consumed
//! through: the memory/port bus the CPU drives, the CPU register file and
//! run-cycles contract, and the tape feed.

mod bus;
mod cpu;
mod tape;

pub use bus::{Bus, IoBus};
pub use cpu::{CpuCore, Interrupt, Z80State};
pub use tape::{NoTape, TapeFeed};
