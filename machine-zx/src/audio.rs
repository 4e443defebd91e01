//! Beeper + AY mixing into a lock-free sample ring.
//!
//! The execution scheduler produces up to three mono samples per scanline
//! (one after each CPU sub-budget); the host's audio callback consumes them
//! through an [`AudioPull`] handle from its own execution context. The ring
//! is the only structure touched from both sides, single-producer /
//! single-consumer, with overflow handled by a production "breather"
//! instead of blocking — stalling is not tolerable in the audio path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};

use crate::ay::AyChip;

/// Nominal output rate: three samples per scanline, 312 lines, 50 frames.
pub const SAMPLE_RATE: u32 = 46_800;

/// Ring capacity in samples.
const RING_CAPACITY: usize = 4096;

/// Samples to suppress after the ring comes within one slot of overflow.
const BREATHER_SLOTS: u32 = 2048;

/// Beeper contribution when port $FE bit 4 is high.
const BEEPER_LEVEL: i16 = 0x0A00;

/// AY samples prefetched per scanline.
const AY_SAMPLES_PER_LINE: usize = 3;

/// Producer side: owned by the machine, fed by the scheduler.
pub struct Mixer {
    ring: HeapProd<i16>,
    paused: Arc<AtomicBool>,
    /// Remaining samples to swallow while the consumer catches up.
    breather: u32,
    /// AY samples for the current scanline.
    ay_buf: [i16; AY_SAMPLES_PER_LINE],
    ay_cursor: usize,
}

impl Mixer {
    /// Create the producer/consumer pair around a fresh ring.
    #[must_use]
    pub fn new() -> (Self, AudioPull) {
        let (prod, cons) = HeapRb::<i16>::new(RING_CAPACITY).split();
        let paused = Arc::new(AtomicBool::new(false));
        let mixer = Self {
            ring: prod,
            paused: Arc::clone(&paused),
            breather: 0,
            ay_buf: [0; AY_SAMPLES_PER_LINE],
            ay_cursor: 0,
        };
        let pull = AudioPull {
            ring: cons,
            paused,
            last_sample: 0,
        };
        (mixer, pull)
    }

    /// Prefetch this scanline's AY samples. The AY is sampled three times
    /// per scanline regardless of the finer beeper interleave; a disabled
    /// chip contributes silence.
    pub fn prefetch_ay(&mut self, ay: &mut AyChip) {
        self.ay_buf = [0; AY_SAMPLES_PER_LINE];
        if ay.enabled {
            ay.mix(&mut self.ay_buf);
        }
        self.ay_cursor = 0;
    }

    /// Mix one sample from the beeper bit and the next prefetched AY
    /// sample, and push it into the ring.
    ///
    /// When the ring comes within one slot of the consumer's read cursor,
    /// production pauses for [`BREATHER_SLOTS`] samples — a brief audio
    /// flatline instead of overwriting unread data.
    pub fn push_sample(&mut self, beeper_high: bool) {
        if self.breather > 0 {
            self.breather -= 1;
            return;
        }

        let mut sample = self.ay_buf[self.ay_cursor % AY_SAMPLES_PER_LINE];
        self.ay_cursor += 1;
        if beeper_high {
            sample = sample.saturating_add(BEEPER_LEVEL);
        }

        let _ = self.ring.try_push(sample);
        if self.ring.vacant_len() <= 1 {
            self.breather = BREATHER_SLOTS;
        }
    }

    /// Mute or unmute the consumer side. Does not stop production.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Samples currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.ring.occupied_len()
    }
}

/// Consumer side: handed to the host and driven from its audio callback.
///
/// Only reads the ring — never machine state — so it is safe to call from
/// a different execution context than the scheduler.
pub struct AudioPull {
    ring: HeapCons<i16>,
    paused: Arc<AtomicBool>,
    last_sample: i16,
}

impl AudioPull {
    /// Fill `out` with exactly `out.len()` samples.
    ///
    /// While paused, and on momentary underrun, the last emitted sample is
    /// repeated to avoid audible clicks.
    pub fn fill(&mut self, out: &mut [i16]) {
        if self.paused.load(Ordering::Relaxed) {
            out.fill(self.last_sample);
            return;
        }
        for sample in out {
            *sample = self.ring.try_pop().unwrap_or(self.last_sample);
            self.last_sample = *sample;
        }
    }

    /// Samples waiting in the ring.
    #[must_use]
    pub fn available(&self) -> usize {
        self.ring.occupied_len()
    }
}
