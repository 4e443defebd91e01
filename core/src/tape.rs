/// The externally supplied tape subsystem.
///
/// The engine only needs to know whether the tape is actively driving the
/// EAR input, what the current pulse level is, and how to service a
/// loader-patch hook when a registered program-counter address performs a
/// port read. Block parsing and pulse timing live entirely on the other
/// side of this trait.
pub trait TapeFeed {
    /// Whether the tape is actively generating pulses. While active, ULA
    /// port reads return the pulse bit exclusively.
    fn is_active(&self) -> bool;

    /// Current EAR pulse level as a port-0xFE bit mask (0x40 or 0).
    fn pulse_bit(&mut self) -> u8;

    /// Advance tape time by one video frame.
    fn advance_frame(&mut self);

    /// Service a loader-acceleration hook previously registered with the
    /// machine. `hook` is the identifier supplied at registration.
    fn run_hook(&mut self, hook: u32);
}

/// Tape feed with no tape inserted. Used for snapshot-only sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTape;

impl TapeFeed for NoTape {
    fn is_active(&self) -> bool {
        false
    }

    fn pulse_bit(&mut self) -> u8 {
        0
    }

    fn advance_frame(&mut self) {}

    fn run_hook(&mut self, _hook: u32) {}
}
