//! End-to-end machine tests: snapshot loading into a running machine,
//! frame timing, and the audio path, driven through a scripted CPU stub.

use machine_zx::{
    FrameProgress, Key, Leniency, MachineBus, MachineConfig, BankKind, SnapshotError, ZxSpectrum,
    SNA_SIZE,
};
use zx_core::{Bus, CpuCore, Interrupt, IoBus, Z80State};

/// Scripted CPU core: burns whatever budget it is given and can replay a
/// fixed list of bus operations, one per `run` call, so tests can exercise
/// port decode from "inside" an instruction stream.
#[derive(Default)]
struct ScriptedCpu {
    regs: Z80State,
    interrupts: u32,
    script: Vec<BusOp>,
    cursor: usize,
    last_io_read: Option<u8>,
}

enum BusOp {
    Idle,
    OutPort(u16, u8),
    InPort(u16),
    FetchThenIn(u16, u16),
}

impl ScriptedCpu {
    fn new() -> Self {
        Self::default()
    }

    fn with_script(script: Vec<BusOp>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }
}

impl CpuCore<MachineBus> for ScriptedCpu {
    fn regs(&self) -> &Z80State {
        &self.regs
    }

    fn regs_mut(&mut self) -> &mut Z80State {
        &mut self.regs
    }

    fn reset(&mut self) {
        self.regs = Z80State::new();
    }

    fn run(&mut self, bus: &mut MachineBus, _budget: i32) -> i32 {
        if let Some(op) = self.script.get(self.cursor) {
            match *op {
                BusOp::Idle => {}
                BusOp::OutPort(port, value) => bus.write_io(port, value),
                BusOp::InPort(port) => self.last_io_read = Some(bus.read_io(port)),
                BusOp::FetchThenIn(pc, port) => {
                    let _ = bus.fetch(pc);
                    self.last_io_read = Some(bus.read_io(port));
                }
            }
            self.cursor += 1;
        }
        0
    }

    fn raise_interrupt(&mut self, _bus: &mut MachineBus, _interrupt: Interrupt) {
        self.interrupts += 1;
    }
}

fn make_machine() -> ZxSpectrum<ScriptedCpu> {
    ZxSpectrum::new(ScriptedCpu::new(), &MachineConfig::default())
}

// --- Snapshot end-to-end ---------------------------------------------------

#[test]
fn sna_image_always_loads_as_48k() {
    let mut m = make_machine();
    let mut sna = vec![0u8; SNA_SIZE];
    sna[23] = 0x00;
    sna[24] = 0x80; // SP = $8000

    m.load_snapshot(&sna, Leniency::Permissive).expect("load");
    assert!(!m.is_128k());

    m.load_snapshot(&sna, Leniency::Strict).expect("strict load");
    assert!(!m.is_128k());
}

#[test]
fn z80_v1_snapshot_restores_pc_and_windows() {
    let mut m = make_machine();

    // 30-byte v1 header: PC = $8000, SP = $FF50, uncompressed empty body.
    let mut data = vec![0u8; 30];
    data[6] = 0x00;
    data[7] = 0x80;
    data[8] = 0x50;
    data[9] = 0xFF;

    m.load_snapshot(&data, Leniency::Permissive).expect("load");

    assert_eq!(m.cpu().regs().pc, 0x8000);
    assert_eq!(m.cpu().regs().sp, 0xFF50);

    let w6 = m.bus().mem.window(6);
    assert_eq!(w6.kind, BankKind::Ram48);
    assert_eq!(w6.offset, 0xC000, "window 6 covers flat RAM at $C000");
}

#[test]
fn z80_v2_128k_snapshot_switches_machine_mode() {
    let mut m = make_machine();

    let mut data = vec![0u8; 30];
    // PC zero → v2/v3
    data.push(23);
    data.push(0);
    let mut ext = vec![0u8; 23];
    ext[0] = 0x34;
    ext[1] = 0x12; // PC = $1234
    ext[2] = 3; // 128K hardware
    ext[3] = 0x05; // latch: bank 5 at $C000
    data.extend_from_slice(&ext);

    m.load_snapshot(&data, Leniency::Permissive).expect("load");

    assert!(m.is_128k());
    assert_eq!(m.cpu().regs().pc, 0x1234);
    assert_eq!(m.bus().mem.bank_latch(), 0x05);
}

#[test]
fn malformed_snapshot_leaves_machine_continuable() {
    let mut m = make_machine();
    let result = m.load_snapshot(&[0u8; 5], Leniency::Permissive);
    assert!(matches!(result, Err(SnapshotError::TooShort { len: 5 })));

    // The machine still runs a full frame afterwards.
    let mut progress = FrameProgress::InProgress;
    for _ in 0..312 {
        progress = m.run_scanline();
    }
    assert_eq!(progress, FrameProgress::FrameComplete);
}

// --- Frame timing ----------------------------------------------------------

#[test]
fn pal_frame_timing_48k() {
    let mut m = make_machine();

    for call in 1..312 {
        assert_eq!(
            m.run_scanline(),
            FrameProgress::InProgress,
            "call {call} should not finish the frame"
        );
        assert_eq!(m.cpu().interrupts, 0);
    }

    assert_eq!(m.run_scanline(), FrameProgress::FrameComplete);
    assert_eq!(m.cpu().interrupts, 1, "exactly one interrupt per frame");

    // The counter wrapped: the next frame is another 312 calls.
    for _ in 0..311 {
        assert_eq!(m.run_scanline(), FrameProgress::InProgress);
    }
    assert_eq!(m.run_scanline(), FrameProgress::FrameComplete);
    assert_eq!(m.cpu().interrupts, 2);
}

#[test]
fn fifty_frames_of_audio_production() {
    let mut m = make_machine();
    let mut pull = m.take_audio_pull().expect("pull");

    let mut produced = 0usize;
    for _ in 0..50 {
        loop {
            let progress = m.run_scanline();
            // Drain as the host callback would, so the ring never clips.
            let mut chunk = [0i16; 4];
            pull.fill(&mut chunk);
            produced += chunk.len();
            if progress == FrameProgress::FrameComplete {
                break;
            }
        }
    }
    assert!(produced > 0);
}

// --- Port behaviour through the scheduler ----------------------------------

#[test]
fn border_write_lands_in_ula_and_palette_slot() {
    let mut m = ZxSpectrum::new(
        ScriptedCpu::with_script(vec![BusOp::OutPort(0x00FE, 0x15)]),
        &MachineConfig::default(),
    );

    let _ = m.run_scanline();
    assert_eq!(m.border(), 5);
    assert_eq!(m.border_rgb(), [0x00, 0xD8, 0xD8], "cyan palette slot");
}

#[test]
fn keyboard_read_through_instruction_stream() {
    let mut m = ZxSpectrum::new(
        ScriptedCpu::with_script(vec![BusOp::InPort(0xFDFE), BusOp::InPort(0xFDFE)]),
        &MachineConfig::default(),
    );

    m.input_mut().press(Key::A);
    let _ = m.run_scanline(); // first script op runs in the first sub-budget
    assert_eq!(m.cpu().last_io_read, Some(!0x01));
}

#[test]
fn loader_hook_dispatches_by_fetch_address() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct HookTape {
        fired: Arc<AtomicU32>,
    }
    impl zx_core::TapeFeed for HookTape {
        fn is_active(&self) -> bool {
            false
        }
        fn pulse_bit(&mut self) -> u8 {
            0
        }
        fn advance_frame(&mut self) {}
        fn run_hook(&mut self, hook: u32) {
            self.fired.store(hook, Ordering::Relaxed);
        }
    }

    let fired = Arc::new(AtomicU32::new(0));
    let mut m = ZxSpectrum::new(
        ScriptedCpu::with_script(vec![BusOp::FetchThenIn(0x0556, 0x00FE)]),
        &MachineConfig::default(),
    );
    m.set_tape(Box::new(HookTape {
        fired: Arc::clone(&fired),
    }));
    m.register_loader_hook(0x0556, 42);

    let _ = m.run_scanline();
    assert_eq!(fired.load(Ordering::Relaxed), 42);
}

// --- Audio pause property --------------------------------------------------

#[test]
fn paused_audio_is_a_flatline_of_the_last_sample() {
    let mut m = ZxSpectrum::new(
        ScriptedCpu::with_script(vec![BusOp::OutPort(0x00FE, 0x10)]), // beeper on
        &MachineConfig::default(),
    );
    let mut pull = m.take_audio_pull().expect("pull");

    // Run a few scanlines with the beeper high, consume what was made.
    for _ in 0..4 {
        let _ = m.run_scanline();
    }
    let mut warmup = [0i16; 12];
    pull.fill(&mut warmup);
    let last = warmup[11];

    m.set_audio_paused(true);
    let mut flat = [0i16; 1000];
    pull.fill(&mut flat);
    assert!(
        flat.iter().all(|&s| s == last),
        "1000 paused samples repeat the last emitted sample"
    );
}

// --- Floating bus through a frame ------------------------------------------

#[test]
fn floating_bus_idle_outside_visible_band() {
    // One port read per sub-budget; the first happens on line 1 (border).
    let mut m = ZxSpectrum::new(
        ScriptedCpu::with_script(vec![BusOp::InPort(0x30FF)]),
        &MachineConfig::default(),
    );
    let _ = m.run_scanline();
    assert_eq!(m.cpu().last_io_read, Some(0xFF), "ULA idle during border");
}

#[test]
fn floating_bus_returns_attributes_mid_frame() {
    // Idle through the border band, then read an odd unattached port while
    // the renderer is mid-screen.
    let mut script: Vec<BusOp> = Vec::new();
    for _ in 0..3 * 64 {
        script.push(BusOp::Idle); // lines 1..=64: three sub-budgets each
    }
    script.push(BusOp::InPort(0x30FF)); // line 65, first sub-budget

    let mut m = ZxSpectrum::new(ScriptedCpu::with_script(script), &MachineConfig::default());

    // Attribute row 0: bright red paper everywhere.
    for i in 0..32 {
        m.bus_mut().mem.load_flat(0x5800 + i, &[0x57]);
    }

    for _ in 0..65 {
        let _ = m.run_scanline();
    }
    assert_eq!(m.cpu().last_io_read, Some(0x57));
}
