/// A bus that supports memory read/write operations.
///
/// The CPU core performs all memory traffic through this trait. Addresses
/// are the Z80's 16-bit logical address space; banking is resolved behind
/// the bus.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to the given address. ROM writes are silently ignored.
    fn write(&mut self, addr: u16, value: u8);

    /// Read a byte during an M1 (opcode fetch) cycle.
    ///
    /// Defaults to a plain `read()`. Implementations may observe the fetch
    /// address — the machine bus uses it to know the program counter when a
    /// later I/O access needs to consult loader-patch hooks.
    fn fetch(&mut self, addr: u16) -> u8 {
        self.read(addr)
    }
}

/// A bus that also supports the Z80's separate 16-bit I/O port space.
///
/// IN and OUT instructions land here. Port decoding (ULA, Kempston, AY,
/// banking) is entirely the bus implementation's concern.
pub trait IoBus: Bus {
    /// Read a byte from the given I/O port.
    fn read_io(&mut self, port: u16) -> u8;

    /// Write a byte to the given I/O port.
    fn write_io(&mut self, port: u16, value: u8);
}
