//! .Z80 snapshot loader (v1, v2, v3).
//!
//! Version 1 is detected by a non-zero PC field in the 30-byte header and
//! is always 48K: one memory block, optionally RLE-compressed, terminated
//! early by the `00 ED ED 00` end marker. Versions 2 and 3 leave PC zero
//! and append an extended header followed by per-page records; the
//! hardware byte decides 48K vs 128K and the 128K path replays the bank
//! latch and the AY register file.
//!
//! The RLE escape is `ED ED count value`; a lone ED, or ED followed by
//! anything else, passes through literally.

use zx_core::Z80State;

use crate::bus::MachineBus;
use crate::snapshot::{byte, word, Leniency, SnapshotError};

/// Base header size.
const HEADER_SIZE: usize = 30;

/// Largest decompressed body of a v1 image (48K RAM).
const V1_CEILING: usize = 0xC000;

/// One 16KB page.
const PAGE_SIZE: usize = 0x4000;

/// Load a .Z80 image into the machine. The caller has already reset it.
pub(crate) fn load(
    regs: &mut Z80State,
    bus: &mut MachineBus,
    data: &[u8],
    leniency: Leniency,
) -> Result<(), SnapshotError> {
    if data.len() < HEADER_SIZE {
        return Err(SnapshotError::TooShort { len: data.len() });
    }

    let flags1 = load_base_header(regs, data);
    bus.ula.write_fe((flags1 >> 1) & 0x07);

    let pc = word(data, 6);
    if pc != 0 {
        load_v1(regs, bus, data, flags1, pc);
        Ok(())
    } else {
        load_v2_v3(regs, bus, data, leniency)
    }
}

/// Restore the 30-byte base header into the register file. Returns flags
/// byte 1 (compression bit, border, refresh high bit).
fn load_base_header(regs: &mut Z80State, data: &[u8]) -> u8 {
    regs.a = data[0];
    regs.f = data[1];
    regs.c = data[2];
    regs.b = data[3];
    regs.l = data[4];
    regs.h = data[5];
    // PC (6-7) is handled per-version.
    regs.sp = word(data, 8);
    regs.i = data[10];

    // Flags byte 1: the format defines 255 as a synonym for 1.
    let flags1 = if data[12] == 0xFF { 0x01 } else { data[12] };
    regs.r = (data[11] & 0x7F) | ((flags1 & 0x01) << 7);

    regs.e = data[13];
    regs.d = data[14];
    regs.c_alt = data[15];
    regs.b_alt = data[16];
    regs.e_alt = data[17];
    regs.d_alt = data[18];
    regs.l_alt = data[19];
    regs.h_alt = data[20];
    regs.a_alt = data[21];
    regs.f_alt = data[22];
    regs.iy = word(data, 23);
    regs.ix = word(data, 25);

    regs.iff1 = data[27] != 0;
    regs.iff2 = data[28] != 0;
    regs.im = data[29] & 0x03;

    flags1
}

/// Version 1: one body, loaded contiguously at $4000. Always 48K.
fn load_v1(regs: &mut Z80State, bus: &mut MachineBus, data: &[u8], flags1: u8, pc: u16) {
    regs.pc = pc;

    let compressed = flags1 & 0x20 != 0;
    let mut ram = vec![0u8; V1_CEILING];
    let len = decompress_v1(&data[HEADER_SIZE..], compressed, &mut ram);
    bus.mem.load_flat(0x4000, &ram[..len]);
}

/// Expand a v1 body into `out`, returning the bytes produced.
///
/// Stops at the `00 ED ED 00` end marker, at the end of the input, or at
/// the 48K ceiling — whichever comes first. With the compression flag
/// clear the body passes through byte-for-byte.
pub(crate) fn decompress_v1(body: &[u8], compressed: bool, out: &mut [u8]) -> usize {
    let ceiling = out.len();
    let mut offset = 0;
    let mut i = 0;

    while i < body.len() && offset < ceiling {
        if i + 3 < body.len()
            && body[i] == 0x00
            && body[i + 1] == 0xED
            && body[i + 2] == 0xED
            && body[i + 3] == 0x00
        {
            break;
        }

        if compressed && i + 3 < body.len() && body[i] == 0xED && body[i + 1] == 0xED {
            let repeat = usize::from(body[i + 2]);
            let value = body[i + 3];
            for _ in 0..repeat {
                if offset >= ceiling {
                    break;
                }
                out[offset] = value;
                offset += 1;
            }
            i += 4;
        } else {
            out[offset] = body[i];
            offset += 1;
            i += 1;
        }
    }

    offset
}

/// Versions 2 and 3: extended header plus per-page records.
fn load_v2_v3(
    regs: &mut Z80State,
    bus: &mut MachineBus,
    data: &[u8],
    leniency: Leniency,
) -> Result<(), SnapshotError> {
    if data.len() < 32 && leniency == Leniency::Strict {
        return Err(SnapshotError::TooShort { len: data.len() });
    }

    // Extended header length at byte 30; records start after it.
    let records_start = HEADER_SIZE + usize::from(byte(data, 30)) + 2;

    regs.pc = word(data, 32);
    let hw_version = byte(data, 34);
    let is_128k = hw_version >= 3;
    let port_7ffd = byte(data, 35);

    let mut page = vec![0u8; PAGE_SIZE];
    let mut idx = records_start;
    while idx + 3 <= data.len() {
        let declared = word(data, idx);
        let (compressed, block_len) = if declared == 0xFFFF {
            (false, PAGE_SIZE)
        } else {
            (true, usize::from(declared).min(PAGE_SIZE))
        };
        let page_number = byte(data, idx + 2);
        idx += 3;

        let avail = block_len.min(data.len() - idx);
        if avail < block_len && leniency == Leniency::Strict {
            return Err(SnapshotError::TruncatedPage { page: page_number });
        }

        page.fill(0);
        decompress_page(&data[idx..idx + avail], compressed, &mut page);
        place_page(bus, is_128k, page_number, &page);

        idx += block_len;
    }

    if is_128k {
        bus.mem.enter_128k();
        bus.mem.switch_bank(port_7ffd);
        restore_ay(bus, data);
    }

    Ok(())
}

/// Expand one page body. No end marker in this format — the declared
/// length alone bounds the input, the page size bounds the output.
pub(crate) fn decompress_page(body: &[u8], compressed: bool, out: &mut [u8]) {
    let mut offset = 0;
    let mut i = 0;

    while i < body.len() && offset < out.len() {
        if compressed && i + 3 < body.len() && body[i] == 0xED && body[i + 1] == 0xED {
            let repeat = usize::from(body[i + 2]);
            let value = body[i + 3];
            for _ in 0..repeat {
                if offset >= out.len() {
                    break;
                }
                out[offset] = value;
                offset += 1;
            }
            i += 4;
        } else {
            out[offset] = body[i];
            offset += 1;
            i += 1;
        }
    }
}

/// Route a decompressed page to its bank (128K) or logical address (48K).
/// Unknown page numbers (ROM images and other hardware) are skipped.
fn place_page(bus: &mut MachineBus, is_128k: bool, page_number: u8, page: &[u8]) {
    if is_128k {
        if (3..=10).contains(&page_number) {
            let bank = usize::from(page_number - 3);
            bus.mem.ram_bank_mut(bank).copy_from_slice(page);
        }
    } else {
        match page_number {
            4 => bus.mem.load_flat(0x8000, page),
            5 => bus.mem.load_flat(0xC000, page),
            8 => bus.mem.load_flat(0x4000, page),
            _ => {}
        }
    }
}

/// Restore the AY register file from the extended header.
///
/// Snapshots in the wild disagree with their own enable flag, so the chip
/// is brought up when any of several signals say it was in use: the flag
/// itself, a non-zero register index, or a non-zero channel volume.
fn restore_ay(bus: &mut MachineBus, data: &[u8]) {
    let in_use = byte(data, 37) & 0x04 != 0
        || byte(data, 38) > 0
        || byte(data, 39 + 8) > 0
        || byte(data, 39 + 9) > 0
        || byte(data, 39 + 10) > 0;
    if !in_use {
        return;
    }

    bus.ay.enabled = true;
    bus.ay.index_written = true;
    for reg in 0..16u8 {
        bus.ay.select(reg);
        bus.ay.write_data(byte(data, 39 + usize::from(reg)));
    }
    bus.ay.select(byte(data, 38));
}
