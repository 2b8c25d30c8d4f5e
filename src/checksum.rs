// SPDX-License-Identifier: MIT
//
// Checksum variants used for the header and payload checksum fields.
// All four variants share one running-accumulator shape so the decoder
// can feed bytes in one at a time without knowing which variant is active.

use std::sync::OnceLock;

/// Which checksum algorithm a `Config` selects. Both header and payload
/// checksums (when present) use the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// No checksum fields on the wire at all.
    None,
    /// Running XOR over the covered bytes, complemented at the end.
    Xor8,
    /// CRC-16/MODBUS: poly 0x8005 reflected, init 0xFFFF, no final xor.
    Crc16,
    /// CRC-32/Ethernet: poly 0xEDB88320 reflected, init 0xFFFFFFFF, final xor 0xFFFFFFFF.
    Crc32,
}

impl ChecksumKind {
    /// Width in bytes of this checksum's wire field. Zero for `None`.
    pub const fn width(self) -> usize {
        match self {
            ChecksumKind::None => 0,
            ChecksumKind::Xor8 => 1,
            ChecksumKind::Crc16 => 2,
            ChecksumKind::Crc32 => 4,
        }
    }

    /// Start a fresh running accumulator for this variant.
    pub fn accumulator(self) -> Accumulator {
        Accumulator { kind: self, value: self.seed() }
    }

    const fn seed(self) -> u32 {
        match self {
            ChecksumKind::None => 0,
            ChecksumKind::Xor8 => 0,
            ChecksumKind::Crc16 => 0xFFFF,
            ChecksumKind::Crc32 => 0xFFFF_FFFF,
        }
    }

    /// One-shot checksum over a full byte slice, for tests and small frames.
    pub fn of(self, data: &[u8]) -> u32 {
        let mut acc = self.accumulator();
        acc.update(data);
        acc.finish()
    }
}

/// A running checksum computation, fed one byte (or slice) at a time.
///
/// Mirrors the C ancestor's incremental `TF_CKSUM_RESET` / `..._ADD` /
/// `..._FINALIZE` macros, which let the decoder accumulate a checksum
/// across non-contiguous calls as bytes trickle in off the wire.
pub struct Accumulator {
    kind: ChecksumKind,
    value: u32,
}

impl Accumulator {
    pub fn update(&mut self, data: &[u8]) {
        match self.kind {
            ChecksumKind::None => {}
            ChecksumKind::Xor8 => {
                for &b in data {
                    self.value ^= u32::from(b);
                }
            }
            ChecksumKind::Crc16 => {
                let table = crc16_table();
                for &b in data {
                    let idx = ((self.value ^ u32::from(b)) & 0xFF) as usize;
                    self.value = (self.value >> 8) ^ u32::from(table[idx]);
                }
            }
            ChecksumKind::Crc32 => {
                let table = crc32_table();
                for &b in data {
                    let idx = ((self.value ^ u32::from(b)) & 0xFF) as usize;
                    self.value = (self.value >> 8) ^ table[idx];
                }
            }
        }
    }

    /// Finalize and return the checksum value. For `Xor8` this is the
    /// bitwise-NOT of the running XOR (only the low byte is meaningful).
    pub fn finish(&self) -> u32 {
        match self.kind {
            ChecksumKind::None => 0,
            ChecksumKind::Xor8 => (!self.value) & 0xFF,
            ChecksumKind::Crc16 => self.value & 0xFFFF,
            ChecksumKind::Crc32 => self.value ^ 0xFFFF_FFFF,
        }
    }
}

/// Table for CRC-16/MODBUS (poly 0x8005, reflected to 0xA001), built once
/// on first use and shared for the life of the process.
fn crc16_table() -> &'static [u16; 256] {
    static TABLE: OnceLock<[u16; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        const POLY: u16 = 0xA001; // bit-reflected form of 0x8005
        let mut table = [0u16; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u16;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    })
}

/// Table for CRC-32/Ethernet (poly 0xEDB88320, already reflected), built
/// once on first use.
fn crc32_table() -> &'static [u32; 256] {
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        const POLY: u32 = 0xEDB8_8320;
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    })
}
