// SPDX-License-Identifier: MIT
//
// Construction-time configuration: field widths, checksum selection, and
// the fixed limits every `Endpoint` enforces. Both peers on a link MUST
// agree on every field here — nothing is negotiated on the wire.

use crate::checksum::ChecksumKind;
use crate::error::{Error, Result};

/// Width, in bytes, of a wire-encoded integer field.
///
/// Mirrors the C ancestor's `TF_ID_BYTES` / `TF_LEN_BYTES` / `TF_TYPE_BYTES`
/// compile-time selection, kept as a runtime choice here (see Design Notes)
/// so one binary can host endpoints with different layouts for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    One,
    Two,
    Four,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::One => 1,
            Width::Two => 2,
            Width::Four => 4,
        }
    }

    /// All-ones mask for the numeric bits of an ID field of this width,
    /// i.e. excluding the reserved peer bit.
    pub const fn id_mask(self) -> u32 {
        match self {
            Width::One => 0x7F,
            Width::Two => 0x7FFF,
            Width::Four => 0x7FFF_FFFF,
        }
    }

    /// Reserved high bit ("peer bit") for an ID field of this width.
    pub const fn peer_bit(self) -> u32 {
        match self {
            Width::One => 0x80,
            Width::Two => 0x8000,
            Width::Four => 0x8000_0000,
        }
    }

    /// Maximum value representable in a field of this width (used to bound `LEN`).
    pub const fn max_value(self) -> u32 {
        match self {
            Width::One => 0xFF,
            Width::Two => 0xFFFF,
            Width::Four => 0xFFFF_FFFF,
        }
    }
}

/// Which end of the link this endpoint is. Determines the peer bit set on
/// every frame_id this endpoint originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peer {
    Slave,
    Master,
}

/// Wire layout and limits shared by the encoder and decoder.
///
/// Both peers on a link MUST construct endpoints with identical `Config`
/// values (barring `Peer`, which is necessarily different on each side).
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub id_width: Width,
    pub len_width: Width,
    pub type_width: Width,
    pub checksum: ChecksumKind,
    pub use_sof: bool,
    pub sof_byte: u8,
    pub max_payload_rx: usize,
    pub max_payload_tx: usize,
    pub parser_timeout_ticks: u32,
}

impl Config {
    /// A reasonable default: 1-byte ID, 2-byte LEN, 1-byte TYPE, CRC-16,
    /// SOF enabled with the same sentinel as the C ancestor (0x01).
    pub const fn new(max_payload_rx: usize, max_payload_tx: usize) -> Self {
        Self {
            id_width: Width::One,
            len_width: Width::Two,
            type_width: Width::One,
            checksum: ChecksumKind::Crc16,
            use_sof: true,
            sof_byte: 0x01,
            max_payload_rx,
            max_payload_tx,
            parser_timeout_ticks: 10,
        }
    }

    pub const fn id_width(mut self, w: Width) -> Self {
        self.id_width = w;
        self
    }

    pub const fn len_width(mut self, w: Width) -> Self {
        self.len_width = w;
        self
    }

    pub const fn type_width(mut self, w: Width) -> Self {
        self.type_width = w;
        self
    }

    pub const fn checksum(mut self, c: ChecksumKind) -> Self {
        self.checksum = c;
        self
    }

    pub const fn use_sof(mut self, enabled: bool, sof_byte: u8) -> Self {
        self.use_sof = enabled;
        self.sof_byte = sof_byte;
        self
    }

    pub const fn parser_timeout_ticks(mut self, ticks: u32) -> Self {
        self.parser_timeout_ticks = ticks;
        self
    }

    /// Validate this config against the fixed buffer capacities `RX_CAP`/`TX_CAP`
    /// the owning `Endpoint` was instantiated with.
    pub(crate) fn validate(&self, rx_cap: usize, tx_cap: usize) -> Result<()> {
        if self.max_payload_rx > rx_cap {
            return Err(Error::InvalidConfig("max_payload_rx exceeds RX_CAP"));
        }
        if self.max_payload_tx > tx_cap {
            return Err(Error::InvalidConfig("max_payload_tx exceeds TX_CAP"));
        }
        if (self.max_payload_rx as u64) > u64::from(self.len_width.max_value()) {
            return Err(Error::InvalidConfig("max_payload_rx does not fit in LEN width"));
        }
        Ok(())
    }
}
