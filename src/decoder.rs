// SPDX-License-Identifier: MIT
//
// Byte-at-a-time parser state machine. Consumes one inbound byte per call
// and reconstructs a complete, checksum-verified frame, or silently
// resets on any integrity failure. Port of the state flow documented for
// the C ancestor's `TF_AcceptChar`, restructured as an explicit state enum
// instead of a single monolithic function with local `static` counters.

use crate::checksum::Accumulator;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// At rest: either truly idle (no SOF) or scanning for the SOF byte.
    Idle,
    Id,
    Len,
    Type,
    HeadCksum,
    Payload,
    PayloadCksum,
}

/// The byte-at-a-time frame parser. `RX_CAP` fixes the size of the
/// internal payload scratch buffer; `Config::max_payload_rx` (checked at
/// `Endpoint::new`) bounds how much of it is actually usable.
pub(crate) struct Decoder<const RX_CAP: usize> {
    state: ParserState,
    timeout_remaining: u32,

    /// Scratch for assembling a multi-byte ID/LEN/TYPE/checksum field.
    field_buf: [u8; 4],
    field_pos: usize,

    frame_id: u32,
    len: u32,
    msg_type: u32,

    head_acc: Option<Accumulator>,
    payload_acc: Option<Accumulator>,

    payload: [u8; RX_CAP],
    payload_pos: usize,
}

impl<const RX_CAP: usize> Decoder<RX_CAP> {
    pub(crate) fn new() -> Self {
        Self {
            state: ParserState::Idle,
            timeout_remaining: 0,
            field_buf: [0; 4],
            field_pos: 0,
            frame_id: 0,
            len: 0,
            msg_type: 0,
            head_acc: None,
            payload_acc: None,
            payload: [0; RX_CAP],
            payload_pos: 0,
        }
    }

    /// Drop any partial frame and return to the initial state. Does not
    /// touch listener tables — those live on `Endpoint`.
    pub(crate) fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.timeout_remaining = 0;
        self.field_pos = 0;
        self.payload_pos = 0;
        self.head_acc = None;
        self.payload_acc = None;
    }

    pub(crate) fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub(crate) fn msg_type(&self) -> u32 {
        self.msg_type
    }

    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_pos]
    }

    /// Advance the parser timeout by one tick. Returns `true` if the
    /// partial frame aged out and was discarded.
    pub(crate) fn tick(&mut self, cfg: &Config) -> bool {
        if self.state == ParserState::Idle {
            return false;
        }
        if self.timeout_remaining == 0 {
            // Shouldn't happen (armed on every non-idle entry), but don't
            // let a logic slip wedge the parser forever.
            self.reset();
            return true;
        }
        self.timeout_remaining -= 1;
        if self.timeout_remaining == 0 {
            self.reset();
            return true;
        }
        let _ = cfg;
        false
    }

    fn arm_timeout(&mut self, cfg: &Config) {
        self.timeout_remaining = cfg.parser_timeout_ticks.max(1);
    }

    fn begin_frame(&mut self, cfg: &Config) {
        self.state = ParserState::Id;
        self.field_pos = 0;
        self.frame_id = 0;
        self.len = 0;
        self.msg_type = 0;
        self.payload_pos = 0;
        self.head_acc = Some(cfg.checksum.accumulator());
        self.payload_acc = None;
        self.arm_timeout(cfg);
    }

    /// Feed one byte into a fixed-width field accumulator (ID/LEN/TYPE).
    /// Returns `Some(value)` once the field is complete.
    fn feed_field(&mut self, byte: u8, width: usize) -> Option<u32> {
        self.field_buf[self.field_pos] = byte;
        self.field_pos += 1;
        if self.field_pos < width {
            return None;
        }
        let mut value = 0u32;
        for &b in &self.field_buf[..width] {
            value = (value << 8) | u32::from(b);
        }
        self.field_pos = 0;
        Some(value)
    }

    /// Feed one inbound byte. Returns `true` exactly when a complete,
    /// checksum-verified frame is ready to be read out via `frame_id()` /
    /// `msg_type()` / `payload()` (the caller must do so before the next
    /// call, which will reset this state).
    pub(crate) fn accept_byte(&mut self, byte: u8, cfg: &Config) -> bool {
        match self.state {
            ParserState::Idle => {
                if cfg.use_sof {
                    if byte == cfg.sof_byte {
                        self.begin_frame(cfg);
                        if let Some(acc) = &mut self.head_acc {
                            acc.update(&[byte]);
                        }
                    }
                    // else: stay idle, discard.
                    false
                } else {
                    self.begin_frame(cfg);
                    self.accept_byte(byte, cfg)
                }
            }

            ParserState::Id => {
                if let Some(acc) = &mut self.head_acc {
                    acc.update(&[byte]);
                }
                match self.feed_field(byte, cfg.id_width.bytes()) {
                    Some(id) => {
                        self.frame_id = id;
                        self.state = ParserState::Len;
                        false
                    }
                    None => false,
                }
            }

            ParserState::Len => {
                if let Some(acc) = &mut self.head_acc {
                    acc.update(&[byte]);
                }
                match self.feed_field(byte, cfg.len_width.bytes()) {
                    Some(len) => {
                        if len as usize > cfg.max_payload_rx {
                            log::debug!(
                                "tinyframe: rx LEN {len} exceeds max_payload_rx {}, resetting parser",
                                cfg.max_payload_rx
                            );
                            self.reset();
                            return false;
                        }
                        self.len = len;
                        self.state = ParserState::Type;
                        false
                    }
                    None => false,
                }
            }

            ParserState::Type => {
                if let Some(acc) = &mut self.head_acc {
                    acc.update(&[byte]);
                }
                match self.feed_field(byte, cfg.type_width.bytes()) {
                    Some(t) => {
                        self.msg_type = t;
                        if cfg.checksum != crate::checksum::ChecksumKind::None {
                            self.state = ParserState::HeadCksum;
                        } else if self.len > 0 {
                            self.state = ParserState::Payload;
                            self.payload_acc = Some(cfg.checksum.accumulator());
                        } else {
                            return self.complete();
                        }
                        false
                    }
                    None => false,
                }
            }

            ParserState::HeadCksum => {
                match self.feed_field(byte, cfg.checksum.width()) {
                    Some(received) => {
                        let expected = self.head_acc.as_ref().map(Accumulator::finish).unwrap_or(0);
                        if received != expected {
                            log::debug!("tinyframe: header checksum mismatch, resetting parser");
                            self.reset();
                            return false;
                        }
                        if self.len > 0 {
                            self.state = ParserState::Payload;
                            self.payload_acc = Some(cfg.checksum.accumulator());
                            false
                        } else {
                            self.complete()
                        }
                    }
                    None => false,
                }
            }

            ParserState::Payload => {
                self.payload[self.payload_pos] = byte;
                self.payload_pos += 1;
                if let Some(acc) = &mut self.payload_acc {
                    acc.update(&[byte]);
                }
                if self.payload_pos < self.len as usize {
                    return false;
                }
                if cfg.checksum != crate::checksum::ChecksumKind::None {
                    self.state = ParserState::PayloadCksum;
                    false
                } else {
                    self.complete()
                }
            }

            ParserState::PayloadCksum => match self.feed_field(byte, cfg.checksum.width()) {
                Some(received) => {
                    let expected = self.payload_acc.as_ref().map(Accumulator::finish).unwrap_or(0);
                    if received != expected {
                        log::debug!("tinyframe: payload checksum mismatch, resetting parser");
                        self.reset();
                        return false;
                    }
                    self.complete()
                }
                None => false,
            },
        }
    }

    fn complete(&mut self) -> bool {
        self.state = ParserState::Idle;
        self.timeout_remaining = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumKind;
    use crate::config::{Config, Width};

    fn cfg_no_sof_no_cksum() -> Config {
        Config::new(64, 64)
            .id_width(Width::One)
            .len_width(Width::Two)
            .type_width(Width::One)
            .checksum(ChecksumKind::None)
            .use_sof(false, 0)
    }

    #[test]
    fn decodes_minimal_frame_without_sof_or_checksum() {
        let cfg = cfg_no_sof_no_cksum();
        let mut dec: Decoder<64> = Decoder::new();
        let bytes = [0x05u8, 0x00, 0x02, 0x22, b'H', b'i'];
        let mut ready = false;
        for &b in &bytes {
            ready = dec.accept_byte(b, &cfg);
        }
        assert!(ready);
        assert_eq!(dec.frame_id(), 5);
        assert_eq!(dec.msg_type(), 0x22);
        assert_eq!(dec.payload(), b"Hi");
    }

    #[test]
    fn resets_on_oversized_len() {
        let cfg = Config::new(4, 4)
            .checksum(ChecksumKind::None)
            .use_sof(false, 0)
            .len_width(Width::Two);
        let mut dec: Decoder<4> = Decoder::new();
        // id=1, len=100 (exceeds max_payload_rx=4)
        dec.accept_byte(1, &cfg);
        dec.accept_byte(0, &cfg);
        let ready = dec.accept_byte(100, &cfg);
        assert!(!ready);
        // Parser should be back at idle (garbage type byte should not crash,
        // and no frame should ever complete from leftover state).
    }

    #[test]
    fn idle_discards_until_sof() {
        let cfg = Config::new(64, 64).checksum(ChecksumKind::None);
        let mut dec: Decoder<64> = Decoder::new();
        for &garbage in &[0x00u8, 0xFF, 0x02] {
            assert!(!dec.accept_byte(garbage, &cfg));
        }
        let bytes = [cfg.sof_byte, 0x05, 0x00, 0x00, 0x22];
        let mut ready = false;
        for &b in &bytes {
            ready = dec.accept_byte(b, &cfg);
        }
        assert!(ready);
        assert_eq!(dec.frame_id(), 5);
    }
}
