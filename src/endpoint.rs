// SPDX-License-Identifier: MIT
//
// The public entry point: ties the codec, parser, and listener tables
// together into one fixed-capacity, allocation-free peer. Capacities are
// const generics (ID_CAP/TYPE_CAP/GEN_CAP for the listener tables, RX_CAP/
// TX_CAP for the frame scratch buffers) rather than `Vec`s, in the spirit
// of the bounded ring used for the shared-memory transport this crate was
// ported from — here the bound is a frame count, not a byte count.

use crate::checksum::ChecksumKind;
use crate::config::{Config, Peer};
use crate::decoder::Decoder;
use crate::encoder::encode_frame;
use crate::error::{Error, Result};
use crate::listener::{find_free, find_slot, GenSlot, GenericToken, IdSlot, TypeSlot};
use crate::message::{Callback, Consumed, Message};

/// Where encoded bytes go. Implemented for `Vec<u8>` (append) and for any
/// `FnMut(&[u8])` closure, covering both "buffer it" and "write it to a
/// real transport" callers without pulling in `std::io`.
pub trait ByteSink {
    fn write(&mut self, bytes: &[u8]);
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl<F: FnMut(&[u8])> ByteSink for F {
    fn write(&mut self, bytes: &[u8]) {
        self(bytes)
    }
}

/// A framing peer: encodes and decodes frames and dispatches completed
/// inbound frames to registered listeners. Holds no heap allocations of
/// its own; every table and buffer is sized at compile time.
pub struct Endpoint<
    const RX_CAP: usize,
    const TX_CAP: usize,
    const ID_CAP: usize,
    const TYPE_CAP: usize,
    const GEN_CAP: usize,
> {
    cfg: Config,
    peer: Peer,
    decoder: Decoder<RX_CAP>,
    next_id: u32,
    next_token: u32,
    id_table: [Option<IdSlot>; ID_CAP],
    type_table: [Option<TypeSlot>; TYPE_CAP],
    gen_table: [Option<GenSlot>; GEN_CAP],
}

impl<const RX_CAP: usize, const TX_CAP: usize, const ID_CAP: usize, const TYPE_CAP: usize, const GEN_CAP: usize>
    Endpoint<RX_CAP, TX_CAP, ID_CAP, TYPE_CAP, GEN_CAP>
{
    pub fn new(cfg: Config, peer: Peer) -> Result<Self> {
        cfg.validate(RX_CAP, TX_CAP)?;
        Ok(Self {
            cfg,
            peer,
            decoder: Decoder::new(),
            next_id: 1,
            next_token: 0,
            id_table: std::array::from_fn(|_| None),
            type_table: std::array::from_fn(|_| None),
            gen_table: std::array::from_fn(|_| None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn peer(&self) -> Peer {
        self.peer
    }

    /// Discard any partially-received frame and return the parser to its
    /// initial state. Listener tables are untouched.
    pub fn reset_parser(&mut self) {
        self.decoder.reset();
    }

    /// Clear every listener table and the parser, and fix the peer bit
    /// used for subsequently-originated frames to `peer`. The frame_id
    /// counter also restarts from zero.
    pub fn reset(&mut self, peer: Peer) {
        self.peer = peer;
        self.next_id = 1;
        self.decoder.reset();
        self.id_table = std::array::from_fn(|_| None);
        self.type_table = std::array::from_fn(|_| None);
        self.gen_table = std::array::from_fn(|_| None);
    }

    /// Allocate the next numeric ID, skipping 0 (reserved as "unset") by
    /// wrapping back to 1 instead, per the peer bit / ID allocation rules.
    fn next_frame_id(&mut self) -> u32 {
        let mask = self.cfg.id_width.id_mask();
        let id = self.next_id;
        let mut next = (self.next_id.wrapping_add(1)) & mask;
        if next == 0 {
            next = 1;
        }
        self.next_id = next;
        let peer_bit = match self.peer {
            Peer::Master => self.cfg.id_width.peer_bit(),
            Peer::Slave => 0,
        };
        id | peer_bit
    }

    /// Encode and send a new frame, originating a fresh `frame_id`.
    /// Returns the `frame_id` used, so the caller can register a listener
    /// for the response separately (or use `send_with_listener`).
    pub fn send<S: ByteSink>(&mut self, sink: &mut S, msg_type: u32, payload: &[u8]) -> Result<u32> {
        let frame_id = self.next_frame_id();
        self.encode_and_write(sink, frame_id, msg_type, payload)?;
        Ok(frame_id)
    }

    /// Like `send`, but atomically registers a by-ID listener for the
    /// frame_id it originates, so no response can race the registration.
    pub fn send_with_listener<S: ByteSink>(
        &mut self,
        sink: &mut S,
        msg_type: u32,
        payload: &[u8],
        timeout_ticks: Option<u32>,
        callback: Callback,
    ) -> Result<u32> {
        let frame_id = self.next_frame_id();
        self.add_id_listener(frame_id, timeout_ticks, callback)?;
        if let Err(e) = self.encode_and_write(sink, frame_id, msg_type, payload) {
            let _ = self.remove_id_listener(frame_id);
            return Err(e);
        }
        Ok(frame_id)
    }

    /// Reply to `msg`, reusing its `frame_id` (peer bit included) so the
    /// original sender's by-ID listener, if any, matches the reply. If
    /// `renew` is set, the responder's own by-ID listener waiting on this
    /// same `frame_id` (if any) has its timeout reset to `timeout_initial`,
    /// mirroring the C ancestor's `TF_Respond(msg, renew)`.
    pub fn respond<S: ByteSink>(
        &mut self,
        sink: &mut S,
        msg: &Message<'_>,
        msg_type: u32,
        payload: &[u8],
        renew: bool,
    ) -> Result<()> {
        self.encode_and_write(sink, msg.frame_id, msg_type, payload)?;
        if renew {
            let _ = self.renew_id_listener(msg.frame_id);
        }
        Ok(())
    }

    fn encode_and_write<S: ByteSink>(&self, sink: &mut S, frame_id: u32, msg_type: u32, payload: &[u8]) -> Result<()> {
        let mut buf = [0u8; TX_CAP];
        let n = encode_frame(&self.cfg, frame_id, msg_type, payload, &mut buf)?;
        sink.write(&buf[..n]);
        Ok(())
    }

    pub fn add_id_listener(&mut self, frame_id: u32, timeout_ticks: Option<u32>, callback: Callback) -> Result<()> {
        if find_slot(&self.id_table, |s| s.id == frame_id).is_some() {
            return Err(Error::TableFull);
        }
        let idx = find_free(&self.id_table).ok_or(Error::TableFull)?;
        self.id_table[idx] = Some(IdSlot {
            id: frame_id,
            callback,
            timeout_remaining: timeout_ticks,
            timeout_initial: timeout_ticks,
        });
        Ok(())
    }

    pub fn remove_id_listener(&mut self, frame_id: u32) -> Result<()> {
        let idx = find_slot(&self.id_table, |s| s.id == frame_id).ok_or(Error::NotFound)?;
        self.id_table[idx] = None;
        Ok(())
    }

    /// Reset a by-ID listener's timeout to its original value, as if it
    /// had just been registered. Used to keep a slow multi-part exchange
    /// alive without re-registering.
    pub fn renew_id_listener(&mut self, frame_id: u32) -> Result<()> {
        let idx = find_slot(&self.id_table, |s| s.id == frame_id).ok_or(Error::NotFound)?;
        let slot = self.id_table[idx].as_mut().unwrap();
        slot.timeout_remaining = slot.timeout_initial;
        Ok(())
    }

    pub fn add_type_listener(&mut self, msg_type: u32, callback: Callback) -> Result<()> {
        let idx = find_free(&self.type_table).ok_or(Error::TableFull)?;
        self.type_table[idx] = Some(TypeSlot { msg_type, callback });
        Ok(())
    }

    pub fn remove_type_listener(&mut self, msg_type: u32) -> Result<()> {
        let idx = find_slot(&self.type_table, |s| s.msg_type == msg_type).ok_or(Error::NotFound)?;
        self.type_table[idx] = None;
        Ok(())
    }

    pub fn add_generic_listener(&mut self, callback: Callback) -> Result<GenericToken> {
        let idx = find_free(&self.gen_table).ok_or(Error::TableFull)?;
        let token = GenericToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.gen_table[idx] = Some(GenSlot { token, callback });
        Ok(token)
    }

    pub fn remove_generic_listener(&mut self, token: GenericToken) -> Result<()> {
        let idx = find_slot(&self.gen_table, |s| s.token == token).ok_or(Error::NotFound)?;
        self.gen_table[idx] = None;
        Ok(())
    }

    /// Feed one inbound byte to the parser, dispatching to listeners the
    /// instant a complete, checksum-verified frame is assembled.
    pub fn accept_byte(&mut self, byte: u8) {
        if self.decoder.accept_byte(byte, &self.cfg) {
            let frame_id = self.decoder.frame_id();
            let msg_type = self.decoder.msg_type();
            let received = self.decoder.payload();
            let len = received.len();
            let mut scratch = [0u8; RX_CAP];
            scratch[..len].copy_from_slice(received);
            self.dispatch(frame_id, msg_type, &scratch[..len]);
        }
    }

    /// Feed a batch of inbound bytes, e.g. a whole read() result.
    pub fn accept(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.accept_byte(b);
        }
    }

    /// Advance all timeouts (parser resync timeout and per-listener
    /// response timeouts) by one tick. The unit of a tick is up to the
    /// caller — typically one timer interrupt or one poll-loop iteration.
    pub fn tick(&mut self) {
        if self.decoder.tick(&self.cfg) {
            log::trace!("tinyframe: parser resync timeout, frame discarded");
        }
        for idx in 0..ID_CAP {
            let expired = match self.id_table[idx].as_mut() {
                Some(slot) => match slot.timeout_remaining.as_mut() {
                    Some(remaining) => {
                        *remaining = remaining.saturating_sub(1);
                        *remaining == 0
                    }
                    None => false,
                },
                None => false,
            };
            if expired {
                let frame_id = self.id_table[idx].as_ref().unwrap().id;
                let msg = Message::timeout(frame_id);
                if let Some(slot) = self.id_table[idx].as_mut() {
                    let _ = (slot.callback)(&msg);
                }
                self.id_table[idx] = None;
                log::debug!("tinyframe: id listener for frame_id {frame_id} timed out");
            }
        }
    }

    /// Dispatch a completed frame: by-ID first (response correlation),
    /// then by-type, then the generic fallback table in registration
    /// order. The first listener to return `Consumed::Yes` stops the
    /// search; by-ID and generic listeners are then removed.
    fn dispatch(&mut self, frame_id: u32, msg_type: u32, payload: &[u8]) {
        if let Some(idx) = find_slot(&self.id_table, |s| s.id == frame_id) {
            let msg = Message::new(frame_id, msg_type, payload, true);
            let consumed = (self.id_table[idx].as_mut().unwrap().callback)(&msg);
            if consumed == Consumed::Yes {
                self.id_table[idx] = None;
            } else {
                let slot = self.id_table[idx].as_mut().unwrap();
                slot.timeout_remaining = slot.timeout_initial;
            }
            return;
        }

        if let Some(idx) = find_slot(&self.type_table, |s| s.msg_type == msg_type) {
            let msg = Message::new(frame_id, msg_type, payload, false);
            let consumed = (self.type_table[idx].as_mut().unwrap().callback)(&msg);
            if consumed == Consumed::Yes {
                self.type_table[idx] = None;
            }
            return;
        }

        for idx in 0..GEN_CAP {
            if self.gen_table[idx].is_some() {
                let msg = Message::new(frame_id, msg_type, payload, false);
                let consumed = (self.gen_table[idx].as_mut().unwrap().callback)(&msg);
                if consumed == Consumed::Yes {
                    self.gen_table[idx] = None;
                    return;
                }
            }
        }

        log::trace!("tinyframe: frame_id {frame_id} type {msg_type} matched no listener");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn endpoint() -> Endpoint<64, 64, 4, 4, 2> {
        let cfg = Config::new(64, 64).checksum(ChecksumKind::Crc16);
        Endpoint::new(cfg, Peer::Master).unwrap()
    }

    #[test]
    fn send_then_accept_round_trips_to_generic_listener() {
        let mut tx = endpoint();
        let mut rx: Endpoint<64, 64, 4, 4, 2> = Endpoint::new(*tx.config(), Peer::Slave).unwrap();

        let received: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let received_clone = received.clone();
        rx.add_generic_listener(Box::new(move |msg| {
            received_clone.borrow_mut().extend_from_slice(msg.payload);
            Consumed::Yes
        }))
        .unwrap();

        let mut wire = Vec::new();
        tx.send(&mut wire, 0x10, b"hello").unwrap();
        rx.accept(&wire);

        assert_eq!(&*received.borrow(), b"hello");
    }

    #[test]
    fn respond_preserves_frame_id_for_id_listener_match() {
        let mut master = endpoint();
        let mut slave: Endpoint<64, 64, 4, 4, 2> = Endpoint::new(*master.config(), Peer::Slave).unwrap();

        let got_response = Rc::new(RefCell::new(false));
        let got_response_clone = got_response.clone();

        let mut wire_to_slave = Vec::new();
        let frame_id = master
            .send_with_listener(
                &mut wire_to_slave,
                0x01,
                b"ping",
                Some(5),
                Box::new(move |msg| {
                    *got_response_clone.borrow_mut() = msg.payload == b"pong";
                    Consumed::Yes
                }),
            )
            .unwrap();

        let request_seen = Rc::new(RefCell::new(None));
        let request_seen_clone = request_seen.clone();
        slave
            .add_type_listener(
                0x01,
                Box::new(move |msg| {
                    *request_seen_clone.borrow_mut() = Some((msg.frame_id, msg.payload.to_vec()));
                    Consumed::Yes
                }),
            )
            .unwrap();

        slave.accept(&wire_to_slave);
        let (seen_id, seen_payload) = request_seen.borrow_mut().take().unwrap();
        assert_eq!(seen_id, frame_id);
        assert_eq!(seen_payload, b"ping");

        let mut wire_to_master = Vec::new();
        let msg = Message::new(frame_id, 0x02, b"ping", false);
        slave.respond(&mut wire_to_master, &msg, 0x02, b"pong", false).unwrap();
        master.accept(&wire_to_master);

        assert!(*got_response.borrow());
    }

    #[test]
    fn id_listener_times_out_after_configured_ticks() {
        let mut ep = endpoint();
        let fired = Rc::new(RefCell::new(false));
        let fired_clone = fired.clone();
        ep.add_id_listener(
            0x55,
            Some(2),
            Box::new(move |msg| {
                assert!(msg.is_timeout());
                *fired_clone.borrow_mut() = true;
                Consumed::Yes
            }),
        )
        .unwrap();

        ep.tick();
        assert!(!*fired.borrow());
        ep.tick();
        assert!(*fired.borrow());
        assert_eq!(ep.remove_id_listener(0x55), Err(Error::NotFound));
    }

    #[test]
    fn table_full_is_reported() {
        let mut ep: Endpoint<64, 64, 1, 4, 4> = Endpoint::new(Config::new(64, 64), Peer::Master).unwrap();
        ep.add_id_listener(1, None, Box::new(|_| Consumed::No)).unwrap();
        let err = ep.add_id_listener(2, None, Box::new(|_| Consumed::No)).unwrap_err();
        assert_eq!(err, Error::TableFull);
    }

    #[test]
    fn add_id_listener_rejects_duplicate_id_even_with_free_slots() {
        let mut ep = endpoint();
        ep.add_id_listener(0x10, None, Box::new(|_| Consumed::No)).unwrap();
        let err = ep.add_id_listener(0x10, None, Box::new(|_| Consumed::No)).unwrap_err();
        assert_eq!(err, Error::TableFull);
    }

    #[test]
    fn respond_with_renew_resets_own_by_id_timeout() {
        // A by-ID listener on this endpoint tracks frame_id 5 with a
        // 3-tick timeout, independent of the reply it is about to send.
        let mut ep = endpoint();
        let fired = Rc::new(RefCell::new(false));
        let fired_clone = fired.clone();
        ep.add_id_listener(
            5,
            Some(3),
            Box::new(move |_| {
                *fired_clone.borrow_mut() = true;
                Consumed::Yes
            }),
        )
        .unwrap();

        ep.tick();
        ep.tick();
        assert!(!*fired.borrow()); // timeout_remaining is now 1

        let msg = Message::new(5, 0x01, b"req", false);
        let mut sink = Vec::new();
        ep.respond(&mut sink, &msg, 0x02, b"partial", true).unwrap();

        // renew=true reset timeout_remaining back to 3: two more ticks
        // must not fire it, a third must.
        ep.tick();
        assert!(!*fired.borrow());
        ep.tick();
        assert!(!*fired.borrow());
        ep.tick();
        assert!(*fired.borrow());
    }

    #[test]
    fn respond_without_renew_leaves_own_by_id_timeout_untouched() {
        let mut ep = endpoint();
        let fired = Rc::new(RefCell::new(false));
        let fired_clone = fired.clone();
        ep.add_id_listener(
            5,
            Some(3),
            Box::new(move |_| {
                *fired_clone.borrow_mut() = true;
                Consumed::Yes
            }),
        )
        .unwrap();

        ep.tick();
        ep.tick();
        assert!(!*fired.borrow()); // timeout_remaining is now 1

        let msg = Message::new(5, 0x01, b"req", false);
        let mut sink = Vec::new();
        ep.respond(&mut sink, &msg, 0x02, b"partial", false).unwrap();

        // Without renew, the next tick expires the untouched countdown.
        ep.tick();
        assert!(*fired.borrow());
    }
}
