// SPDX-License-Identifier: MIT
//
// Slot types for the three listener tables. The tables themselves are
// fixed-size `[Option<Slot>; N]` arrays living directly on `Endpoint`
// (see endpoint.rs) — this module only defines what goes in a slot.

use crate::message::Callback;

/// A slot in the by-ID table: matches exactly one inbound `frame_id`.
///
/// `timeout_remaining`/`timeout_initial` are `None` for a listener that
/// waits forever (removed only by consumption or explicit removal).
pub(crate) struct IdSlot {
    pub id: u32,
    pub callback: Callback,
    pub timeout_remaining: Option<u32>,
    pub timeout_initial: Option<u32>,
}

/// A slot in the by-type table: matches any frame with a given `msg_type`.
pub(crate) struct TypeSlot {
    pub msg_type: u32,
    pub callback: Callback,
}

/// A slot in the generic fallback table.
pub(crate) struct GenSlot {
    pub token: GenericToken,
    pub callback: Callback,
}

/// Opaque handle to a generic listener, returned by `add_generic_listener`
/// and required by `remove_generic_listener`.
///
/// The C ancestor identifies a generic listener by its function pointer;
/// Rust closures have no such stable identity, so this crate hands back a
/// small token instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericToken(pub(crate) u32);

/// Find the first live slot satisfying `pred`, returning its index.
pub(crate) fn find_slot<T>(table: &[Option<T>], pred: impl Fn(&T) -> bool) -> Option<usize> {
    table.iter().position(|slot| slot.as_ref().is_some_and(&pred))
}

/// Find the first empty slot, returning its index.
pub(crate) fn find_free<T>(table: &[Option<T>]) -> Option<usize> {
    table.iter().position(|slot| slot.is_none())
}
