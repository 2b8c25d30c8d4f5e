// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Pure Rust implementation of a TinyFrame-style binary framing protocol:
// a compact, peer-to-peer frame codec and listener dispatcher for
// byte-oriented transports (UART, a pipe, a socket — anything that hands
// you bytes one at a time or in chunks). No heap growth after setup: every
// buffer and listener table is a fixed-size array sized by const generics.
//
// Both ends of a link construct an `Endpoint` with an identical `Config`
// and opposite `Peer`, feed inbound bytes to `accept`/`accept_byte`, and
// send frames with `send`/`send_with_listener`/`respond`.

mod checksum;
mod config;
mod decoder;
mod encoder;
mod endpoint;
mod error;
mod listener;
mod message;

pub use checksum::ChecksumKind;
pub use config::{Config, Peer, Width};
pub use endpoint::{ByteSink, Endpoint};
pub use error::{Error, Result};
pub use listener::GenericToken;
pub use message::{Callback, Consumed, Message};
