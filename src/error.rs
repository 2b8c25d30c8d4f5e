// SPDX-License-Identifier: MIT
//
// Error type for the framing core. Stream-level conditions (checksum
// mismatch, implausible length, parser timeout) never reach this type —
// they are handled silently inside the decoder, per the self-healing
// contract described on `Endpoint`.

use thiserror::Error;

/// Errors returned directly to a caller of the framing core.
///
/// Stream-level resync conditions (bad checksum, truncated frame, parser
/// timeout) are deliberately absent from this enum: they never surface past
/// `Endpoint::accept`/`tick`, which silently drop the offending frame and
/// wait for the next valid one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Payload exceeds the configured maximum for the direction attempted.
    #[error("payload of {len} bytes exceeds the configured maximum of {max}")]
    Capacity { len: usize, max: usize },

    /// No free slot in the target listener table, or the key is already taken.
    #[error("listener table is full")]
    TableFull,

    /// Removal or renewal was requested for a key that has no live slot.
    #[error("no listener registered for that key")]
    NotFound,

    /// Construction-time configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;
