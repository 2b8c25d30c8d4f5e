// SPDX-License-Identifier: MIT
//
// Frame serialization: header assembly, checksum computation, and payload
// framing. The mirror image of `decoder.rs`'s state machine, but encoding
// is simple enough to do in one pass rather than byte-at-a-time.

use crate::checksum::ChecksumKind;
use crate::config::{Config, Width};
use crate::error::{Error, Result};

fn write_be(dst: &mut [u8], width: Width, value: u32) {
    let bytes = value.to_be_bytes();
    let start = 4 - width.bytes();
    dst[..width.bytes()].copy_from_slice(&bytes[start..]);
}

/// Serialize one frame into `out`, returning the number of bytes written.
///
/// `frame_id` must already carry the peer bit if one is wanted; this
/// function does not set it itself (see `Endpoint::next_frame_id`).
pub(crate) fn encode_frame(
    cfg: &Config,
    frame_id: u32,
    msg_type: u32,
    payload: &[u8],
    out: &mut [u8],
) -> Result<usize> {
    if payload.len() > cfg.max_payload_tx {
        return Err(Error::Capacity { len: payload.len(), max: cfg.max_payload_tx });
    }

    let header_len = usize::from(cfg.use_sof)
        + cfg.id_width.bytes()
        + cfg.len_width.bytes()
        + cfg.type_width.bytes();
    let head_cksum_len = cfg.checksum.width();
    let payload_cksum_len = if payload.is_empty() { 0 } else { cfg.checksum.width() };
    let total = header_len + head_cksum_len + payload.len() + payload_cksum_len;

    if out.len() < total {
        return Err(Error::Capacity { len: total, max: out.len() });
    }

    let mut pos = 0;
    let head_start;
    if cfg.use_sof {
        out[pos] = cfg.sof_byte;
        head_start = pos;
        pos += 1;
    } else {
        head_start = pos;
    }

    write_be(&mut out[pos..], cfg.id_width, frame_id);
    pos += cfg.id_width.bytes();

    write_be(&mut out[pos..], cfg.len_width, payload.len() as u32);
    pos += cfg.len_width.bytes();

    write_be(&mut out[pos..], cfg.type_width, msg_type);
    pos += cfg.type_width.bytes();

    if cfg.checksum != ChecksumKind::None {
        let head_cksum = cfg.checksum.of(&out[head_start..pos]);
        write_be(&mut out[pos..], head_cksum_width(cfg.checksum), head_cksum);
        pos += head_cksum_len;
    }

    out[pos..pos + payload.len()].copy_from_slice(payload);
    pos += payload.len();

    if !payload.is_empty() && cfg.checksum != ChecksumKind::None {
        let payload_cksum = cfg.checksum.of(payload);
        write_be(&mut out[pos..], head_cksum_width(cfg.checksum), payload_cksum);
        pos += payload_cksum_len;
    }

    Ok(pos)
}

/// `ChecksumKind::width()` returns a byte count; express it as the nearest
/// `Width` variant for reuse of `write_be`. Checksums are always 1, 2, or 4
/// bytes, so this always matches one of the three variants.
fn head_cksum_width(kind: ChecksumKind) -> Width {
    match kind.width() {
        1 => Width::One,
        2 => Width::Two,
        4 => Width::Four,
        _ => unreachable!("checksum widths are always 1, 2, or 4 bytes"),
    }
}
