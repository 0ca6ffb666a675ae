//! Ord-style envelope serialization.
//!
//! Layout: `push("ord") OP_1 push(content_type) OP_0 push(chunk)...`

use crate::inscription::MAX_PUSH_BYTES;

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_1: u8 = 0x51;

/// Envelope marker.
pub const ORD_TAG: &[u8] = b"ord";

/// Append a minimally encoded data push.
///
/// Callers keep `data` within [`MAX_PUSH_BYTES`].
pub fn push_bytes(script: &mut Vec<u8>, data: &[u8]) {
    debug_assert!(data.len() <= MAX_PUSH_BYTES);
    match data.len() {
        0 => script.push(OP_0),
        len @ 1..=75 => script.push(len as u8),
        len @ 76..=255 => {
            script.push(OP_PUSHDATA1);
            script.push(len as u8);
        }
        len => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
}

/// Append a small integer opcode (`OP_0`, `OP_1`..`OP_16`).
pub fn push_small_int(script: &mut Vec<u8>, n: u8) {
    debug_assert!(n <= 16);
    if n == 0 {
        script.push(OP_0);
    } else {
        script.push(OP_1 + (n - 1));
    }
}

/// Serialize a complete envelope for `body`.
pub fn encode(content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(body.len() + content_type.len() + 16);
    push_bytes(&mut script, ORD_TAG);
    push_small_int(&mut script, 1);
    push_bytes(&mut script, content_type.as_bytes());
    push_small_int(&mut script, 0);
    for chunk in body.chunks(MAX_PUSH_BYTES) {
        push_bytes(&mut script, chunk);
    }
    script
}
