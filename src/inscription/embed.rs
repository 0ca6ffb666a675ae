//! Splice an envelope into a serialized transparent transaction.
//!
//! Handles pre-Overwinter (v1/v2), Overwinter/Sapling (v3/v4) and NU5 (v5)
//! layouts. Only the first input's scriptSig is touched; every byte outside it
//! is copied through unchanged.

use crate::inscription::{InscriptionError, InscriptionResult, MAX_STANDARD_SCRIPTSIG_BYTES};

const OVERWINTERED_FLAG: u32 = 1 << 31;

/// Prepend `envelope` to the scriptSig of input 0 of `tx_hex`.
///
/// Returns the new transaction hex.
pub fn embed_in_first_input(tx_hex: &str, envelope: &[u8]) -> InscriptionResult<String> {
    let tx = hex::decode(tx_hex.trim())
        .map_err(|e| InscriptionError::MalformedTransaction(format!("invalid hex: {}", e)))?;

    let mut cursor = Cursor::new(&tx);
    let header = cursor.read_u32_le()?;
    let overwintered = header & OVERWINTERED_FLAG != 0;
    let version = header & !OVERWINTERED_FLAG;
    if overwintered {
        // nVersionGroupId
        cursor.skip(4)?;
        if version >= 5 {
            // nConsensusBranchId, nLockTime, nExpiryHeight
            cursor.skip(12)?;
        }
    }

    let input_count = cursor.read_compact_size()?;
    if input_count == 0 {
        return Err(InscriptionError::MalformedTransaction(
            "transaction has no inputs".to_string(),
        ));
    }

    // prevout hash + index
    cursor.skip(36)?;
    let len_start = cursor.pos;
    let script_len = cursor.read_compact_size()? as usize;
    let script_start = cursor.pos;
    cursor.skip(script_len)?;
    let script_end = cursor.pos;

    let new_len = envelope.len() + script_len;
    if new_len > MAX_STANDARD_SCRIPTSIG_BYTES {
        return Err(InscriptionError::PayloadTooLarge {
            size: new_len,
            limit: MAX_STANDARD_SCRIPTSIG_BYTES,
        });
    }

    let mut out = Vec::with_capacity(tx.len() + envelope.len() + 8);
    out.extend_from_slice(&tx[..len_start]);
    write_compact_size(&mut out, new_len as u64);
    out.extend_from_slice(envelope);
    out.extend_from_slice(&tx[script_start..script_end]);
    out.extend_from_slice(&tx[script_end..]);

    Ok(hex::encode(out))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> InscriptionResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                InscriptionError::MalformedTransaction(format!(
                    "unexpected end of transaction at byte {}",
                    self.pos
                ))
            })?;
        let bytes = self.bytes;
        let slice = &bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> InscriptionResult<()> {
        self.take(n).map(|_| ())
    }

    fn read_u32_le(&mut self) -> InscriptionResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_compact_size(&mut self) -> InscriptionResult<u64> {
        let first = self.take(1)?[0];
        let value = match first {
            0xfd => {
                let b = self.take(2)?;
                u16::from_le_bytes([b[0], b[1]]) as u64
            }
            0xfe => self.read_u32_le()? as u64,
            0xff => {
                let b = self.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(b);
                u64::from_le_bytes(buf)
            }
            n => n as u64,
        };
        Ok(value)
    }
}

fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// v4 transaction with one input carrying `script_sig` and one output.
    fn v4_tx(script_sig: &[u8]) -> Vec<u8> {
        let mut tx = Vec::new();
        tx.extend_from_slice(&(4u32 | OVERWINTERED_FLAG).to_le_bytes());
        tx.extend_from_slice(&0x892f2085u32.to_le_bytes());
        tx.push(1);
        tx.extend_from_slice(&[0xab; 32]);
        tx.extend_from_slice(&0u32.to_le_bytes());
        write_compact_size(&mut tx, script_sig.len() as u64);
        tx.extend_from_slice(script_sig);
        tx.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        tx.push(1);
        tx.extend_from_slice(&1000u64.to_le_bytes());
        tx.extend_from_slice(&[0x19, 0x76, 0xa9]);
        tx
    }

    #[test]
    fn test_embed_v4() {
        let sig = [0x47u8; 20];
        let tx = v4_tx(&sig);
        let envelope = [0x03, b'o', b'r', b'd'];

        let out = hex::decode(embed_in_first_input(&hex::encode(&tx), &envelope).unwrap()).unwrap();
        assert_eq!(out, v4_tx(&[&envelope[..], &sig[..]].concat()));
    }

    #[test]
    fn test_embed_grows_compact_size() {
        let tx = v4_tx(&[]);
        let envelope = vec![0x51u8; 300];
        let out = hex::decode(embed_in_first_input(&hex::encode(&tx), &envelope).unwrap()).unwrap();
        assert_eq!(out.len(), tx.len() + 300 + 2);
        assert_eq!(out, v4_tx(&envelope));
    }

    #[test]
    fn test_embed_v5_skips_extra_header() {
        let mut tx = Vec::new();
        tx.extend_from_slice(&(5u32 | OVERWINTERED_FLAG).to_le_bytes());
        tx.extend_from_slice(&[0u8; 16]);
        tx.push(1);
        tx.extend_from_slice(&[0u8; 36]);
        tx.push(0);
        tx.extend_from_slice(&[0xff; 4]);

        let out = hex::decode(embed_in_first_input(&hex::encode(&tx), &[0x51]).unwrap()).unwrap();
        assert_eq!(out[4 + 16 + 1 + 36], 1);
        assert_eq!(out[4 + 16 + 1 + 37], 0x51);
    }

    #[test]
    fn test_rejects_truncated_and_empty() {
        assert!(matches!(
            embed_in_first_input("0400", &[0x51]),
            Err(InscriptionError::MalformedTransaction(_))
        ));

        let mut no_inputs = (1u32).to_le_bytes().to_vec();
        no_inputs.push(0);
        assert!(matches!(
            embed_in_first_input(&hex::encode(no_inputs), &[0x51]),
            Err(InscriptionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_rejects_oversize_script() {
        let tx = v4_tx(&[0u8; 200]);
        let envelope = vec![0u8; MAX_STANDARD_SCRIPTSIG_BYTES - 100];
        assert!(matches!(
            embed_in_first_input(&hex::encode(tx), &envelope),
            Err(InscriptionError::PayloadTooLarge { .. })
        ));
    }
}
