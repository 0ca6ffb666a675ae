//! Mint targets and their canonical inscription payload.

use serde::Serialize;

use crate::config::MintTargetConfig;
use crate::inscription::envelope;
use crate::inscription::{InscriptionError, InscriptionResult, CONTENT_TYPE, PROTOCOL};

/// Longest tick accepted.
pub const MAX_TICK_LEN: usize = 5;

/// One inscription request: `batch` mints of `amount` units of `tick`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MintTarget {
    pub tick: String,
    pub amount: u64,
    pub batch: u32,
}

impl MintTarget {
    pub fn new(tick: impl Into<String>, amount: u64, batch: u32) -> Self {
        Self {
            tick: tick.into(),
            amount,
            batch,
        }
    }

    /// Check tick, amount and batch constraints.
    pub fn validate(&self) -> InscriptionResult<()> {
        let tick_len = self.tick.chars().count();
        if tick_len == 0 || tick_len > MAX_TICK_LEN {
            return Err(InscriptionError::InvalidTarget(format!(
                "tick '{}' must be 1-{} characters",
                self.tick, MAX_TICK_LEN
            )));
        }
        if !self.tick.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InscriptionError::InvalidTarget(format!(
                "tick '{}' must be ASCII alphanumeric",
                self.tick
            )));
        }
        if self.amount == 0 {
            return Err(InscriptionError::InvalidTarget(format!(
                "amount for tick '{}' must be positive",
                self.tick
            )));
        }
        if self.batch == 0 {
            return Err(InscriptionError::InvalidTarget(format!(
                "batch for tick '{}' must be at least 1",
                self.tick
            )));
        }
        Ok(())
    }
}

impl From<&MintTargetConfig> for MintTarget {
    fn from(config: &MintTargetConfig) -> Self {
        Self::new(config.tick.clone(), config.amount, config.batch)
    }
}

/// Canonical bytes of a mint inscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InscriptionPayload {
    body: Vec<u8>,
    script: Vec<u8>,
}

impl InscriptionPayload {
    /// JSON body carried by the envelope.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Envelope script bytes, ready to embed.
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Envelope size in bytes.
    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

// Field order is the wire order.
#[derive(Serialize)]
struct MintBody<'a> {
    p: &'a str,
    op: &'a str,
    tick: &'a str,
    amt: String,
}

/// Build the payload for `target`, rejecting envelopes above `max_script_bytes`.
pub fn build(target: &MintTarget, max_script_bytes: usize) -> InscriptionResult<InscriptionPayload> {
    target.validate()?;

    let body = serde_json::to_vec(&MintBody {
        p: PROTOCOL,
        op: "mint",
        tick: &target.tick,
        amt: target.amount.to_string(),
    })
    .map_err(|e| InscriptionError::InvalidTarget(e.to_string()))?;

    let script = envelope::encode(CONTENT_TYPE, &body);
    if script.len() > max_script_bytes {
        return Err(InscriptionError::PayloadTooLarge {
            size: script.len(),
            limit: max_script_bytes,
        });
    }

    Ok(InscriptionPayload { body, script })
}

/// Whether `raw` (serialized transaction bytes) carries a mint body for `tick`.
///
/// Tick comparison is ASCII case-insensitive.
pub fn contains_mint_of(raw: &[u8], tick: &str) -> bool {
    let haystack = raw.to_ascii_lowercase();
    let protocol = format!("\"p\":\"{}\"", PROTOCOL).into_bytes();
    let tick_field = format!("\"tick\":\"{}\"", tick.to_ascii_lowercase()).into_bytes();
    contains(&haystack, &protocol) && contains(&haystack, &tick_field)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inscription::DEFAULT_MAX_SCRIPT_BYTES;

    #[test]
    fn test_body_is_canonical() {
        let target = MintTarget::new("ZORD", 1000, 1);
        let payload = build(&target, DEFAULT_MAX_SCRIPT_BYTES).unwrap();
        assert_eq!(
            payload.body(),
            br#"{"p":"zrc-20","op":"mint","tick":"ZORD","amt":"1000"}"#
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let target = MintTarget::new("ZERO", 42, 3);
        let first = build(&target, DEFAULT_MAX_SCRIPT_BYTES).unwrap();
        let second = build(&target.clone(), DEFAULT_MAX_SCRIPT_BYTES).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.script(), second.script());
    }

    #[test]
    fn test_batch_does_not_change_payload() {
        let a = build(&MintTarget::new("ZERO", 42, 1), DEFAULT_MAX_SCRIPT_BYTES).unwrap();
        let b = build(&MintTarget::new("ZERO", 42, 9), DEFAULT_MAX_SCRIPT_BYTES).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_targets() {
        for target in [
            MintTarget::new("", 1, 1),
            MintTarget::new("TOOLONG", 1, 1),
            MintTarget::new("Z RD", 1, 1),
            MintTarget::new("ZORD", 0, 1),
            MintTarget::new("ZORD", 1, 0),
        ] {
            let err = build(&target, DEFAULT_MAX_SCRIPT_BYTES).unwrap_err();
            assert!(matches!(err, InscriptionError::InvalidTarget(_)), "{:?}", target);
        }
    }

    #[test]
    fn test_payload_too_large() {
        let target = MintTarget::new("ZORD", u64::MAX, 1);
        let err = build(&target, 40).unwrap_err();
        assert!(matches!(err, InscriptionError::PayloadTooLarge { limit: 40, .. }));
    }

    #[test]
    fn test_contains_mint_of() {
        let payload = build(&MintTarget::new("ZORD", 5, 1), DEFAULT_MAX_SCRIPT_BYTES).unwrap();
        let mut raw = vec![0x04, 0x00, 0x00, 0x80];
        raw.extend_from_slice(payload.script());

        assert!(contains_mint_of(&raw, "ZORD"));
        assert!(contains_mint_of(&raw, "zord"));
        assert!(!contains_mint_of(&raw, "ZERO"));
        assert!(!contains_mint_of(b"\"tick\":\"zord\"", "ZORD"));
    }
}
