//! Recipient manifest codec.
//!
//! A manifest is plain UTF-8 text with one recipient id per line. Blank lines
//! and lines starting with `#` are ignored, surrounding whitespace is trimmed,
//! and repeated ids collapse to their first occurrence. Decoding never fails:
//! anything that is not a comment is taken literally as an id.

use std::collections::HashSet;

use crate::core::types::RecipientId;

/// Parse manifest contents into an ordered, duplicate-free id list.
pub fn decode(bytes: &[u8]) -> Vec<RecipientId> {
    let text = String::from_utf8_lossy(bytes);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for line in text.lines() {
        let id = line.trim();
        if id.is_empty() || id.starts_with('#') {
            continue;
        }
        if seen.insert(id.to_string()) {
            ids.push(id.to_string());
        }
    }

    ids
}

/// Serialize ids, one per line, each terminated by `\n`.
pub fn encode(ids: &[RecipientId]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ids.iter().map(|id| id.len() + 1).sum());
    for id in ids {
        out.extend_from_slice(id.as_bytes());
        out.push(b'\n');
    }
    out
}

/// Drop repeated ids, keeping the first occurrence of each.
pub fn dedup(ids: &[RecipientId]) -> Vec<RecipientId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
