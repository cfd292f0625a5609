//! Canonical serialization of relevant parameters
//!
//! Entries are sorted by key bytes at every nesting level and written with
//! length prefixes, so the output depends only on the key/value set and no
//! two different sets share an encoding:
//!
//! ```text
//! map   = "m" <entry count> ":" { <key len> ":" <key bytes> value }
//! value = "s" <byte len> ":" <bytes>     (scalar; bare names encode as "s0:")
//!       | map                            (nested)
//! ```

use crate::params::{ParameterMap, ParameterValue};

/// Serialize a parameter map into its canonical byte form.
#[must_use]
pub fn canonicalize(map: &ParameterMap) -> Vec<u8> {
    let mut out = Vec::new();
    write_map(map, &mut out);
    out
}

/// Entries of `map` in canonical (byte-wise key) order
#[must_use]
pub fn sorted_entries(map: &ParameterMap) -> Vec<(&String, &ParameterValue)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
    entries
}

fn write_map(map: &ParameterMap, out: &mut Vec<u8>) {
    out.push(b'm');
    write_len(map.len(), out);
    for (key, value) in sorted_entries(map) {
        write_len(key.len(), out);
        out.extend_from_slice(key.as_bytes());
        write_value(value, out);
    }
}

fn write_value(value: &ParameterValue, out: &mut Vec<u8>) {
    match value {
        ParameterValue::Nested(children) => write_map(children, out),
        ParameterValue::Bare | ParameterValue::Text(_) => {
            let text = value.as_text().unwrap_or_default();
            out.push(b's');
            write_len(text.len(), out);
            out.extend_from_slice(text.as_bytes());
        }
    }
}

fn write_len(len: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(len.to_string().as_bytes());
    out.push(b':');
}
