// ezsign/src/protocol/tlv.rs

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Parse a `(tag u8, length u8, value[length])` record sequence.
///
/// Truncated trailing records are dropped; when a tag repeats, the last
/// occurrence wins.
pub fn parse_tlv(data: &[u8]) -> BTreeMap<u8, Vec<u8>> {
    let mut map = BTreeMap::new();
    let mut i = 0usize;
    while i < data.len() {
        let tag = data[i];
        i += 1;
        if i >= data.len() {
            break;
        }
        let len = data[i] as usize;
        i += 1;
        if i + len > data.len() {
            break;
        }
        map.insert(tag, data[i..i + len].to_vec());
        i += len;
    }
    map
}

/// Serialize a tag map back into a TLV record sequence.
///
/// Fails when a value exceeds the one-byte length field.
pub fn serialize_tlv(map: &BTreeMap<u8, Vec<u8>>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (&tag, value) in map {
        if value.len() > 255 {
            return Err(Error::InvalidLength {
                expected: 255,
                actual: value.len(),
            });
        }
        out.push(tag);
        out.push(value.len() as u8);
        out.extend_from_slice(value);
    }
    Ok(out)
}
