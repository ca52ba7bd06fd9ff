// ezsign/src/protocol/apdu.rs

use crate::constants::{AUTH_CHALLENGE, INS_POLL, INS_REFRESH};
use crate::{Error, Result};

/// ISO 7816-4 short-form command APDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apdu {
    /// Class byte.
    pub cla: u8,
    /// Instruction byte.
    pub ins: u8,
    /// Parameter 1.
    pub p1: u8,
    /// Parameter 2.
    pub p2: u8,
    /// Command data field (Lc is emitted only when this is non-empty).
    pub data: Option<Vec<u8>>,
    /// Expected response length, 0..=256; 256 is wire-encoded as 0x00.
    pub le: Option<u16>,
}

impl Apdu {
    /// Authentication command carrying the fixed device-family challenge.
    pub fn auth() -> Self {
        Self {
            cla: 0x00,
            ins: 0x20,
            p1: 0x00,
            p2: 0x01,
            data: Some(AUTH_CHALLENGE.to_vec()),
            le: None,
        }
    }

    /// Device descriptor query.
    pub fn device_info() -> Self {
        Self {
            cla: 0x00,
            ins: 0xD1,
            p1: 0x00,
            p2: 0x00,
            data: None,
            le: Some(256),
        }
    }

    /// One image-data fragment. The last fragment of a block carries
    /// `p2 = 0x01`; `page` is 0 on every observed device.
    pub fn image_fragment(block_no: u8, frag_no: u8, data: &[u8], is_final: bool, page: u8) -> Self {
        let mut payload = Vec::with_capacity(2 + data.len());
        payload.push(block_no);
        payload.push(frag_no);
        payload.extend_from_slice(data);
        Self {
            cla: 0xF0,
            ins: 0xD3,
            p1: page,
            p2: if is_final { 0x01 } else { 0x00 },
            data: Some(payload),
            le: None,
        }
    }

    /// Screen refresh trigger.
    pub fn refresh() -> Self {
        Self {
            cla: 0xF0,
            ins: INS_REFRESH,
            p1: 0x85,
            p2: 0x80,
            data: None,
            le: Some(256),
        }
    }

    /// Refresh-status poll.
    pub fn poll() -> Self {
        Self {
            cla: 0xF0,
            ins: INS_POLL,
            p1: 0x00,
            p2: 0x00,
            data: None,
            le: Some(1),
        }
    }

    /// Encode to wire bytes: CLA INS P1 P2 [Lc data] [Le].
    pub fn to_bytes(&self) -> Vec<u8> {
        let data_len = self.data.as_ref().map_or(0, Vec::len);
        debug_assert!(data_len <= crate::constants::MAX_APDU_DATA_LEN);
        let mut out = Vec::with_capacity(4 + 1 + data_len + 1);
        out.push(self.cla);
        out.push(self.ins);
        out.push(self.p1);
        out.push(self.p2);
        if let Some(data) = &self.data {
            if !data.is_empty() {
                out.push(data.len() as u8);
                out.extend_from_slice(data);
            }
        }
        if let Some(le) = self.le {
            out.push(if le == 256 { 0x00 } else { le as u8 });
        }
        out
    }
}

/// Whether a poll response reports the panel refresh as finished.
pub fn is_refresh_complete(response: &[u8]) -> bool {
    matches!(response.first(), Some(0x00))
}

/// Split a reassembled card reply into body and status word.
///
/// A 9000 status returns the body. Refresh and poll are the two commands
/// the card answers with transient non-9000 words during a refresh cycle,
/// so for those the body comes back regardless of status (empty if the
/// reply was too short for a status word).
pub fn parse_response_body(ins: u8, raw: &[u8]) -> Result<Vec<u8>> {
    let tolerant = ins == INS_POLL || ins == INS_REFRESH;
    if raw.len() < 2 {
        if tolerant {
            return Ok(Vec::new());
        }
        return Err(Error::InvalidLength {
            expected: 2,
            actual: raw.len(),
        });
    }
    let sw1 = raw[raw.len() - 2];
    let sw2 = raw[raw.len() - 1];
    let body = raw[..raw.len() - 2].to_vec();
    if (sw1, sw2) != (0x90, 0x00) && !tolerant {
        return Err(Error::ApduStatus { sw1, sw2 });
    }
    Ok(body)
}
