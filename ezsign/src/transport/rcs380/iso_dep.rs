// ezsign/src/transport/rcs380/iso_dep.rs

//! ISO 14443-4 (T=CL) half-duplex block protocol: I-block chaining in both
//! directions, R(ACK) handling, and S(WTX) timeout extension.

use crate::constants::ISO_DEP_MIU;
use crate::protocol::apdu::{parse_response_body, Apdu};
use crate::{Error, Result};

/// One raw exchange with the activated card (an I/R/S block each way).
pub trait RfExchange {
    /// Transmit `data` and return the card's reply within `timeout_ms`.
    fn exchange(&mut self, data: &[u8], timeout_ms: u64) -> Result<Vec<u8>>;
}

const IBLOCK_TIMEOUT_MS: u64 = 5000;

/// ISO-DEP link state: the alternating block number.
///
/// The parity persists across APDUs within one card activation and must be
/// reset whenever a new card is activated.
#[derive(Debug, Default)]
pub struct IsoDepLink {
    block_nr: u8,
}

impl IsoDepLink {
    /// Fresh link with block number 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the block number for a newly activated card.
    pub fn reset(&mut self) {
        self.block_nr = 0;
    }

    /// Current block number parity (0 or 1).
    pub fn block_nr(&self) -> u8 {
        self.block_nr
    }

    /// Send one APDU as a chain of I-blocks and reassemble the card's
    /// possibly chained reply into the response body.
    pub fn exchange_apdu<E: RfExchange>(&mut self, rf: &mut E, apdu: &Apdu) -> Result<Vec<u8>> {
        let bytes = apdu.to_bytes();

        let chunks: Vec<&[u8]> = bytes.chunks(ISO_DEP_MIU).collect();
        let last = chunks.len() - 1;

        let mut response = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let more = i < last;
            let pcb = if more { 0x12 } else { 0x02 } | (self.block_nr & 1);
            let mut iblock = Vec::with_capacity(1 + chunk.len());
            iblock.push(pcb);
            iblock.extend_from_slice(chunk);

            response = self.exchange_wtx(rf, &iblock, IBLOCK_TIMEOUT_MS)?;

            if more {
                let ack = response
                    .first()
                    .copied()
                    .ok_or_else(|| Error::Chaining("empty reply while chaining".into()))?;
                if ack & 0xF6 != 0xA2 {
                    return Err(Error::Chaining(format!(
                        "expected R(ACK), got pcb {:#04x}",
                        ack
                    )));
                }
                self.block_nr ^= 1;
            }
        }

        // The final I-block was accepted; advance parity for the next APDU
        self.block_nr ^= 1;

        if response.is_empty() {
            return Err(Error::Chaining("empty APDU response".into()));
        }

        // Reassemble: strip each PCB, acknowledge while the card chains
        let mut full = response[1..].to_vec();
        while response[0] & 0x10 != 0 {
            let ack = [0xA2 | (self.block_nr & 1)];
            response = self.exchange_wtx(rf, &ack, IBLOCK_TIMEOUT_MS)?;
            if response.is_empty() {
                break;
            }
            full.extend_from_slice(&response[1..]);
            self.block_nr ^= 1;
        }

        parse_response_body(apdu.ins, &full)
    }

    /// Perform one exchange, answering S(WTX) requests until a real block
    /// arrives. Each WTX stretches the next timeout to the requested
    /// number of seconds.
    fn exchange_wtx<E: RfExchange>(
        &mut self,
        rf: &mut E,
        data: &[u8],
        timeout_ms: u64,
    ) -> Result<Vec<u8>> {
        let mut response = rf.exchange(data, timeout_ms)?;
        while response.len() >= 2 && response[0] & 0xFE == 0xF2 {
            let wtxm = response[1];
            let extended_ms = u64::from(wtxm & 0x3F) * 1000;
            response = rf.exchange(&[0xF2, wtxm], extended_ms)?;
        }
        Ok(response)
    }
}
