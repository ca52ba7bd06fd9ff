use ezsign::protocol::Apdu;
use ezsign::transport::rcs380::iso_dep::{IsoDepLink, RfExchange};
use ezsign::{Error, Result};

/// Card model good enough for parity bookkeeping: acknowledges chained
/// I-blocks and answers everything else with a 9000 status.
struct EchoCard {
    exchanges: Vec<Vec<u8>>,
}

impl EchoCard {
    fn new() -> Self {
        Self {
            exchanges: Vec::new(),
        }
    }
}

impl RfExchange for EchoCard {
    fn exchange(&mut self, data: &[u8], _timeout_ms: u64) -> Result<Vec<u8>> {
        self.exchanges.push(data.to_vec());
        let pcb = data[0];
        if pcb & 0x10 != 0 {
            // Chained I-block from the host: R(ACK) with its block number
            return Ok(vec![0xA2 | (pcb & 1)]);
        }
        // Final I-block: plain status reply mirroring the host parity
        Ok(vec![0x02 | (pcb & 1), 0x90, 0x00])
    }
}

#[test]
fn block_number_toggles_once_per_unchained_apdu() {
    let mut card = EchoCard::new();
    let mut link = IsoDepLink::new();

    for i in 0..6 {
        let before = link.block_nr();
        link.exchange_apdu(&mut card, &Apdu::poll()).unwrap();
        assert_eq!(link.block_nr(), before ^ 1, "apdu {}", i);
    }

    // Host parities on the wire alternate 0,1,0,1,...
    let parities: Vec<u8> = card.exchanges.iter().map(|b| b[0] & 1).collect();
    assert_eq!(parities, vec![0, 1, 0, 1, 0, 1]);
}

#[test]
fn outbound_chaining_alternates_parity_on_the_wire() {
    let mut card = EchoCard::new();
    let mut link = IsoDepLink::new();

    // Full-size fragment APDUs chain into two I-blocks each
    for _ in 0..3 {
        let apdu = Apdu::image_fragment(0, 0, &[0x77; 250], false, 0);
        link.exchange_apdu(&mut card, &apdu).unwrap();
    }

    // Every transmitted I-block must alternate its block number,
    // regardless of APDU boundaries
    let parities: Vec<u8> = card.exchanges.iter().map(|b| b[0] & 1).collect();
    let expected: Vec<u8> = (0..parities.len() as u8).map(|i| i & 1).collect();
    assert_eq!(parities, expected);
}

#[test]
fn reset_returns_parity_to_zero() {
    let mut card = EchoCard::new();
    let mut link = IsoDepLink::new();
    link.exchange_apdu(&mut card, &Apdu::poll()).unwrap();
    assert_eq!(link.block_nr(), 1);

    link.reset();
    assert_eq!(link.block_nr(), 0);
    link.exchange_apdu(&mut card, &Apdu::poll()).unwrap();
    assert_eq!(card.exchanges.last().unwrap()[0], 0x02);
}

/// Card that requests a WTX before every reply.
struct SlowCard {
    pending: Option<Vec<u8>>,
    wtx_seen: usize,
}

impl RfExchange for SlowCard {
    fn exchange(&mut self, data: &[u8], _timeout_ms: u64) -> Result<Vec<u8>> {
        if data[0] == 0xF2 {
            self.wtx_seen += 1;
            return Ok(self
                .pending
                .take()
                .ok_or_else(|| Error::Chaining("no pending reply".into()))?);
        }
        self.pending = Some(vec![0x02 | (data[0] & 1), 0x90, 0x00]);
        Ok(vec![0xF2, 0x05])
    }
}

#[test]
fn wtx_round_trips_do_not_disturb_parity() {
    let mut card = SlowCard {
        pending: None,
        wtx_seen: 0,
    };
    let mut link = IsoDepLink::new();

    link.exchange_apdu(&mut card, &Apdu::poll()).unwrap();
    assert_eq!(card.wtx_seen, 1);
    assert_eq!(link.block_nr(), 1);

    link.exchange_apdu(&mut card, &Apdu::poll()).unwrap();
    assert_eq!(card.wtx_seen, 2);
    assert_eq!(link.block_nr(), 0);
}
