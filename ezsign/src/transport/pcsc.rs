// ezsign/src/transport/pcsc.rs

//! Thin transport over a host PC/SC stack, for readers whose kernel or
//! middleware already exposes ISO-DEP as `SCardTransmit`.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use pcsc::{Card, Context, Disposition, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};

use crate::protocol::apdu::{parse_response_body, Apdu};
use crate::transport::traits::NfcTransport;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

const CARD_WAIT: Duration = Duration::from_secs(20);
const CARD_WAIT_BACKOFF: Duration = Duration::from_millis(200);

/// PC/SC transport bound to the first available reader.
#[derive(Default)]
pub struct PcscTransport {
    card: Option<Card>,
}

impl PcscTransport {
    /// Transport with no card connection yet; `open` attaches one.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NfcTransport for PcscTransport {
    fn open(&mut self) -> Result<()> {
        let ctx = Context::establish(Scope::User)?;

        let mut readers_buf = [0u8; 2048];
        let mut readers = ctx.list_readers(&mut readers_buf)?;
        let reader = readers.next().ok_or(Error::DeviceNotFound)?;
        info!("using reader {:?}", reader);

        let deadline = Instant::now() + CARD_WAIT;
        loop {
            match ctx.connect(reader, ShareMode::Shared, Protocols::ANY) {
                Ok(card) => {
                    self.card = Some(card);
                    return Ok(());
                }
                Err(pcsc::Error::NoSmartcard) | Err(pcsc::Error::RemovedCard) => {
                    if Instant::now() >= deadline {
                        return Err(Error::NoCard);
                    }
                    thread::sleep(CARD_WAIT_BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn close(&mut self) {
        if let Some(card) = self.card.take() {
            let _ = card.disconnect(Disposition::ResetCard);
        }
    }

    fn send_apdu(&mut self, apdu: &Apdu) -> Result<Vec<u8>> {
        let card = self.card.as_ref().ok_or(Error::NotConnected)?;
        let tx = apdu.to_bytes();
        debug!("apdu out: {}", bytes_to_hex(&tx));
        let mut rx = [0u8; MAX_BUFFER_SIZE];
        let raw = card.transmit(&tx, &mut rx)?;
        debug!("apdu in: {}", bytes_to_hex(raw));
        parse_response_body(apdu.ins, raw)
    }
}

impl Drop for PcscTransport {
    fn drop(&mut self) {
        self.close();
    }
}
