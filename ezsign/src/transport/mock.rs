// ezsign/src/transport/mock.rs

use crate::protocol::Apdu;
use crate::transport::traits::NfcTransport;
use crate::{Error, Result};

/// Mock transport for unit tests. It records every APDU sent and replays
/// queued results in order; an exhausted queue yields `Timeout`.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Every APDU handed to `send_apdu`, in order.
    pub sent: Vec<Apdu>,
    /// Scripted results, consumed front to back.
    pub responses: Vec<Result<Vec<u8>>>,
    /// Whether `open` has been called.
    pub opened: bool,
    /// Number of `close` calls, for idempotence assertions.
    pub closes: usize,
}

impl MockTransport {
    /// Empty mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body.
    pub fn push_response(&mut self, resp: Vec<u8>) {
        self.responses.push(Ok(resp));
    }

    /// Queue a failure for the next exchange.
    pub fn push_error(&mut self, err: Error) {
        self.responses.push(Err(err));
    }
}

impl NfcTransport for MockTransport {
    fn open(&mut self) -> Result<()> {
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.closes += 1;
    }

    fn send_apdu(&mut self, apdu: &Apdu) -> Result<Vec<u8>> {
        self.sent.push(apdu.clone());
        if self.responses.is_empty() {
            Err(Error::Timeout)
        } else {
            self.responses.remove(0)
        }
    }
}
