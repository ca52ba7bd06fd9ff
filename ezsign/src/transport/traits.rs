// ezsign/src/transport/traits.rs

use crate::protocol::Apdu;
use crate::Result;

/// Transport trait abstracts card I/O away from the session logic.
///
/// A transport is owned by exactly one session; implementations release
/// their OS resources on [`close`](NfcTransport::close) and on drop.
pub trait NfcTransport {
    /// Open the reader and block until a card is activated.
    fn open(&mut self) -> Result<()>;

    /// Release the reader. Idempotent, best-effort.
    fn close(&mut self);

    /// Exchange one APDU and return the response body with the status word
    /// stripped. Non-9000 status words fail except on the refresh and poll
    /// instructions, which return the body unchanged.
    fn send_apdu(&mut self, apdu: &Apdu) -> Result<Vec<u8>>;
}
