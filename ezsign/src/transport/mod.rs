// ezsign/src/transport/mod.rs

//! Card transports and the build-time transport selection.

pub mod mock;
#[cfg(feature = "pcsc")]
pub mod pcsc;
#[cfg(feature = "rcs380")]
pub mod rcs380;
pub mod traits;

pub use traits::NfcTransport;

/// Build the transport selected at compile time. The rcs380 backend wins
/// when both backends are enabled.
#[cfg(feature = "rcs380")]
pub fn create_transport() -> Box<dyn NfcTransport> {
    Box::new(rcs380::Rcs380Transport::new())
}

#[cfg(all(feature = "pcsc", not(feature = "rcs380")))]
/// Build the transport selected at compile time.
pub fn create_transport() -> Box<dyn NfcTransport> {
    Box::new(pcsc::PcscTransport::new())
}
