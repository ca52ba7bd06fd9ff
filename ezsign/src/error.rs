// ezsign/src/error.rs

//! Error and result types shared by every layer of the driver.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// No RC-S380 (or other supported reader) on the bus.
    #[error("reader not found")]
    DeviceNotFound,

    /// The card-search window elapsed without activating a target.
    #[error("no card detected")]
    NoCard,

    /// USB-level failure from the rcs380 backend.
    #[cfg(feature = "rcs380")]
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),

    /// PC/SC stack failure from the pcsc backend.
    #[cfg(feature = "pcsc")]
    #[error("pcsc error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// A buffer was shorter than the format requires.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Frame length or data checksum did not verify.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },
    /// Malformed reader frame.
    #[error("frame format error: {0}")]
    FrameFormat(String),

    /// The reader answered with a different command code than expected.
    #[error("unexpected response code: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedResponse { expected: u8, actual: u8 },

    /// A Port-100 command was acknowledged with a non-zero status byte.
    #[error("{name} rejected by reader: status {status:#04x}")]
    CommandFailed { name: &'static str, status: u8 },

    /// InCommRF reported a non-zero 32-bit error word.
    #[error("rf communication error: {0:#010x}")]
    CommRf(u32),

    /// ISO 14443-3 activation or RATS failed.
    #[error("card activation failed: {0}")]
    Activation(String),

    /// ISO-DEP block exchange violated the chaining protocol.
    #[error("iso-dep protocol error: {0}")]
    Chaining(String),

    /// Card returned a status word other than 9000 on a strict command.
    #[error("APDU error: SW={sw1:02x}{sw2:02x}")]
    ApduStatus { sw1: u8, sw2: u8 },

    /// Device descriptor carried a color mode this driver does not know.
    #[error("unknown color mode {0:#04x}")]
    UnknownColorMode(u8),
    /// Device descriptor was missing or truncated.
    #[error("bad device descriptor: {0}")]
    DeviceDescriptor(String),

    /// LZO initialization or compression failure.
    #[error("lzo error: {0}")]
    Compression(String),

    /// Refresh polling exceeded the caller's deadline.
    #[error("screen refresh timed out")]
    RefreshTimeout,

    /// Operation requires a connected session.
    #[error("not connected to a card")]
    NotConnected,

    /// Generic timeout for transports without a finer-grained cause.
    #[error("operation timed out")]
    Timeout,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
