// ezsign/src/lib.rs

//! ezsign
//!
//! Pure Rust driver for Santek EZ Sign NFC e-paper price tags.
//!
//! The crate covers the full path from an RGB buffer to glass: palette
//! quantization with Atkinson dithering, the device raster encoding with
//! per-block LZO1X-1 compression, the proprietary APDU protocol, and an
//! RC-S380 (NFC Port-100) transport speaking ISO-DEP over raw USB.
#![warn(missing_docs)]

pub mod constants;
pub mod dither;
pub mod encoder;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod session;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the types in `types` are available for consumers and for convenient
// `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
