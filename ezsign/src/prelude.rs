// ezsign/src/prelude.rs

//! Convenience re-exports for the common driving path.

pub use crate::dither::{dither_atkinson, quantize, PALETTE_2, PALETTE_4};
pub use crate::encoder::encode_image;
pub use crate::protocol::{is_refresh_complete, Apdu, DeviceInfo};
pub use crate::session::{
    Connected, Disconnected, EzSignCard, DEFAULT_POLL_INTERVAL, DEFAULT_REFRESH_TIMEOUT,
};
pub use crate::transport::NfcTransport;
pub use crate::{solid_grid, Color, Error, PixelGrid, Result};
