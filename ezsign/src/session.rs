// ezsign/src/session.rs

//! Session orchestration: authenticate, probe the descriptor, stream the
//! framebuffer, trigger and await the refresh.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::encoder::encode_image;
use crate::protocol::{is_refresh_complete, Apdu, DeviceInfo};
use crate::transport::NfcTransport;
use crate::types::{solid_grid, PixelGrid};
use crate::{Error, Result};

/// Pause between consecutive image fragments; the tag needs a moment to
/// absorb each one.
pub const DEFAULT_FRAGMENT_DELAY: Duration = Duration::from_millis(10);
/// Default overall refresh deadline.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);
/// Default spacing between refresh polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Session state before a card is attached.
pub struct Disconnected;

/// Session state holding the descriptor of the activated card.
pub struct Connected {
    info: DeviceInfo,
}

/// Session with an EZ Sign tag.
///
/// The session owns its transport by value and advances from
/// [`Disconnected`] to [`Connected`] through [`connect`]; upload and
/// refresh are only callable on a connected session. Dropping the session
/// in any state releases the transport.
///
/// [`connect`]: EzSignCard::connect
pub struct EzSignCard<S = Disconnected> {
    transport: Box<dyn NfcTransport>,
    fragment_delay: Duration,
    state: S,
}

impl EzSignCard<Disconnected> {
    /// Session over the transport selected at build time.
    #[cfg(any(feature = "rcs380", feature = "pcsc"))]
    pub fn new() -> Self {
        Self::with_transport(crate::transport::create_transport())
    }

    /// Session over a caller-provided transport.
    pub fn with_transport(transport: Box<dyn NfcTransport>) -> Self {
        Self {
            transport,
            fragment_delay: DEFAULT_FRAGMENT_DELAY,
            state: Disconnected,
        }
    }

    /// Override the pause between consecutive image fragments.
    pub fn fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = delay;
        self
    }

    /// Open the transport, authenticate, and read the device descriptor.
    pub fn connect(mut self) -> Result<EzSignCard<Connected>> {
        self.transport.open()?;

        // The auth reply carries no information; a bad status word
        // surfaces from the transport.
        self.transport.send_apdu(&Apdu::auth())?;

        let raw = self.transport.send_apdu(&Apdu::device_info())?;
        let info = DeviceInfo::parse(&raw)?;
        info!(
            "card {} ({}x{}, {} colors)",
            info.serial_number,
            info.width,
            info.height,
            info.num_colors()
        );

        Ok(EzSignCard {
            transport: self.transport,
            fragment_delay: self.fragment_delay,
            state: Connected { info },
        })
    }
}

#[cfg(any(feature = "rcs380", feature = "pcsc"))]
impl Default for EzSignCard<Disconnected> {
    fn default() -> Self {
        Self::new()
    }
}

impl EzSignCard<Connected> {
    /// Descriptor of the connected card.
    pub fn device_info(&self) -> &DeviceInfo {
        &self.state.info
    }

    /// Encode and upload a full image.
    ///
    /// Fragments go out in strict encoder order: every fragment of block 0,
    /// then block 1, and so on. The panel shows the new image only after a
    /// subsequent [`refresh`](Self::refresh).
    pub fn send_image(&mut self, pixels: &PixelGrid) -> Result<()> {
        let groups = encode_image(pixels, &self.state.info)?;
        info!("sending image ({} blocks)", groups.len());

        for (block_no, group) in groups.iter().enumerate() {
            debug!(
                "block {}/{} ({} fragments)",
                block_no + 1,
                groups.len(),
                group.len()
            );
            for apdu in group {
                self.transport.send_apdu(apdu)?;
                thread::sleep(self.fragment_delay);
            }
        }
        Ok(())
    }

    /// Upload an all-white frame.
    pub fn clear(&mut self) -> Result<()> {
        let (width, height) = (self.state.info.width, self.state.info.height);
        self.send_image(&solid_grid(width, height, 1))
    }

    /// Trigger a panel refresh and poll until the card reports completion.
    ///
    /// The refresh response is discarded. Poll failures are swallowed and
    /// retried until `timeout` elapses; the panel routinely drops off the
    /// field while its supply capacitor drives the refresh.
    pub fn refresh(&mut self, timeout: Duration, interval: Duration) -> Result<()> {
        self.transport.send_apdu(&Apdu::refresh())?;

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match self.transport.send_apdu(&Apdu::poll()) {
                Ok(resp) if is_refresh_complete(&resp) => {
                    info!("refresh complete");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => debug!("poll failed, retrying: {}", e),
            }
            thread::sleep(interval);
        }
        Err(Error::RefreshTimeout)
    }

    /// Release the transport. Dropping the session has the same effect.
    pub fn close(mut self) {
        self.transport.close();
    }
}
