// ezsign/src/transport/rcs380/usb.rs

use std::time::Duration;

use log::{debug, trace};
use rusb::{Context, DeviceHandle, Direction, TransferType, UsbContext};

use crate::constants::{RCS380_PRODUCT_ID, RCS380_VENDOR_ID};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

const BULK_TIMEOUT: Duration = Duration::from_secs(5);

/// Claimed USB connection to an RC-S380 with its two bulk endpoints.
pub struct UsbBus {
    handle: DeviceHandle<Context>,
    ep_in: u8,
    ep_out: u8,
    released: bool,
}

impl UsbBus {
    /// Open the first RC-S380 on the bus and claim interface 0.
    pub fn open() -> Result<Self> {
        let ctx = Context::new()?;
        let handle = ctx
            .open_device_with_vid_pid(RCS380_VENDOR_ID, RCS380_PRODUCT_ID)
            .ok_or(Error::DeviceNotFound)?;

        // The kernel may own the interface (HID or pn533 driver); detach is
        // best-effort and claim_interface reports the hard failure.
        if let Ok(true) = handle.kernel_driver_active(0) {
            let _ = handle.detach_kernel_driver(0);
        }
        handle.claim_interface(0)?;

        let config = handle.device().active_config_descriptor()?;
        let mut ep_in = None;
        let mut ep_out = None;
        for interface in config.interfaces() {
            for desc in interface.descriptors() {
                for ep in desc.endpoint_descriptors() {
                    if ep.transfer_type() != TransferType::Bulk {
                        continue;
                    }
                    if ep.direction() == Direction::In {
                        ep_in.get_or_insert(ep.address());
                    } else {
                        ep_out.get_or_insert(ep.address());
                    }
                }
            }
        }

        match (ep_in, ep_out) {
            (Some(ep_in), Some(ep_out)) => {
                debug!("RC-S380 endpoints IN={:#04x} OUT={:#04x}", ep_in, ep_out);
                Ok(Self {
                    handle,
                    ep_in,
                    ep_out,
                    released: false,
                })
            }
            _ => {
                let _ = handle.release_interface(0);
                Err(Error::DeviceNotFound)
            }
        }
    }

    /// Bulk-write one frame.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        trace!("usb out: {}", bytes_to_hex(data));
        self.handle.write_bulk(self.ep_out, data, BULK_TIMEOUT)?;
        Ok(())
    }

    /// Bulk-read up to one buffer of reader data within `timeout`.
    ///
    /// A timed-out read maps to [`Error::Timeout`] so callers can recover
    /// it locally; other USB failures pass through.
    pub fn read(&self, timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; 512];
        match self.handle.read_bulk(self.ep_in, &mut buf, timeout) {
            Ok(n) => {
                buf.truncate(n);
                trace!("usb in: {}", bytes_to_hex(&buf));
                Ok(buf)
            }
            Err(rusb::Error::Timeout) => Err(Error::Timeout),
            Err(e) => Err(e.into()),
        }
    }

    /// Release the interface and hand the device back to the kernel.
    /// Safe to call more than once.
    pub fn close(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // Interface first, then kernel driver; handle and context free on drop
        let _ = self.handle.release_interface(0);
        let _ = self.handle.attach_kernel_driver(0);
    }
}

impl Drop for UsbBus {
    fn drop(&mut self) {
        self.close();
    }
}
