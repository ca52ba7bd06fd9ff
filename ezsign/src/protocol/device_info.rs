// ezsign/src/protocol/device_info.rs

use crate::constants::MAX_BLOCK_SIZE;
use crate::protocol::tlv::parse_tlv;
use crate::{Error, Result};

/// Tag carrying panel geometry and color mode.
const TAG_PANEL: u8 = 0xA0;
/// Tag carrying the printable serial number.
const TAG_SERIAL: u8 = 0xC0;
/// Tag with undocumented content, retained for diagnostics.
const TAG_EXTRA: u8 = 0xC1;

/// Descriptor returned by the card at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Logical display width in pixels.
    pub width: usize,
    /// Logical display height in pixels.
    pub height: usize,
    /// Bits per pixel, 1 (2-color) or 2 (4-color).
    pub bits_per_pixel: usize,
    /// Advisory row grouping reported by the card; unused in upload math.
    pub rows_per_block: usize,
    /// Printable serial number, empty when the card omits the tag.
    pub serial_number: String,
    /// Opaque C1 tag content.
    pub c1: Vec<u8>,
    /// Raw descriptor bytes as received.
    pub raw: Vec<u8>,
}

impl DeviceInfo {
    /// Parse the TLV descriptor from a device-info response body.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let tlv = parse_tlv(data);

        let panel = tlv
            .get(&TAG_PANEL)
            .ok_or_else(|| Error::DeviceDescriptor("missing A0 tag".into()))?;
        if panel.len() < 7 {
            return Err(Error::DeviceDescriptor(format!(
                "A0 tag too short: {} bytes",
                panel.len()
            )));
        }

        let color_mode = panel[1];
        let bits_per_pixel = match color_mode {
            0x01 => 1,
            0x07 => 2,
            other => return Err(Error::UnknownColorMode(other)),
        };

        let rows_per_block = panel[2] as usize;
        // The height field counts raster bytes scaled by bpp, not pixels.
        let height_raw = ((panel[3] as usize) << 8) | panel[4] as usize;
        let width = ((panel[5] as usize) << 8) | panel[6] as usize;
        let height = height_raw / bits_per_pixel;

        let serial_number = tlv
            .get(&TAG_SERIAL)
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default();
        let c1 = tlv.get(&TAG_EXTRA).cloned().unwrap_or_default();

        Ok(Self {
            width,
            height,
            bits_per_pixel,
            rows_per_block,
            serial_number,
            c1,
            raw: data.to_vec(),
        })
    }

    /// Number of palette entries the panel can show.
    pub fn num_colors(&self) -> usize {
        1 << self.bits_per_pixel
    }

    /// Pixels packed into one framebuffer byte.
    pub fn pixels_per_byte(&self) -> usize {
        8 / self.bits_per_pixel
    }

    /// Packed bytes per logical row.
    pub fn bytes_per_row(&self) -> usize {
        self.width / self.pixels_per_byte()
    }

    /// Whether the framebuffer is stored rotated 90° relative to the
    /// physical display. The 296×128 panels are the rotated family.
    pub fn rotated(&self) -> bool {
        (self.width, self.height) == (296, 128)
    }

    /// Framebuffer width after rotation, if any.
    pub fn fb_width(&self) -> usize {
        if self.rotated() {
            self.height
        } else {
            self.width
        }
    }

    /// Framebuffer height after rotation, if any.
    pub fn fb_height(&self) -> usize {
        if self.rotated() {
            self.width
        } else {
            self.height
        }
    }

    /// Packed bytes per framebuffer row.
    pub fn fb_bytes_per_row(&self) -> usize {
        self.fb_width() / self.pixels_per_byte()
    }

    /// Total packed framebuffer size in bytes.
    pub fn fb_total_bytes(&self) -> usize {
        self.fb_bytes_per_row() * self.fb_height()
    }

    /// Upload block sizes: full 2000-byte chunks, final chunk holds the
    /// remainder.
    pub fn block_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::new();
        let mut total = self.fb_total_bytes();
        while total > 0 {
            let s = total.min(MAX_BLOCK_SIZE);
            sizes.push(s);
            total -= s;
        }
        sizes
    }

    /// Number of upload blocks.
    pub fn num_blocks(&self) -> usize {
        self.block_sizes().len()
    }
}
