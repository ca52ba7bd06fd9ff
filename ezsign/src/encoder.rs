// ezsign/src/encoder.rs

//! Framebuffer encoding pipeline: rotate, bit-pack, split into blocks,
//! compress each block with LZO1X-1, and fragment into APDU payloads.

use minilzo_rs::LZO;

use crate::constants::MAX_FRAGMENT_DATA;
use crate::protocol::{Apdu, DeviceInfo};
use crate::types::PixelGrid;
use crate::{Error, Result};

/// Rotate a grid 90° clockwise: an `[H][W]` input becomes `[W][H]`.
pub fn rotate_cw90(pixels: &PixelGrid) -> PixelGrid {
    let h = pixels.len();
    let w = if h == 0 { 0 } else { pixels[0].len() };
    let mut rotated = vec![vec![0u8; h]; w];
    for (r, row) in rotated.iter_mut().enumerate() {
        for (c, out) in row.iter_mut().enumerate() {
            *out = pixels[h - 1 - c][r];
        }
    }
    rotated
}

/// Pack one row of palette indices into the device raster layout.
///
/// Byte order within the row is right-to-left: output byte 0 covers the
/// rightmost group of pixels. Within a byte, pixels are packed LSB-first,
/// `bits_per_pixel` bits each.
pub fn pack_row(pixels: &[u8], bits_per_pixel: usize) -> Vec<u8> {
    let ppb = 8 / bits_per_pixel;
    let bytes_per_row = pixels.len() / ppb;
    let mut row_bytes = vec![0u8; bytes_per_row];

    for (byte_idx, out) in row_bytes.iter_mut().enumerate() {
        let pixel_offset = (bytes_per_row - 1 - byte_idx) * ppb;
        let mut val = 0u8;
        for i in 0..ppb {
            val |= pixels[pixel_offset + i] << (i * bits_per_pixel);
        }
        *out = val;
    }

    row_bytes
}

/// Pack a whole frame, rows concatenated top to bottom.
pub fn pack_pixels(pixels: &PixelGrid, bits_per_pixel: usize) -> Vec<u8> {
    let mut result = Vec::new();
    for row in pixels {
        result.extend_from_slice(&pack_row(row, bits_per_pixel));
    }
    result
}

/// Slice the packed buffer into contiguous blocks of the given sizes.
pub fn split_blocks(packed: &[u8], block_sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut blocks = Vec::with_capacity(block_sizes.len());
    let mut offset = 0usize;
    for &size in block_sizes {
        let end = (offset + size).min(packed.len());
        blocks.push(packed[offset..end].to_vec());
        offset = end;
    }
    blocks
}

/// Compress one block with LZO1X-1.
pub fn compress_block(block: &[u8]) -> Result<Vec<u8>> {
    let mut lzo = LZO::init().map_err(|e| Error::Compression(format!("init failed: {:?}", e)))?;
    lzo.compress(block)
        .map_err(|e| Error::Compression(format!("compress failed: {:?}", e)))
}

/// Split a compressed block into fragments of at most 250 bytes.
pub fn make_fragments(compressed: &[u8]) -> Vec<Vec<u8>> {
    compressed
        .chunks(MAX_FRAGMENT_DATA)
        .map(<[u8]>::to_vec)
        .collect()
}

/// Encode a full image into APDU groups, one group per upload block.
///
/// Within each group the fragments are ordered and the last one carries
/// the final-fragment marker.
pub fn encode_image(pixels: &PixelGrid, info: &DeviceInfo) -> Result<Vec<Vec<Apdu>>> {
    let bpp = info.bits_per_pixel;

    // The 296×128 family stores its framebuffer rotated 90° CW
    let rotated;
    let effective = if info.rotated() {
        rotated = rotate_cw90(pixels);
        &rotated
    } else {
        pixels
    };

    let packed = pack_pixels(effective, bpp);
    let blocks = split_blocks(&packed, &info.block_sizes());

    let mut lzo = LZO::init().map_err(|e| Error::Compression(format!("init failed: {:?}", e)))?;

    let mut groups = Vec::with_capacity(blocks.len());
    for (block_no, block) in blocks.iter().enumerate() {
        let compressed = lzo
            .compress(block)
            .map_err(|e| Error::Compression(format!("compress failed: {:?}", e)))?;
        let fragments = make_fragments(&compressed);

        let mut group = Vec::with_capacity(fragments.len());
        for (frag_no, fragment) in fragments.iter().enumerate() {
            let is_final = frag_no == fragments.len() - 1;
            group.push(Apdu::image_fragment(
                block_no as u8,
                frag_no as u8,
                fragment,
                is_final,
                0,
            ));
        }
        groups.push(group);
    }

    Ok(groups)
}
