// ezsign/src/dither.rs

//! Palette quantization and Atkinson error diffusion.
//!
//! Input is a tightly packed RGB buffer (`3 * width * height` bytes);
//! output is a [`PixelGrid`] of palette indices.

use crate::types::{Color, PixelGrid};

/// Palette of the 4-color panels. The index order is fixed by the device:
/// 0 black, 1 white, 2 yellow, 3 red.
pub const PALETTE_4: [Color; 4] = [Color::BLACK, Color::WHITE, Color::YELLOW, Color::RED];

/// Palette of the 2-color panels: 0 black, 1 white.
pub const PALETTE_2: [Color; 2] = [Color::BLACK, Color::WHITE];

/// Index of the palette entry nearest to (r, g, b) by squared Euclidean
/// distance. Ties go to the lowest index.
pub fn nearest_color(r: i32, g: i32, b: i32, palette: &[Color]) -> u8 {
    let mut best_idx = 0u8;
    let mut best_dist = i32::MAX;
    for (i, entry) in palette.iter().enumerate() {
        let dist = entry.distance_sq(r, g, b);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i as u8;
        }
    }
    best_idx
}

// Atkinson kernel: 1/8 of the error to each of six neighbors, 2/8 dropped.
const ATKINSON_OFFSETS: [(i32, i32); 6] = [(1, 0), (2, 0), (-1, 1), (0, 1), (1, 1), (0, 2)];

/// Quantize with Atkinson error diffusion.
pub fn dither_atkinson(rgb: &[u8], width: usize, height: usize, palette: &[Color]) -> PixelGrid {
    // Full-frame accumulators, one per channel, seeded with the source.
    let mut acc = [
        vec![vec![0f32; width]; height],
        vec![vec![0f32; width]; height],
        vec![vec![0f32; width]; height],
    ];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) * 3;
            for c in 0..3 {
                acc[c][y][x] = rgb[idx + c] as f32;
            }
        }
    }

    let mut result = vec![vec![0u8; width]; height];

    for y in 0..height {
        for x in 0..width {
            let r = (acc[0][y][x].round() as i32).clamp(0, 255);
            let g = (acc[1][y][x].round() as i32).clamp(0, 255);
            let b = (acc[2][y][x].round() as i32).clamp(0, 255);

            let idx = nearest_color(r, g, b, palette);
            result[y][x] = idx;

            let chosen = palette[idx as usize];
            let err = [
                (r - chosen.r as i32) as f32,
                (g - chosen.g as i32) as f32,
                (b - chosen.b as i32) as f32,
            ];

            for (dx, dy) in ATKINSON_OFFSETS {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || nx >= width as i32 || ny >= height as i32 {
                    continue;
                }
                for c in 0..3 {
                    acc[c][ny as usize][nx as usize] += err[c] / 8.0;
                }
            }
        }
    }

    result
}

/// Nearest-palette quantization with no diffusion.
pub fn quantize(rgb: &[u8], width: usize, height: usize, palette: &[Color]) -> PixelGrid {
    let mut result = vec![vec![0u8; width]; height];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) * 3;
            result[y][x] = nearest_color(
                rgb[idx] as i32,
                rgb[idx + 1] as i32,
                rgb[idx + 2] as i32,
                palette,
            );
        }
    }
    result
}
