#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use ezsign::dither::{dither_atkinson, nearest_color, quantize, PALETTE_2, PALETTE_4};
use ezsign::Color;

#[test]
fn pure_red_image_stays_pure_red() {
    let rgb = fixtures::solid_rgb(Color::RED, 4, 4);
    let grid = dither_atkinson(&rgb, 4, 4, &PALETTE_4);
    assert_eq!(grid, vec![vec![3u8; 4]; 4]);
}

#[test]
fn every_palette_color_survives_dithering_unchanged() {
    for (index, color) in PALETTE_4.iter().enumerate() {
        let rgb = fixtures::solid_rgb(*color, 6, 3);
        let grid = dither_atkinson(&rgb, 6, 3, &PALETTE_4);
        assert!(grid.iter().flatten().all(|&p| p as usize == index));
    }
}

#[test]
fn quantize_picks_nearest_entry_per_pixel() {
    // Dark gray goes black, light gray goes white
    let mut rgb = fixtures::solid_rgb(Color::new(40, 40, 40), 2, 1);
    rgb.extend_from_slice(&[220, 220, 220]);
    // Buffer now describes a 3×1 image
    let grid = quantize(&rgb, 3, 1, &PALETTE_4);
    assert_eq!(grid, vec![vec![0u8, 0, 1]]);
}

#[test]
fn nearest_color_prefers_lower_index_on_ties() {
    let palette = [Color::new(0, 0, 0), Color::new(100, 0, 0)];
    assert_eq!(nearest_color(50, 0, 0, &palette), 0);
}

#[test]
fn gray_field_dithers_to_a_checkered_mixture() {
    let rgb = fixtures::solid_rgb(Color::new(127, 127, 127), 16, 16);
    let grid = dither_atkinson(&rgb, 16, 16, &PALETTE_2);

    let whites: usize = grid.iter().flatten().filter(|&&p| p == 1).count();
    // Atkinson drops a quarter of the error, so the mixture is biased,
    // but both colors must appear in quantity
    assert!(whites > 32, "white count {}", whites);
    assert!(whites < 224, "white count {}", whites);
}

#[test]
fn error_diffusion_pushes_later_pixels_toward_black() {
    // A single row of 150-gray: the first pixel quantizes to white and
    // leaves negative error, which accumulates until a pixel flips black
    let rgb = fixtures::solid_rgb(Color::new(150, 150, 150), 12, 1);
    let grid = dither_atkinson(&rgb, 12, 1, &PALETTE_2);
    let row = &grid[0];
    assert_eq!(row[0], 1);
    assert!(row.contains(&0));
}

#[test]
fn dimensions_are_height_major() {
    let rgb = fixtures::solid_rgb(Color::WHITE, 5, 2);
    let grid = dither_atkinson(&rgb, 5, 2, &PALETTE_4);
    assert_eq!(grid.len(), 2);
    assert!(grid.iter().all(|row| row.len() == 5));
}
