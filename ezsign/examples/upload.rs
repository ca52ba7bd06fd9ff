//! NFC e-paper image uploader for Santek EZ Sign price tags.
//!
//! Usage:
//!   cargo run --example upload -- photo.png --dither atkinson
//!   cargo run --example upload -- --clear
//!   cargo run --example upload -- --info
//!
//! Set RUST_LOG=debug to watch the wire traffic.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use image::imageops::FilterType;

use ezsign::dither::{dither_atkinson, quantize, PALETTE_2, PALETTE_4};
use ezsign::session::{EzSignCard, DEFAULT_POLL_INTERVAL, DEFAULT_REFRESH_TIMEOUT};
use ezsign::{Color, PixelGrid};

/// NFC e-paper image uploader (Santek EZ Sign 2.9" 4-color)
#[derive(Parser)]
#[command(name = "upload")]
#[command(about = "Push an image to an EZ Sign NFC e-paper tag")]
struct Cli {
    /// Image file to display
    image: Option<PathBuf>,

    /// Background color behind transparency and letterboxing
    #[arg(long, value_enum, default_value_t = Bg::Black)]
    bg: Bg,

    /// Dithering algorithm
    #[arg(long, value_enum, default_value_t = DitherMode::Atkinson)]
    dither: DitherMode,

    /// Resize mode
    #[arg(long, value_enum, default_value_t = ResizeMode::Fit)]
    resize: ResizeMode,

    /// Clear the screen to white
    #[arg(long)]
    clear: bool,

    /// Display device information
    #[arg(long)]
    info: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Bg {
    Black,
    White,
    Yellow,
    Red,
}

impl Bg {
    fn color(self) -> Color {
        match self {
            Bg::Black => Color::BLACK,
            Bg::White => Color::WHITE,
            Bg::Yellow => Color::YELLOW,
            Bg::Red => Color::RED,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DitherMode {
    Atkinson,
    None,
}

#[derive(Clone, Copy, ValueEnum)]
enum ResizeMode {
    Fit,
    Cover,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let session = EzSignCard::new().connect().context("connecting to card")?;
    let info = session.device_info().clone();
    let (width, height) = (info.width, info.height);

    if cli.info {
        println!("Serial No:  {}", info.serial_number);
        println!("Screen:     {}x{}", width, height);
        println!("Colors:     {}", info.num_colors());
        println!("Bits/pixel: {}", info.bits_per_pixel);
        return Ok(());
    }

    let mut session = session;

    if cli.clear {
        println!("Clearing display...");
        session.clear()?;
        println!("Refreshing display...");
        session.refresh(DEFAULT_REFRESH_TIMEOUT, DEFAULT_POLL_INTERVAL)?;
        println!("Done!");
        return Ok(());
    }

    let Some(path) = cli.image else {
        bail!("please specify an image file");
    };

    println!("Loading: {}", path.display());
    let rgb = load_and_resize(&path, width, height, cli.bg.color(), cli.resize)?;

    let palette: &[Color] = if info.num_colors() == 2 {
        &PALETTE_2
    } else {
        &PALETTE_4
    };
    let pixels: PixelGrid = match cli.dither {
        DitherMode::Atkinson => dither_atkinson(&rgb, width, height, palette),
        DitherMode::None => quantize(&rgb, width, height, palette),
    };

    println!("Sending image...");
    session.send_image(&pixels)?;
    println!("Refreshing display...");
    session.refresh(DEFAULT_REFRESH_TIMEOUT, DEFAULT_POLL_INTERVAL)?;
    println!("Done!");
    Ok(())
}

/// Decode an image, scale it into the panel, and composite it onto the
/// background color. Returns a tightly packed RGB buffer of exactly
/// `target_w * target_h` pixels.
fn load_and_resize(
    path: &Path,
    target_w: usize,
    target_h: usize,
    bg: Color,
    mode: ResizeMode,
) -> Result<Vec<u8>> {
    let img = image::open(path).with_context(|| format!("loading {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (src_w, src_h) = rgba.dimensions();

    let (tw, th) = (target_w as f32, target_h as f32);
    let ratio = match mode {
        ResizeMode::Cover => f32::max(tw / src_w as f32, th / src_h as f32),
        ResizeMode::Fit => f32::min(tw / src_w as f32, th / src_h as f32),
    };
    let new_w = ((src_w as f32 * ratio).round() as u32).max(1);
    let new_h = ((src_h as f32 * ratio).round() as u32).max(1);
    let resized = image::imageops::resize(&rgba, new_w, new_h, FilterType::Triangle);

    // Canvas filled with the background color
    let mut out = vec![0u8; target_w * target_h * 3];
    for px in out.chunks_exact_mut(3) {
        px.copy_from_slice(&[bg.r, bg.g, bg.b]);
    }

    let blend = |dst: &mut [u8], src: &image::Rgba<u8>| {
        let a = src.0[3] as f32 / 255.0;
        for c in 0..3 {
            let bgc = [bg.r, bg.g, bg.b][c] as f32;
            dst[c] = (src.0[c] as f32 * a + bgc * (1.0 - a)) as u8;
        }
    };

    match mode {
        ResizeMode::Cover => {
            // Center crop
            let off_x = (new_w.saturating_sub(target_w as u32)) / 2;
            let off_y = (new_h.saturating_sub(target_h as u32)) / 2;
            for y in 0..target_h {
                for x in 0..target_w {
                    let sx = (x as u32 + off_x).min(new_w - 1);
                    let sy = (y as u32 + off_y).min(new_h - 1);
                    let dst = &mut out[(y * target_w + x) * 3..][..3];
                    blend(dst, resized.get_pixel(sx, sy));
                }
            }
        }
        ResizeMode::Fit => {
            // Center paste
            let off_x = (target_w - (new_w as usize).min(target_w)) / 2;
            let off_y = (target_h - (new_h as usize).min(target_h)) / 2;
            for y in 0..(new_h as usize).min(target_h) {
                for x in 0..(new_w as usize).min(target_w) {
                    let dst = &mut out[((y + off_y) * target_w + x + off_x) * 3..][..3];
                    blend(dst, resized.get_pixel(x as u32, y as u32));
                }
            }
        }
    }

    Ok(out)
}
