//! Image resampling to the bead grid resolution.

use crate::pipeline::ALPHA_THRESHOLD;
use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Bin width used to merge near-identical colors in cartoon mode.
const CARTOON_BIN: u32 = 10;
/// A pixel whose channel sum is below this counts as dark (outline ink).
const DARK_SUM: u32 = 100;
/// Blocks with more than this share of dark pixels become solid black.
const DARK_FRACTION: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingMode {
    /// Plain bilinear resize of the whole image.
    #[default]
    Default,
    /// Rounded per-block mean.
    Average,
    /// Per-block mode color with outline preservation.
    Cartoon,
}

impl SamplingMode {
    pub const ALL: [SamplingMode; 3] = [
        SamplingMode::Default,
        SamplingMode::Average,
        SamplingMode::Cartoon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingMode::Default => "default",
            SamplingMode::Average => "average",
            SamplingMode::Cartoon => "cartoon",
        }
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(SamplingMode::Default),
            "average" => Ok(SamplingMode::Average),
            "cartoon" => Ok(SamplingMode::Cartoon),
            other => Err(format!(
                "unknown sampling mode '{}' (expected default, average or cartoon)",
                other
            )),
        }
    }
}

/// Resamples `image` to `cols` x `rows` and returns the RGBA bytes.
pub fn resample(image: &RgbaImage, cols: u32, rows: u32, mode: SamplingMode) -> Vec<u8> {
    match mode {
        SamplingMode::Default => {
            if image.dimensions() == (cols, rows) {
                image.as_raw().clone()
            } else {
                premultiplied_resize(image, cols, rows)
            }
        }
        SamplingMode::Average | SamplingMode::Cartoon => manual_downscale(image, cols, rows, mode),
    }
}

/// Bilinear resize in premultiplied alpha.
///
/// Filtering straight RGBA lets the color of fully transparent pixels
/// (usually black) leak into opaque edges.
fn premultiplied_resize(image: &RgbaImage, cols: u32, rows: u32) -> Vec<u8> {
    let premultiplied = Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        Rgba([
            r as f32 / 255.0 * alpha,
            g as f32 / 255.0 * alpha,
            b as f32 / 255.0 * alpha,
            alpha,
        ])
    });
    let resized = imageops::resize(&premultiplied, cols, rows, FilterType::Triangle);

    let to_byte = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    let mut out = Vec::with_capacity(cols as usize * rows as usize * 4);
    for px in resized.pixels() {
        let [r, g, b, a] = px.0;
        if a <= 0.0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
        } else {
            out.extend_from_slice(&[to_byte(r / a), to_byte(g / a), to_byte(b / a), to_byte(a)]);
        }
    }
    out
}

/// Source pixel span `[start, end)` covered by output index `i`.
///
/// A block narrower than one pixel samples the single pixel under its center.
fn block_span(i: u32, block: f64) -> (u32, u32) {
    let start = (i as f64 * block).floor() as u32;
    let end = ((i + 1) as f64 * block).floor() as u32;
    if end <= start {
        let center = ((i as f64 + 0.5) * block).floor() as u32;
        (center, center + 1)
    } else {
        (start, end)
    }
}

/// Block-based downscale for the `average` and `cartoon` modes.
///
/// `SamplingMode::Default` is treated as `average` here.
pub fn manual_downscale(image: &RgbaImage, cols: u32, rows: u32, mode: SamplingMode) -> Vec<u8> {
    let (w, h) = image.dimensions();
    let mut out = Vec::with_capacity(cols as usize * rows as usize * 4);
    let block_w = w as f64 / cols as f64;
    let block_h = h as f64 / rows as f64;

    for y in 0..rows {
        let (start_y, end_y) = block_span(y, block_h);
        for x in 0..cols {
            let (start_x, end_x) = block_span(x, block_w);
            let pixels = (start_y..end_y.min(h)).flat_map(|py| {
                (start_x..end_x.min(w)).map(move |px| image.get_pixel(px, py).0)
            });
            let rgba = match mode {
                SamplingMode::Cartoon => cartoon_block(pixels),
                SamplingMode::Average | SamplingMode::Default => average_block(pixels),
            };
            out.extend_from_slice(&rgba);
        }
    }
    out
}

const EMPTY_BLOCK: [u8; 4] = [255, 255, 255, 0];

fn average_block(pixels: impl Iterator<Item = [u8; 4]>) -> [u8; 4] {
    let mut sums = [0u64; 4];
    let mut total = 0u64;
    for px in pixels {
        for (sum, v) in sums.iter_mut().zip(px) {
            *sum += v as u64;
        }
        total += 1;
    }
    if total == 0 {
        return EMPTY_BLOCK;
    }
    sums.map(|sum| ((2 * sum + total) / (2 * total)) as u8)
}

fn cartoon_bin(c: u8) -> u32 {
    (c as u32 + CARTOON_BIN / 2) / CARTOON_BIN * CARTOON_BIN
}

fn cartoon_block(pixels: impl Iterator<Item = [u8; 4]>) -> [u8; 4] {
    let mut total = 0u64;
    let mut dark = 0u64;
    // Bins in first-seen order; ties on count go to the earliest bin.
    let mut bins: Vec<([u32; 3], u64)> = Vec::new();
    let mut bin_index: HashMap<[u32; 3], usize> = HashMap::new();

    for [r, g, b, a] in pixels {
        total += 1;
        if a < ALPHA_THRESHOLD {
            continue;
        }
        if (r as u32 + g as u32 + b as u32) < DARK_SUM {
            dark += 1;
        }
        let key = [cartoon_bin(r), cartoon_bin(g), cartoon_bin(b)];
        match bin_index.get(&key) {
            Some(&idx) => bins[idx].1 += 1,
            None => {
                bin_index.insert(key, bins.len());
                bins.push((key, 1));
            }
        }
    }

    if total == 0 {
        return EMPTY_BLOCK;
    }
    if dark as f64 / total as f64 > DARK_FRACTION {
        return [0, 0, 0, 255];
    }

    let mut best: Option<&([u32; 3], u64)> = None;
    for bin in &bins {
        if best.map_or(true, |b| bin.1 > b.1) {
            best = Some(bin);
        }
    }
    match best {
        Some(([r, g, b], _)) => [
            (*r).min(255) as u8,
            (*g).min(255) as u8,
            (*b).min(255) as u8,
            255,
        ],
        None => [255, 255, 255, 0],
    }
}
