//! Dithering: ordered threshold offsets and error diffusion kernels.
//!
//! Ordered methods only perturb the pixel being matched. Error diffusion
//! methods push the quantization error of each matched pixel onto opaque
//! neighbors that have not been visited yet in row-major order.

use crate::pipeline::ALPHA_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strength of the ordered-dither offset, in channel units.
pub const ORDERED_INTENSITY: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMethod {
    #[default]
    None,
    Bayer,
    BlueNoise,
    FloydSteinberg,
    Atkinson,
}

impl DitherMethod {
    pub const ALL: [DitherMethod; 5] = [
        DitherMethod::None,
        DitherMethod::Bayer,
        DitherMethod::BlueNoise,
        DitherMethod::FloydSteinberg,
        DitherMethod::Atkinson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DitherMethod::None => "none",
            DitherMethod::Bayer => "bayer",
            DitherMethod::BlueNoise => "blue-noise",
            DitherMethod::FloydSteinberg => "floyd-steinberg",
            DitherMethod::Atkinson => "atkinson",
        }
    }

    /// Offset added to every channel of pixel (x, y) before matching.
    ///
    /// Zero for methods without a threshold matrix.
    pub fn ordered_offset(&self, x: usize, y: usize) -> f64 {
        let factor = match self {
            DitherMethod::Bayer => (BAYER_8X8[y % 8][x % 8] as f64 - 32.0) / 64.0,
            DitherMethod::BlueNoise => (BLUE_NOISE_16X16[y % 16][x % 16] as f64 - 128.0) / 255.0,
            DitherMethod::None | DitherMethod::FloydSteinberg | DitherMethod::Atkinson => {
                return 0.0
            }
        };
        factor * ORDERED_INTENSITY
    }

    /// Diffusion kernel, for error diffusion methods only.
    pub fn kernel(&self) -> Option<&'static Kernel> {
        match self {
            DitherMethod::FloydSteinberg => Some(&FLOYD_STEINBERG),
            DitherMethod::Atkinson => Some(&ATKINSON),
            DitherMethod::None | DitherMethod::Bayer | DitherMethod::BlueNoise => None,
        }
    }
}

impl fmt::Display for DitherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DitherMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown dither method '{}' (expected none, bayer, blue-noise, floyd-steinberg or atkinson)",
                    s.trim()
                )
            })
    }
}

/// Standard recursive 8x8 Bayer threshold matrix, ranks 0..=63.
pub const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// 16x16 void-and-cluster blue-noise ranks, a permutation of 0..=255.
pub const BLUE_NOISE_16X16: [[u8; 16]; 16] = [
    [40, 14, 166, 89, 250, 111, 11, 120, 230, 143, 108, 238, 117, 47, 234, 177],
    [156, 70, 229, 49, 176, 194, 68, 203, 19, 178, 60, 74, 163, 204, 80, 96],
    [132, 213, 115, 4, 147, 36, 135, 157, 95, 252, 32, 217, 5, 141, 23, 224],
    [10, 55, 186, 98, 244, 216, 78, 227, 46, 125, 189, 151, 100, 245, 63, 184],
    [254, 152, 205, 126, 25, 58, 106, 173, 1, 210, 86, 114, 39, 197, 168, 110],
    [30, 75, 41, 85, 161, 200, 16, 236, 139, 66, 165, 241, 17, 130, 50, 91],
    [145, 174, 220, 240, 136, 182, 118, 88, 193, 26, 53, 181, 223, 72, 208, 231],
    [192, 20, 103, 12, 67, 48, 246, 37, 148, 219, 105, 81, 142, 158, 3, 119],
    [44, 131, 167, 228, 112, 155, 212, 73, 128, 251, 7, 122, 237, 33, 97, 249],
    [83, 207, 56, 90, 196, 31, 9, 99, 202, 172, 45, 187, 57, 201, 164, 64],
    [218, 150, 6, 253, 138, 179, 232, 162, 61, 18, 92, 153, 215, 13, 107, 180],
    [123, 35, 188, 71, 121, 51, 82, 109, 146, 225, 239, 116, 76, 134, 233, 24],
    [242, 94, 226, 171, 15, 214, 243, 34, 190, 69, 27, 175, 38, 195, 52, 144],
    [77, 113, 159, 43, 102, 133, 183, 2, 124, 209, 137, 101, 255, 87, 169, 0],
    [199, 59, 21, 235, 206, 62, 154, 93, 247, 54, 160, 8, 221, 65, 149, 211],
    [248, 127, 191, 140, 79, 29, 222, 170, 42, 84, 198, 22, 185, 129, 28, 104],
];

/// An error diffusion kernel.
///
/// Each neighbor at `(dx, dy)` receives `error * weight / divisor`. Entries
/// only reach pixels that come later in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub entries: &'static [(i32, i32, u8)],
    pub divisor: u8,
}

impl Kernel {
    /// Share of the error that is propagated at all.
    pub fn total_fraction(&self) -> f64 {
        let sum: u32 = self.entries.iter().map(|&(_, _, w)| w as u32).sum();
        sum as f64 / self.divisor as f64
    }
}

/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
};

/// Propagates 6/8 of the error; the remaining quarter is dropped.
///
/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: &[(1, 0, 1), (2, 0, 1), (-1, 1, 1), (0, 1, 1), (1, 1, 1), (0, 2, 1)],
    divisor: 8,
};

/// Spreads `error` (per RGB channel) from pixel (x, y) into `buffer`.
///
/// `buffer` is the RGBA working copy of the image, four floats per pixel.
/// Neighbors outside the image or below the alpha threshold are skipped.
pub fn diffuse(
    buffer: &mut [f32],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    error: [f64; 3],
    kernel: &Kernel,
) {
    for &(dx, dy, weight) in kernel.entries {
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
            continue;
        }
        let ni = (ny as usize * width + nx as usize) * 4;
        if buffer[ni + 3] < ALPHA_THRESHOLD as f32 {
            continue;
        }
        let factor = weight as f64 / kernel.divisor as f64;
        for (c, err) in error.iter().enumerate() {
            buffer[ni + c] = (buffer[ni + c] as f64 + err * factor) as f32;
        }
    }
}
