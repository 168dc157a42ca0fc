//! Color primitives and perceptual color science.
//!
//! Conversions go device RGB -> CIE XYZ (0-100 scale) -> CIE LAB or OKLab.
//! LAB and OKLab values are carried in `palette` types, but the math is done
//! here with fixed constants so that distances are reproducible across
//! platforms and crate versions.

use palette::{white_point::D65, Lab, Oklab};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// CIE LAB under a D65 white point.
pub type LabColor = Lab<D65, f64>;

/// D65 reference white on the 0-100 XYZ scale.
pub const REF_WHITE: Xyz = Xyz {
    x: 95.047,
    y: 100.0,
    z: 108.883,
};

/// An sRGB color with 8-bit channels.
///
/// The canonical string form is the color key `rgb(r,g,b)` (no spaces),
/// which is also what serde reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Canonical `rgb(r,g,b)` key.
    pub fn key(&self) -> String {
        color_to_key(*self)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_array(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_xyz(&self) -> Xyz {
        rgb_to_xyz(*self)
    }

    pub fn to_lab(&self) -> LabColor {
        rgb_to_lab(*self)
    }

    pub fn to_oklab(&self) -> Oklab<f64> {
        rgb_to_oklab(*self)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Rgb::new(value[0], value[1], value[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized color: {0:?}")]
pub struct ParseColorError(pub String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s).ok_or_else(|| ParseColorError(s.to_string()))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// CIE XYZ tristimulus values on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub fn color_to_key(color: Rgb) -> String {
    color.to_string()
}

/// Inverse of [`color_to_key`]. Accepts only the functional `rgb(...)` form.
pub fn key_to_color(key: &str) -> Option<Rgb> {
    let caps = rgb_pattern()?.captures(key.trim())?;
    Some(Rgb::new(
        clamp_component(&caps[1]),
        clamp_component(&caps[2]),
        clamp_component(&caps[3]),
    ))
}

/// Parses `#RGB`, `#RRGGBB` or `rgb(r,g,b)` / `rgba(r,g,b,a)` input.
pub fn parse_color(input: &str) -> Option<Rgb> {
    let trimmed = input.trim();
    if let Some(caps) = hex_pattern()?.captures(trimmed) {
        let digits = &caps[1];
        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };
        let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
        let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
        let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
        return Some(Rgb::new(r, g, b));
    }
    key_to_color(trimmed)
}

fn clamp_component(digits: &str) -> u8 {
    digits.parse::<u32>().map(|v| v.min(255) as u8).unwrap_or(u8::MAX)
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::error!("Failed to compile color pattern {}: {}", pattern, e);
            None
        }
    }
}

fn rgb_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            compile_pattern(
                r"(?i)^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[\d.]+%?\s*)?\)$",
            )
        })
        .as_ref()
}

/// Hex colors must carry the leading `#`; bare words such as `bad` are not colors.
fn hex_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| compile_pattern(r"(?i)^#([0-9a-f]{6}|[0-9a-f]{3})$"))
        .as_ref()
}

fn degrees_to_radians(deg: f64) -> f64 {
    deg * (PI / 180.0)
}

fn srgb_to_linear(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

pub fn rgb_to_xyz(color: Rgb) -> Xyz {
    channels_to_xyz(color.r as f64, color.g as f64, color.b as f64)
}

/// RGB -> XYZ for fractional channel values (dithered pixels are not
/// integral).
pub fn channels_to_xyz(r: f64, g: f64, b: f64) -> Xyz {
    let r = srgb_to_linear(r / 255.0);
    let g = srgb_to_linear(g / 255.0);
    let b = srgb_to_linear(b / 255.0);

    Xyz {
        x: (r * 0.4124 + g * 0.3576 + b * 0.1805) * 100.0,
        y: (r * 0.2126 + g * 0.7152 + b * 0.0722) * 100.0,
        z: (r * 0.0193 + g * 0.1192 + b * 0.9505) * 100.0,
    }
}

fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

pub fn xyz_to_lab(xyz: Xyz) -> LabColor {
    let x = lab_f(xyz.x / REF_WHITE.x);
    let y = lab_f(xyz.y / REF_WHITE.y);
    let z = lab_f(xyz.z / REF_WHITE.z);

    Lab::new(116.0 * y - 16.0, 500.0 * (x - y), 200.0 * (y - z))
}

pub fn xyz_to_oklab(xyz: Xyz) -> Oklab<f64> {
    let x = xyz.x / 100.0;
    let y = xyz.y / 100.0;
    let z = xyz.z / 100.0;

    let long = 0.8189330101 * x + 0.3618667424 * y - 0.1288597137 * z;
    let medium = 0.0329845436 * x + 0.9293118715 * y + 0.0361456387 * z;
    let short = 0.0482003018 * x + 0.2643662700 * y + 0.6338517070 * z;

    let l_ = long.cbrt();
    let m_ = medium.cbrt();
    let s_ = short.cbrt();

    Oklab::new(
        0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_,
        1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_,
        0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_,
    )
}

pub fn rgb_to_lab(color: Rgb) -> LabColor {
    xyz_to_lab(rgb_to_xyz(color))
}

pub fn rgb_to_oklab(color: Rgb) -> Oklab<f64> {
    xyz_to_oklab(rgb_to_xyz(color))
}

pub fn euclidean_oklab(a: Oklab<f64>, b: Oklab<f64>) -> f64 {
    ((a.l - b.l).powi(2) + (a.a - b.a).powi(2) + (a.b - b.b).powi(2)).sqrt()
}

fn hue_degrees(b: f64, a_prime: f64) -> f64 {
    let h = b.atan2(a_prime) * 180.0 / PI;
    if h >= 0.0 {
        h
    } else {
        h + 360.0
    }
}

/// CIEDE2000 color difference with kL = kC = kH = 1.
///
/// When either primed chroma is zero the hue difference is taken as 0 and
/// the mean hue is the raw sum of both angles.
pub fn ciede2000(lab1: LabColor, lab2: LabColor) -> f64 {
    const K_L: f64 = 1.0;
    const K_C: f64 = 1.0;
    const K_H: f64 = 1.0;
    let pow25_7 = 25f64.powi(7);

    let (l1, a1, b1) = (lab1.l, lab1.a, lab1.b);
    let (l2, a2, b2) = (lab2.l, lab2.a, lab2.b);

    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let c_bar = (c1 + c2) / 2.0;

    let g = 0.5 * (1.0 - (c_bar.powi(7) / (c_bar.powi(7) + pow25_7)).sqrt());
    let a1_prime = a1 * (1.0 + g);
    let a2_prime = a2 * (1.0 + g);

    let c1_prime = (a1_prime * a1_prime + b1 * b1).sqrt();
    let c2_prime = (a2_prime * a2_prime + b2 * b2).sqrt();

    let h1 = hue_degrees(b1, a1_prime);
    let h2 = hue_degrees(b2, a2_prime);

    let dl_prime = l2 - l1;
    let dc_prime = c2_prime - c1_prime;

    let chroma_product = c1_prime * c2_prime;
    let dh_prime = if chroma_product == 0.0 {
        0.0
    } else if (h2 - h1).abs() <= 180.0 {
        h2 - h1
    } else if h2 - h1 > 180.0 {
        h2 - h1 - 360.0
    } else {
        h2 - h1 + 360.0
    };

    let dh_big = 2.0 * chroma_product.sqrt() * degrees_to_radians(dh_prime / 2.0).sin();

    let l_bar_prime = (l1 + l2) / 2.0;
    let c_bar_prime = (c1_prime + c2_prime) / 2.0;

    let h_bar_prime = if chroma_product == 0.0 {
        h1 + h2
    } else if (h1 - h2).abs() <= 180.0 {
        (h1 + h2) / 2.0
    } else if h1 + h2 < 360.0 {
        (h1 + h2 + 360.0) / 2.0
    } else {
        (h1 + h2 - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * degrees_to_radians(h_bar_prime - 30.0).cos()
        + 0.24 * degrees_to_radians(2.0 * h_bar_prime).cos()
        + 0.32 * degrees_to_radians(3.0 * h_bar_prime + 6.0).cos()
        - 0.20 * degrees_to_radians(4.0 * h_bar_prime - 63.0).cos();

    let d_theta = 30.0 * (-((h_bar_prime - 275.0) / 25.0).powi(2)).exp();
    let r_c = 2.0 * (c_bar_prime.powi(7) / (c_bar_prime.powi(7) + pow25_7)).sqrt();
    let l_offset = (l_bar_prime - 50.0).powi(2);
    let s_l = 1.0 + (0.015 * l_offset) / (20.0 + l_offset).sqrt();
    let s_c = 1.0 + 0.045 * c_bar_prime;
    let s_h = 1.0 + 0.015 * c_bar_prime * t;
    let r_t = -degrees_to_radians(2.0 * d_theta).sin() * r_c;

    let dl_term = dl_prime / (K_L * s_l);
    let dc_term = dc_prime / (K_C * s_c);
    let dh_term = dh_big / (K_H * s_h);

    (dl_term.powi(2) + dc_term.powi(2) + dh_term.powi(2) + r_t * dc_term * dh_term).sqrt()
}

/// Black or white ink for text drawn on top of `background` (YIQ luma).
pub fn contrast_text(background: Rgb) -> Rgb {
    let yiq = (background.r as u32 * 299 + background.g as u32 * 587 + background.b as u32 * 114)
        as f64
        / 1000.0;
    if yiq >= 128.0 {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::color_difference::Ciede2000;

    fn lab(l: f64, a: f64, b: f64) -> LabColor {
        Lab::new(l, a, b)
    }

    #[test]
    fn key_round_trips_for_every_gray_and_primary() {
        for v in 0..=255u8 {
            for color in [
                Rgb::new(v, v, v),
                Rgb::new(v, 0, 0),
                Rgb::new(0, v, 0),
                Rgb::new(0, 0, v),
                Rgb::new(v, 255 - v, v / 2),
            ] {
                assert_eq!(key_to_color(&color_to_key(color)), Some(color));
            }
        }
    }

    #[test]
    fn key_format_has_no_spaces() {
        assert_eq!(color_to_key(Rgb::new(10, 200, 3)), "rgb(10,200,3)");
    }

    #[test]
    fn parses_hex_and_functional_forms() {
        assert_eq!(parse_color("#FF8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(parse_color("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(parse_color("#f80"), Some(Rgb::new(255, 136, 0)));
        assert_eq!(parse_color("rgb( 1, 2 ,3 )"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_color("rgba(1,2,3,0.5)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_color("rgb(300,0,0)"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("rgb(1,2)"), None);
        assert_eq!(parse_color("bad"), None);
        assert_eq!(parse_color("facade"), None);
        assert_eq!(parse_color("FF8000"), None);
    }

    #[test]
    fn serde_uses_color_keys() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"rgb(1,2,3)\"");
        let parsed: Rgb = serde_json::from_str("\"#010203\"").unwrap();
        assert_eq!(parsed, Rgb::new(1, 2, 3));
        assert!(serde_json::from_str::<Rgb>("\"nope\"").is_err());
    }

    #[test]
    fn white_maps_to_reference_white() {
        let xyz = rgb_to_xyz(Rgb::WHITE);
        assert!((xyz.x - 95.05).abs() < 0.01);
        assert!((xyz.y - 100.0).abs() < 0.01);
        assert!((xyz.z - 108.9).abs() < 0.01);

        let lab = rgb_to_lab(Rgb::WHITE);
        assert!((lab.l - 100.0).abs() < 0.01);
        assert!(lab.a.abs() < 0.05);
        assert!(lab.b.abs() < 0.05);
    }

    #[test]
    fn black_is_origin_in_both_spaces() {
        let lab = rgb_to_lab(Rgb::BLACK);
        assert!(lab.l.abs() < 1e-9);
        let ok = rgb_to_oklab(Rgb::BLACK);
        assert!(ok.l.abs() < 1e-9);
    }

    #[test]
    fn oklab_white_is_unit_lightness() {
        let ok = rgb_to_oklab(Rgb::WHITE);
        assert!((ok.l - 1.0).abs() < 1e-3);
        assert!(ok.a.abs() < 1e-3);
        assert!(ok.b.abs() < 1e-3);
    }

    #[test]
    fn ciede2000_matches_sharma_reference_pairs() {
        let pairs = [
            (lab(50.0, 2.6772, -79.7751), lab(50.0, 0.0, -82.7485), 2.0425),
            (lab(50.0, 3.1571, -77.2803), lab(50.0, 0.0, -82.7485), 2.8615),
            (lab(50.0, 0.0, 0.0), lab(50.0, -1.0, 2.0), 2.3669),
            (
                lab(60.2574, -34.0099, 36.2677),
                lab(60.4626, -34.1751, 39.4387),
                1.2644,
            ),
        ];
        for (a, b, expected) in pairs {
            let de = ciede2000(a, b);
            assert!(
                (de - expected).abs() < 1e-4,
                "expected {expected}, got {de}"
            );
        }
    }

    #[test]
    fn ciede2000_is_symmetric() {
        let samples = [
            Rgb::new(0, 0, 0),
            Rgb::new(128, 128, 128),
            Rgb::new(255, 0, 0),
            Rgb::new(12, 200, 90),
            Rgb::new(250, 240, 10),
            Rgb::new(30, 40, 220),
            Rgb::new(200, 30, 190),
            Rgb::new(255, 255, 255),
        ];
        for a in samples {
            for b in samples {
                let ab = ciede2000(a.to_lab(), b.to_lab());
                let ba = ciede2000(b.to_lab(), a.to_lab());
                assert!((ab - ba).abs() < 1e-9, "{a} vs {b}: {ab} != {ba}");
            }
        }
    }

    #[test]
    fn ciede2000_agrees_with_palette_for_chromatic_pairs() {
        let pairs = [
            (lab(50.0, 2.5, 0.0), lab(73.0, 25.0, -18.0)),
            (lab(61.0, 40.0, 30.0), lab(58.0, 38.0, 40.0)),
            (lab(22.7233, 20.0904, -46.694), lab(23.0331, 14.973, -42.5619)),
        ];
        for (a, b) in pairs {
            let ours = ciede2000(a, b);
            let reference = a.difference(b);
            assert!(
                (ours - reference).abs() < 1e-3,
                "ours {ours} vs palette {reference}"
            );
        }
    }

    #[test]
    fn ciede2000_of_identical_colors_is_zero() {
        let gray = rgb_to_lab(Rgb::new(90, 90, 90));
        assert_eq!(ciede2000(gray, gray), 0.0);
    }

    #[test]
    fn contrast_ink_flips_on_luma() {
        assert_eq!(contrast_text(Rgb::WHITE), Rgb::BLACK);
        assert_eq!(contrast_text(Rgb::new(255, 255, 0)), Rgb::BLACK);
        assert_eq!(contrast_text(Rgb::BLACK), Rgb::WHITE);
        assert_eq!(contrast_text(Rgb::new(0, 0, 200)), Rgb::WHITE);
    }
}
