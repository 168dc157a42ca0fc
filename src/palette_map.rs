//! Palette constraint and nearest-color lookup.
//!
//! A freely quantized palette is snapped onto the beads a user can actually
//! buy, and every pixel is then matched against the resulting palette with
//! the selected perceptual metric.

use crate::catalog::{Brand, BrandColor, Catalog};
use crate::color::{
    channels_to_xyz, ciede2000, euclidean_oklab, parse_color, xyz_to_lab, xyz_to_oklab, LabColor,
    Rgb, Xyz,
};
use palette::Oklab;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Perceptual distance metric used for every nearest-color decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorMethod {
    #[default]
    #[serde(rename = "lab-ciede2000")]
    LabCiede2000,
    #[serde(rename = "oklab")]
    Oklab,
}

impl ColorMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMethod::LabCiede2000 => "lab-ciede2000",
            ColorMethod::Oklab => "oklab",
        }
    }

    /// Projects a color into the space this metric compares in.
    fn probe(&self, xyz: Xyz) -> Probe {
        match self {
            ColorMethod::LabCiede2000 => Probe::Lab(xyz_to_lab(xyz)),
            ColorMethod::Oklab => Probe::Oklab(xyz_to_oklab(xyz)),
        }
    }
}

impl fmt::Display for ColorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lab-ciede2000" | "ciede2000" | "lab" => Ok(ColorMethod::LabCiede2000),
            "oklab" => Ok(ColorMethod::Oklab),
            other => Err(format!(
                "unknown color method '{}' (expected lab-ciede2000 or oklab)",
                other
            )),
        }
    }
}

enum Probe {
    Lab(LabColor),
    Oklab(Oklab<f64>),
}

impl Probe {
    fn distance(&self, candidate: &CachedPaletteColor) -> f64 {
        match self {
            Probe::Lab(lab) => ciede2000(*lab, candidate.lab),
            Probe::Oklab(ok) => euclidean_oklab(*ok, candidate.oklab),
        }
    }
}

/// Palette entry with its perceptual projections precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedPaletteColor {
    pub rgb: Rgb,
    pub lab: LabColor,
    pub oklab: Oklab<f64>,
}

impl CachedPaletteColor {
    pub fn new(rgb: Rgb) -> Self {
        let xyz = rgb.to_xyz();
        Self {
            rgb,
            lab: xyz_to_lab(xyz),
            oklab: xyz_to_oklab(xyz),
        }
    }
}

/// Index of the closest candidate; the first of equal minima wins.
fn nearest_index<'a>(
    probe: &Probe,
    candidates: impl IntoIterator<Item = &'a CachedPaletteColor>,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.into_iter().enumerate() {
        let dist = probe.distance(candidate);
        if best.map_or(true, |(_, best_dist)| dist < best_dist) {
            best = Some((idx, dist));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Palette prepared for the per-pixel nearest-neighbor scan.
#[derive(Debug, Clone, Default)]
pub struct LookupPalette {
    colors: Vec<CachedPaletteColor>,
}

impl LookupPalette {
    pub fn new(colors: &[Rgb]) -> Self {
        Self {
            colors: create_lookup_palette(colors),
        }
    }

    pub fn colors(&self) -> &[CachedPaletteColor] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Closest palette color for fractional channel values.
    pub fn nearest(&self, r: f64, g: f64, b: f64, method: ColorMethod) -> Option<Rgb> {
        let probe = method.probe(channels_to_xyz(r, g, b));
        nearest_index(&probe, &self.colors).map(|idx| self.colors[idx].rgb)
    }
}

pub fn create_lookup_palette(colors: &[Rgb]) -> Vec<CachedPaletteColor> {
    colors.par_iter().map(|c| CachedPaletteColor::new(*c)).collect()
}

/// Catalog beads for the selected brands, minus excluded colors.
///
/// No brands means no catalog constraint, which is an empty result.
pub fn get_active_brand_palette(
    catalog: &Catalog,
    brands: &[Brand],
    excluded: &BTreeSet<Rgb>,
) -> Vec<BrandColor> {
    if brands.is_empty() {
        return Vec::new();
    }
    catalog
        .entries()
        .iter()
        .filter(|entry| brands.contains(&entry.brand))
        .filter(|entry| !excluded.contains(&entry.rgb))
        .cloned()
        .collect()
}

/// Replaces every palette color with its nearest catalog bead.
///
/// Several colors may collapse onto the same bead.
pub fn map_palette_to_brands(
    base: &[Rgb],
    candidates: &[BrandColor],
    method: ColorMethod,
) -> Vec<Rgb> {
    if candidates.is_empty() {
        return base.to_vec();
    }

    let candidate_cache: Vec<CachedPaletteColor> = candidates
        .par_iter()
        .map(|c| CachedPaletteColor::new(c.rgb))
        .collect();

    base.par_iter()
        .map(|target| {
            let probe = method.probe(target.to_xyz());
            nearest_index(&probe, &candidate_cache)
                .map(|idx| candidate_cache[idx].rgb)
                .unwrap_or(*target)
        })
        .collect()
}

/// Nearest catalog bead for a single user-supplied color string.
///
/// Returns `None` for `"transparent"`, unparseable input or no candidates.
pub fn find_closest_palette_color<'a>(
    color: &str,
    candidates: &'a [BrandColor],
    method: ColorMethod,
) -> Option<&'a BrandColor> {
    if color.trim().eq_ignore_ascii_case("transparent") {
        return None;
    }
    let target = parse_color(color)?;
    let probe = method.probe(target.to_xyz());
    let cache: Vec<CachedPaletteColor> = candidates
        .iter()
        .map(|c| CachedPaletteColor::new(c.rgb))
        .collect();
    nearest_index(&probe, &cache).map(|idx| &candidates[idx])
}
