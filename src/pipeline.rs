//! Image to bead grid conversion.
//!
//! Pipeline:
//! 1. Derive the row count from the source aspect ratio
//! 2. Resample to the grid resolution
//! 3. Median-cut the opaque pixels into a palette
//! 4. Optionally snap the palette onto the selected bead catalogs
//! 5. Match every pixel to the palette, dithering on the way

use crate::catalog::{Brand, Catalog};
use crate::color::{parse_color, Rgb};
use crate::dither::{diffuse, DitherMethod};
use crate::downscale::{resample, SamplingMode};
use crate::error::{PatternError, Result};
use crate::palette_map::{get_active_brand_palette, map_palette_to_brands, ColorMethod, LookupPalette};
use crate::quantize::quantize;
use crate::raster::check_surface;
use image::RgbaImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

/// Pixels with alpha below this are transparent everywhere in the pipeline.
pub const ALPHA_THRESHOLD: u8 = 25;

/// Configuration for one pattern conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternConfig {
    /// Grid columns; rows follow from the image aspect ratio.
    pub target_width: u32,
    pub max_colors: usize,
    pub color_method: ColorMethod,
    pub dither_method: DitherMethod,
    pub sampling_mode: SamplingMode,
    /// Catalogs the palette is constrained to. Empty means unconstrained.
    pub brands: Vec<Brand>,
    /// Catalog colors that may not be used.
    pub excluded_colors: BTreeSet<Rgb>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            target_width: 40,
            max_colors: 24,
            color_method: ColorMethod::default(),
            dither_method: DitherMethod::default(),
            sampling_mode: SamplingMode::default(),
            brands: Vec::new(),
            excluded_colors: BTreeSet::new(),
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 {
            return Err(PatternError::InvalidConfig(
                "targetWidth must be at least 1".to_string(),
            ));
        }
        if self.max_colors == 0 {
            return Err(PatternError::InvalidConfig(
                "maxColors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// One grid cell: a bead color or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellColor {
    Transparent,
    Bead(Rgb),
}

impl CellColor {
    pub fn rgb(&self) -> Option<Rgb> {
        match self {
            CellColor::Transparent => None,
            CellColor::Bead(rgb) => Some(*rgb),
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, CellColor::Transparent)
    }
}

impl From<Rgb> for CellColor {
    fn from(rgb: Rgb) -> Self {
        CellColor::Bead(rgb)
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellColor::Transparent => f.write_str("transparent"),
            CellColor::Bead(rgb) => rgb.fmt(f),
        }
    }
}

impl FromStr for CellColor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("transparent") {
            return Ok(CellColor::Transparent);
        }
        parse_color(s)
            .map(CellColor::Bead)
            .ok_or_else(|| format!("Unrecognized cell color: {:?}", s))
    }
}

impl Serialize for CellColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A finished bead grid, row-major.
///
/// Deserialization goes through [`ProcessedData::new`], so a decoded grid
/// always has `rows * cols` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRecord")]
pub struct ProcessedData {
    pub colors: Vec<CellColor>,
    pub rows: u32,
    pub cols: u32,
}

#[derive(Deserialize)]
struct GridRecord {
    colors: Vec<CellColor>,
    rows: u32,
    cols: u32,
}

impl TryFrom<GridRecord> for ProcessedData {
    type Error = PatternError;

    fn try_from(record: GridRecord) -> Result<Self> {
        ProcessedData::new(record.colors, record.rows, record.cols)
    }
}

impl ProcessedData {
    pub fn new(colors: Vec<CellColor>, rows: u32, cols: u32) -> Result<Self> {
        let grid = Self { colors, rows, cols };
        grid.validate()?;
        Ok(grid)
    }

    /// Checks that the cell count matches the dimensions.
    ///
    /// The fields are public, so a grid built by hand can be inconsistent.
    pub fn validate(&self) -> Result<()> {
        let expected = self.rows as usize * self.cols as usize;
        if self.colors.len() != expected {
            return Err(PatternError::InvalidConfig(format!(
                "grid of {}x{} needs {} cells, got {}",
                self.cols,
                self.rows,
                expected,
                self.colors.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn index_of(&self, col: u32, row: u32) -> Option<usize> {
        (col < self.cols && row < self.rows).then(|| (row * self.cols + col) as usize)
    }

    pub fn cell(&self, col: u32, row: u32) -> Option<CellColor> {
        self.index_of(col, row)
            .and_then(|idx| self.colors.get(idx).copied())
    }

    /// Distinct bead colors in first-seen order.
    pub fn palette(&self) -> Vec<Rgb> {
        let mut seen = HashSet::new();
        self.colors
            .iter()
            .filter_map(CellColor::rgb)
            .filter(|rgb| seen.insert(*rgb))
            .collect()
    }
}

/// `round(cols * height / width)`, unclamped.
pub fn grid_rows(width: u32, height: u32, cols: u32) -> u64 {
    (cols as f64 * height as f64 / width as f64).round() as u64
}

pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(decoded.to_rgba8())
}

pub fn load_image(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

/// Decodes `bytes` and converts them with the built-in catalog.
pub fn process_image_bytes(bytes: &[u8], config: &PatternConfig) -> Result<ProcessedData> {
    log::info!(
        "Processing bead pattern: {} bytes, width {}, {} colors",
        bytes.len(),
        config.target_width,
        config.max_colors
    );
    let image = decode_image(bytes)?;
    sample_image_colors(&image, config)
}

/// Converts `image` into a bead grid using the built-in catalog.
pub fn sample_image_colors(image: &RgbaImage, config: &PatternConfig) -> Result<ProcessedData> {
    sample_image_colors_with_catalog(image, config, Catalog::global())
}

pub fn sample_image_colors_with_catalog(
    image: &RgbaImage,
    config: &PatternConfig,
    catalog: &Catalog,
) -> Result<ProcessedData> {
    let start = Instant::now();
    config.validate()?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PatternError::EmptyImage);
    }

    let cols = config.target_width;
    let rows = grid_rows(width, height, cols);
    if rows == 0 {
        return Err(PatternError::Surface {
            width: cols as u64,
            height: rows,
        });
    }
    check_surface(cols as u64, rows)?;
    let rows = rows as u32;

    let data = resample(image, cols, rows, config.sampling_mode);
    let opaque: Vec<Rgb> = data
        .chunks_exact(4)
        .filter(|px| px[3] >= ALPHA_THRESHOLD)
        .map(|px| Rgb::new(px[0], px[1], px[2]))
        .collect();

    let mut palette = quantize(&opaque, config.max_colors);
    log::debug!(
        "Median cut: {} opaque pixels -> {} colors",
        opaque.len(),
        palette.len()
    );

    let candidates = get_active_brand_palette(catalog, &config.brands, &config.excluded_colors);
    if !config.brands.is_empty() && candidates.is_empty() {
        let available = catalog_size(catalog, &config.brands);
        if available == 0 {
            log::warn!(
                "Catalog has no colors for brands {:?}; palette is left unconstrained",
                config.brands
            );
        } else {
            log::warn!(
                "All {} colors of brands {:?} are excluded; palette is left unconstrained",
                available,
                config.brands
            );
        }
    }
    if !candidates.is_empty() {
        let mapped = map_palette_to_brands(&palette, &candidates, config.color_method);
        let mut seen = HashSet::new();
        palette = mapped.into_iter().filter(|c| seen.insert(*c)).collect();
        log::debug!(
            "Catalog remap onto {} candidates: {} colors",
            candidates.len(),
            palette.len()
        );
    }

    let lookup = LookupPalette::new(&palette);
    let colors = map_pixels(
        &data,
        cols as usize,
        rows as usize,
        &lookup,
        config.color_method,
        config.dither_method,
    );

    log::info!(
        "Pattern sampled: {}x{} from {}x{}, {} colors, {} dither, {}ms",
        cols,
        rows,
        width,
        height,
        palette.len(),
        config.dither_method,
        start.elapsed().as_millis()
    );

    Ok(ProcessedData { colors, rows, cols })
}

/// Row-major nearest-color pass with ordered offsets or error diffusion.
fn catalog_size(catalog: &Catalog, brands: &[Brand]) -> usize {
    brands.iter().map(|&brand| catalog.brand_len(brand)).sum()
}

fn map_pixels(
    data: &[u8],
    width: usize,
    height: usize,
    lookup: &LookupPalette,
    method: ColorMethod,
    dither: DitherMethod,
) -> Vec<CellColor> {
    let mut work: Vec<f32> = data.iter().map(|&v| v as f32).collect();
    let kernel = dither.kernel();
    let mut colors = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) * 4;
            if work[i + 3] < ALPHA_THRESHOLD as f32 {
                colors.push(CellColor::Transparent);
                continue;
            }

            let offset = dither.ordered_offset(x, y);
            let old = [0, 1, 2].map(|c| (work[i + c] as f64 + offset).clamp(0.0, 255.0));

            let Some(new) = lookup.nearest(old[0], old[1], old[2], method) else {
                colors.push(CellColor::Transparent);
                continue;
            };
            colors.push(CellColor::Bead(new));

            if let Some(kernel) = kernel {
                let error = [
                    old[0] - new.r as f64,
                    old[1] - new.g as f64,
                    old[2] - new.b as f64,
                ];
                diffuse(&mut work, width, height, x, y, error, kernel);
            }
        }
    }

    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BrandColor;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    fn config(width: u32, max_colors: usize) -> PatternConfig {
        PatternConfig {
            target_width: width,
            max_colors,
            ..PatternConfig::default()
        }
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = PatternConfig::default();
        assert_eq!(config.target_width, 40);
        assert_eq!(config.max_colors, 24);
        assert_eq!(config.color_method, ColorMethod::LabCiede2000);
        assert_eq!(config.dither_method, DitherMethod::None);
        assert_eq!(config.sampling_mode, SamplingMode::Default);
        assert!(config.brands.is_empty());
    }

    #[test]
    fn config_reads_camel_case_json() {
        let config = PatternConfig::from_json(
            r##"{"targetWidth": 12, "ditherMethod": "atkinson", "brands": ["mard"],
                "excludedColors": ["#000000", "rgb(255,255,255)"]}"##,
        )
        .unwrap();
        assert_eq!(config.target_width, 12);
        assert_eq!(config.max_colors, 24);
        assert_eq!(config.dither_method, DitherMethod::Atkinson);
        assert_eq!(config.brands, vec![Brand::Mard]);
        assert!(config.excluded_colors.contains(&Rgb::BLACK));
        assert!(config.excluded_colors.contains(&Rgb::WHITE));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let img = solid(4, 4, [1, 2, 3, 255]);
        assert!(matches!(
            sample_image_colors(&img, &config(0, 4)),
            Err(PatternError::InvalidConfig(_))
        ));
        assert!(matches!(
            sample_image_colors(&img, &config(4, 0)),
            Err(PatternError::InvalidConfig(_))
        ));
    }

    #[test]
    fn very_wide_image_fails_instead_of_producing_zero_rows() {
        let img = solid(400, 1, [1, 2, 3, 255]);
        assert!(matches!(
            sample_image_colors(&img, &config(10, 4)),
            Err(PatternError::Surface { .. })
        ));
    }

    #[test]
    fn cell_color_wire_format() {
        let cells = vec![CellColor::Bead(Rgb::new(1, 2, 3)), CellColor::Transparent];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"["rgb(1,2,3)","transparent"]"#);
        let back: Vec<CellColor> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn processed_data_checks_cell_count() {
        assert!(ProcessedData::new(vec![CellColor::Transparent; 5], 2, 3).is_err());
        let grid = ProcessedData::new(vec![CellColor::Transparent; 6], 2, 3).unwrap();
        assert_eq!(grid.index_of(2, 1), Some(5));
        assert_eq!(grid.index_of(3, 0), None);
        assert_eq!(grid.cell(0, 2), None);
    }

    #[test]
    fn decoded_grid_must_match_its_dimensions() {
        let ok: ProcessedData =
            serde_json::from_str(r#"{"colors":["rgb(1,2,3)","transparent"],"rows":1,"cols":2}"#)
                .unwrap();
        assert_eq!(ok.len(), 2);

        let bad = serde_json::from_str::<ProcessedData>(r#"{"colors":["rgb(1,2,3)"],"rows":1,"cols":0}"#);
        assert!(bad.is_err());

        let by_hand = ProcessedData {
            colors: vec![CellColor::Transparent],
            rows: 1,
            cols: 0,
        };
        assert!(matches!(by_hand.validate(), Err(PatternError::InvalidConfig(_))));
    }

    #[test]
    fn bare_hex_words_are_not_cell_colors() {
        assert!("bad".parse::<CellColor>().is_err());
        assert!(serde_json::from_str::<CellColor>(r#""facade""#).is_err());
        assert_eq!("#bad".parse::<CellColor>(), Ok(CellColor::Bead(Rgb::new(0xbb, 0xaa, 0xdd))));
    }

    #[test]
    fn fully_transparent_image_yields_transparent_grid() {
        let img = solid(8, 8, [200, 10, 10, 10]);
        let grid = sample_image_colors(&img, &config(4, 8)).unwrap();
        assert_eq!(grid.len(), 16);
        assert!(grid.colors.iter().all(CellColor::is_transparent));
    }

    #[test]
    fn solid_image_maps_to_its_own_color() {
        let img = solid(6, 3, [12, 140, 200, 255]);
        let grid = sample_image_colors(&img, &config(6, 8)).unwrap();
        assert_eq!((grid.cols, grid.rows), (6, 3));
        assert!(grid
            .colors
            .iter()
            .all(|c| *c == CellColor::Bead(Rgb::new(12, 140, 200))));
    }

    #[test]
    fn brand_constraint_snaps_to_catalog() {
        let catalog = Catalog::new(vec![
            BrandColor::new(Brand::Perler, "K", "Black", Rgb::BLACK),
            BrandColor::new(Brand::Perler, "W", "White", Rgb::WHITE),
        ]);
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([10, 10, 10, 255])
            } else {
                Rgba([245, 245, 245, 255])
            }
        });
        let config = PatternConfig {
            target_width: 2,
            brands: vec![Brand::Perler],
            ..PatternConfig::default()
        };
        let grid = sample_image_colors_with_catalog(&img, &config, &catalog).unwrap();
        assert_eq!(
            grid.colors,
            vec![CellColor::Bead(Rgb::BLACK), CellColor::Bead(Rgb::WHITE)]
        );
    }

    #[test]
    fn unselected_brand_leaves_palette_free() {
        let catalog = Catalog::new(vec![BrandColor::new(
            Brand::Mard,
            "K",
            "Black",
            Rgb::BLACK,
        )]);
        let img = solid(2, 2, [90, 30, 60, 255]);
        let config = PatternConfig {
            target_width: 2,
            brands: vec![Brand::Perler],
            ..PatternConfig::default()
        };
        assert_eq!(catalog_size(&catalog, &config.brands), 0);
        assert_eq!(catalog_size(&catalog, &[Brand::Mard]), 1);
        let grid = sample_image_colors_with_catalog(&img, &config, &catalog).unwrap();
        assert_eq!(grid.palette(), vec![Rgb::new(90, 30, 60)]);
    }

    #[test]
    fn error_diffusion_never_touches_transparent_cells() {
        let img = RgbaImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([128, 128, 128, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        for dither in [DitherMethod::FloydSteinberg, DitherMethod::Atkinson] {
            let config = PatternConfig {
                target_width: 4,
                max_colors: 2,
                dither_method: dither,
                ..PatternConfig::default()
            };
            let grid = sample_image_colors(&img, &config).unwrap();
            for (idx, cell) in grid.colors.iter().enumerate() {
                let (x, y) = (idx % 4, idx / 4);
                assert_eq!(cell.is_transparent(), (x + y) % 2 == 1, "{dither} at {idx}");
            }
        }
    }

    #[test]
    fn ordered_dither_mixes_two_colors_on_midtone() {
        let palette = LookupPalette::new(&[Rgb::BLACK, Rgb::WHITE]);
        let data: Vec<u8> = (0..64).flat_map(|_| [110, 110, 110, 255]).collect();
        let none = map_pixels(&data, 8, 8, &palette, ColorMethod::Oklab, DitherMethod::None);
        let bayer = map_pixels(&data, 8, 8, &palette, ColorMethod::Oklab, DitherMethod::Bayer);
        let distinct = |cells: &[CellColor]| cells.iter().collect::<HashSet<_>>().len();
        assert_eq!(distinct(&none[..]), 1);
        assert_eq!(distinct(&bayer[..]), 2);
    }
}
