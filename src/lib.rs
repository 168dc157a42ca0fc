//! Bead pattern core.
//!
//! Turns an arbitrary raster image into a grid of bead colors and renders
//! that grid for printing or editing:
//! - Median-cut color quantization
//! - Optional palette constraint onto Perler / MARD bead catalogs
//! - CIEDE2000 or OKLab nearest-color matching
//! - Ordered (Bayer, blue-noise) and error diffusion dithering
//! - Grid rendering with gridlines, axis numbers, board seams and bead IDs

pub mod catalog;
pub mod color;
pub mod dither;
pub mod downscale;
pub mod error;
pub mod glyphs;
pub mod legend;
pub mod palette_map;
pub mod pipeline;
pub mod quantize;
pub mod raster;

pub use catalog::{Brand, BrandColor, Catalog};
pub use color::{parse_color, Rgb};
pub use dither::DitherMethod;
pub use downscale::SamplingMode;
pub use error::{PatternError, Result};
pub use legend::{apply_overrides, color_stats, group_color_stats, paint_cell, total_beads, ColorStat, StatGroup};
pub use palette_map::{find_closest_palette_color, ColorMethod};
pub use pipeline::{
    decode_image, load_image, process_image_bytes, sample_image_colors,
    sample_image_colors_with_catalog, CellColor, PatternConfig, ProcessedData,
};
pub use raster::{
    encode_png, render, render_scaled, render_scaled_with_catalog, render_with_catalog, CellHit,
    CellShape, GridLayout, RenderOptions,
};
