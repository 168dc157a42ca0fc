//! Bead grid rendering.
//!
//! Draws a [`ProcessedData`] grid onto an RGBA surface: a checkerboard
//! underlay, bead cells in the chosen shape, catalog ID labels, 1-based axis
//! numbers in optional gutters, a three-tier gridline hierarchy and physical
//! board seams. The same layout math drives pointer hit-testing.

use crate::catalog::Catalog;
use crate::color::{contrast_text, Rgb};
use crate::error::{PatternError, Result};
use crate::glyphs::draw_text_centered;
use crate::pipeline::{CellColor, ProcessedData};
use image::{DynamicImage, ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Largest drawable surface side, in pixels.
pub const MAX_SURFACE_SIDE: u64 = 32_767;
/// Largest drawable surface area, in pixels.
pub const MAX_SURFACE_AREA: u64 = 268_435_456;
/// Blank cells kept around the design in the editor view.
pub const EDITOR_OFFSET_CELLS: u32 = 2;

/// Cell size at which line widths and fonts are drawn unscaled.
const BASE_CELL_SIZE: f32 = 20.0;
/// Labels are skipped on cells smaller than this.
const MIN_LABEL_CELL: u32 = 12;
/// Hexagons need at least this many pixels to be distinguishable.
const MIN_HEXAGON_CELL: u32 = 4;

const CHECKER_LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CHECKER_DARK: Rgba<u8> = Rgba([243, 244, 246, 255]);
const MAJOR_LINE: Rgba<u8> = Rgba([239, 68, 68, 204]);
const MINOR_LINE: Rgba<u8> = Rgba([0, 0, 0, 77]);
const SEAM_LINE: Rgba<u8> = Rgba([37, 99, 235, 230]);

/// Fails unless a `width` x `height` surface can be allocated.
pub fn check_surface(width: u64, height: u64) -> Result<()> {
    let too_big = width > MAX_SURFACE_SIDE
        || height > MAX_SURFACE_SIDE
        || width.saturating_mul(height) > MAX_SURFACE_AREA;
    if width == 0 || height == 0 || too_big {
        return Err(PatternError::Surface { width, height });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellShape {
    #[default]
    Square,
    Circle,
    Hexagon,
}

impl CellShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellShape::Square => "square",
            CellShape::Circle => "circle",
            CellShape::Hexagon => "hexagon",
        }
    }
}

impl fmt::Display for CellShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(CellShape::Square),
            "circle" => Ok(CellShape::Circle),
            "hexagon" => Ok(CellShape::Hexagon),
            other => Err(format!(
                "unknown cell shape '{}' (expected square, circle or hexagon)",
                other
            )),
        }
    }
}

/// Display options for [`render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub cell_size: u32,
    pub cell_shape: CellShape,
    pub show_grid: bool,
    /// Emphasize every 5th and 10th gridline.
    pub show_major_grid: bool,
    pub show_coordinates: bool,
    pub show_color_codes: bool,
    /// Pegboard size in cells; seams are drawn on board boundaries.
    pub board_size: Option<u32>,
    /// Blank cells around the design, outside any coordinate gutter.
    pub indent_cells: u32,
    pub coord_background: Rgb,
    pub coord_text: Rgb,
    pub coord_font_size: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_size: 20,
            cell_shape: CellShape::Square,
            show_grid: true,
            show_major_grid: true,
            show_coordinates: false,
            show_color_codes: true,
            board_size: None,
            indent_cells: 0,
            coord_background: Rgb::new(0xf1, 0xf5, 0xf9),
            coord_text: Rgb::new(0x64, 0x74, 0x8b),
            coord_font_size: 10.0,
        }
    }
}

impl RenderOptions {
    /// Interactive editor view: the design never touches the surface edge.
    pub fn editor() -> Self {
        Self {
            indent_cells: EDITOR_OFFSET_CELLS,
            ..Self::default()
        }
    }
}

/// A grid cell under a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellHit {
    pub col: u32,
    pub row: u32,
    pub index: usize,
}

/// Pixel geometry of a rendered grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    pub cell_size: u32,
    /// Blank padding width.
    pub indent: u32,
    /// Coordinate gutter width (0 when coordinates are hidden).
    pub gutter: u32,
    /// Distance from the surface edge to the first cell.
    pub offset: u32,
    pub width: u32,
    pub height: u32,
    /// Multiplier for line widths, dashes and fonts.
    pub scale_factor: f32,
}

impl GridLayout {
    pub fn new(cols: u32, rows: u32, options: &RenderOptions) -> Result<Self> {
        let cell = options.cell_size;
        if cell == 0 {
            return Err(PatternError::InvalidConfig(
                "cellSize must be at least 1".to_string(),
            ));
        }

        let indent = options.indent_cells as u64 * cell as u64;
        let gutter = if options.show_coordinates { cell as u64 } else { 0 };
        let offset = indent + gutter;
        let width = cols as u64 * cell as u64 + 2 * offset;
        let height = rows as u64 * cell as u64 + 2 * offset;
        check_surface(width, height)?;

        Ok(Self {
            cols,
            rows,
            cell_size: cell,
            indent: indent as u32,
            gutter: gutter as u32,
            offset: offset as u32,
            width: width as u32,
            height: height as u32,
            scale_factor: (cell as f32 / BASE_CELL_SIZE).max(1.0),
        })
    }

    /// Top-left pixel of a cell.
    pub fn cell_origin(&self, col: u32, row: u32) -> (u32, u32) {
        (
            self.offset + col * self.cell_size,
            self.offset + row * self.cell_size,
        )
    }

    /// Maps a surface position back to the cell under it.
    ///
    /// Padding, gutters and anything outside the grid give `None`.
    pub fn hit_test(&self, px: f64, py: f64) -> Option<CellHit> {
        let gx = px - self.offset as f64;
        let gy = py - self.offset as f64;
        if gx < 0.0 || gy < 0.0 {
            return None;
        }
        let col = (gx / self.cell_size as f64).floor();
        let row = (gy / self.cell_size as f64).floor();
        if col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        let (col, row) = (col as u32, row as u32);
        Some(CellHit {
            col,
            row,
            index: row as usize * self.cols as usize + col as usize,
        })
    }
}

/// Stroke of a single straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Rgba<u8>,
    pub width: f32,
    /// (on, off) lengths; `None` is solid.
    pub dash: Option<(f32, f32)>,
}

/// Style of gridline `i`: red solid every 10th, red dashed every 5th,
/// faint otherwise.
pub fn grid_line_style(i: u32, show_major_grid: bool, scale_factor: f32) -> LineStyle {
    if show_major_grid && i % 10 == 0 {
        LineStyle {
            color: MAJOR_LINE,
            width: 1.5 * scale_factor,
            dash: None,
        }
    } else if show_major_grid && i % 5 == 0 {
        LineStyle {
            color: MAJOR_LINE,
            width: scale_factor,
            dash: Some((4.0 * scale_factor, 2.0 * scale_factor)),
        }
    } else {
        LineStyle {
            color: MINOR_LINE,
            width: scale_factor,
            dash: None,
        }
    }
}

pub fn seam_line_style(scale_factor: f32) -> LineStyle {
    LineStyle {
        color: SEAM_LINE,
        width: 2.0 * scale_factor,
        dash: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
}

fn rgba(rgb: Rgb) -> Rgba<u8> {
    Rgba([rgb.r, rgb.g, rgb.b, 255])
}

/// Renders with the built-in catalog for labels.
pub fn render(grid: &ProcessedData, options: &RenderOptions) -> Result<RgbaImage> {
    render_with_catalog(grid, options, Catalog::global())
}

/// Renders with every pixel dimension multiplied by `scale`, for export.
pub fn render_scaled(grid: &ProcessedData, options: &RenderOptions, scale: u32) -> Result<RgbaImage> {
    render_scaled_with_catalog(grid, options, scale, Catalog::global())
}

pub fn render_scaled_with_catalog(
    grid: &ProcessedData,
    options: &RenderOptions,
    scale: u32,
    catalog: &Catalog,
) -> Result<RgbaImage> {
    if scale == 0 {
        return Err(PatternError::InvalidConfig(
            "scale must be at least 1".to_string(),
        ));
    }
    let cell_size = options.cell_size.checked_mul(scale).ok_or(PatternError::Surface {
        width: options.cell_size as u64 * scale as u64 * grid.cols as u64,
        height: options.cell_size as u64 * scale as u64 * grid.rows as u64,
    })?;
    let scaled = RenderOptions {
        cell_size,
        ..options.clone()
    };
    render_with_catalog(grid, &scaled, catalog)
}

pub fn render_with_catalog(
    grid: &ProcessedData,
    options: &RenderOptions,
    catalog: &Catalog,
) -> Result<RgbaImage> {
    grid.validate()?;
    let layout = GridLayout::new(grid.cols, grid.rows, options)?;
    let mut image = RgbaImage::from_pixel(layout.width, layout.height, CHECKER_LIGHT);
    let cell = layout.cell_size;

    for row in 0..layout.rows {
        for col in 0..layout.cols {
            let fill = if (row + col) % 2 == 0 {
                CHECKER_LIGHT
            } else {
                CHECKER_DARK
            };
            let (x, y) = layout.cell_origin(col, row);
            fill_rect(&mut image, x, y, cell, cell, fill);
        }
    }

    if options.show_coordinates {
        draw_gutters(&mut image, &layout, rgba(options.coord_background));
    }

    for (index, color) in grid.colors.iter().enumerate() {
        let CellColor::Bead(rgb) = color else {
            continue;
        };
        let col = (index % layout.cols as usize) as u32;
        let row = (index / layout.cols as usize) as u32;
        if row >= layout.rows {
            break;
        }
        draw_cell(&mut image, &layout, col, row, options.cell_shape, *rgb);

        if options.show_color_codes && cell >= MIN_LABEL_CELL {
            if let Some(bead) = catalog.find(*rgb) {
                let (x, y) = layout.cell_origin(col, row);
                let center = (x as f32 + cell as f32 / 2.0, y as f32 + cell as f32 / 2.0);
                let font = (cell as f32 * 0.35).floor();
                draw_text_centered(
                    &mut image,
                    &bead.id,
                    center.0,
                    center.1,
                    font,
                    rgba(contrast_text(*rgb)),
                );
            }
        }
    }

    if options.show_coordinates {
        draw_axis_numbers(&mut image, &layout, options);
    }

    if options.show_grid {
        for i in 0..=layout.cols {
            let style = grid_line_style(i, options.show_major_grid, layout.scale_factor);
            draw_grid_line(&mut image, &layout, Axis::Vertical, i, &style);
        }
        for i in 0..=layout.rows {
            let style = grid_line_style(i, options.show_major_grid, layout.scale_factor);
            draw_grid_line(&mut image, &layout, Axis::Horizontal, i, &style);
        }
    }

    if let Some(board) = options.board_size.filter(|&b| b > 0) {
        let style = seam_line_style(layout.scale_factor);
        for i in (0..=layout.cols).filter(|i| i % board == 0) {
            draw_grid_line(&mut image, &layout, Axis::Vertical, i, &style);
        }
        for i in (0..=layout.rows).filter(|i| i % board == 0) {
            draw_grid_line(&mut image, &layout, Axis::Horizontal, i, &style);
        }
    }

    Ok(image)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| PatternError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    if w == 0 || h == 0 {
        return;
    }
    draw_filled_rect_mut(image, Rect::at(x as i32, y as i32).of_size(w, h), color);
}

fn draw_gutters(image: &mut RgbaImage, layout: &GridLayout, color: Rgba<u8>) {
    let (indent, gutter) = (layout.indent, layout.gutter);
    let inner_w = layout.width - 2 * indent;
    let inner_h = layout.height - 2 * indent;
    // Top, bottom, left, right.
    fill_rect(image, indent, indent, inner_w, gutter, color);
    fill_rect(image, indent, layout.height - indent - gutter, inner_w, gutter, color);
    fill_rect(image, indent, layout.offset, gutter, inner_h - 2 * gutter, color);
    fill_rect(
        image,
        layout.width - indent - gutter,
        layout.offset,
        gutter,
        inner_h - 2 * gutter,
        color,
    );
}

fn draw_cell(image: &mut RgbaImage, layout: &GridLayout, col: u32, row: u32, shape: CellShape, rgb: Rgb) {
    let (x, y) = layout.cell_origin(col, row);
    let size = layout.cell_size;
    let color = rgba(rgb);

    match shape {
        CellShape::Square => fill_rect(image, x, y, size, size, color),
        CellShape::Circle => {
            let cx = x as f32 + size as f32 / 2.0;
            let cy = y as f32 + size as f32 / 2.0;
            let radius = size as f32 / 2.0 + 0.2 * layout.scale_factor;
            fill_circle(image, cx, cy, radius, color);
        }
        CellShape::Hexagon if size < MIN_HEXAGON_CELL => fill_rect(image, x, y, size, size, color),
        CellShape::Hexagon => {
            let (x, y, s) = (x as i32, y as i32, size as i32);
            let right = x + s - 1;
            let bottom = y + s - 1;
            let hexagon = [
                Point::new(x + s / 2, y),
                Point::new(right, y + s / 4),
                Point::new(right, bottom - s / 4),
                Point::new(x + s / 2, bottom),
                Point::new(x, bottom - s / 4),
                Point::new(x, y + s / 4),
            ];
            draw_polygon_mut(image, &hexagon, color);
        }
    }
}

fn fill_circle(image: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(image.width());
    let y1 = ((cy + radius).ceil() as u32).min(image.height());
    let r2 = radius * radius;
    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                image.put_pixel(px, py, color);
            }
        }
    }
}

fn draw_axis_numbers(image: &mut RgbaImage, layout: &GridLayout, options: &RenderOptions) {
    let font = (options.coord_font_size * layout.scale_factor).max(10.0);
    let ink = rgba(options.coord_text);
    let half_cell = layout.cell_size as f32 / 2.0;
    let near = layout.indent as f32 + layout.gutter as f32 / 2.0;
    let far_x = layout.width as f32 - near;
    let far_y = layout.height as f32 - near;

    for col in 0..layout.cols {
        let label = (col + 1).to_string();
        let x = (layout.offset as f32 + (col * layout.cell_size) as f32 + half_cell).floor();
        draw_text_centered(image, &label, x, near, font, ink);
        draw_text_centered(image, &label, x, far_y, font, ink);
    }
    for row in 0..layout.rows {
        let label = (row + 1).to_string();
        let y = (layout.offset as f32 + (row * layout.cell_size) as f32 + half_cell).floor();
        draw_text_centered(image, &label, near, y, font, ink);
        draw_text_centered(image, &label, far_x, y, font, ink);
    }
}

/// Pixel span covered by a stroke of `width` centered on `pos`.
fn stroke_span(pos: f32, width: f32) -> (i64, i64) {
    let start = (pos - width / 2.0 + 0.5).floor() as i64;
    let end = (pos + width / 2.0 + 0.5).floor() as i64;
    (start, end.max(start + 1))
}

/// Strokes gridline `i` across the grid area, blending onto the surface.
fn draw_grid_line(image: &mut RgbaImage, layout: &GridLayout, axis: Axis, i: u32, style: &LineStyle) {
    let pos = (layout.offset + i * layout.cell_size) as f32;
    let (across_start, across_end) = stroke_span(pos, style.width);
    let along_start = layout.offset;
    let along_end = match axis {
        Axis::Vertical => layout.height - layout.offset,
        Axis::Horizontal => layout.width - layout.offset,
    };
    let (limit_across, limit_along) = match axis {
        Axis::Vertical => (layout.width as i64, layout.height),
        Axis::Horizontal => (layout.height as i64, layout.width),
    };

    for along in along_start..along_end.min(limit_along) {
        if let Some((on, off)) = style.dash {
            let t = (along - along_start) as f32 + 0.5;
            if t % (on + off) >= on {
                continue;
            }
        }
        for across in across_start.max(0)..across_end.min(limit_across) {
            let (px, py) = match axis {
                Axis::Vertical => (across as u32, along),
                Axis::Horizontal => (along, across as u32),
            };
            image.get_pixel_mut(px, py).blend(&style.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Brand, BrandColor};
    use pretty_assertions::assert_eq;

    fn solid_grid(cols: u32, rows: u32, rgb: Rgb) -> ProcessedData {
        ProcessedData::new(vec![CellColor::Bead(rgb); (cols * rows) as usize], rows, cols).unwrap()
    }

    fn plain() -> RenderOptions {
        RenderOptions {
            show_grid: false,
            show_color_codes: false,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn layout_accounts_for_indent_and_gutters() {
        let options = RenderOptions {
            show_coordinates: true,
            indent_cells: 2,
            cell_size: 10,
            ..RenderOptions::default()
        };
        let layout = GridLayout::new(4, 3, &options).unwrap();
        assert_eq!(layout.offset, 30);
        assert_eq!((layout.width, layout.height), (100, 90));
        assert_eq!(layout.scale_factor, 1.0);
        assert_eq!(layout.cell_origin(1, 2), (40, 50));
    }

    #[test]
    fn scale_factor_grows_with_large_cells() {
        let options = RenderOptions {
            cell_size: 50,
            ..RenderOptions::default()
        };
        assert_eq!(GridLayout::new(2, 2, &options).unwrap().scale_factor, 2.5);
    }

    #[test]
    fn hit_test_inverts_layout() {
        let options = RenderOptions {
            show_coordinates: true,
            ..RenderOptions::editor()
        };
        let layout = GridLayout::new(5, 4, &options).unwrap();
        assert_eq!(layout.offset, 60);
        assert_eq!(
            layout.hit_test(60.0, 60.0),
            Some(CellHit {
                col: 0,
                row: 0,
                index: 0
            })
        );
        assert_eq!(
            layout.hit_test(60.0 + 2.5 * 20.0, 60.0 + 3.9 * 20.0),
            Some(CellHit {
                col: 2,
                row: 3,
                index: 17
            })
        );
        assert_eq!(layout.hit_test(59.9, 70.0), None);
        assert_eq!(layout.hit_test(10.0, 10.0), None);
        assert_eq!(layout.hit_test(60.0 + 5.0 * 20.0, 70.0), None);
        assert_eq!(layout.hit_test(70.0, 60.0 + 4.0 * 20.0), None);
    }

    #[test]
    fn oversized_surfaces_fail() {
        let grid = solid_grid(2000, 1, Rgb::BLACK);
        let options = RenderOptions {
            cell_size: 20,
            ..plain()
        };
        assert!(matches!(
            render(&grid, &options),
            Err(PatternError::Surface { width: 40000, height: 20 })
        ));
        assert!(check_surface(20000, 20000).is_err());
        assert!(check_surface(16000, 16000).is_ok());
    }

    #[test]
    fn gridline_tiers() {
        let major = grid_line_style(10, true, 1.0);
        assert_eq!((major.color, major.width, major.dash), (MAJOR_LINE, 1.5, None));
        let mid = grid_line_style(15, true, 2.0);
        assert_eq!((mid.color, mid.width, mid.dash), (MAJOR_LINE, 2.0, Some((8.0, 4.0))));
        let minor = grid_line_style(7, true, 1.0);
        assert_eq!(minor.color, MINOR_LINE);
        let no_major = grid_line_style(10, false, 1.0);
        assert_eq!((no_major.color, no_major.dash), (MINOR_LINE, None));
    }

    #[test]
    fn square_cells_fill_their_cell() {
        let red = Rgb::new(200, 10, 10);
        let image = render(&solid_grid(3, 2, red), &plain()).unwrap();
        assert_eq!(image.dimensions(), (60, 40));
        assert_eq!(*image.get_pixel(0, 0), rgba(red));
        assert_eq!(*image.get_pixel(59, 39), rgba(red));
    }

    #[test]
    fn transparent_cells_show_checkerboard() {
        let grid = ProcessedData::new(vec![CellColor::Transparent; 2], 1, 2).unwrap();
        let image = render(&grid, &plain()).unwrap();
        assert_eq!(*image.get_pixel(5, 5), CHECKER_LIGHT);
        assert_eq!(*image.get_pixel(25, 5), CHECKER_DARK);
    }

    #[test]
    fn circles_leave_corners_uncovered() {
        let blue = Rgb::new(0, 0, 200);
        let options = RenderOptions {
            cell_shape: CellShape::Circle,
            ..plain()
        };
        let image = render(&solid_grid(1, 1, blue), &options).unwrap();
        assert_eq!(*image.get_pixel(10, 10), rgba(blue));
        assert_eq!(*image.get_pixel(0, 0), CHECKER_LIGHT);
    }

    #[test]
    fn hexagons_are_pointy_top() {
        let green = Rgb::new(0, 160, 0);
        let options = RenderOptions {
            cell_shape: CellShape::Hexagon,
            ..plain()
        };
        let image = render(&solid_grid(1, 1, green), &options).unwrap();
        assert_eq!(*image.get_pixel(10, 10), rgba(green));
        assert_eq!(*image.get_pixel(10, 0), rgba(green));
        assert_eq!(*image.get_pixel(0, 0), CHECKER_LIGHT);
        assert_eq!(*image.get_pixel(0, 10), rgba(green));
    }

    #[test]
    fn gridlines_are_drawn_over_cells() {
        let white = Rgb::WHITE;
        let options = RenderOptions {
            show_color_codes: false,
            ..RenderOptions::default()
        };
        let image = render(&solid_grid(12, 1, white), &options).unwrap();
        // Line 0 is a solid major line, line 1 is faint.
        let major = *image.get_pixel(0, 5);
        let faint = *image.get_pixel(20, 5);
        assert!(major[0] > major[1], "major line should be red: {major:?}");
        assert!(faint[0] == faint[1] && faint[0] < 255, "faint line should be gray: {faint:?}");
        // Line 5 is dashed: on for the first 4px, off for the next 2px.
        assert_ne!(*image.get_pixel(100, 1), rgba(white));
        assert_eq!(*image.get_pixel(100, 5), rgba(white));
    }

    #[test]
    fn board_seams_mark_board_boundaries() {
        let options = RenderOptions {
            board_size: Some(2),
            ..plain()
        };
        let image = render(&solid_grid(4, 1, Rgb::WHITE), &options).unwrap();
        let seam = *image.get_pixel(40, 10);
        assert!(seam[2] > seam[0], "seam should be blue: {seam:?}");
        assert_eq!(*image.get_pixel(20, 10), rgba(Rgb::WHITE));
    }

    #[test]
    fn labels_only_for_catalog_colors_on_large_cells() {
        let catalog = Catalog::new(vec![BrandColor::new(Brand::Mard, "H7", "Black", Rgb::BLACK)]);
        let options = RenderOptions {
            show_grid: false,
            ..RenderOptions::default()
        };
        let labelled = render_with_catalog(&solid_grid(1, 1, Rgb::BLACK), &options, &catalog).unwrap();
        assert!(labelled.pixels().any(|p| *p == rgba(Rgb::WHITE)));

        let small = RenderOptions {
            cell_size: 10,
            ..options.clone()
        };
        let unlabelled = render_with_catalog(&solid_grid(1, 1, Rgb::BLACK), &small, &catalog).unwrap();
        assert!(unlabelled.pixels().all(|p| *p == rgba(Rgb::BLACK)));

        let other = Rgb::new(1, 2, 3);
        let custom = render_with_catalog(&solid_grid(1, 1, other), &options, &catalog).unwrap();
        assert!(custom.pixels().all(|p| *p == rgba(other)));
    }

    #[test]
    fn coordinates_fill_gutters() {
        let options = RenderOptions {
            show_coordinates: true,
            ..plain()
        };
        let image = render(&solid_grid(2, 2, Rgb::BLACK), &options).unwrap();
        assert_eq!(image.dimensions(), (80, 80));
        assert_eq!(*image.get_pixel(1, 1), rgba(options.coord_background));
        let text = rgba(options.coord_text);
        assert!(image.pixels().any(|p| *p == text));
    }

    #[test]
    fn scaled_render_multiplies_dimensions() {
        let grid = solid_grid(3, 2, Rgb::BLACK);
        let image = render_scaled(&grid, &plain(), 3).unwrap();
        assert_eq!(image.dimensions(), (180, 120));
        assert!(render_scaled(&grid, &plain(), 0).is_err());
    }

    #[test]
    fn scaled_render_keeps_the_given_catalog() {
        let catalog = Catalog::new(vec![BrandColor::new(Brand::Mard, "H7", "Black", Rgb::BLACK)]);
        let options = RenderOptions {
            cell_size: 10,
            show_grid: false,
            ..RenderOptions::default()
        };
        let grid = solid_grid(1, 1, Rgb::BLACK);
        let image = render_scaled_with_catalog(&grid, &options, 2, &catalog).unwrap();
        assert_eq!(image.dimensions(), (20, 20));
        assert!(image.pixels().any(|p| *p == rgba(Rgb::WHITE)));

        let empty = Catalog::new(Vec::new());
        let unlabelled = render_scaled_with_catalog(&grid, &options, 2, &empty).unwrap();
        assert!(unlabelled.pixels().all(|p| *p == rgba(Rgb::BLACK)));
    }

    #[test]
    fn inconsistent_grid_is_rejected() {
        let grid = ProcessedData {
            colors: vec![CellColor::Bead(Rgb::new(1, 2, 3))],
            rows: 1,
            cols: 0,
        };
        let options = RenderOptions {
            show_coordinates: true,
            ..RenderOptions::default()
        };
        assert!(matches!(
            render(&grid, &options),
            Err(PatternError::InvalidConfig(_))
        ));
    }

    #[test]
    fn png_encoding_decodes_back() {
        let image = render(&solid_grid(2, 2, Rgb::new(9, 9, 9)), &plain()).unwrap();
        let png = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }
}
