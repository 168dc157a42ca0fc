//! Grid post-processing: color overrides, cell edits and the bead legend.

use crate::catalog::{Brand, Catalog};
use crate::color::Rgb;
use crate::error::{PatternError, Result};
use crate::pipeline::{CellColor, ProcessedData};
use serde::Serialize;
use std::collections::HashMap;

/// Distinct-color count reported when no catalog constrains the palette.
pub const UNCONSTRAINED_COLOR_COUNT: usize = 256;

/// Usage of one color in a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorStat {
    /// 1-based order of first appearance in the grid.
    pub id: usize,
    pub color: Rgb,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatGroup {
    pub title: &'static str,
    pub entries: Vec<ColorStat>,
}

/// Replaces every bead color that has an entry in `overrides`.
///
/// Transparent cells are never touched.
pub fn apply_overrides(grid: &ProcessedData, overrides: &HashMap<Rgb, CellColor>) -> ProcessedData {
    if overrides.is_empty() {
        return grid.clone();
    }
    let colors = grid
        .colors
        .iter()
        .map(|cell| match cell {
            CellColor::Bead(rgb) => overrides.get(rgb).copied().unwrap_or(*cell),
            CellColor::Transparent => *cell,
        })
        .collect();
    ProcessedData {
        colors,
        rows: grid.rows,
        cols: grid.cols,
    }
}

/// Returns a copy of `grid` with one cell repainted.
pub fn paint_cell(grid: &ProcessedData, index: usize, color: CellColor) -> Result<ProcessedData> {
    if index >= grid.colors.len() {
        return Err(PatternError::CellOutOfBounds {
            index,
            len: grid.colors.len(),
        });
    }
    let mut next = grid.clone();
    next.colors[index] = color;
    Ok(next)
}

/// Per-color bead counts, most used first.
pub fn color_stats(grid: &ProcessedData) -> Vec<ColorStat> {
    let mut stats: Vec<ColorStat> = Vec::new();
    let mut slots: HashMap<Rgb, usize> = HashMap::new();

    for rgb in grid.colors.iter().filter_map(CellColor::rgb) {
        match slots.get(&rgb) {
            Some(&slot) => stats[slot].count += 1,
            None => {
                slots.insert(rgb, stats.len());
                stats.push(ColorStat {
                    id: stats.len() + 1,
                    color: rgb,
                    count: 1,
                });
            }
        }
    }

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

pub fn total_beads(grid: &ProcessedData) -> usize {
    grid.colors.iter().filter(|c| !c.is_transparent()).count()
}

/// Splits color stats into per-brand sections.
///
/// A color lands in a brand section only when it is a catalog color of that
/// brand and the brand is selected; everything else is "Other / Custom".
/// Empty sections are omitted.
pub fn group_color_stats(stats: &[ColorStat], brands: &[Brand], catalog: &Catalog) -> Vec<StatGroup> {
    let mut perler = Vec::new();
    let mut mard = Vec::new();
    let mut other = Vec::new();

    for stat in stats {
        let brand = catalog
            .find(stat.color)
            .map(|bead| bead.brand)
            .filter(|brand| brands.contains(brand));
        match brand {
            Some(Brand::Perler) => perler.push(stat.clone()),
            Some(Brand::Mard) => mard.push(stat.clone()),
            None => other.push(stat.clone()),
        }
    }

    [
        ("Perler Beads", perler),
        ("Mard Beads", mard),
        ("Other / Custom", other),
    ]
    .into_iter()
    .filter(|(_, entries)| !entries.is_empty())
    .map(|(title, entries)| StatGroup { title, entries })
    .collect()
}

/// Size of the color space a user can pick from with these brands.
pub fn total_available_colors(brands: &[Brand], catalog: &Catalog) -> usize {
    if brands.is_empty() {
        return UNCONSTRAINED_COLOR_COUNT;
    }
    Brand::ALL
        .iter()
        .filter(|brand| brands.contains(brand))
        .map(|brand| catalog.brand_len(*brand))
        .sum()
}
