//! Bead catalogs.
//!
//! Each brand ships a fixed list of bead colors with stable IDs. The tables
//! are parsed once into a [`Catalog`] that is shared read-only for the life
//! of the process.

use crate::color::{parse_color, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Perler,
    Mard,
}

impl Brand {
    pub const ALL: [Brand; 2] = [Brand::Perler, Brand::Mard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Perler => "perler",
            Brand::Mard => "mard",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Brand::Perler => "Perler",
            Brand::Mard => "Mard",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Brand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perler" => Ok(Brand::Perler),
            "mard" => Ok(Brand::Mard),
            other => Err(format!("unknown brand '{}' (expected perler or mard)", other)),
        }
    }
}

/// A single catalog bead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColor {
    pub brand: Brand,
    pub id: String,
    pub name: String,
    pub rgb: Rgb,
}

impl BrandColor {
    pub fn new(brand: Brand, id: &str, name: &str, rgb: Rgb) -> Self {
        Self {
            brand,
            id: id.to_string(),
            name: name.to_string(),
            rgb,
        }
    }
}

/// Perler fused-bead colors. Each entry: (id, name, hex)
const PERLER_PALETTE: &[(&str, &str, &str)] = &[
    // Whites & Neutrals
    ("P01", "White", "#F1F1F1"),
    ("P02", "Cream", "#E0DEA9"),
    ("P17", "Grey", "#8A8D91"),
    ("P18", "Black", "#2E2F32"),
    ("P33", "Peach", "#EEBAB2"),
    ("P35", "Tan", "#CDA37E"),
    ("P12", "Brown", "#513E32"),
    ("P20", "Rust", "#8C3C2F"),
    ("P21", "Light Brown", "#815D34"),
    ("P57", "Cheddar", "#F1AA0C"),
    ("P92", "Dark Grey", "#4D5156"),
    ("P90", "Butterscotch", "#CF8439"),
    ("P91", "Parrot Green", "#06B86C"),
    ("P93", "Blueberry Cream", "#8599D3"),
    ("P94", "Light Pink", "#F6B3DD"),
    ("P96", "Cranapple", "#800832"),
    ("P97", "Prickly Pear", "#BDDA62"),
    ("P98", "Sand", "#E4B68F"),
    // Yellows & Oranges
    ("P03", "Yellow", "#ECD800"),
    ("P04", "Orange", "#ED6120"),
    ("P56", "Pastel Yellow", "#F8EF73"),
    ("P79", "Light Orange", "#F98D3C"),
    ("P58", "Tomato", "#FF3D34"),
    // Reds & Pinks
    ("P05", "Red", "#BF2626"),
    ("P06", "Bubblegum", "#DD6698"),
    ("P38", "Magenta", "#F22A7B"),
    ("P63", "Blush", "#FF8276"),
    ("P83", "Pink", "#E44793"),
    ("P88", "Raspberry", "#A5004F"),
    // Purples
    ("P07", "Purple", "#604089"),
    ("P54", "Pastel Lavender", "#8A72C1"),
    ("P60", "Plum", "#A24B9C"),
    ("P62", "Light Blue Violet", "#A2B5E8"),
    // Blues
    ("P08", "Dark Blue", "#2B3F87"),
    ("P09", "Light Blue", "#3370C0"),
    ("P52", "Pastel Blue", "#5386CA"),
    ("P59", "Turquoise", "#00A0C1"),
    ("P70", "Periwinkle", "#6D7CCB"),
    ("P75", "Glow Blue", "#8AD1F4"),
    ("P82", "Robin's Egg", "#A9E5E8"),
    // Greens
    ("P10", "Dark Green", "#1C753E"),
    ("P11", "Light Green", "#56BA9F"),
    ("P53", "Pastel Green", "#76C882"),
    ("P61", "Kiwi Lime", "#6CBE13"),
    ("P80", "Bright Green", "#4FAD42"),
    ("P84", "Pear", "#D1D000"),
    ("P87", "Fern", "#288C42"),
];

/// MARD bead colors. Each entry: (id, name, hex)
const MARD_PALETTE: &[(&str, &str, &str)] = &[
    // A: yellows
    ("A1", "Cream Yellow", "#FAF5CD"),
    ("A3", "Lemon", "#FFF36B"),
    ("A4", "Yellow", "#FCE33C"),
    ("A6", "Sunflower", "#FDA951"),
    ("A7", "Orange", "#FA8C4F"),
    ("A10", "Tangerine", "#F47E38"),
    // B: greens
    ("B3", "Mint", "#9EE884"),
    ("B5", "Grass", "#5FD34E"),
    ("B8", "Green", "#1DAF4D"),
    ("B12", "Forest", "#1B6B3C"),
    ("B17", "Olive", "#9EA73C"),
    ("B20", "Pale Mint", "#CBF1D3"),
    // C: blues
    ("C2", "Ice Blue", "#ACEBF4"),
    ("C6", "Sky", "#4FB8EB"),
    ("C8", "Azure", "#1F8CD6"),
    ("C10", "Cobalt", "#2456A8"),
    ("C13", "Navy", "#1B2A5F"),
    ("C17", "Teal", "#14A3A6"),
    // D: purples
    ("D6", "Lilac", "#B390E0"),
    ("D9", "Lavender", "#D7C0F0"),
    ("D11", "Violet", "#7740A8"),
    ("D18", "Grape", "#5A2C7E"),
    // E: pinks
    ("E2", "Baby Pink", "#F7C6DA"),
    ("E4", "Rose", "#EE6E9E"),
    ("E8", "Hot Pink", "#E9347C"),
    ("E12", "Berry", "#B21E5D"),
    // F: reds
    ("F5", "Scarlet", "#E32A2A"),
    ("F7", "Crimson", "#B7142A"),
    ("F8", "Wine", "#7B1423"),
    ("F13", "Coral", "#F4685C"),
    // G: skins & browns
    ("G1", "Porcelain", "#FCE6D3"),
    ("G3", "Apricot", "#F5C7A3"),
    ("G5", "Caramel", "#D68E54"),
    ("G7", "Chestnut", "#9A5A33"),
    ("G8", "Chocolate", "#5E3722"),
    ("G13", "Khaki", "#C9B27F"),
    // H: neutrals
    ("H1", "Snow", "#FFFFFF"),
    ("H2", "Pearl", "#E6E6E6"),
    ("H3", "Silver", "#BDBDBD"),
    ("H4", "Ash", "#8E8E8E"),
    ("H5", "Graphite", "#5C5C5C"),
    ("H6", "Charcoal", "#333333"),
    ("H7", "Black", "#000000"),
];

/// Read-only set of catalog beads, ordered Perler first then MARD.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<BrandColor>,
    by_color: HashMap<Rgb, usize>,
}

static GLOBAL_CATALOG: OnceLock<Catalog> = OnceLock::new();

impl Catalog {
    /// The built-in Perler and MARD catalogs.
    pub fn global() -> &'static Self {
        GLOBAL_CATALOG.get_or_init(Self::builtin)
    }

    fn builtin() -> Self {
        let tables = [(Brand::Perler, PERLER_PALETTE), (Brand::Mard, MARD_PALETTE)];
        let entries = tables
            .iter()
            .flat_map(|(brand, table)| {
                table.iter().filter_map(move |(id, name, hex)| {
                    let rgb = parse_color(hex);
                    if rgb.is_none() {
                        log::warn!("Skipping catalog entry {} with bad color {}", id, hex);
                    }
                    rgb.map(|rgb| BrandColor::new(*brand, id, name, rgb))
                })
            })
            .collect();
        Self::new(entries)
    }

    pub fn new(entries: Vec<BrandColor>) -> Self {
        let mut by_color = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            by_color.entry(entry.rgb).or_insert(idx);
        }
        Self { entries, by_color }
    }

    pub fn entries(&self) -> &[BrandColor] {
        &self.entries
    }

    pub fn brand_entries(&self, brand: Brand) -> impl Iterator<Item = &BrandColor> + '_ {
        self.entries.iter().filter(move |e| e.brand == brand)
    }

    pub fn brand_len(&self, brand: Brand) -> usize {
        self.brand_entries(brand).count()
    }

    /// First catalog bead with exactly this color.
    pub fn find(&self, rgb: Rgb) -> Option<&BrandColor> {
        self.by_color.get(&rgb).map(|&idx| &self.entries[idx])
    }

    pub fn find_in_brand(&self, rgb: Rgb, brand: Brand) -> Option<&BrandColor> {
        self.brand_entries(brand).find(|e| e.rgb == rgb)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
