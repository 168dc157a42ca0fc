//! Tiny 3x5 bitmap font for axis numbers and bead IDs.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

fn glyph(ch: char) -> Option<[&'static str; 5]> {
    let glyph = match ch.to_ascii_uppercase() {
        '0' => ["111", "101", "101", "101", "111"],
        '1' => ["010", "110", "010", "010", "111"],
        '2' => ["111", "001", "111", "100", "111"],
        '3' => ["111", "001", "111", "001", "111"],
        '4' => ["101", "101", "111", "001", "001"],
        '5' => ["111", "100", "111", "001", "111"],
        '6' => ["111", "100", "111", "101", "111"],
        '7' => ["111", "001", "010", "010", "010"],
        '8' => ["111", "101", "111", "101", "111"],
        '9' => ["111", "101", "111", "001", "111"],
        'A' => ["010", "101", "111", "101", "101"],
        'B' => ["110", "101", "110", "101", "110"],
        'C' => ["011", "100", "100", "100", "011"],
        'D' => ["110", "101", "101", "101", "110"],
        'E' => ["111", "100", "110", "100", "111"],
        'F' => ["111", "100", "110", "100", "100"],
        'G' => ["011", "100", "101", "101", "011"],
        'H' => ["101", "101", "111", "101", "101"],
        'I' => ["111", "010", "010", "010", "111"],
        'J' => ["001", "001", "001", "101", "010"],
        'K' => ["101", "101", "110", "101", "101"],
        'L' => ["100", "100", "100", "100", "111"],
        'M' => ["101", "111", "111", "101", "101"],
        'N' => ["110", "101", "101", "101", "101"],
        'O' => ["010", "101", "101", "101", "010"],
        'P' => ["110", "101", "110", "100", "100"],
        'Q' => ["010", "101", "101", "110", "011"],
        'R' => ["110", "101", "110", "101", "101"],
        'S' => ["011", "100", "010", "001", "110"],
        'T' => ["111", "010", "010", "010", "010"],
        'U' => ["101", "101", "101", "101", "111"],
        'V' => ["101", "101", "101", "101", "010"],
        'W' => ["101", "101", "111", "111", "101"],
        'X' => ["101", "101", "010", "101", "101"],
        'Y' => ["101", "101", "010", "010", "010"],
        'Z' => ["111", "001", "010", "100", "111"],
        '-' => ["000", "000", "111", "000", "000"],
        _ => return None,
    };
    Some(glyph)
}

/// Size of one font "pixel" for a nominal font size.
pub fn unit_for(font_px: f32) -> u32 {
    ((font_px * 0.7 / GLYPH_H as f32).round() as u32).max(1)
}

/// Rendered width of `text` in surface pixels. Unknown characters take no
/// space.
pub fn text_width(text: &str, font_px: f32) -> u32 {
    let n = text.chars().filter(|c| glyph(*c).is_some()).count() as u32;
    if n == 0 {
        return 0;
    }
    let unit = unit_for(font_px);
    n * GLYPH_W * unit + (n - 1) * unit
}

/// Draws `text` centered on (cx, cy). Drawing is clipped to the image.
pub fn draw_text_centered(
    image: &mut RgbaImage,
    text: &str,
    cx: f32,
    cy: f32,
    font_px: f32,
    ink: Rgba<u8>,
) {
    let glyphs: Vec<[&str; 5]> = text.chars().filter_map(glyph).collect();
    if glyphs.is_empty() {
        return;
    }

    let unit = unit_for(font_px);
    let width = text_width(text, font_px) as f32;
    let mut x_cursor = (cx - width * 0.5).round() as i32;
    let y_top = (cy - (GLYPH_H * unit) as f32 * 0.5).round() as i32;

    for glyph in glyphs {
        for (row, bits) in glyph.iter().enumerate() {
            for (col, bit) in bits.bytes().enumerate() {
                if bit != b'1' {
                    continue;
                }
                let px = x_cursor + (col as u32 * unit) as i32;
                let py = y_top + (row as u32 * unit) as i32;
                draw_filled_rect_mut(image, Rect::at(px, py).of_size(unit, unit), ink);
            }
        }
        x_cursor += ((GLYPH_W + 1) * unit) as i32;
    }
}
