//! Corporate color palette and fixed chart colors.
//!
//! Charts pick series colors by cycling the palette from a caller-supplied
//! offset, so consecutive charts of one document start on different colors.

use plotters::style::RGBColor;

/// Series colors, cycled.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(0x70, 0xae, 0x00),
    RGBColor(0x8c, 0xc0, 0x00),
    RGBColor(0xaa, 0xcf, 0x65),
    RGBColor(0x3d, 0x6b, 0x00),
    RGBColor(0x57, 0x57, 0x57),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0x2c, 0x2c, 0x2c),
    RGBColor(0xb5, 0xb5, 0xb5),
    RGBColor(0x4a, 0x8c, 0x00),
    RGBColor(0xc8, 0xe6, 0x90),
];

pub const BACKGROUND: RGBColor = RGBColor(0xfa, 0xfa, 0xfa);
pub const AXIS: RGBColor = RGBColor(0xd0, 0xd0, 0xd0);
pub const GRID: RGBColor = RGBColor(0xe4, 0xe4, 0xe4);
pub const TEXT: RGBColor = RGBColor(0x33, 0x33, 0x33);
pub const TITLE: RGBColor = RGBColor(0x3d, 0x6b, 0x00);
pub const WHITE: RGBColor = RGBColor(0xff, 0xff, 0xff);

const NEGATIVE: RGBColor = RGBColor(0x21, 0x66, 0xac);
const POSITIVE: RGBColor = RGBColor(0xb2, 0x18, 0x2b);
const MISSING: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);

/// Color of the `index`-th item of a chart whose palette starts at `offset`.
pub fn color(offset: usize, index: usize) -> RGBColor {
    PALETTE[(offset + index) % PALETTE.len()]
}

/// Diverging blue-white-red scale for correlations in `[-1, 1]`.
pub fn diverging(value: Option<f64>) -> RGBColor {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return MISSING;
    };
    let v = v.clamp(-1.0, 1.0);
    let target = if v < 0.0 { NEGATIVE } else { POSITIVE };
    blend(WHITE, target, v.abs())
}

/// Text color readable on top of `background`.
pub fn contrast_text(background: RGBColor) -> RGBColor {
    let RGBColor(r, g, b) = background;
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luma < 140.0 { WHITE } else { TEXT }
}

fn blend(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}
