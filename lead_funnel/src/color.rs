//! Colors for the chart segments.

use std::f64::consts::PI;
use std::fmt::Display;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const GRAY: Rgb = Rgb {
        r: 128,
        g: 128,
        b: 128,
    };

    fn from_unit(r: f64, g: f64, b: f64) -> Rgb {
        let to_u8 = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb {
            r: to_u8(r),
            g: to_u8(g),
            b: to_u8(b),
        }
    }
}

/// Hex notation, as used in SVG.
impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A rainbow color scale over [0, 1], from purple to red.
///
/// This is the matplotlib "rainbow" colormap (gnuplot palette 33, 13, 10):
/// red = |2x - 0.5|, green = sin(pi x), blue = cos(pi x / 2), each channel clipped to
/// [0, 1]. Values of `x` outside of [0, 1] are clamped.
pub fn rainbow(x: f64) -> Rgb {
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    Rgb::from_unit((2.0 * x - 0.5).abs(), (PI * x).sin(), (PI * x / 2.0).cos())
}

/// The fill color of the stage `idx` in a chart of `num_stages` stages.
pub fn stage_color(idx: usize, num_stages: usize) -> Rgb {
    rainbow(idx as f64 / num_stages.max(1) as f64)
}
