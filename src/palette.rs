//! Color tables: curated categorical palettes, the ordinal fallback palette and
//! the sequential ramp used for continuous fields and contour levels.

use std::sync::OnceLock;

/// Color for charts without a color field.
pub const DEFAULT_COLOR: &str = "#4c78a8";

/// Color for keys missing from a curated table.
pub const FALLBACK_GRAY: &str = "#999999";

/// Color for records whose color value is null. Not part of any palette.
pub const MISSING_COLOR: &str = "#bbbbbb";

pub const TABLEAU10: &[&str] = &[
    "#4c78a8", "#f58518", "#e45756", "#72b7b2", "#54a24b", "#eeca3b", "#b279a2", "#ff9da6",
    "#9d755d", "#bab0ac",
];

const REGION_COLORS: &[(&str, &str)] = &[
    ("Africa", "#a6761d"),
    ("West Eurasia", "#377eb8"),
    ("Europe", "#377eb8"),
    ("Middle East", "#d95f02"),
    ("Central South Asia", "#7570b3"),
    ("South Asia", "#7570b3"),
    ("Central Asia Siberia", "#e6ab02"),
    ("East Asia", "#1b9e77"),
    ("Oceania", "#66a61e"),
    ("America", "#e7298a"),
];

const DATASET_COLORS: &[(&str, &str)] = &[
    ("1KG", "#4c78a8"),
    ("HGDP", "#f58518"),
    ("SGDP", "#54a24b"),
    ("Papuans", "#b279a2"),
    ("Ancient", "#9d755d"),
];

const ANCESTRY_COLORS: &[(&str, &str)] = &[
    ("Neanderthal", "#1f77b4"),
    ("Denisovan", "#d62728"),
    ("Ambiguous", "#bcbd22"),
    ("Non-archaic", "#7f7f7f"),
];

/// Viridis, hex-encoded control points.
const VIRIDIS: &str = concat!(
    "440154470e61481a6c482575472f7d443a834144873d4e8a39568c35608d31688e2d708e",
    "2a788e27818e23888e21918d1f988b1fa08822a8842ab07f35b77943bf7154c56866cc5d",
    "7ad1518fd744a5db36bcdf27d2e21be9e51afde725"
);

/// Fixed palette table for a curated categorical field, if the field has one.
pub fn curated_palette(field: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match field.to_ascii_lowercase().as_str() {
        "region" => Some(REGION_COLORS),
        "dataset" => Some(DATASET_COLORS),
        "ancestry" => Some(ANCESTRY_COLORS),
        _ => None,
    }
}

/// Ordinal color for the n-th category (cycles after ten).
pub fn ordinal_color(index: usize) -> &'static str {
    TABLEAU10[index % TABLEAU10.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

fn decode_ramp(hex: &str) -> Vec<Rgb> {
    hex.as_bytes()
        .chunks_exact(6)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok().and_then(Rgb::from_hex))
        .collect()
}

fn viridis() -> &'static [Rgb] {
    static RAMP: OnceLock<Vec<Rgb>> = OnceLock::new();
    RAMP.get_or_init(|| decode_ramp(VIRIDIS))
}

/// Sequential (viridis) color at `t ∈ [0, 1]`; `t` is clamped.
pub fn sequential(t: f64) -> String {
    let ramp = viridis();
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (ramp.len() - 1) as f64;
    let i = (pos.floor() as usize).min(ramp.len() - 2);
    ramp[i].lerp(ramp[i + 1], pos - i as f64).to_hex()
}

/// Sequential color of `value` over `extent`. The only continuous interpolator in
/// the crate: record colors, legend gradients and contour fills all go through it.
pub fn sequential_over(extent: (f64, f64), value: f64) -> String {
    let (min, max) = extent;
    let span = max - min;
    let t = if span > 0.0 { (value - min) / span } else { 0.5 };
    sequential(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let c = Rgb::from_hex("#4c78a8").unwrap();
        assert_eq!(c, Rgb::new(0x4c, 0x78, 0xa8));
        assert_eq!(c.to_hex(), "#4c78a8");
        assert!(Rgb::from_hex("#12345").is_none());
        assert!(Rgb::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_sequential_endpoints() {
        assert_eq!(sequential(0.0), "#440154");
        assert_eq!(sequential(1.0), "#fde725");
        assert_eq!(sequential(-3.0), "#440154");
        assert_eq!(sequential(f64::NAN), "#440154");
    }

    #[test]
    fn test_sequential_over_extent() {
        assert_eq!(sequential_over((10.0, 20.0), 10.0), sequential(0.0));
        assert_eq!(sequential_over((10.0, 20.0), 15.0), sequential(0.5));
        assert_eq!(sequential_over((10.0, 20.0), 99.0), sequential(1.0));
    }

    #[test]
    fn test_ordinal_cycles() {
        assert_eq!(ordinal_color(0), ordinal_color(10));
        assert_ne!(ordinal_color(0), ordinal_color(1));
    }

    #[test]
    fn test_curated_lookup() {
        let table = curated_palette("Region").unwrap();
        assert!(table.iter().any(|(k, _)| *k == "Africa"));
        assert!(curated_palette("population").is_none());
    }
}
