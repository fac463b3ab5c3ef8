use crate::color::{ColorAssignment, ColorKey, ColorMode, KEY_SEPARATOR};
use crate::data::format_number;
use crate::palette;
use serde::Serialize;
use std::collections::BTreeMap;

/// Stops sampled along a continuous legend gradient.
pub const GRADIENT_STOPS: usize = 11;

/// Built-in display names for common dataset and ancestry keys.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("1KG", "1000 Genomes"),
    ("HGDP", "Human Genome Diversity Project"),
    ("SGDP", "Simons Genome Diversity Project"),
    ("XPrime", "X Prime"),
    ("nea", "Neanderthal"),
    ("den", "Denisovan"),
    ("amb", "Ambiguous"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f64,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gradient {
    pub extent: (f64, f64),
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    /// Color of `value` on this gradient; the same interpolator records are painted with.
    pub fn sample(&self, value: f64) -> String {
        palette::sequential_over(self.extent, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub mode: ColorMode,
    pub title: String,
    pub entries: Vec<LegendEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

/// Legend label for a category key: config overrides first, then the built-in table.
/// Composite keys are translated part by part.
pub fn display_name(key: &str, overrides: &BTreeMap<String, String>) -> String {
    if let Some(name) = overrides.get(key) {
        return name.clone();
    }
    if key.contains(KEY_SEPARATOR) {
        return key
            .split(KEY_SEPARATOR)
            .map(|part| display_name(part, overrides))
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);
    }
    DISPLAY_NAMES
        .iter()
        .find(|(k, _)| *k == key)
        .map_or_else(|| key.to_string(), |(_, v)| v.to_string())
}

fn format_label(v: f64) -> String {
    if v.fract() == 0.0 {
        format_number(v)
    } else {
        format!("{:.2}", v)
    }
}

/// Build the legend from the color assignment used for painting.
pub fn build_legend(colors: &ColorAssignment, overrides: &BTreeMap<String, String>) -> Legend {
    let title = colors
        .fields()
        .iter()
        .map(|f| display_name(f, overrides))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR);

    let mut legend = match colors.mode() {
        ColorMode::Default => Legend {
            mode: ColorMode::Default,
            title,
            entries: vec![LegendEntry {
                label: "All records".to_string(),
                color: colors.default_color().to_string(),
                extent: None,
            }],
            gradient: None,
        },
        ColorMode::Discrete => Legend {
            mode: ColorMode::Discrete,
            title,
            entries: colors
                .global_color_order()
                .iter()
                .map(|key| LegendEntry {
                    label: display_name(key, overrides),
                    color: colors.color_for_key(&ColorKey::Category(key.clone())),
                    extent: None,
                })
                .collect(),
            gradient: None,
        },
        ColorMode::Continuous => {
            let extent = colors.extent().unwrap_or((0.0, 1.0));
            let (min, max) = extent;
            let stops = (0..GRADIENT_STOPS)
                .map(|k| {
                    let offset = k as f64 / (GRADIENT_STOPS - 1) as f64;
                    let value = min + offset * (max - min);
                    GradientStop { offset, value, color: colors.color_for_value(value) }
                })
                .collect();
            let entries = [min, max]
                .into_iter()
                .map(|v| LegendEntry {
                    label: format_label(v),
                    color: colors.color_for_value(v),
                    extent: Some(extent),
                })
                .collect();
            Legend {
                mode: ColorMode::Continuous,
                title,
                entries,
                gradient: Some(Gradient { extent, stops }),
            }
        }
    };

    // Null color values are painted with their own swatch.
    if colors.mode() != ColorMode::Default && colors.has_missing() {
        legend.entries.push(LegendEntry {
            label: display_name(&colors.label(&ColorKey::Missing), overrides),
            color: colors.color_for_key(&ColorKey::Missing),
            extent: None,
        });
    }
    legend
}
