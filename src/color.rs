//! Color assignment: one record → color function per computation, shared by
//! every facet and by the legend.

use crate::config::ChartKind;
use crate::data::{format_number, DataRecord, Scalar};
use crate::facet::chromosome_cmp;
use crate::palette::{self, DEFAULT_COLOR, FALLBACK_GRAY, MISSING_COLOR};
use crate::scale;
use crate::stat::summary;
use log::debug;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Separator between the values of a multi-field color key.
pub const KEY_SEPARATOR: &str = " / ";

const MISSING_LABEL: &str = "NA";
const DEFAULT_LABEL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Default,
    Discrete,
    Continuous,
}

/// The color-relevant value of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorKey {
    Default,
    Category(String),
    Value(f64),
    /// Null or missing color value.
    Missing,
}

/// Sort key for color groups inside a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupRank {
    Slot(usize),
    Value(OrderedFloat<f64>),
    Missing,
}

pub fn is_chromosome_field(field: &str) -> bool {
    matches!(field.to_ascii_lowercase().as_str(), "chrom" | "chromosome" | "chr")
}

/// Label as a finite number; `NaN` and `inf` spellings count as text.
fn finite_number(label: &str) -> Option<f64> {
    label.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numbers first in numeric order, then text in lexicographic order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (finite_number(a), finite_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorAssignment {
    mode: ColorMode,
    fields: Vec<String>,
    global_color_order: Vec<String>,
    /// Parallel to `global_color_order`.
    colors: Vec<String>,
    extent: Option<(f64, f64)>,
    default_color: String,
    has_missing: bool,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ColorAssignment {
    /// Single default color for every record.
    pub fn uniform() -> Self {
        Self {
            mode: ColorMode::Default,
            fields: Vec::new(),
            global_color_order: Vec::new(),
            colors: Vec::new(),
            extent: None,
            default_color: DEFAULT_COLOR.to_string(),
            has_missing: false,
            index: HashMap::new(),
        }
    }

    /// Fix the assignment for one computation from the full record set.
    pub fn build(records: &[DataRecord], fields: &[String], chart: ChartKind, value_field: &str) -> Self {
        let fields: Vec<String> = fields.iter().filter(|f| !f.trim().is_empty()).cloned().collect();
        if fields.is_empty() {
            return Self::uniform();
        }

        let single = if fields.len() == 1 { Some(fields[0].as_str()) } else { None };
        let curated = single.and_then(palette::curated_palette);

        if let Some(field) = single.filter(|f| curated.is_none() && !is_chromosome_field(f)) {
            if let Some((min, max)) = continuous_extent(records, field) {
                debug!("color field '{}' is continuous over [{}, {}]", field, min, max);
                let has_missing = records.iter().any(|r| r.number(field).is_none());
                return Self {
                    mode: ColorMode::Continuous,
                    fields,
                    global_color_order: Vec::new(),
                    colors: Vec::new(),
                    extent: Some(scale::widen_degenerate(min, max)),
                    default_color: DEFAULT_COLOR.to_string(),
                    has_missing,
                    index: HashMap::new(),
                };
            }
        }

        let mut categories = BTreeSet::new();
        let mut has_missing = false;
        for record in records {
            match composite_key(record, &fields) {
                Some(key) => {
                    categories.insert(key);
                }
                None => has_missing = true,
            }
        }
        let categories: Vec<String> = categories.into_iter().collect();

        let order = if chart == ChartKind::Violin {
            order_by_mean(records, &fields, categories, value_field)
        } else if let Some(table) = curated {
            order_by_table(table, categories)
        } else if single.is_some_and(is_chromosome_field) {
            let mut categories = categories;
            categories.sort_by(|a, b| chromosome_cmp(a, b).then_with(|| natural_cmp(a, b)));
            categories
        } else {
            let mut categories = categories;
            categories.sort_by(|a, b| natural_cmp(a, b));
            categories
        };

        let colors: Vec<String> = match curated {
            Some(table) => order
                .iter()
                .map(|key| {
                    table
                        .iter()
                        .find(|(k, _)| k == key)
                        .map_or(FALLBACK_GRAY, |(_, c)| *c)
                        .to_string()
                })
                .collect(),
            None => (0..order.len()).map(|i| palette::ordinal_color(i).to_string()).collect(),
        };

        debug!("color field(s) {:?} are discrete with {} categories", fields, order.len());
        let index = order.iter().enumerate().map(|(i, k)| (k.clone(), i)).collect();
        Self {
            mode: ColorMode::Discrete,
            fields,
            global_color_order: order,
            colors,
            extent: None,
            default_color: DEFAULT_COLOR.to_string(),
            has_missing,
            index,
        }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn global_color_order(&self) -> &[String] {
        &self.global_color_order
    }

    /// Continuous extent, if the assignment is continuous.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.extent
    }

    pub fn default_color(&self) -> &str {
        &self.default_color
    }

    /// Whether some record has a null color value.
    pub fn has_missing(&self) -> bool {
        self.has_missing
    }

    pub fn key_of(&self, record: &DataRecord) -> ColorKey {
        match self.mode {
            ColorMode::Default => ColorKey::Default,
            ColorMode::Discrete => composite_key(record, &self.fields).map_or(ColorKey::Missing, ColorKey::Category),
            ColorMode::Continuous => record.number(&self.fields[0]).map_or(ColorKey::Missing, ColorKey::Value),
        }
    }

    /// Key used to group records for per-group statistics. Continuous fields
    /// don't split groups.
    pub fn group_key_of(&self, record: &DataRecord) -> ColorKey {
        match self.mode {
            ColorMode::Continuous => ColorKey::Default,
            _ => self.key_of(record),
        }
    }

    pub fn color_of(&self, record: &DataRecord) -> String {
        self.color_for_key(&self.key_of(record))
    }

    pub fn color_for_key(&self, key: &ColorKey) -> String {
        match key {
            ColorKey::Default => self.default_color.clone(),
            ColorKey::Missing => MISSING_COLOR.to_string(),
            ColorKey::Category(c) => match self.index.get(c) {
                Some(&i) => self.colors[i].clone(),
                None => FALLBACK_GRAY.to_string(),
            },
            ColorKey::Value(v) => self.color_for_value(*v),
        }
    }

    pub fn color_for_value(&self, value: f64) -> String {
        match self.extent {
            Some(extent) => palette::sequential_over(extent, value),
            None => self.default_color.clone(),
        }
    }

    pub fn rank(&self, key: &ColorKey) -> GroupRank {
        match key {
            ColorKey::Default => GroupRank::Slot(0),
            ColorKey::Category(c) => self
                .index
                .get(c)
                .map_or(GroupRank::Slot(self.global_color_order.len()), |&i| GroupRank::Slot(i)),
            ColorKey::Value(v) => GroupRank::Value(OrderedFloat(*v)),
            ColorKey::Missing => GroupRank::Missing,
        }
    }

    pub fn label(&self, key: &ColorKey) -> String {
        match key {
            ColorKey::Default => DEFAULT_LABEL.to_string(),
            ColorKey::Category(c) => c.clone(),
            ColorKey::Value(v) => format_number(*v),
            ColorKey::Missing => MISSING_LABEL.to_string(),
        }
    }

    /// Number of horizontal group slots in a violin facet. Identical for every facet.
    pub fn slot_count(&self) -> usize {
        match self.mode {
            ColorMode::Discrete => (self.global_color_order.len() + usize::from(self.has_missing)).max(1),
            _ => 1,
        }
    }

    /// Horizontal slot of a group key; null values take the trailing slot.
    pub fn slot_of(&self, key: &ColorKey) -> Option<usize> {
        match key {
            ColorKey::Default => Some(0),
            ColorKey::Category(c) => self.index.get(c).copied(),
            ColorKey::Missing if self.has_missing => Some(self.global_color_order.len()),
            _ => None,
        }
    }
}

/// Joined category values of all color fields; `None` if any is null.
fn composite_key(record: &DataRecord, fields: &[String]) -> Option<String> {
    let parts = fields.iter().map(|f| record.category(f)).collect::<Option<Vec<String>>>()?;
    Some(parts.join(KEY_SEPARATOR))
}

/// Extent of a field whose every non-null value is numeric.
fn continuous_extent(records: &[DataRecord], field: &str) -> Option<(f64, f64)> {
    let mut values = Vec::new();
    for record in records {
        match record.get(field) {
            Scalar::Number(v) if v.is_finite() => values.push(*v),
            Scalar::Text(s) if !s.trim().is_empty() => return None,
            _ => {}
        }
    }
    scale::extent(values)
}

fn order_by_table(table: &[(&str, &str)], categories: Vec<String>) -> Vec<String> {
    let mut order: Vec<String> = table
        .iter()
        .filter(|(k, _)| categories.iter().any(|c| c == k))
        .map(|(k, _)| k.to_string())
        .collect();
    let mut rest: Vec<String> = categories.into_iter().filter(|c| !order.contains(c)).collect();
    rest.sort_by(|a, b| natural_cmp(a, b));
    order.extend(rest);
    order
}

/// Ascending mean of the value field per category; categories without values go last.
fn order_by_mean(records: &[DataRecord], fields: &[String], categories: Vec<String>, value_field: &str) -> Vec<String> {
    let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let (Some(key), Some(v)) = (composite_key(record, fields), record.number(value_field)) {
            values.entry(key).or_default().push(v);
        }
    }

    let mut ranked: Vec<(String, Option<f64>)> = categories
        .into_iter()
        .map(|c| {
            let mean = values.get(&c).and_then(|v| summary::mean(v));
            (c, mean)
        })
        .collect();
    ranked.sort_by(|(a, ma), (b, mb)| match (ma, mb) {
        (Some(x), Some(y)) => x.total_cmp(y).then_with(|| natural_cmp(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => natural_cmp(a, b),
    });
    ranked.into_iter().map(|(c, _)| c).collect()
}
