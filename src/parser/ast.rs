// AST for the fragplot pipeline DSL

use crate::config::{AxisMode, ChartKind};
use std::collections::BTreeMap;

/// `aes(x: f, y: f, color: f | [f, g])`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aesthetics {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Vec<String>,
}

/// The chart geometry and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Geom {
    pub chart: ChartKind,
    pub bins: Option<u32>,
    pub bandwidth: Option<f64>,
    pub thresholds: Option<u32>,
    pub regression: Option<bool>,
}

impl Geom {
    pub fn new(chart: ChartKind) -> Self {
        Self { chart, bins: None, bandwidth: None, thresholds: None, regression: None }
    }
}

/// `facet_grid(x: f, y: g)`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Facet {
    pub x: Option<String>,
    pub y: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Axis mode directive: `scale_x_free()`, `scale_y_shared()`, `xlim(a, b)`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct AxisScale {
    pub axis: Axis,
    pub mode: AxisMode,
    pub limits: Option<(f64, f64)>,
}

/// `names(key: "Label", ...)`
pub type DisplayNames = BTreeMap<String, String>;
