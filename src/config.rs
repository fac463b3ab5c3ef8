//! Visualization configuration: what to plot and how axes, bins and kernels behave.

use crate::error::{PlotError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_BANDWIDTH_DIVISOR: f64 = 20.0;
pub const DEFAULT_BIN_COUNT: u32 = 30;
pub const DEFAULT_CONTOUR_THRESHOLDS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisMode {
    #[default]
    Free,
    Shared,
    DefineRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Histogram,
    Violin,
    Density,
    Contour,
    Scatter,
    Map,
    ChromosomeTrack,
}

impl ChartKind {
    /// Charts that plot a second value field on the y-axis.
    pub fn needs_y_field(self) -> bool {
        matches!(self, ChartKind::Contour | ChartKind::Scatter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    #[serde(default)]
    pub chart: ChartKind,
    #[serde(default)]
    pub value_field: String,
    #[serde(default)]
    pub value_field_y: Option<String>,
    #[serde(default)]
    pub color_fields: Vec<String>,
    #[serde(default)]
    pub facet_x_field: Option<String>,
    #[serde(default)]
    pub facet_y_field: Option<String>,
    #[serde(default)]
    pub axis_mode_x: AxisMode,
    #[serde(default)]
    pub axis_mode_y: AxisMode,
    #[serde(default)]
    pub range_x: Option<(f64, f64)>,
    #[serde(default)]
    pub range_y: Option<(f64, f64)>,
    #[serde(default)]
    pub bandwidth_divisor: Option<f64>,
    #[serde(default)]
    pub bin_count: Option<u32>,
    #[serde(default)]
    pub contour_thresholds: Option<u32>,
    #[serde(default)]
    pub show_mean_median: bool,
    /// Fit per-group regression bands on scatter charts.
    #[serde(default = "default_show_regression")]
    pub show_regression: bool,
    /// Label overrides for legend entries, keyed by category value.
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
}

fn default_show_regression() -> bool { true }

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            chart: ChartKind::default(),
            value_field: String::new(),
            value_field_y: None,
            color_fields: Vec::new(),
            facet_x_field: None,
            facet_y_field: None,
            axis_mode_x: AxisMode::default(),
            axis_mode_y: AxisMode::default(),
            range_x: None,
            range_y: None,
            bandwidth_divisor: None,
            bin_count: None,
            contour_thresholds: None,
            show_mean_median: false,
            show_regression: true,
            display_names: BTreeMap::new(),
        }
    }
}

impl VisualizationConfig {
    pub fn new(chart: ChartKind, value_field: impl Into<String>) -> Self {
        Self {
            chart,
            value_field: value_field.into(),
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn bandwidth_divisor(&self) -> f64 {
        self.bandwidth_divisor.unwrap_or(DEFAULT_BANDWIDTH_DIVISOR)
    }

    /// Requested bin count; 0 means "choose from the data".
    pub fn bin_count(&self) -> u32 {
        self.bin_count.unwrap_or(DEFAULT_BIN_COUNT)
    }

    pub fn contour_thresholds(&self) -> u32 {
        self.contour_thresholds.unwrap_or(DEFAULT_CONTOUR_THRESHOLDS)
    }

    /// Check parameter ranges and mode combinations. Every failure is a `ConfigError`.
    pub fn validate(&self) -> Result<()> {
        if self.value_field.trim().is_empty() && !matches!(self.chart, ChartKind::Map | ChartKind::ChromosomeTrack) {
            return Err(PlotError::config("valueField is required"));
        }

        if self.chart.needs_y_field() && self.value_field_y.as_deref().map_or(true, |f| f.trim().is_empty()) {
            return Err(PlotError::config(format!("{:?} charts require valueFieldY", self.chart)));
        }

        let divisor = self.bandwidth_divisor();
        let max_divisor = if self.chart == ChartKind::Contour { 50.0 } else { 100.0 };
        if !(1.0..=max_divisor).contains(&divisor) {
            return Err(PlotError::config(format!(
                "bandwidthDivisor {} outside [1, {}]",
                divisor, max_divisor
            )));
        }

        if self.bin_count() > 100 {
            return Err(PlotError::config(format!("binCount {} outside [0, 100]", self.bin_count())));
        }

        let thresholds = self.contour_thresholds();
        if !(10..=45).contains(&thresholds) {
            return Err(PlotError::config(format!("contourThresholds {} outside [10, 45]", thresholds)));
        }

        // A violin's x-axis holds the group slots, so its x mode is never read.
        if self.chart != ChartKind::Violin {
            validate_range("x", self.axis_mode_x, self.range_x)?;
        }
        validate_range("y", self.axis_mode_y, self.range_y)?;

        if self.chart == ChartKind::Histogram && self.axis_mode_y == AxisMode::Shared {
            return Err(PlotError::config("Shared y-axis is not supported for histograms"));
        }

        Ok(())
    }
}

fn validate_range(axis: &str, mode: AxisMode, range: Option<(f64, f64)>) -> Result<()> {
    if mode != AxisMode::DefineRange {
        return Ok(());
    }
    match range {
        None => Err(PlotError::config(format!("DefineRange on {}-axis needs range{}", axis, axis.to_uppercase()))),
        Some((min, max)) if !min.is_finite() || !max.is_finite() => {
            Err(PlotError::config(format!("range{} must be finite", axis.to_uppercase())))
        }
        Some((min, max)) if min > max => Err(PlotError::config(format!(
            "range{} has min {} greater than max {}",
            axis.to_uppercase(),
            min,
            max
        ))),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let cfg = VisualizationConfig::from_json_str(
            r#"{
                "chart": "violin",
                "valueField": "length",
                "colorFields": ["region"],
                "facetXField": "dataset",
                "axisModeY": "DefineRange",
                "rangeY": [0, 200000],
                "bandwidthDivisor": 30,
                "showMeanMedian": true
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.chart, ChartKind::Violin);
        assert_eq!(cfg.color_fields, vec!["region"]);
        assert_eq!(cfg.axis_mode_x, AxisMode::Free);
        assert_eq!(cfg.axis_mode_y, AxisMode::DefineRange);
        assert_eq!(cfg.range_y, Some((0.0, 200000.0)));
        assert_eq!(cfg.bandwidth_divisor(), 30.0);
        assert_eq!(cfg.bin_count(), DEFAULT_BIN_COUNT);
        assert!(cfg.show_mean_median);
        assert!(cfg.show_regression);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_histogram_shared_y_rejected() {
        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.axis_mode_y = AxisMode::Shared;
        match cfg.validate() {
            Err(PlotError::Config(msg)) => assert!(msg.contains("Shared")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_ranges() {
        let mut cfg = VisualizationConfig::new(ChartKind::Density, "length");
        cfg.bandwidth_divisor = Some(0.5);
        assert!(cfg.validate().is_err());

        let mut cfg = VisualizationConfig::new(ChartKind::Contour, "x");
        cfg.value_field_y = Some("y".to_string());
        cfg.bandwidth_divisor = Some(80.0);
        assert!(cfg.validate().is_err());
        cfg.bandwidth_divisor = Some(50.0);
        assert!(cfg.validate().is_ok());

        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.bin_count = Some(101);
        assert!(cfg.validate().is_err());
        cfg.bin_count = Some(0);
        assert!(cfg.validate().is_ok());

        cfg.contour_thresholds = Some(9);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_define_range_requires_range() {
        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.axis_mode_x = AxisMode::DefineRange;
        assert!(cfg.validate().is_err());
        cfg.range_x = Some((10.0, 1.0));
        assert!(cfg.validate().is_err());
        cfg.range_x = Some((1.0, 10.0));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_scatter_requires_y_field() {
        let cfg = VisualizationConfig::new(ChartKind::Scatter, "length");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_violin_ignores_x_range() {
        let mut cfg = VisualizationConfig::new(ChartKind::Violin, "length");
        cfg.axis_mode_x = AxisMode::DefineRange;
        assert!(cfg.validate().is_ok());
        cfg.axis_mode_y = AxisMode::DefineRange;
        assert!(cfg.validate().is_err());
    }
}
