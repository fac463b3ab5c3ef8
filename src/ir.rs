use crate::color::ColorAssignment;
use crate::config::{AxisMode, ChartKind};
use crate::data::DataRecord;
use crate::legend::Legend;
use crate::RenderOptions;
use serde::Serialize;
use std::collections::BTreeMap;

/// Pixel or data-space coordinate pair.
pub type Point = (f64, f64);

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// Configuration checked against the record set, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSpec {
    pub chart: ChartKind,
    pub value_field: String,
    pub value_field_y: Option<String>,
    pub color_fields: Vec<String>,
    pub facet_x: Option<String>,
    pub facet_y: Option<String>,
    pub axis_mode_x: AxisMode,
    pub axis_mode_y: AxisMode,
    pub range_x: Option<(f64, f64)>,
    pub range_y: Option<(f64, f64)>,
    pub bin_count: usize,
    pub bandwidth_divisor: f64,
    pub contour_thresholds: usize,
    pub show_mean_median: bool,
    pub show_regression: bool,
    pub display_names: BTreeMap<String, String>,
}

/// Values computed once per call and shared, read-only, by every facet.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub spec: ResolvedSpec,
    pub colors: ColorAssignment,
    pub legend: Legend,
    pub shared_x: Option<Domain>,
    pub shared_y: Option<Domain>,
    pub options: RenderOptions,
}

// =============================================================================
// Phase 2: Faceting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetLayout {
    pub nrow: usize,
    pub ncol: usize,
    pub width: f64,
    pub height: f64,
    /// Column labels; empty when the x facet axis is not split.
    pub x_values: Vec<String>,
    /// Row labels; empty when the y facet axis is not split.
    pub y_values: Vec<String>,
}

// =============================================================================
// Phase 3: Scaling
// =============================================================================

/// Resolved `[min, max]` of one axis, tagged with the mode that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
    pub mode: AxisMode,
}

impl Domain {
    pub fn new(min: f64, max: f64, mode: AxisMode) -> Self {
        Self { min, max, mode }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

// =============================================================================
// Phase 4: Geometry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinSegment {
    pub key: String,
    pub color: String,
    pub count: usize,
    /// Share of the bin's pixel height, stacked from the baseline.
    pub height_px: f64,
    pub offset_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub x0: f64,
    pub x1: f64,
    pub total: usize,
    pub height_px: f64,
    pub segments: Vec<BinSegment>,
}

/// `(x, density)` samples in ascending x.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DensityCurve {
    pub points: Vec<Point>,
}

impl DensityCurve {
    pub fn peak(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityGroup {
    pub key: String,
    pub color: String,
    pub curve: DensityCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violin {
    pub key: String,
    pub color: String,
    /// Horizontal slot within the facet, from the global color order.
    pub slot: usize,
    pub center_px: f64,
    pub curve: DensityCurve,
    /// Closed outline in cell pixel coordinates: right side upward, left side back down.
    pub outline: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourPolygon {
    pub value: f64,
    pub color: String,
    /// Closed rings in cell pixel coordinates (outer rings and holes, even-odd fill).
    pub ring: Vec<Vec<Point>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionSample {
    pub x: f64,
    pub y_predicted: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionBand {
    pub slope: f64,
    pub intercept: f64,
    pub n: usize,
    pub samples: Vec<RegressionSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRegression {
    pub key: String,
    pub color: String,
    pub band: RegressionBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub color: String,
    /// Index of the source record in the input slice.
    pub record: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSegment {
    pub start: f64,
    pub end: f64,
    pub lane: usize,
    pub color: String,
    pub record: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub color: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
}

/// The single geometry payload of a facet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Bins { bins: Vec<Bin> },
    Violins { violins: Vec<Violin> },
    Densities { curves: Vec<DensityGroup> },
    Contours { polygons: Vec<ContourPolygon> },
    Scatter { points: Vec<PlotPoint>, regressions: Vec<GroupRegression> },
    Points { points: Vec<PlotPoint> },
    Track { lanes: Vec<String>, segments: Vec<TrackSegment> },
    /// Nothing to draw; see the plan diagnostics.
    Empty,
}

// =============================================================================
// Phase 5: Render Plan
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Data,
    Numeric,
}

/// A locally recovered error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub facet: Option<usize>,
    pub group: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn data(group: Option<String>, message: impl Into<String>) -> Self {
        Self { kind: DiagnosticKind::Data, facet: None, group, message: message.into() }
    }

    pub fn numeric(group: Option<String>, message: impl Into<String>) -> Self {
        Self { kind: DiagnosticKind::Numeric, facet: None, group, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetCell {
    pub facet_x: Option<String>,
    pub facet_y: Option<String>,
    pub row: usize,
    pub col: usize,
    pub bounds: Bounds,
    /// Indices of the member records in the input slice.
    pub records: Vec<usize>,
    pub x_domain: Domain,
    pub y_domain: Domain,
    pub geometry: Geometry,
    pub summaries: Vec<GroupSummary>,
}

/// Everything the paint layer needs. It must not re-derive colors, domains or bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub chart: ChartKind,
    pub layout: FacetLayout,
    pub facets: Vec<FacetCell>,
    pub legend: Legend,
    pub color: ColorAssignment,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderPlan {
    pub fn color_of(&self, record: &DataRecord) -> String {
        self.color.color_of(record)
    }
}
