use crate::color::{natural_cmp, ColorAssignment, ColorKey, GroupRank};
use crate::config::{AxisMode, ChartKind};
use crate::data::DataRecord;
use crate::error::Result;
use crate::facet::FacetPartition;
use crate::ir::{
    ContourPolygon, DensityGroup, Diagnostic, Domain, Geometry, GroupRegression, GroupSummary, PlotPoint, Point,
    RenderContext, ResolvedSpec, TrackSegment, Violin,
};
use crate::palette;
use crate::scale::{self, LinearScale};
use crate::stat::bin::{self, BinSample};
use crate::stat::{contour, kde, regression, summary};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Lane label for fragments without an `individual` field.
const UNKNOWN_LANE: &str = "unknown";

/// Everything computed for one facet cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetOutput {
    pub x_domain: Domain,
    pub y_domain: Domain,
    pub geometry: Geometry,
    pub summaries: Vec<GroupSummary>,
    pub diagnostics: Vec<Diagnostic>,
    /// Highest density in the facet; feeds a Shared density y-axis.
    pub peak: Option<f64>,
}

impl FacetOutput {
    fn empty(x_domain: Domain, y_domain: Domain, diagnostic: Diagnostic) -> Self {
        Self {
            x_domain,
            y_domain,
            geometry: Geometry::Empty,
            summaries: Vec::new(),
            diagnostics: vec![diagnostic],
            peak: None,
        }
    }
}

// =============================================================================
// Axis value accessors
// =============================================================================

/// Values a record contributes to the x-axis of the chart.
pub fn x_values(spec: &ResolvedSpec, record: &DataRecord) -> [Option<f64>; 2] {
    match spec.chart {
        ChartKind::Histogram | ChartKind::Density | ChartKind::Contour | ChartKind::Scatter => {
            [record.number(&spec.value_field), None]
        }
        ChartKind::Violin => [None, None],
        ChartKind::Map => [record.as_map().map(|m| m.longitude), None],
        ChartKind::ChromosomeTrack => match record.as_fragment() {
            Some(f) => [Some(f.start), Some(f.end)],
            None => [None, None],
        },
    }
}

/// Value a record contributes to the y-axis, for charts whose y-axis carries data.
pub fn y_value(spec: &ResolvedSpec, record: &DataRecord) -> Option<f64> {
    match spec.chart {
        ChartKind::Violin => record.number(&spec.value_field),
        ChartKind::Contour | ChartKind::Scatter => spec.value_field_y.as_deref().and_then(|f| record.number(f)),
        ChartKind::Map => record.as_map().map(|m| m.latitude),
        ChartKind::Histogram | ChartKind::Density | ChartKind::ChromosomeTrack => None,
    }
}

fn no_values(field: &str) -> Diagnostic {
    Diagnostic::data(None, format!("no numeric values for '{}' in this facet", field))
}

type Groups<T> = BTreeMap<GroupRank, (ColorKey, Vec<T>)>;

/// Collect per color group, ordered by the global group order.
fn group_by_color<T>(
    part: &FacetPartition,
    colors: &ColorAssignment,
    value: impl Fn(&DataRecord) -> Option<T>,
) -> Groups<T> {
    let mut groups: Groups<T> = BTreeMap::new();
    for (_, record) in &part.members {
        if let Some(v) = value(record) {
            let key = colors.group_key_of(record);
            groups
                .entry(colors.rank(&key))
                .or_insert_with(|| (key, Vec::new()))
                .1
                .push(v);
        }
    }
    groups
}

fn group_summaries(ctx: &RenderContext, groups: &Groups<f64>) -> Vec<GroupSummary> {
    if !ctx.spec.show_mean_median {
        return Vec::new();
    }
    groups
        .values()
        .filter_map(|(key, values)| {
            summary::summarize(values).map(|s| GroupSummary {
                key: ctx.colors.label(key),
                color: ctx.colors.color_for_key(key),
                count: s.count,
                mean: s.mean,
                median: s.median,
            })
        })
        .collect()
}

// =============================================================================
// Per-chart facet compilation
// =============================================================================

/// Compute domains and geometry for one facet.
///
/// Data and numeric problems inside the facet become diagnostics; only
/// configuration errors are returned.
pub fn compile_facet(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    debug!(
        "compiling {:?} facet ({}, {}) with {} records",
        ctx.spec.chart,
        part.col,
        part.row,
        part.members.len()
    );
    match ctx.spec.chart {
        ChartKind::Histogram => compile_histogram(part, ctx),
        ChartKind::Violin => compile_violin(part, ctx),
        ChartKind::Density => compile_density(part, ctx),
        ChartKind::Contour => compile_contour(part, ctx),
        ChartKind::Scatter => compile_scatter(part, ctx),
        ChartKind::Map => compile_map(part, ctx),
        ChartKind::ChromosomeTrack => compile_track(part, ctx),
    }
}

fn compile_histogram(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    let spec = &ctx.spec;
    let samples: Vec<BinSample> = part
        .members
        .iter()
        .filter_map(|(_, r)| {
            r.number(&spec.value_field)
                .map(|value| BinSample { value, key: ctx.colors.key_of(r) })
        })
        .collect();

    let local = scale::extent(samples.iter().map(|s| s.value));
    let x_domain = scale::resolve_value_axis(spec.axis_mode_x, spec.range_x, local, ctx.shared_x.as_ref())?;

    if samples.is_empty() {
        let y_domain = scale::resolve_magnitude_axis(spec.axis_mode_y, spec.range_y, 0.0, None)?;
        return Ok(FacetOutput::empty(x_domain, y_domain, no_values(&spec.value_field)));
    }

    let mut bins = bin::compute_bins(&samples, x_domain.bounds(), spec.bin_count, &ctx.colors);
    let peak = bins.iter().map(|b| b.total).max().unwrap_or(0) as f64;
    let y_domain = scale::resolve_magnitude_axis(spec.axis_mode_y, spec.range_y, peak, None)?;
    bin::apply_pixel_heights(&mut bins, &y_domain, part.bounds.height);

    let groups = group_by_color(part, &ctx.colors, |r| r.number(&spec.value_field));
    Ok(FacetOutput {
        x_domain,
        y_domain,
        geometry: Geometry::Bins { bins },
        summaries: group_summaries(ctx, &groups),
        diagnostics: Vec::new(),
        peak: None,
    })
}

fn compile_density(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    let spec = &ctx.spec;
    let groups = group_by_color(part, &ctx.colors, |r| r.number(&spec.value_field));
    let local = scale::extent(groups.values().flat_map(|(_, v)| v.iter().copied()));
    let x_domain = scale::resolve_value_axis(spec.axis_mode_x, spec.range_x, local, ctx.shared_x.as_ref())?;

    let Some(local) = local else {
        let y_domain = scale::resolve_magnitude_axis(spec.axis_mode_y, spec.range_y, 0.0, Some(0.0))?;
        return Ok(FacetOutput::empty(x_domain, y_domain, no_values(&spec.value_field)));
    };

    let h = kde::bandwidth(local, spec.bandwidth_divisor);
    let curves: Vec<DensityGroup> = groups
        .values()
        .map(|(key, values)| DensityGroup {
            key: ctx.colors.label(key),
            color: ctx.colors.color_for_key(key),
            curve: kde::density_curve(values, h, x_domain.bounds(), kde::DENSITY_SAMPLES),
        })
        .collect();

    let peak = curves.iter().map(|c| c.curve.peak()).fold(0.0, f64::max);
    // A Shared axis is replaced once every facet's peak is known.
    let y_domain = scale::resolve_magnitude_axis(spec.axis_mode_y, spec.range_y, peak, Some(peak))?;

    Ok(FacetOutput {
        x_domain,
        y_domain,
        geometry: Geometry::Densities { curves },
        summaries: group_summaries(ctx, &groups),
        diagnostics: Vec::new(),
        peak: Some(peak),
    })
}

fn compile_violin(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    let spec = &ctx.spec;
    let colors = &ctx.colors;
    let groups = group_by_color(part, colors, |r| r.number(&spec.value_field));
    let local = scale::extent(groups.values().flat_map(|(_, v)| v.iter().copied()));
    let y_domain = scale::resolve_value_axis(spec.axis_mode_y, spec.range_y, local, ctx.shared_y.as_ref())?;

    let n_slots = colors.slot_count();
    let x_domain = Domain::new(0.0, n_slots as f64, AxisMode::Shared);

    let Some(local) = local else {
        return Ok(FacetOutput::empty(x_domain, y_domain, no_values(&spec.value_field)));
    };

    let h = kde::bandwidth(local, spec.bandwidth_divisor);
    let curves: Vec<(&ColorKey, usize, _)> = groups
        .values()
        .filter_map(|(key, values)| {
            let slot = colors.slot_of(key)?;
            Some((key, slot, kde::density_curve(values, h, y_domain.bounds(), kde::DENSITY_SAMPLES)))
        })
        .collect();

    // One width normalization for the whole facet.
    let facet_peak = curves.iter().map(|(_, _, c)| c.peak()).fold(0.0, f64::max);
    let slot_width = part.bounds.width / n_slots as f64;
    let y_px = LinearScale::new(y_domain.bounds(), (part.bounds.height, 0.0));
    let half_width = |d: f64| if facet_peak > 0.0 { d / facet_peak * slot_width / 2.0 } else { 0.0 };

    let violins = curves
        .into_iter()
        .map(|(key, slot, curve)| {
            let center_px = (slot as f64 + 0.5) * slot_width;
            let right = curve.points.iter().map(|&(y, d)| (center_px + half_width(d), y_px.map(y)));
            let left = curve.points.iter().rev().map(|&(y, d)| (center_px - half_width(d), y_px.map(y)));
            let mut outline: Vec<Point> = right.chain(left).collect();
            if let Some(&first) = outline.first() {
                outline.push(first);
            }
            Violin {
                key: colors.label(key),
                color: colors.color_for_key(key),
                slot,
                center_px,
                curve,
                outline,
            }
        })
        .collect();

    Ok(FacetOutput {
        x_domain,
        y_domain,
        geometry: Geometry::Violins { violins },
        summaries: group_summaries(ctx, &groups),
        diagnostics: Vec::new(),
        peak: None,
    })
}

/// Finite `(x, y)` pairs of the facet with their record index.
fn value_pairs(part: &FacetPartition, spec: &ResolvedSpec) -> Vec<(usize, f64, f64)> {
    part.members
        .iter()
        .filter_map(|(i, r)| Some((*i, x_values(spec, r)[0]?, y_value(spec, r)?)))
        .collect()
}

fn pair_domains(ctx: &RenderContext, pairs: &[(usize, f64, f64)]) -> Result<(Domain, Domain)> {
    let spec = &ctx.spec;
    let local_x = scale::extent(pairs.iter().map(|p| p.1));
    let local_y = scale::extent(pairs.iter().map(|p| p.2));
    let x_domain = scale::resolve_value_axis(spec.axis_mode_x, spec.range_x, local_x, ctx.shared_x.as_ref())?;
    let y_domain = scale::resolve_value_axis(spec.axis_mode_y, spec.range_y, local_y, ctx.shared_y.as_ref())?;
    Ok((x_domain, y_domain))
}

fn compile_contour(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    let spec = &ctx.spec;
    let pairs = value_pairs(part, spec);
    let (x_domain, y_domain) = pair_domains(ctx, &pairs)?;

    if pairs.is_empty() {
        return Ok(FacetOutput::empty(x_domain, y_domain, no_values(&spec.value_field)));
    }

    let (width, height) = (part.bounds.width, part.bounds.height);
    let sx = LinearScale::new(x_domain.bounds(), (0.0, width));
    let sy = LinearScale::new(y_domain.bounds(), (height, 0.0));
    let projected: Vec<Point> = pairs.iter().map(|&(_, x, y)| (sx.map(x), sy.map(y))).collect();

    let px_extent = scale::extent(projected.iter().map(|p| p.0)).map_or(0.0, |(lo, hi)| hi - lo);
    let bandwidth = (px_extent / spec.bandwidth_divisor).max(contour::CELL_SIZE);

    let levels = contour::contour_density(&projected, width, height, bandwidth, spec.contour_thresholds);
    let level_extent = match (levels.first(), levels.last()) {
        (Some(lo), Some(hi)) => (lo.0, hi.0),
        _ => (0.0, 1.0),
    };
    let polygons = levels
        .into_iter()
        .map(|(value, ring)| ContourPolygon {
            value,
            color: palette::sequential_over(level_extent, value),
            ring,
        })
        .collect();

    Ok(FacetOutput {
        x_domain,
        y_domain,
        geometry: Geometry::Contours { polygons },
        summaries: Vec::new(),
        diagnostics: Vec::new(),
        peak: None,
    })
}

fn compile_scatter(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    let spec = &ctx.spec;
    let colors = &ctx.colors;
    let pairs = value_pairs(part, spec);
    let (x_domain, y_domain) = pair_domains(ctx, &pairs)?;

    if pairs.is_empty() {
        return Ok(FacetOutput::empty(x_domain, y_domain, no_values(&spec.value_field)));
    }

    let records: BTreeMap<usize, &DataRecord> = part.members.iter().copied().collect();
    let points: Vec<PlotPoint> = pairs
        .iter()
        .map(|&(record, x, y)| PlotPoint { x, y, color: colors.color_of(records[&record]), record })
        .collect();

    let mut regressions = Vec::new();
    let mut diagnostics = Vec::new();
    if spec.show_regression {
        let groups = group_by_color(part, colors, |r| Some((x_values(spec, r)[0]?, y_value(spec, r)?)));
        for (key, pts) in groups.values() {
            match regression::fit_band(pts, regression::REGRESSION_SAMPLES) {
                Ok(band) => regressions.push(GroupRegression {
                    key: colors.label(key),
                    color: colors.color_for_key(key),
                    band,
                }),
                Err(e) => diagnostics.push(Diagnostic::numeric(Some(colors.label(key)), e.to_string())),
            }
        }
    }

    Ok(FacetOutput {
        x_domain,
        y_domain,
        geometry: Geometry::Scatter { points, regressions },
        summaries: Vec::new(),
        diagnostics,
        peak: None,
    })
}

fn compile_map(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    let spec = &ctx.spec;
    let points: Vec<PlotPoint> = part
        .members
        .iter()
        .filter_map(|&(record, r)| {
            r.as_map().map(|m| PlotPoint {
                x: m.longitude,
                y: m.latitude,
                color: ctx.colors.color_of(r),
                record,
            })
        })
        .collect();

    let local_x = scale::extent(points.iter().map(|p| p.x));
    let local_y = scale::extent(points.iter().map(|p| p.y));
    let x_domain = scale::resolve_value_axis(spec.axis_mode_x, spec.range_x, local_x, ctx.shared_x.as_ref())?;
    let y_domain = scale::resolve_value_axis(spec.axis_mode_y, spec.range_y, local_y, ctx.shared_y.as_ref())?;

    if points.is_empty() {
        let diagnostic = Diagnostic::data(None, "no records with latitude/longitude in this facet");
        return Ok(FacetOutput::empty(x_domain, y_domain, diagnostic));
    }

    Ok(FacetOutput {
        x_domain,
        y_domain,
        geometry: Geometry::Points { points },
        summaries: Vec::new(),
        diagnostics: Vec::new(),
        peak: None,
    })
}

fn compile_track(part: &FacetPartition, ctx: &RenderContext) -> Result<FacetOutput> {
    let spec = &ctx.spec;
    let fragments: Vec<(usize, &DataRecord, String)> = part
        .members
        .iter()
        .filter_map(|&(i, r)| {
            let frag = r.as_fragment()?;
            Some((i, r, frag.individual().unwrap_or_else(|| UNKNOWN_LANE.to_string())))
        })
        .collect();

    let mut lanes: Vec<String> = fragments
        .iter()
        .map(|(_, _, lane)| lane.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    lanes.sort_by(|a, b| natural_cmp(a, b));

    let local = scale::extent(fragments.iter().flat_map(|(_, r, _)| x_values(spec, r).into_iter().flatten()));
    let x_domain = scale::resolve_value_axis(spec.axis_mode_x, spec.range_x, local, ctx.shared_x.as_ref())?;
    let y_domain = Domain::new(0.0, lanes.len().max(1) as f64, AxisMode::Free);

    if fragments.is_empty() {
        let diagnostic = Diagnostic::data(None, "no fragment records in this facet");
        return Ok(FacetOutput::empty(x_domain, y_domain, diagnostic));
    }

    let lane_index: BTreeMap<&str, usize> = lanes.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();
    let segments = fragments
        .iter()
        .filter_map(|(record, r, lane)| {
            let frag = r.as_fragment()?;
            Some(TrackSegment {
                start: frag.start,
                end: frag.end,
                lane: lane_index[lane.as_str()],
                color: ctx.colors.color_of(r),
                record: *record,
            })
        })
        .collect();

    Ok(FacetOutput {
        x_domain,
        y_domain,
        geometry: Geometry::Track { lanes, segments },
        summaries: Vec::new(),
        diagnostics: Vec::new(),
        peak: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualizationConfig;
    use crate::data::Dataset;
    use crate::facet::partition_records;
    use crate::legend::build_legend;
    use crate::resolve::resolve_spec;
    use crate::RenderOptions;
    use serde_json::json;

    fn context(records: &[DataRecord], config: &VisualizationConfig) -> RenderContext {
        let spec = resolve_spec(config, records).unwrap();
        let colors = ColorAssignment::build(records, &spec.color_fields, spec.chart, &spec.value_field);
        let legend = build_legend(&colors, &spec.display_names);
        RenderContext { spec, colors, legend, shared_x: None, shared_y: None, options: RenderOptions::default() }
    }

    fn compile_single(records: &[DataRecord], config: &VisualizationConfig) -> FacetOutput {
        let ctx = context(records, config);
        let (_, parts) = partition_records(records, None, None, &ctx.options);
        compile_facet(&parts[0], &ctx).unwrap()
    }

    #[test]
    fn test_violin_slots_and_outline() {
        let data = Dataset::from_json(&json!([
            {"pop": "a", "length": 1.0}, {"pop": "a", "length": 2.0},
            {"pop": "b", "length": 5.0}, {"pop": "b", "length": 6.0}
        ]))
        .unwrap()
        .records;
        let mut cfg = VisualizationConfig::new(ChartKind::Violin, "length");
        cfg.color_fields = vec!["pop".into()];
        let out = compile_single(&data, &cfg);

        assert_eq!(out.x_domain.bounds(), (0.0, 2.0));
        let Geometry::Violins { violins } = &out.geometry else { panic!("expected violins") };
        assert_eq!(violins.len(), 2);
        assert_eq!(violins[0].slot, 0);
        assert_eq!(violins[1].center_px, 600.0);
        let widest = violins
            .iter()
            .flat_map(|v| v.outline.iter().map(move |p| p.0 - v.center_px))
            .fold(0.0, f64::max);
        assert!((widest - 200.0).abs() < 1e-9);
        assert_eq!(violins[0].outline.first(), violins[0].outline.last());
    }

    #[test]
    fn test_scatter_small_group_diagnostic() {
        let data = Dataset::from_json(&json!([
            {"g": "a", "x": 1, "y": 2}, {"g": "a", "x": 2, "y": 4}, {"g": "a", "x": 3, "y": 6},
            {"g": "b", "x": 1, "y": 1}
        ]))
        .unwrap()
        .records;
        let mut cfg = VisualizationConfig::new(ChartKind::Scatter, "x");
        cfg.value_field_y = Some("y".into());
        cfg.color_fields = vec!["g".into()];
        let out = compile_single(&data, &cfg);

        let Geometry::Scatter { points, regressions } = &out.geometry else { panic!("expected scatter") };
        assert_eq!(points.len(), 4);
        assert_eq!(regressions.len(), 1);
        assert_eq!(regressions[0].key, "a");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].group.as_deref(), Some("b"));
    }

    #[test]
    fn test_contour_single_point() {
        let data = Dataset::from_json(&json!([{"x": 1.0, "y": 1.0}])).unwrap().records;
        let mut cfg = VisualizationConfig::new(ChartKind::Contour, "x");
        cfg.value_field_y = Some("y".into());
        let out = compile_single(&data, &cfg);
        let Geometry::Contours { polygons } = &out.geometry else { panic!("expected contours") };
        assert!(!polygons.is_empty());
        for w in polygons.windows(2) {
            assert!(w[0].value < w[1].value);
        }
    }

    #[test]
    fn test_track_lanes() {
        let data = Dataset::from_json(&json!([
            {"chrom": "1", "start": 100, "end": 200, "individual": "B"},
            {"chrom": "1", "start": 50, "end": 120, "individual": "A"},
            {"chrom": "1", "start": 300, "end": 400}
        ]))
        .unwrap()
        .records;
        let cfg = VisualizationConfig::new(ChartKind::ChromosomeTrack, "");
        let out = compile_single(&data, &cfg);
        let Geometry::Track { lanes, segments } = &out.geometry else { panic!("expected track") };
        assert_eq!(lanes, &vec!["A".to_string(), "B".to_string(), "unknown".to_string()]);
        assert_eq!(segments[0].lane, 1);
        assert!(out.x_domain.min < 50.0 && out.x_domain.max > 400.0);
    }

    #[test]
    fn test_missing_values_recorded() {
        let data = Dataset::from_json(&json!([{"length": null}, {"length": "n/a"}])).unwrap().records;
        let cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        let out = compile_single(&data, &cfg);
        assert_eq!(out.geometry, Geometry::Empty);
        assert_eq!(out.diagnostics.len(), 1);
    }
}
