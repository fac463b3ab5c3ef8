// Render plan assembler: resolve, color, facet, scale and compile in one pass

use crate::color::ColorAssignment;
use crate::compiler::{self, FacetOutput};
use crate::config::{AxisMode, ChartKind, VisualizationConfig};
use crate::data::DataRecord;
use crate::error::Result;
use crate::facet;
use crate::ir::{Diagnostic, FacetCell, RenderContext, RenderPlan, ResolvedSpec};
use crate::legend::build_legend;
use crate::resolve::resolve_spec;
use crate::scale;
use crate::RenderOptions;
use log::{debug, info, warn};

/// Compute a render plan with the default canvas size.
pub fn compute_render_plan(records: &[DataRecord], config: &VisualizationConfig) -> Result<RenderPlan> {
    compute_render_plan_with_options(records, config, &RenderOptions::default())
}

/// Compute the full render plan for `records`.
///
/// Configuration errors are returned. Data and numeric problems confined to a
/// facet or group are recovered and listed in `RenderPlan::diagnostics`.
pub fn compute_render_plan_with_options(
    records: &[DataRecord],
    config: &VisualizationConfig,
    options: &RenderOptions,
) -> Result<RenderPlan> {
    info!("computing {:?} plan over {} records", config.chart, records.len());

    // 1. Resolve config against the records
    let spec = resolve_spec(config, records)?;

    // 2. Fix colors and legend once for the whole call
    let colors = ColorAssignment::build(records, &spec.color_fields, spec.chart, &spec.value_field);
    let legend = build_legend(&colors, &spec.display_names);

    // 3. Shared domains, computed once over every record
    let shared_x = shares_x(&spec).then(|| {
        scale::shared_domain(records.iter().flat_map(|r| compiler::x_values(&spec, r).into_iter().flatten()))
    });
    let shared_y = shares_y(&spec).then(|| scale::shared_domain(records.iter().filter_map(|r| compiler::y_value(&spec, r))));

    let ctx = RenderContext { spec, colors, legend, shared_x, shared_y, options: options.clone() };

    // 4. Partition and compile every facet
    let (layout, partitions) = facet::partition_records(
        records,
        ctx.spec.facet_x.as_deref(),
        ctx.spec.facet_y.as_deref(),
        &ctx.options,
    );
    debug!("facet grid is {} x {}", layout.ncol, layout.nrow);

    let mut diagnostics = Vec::new();
    if records.is_empty() {
        warn!("dataset is empty");
        diagnostics.push(Diagnostic::data(None, "dataset is empty"));
    }

    let mut facets = Vec::with_capacity(partitions.len());
    let mut peaks = Vec::with_capacity(partitions.len());
    for (idx, part) in partitions.iter().enumerate() {
        let FacetOutput { x_domain, y_domain, geometry, summaries, diagnostics: issues, peak } =
            compiler::compile_facet(part, &ctx)?;
        for mut issue in issues {
            warn!("facet {}: {}", idx, issue.message);
            issue.facet = Some(idx);
            diagnostics.push(issue);
        }
        peaks.push(peak);
        facets.push(FacetCell {
            facet_x: part.facet_x.clone(),
            facet_y: part.facet_y.clone(),
            row: part.row,
            col: part.col,
            bounds: part.bounds,
            records: part.record_indices(),
            x_domain,
            y_domain,
            geometry,
            summaries,
        });
    }

    // 5. A Shared density axis needs every facet's peak first
    if ctx.spec.chart == ChartKind::Density && ctx.spec.axis_mode_y == AxisMode::Shared {
        let global_peak = peaks.iter().flatten().copied().fold(0.0, f64::max);
        let shared = scale::resolve_magnitude_axis(AxisMode::Shared, None, global_peak, Some(global_peak))?;
        for cell in &mut facets {
            cell.y_domain = shared;
        }
    }

    let RenderContext { spec, colors, legend, .. } = ctx;
    Ok(RenderPlan { chart: spec.chart, layout, facets, legend, color: colors, diagnostics })
}

/// Charts whose x-axis carries a data variable that can be shared.
fn shares_x(spec: &ResolvedSpec) -> bool {
    spec.axis_mode_x == AxisMode::Shared && spec.chart != ChartKind::Violin
}

/// Charts whose y-axis carries a data variable that can be shared.
fn shares_y(spec: &ResolvedSpec) -> bool {
    spec.axis_mode_y == AxisMode::Shared
        && matches!(spec.chart, ChartKind::Violin | ChartKind::Contour | ChartKind::Scatter | ChartKind::Map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::ir::{DiagnosticKind, Geometry};
    use serde_json::json;

    fn fragments() -> Vec<DataRecord> {
        Dataset::from_json(&json!([
            {"chrom": "1", "start": 0, "end": 100, "dataset": "HGDP", "region": "Africa"},
            {"chrom": "1", "start": 0, "end": 300, "dataset": "1KG", "region": "Europe"},
            {"chrom": "2", "start": 0, "end": 200, "dataset": "HGDP", "region": "Europe"},
            {"chrom": "2", "start": 0, "end": 900, "dataset": "1KG", "region": "Africa"}
        ]))
        .unwrap()
        .records
    }

    fn with_length(records: Vec<DataRecord>) -> Vec<DataRecord> {
        let rows: Vec<serde_json::Value> = records
            .iter()
            .map(|r| {
                let mut obj = serde_json::Map::new();
                for (k, v) in r.fields() {
                    obj.insert(k.clone(), serde_json::to_value(v).unwrap());
                }
                let frag = r.as_fragment().unwrap();
                obj.insert("length".into(), json!(frag.length()));
                serde_json::Value::Object(obj)
            })
            .collect();
        Dataset::from_json(&serde_json::Value::Array(rows)).unwrap().records
    }

    #[test]
    fn test_empty_dataset_recovered() {
        let cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        let plan = compute_render_plan(&[], &cfg).unwrap();
        assert_eq!(plan.facets.len(), 1);
        assert_eq!(plan.facets[0].geometry, Geometry::Empty);
        assert!(plan.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Data && d.facet.is_none()));
        assert!(plan.facets[0].x_domain.span() > 0.0);
    }

    #[test]
    fn test_shared_x_identical_across_facets() {
        let data = with_length(fragments());
        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.facet_x_field = Some("dataset".into());
        cfg.axis_mode_x = AxisMode::Shared;
        let plan = compute_render_plan(&data, &cfg).unwrap();
        assert_eq!(plan.facets.len(), 2);
        assert_eq!(plan.facets[0].x_domain, plan.facets[1].x_domain);
        assert_eq!(plan.facets[0].x_domain.mode, AxisMode::Shared);
    }

    #[test]
    fn test_shared_density_axis_is_global_peak() {
        let data = with_length(fragments());
        let mut cfg = VisualizationConfig::new(ChartKind::Density, "length");
        cfg.facet_x_field = Some("dataset".into());
        cfg.axis_mode_y = AxisMode::Shared;
        let plan = compute_render_plan(&data, &cfg).unwrap();
        assert_eq!(plan.facets[0].y_domain, plan.facets[1].y_domain);
        let peak = plan
            .facets
            .iter()
            .flat_map(|f| match &f.geometry {
                Geometry::Densities { curves } => curves.iter().map(|c| c.curve.peak()).collect(),
                _ => Vec::new(),
            })
            .fold(0.0, f64::max);
        assert!((plan.facets[0].y_domain.max - peak * 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_violin_slots_stable_across_facets() {
        let data = with_length(fragments());
        let mut cfg = VisualizationConfig::new(ChartKind::Violin, "length");
        cfg.color_fields = vec!["region".into()];
        cfg.facet_x_field = Some("dataset".into());
        let plan = compute_render_plan(&data, &cfg).unwrap();
        for cell in &plan.facets {
            let Geometry::Violins { violins } = &cell.geometry else { panic!("expected violins") };
            for v in violins {
                let expected = plan.color.global_color_order().iter().position(|k| *k == v.key).unwrap();
                assert_eq!(v.slot, expected);
            }
        }
    }

    #[test]
    fn test_config_error_propagates() {
        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.axis_mode_y = AxisMode::Shared;
        assert!(compute_render_plan(&fragments(), &cfg).is_err());
    }
}
