use crate::config::{ChartKind, VisualizationConfig};
use crate::data::DataRecord;
use crate::error::{PlotError, Result};
use crate::ir::ResolvedSpec;
use crate::stat::bin;
use std::collections::BTreeSet;

/// Validate the config against the record set and fill in defaults.
///
/// Field existence is only checked when there are records to check against;
/// an empty dataset is recovered later as a diagnostic.
pub fn resolve_spec(config: &VisualizationConfig, records: &[DataRecord]) -> Result<ResolvedSpec> {
    config.validate()?;

    let non_empty = |f: &Option<String>| f.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let value_field = config.value_field.trim().to_string();
    let value_field_y = non_empty(&config.value_field_y);
    let facet_x = non_empty(&config.facet_x_field);
    let facet_y = non_empty(&config.facet_y_field);
    let color_fields: Vec<String> = config
        .color_fields
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    if !records.is_empty() {
        let known: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.fields().keys().map(String::as_str))
            .collect();
        let check = |field: &str, role: &str| -> Result<()> {
            if known.contains(field) {
                Ok(())
            } else {
                Err(PlotError::config(format!("{} field '{}' not found in records", role, field)))
            }
        };

        if !matches!(config.chart, ChartKind::Map | ChartKind::ChromosomeTrack) {
            check(&value_field, "value")?;
        }
        if let Some(f) = &value_field_y {
            check(f, "y value")?;
        }
        for f in &color_fields {
            check(f, "color")?;
        }
        if let Some(f) = &facet_x {
            check(f, "facet-x")?;
        }
        if let Some(f) = &facet_y {
            check(f, "facet-y")?;
        }
    }

    let bin_count = match config.bin_count() {
        0 => {
            let n = records.iter().filter(|r| r.number(&value_field).is_some()).count();
            bin::sturges(n)
        }
        n => n as usize,
    };

    Ok(ResolvedSpec {
        chart: config.chart,
        value_field,
        value_field_y,
        color_fields,
        facet_x,
        facet_y,
        axis_mode_x: config.axis_mode_x,
        axis_mode_y: config.axis_mode_y,
        range_x: config.range_x,
        range_y: config.range_y,
        bin_count,
        bandwidth_divisor: config.bandwidth_divisor(),
        contour_thresholds: config.contour_thresholds() as usize,
        show_mean_median: config.show_mean_median,
        show_regression: config.show_regression,
        display_names: config.display_names.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use serde_json::json;

    fn records() -> Vec<DataRecord> {
        Dataset::from_json(&json!([
            {"length": 10, "region": "Africa"},
            {"length": 20, "region": "Oceania"}
        ]))
        .unwrap()
        .records
    }

    #[test]
    fn test_resolve_defaults() {
        let cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        let spec = resolve_spec(&cfg, &records()).unwrap();
        assert_eq!(spec.bin_count, 30);
        assert_eq!(spec.bandwidth_divisor, 20.0);
        assert_eq!(spec.contour_thresholds, 20);
    }

    #[test]
    fn test_auto_bin_count() {
        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.bin_count = Some(0);
        let spec = resolve_spec(&cfg, &records()).unwrap();
        assert_eq!(spec.bin_count, 2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.color_fields = vec!["population".into()];
        match resolve_spec(&cfg, &records()) {
            Err(PlotError::Config(msg)) => assert!(msg.contains("population")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_dataset_skips_field_check() {
        let cfg = VisualizationConfig::new(ChartKind::Histogram, "anything");
        assert!(resolve_spec(&cfg, &[]).is_ok());
    }

    #[test]
    fn test_blank_facet_field_ignored() {
        let mut cfg = VisualizationConfig::new(ChartKind::Histogram, "length");
        cfg.facet_x_field = Some("  ".into());
        let spec = resolve_spec(&cfg, &records()).unwrap();
        assert_eq!(spec.facet_x, None);
    }
}
