// Pipeline parser for the fragplot DSL

use super::aesthetics::parse_aesthetics;
use super::ast::{Aesthetics, Axis, AxisScale, DisplayNames, Facet, Geom};
use super::facet::parse_facet_grid;
use super::geom::parse_geom;
use super::labels::{parse_mean_median, parse_names};
use super::lexer::ws;
use super::scale::parse_scale_command;
use crate::config::{ChartKind, VisualizationConfig};
use crate::error::{PlotError, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, map, opt},
    error::{Error, ErrorKind},
    multi::separated_list0,
    IResult,
};

#[derive(Debug)]
enum PipelineComponent {
    Aes(Aesthetics),
    Geom(Geom),
    Facet(Facet),
    Scale(AxisScale),
    Names(DisplayNames),
    MeanMedian,
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    alt((
        map(parse_aesthetics, PipelineComponent::Aes),
        map(parse_geom, PipelineComponent::Geom),
        map(parse_facet_grid, PipelineComponent::Facet),
        map(parse_scale_command, PipelineComponent::Scale),
        map(parse_names, PipelineComponent::Names),
        map(parse_mean_median, |_| PipelineComponent::MeanMedian),
    ))(input)
}

/// Parse a complete plot pipeline into a visualization config
/// Format: component | component | ...
///
/// Exactly one geometry is required.
pub fn parse_plot_config(input: &str) -> IResult<&str, VisualizationConfig> {
    // Optional: consume leading "df" and pipe
    let (input, _) = opt(ws(tag("df")))(input)?;
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, components) = separated_list0(ws(tag("|")), parse_pipeline_component)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    let mut aes = Aesthetics::default();
    let mut geoms = Vec::new();
    let mut config = VisualizationConfig::default();

    for comp in components {
        match comp {
            PipelineComponent::Aes(a) => aes = a,
            PipelineComponent::Geom(g) => geoms.push(g),
            PipelineComponent::Facet(f) => {
                config.facet_x_field = f.x;
                config.facet_y_field = f.y;
            }
            PipelineComponent::Scale(s) => match s.axis {
                Axis::X => {
                    config.axis_mode_x = s.mode;
                    config.range_x = s.limits;
                }
                Axis::Y => {
                    config.axis_mode_y = s.mode;
                    config.range_y = s.limits;
                }
            },
            PipelineComponent::Names(names) => config.display_names.extend(names),
            PipelineComponent::MeanMedian => config.show_mean_median = true,
        }
    }

    // Validation: exactly one chart per plot
    if geoms.len() != 1 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    let geom = geoms.remove(0);

    config.chart = geom.chart;
    config.bin_count = geom.bins;
    config.bandwidth_divisor = geom.bandwidth;
    config.contour_thresholds = geom.thresholds;
    if let Some(regression) = geom.regression {
        config.show_regression = regression;
    }

    // Violins plot their value vertically; accept it from either aesthetic
    if geom.chart == ChartKind::Violin {
        config.value_field = aes.y.or(aes.x).unwrap_or_default();
    } else {
        config.value_field = aes.x.unwrap_or_default();
        config.value_field_y = aes.y;
    }
    config.color_fields = aes.color;

    Ok((input, config))
}

/// Parse a pipeline string, mapping parse failures to a `ConfigError`.
pub fn parse_config(input: &str) -> Result<VisualizationConfig> {
    match parse_plot_config(input) {
        Ok((_, config)) => Ok(config),
        Err(e) => Err(PlotError::config(format!("invalid pipeline '{}': {:?}", input.trim(), e))),
    }
}
