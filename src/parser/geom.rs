// Geometry (geom) parser for the pipeline DSL

use super::ast::Geom;
use super::lexer::{bool_literal, number_literal, ws};
use crate::config::ChartKind;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, u32 as uint},
    combinator::{map, value},
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

/// A named geom argument.
#[derive(Debug, Clone, Copy, PartialEq)]
enum GeomArg {
    Bins(u32),
    Bandwidth(f64),
    Thresholds(u32),
    Regression(bool),
}

fn geom_arg(input: &str) -> IResult<&str, GeomArg> {
    alt((
        map(preceded(ws(tag("bins:")), ws(uint)), GeomArg::Bins),
        map(preceded(ws(tag("bandwidth:")), ws(number_literal)), GeomArg::Bandwidth),
        map(preceded(ws(tag("thresholds:")), ws(uint)), GeomArg::Thresholds),
        map(preceded(ws(tag("regression:")), ws(bool_literal)), GeomArg::Regression),
    ))(input)
}

fn chart_name(input: &str) -> IResult<&str, ChartKind> {
    alt((
        value(ChartKind::Histogram, tag("histogram")),
        value(ChartKind::Violin, tag("violin")),
        value(ChartKind::Density, tag("density")),
        value(ChartKind::Contour, tag("contour")),
        value(ChartKind::Scatter, tag("point")),
        value(ChartKind::Scatter, tag("scatter")),
        value(ChartKind::Map, tag("map")),
        value(ChartKind::ChromosomeTrack, tag("track")),
    ))(input)
}

/// Parse a geometry
/// Format: histogram(bins: 40), violin(bandwidth: 30), contour(bandwidth: 20, thresholds: 15),
/// point(regression: true), density(), map(), track()
pub fn parse_geom(input: &str) -> IResult<&str, Geom> {
    let (input, chart) = ws(chart_name)(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, args) = separated_list0(ws(char(',')), geom_arg)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    let mut geom = Geom::new(chart);
    for arg in args {
        match arg {
            GeomArg::Bins(n) => geom.bins = Some(n),
            GeomArg::Bandwidth(d) => geom.bandwidth = Some(d),
            GeomArg::Thresholds(t) => geom.thresholds = Some(t),
            GeomArg::Regression(r) => geom.regression = Some(r),
        }
    }

    Ok((input, geom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_histogram_empty() {
        let (_, geom) = parse_geom("histogram()").unwrap();
        assert_eq!(geom, Geom::new(ChartKind::Histogram));
    }

    #[test]
    fn test_parse_histogram_bins() {
        let (_, geom) = parse_geom("histogram(bins: 40)").unwrap();
        assert_eq!(geom.bins, Some(40));
    }

    #[test]
    fn test_parse_contour_full() {
        let (_, geom) = parse_geom("contour( bandwidth: 12.5 , thresholds: 15 )").unwrap();
        assert_eq!(geom.chart, ChartKind::Contour);
        assert_eq!(geom.bandwidth, Some(12.5));
        assert_eq!(geom.thresholds, Some(15));
    }

    #[test]
    fn test_parse_point_regression() {
        let (_, geom) = parse_geom("point(regression: false)").unwrap();
        assert_eq!(geom.chart, ChartKind::Scatter);
        assert_eq!(geom.regression, Some(false));
    }

    #[test]
    fn test_parse_track_and_map() {
        assert_eq!(parse_geom("track()").unwrap().1.chart, ChartKind::ChromosomeTrack);
        assert_eq!(parse_geom("map()").unwrap().1.chart, ChartKind::Map);
    }

    #[test]
    fn test_negative_bins_rejected() {
        assert!(parse_geom("histogram(bins: -3)").is_err());
    }

    #[test]
    fn test_unknown_geom_rejected() {
        assert!(parse_geom("boxplot()").is_err());
    }
}
