use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    sequence::pair,
    IResult,
};
use crate::config::AxisMode;
use crate::parser::ast::{Axis, AxisScale};
use crate::parser::lexer::{number_literal, ws};

fn empty_args(input: &str) -> IResult<&str, ()> {
    let (input, _) = pair(ws(char('(')), ws(char(')')))(input)?;
    Ok((input, ()))
}

fn axis_mode(axis: Axis, mode: AxisMode) -> AxisScale {
    AxisScale { axis, mode, limits: None }
}

pub fn parse_scale_free(input: &str) -> IResult<&str, AxisScale> {
    alt((
        map(pair(ws(tag("scale_x_free")), empty_args), |_| axis_mode(Axis::X, AxisMode::Free)),
        map(pair(ws(tag("scale_y_free")), empty_args), |_| axis_mode(Axis::Y, AxisMode::Free)),
    ))(input)
}

pub fn parse_scale_shared(input: &str) -> IResult<&str, AxisScale> {
    alt((
        map(pair(ws(tag("scale_x_shared")), empty_args), |_| axis_mode(Axis::X, AxisMode::Shared)),
        map(pair(ws(tag("scale_y_shared")), empty_args), |_| axis_mode(Axis::Y, AxisMode::Shared)),
    ))(input)
}

fn parse_limits(name: &'static str, axis: Axis) -> impl FnMut(&str) -> IResult<&str, AxisScale> {
    move |input: &str| {
        let (input, _) = ws(tag(name))(input)?;
        let (input, _) = ws(char('('))(input)?;
        let (input, min) = ws(number_literal)(input)?;
        let (input, _) = ws(char(','))(input)?;
        let (input, max) = ws(number_literal)(input)?;
        let (input, _) = ws(char(')'))(input)?;
        Ok((input, AxisScale { axis, mode: AxisMode::DefineRange, limits: Some((min, max)) }))
    }
}

pub fn parse_xlim(input: &str) -> IResult<&str, AxisScale> {
    parse_limits("xlim", Axis::X)(input)
}

pub fn parse_ylim(input: &str) -> IResult<&str, AxisScale> {
    parse_limits("ylim", Axis::Y)(input)
}

pub fn parse_scale_command(input: &str) -> IResult<&str, AxisScale> {
    alt((parse_scale_free, parse_scale_shared, parse_xlim, parse_ylim))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shared_and_free() {
        let (_, s) = parse_scale_command("scale_y_shared()").unwrap();
        assert_eq!(s, AxisScale { axis: Axis::Y, mode: AxisMode::Shared, limits: None });
        let (_, s) = parse_scale_command("scale_x_free( )").unwrap();
        assert_eq!(s.axis, Axis::X);
        assert_eq!(s.mode, AxisMode::Free);
    }

    #[test]
    fn test_parse_limits() {
        let (_, s) = parse_scale_command("xlim(10, 40)").unwrap();
        assert_eq!(s.mode, AxisMode::DefineRange);
        assert_eq!(s.limits, Some((10.0, 40.0)));
        let (_, s) = parse_scale_command("ylim(-1.5, 2e5)").unwrap();
        assert_eq!(s.axis, Axis::Y);
        assert_eq!(s.limits, Some((-1.5, 200000.0)));
    }

    #[test]
    fn test_limits_need_two_numbers() {
        assert!(parse_scale_command("xlim(10)").is_err());
    }
}
