// Facet parser for the pipeline DSL

use super::ast::Facet;
use super::lexer::{field_name, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::separated_list1,
    sequence::preceded,
    IResult,
};

/// Parse a facet grid
/// Format: facet_grid(x: col) / facet_grid(y: col) / facet_grid(x: col, y: col)
pub fn parse_facet_grid(input: &str) -> IResult<&str, Facet> {
    let (input, _) = ws(tag("facet_grid"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list1(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("x:")), ws(field_name)), |f| ("x", f)),
            map(preceded(ws(tag("y:")), ws(field_name)), |f| ("y", f)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut facet = Facet::default();
    for (key, field) in args {
        match key {
            "x" => facet.x = Some(field),
            "y" => facet.y = Some(field),
            _ => {}
        }
    }

    Ok((input, facet))
}
