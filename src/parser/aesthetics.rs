// Aesthetics parser for the pipeline DSL

use super::ast::Aesthetics;
use super::lexer::{field_name, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::{separated_list0, separated_list1},
    sequence::{delimited, preceded},
    IResult,
};

enum AesArg {
    X(String),
    Y(String),
    Color(Vec<String>),
}

/// `color: f` or `color: [f, g]`
fn color_fields(input: &str) -> IResult<&str, Vec<String>> {
    alt((
        delimited(
            ws(char('[')),
            separated_list1(ws(char(',')), ws(field_name)),
            ws(char(']')),
        ),
        map(ws(field_name), |f| vec![f]),
    ))(input)
}

/// Parse an aesthetics mapping
/// Format: aes(x: col, y: col, color: col) with arguments in any order
pub fn parse_aesthetics(input: &str) -> IResult<&str, Aesthetics> {
    let (input, _) = ws(tag("aes"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("x:")), ws(field_name)), AesArg::X),
            map(preceded(ws(tag("y:")), ws(field_name)), AesArg::Y),
            map(preceded(ws(tag("color:")), color_fields), AesArg::Color),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut aes = Aesthetics::default();
    for arg in args {
        match arg {
            AesArg::X(x) => aes.x = Some(x),
            AesArg::Y(y) => aes.y = Some(y),
            AesArg::Color(c) => aes.color = c,
        }
    }

    Ok((input, aes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aesthetics() {
        let (_, aes) = parse_aesthetics("aes(x: length, y: score)").unwrap();
        assert_eq!(aes.x.as_deref(), Some("length"));
        assert_eq!(aes.y.as_deref(), Some("score"));
        assert!(aes.color.is_empty());
    }

    #[test]
    fn test_parse_aesthetics_any_order_with_whitespace() {
        let (_, aes) = parse_aesthetics("  aes( color: region , x: length )  ").unwrap();
        assert_eq!(aes.x.as_deref(), Some("length"));
        assert_eq!(aes.color, vec!["region"]);
    }

    #[test]
    fn test_parse_color_list() {
        let (_, aes) = parse_aesthetics(r#"aes(x: length, color: [region, "data set"])"#).unwrap();
        assert_eq!(aes.color, vec!["region", "data set"]);
    }

    #[test]
    fn test_parse_aesthetics_missing_comma() {
        assert!(parse_aesthetics("aes(x: length y: score)").is_err());
    }

    #[test]
    fn test_parse_aesthetics_unclosed_paren() {
        assert!(parse_aesthetics("aes(x: length").is_err());
    }

    #[test]
    fn test_parse_empty_color_list_fails() {
        assert!(parse_aesthetics("aes(color: [])").is_err());
    }
}
