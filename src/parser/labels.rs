use nom::{
    bytes::complete::tag,
    character::complete::char,
    multi::separated_list0,
    sequence::{pair, separated_pair},
    IResult,
};
use crate::parser::ast::DisplayNames;
use crate::parser::lexer::{field_name, string_literal, ws};

/// Legend display-name overrides
/// Format: names(HGDP: "Human Genome Diversity Project", "1KG": "1000 Genomes")
pub fn parse_names(input: &str) -> IResult<&str, DisplayNames> {
    let (input, _) = ws(tag("names"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        separated_pair(ws(field_name), char(':'), ws(string_literal)),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((input, args.into_iter().collect()))
}

/// Toggle for per-group mean/median markers
/// Format: mean_median()
pub fn parse_mean_median(input: &str) -> IResult<&str, ()> {
    let (input, _) = ws(tag("mean_median"))(input)?;
    let (input, _) = pair(ws(char('(')), ws(char(')')))(input)?;
    Ok((input, ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        let (_, names) = parse_names(r#"names(HGDP: "HGDP panel", "1KG": "Thousand Genomes")"#).unwrap();
        assert_eq!(names.get("HGDP").map(String::as_str), Some("HGDP panel"));
        assert_eq!(names.get("1KG").map(String::as_str), Some("Thousand Genomes"));
    }

    #[test]
    fn test_parse_names_requires_string_label() {
        assert!(parse_names("names(HGDP: panel)").is_err());
    }

    #[test]
    fn test_parse_mean_median() {
        assert!(parse_mean_median(" mean_median() ").is_ok());
    }
}
