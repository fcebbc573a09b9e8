// Filter expressions: include(column: "Region", values: ["North", "South"])

use super::lexer::{string_list, string_literal, ws};
use crate::filter::{FilterMode, FilterSpec};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::value,
    IResult,
};

/// Parse a filter expression
/// Format: include(column: "Col", values: ["a", ...]) or exclude(...)
pub fn filter_expr(input: &str) -> IResult<&str, FilterSpec> {
    let (input, mode) = ws(alt((
        value(FilterMode::Include, tag("include")),
        value(FilterMode::Exclude, tag("exclude")),
    )))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, _) = ws(tag("column:"))(input)?;
    let (input, column) = ws(string_literal)(input)?;
    let (input, _) = ws(char(','))(input)?;

    let (input, _) = ws(tag("values:"))(input)?;
    let (input, values) = string_list(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((input, FilterSpec::new(&column, mode, values)))
}
