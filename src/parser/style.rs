// Category style expressions: category(label: "North", color: "#1f77b4", order: 0)

use super::lexer::{signed_integer, string_literal, ws};
use crate::color::Rgb;
use crate::config::CategoryStyle;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, map_res},
    multi::separated_list1,
    sequence::preceded,
    IResult,
};

enum StyleArg {
    Label(String),
    Color(Rgb),
    Order(i32),
}

/// Parse a category style
/// Format: category(label: "L") with optional color: and order: arguments in any order
pub fn category_style(input: &str) -> IResult<&str, CategoryStyle> {
    let (input, _) = ws(tag("category"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list1(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("label:")), ws(string_literal)), StyleArg::Label),
            map(
                preceded(
                    ws(tag("color:")),
                    ws(map_res(string_literal, |s: String| s.parse::<Rgb>())),
                ),
                StyleArg::Color,
            ),
            map(preceded(ws(tag("order:")), ws(signed_integer)), StyleArg::Order),
        )),
    )(input)?;

    let (rest, _) = ws(char(')'))(input)?;

    let mut label = None;
    let mut color = None;
    let mut order = None;

    for arg in args {
        match arg {
            StyleArg::Label(l) => label = Some(l),
            StyleArg::Color(c) => color = Some(c),
            StyleArg::Order(o) => order = Some(o),
        }
    }

    // label is the one required argument
    let label = match label {
        Some(l) => l,
        None => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )))
        }
    };

    Ok((rest, CategoryStyle { label, color, order }))
}
