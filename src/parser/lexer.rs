// Shared token parsers for the CLI mini-language

use nom::{
    bytes::complete::take_while,
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, opt},
    multi::separated_list0,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Double-quoted string without escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

/// Unsigned integer that fits an i32
pub fn integer(input: &str) -> IResult<&str, i32> {
    map_res(digit1, |s: &str| s.parse::<i32>())(input)
}

/// Signed integer, e.g. a stacking order
pub fn signed_integer(input: &str) -> IResult<&str, i32> {
    let (input, negative) = map(opt(char('-')), |s| s.is_some())(input)?;
    let (input, value) = integer(input)?;
    Ok((input, if negative { -value } else { value }))
}

/// `["a", "b"]`
pub fn string_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('[')),
        separated_list0(ws(char(',')), ws(string_literal)),
        ws(char(']')),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("\"North East\" rest"), Ok((" rest", "North East".to_string())));
        assert_eq!(string_literal("\"\""), Ok(("", String::new())));
        assert!(string_literal("\"unterminated").is_err());
        assert!(string_literal("bare").is_err());
    }

    #[test]
    fn test_integer() {
        assert_eq!(integer("2015..2020"), Ok(("..2020", 2015)));
        assert!(integer("-5").is_err());
        assert!(integer("99999999999").is_err());
    }

    #[test]
    fn test_signed_integer() {
        assert_eq!(signed_integer("-3)"), Ok((")", -3)));
        assert_eq!(signed_integer("7"), Ok(("", 7)));
    }

    #[test]
    fn test_string_list() {
        let (rest, values) = string_list(" [ \"a\" , \"b\" ] x").unwrap();
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(rest, "x");
        assert_eq!(string_list("[]").unwrap().1, Vec::<String>::new());
        assert!(string_list("[\"a\",]").is_err());
    }
}
