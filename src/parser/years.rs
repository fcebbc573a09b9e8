// Year range expressions: `2015..2020`, `2015-2020` or a single `2018`

use super::lexer::{integer, ws};
use crate::aggregate::YearRange;
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::opt,
    sequence::preceded,
    IResult,
};

pub fn year_range(input: &str) -> IResult<&str, YearRange> {
    let (input, start) = ws(integer)(input)?;
    let (input, end) = opt(preceded(ws(alt((tag(".."), tag("-")))), ws(integer)))(input)?;

    Ok((input, YearRange::new(start, end.unwrap_or(start))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_range() {
        assert_eq!(year_range("2015..2020"), Ok(("", YearRange::new(2015, 2020))));
    }

    #[test]
    fn test_dashed_range_with_whitespace() {
        assert_eq!(year_range(" 2015 - 2020 "), Ok(("", YearRange::new(2015, 2020))));
    }

    #[test]
    fn test_single_year() {
        assert_eq!(year_range("2018"), Ok(("", YearRange::new(2018, 2018))));
    }

    #[test]
    fn test_reversed_range_parses() {
        // ordering is checked by config validation, not the grammar
        assert_eq!(year_range("2020..2015").unwrap().1, YearRange::new(2020, 2015));
    }

    #[test]
    fn test_not_a_year() {
        assert!(year_range("last year").is_err());
    }
}
