// Mini-language for CLI filter, year range and category style arguments

pub mod filter;
pub mod lexer;
pub mod style;
pub mod years;

use nom::IResult;

use crate::aggregate::YearRange;
use crate::config::CategoryStyle;
use crate::error::{ChartError, Result};
use crate::filter::FilterSpec;

pub use filter::filter_expr;
pub use style::category_style;
pub use years::year_range;

/// Require a parse to consume the whole argument
fn complete<T>(what: &str, source: &str, result: IResult<&str, T>) -> Result<T> {
    match result {
        Ok((rest, value)) if rest.trim().is_empty() => Ok(value),
        Ok((rest, _)) => Err(ChartError::InvalidConfig(format!(
            "Unexpected trailing input in {} '{}': '{}'",
            what, source, rest
        ))),
        Err(e) => Err(ChartError::InvalidConfig(format!(
            "Invalid {} '{}': {}",
            what, source, e
        ))),
    }
}

pub fn parse_filter(source: &str) -> Result<FilterSpec> {
    complete("filter", source, filter_expr(source))
}

pub fn parse_years(source: &str) -> Result<YearRange> {
    complete("year range", source, year_range(source))
}

pub fn parse_style(source: &str) -> Result<CategoryStyle> {
    complete("category style", source, category_style(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterMode;

    #[test]
    fn test_parse_filter() {
        let spec = parse_filter(r#"exclude(column: "Region", values: ["North"])"#).unwrap();
        assert_eq!(spec.mode, FilterMode::Exclude);
    }

    #[test]
    fn test_parse_years_trailing_input() {
        let err = parse_years("2015..2020 onwards").unwrap_err();
        assert!(err.to_string().contains("trailing input"));
    }

    #[test]
    fn test_parse_style_error_is_invalid_config() {
        assert!(matches!(
            parse_style("category()"),
            Err(ChartError::InvalidConfig(_))
        ));
    }
}
