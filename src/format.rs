// Compact label text for bar values and line counts

const CURRENCY_SYMBOL: &str = "£";

/// Magnitude thresholds, largest first
const UNITS: [(f64, &str); 3] = [(1e9, "b"), (1e6, "m"), (1e3, "k")];

/// Format a monetary value as compact currency text, e.g. `£1.5m`, `-£5k`, `£999.00`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return format!("{}0", CURRENCY_SYMBOL);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    let body = match UNITS.iter().position(|(div, _)| magnitude >= *div) {
        None => format!("{:.2}", magnitude),
        Some(idx) => {
            let (div, suffix) = UNITS[idx];
            let text = three_significant(magnitude / div);
            // Rounding can carry into the next unit (999.999k -> 1m)
            if idx > 0 && text.parse::<f64>().map(|v| v >= 1000.0).unwrap_or(false) {
                let (next_div, next_suffix) = UNITS[idx - 1];
                format!("{}{}", three_significant(magnitude / next_div), next_suffix)
            } else {
                format!("{}{}", text, suffix)
            }
        }
    };

    format!("{}{}{}", sign, CURRENCY_SYMBOL, body)
}

/// Integer label for a line point
pub fn format_count(count: f64) -> String {
    format!("{}", count.trunc() as i64)
}

/// Render to 3 significant figures, dropping trailing zeros and a bare decimal point
fn three_significant(x: f64) -> String {
    let digits = if x >= 1.0 { x.log10().floor() as i32 + 1 } else { 1 };
    let decimals = (3 - digits).max(0) as usize;
    let text = format!("{:.*}", decimals, x);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_magnitude_classes() {
        assert_eq!(format_currency(1_000.0), "£1k");
        assert_eq!(format_currency(2_000_000.0), "£2m");
        assert_eq!(format_currency(1_500_000_000.0), "£1.5b");
        assert_eq!(format_currency(999.0), "£999.00");
        assert_eq!(format_currency(0.0), "£0");
        assert_eq!(format_currency(-5_000.0), "-£5k");
    }

    #[test]
    fn test_format_currency_significant_figures() {
        assert_eq!(format_currency(12_300.0), "£12.3k");
        assert_eq!(format_currency(250_000.0), "£250k");
        assert_eq!(format_currency(1_230_000.0), "£1.23m");
        assert_eq!(format_currency(45_600_000.0), "£45.6m");
        assert_eq!(format_currency(7_100_000_000.0), "£7.1b");
    }

    #[test]
    fn test_format_currency_small_values() {
        assert_eq!(format_currency(0.5), "£0.50");
        assert_eq!(format_currency(12.0), "£12.00");
        assert_eq!(format_currency(-12.25), "-£12.25");
    }

    #[test]
    fn test_format_currency_unit_carry() {
        assert_eq!(format_currency(999_999.0), "£1m");
        assert_eq!(format_currency(999_999_999.0), "£1b");
    }

    #[test]
    fn test_format_currency_beyond_billions() {
        assert_eq!(format_currency(2_500_000_000_000.0), "£2500b");
    }

    #[test]
    fn test_format_currency_non_finite() {
        assert_eq!(format_currency(f64::NAN), "£0");
        assert_eq!(format_currency(-0.0), "£0");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(12.0), "12");
        assert_eq!(format_count(7.9), "7");
        assert_eq!(format_count(0.0), "0");
    }
}
