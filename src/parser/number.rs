// Numeric cell coercion

use super::lexer::ws;
use nom::{combinator::all_consuming, number::complete::double, IResult};

/// Coerce a cell to a number.
///
/// Unparseable text, NaN and infinities become `None` so aggregation can
/// proceed over dirty columns.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    let result: IResult<&str, f64> = all_consuming(ws(double))(trimmed);
    match result {
        Ok((_, value)) if value.is_finite() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number(" 3.5 "), Some(3.5));
        assert_eq!(parse_number("-2e3"), Some(-2000.0));
        assert_eq!(parse_number("+7"), Some(7.0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_number("bad"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_parse_full_width_padding() {
        // U+3000 is trimmed before nom sees the text
        assert_eq!(parse_number("\u{3000}42\u{3000}"), Some(42.0));
    }
}
