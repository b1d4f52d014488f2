// Shared nom building blocks for cell parsing

use nom::{
    bytes::complete::take_while_m_n,
    character::complete::multispace0,
    combinator::map_res,
    error::ParseError,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so surrounding ASCII whitespace is ignored
pub fn ws<'a, F, O, E>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Between `min` and `max` ASCII digits, read as an unsigned integer
pub fn digits<'a>(min: usize, max: usize) -> impl FnMut(&'a str) -> IResult<&'a str, u32> {
    move |input: &'a str| {
        map_res(
            take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
            |s: &str| s.parse::<u32>(),
        )(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::character::complete::alpha1;

    #[test]
    fn test_ws_strips_padding() {
        let result: IResult<&str, &str> = ws(alpha1)("  abc  ");
        assert_eq!(result, Ok(("", "abc")));
    }

    #[test]
    fn test_digits_bounds() {
        assert_eq!(digits(1, 2)("123"), Ok(("3", 12)));
        assert_eq!(digits(4, 4)("2023-01"), Ok(("-01", 2023)));
        assert!(digits(4, 4)("202").is_err());
    }
}
