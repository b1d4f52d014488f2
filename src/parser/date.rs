// Date cell coercion
//
// Accepted shapes:
//   2023-01-05, 2023/1/5, 2023.1.5   (same separator twice)
//   2023年1月5日, 2023年1月
//   20230105
//   2023-01, 2023/1                 (first of the month)
// Any of them may carry a trailing time part after whitespace or 'T'.

use super::lexer::digits;
use chrono::NaiveDate;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace1, one_of},
    combinator::{eof, opt, rest, value},
    sequence::{preceded, terminated},
    IResult,
};

type Ymd = (i32, u32, u32);

/// Coerce a cell to a calendar date; anything unparseable or invalid is `None`
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    let result: IResult<&str, Ymd> = terminated(
        alt((separated_date, cjk_date, compact_date, year_month)),
        time_tail,
    )(trimmed);

    match result {
        Ok((_, (year, month, day))) => NaiveDate::from_ymd_opt(year, month, day),
        Err(_) => None,
    }
}

/// Month bucket key (`YYYY-MM`)
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn year(input: &str) -> IResult<&str, i32> {
    let (input, y) = digits(4, 4)(input)?;
    Ok((input, y as i32))
}

fn separated_date(input: &str) -> IResult<&str, Ymd> {
    let (input, y) = year(input)?;
    let (input, sep) = one_of("-/.")(input)?;
    let (input, m) = digits(1, 2)(input)?;
    let (input, _) = char(sep)(input)?;
    let (input, d) = digits(1, 2)(input)?;
    Ok((input, (y, m, d)))
}

fn cjk_date(input: &str) -> IResult<&str, Ymd> {
    let (input, y) = year(input)?;
    let (input, _) = char('年')(input)?;
    let (input, m) = digits(1, 2)(input)?;
    let (input, _) = char('月')(input)?;
    let (input, d) = opt(terminated(digits(1, 2), opt(char('日'))))(input)?;
    Ok((input, (y, m, d.unwrap_or(1))))
}

fn compact_date(input: &str) -> IResult<&str, Ymd> {
    let (input, y) = year(input)?;
    let (input, m) = digits(2, 2)(input)?;
    let (input, d) = digits(2, 2)(input)?;
    Ok((input, (y, m, d)))
}

fn year_month(input: &str) -> IResult<&str, Ymd> {
    let (input, y) = year(input)?;
    let (input, _) = one_of("-/")(input)?;
    let (input, m) = digits(1, 2)(input)?;
    Ok((input, (y, m, 1)))
}

fn time_tail(input: &str) -> IResult<&str, ()> {
    alt((
        value((), eof),
        value((), preceded(alt((multispace1, tag("T"))), rest)),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_parse_iso_dates() {
        assert_eq!(parse_date("2023-01-05"), ymd(2023, 1, 5));
        assert_eq!(parse_date("2023-01-05 10:20:30"), ymd(2023, 1, 5));
        assert_eq!(parse_date("2023-01-05T10:20:30"), ymd(2023, 1, 5));
    }

    #[test]
    fn test_parse_alternate_separators() {
        assert_eq!(parse_date("2023/1/5"), ymd(2023, 1, 5));
        assert_eq!(parse_date("2023.12.31"), ymd(2023, 12, 31));
        // separators must match
        assert_eq!(parse_date("2023/1-5"), None);
    }

    #[test]
    fn test_parse_cjk_dates() {
        assert_eq!(parse_date("2023年1月5日"), ymd(2023, 1, 5));
        assert_eq!(parse_date("2023年11月"), ymd(2023, 11, 1));
    }

    #[test]
    fn test_parse_compact_and_month_only() {
        assert_eq!(parse_date("20230105"), ymd(2023, 1, 5));
        assert_eq!(parse_date("2023-02"), ymd(2023, 2, 1));
    }

    #[test]
    fn test_parse_invalid_dates() {
        assert_eq!(parse_date("2023-02-30"), None);
        assert_eq!(parse_date("2023-13-01"), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2023-01-05x"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 9).unwrap();
        assert_eq!(month_key(date), "2023-03");
    }
}
