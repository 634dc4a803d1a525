//! Parsing of primitive values from their DICOM textual form.
//!
//! The counterpart of [`serialize`](super::serialize): all parsing here
//! uses a fixed, locale-independent notation (`.` decimal separator,
//! no grouping), so the same bytes always produce the same value.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::str::FromStr;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("invalid integer string: {}", source))]
    ParseInteger {
        source: std::num::ParseIntError,
        backtrace: Backtrace,
    },
    #[snafu(display("invalid decimal string: {}", source))]
    ParseDecimal {
        source: std::num::ParseFloatError,
        backtrace: Backtrace,
    },
    #[snafu(display("date text is too short: {} bytes", len))]
    DateTooShort { len: usize, backtrace: Backtrace },
    #[snafu(display("time text is too short: {} bytes", len))]
    TimeTooShort { len: usize, backtrace: Backtrace },
    #[snafu(display("invalid component `{}`", text))]
    InvalidComponent { text: String, backtrace: Backtrace },
    #[snafu(display("no such date: {}-{}-{}", year, month, day))]
    InvalidDate {
        year: i32,
        month: u32,
        day: u32,
        backtrace: Backtrace,
    },
    #[snafu(display("no such time: {}:{}:{}", hour, minute, second))]
    InvalidTime {
        hour: u32,
        minute: u32,
        second: u32,
        backtrace: Backtrace,
    },
    #[snafu(display("invalid UTC offset `{}`", text))]
    InvalidOffset { text: String, backtrace: Backtrace },
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse an integer string value.
///
/// A leading `+` sign is admitted, as the representation allows it.
pub fn parse_integer<T>(text: &str) -> Result<T>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    text.strip_prefix('+')
        .unwrap_or(text)
        .parse()
        .context(ParseIntegerSnafu)
}

/// Parse a decimal string value into a double-precision number.
pub fn parse_decimal(text: &str) -> Result<f64> {
    text.strip_prefix('+')
        .unwrap_or(text)
        .parse()
        .context(ParseDecimalSnafu)
}

fn read_number(text: &[u8]) -> Result<u32> {
    let s = std::str::from_utf8(text).unwrap_or("");
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return InvalidComponentSnafu {
            text: String::from_utf8_lossy(text),
        }
        .fail();
    }
    s.parse().ok().context(InvalidComponentSnafu { text: s })
}

/// Parse a `YYYYMMDD` date value.
/// Trailing padding should be removed beforehand.
pub fn parse_date(text: &[u8]) -> Result<NaiveDate> {
    snafu::ensure!(text.len() >= 8, DateTooShortSnafu { len: text.len() });
    let year = read_number(&text[0..4])? as i32;
    let month = read_number(&text[4..6])?;
    let day = read_number(&text[6..8])?;
    NaiveDate::from_ymd_opt(year, month, day).context(InvalidDateSnafu { year, month, day })
}

/// Parse a `HHMMSS.FFFFFF` time value.
/// The minute, second and fractional components are optional.
pub fn parse_time(text: &[u8]) -> Result<NaiveTime> {
    snafu::ensure!(text.len() >= 2, TimeTooShortSnafu { len: text.len() });
    let hour = read_number(&text[0..2])?;
    let minute = if text.len() >= 4 {
        read_number(&text[2..4])?
    } else {
        0
    };
    let second = if text.len() >= 6 {
        read_number(&text[4..6])?
    } else {
        0
    };
    let micros = match text.get(6) {
        Some(b'.') => {
            let frac = &text[7..];
            snafu::ensure!(
                !frac.is_empty() && frac.len() <= 6,
                InvalidComponentSnafu {
                    text: String::from_utf8_lossy(frac),
                }
            );
            let mut value = read_number(frac)?;
            for _ in frac.len()..6 {
                value *= 10;
            }
            value
        }
        _ => 0,
    };
    NaiveTime::from_hms_micro_opt(hour, minute, second, micros).context(InvalidTimeSnafu {
        hour,
        minute,
        second,
    })
}

/// Parse a `YYYYMMDDHHMMSS.FFFFFF&ZZXX` date-time value.
/// Only the date part is mandatory;
/// when no UTC offset suffix is present, `default_offset` is assumed.
pub fn parse_datetime(text: &[u8], default_offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let date = parse_date(text)?;
    let rest = &text[8..];

    // detach the offset suffix, if present
    let (time_part, offset) = match rest.iter().position(|b| *b == b'+' || *b == b'-') {
        Some(i) => {
            let (time_part, suffix) = rest.split_at(i);
            snafu::ensure!(
                suffix.len() == 5,
                InvalidOffsetSnafu {
                    text: String::from_utf8_lossy(suffix),
                }
            );
            let hours = read_number(&suffix[1..3])? as i32;
            let minutes = read_number(&suffix[3..5])? as i32;
            let seconds = (hours * 3600 + minutes * 60) * if suffix[0] == b'-' { -1 } else { 1 };
            let offset = FixedOffset::east_opt(seconds).context(InvalidOffsetSnafu {
                text: String::from_utf8_lossy(suffix),
            })?;
            (time_part, offset)
        }
        None => (rest, default_offset),
    };

    let time = if time_part.is_empty() {
        NaiveTime::from_hms_opt(0, 0, 0).unwrap()
    } else {
        parse_time(time_part)?
    };

    date.and_time(time)
        .and_local_timezone(offset)
        .single()
        .context(InvalidOffsetSnafu {
            text: String::from_utf8_lossy(text),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_and_decimals() {
        assert_eq!(parse_integer::<i32>("1234567").unwrap(), 1234567);
        assert_eq!(parse_integer::<i32>("+15").unwrap(), 15);
        assert_eq!(parse_integer::<i32>("-15").unwrap(), -15);
        assert!(parse_integer::<i32>("1,5").is_err());

        assert_eq!(parse_decimal("1.70").unwrap(), 1.70);
        assert_eq!(parse_decimal("-1E+3").unwrap(), -1000.0);
        assert!(parse_decimal("1,70").is_err());
    }

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_date(b"19941012").unwrap(),
            NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()
        );
        assert!(parse_date(b"1994").is_err());
        assert!(parse_date(b"19941301").is_err());
    }

    #[test]
    fn parses_times() {
        assert_eq!(
            parse_time(b"123056").unwrap(),
            NaiveTime::from_hms_opt(12, 30, 56).unwrap()
        );
        assert_eq!(
            parse_time(b"1230").unwrap(),
            NaiveTime::from_hms_opt(12, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time(b"123056.25").unwrap(),
            NaiveTime::from_hms_micro_opt(12, 30, 56, 250_000).unwrap()
        );
        assert!(parse_time(b"9").is_err());
        assert!(parse_time(b"256090").is_err());
    }

    #[test]
    fn parses_datetimes() {
        let default_offset = FixedOffset::east_opt(0).unwrap();
        let dt = parse_datetime(b"20140430235900+0100", default_offset).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 3600);
        assert_eq!(
            dt.naive_local(),
            NaiveDate::from_ymd_opt(2014, 4, 30)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap()
        );

        let dt = parse_datetime(b"20140430", default_offset).unwrap();
        assert_eq!(
            dt.naive_local(),
            NaiveDate::from_ymd_opt(2014, 4, 30)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }
}
