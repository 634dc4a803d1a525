//! Encoding of primitive values into their DICOM textual form.
//!
//! All functions in this module produce locale-independent output:
//! the decimal separator is always `.`, there is no digit grouping,
//! and the same number always renders to the same bytes
//! regardless of the process environment.
//! This is the only path through which numbers become text.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};

/// Maximum number of bytes admitted by the decimal string representation.
const MAX_DECIMAL_LEN: usize = 16;

/// Encode a double-precision number into a decimal string.
///
/// The shortest representation which parses back to the exact same
/// bit pattern is preferred. When that form does not fit the 16 byte
/// limit of the representation, the output degrades to scientific
/// notation with just enough precision to fit.
pub fn encode_decimal(value: f64) -> String {
    let shortest = format!("{}", value);
    if shortest.len() <= MAX_DECIMAL_LEN {
        return shortest;
    }
    for precision in (1..=10).rev() {
        let s = format!("{:.*E}", precision, value);
        if s.len() <= MAX_DECIMAL_LEN {
            return s;
        }
    }
    format!("{:.0E}", value)
}

/// Encode an integer into an integer string.
pub fn encode_integer(value: i64) -> String {
    value.to_string()
}

/// Encode a date into the 8 character `YYYYMMDD` form.
pub fn encode_date(date: &NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

/// Encode a time into `HHMMSS`, with a fractional part
/// up to microsecond precision when the time carries one.
pub fn encode_time(time: &NaiveTime) -> String {
    let mut out = format!("{:02}{:02}{:02}", time.hour(), time.minute(), time.second());
    let micros = time.nanosecond() / 1_000;
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
        while out.ends_with('0') {
            out.pop();
        }
    }
    out
}

/// Encode a date-time into `YYYYMMDDHHMMSS[.FFFFFF]&ZZXX` form,
/// always carrying the UTC offset suffix.
pub fn encode_datetime(datetime: &DateTime<FixedOffset>) -> String {
    let mut out = encode_date(&datetime.date_naive());
    out.push_str(&encode_time(&datetime.time()));
    let offset = datetime.offset().local_minus_utc();
    let (sign, offset) = if offset < 0 { ('-', -offset) } else { ('+', offset) };
    out.push_str(&format!("{}{:02}{:02}", sign, offset / 3600, (offset % 3600) / 60));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_is_locale_independent_and_exact() {
        // fixed expectations: byte-identical output for these doubles,
        // no matter the environment
        assert_eq!(encode_decimal(1.70), "1.7");
        assert_eq!(encode_decimal(-0.25), "-0.25");
        assert_eq!(encode_decimal(0.0), "0");
        assert_eq!(encode_decimal(1234567.5), "1234567.5");
        assert_eq!(encode_decimal(f64::MIN_POSITIVE), "2.225073859E-308");

        // short forms parse back to the exact same bit pattern
        for v in [1.70f64, -0.25, 0.1, 1e-10, 2048.0625] {
            let s = encode_decimal(v);
            assert!(s.len() <= 16, "{} exceeds 16 bytes", s);
            assert_eq!(s.parse::<f64>().unwrap().to_bits(), v.to_bits());
        }

        // values whose shortest form does not fit degrade to scientific
        // notation within double precision
        for v in [std::f64::consts::PI, 4.9e-324] {
            let s = encode_decimal(v);
            assert!(s.len() <= 16, "{} exceeds 16 bytes", s);
            let back: f64 = s.parse().unwrap();
            assert!((back - v).abs() <= v.abs() * 1e-9);
        }
    }

    #[test]
    fn date_time_forms() {
        let date = NaiveDate::from_ymd_opt(1994, 10, 12).unwrap();
        assert_eq!(encode_date(&date), "19941012");

        let time = NaiveTime::from_hms_opt(12, 30, 56).unwrap();
        assert_eq!(encode_time(&time), "123056");

        let time = NaiveTime::from_hms_micro_opt(12, 30, 56, 250_000).unwrap();
        assert_eq!(encode_time(&time), "123056.25");
    }

    #[test]
    fn datetime_carries_offset() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let dt = NaiveDate::from_ymd_opt(2014, 4, 30)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap();
        assert_eq!(encode_datetime(&dt), "20140430235900+0100");
    }
}
