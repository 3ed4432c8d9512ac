//! Timestamps with first-class precision and offset-kind tracking.
//!
//! `2019T` and `2019-01-01T00:00:00Z` denote the same instant but are not
//! the same value: the written precision and the offset-kind ("Z" vs. an
//! explicit `+00:00` vs. "unknown") are both part of the value's identity.
//! So fields are kept as the calendar components that were actually
//! present, gated by [`Precision`], rather than collapsed into a single
//! instant.

use std::fmt;

use crate::error::{syntax, Error, Result};
use crate::varint;

/// How much of a timestamp's calendar representation was specified.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Precision {
    /// `YYYY`
    Year,
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM-DDTHH:MM`, no seconds
    Minute,
    /// `YYYY-MM-DDTHH:MM:SS`, whole seconds
    Second,
    /// `YYYY-MM-DDTHH:MM:SS.fff...`, with the given number of fractional
    /// digits (1–9). Trailing zero digits are preserved as distinct
    /// precision rather than collapsed (see DESIGN.md open-question
    /// decision #2).
    Fractional(u8),
}

/// How a timestamp's UTC offset was specified.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Offset {
    /// Written with a literal `Z` / encoded with a zero offset that is
    /// explicitly known to be UTC.
    Utc,
    /// A known offset from UTC, in minutes (may be negative).
    Known(i32),
    /// The offset is not known (text `-00:00`, binary offset sentinel).
    Unknown,
}

/// A self-describing timestamp: calendar fields truncated to `precision`,
/// plus an offset-kind that applies whenever time-of-day fields are present.
#[derive(Clone, Debug)]
pub struct Timestamp {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    /// Fractional seconds as an integer numerator; the number of digits is
    /// carried by `precision` (`Precision::Fractional(digits)`).
    fraction: u64,
    precision: Precision,
    offset: Offset,
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

impl Timestamp {
    /// Construct and validate a timestamp from its raw components.
    ///
    /// Fields beyond what `precision` calls for are ignored by callers but
    /// must still be filled in with a defined placeholder (`1` for month/day,
    /// `0` for hour/minute/second) by convention; this constructor does not
    /// itself default them. Calendar validity (month 1–12, day within the
    /// month, leap years, hour/minute/second ranges) is enforced here — this
    /// codec resolves the reference implementation's deferred-validation
    /// open question by validating eagerly at construction (DESIGN.md
    /// decision #1).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        fraction: u64,
        precision: Precision,
        offset: Offset,
    ) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(syntax(0, format!("month {month} out of range")));
        }
        let max_day = days_in_month(year, month);
        if day < 1 || day > max_day {
            return Err(syntax(0, format!("day {day} out of range for {year}-{month:02}")));
        }
        if hour > 23 {
            return Err(syntax(0, format!("hour {hour} out of range")));
        }
        if minute > 59 {
            return Err(syntax(0, format!("minute {minute} out of range")));
        }
        if second > 59 {
            return Err(syntax(0, format!("second {second} out of range")));
        }
        if let Precision::Fractional(digits) = precision {
            if !(1..=9).contains(&digits) {
                return Err(syntax(0, "fractional digit count must be 1..=9"));
            }
        }
        // Invariant: an hour component implies a minute component. Every
        // precision at or above `Minute` satisfies this by construction; the
        // check exists so a caller can't smuggle a nonzero hour in at a
        // coarser precision and have it silently ignored.
        if matches!(precision, Precision::Year | Precision::Month | Precision::Day) && hour != 0 {
            return Err(Error::Usage("Timestamp::new: hour set without minute precision"));
        }
        Ok(Timestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
            fraction,
            precision,
            offset,
        })
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn year(&self) -> u16 {
        self.year
    }
    pub fn month(&self) -> u8 {
        self.month
    }
    pub fn day(&self) -> u8 {
        self.day
    }
    pub fn hour(&self) -> u8 {
        self.hour
    }
    pub fn minute(&self) -> u8 {
        self.minute
    }
    pub fn second(&self) -> u8 {
        self.second
    }
    pub fn fraction(&self) -> u64 {
        self.fraction
    }

    /// Number of fractional digits, or 0 if `precision` is not
    /// [`Precision::Fractional`].
    pub fn fraction_digits(&self) -> u8 {
        match self.precision {
            Precision::Fractional(d) => d,
            _ => 0,
        }
    }

    fn has_time_of_day(&self) -> bool {
        !matches!(self.precision, Precision::Year | Precision::Month | Precision::Day)
    }

    /// Encode the binary payload: signed-varint offset in minutes
    /// (negative-zero means "unknown"), then truncated varuint calendar
    /// fields, then an optional decimal fraction.
    pub(crate) fn encode_payload(&self, buf: &mut Vec<u8>) {
        match self.offset {
            Offset::Utc => varint::write_varint(buf, 0),
            Offset::Known(minutes) => varint::write_varint(buf, minutes as i64),
            Offset::Unknown => write_negative_zero_varint(buf),
        }
        varint::write_varuint(buf, self.year as u64);
        if matches!(self.precision, Precision::Year) {
            return;
        }
        varint::write_varuint(buf, self.month as u64);
        if matches!(self.precision, Precision::Month) {
            return;
        }
        varint::write_varuint(buf, self.day as u64);
        if matches!(self.precision, Precision::Day) {
            return;
        }
        varint::write_varuint(buf, self.hour as u64);
        varint::write_varuint(buf, self.minute as u64);
        if matches!(self.precision, Precision::Minute) {
            return;
        }
        varint::write_varuint(buf, self.second as u64);
        if let Precision::Fractional(digits) = self.precision {
            varint::write_varint(buf, -(digits as i64));
            varint::write_varuint(buf, self.fraction);
        }
    }

    /// Decode the binary payload, returning the value and bytes consumed.
    pub(crate) fn decode_payload(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut pos = 0usize;
        let (raw_offset, len) = varint::read_varint(buf, offset)?;
        let is_neg_zero_offset = len == 1 && buf[0] == 0xC0;
        pos += len;
        let time_offset = if is_neg_zero_offset {
            Offset::Unknown
        } else if raw_offset == 0 {
            Offset::Utc
        } else {
            Offset::Known(raw_offset as i32)
        };

        let (year, len) = varint::read_varuint(&buf[pos..], offset + pos)?;
        pos += len;
        let year = year as u16;

        let mut month = 1u8;
        let mut day = 1u8;
        let mut hour = 0u8;
        let mut minute = 0u8;
        let mut second = 0u8;
        let mut fraction = 0u64;
        let mut precision = Precision::Year;

        if pos < buf.len() {
            let (v, len) = varint::read_varuint(&buf[pos..], offset + pos)?;
            pos += len;
            month = v as u8;
            precision = Precision::Month;

            if pos < buf.len() {
                let (v, len) = varint::read_varuint(&buf[pos..], offset + pos)?;
                pos += len;
                day = v as u8;
                precision = Precision::Day;

                if pos < buf.len() {
                    let (v, len) = varint::read_varuint(&buf[pos..], offset + pos)?;
                    pos += len;
                    hour = v as u8;
                    let (v, len) = varint::read_varuint(&buf[pos..], offset + pos)?;
                    pos += len;
                    minute = v as u8;
                    precision = Precision::Minute;

                    if pos < buf.len() {
                        let (v, len) = varint::read_varuint(&buf[pos..], offset + pos)?;
                        pos += len;
                        second = v as u8;
                        precision = Precision::Second;

                        if pos < buf.len() {
                            let (exp, len) = varint::read_varint(&buf[pos..], offset + pos)?;
                            pos += len;
                            if exp > 0 {
                                return Err(syntax(
                                    offset + pos,
                                    "timestamp fractional exponent must be <= 0",
                                ));
                            }
                            let digits = (-exp).clamp(0, 9) as u8;
                            let (coeff, len) = varint::read_varuint(&buf[pos..], offset + pos)?;
                            pos += len;
                            fraction = coeff;
                            if digits > 0 {
                                precision = Precision::Fractional(digits);
                            }
                        }
                    }
                }
            }
        }

        let ts = Timestamp::new(
            year, month, day, hour, minute, second, fraction, precision, time_offset,
        )?;
        Ok((ts, pos))
    }
}

fn write_negative_zero_varint(buf: &mut Vec<u8>) {
    buf.push(0xC0);
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.year == other.year
            && self.month == other.month
            && self.day == other.day
            && self.hour == other.hour
            && self.minute == other.minute
            && self.second == other.second
            && self.fraction == other.fraction
            && self.precision == other.precision
            && self.offset == other.offset
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if matches!(self.precision, Precision::Year) {
            return write!(f, "T");
        }
        write!(f, "-{:02}", self.month)?;
        if matches!(self.precision, Precision::Month) {
            return write!(f, "T");
        }
        write!(f, "-{:02}", self.day)?;
        if matches!(self.precision, Precision::Day) {
            return write!(f, "T");
        }
        write!(f, "T{:02}:{:02}", self.hour, self.minute)?;
        if matches!(self.precision, Precision::Minute) {
            return write_offset(f, self.offset);
        }
        write!(f, ":{:02}", self.second)?;
        if let Precision::Fractional(digits) = self.precision {
            write!(f, ".{:0width$}", self.fraction, width = digits as usize)?;
        }
        write_offset(f, self.offset)
    }
}

fn write_offset(f: &mut fmt::Formatter, offset: Offset) -> fmt::Result {
    match offset {
        Offset::Utc => write!(f, "Z"),
        Offset::Unknown => write!(f, "-00:00"),
        Offset::Known(minutes) => {
            let sign = if minutes < 0 { '-' } else { '+' };
            let minutes = minutes.unsigned_abs();
            write!(f, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: u16, month: u8, day: u8) -> Timestamp {
        Timestamp::new(year, month, day, 0, 0, 0, 0, Precision::Day, Offset::Unknown).unwrap()
    }

    #[test]
    fn rejects_invalid_calendar_dates() {
        assert!(Timestamp::new(2023, 2, 29, 0, 0, 0, 0, Precision::Day, Offset::Unknown).is_err());
        assert!(Timestamp::new(2024, 2, 29, 0, 0, 0, 0, Precision::Day, Offset::Unknown).is_ok());
        assert!(Timestamp::new(2023, 13, 1, 0, 0, 0, 0, Precision::Day, Offset::Unknown).is_err());
    }

    #[test]
    fn rejects_hour_without_minute_precision() {
        assert!(
            Timestamp::new(2023, 1, 1, 5, 0, 0, 0, Precision::Day, Offset::Unknown).is_err()
        );
    }

    #[test]
    fn year_precision_round_trip() {
        let ts = Timestamp::new(2019, 1, 1, 0, 0, 0, 0, Precision::Year, Offset::Unknown).unwrap();
        let mut buf = Vec::new();
        ts.encode_payload(&mut buf);
        let (back, len) = Timestamp::decode_payload(&buf, 0).unwrap();
        assert_eq!(len, buf.len());
        assert_eq!(back, ts);
        assert_eq!(back.precision(), Precision::Year);
    }

    #[test]
    fn full_precision_round_trip_with_offset() {
        let ts = Timestamp::new(
            2023,
            11,
            9,
            12,
            34,
            56,
            789,
            Precision::Fractional(3),
            Offset::Known(-90),
        )
        .unwrap();
        let mut buf = Vec::new();
        ts.encode_payload(&mut buf);
        let (back, len) = Timestamp::decode_payload(&buf, 0).unwrap();
        assert_eq!(len, buf.len());
        assert_eq!(back, ts);
        assert_eq!(back.to_string(), "2023-11-09T12:34:56.789-01:30");
    }

    #[test]
    fn year_and_full_precision_are_distinct_instants() {
        let year_only = Timestamp::new(2019, 1, 1, 0, 0, 0, 0, Precision::Year, Offset::Unknown).unwrap();
        let full = Timestamp::new(2019, 1, 1, 0, 0, 0, 0, Precision::Second, Offset::Utc).unwrap();
        assert_ne!(year_only, full);
    }

    #[test]
    fn unknown_offset_renders_as_negative_zero() {
        let ts = ymd(2019, 1, 1);
        assert_eq!(format!("{ts}"), "2019-01-01T");
    }
}
