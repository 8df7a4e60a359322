use crate::err::{Error, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Offset between chrono's day count (days since 0001-01-01 is day 1)
/// and the Julian day number of the same date.
const JULIAN_OFFSET: i64 = 1_721_425;

/// A calendar date, stored as a Julian day number.
///
/// The packed form written into blocks is exactly this `u32`; day zero
/// is reserved for the null slot in the on-block encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Date(u32);

impl Date {
	/// Build a date from year, month and day, validating the calendar
	pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Date> {
		match NaiveDate::from_ymd_opt(year, month, day) {
			Some(d) => Ok(Date::from_naive(d)),
			None => Err(Error::DateTime {
				field: "date",
				value: format!("{year:04}-{month:02}-{day:02}"),
			}),
		}
	}

	/// Build a date from a raw Julian day number
	pub fn from_julian_day(days: u32) -> Date {
		Date(days)
	}

	pub(crate) fn from_naive(date: NaiveDate) -> Date {
		Date((date.num_days_from_ce() as i64 + JULIAN_OFFSET) as u32)
	}

	pub(crate) fn to_naive(self) -> NaiveDate {
		NaiveDate::from_num_days_from_ce_opt((self.0 as i64 - JULIAN_OFFSET) as i32)
			.unwrap_or_default()
	}

	/// Parse a strict ISO `YYYY-MM-DD` literal
	pub fn parse(s: &str) -> Result<Date> {
		let err = || Error::DateTime {
			field: "date",
			value: s.to_string(),
		};
		let bytes = s.as_bytes();
		if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
			return Err(err());
		}
		let year = s[0..4].parse::<i32>().map_err(|_| err())?;
		let month = s[5..7].parse::<u32>().map_err(|_| err())?;
		let day = s[8..10].parse::<u32>().map_err(|_| err())?;
		Date::from_ymd(year, month, day)
	}

	pub fn as_julian_day(&self) -> u32 {
		self.0
	}

	pub fn year(&self) -> i32 {
		self.to_naive().year()
	}

	pub fn month(&self) -> u32 {
		self.to_naive().month()
	}

	pub fn day(&self) -> u32 {
		self.to_naive().day()
	}

	/// The difference between two dates in whole days
	pub fn days_between(&self, other: &Date) -> i64 {
		self.0 as i64 - other.0 as i64
	}
}

impl fmt::Display for Date {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.to_naive().format("%Y-%m-%d"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn julian_day_epoch() {
		let date = Date::parse("1970-01-01").unwrap();
		assert_eq!(date.as_julian_day(), 2_440_588);
	}

	#[test]
	fn roundtrip_through_julian_day() {
		let date = Date::parse("2012-02-01").unwrap();
		let back = Date::from_julian_day(date.as_julian_day());
		assert_eq!(back.to_string(), "2012-02-01");
	}

	#[test]
	fn difference_in_days() {
		let a = Date::parse("1970-01-10").unwrap();
		let b = Date::parse("1970-01-01").unwrap();
		assert_eq!(a.days_between(&b), 9);
	}

	#[test]
	fn rejects_bad_calendar_dates() {
		assert!(Date::parse("2023-02-30").is_err());
		assert!(Date::parse("2023-13-01").is_err());
		assert!(Date::parse("2023/01/01").is_err());
	}
}
