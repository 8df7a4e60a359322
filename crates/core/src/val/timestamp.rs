use crate::err::{Error, Result};
use crate::val::{Date, Time};
use std::fmt;

/// The packed form multiplies the Julian day so that a whole day and a
/// millisecond of day share one `i64` without overlapping.
const DAY_FACTOR: i64 = 100_000_000;

/// A point in time: a calendar date combined with a time of day.
///
/// Packed as `julian-day * 10^8 + millisecond-of-day` in the block
/// store.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
	date: Date,
	time: Time,
}

impl Timestamp {
	pub fn new(date: Date, time: Time) -> Timestamp {
		Timestamp {
			date,
			time,
		}
	}

	/// Build a timestamp from its packed block representation
	pub fn from_packed(packed: i64) -> Result<Timestamp> {
		let days = packed / DAY_FACTOR;
		let ms = packed % DAY_FACTOR;
		if days < 0 || ms < 0 {
			return Err(Error::DateTime {
				field: "timestamp",
				value: packed.to_string(),
			});
		}
		Ok(Timestamp {
			date: Date::from_julian_day(days as u32),
			time: Time::from_millis(ms as u32)?,
		})
	}

	/// Parse a strict ISO `YYYY-MM-DDTHH:MM:SS[.sss]` literal. The `T`
	/// separator may be a single space.
	pub fn parse(s: &str) -> Result<Timestamp> {
		let err = || Error::DateTime {
			field: "timestamp",
			value: s.to_string(),
		};
		let bytes = s.as_bytes();
		if bytes.len() < 19 || (bytes[10] != b'T' && bytes[10] != b' ') {
			return Err(err());
		}
		let date = Date::parse(&s[0..10]).map_err(|_| err())?;
		let mut time = Time::parse(&s[11..19]).map_err(|_| err())?;
		if bytes.len() > 19 {
			if bytes[19] != b'.' || bytes.len() != 23 {
				return Err(err());
			}
			let ms = s[20..23].parse::<u32>().map_err(|_| err())?;
			time = Time::from_millis(time.as_millis() + ms)?;
		}
		Ok(Timestamp {
			date,
			time,
		})
	}

	pub fn as_packed(&self) -> i64 {
		self.date.as_julian_day() as i64 * DAY_FACTOR + self.time.as_millis() as i64
	}

	pub fn date(&self) -> Date {
		self.date
	}

	pub fn time(&self) -> Time {
		self.time
	}

	/// The difference between two timestamps in whole seconds
	pub fn seconds_between(&self, other: &Timestamp) -> i64 {
		let millis = self.date.days_between(&other.date) * 86_400_000
			+ self.time.millis_between(&other.time);
		millis / 1000
	}
}

impl From<Date> for Timestamp {
	fn from(date: Date) -> Self {
		Timestamp {
			date,
			time: Time::midnight(),
		}
	}
}

impl From<Time> for Timestamp {
	fn from(time: Time) -> Self {
		Timestamp {
			date: Date::from_julian_day(0),
			time,
		}
	}
}

impl fmt::Display for Timestamp {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}T{}", self.date, self.time)
	}
}
