//! The explicit and implicit cast matrix.

use crate::err::{Error, Result};
use crate::fnc::operate::reals_equal;
use crate::val::{Date, Kind, Time, Timestamp, Value};

fn fail(value: &Value, into: Kind) -> Error {
	Error::Cast {
		from: value.kind(),
		into,
		value: value.to_string(),
	}
}

/// Convert a value into the requested kind.
///
/// A null casts into the null of the target kind. A failed conversion
/// (a string that does not parse, an unregistered pair) is a
/// [`Error::Cast`].
pub fn cast(value: &Value, into: Kind) -> Result<Value> {
	if value.is_null() {
		return Ok(Value::null_of(into));
	}
	if value.kind() == into {
		return Ok(value.clone());
	}
	match (value, into) {
		(Value::Int(v), Kind::Real) => Ok(Value::Real(*v as f64)),
		(Value::Real(v), Kind::Int) => {
			if v.is_finite() && (i64::MIN as f64..=i64::MAX as f64).contains(v) {
				Ok(Value::Int(*v as i64))
			} else {
				Err(fail(value, into))
			}
		}
		(Value::Int(v), Kind::Bool) => Ok(Value::Bool(*v != 0)),
		(Value::Bool(v), Kind::Int) => Ok(Value::Int(i64::from(*v))),
		(Value::Strand(v), Kind::Int) => {
			v.as_str().trim().parse::<i64>().map(Value::Int).map_err(|_| fail(value, into))
		}
		(Value::Strand(v), Kind::Real) => {
			v.as_str().trim().parse::<f64>().map(Value::Real).map_err(|_| fail(value, into))
		}
		(Value::Strand(v), Kind::Bool) => match v.as_str().trim().to_ascii_lowercase().as_str() {
			"true" | "1" => Ok(Value::Bool(true)),
			"false" | "0" => Ok(Value::Bool(false)),
			_ => Err(fail(value, into)),
		},
		(Value::Strand(v), Kind::Date) => {
			Date::parse(v.as_str()).map(Value::Date).map_err(|_| fail(value, into))
		}
		(Value::Strand(v), Kind::Time) => {
			Time::parse(v.as_str()).map(Value::Time).map_err(|_| fail(value, into))
		}
		(Value::Strand(v), Kind::Timestamp) => {
			Timestamp::parse(v.as_str()).map(Value::Timestamp).map_err(|_| fail(value, into))
		}
		(Value::Date(v), Kind::Timestamp) => Ok(Value::Timestamp(Timestamp::from(*v))),
		(Value::Time(v), Kind::Timestamp) => Ok(Value::Timestamp(Timestamp::from(*v))),
		_ => Err(fail(value, into)),
	}
}

/// The implicit cast applied to function arguments: numeric widening
/// plus everything the explicit matrix allows, except that reals do not
/// silently truncate into ints.
pub fn implicit(value: &Value, into: Kind) -> Result<Value> {
	match (value, into) {
		(Value::Real(v), Kind::Int) => {
			// only allow exact integral values through implicitly
			if v.fract() == 0.0 || reals_equal(v.fract(), 0.0) {
				Ok(Value::Int(*v as i64))
			} else {
				Err(fail(value, into))
			}
		}
		_ => cast(value, into),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn string_to_int_is_strict() {
		assert_eq!(cast(&Value::from("7"), Kind::Int).unwrap(), Value::Int(7));
		assert_eq!(cast(&Value::from(" -3 "), Kind::Int).unwrap(), Value::Int(-3));
		assert!(cast(&Value::from("7x"), Kind::Int).is_err());
		assert!(cast(&Value::from(""), Kind::Int).is_err());
	}

	#[test]
	fn null_casts_to_typed_null() {
		let out = cast(&Value::null_of(Kind::String), Kind::Date).unwrap();
		assert!(out.is_null());
		assert_eq!(out.kind(), Kind::Date);
	}

	#[test]
	fn temporal_widening() {
		let date = Date::parse("2012-02-01").unwrap();
		let out = cast(&Value::Date(date), Kind::Timestamp).unwrap();
		assert_eq!(out.to_string(), "2012-02-01T00:00:00");
	}

	#[test]
	fn unregistered_pairs_fail() {
		assert!(cast(&Value::Date(Date::parse("2012-02-01").unwrap()), Kind::Int).is_err());
		assert!(cast(&Value::Bool(true), Kind::Real).is_err());
	}

	#[test]
	fn implicit_rejects_fractional_narrowing() {
		assert!(implicit(&Value::Real(1.5), Kind::Int).is_err());
		assert_eq!(implicit(&Value::Real(2.0), Kind::Int).unwrap(), Value::Int(2));
	}
}
