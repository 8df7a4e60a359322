//! Binary and unary operator dispatch.
//!
//! Every `(operator, lhs kind, rhs kind)` combination resolves to one
//! arm of the matches below. If either operand is null the result is
//! the null of the inferred return type, except for `AND`, `OR`, `IS`
//! and `IS NOT`, which follow SQL three-valued logic.

use crate::err::{Error, Result};
use crate::fnc::infer;
use crate::sql::operator::{BinaryOperator, UnaryOperator};
use crate::val::{Date, Kind, Time, Timestamp, Value};
use lexicmp::lexical_cmp;
use std::cmp::Ordering;

/// The absolute tolerance under which two doubles compare as equal
pub const REAL_EQUALITY_TOLERANCE: f64 = 1e-4;

/// SQL-level approximate equality for doubles
pub fn reals_equal(lhs: f64, rhs: f64) -> bool {
	(lhs - rhs).abs() < REAL_EQUALITY_TOLERANCE
}

fn unsupported(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Error {
	Error::UnsupportedOperation {
		op: op.to_string(),
		lhs: lhs.kind(),
		rhs: rhs.kind(),
	}
}

/// Execute a binary operation on two values
pub fn binary(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value> {
	match op {
		BinaryOperator::And => return and(lhs, rhs),
		BinaryOperator::Or => return or(lhs, rhs),
		BinaryOperator::Is => return is(lhs, rhs).map(Value::Bool),
		BinaryOperator::IsNot => return is(lhs, rhs).map(|v| Value::Bool(!v)),
		_ => (),
	}
	if lhs.is_null() || rhs.is_null() {
		let kind = infer::binary(op, lhs.kind(), rhs.kind()).map_err(|_| {
			unsupported(op, lhs, rhs)
		})?;
		return Ok(Value::null_of(kind));
	}
	match op {
		BinaryOperator::Concat => concat(lhs, rhs),
		BinaryOperator::Add => add(lhs, rhs),
		BinaryOperator::Sub => sub(lhs, rhs),
		BinaryOperator::Mul => mul(lhs, rhs),
		BinaryOperator::Div => div(lhs, rhs),
		BinaryOperator::Mod => modulo(lhs, rhs),
		BinaryOperator::Eq => equal(lhs, rhs).map(Value::Bool),
		BinaryOperator::Neq => equal(lhs, rhs).map(|v| Value::Bool(!v)),
		BinaryOperator::Gt => ordering(op, lhs, rhs).map(|o| Value::Bool(o == Ordering::Greater)),
		BinaryOperator::Ge => ordering(op, lhs, rhs).map(|o| Value::Bool(o != Ordering::Less)),
		BinaryOperator::Lt => ordering(op, lhs, rhs).map(|o| Value::Bool(o == Ordering::Less)),
		BinaryOperator::Le => ordering(op, lhs, rhs).map(|o| Value::Bool(o != Ordering::Greater)),
		BinaryOperator::And
		| BinaryOperator::Or
		| BinaryOperator::Is
		| BinaryOperator::IsNot => unreachable!("handled above"),
	}
}

/// Execute a unary operation on one value
pub fn unary(op: UnaryOperator, rhs: &Value) -> Result<Value> {
	let fail = || Error::UnsupportedUnaryOperation {
		op: op.to_string(),
		rhs: rhs.kind(),
	};
	if rhs.is_null() {
		let kind = infer::unary(op, rhs.kind()).map_err(|_| fail())?;
		return Ok(Value::null_of(kind));
	}
	match op {
		UnaryOperator::Not => match rhs {
			Value::Bool(v) => Ok(Value::Bool(!v)),
			Value::Int(v) => Ok(Value::Bool(*v == 0)),
			Value::Real(v) => Ok(Value::Bool(reals_equal(*v, 0.0))),
			_ => Err(fail()),
		},
		UnaryOperator::Minus => match rhs {
			Value::Int(v) => v.checked_neg().map(Value::Int).ok_or(Error::ArithmeticOverflow),
			Value::Real(v) => Ok(Value::Real(-v)),
			_ => Err(fail()),
		},
		// a no-op on numeric values
		UnaryOperator::Plus => match rhs {
			Value::Int(_) | Value::Real(_) => Ok(rhs.clone()),
			_ => Err(fail()),
		},
	}
}

/// The truthiness used by `AND`, `OR` and `IS`: zero numbers are false,
/// everything else concrete is true.
fn truthy(val: &Value) -> Option<bool> {
	match val {
		Value::Null(_) => None,
		Value::Bool(v) => Some(*v),
		Value::Int(v) => Some(*v != 0),
		Value::Real(v) => Some(!reals_equal(*v, 0.0)),
		Value::Strand(_) | Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => Some(true),
	}
}

fn and(lhs: &Value, rhs: &Value) -> Result<Value> {
	Ok(match (truthy(lhs), truthy(rhs)) {
		(Some(false), _) | (_, Some(false)) => Value::Bool(false),
		(Some(true), Some(true)) => Value::Bool(true),
		_ => Value::null_of(Kind::Bool),
	})
}

fn or(lhs: &Value, rhs: &Value) -> Result<Value> {
	Ok(match (truthy(lhs), truthy(rhs)) {
		(Some(true), _) | (_, Some(true)) => Value::Bool(true),
		(Some(false), Some(false)) => Value::Bool(false),
		_ => Value::null_of(Kind::Bool),
	})
}

/// `x IS y` with both sides treated symmetrically: two nulls match, a
/// null never matches a concrete value, and two concrete values match
/// when both are truthy.
fn is(lhs: &Value, rhs: &Value) -> Result<bool> {
	Ok(match (truthy(lhs), truthy(rhs)) {
		(None, None) => true,
		(None, Some(_)) | (Some(_), None) => false,
		(Some(a), Some(b)) => a && b,
	})
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value> {
	match (lhs, rhs) {
		(Value::Int(a), Value::Int(b)) => {
			a.checked_add(*b).map(Value::Int).ok_or(Error::ArithmeticOverflow)
		}
		(Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
			Ok(Value::Real(lhs.as_real().unwrap_or(0.0) + rhs.as_real().unwrap_or(0.0)))
		}
		_ => Err(unsupported(BinaryOperator::Add, lhs, rhs)),
	}
}

fn sub(lhs: &Value, rhs: &Value) -> Result<Value> {
	match (lhs, rhs) {
		(Value::Int(a), Value::Int(b)) => {
			a.checked_sub(*b).map(Value::Int).ok_or(Error::ArithmeticOverflow)
		}
		(Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
			Ok(Value::Real(lhs.as_real().unwrap_or(0.0) - rhs.as_real().unwrap_or(0.0)))
		}
		(Value::Date(a), Value::Date(b)) => Ok(Value::Int(a.days_between(b))),
		(Value::Time(a), Value::Time(b)) => Ok(Value::Int(a.millis_between(b))),
		(Value::Timestamp(a), Value::Timestamp(b)) => Ok(Value::Int(a.seconds_between(b))),
		_ => Err(unsupported(BinaryOperator::Sub, lhs, rhs)),
	}
}

fn mul(lhs: &Value, rhs: &Value) -> Result<Value> {
	match (lhs, rhs) {
		(Value::Int(a), Value::Int(b)) => {
			a.checked_mul(*b).map(Value::Int).ok_or(Error::ArithmeticOverflow)
		}
		(Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
			Ok(Value::Real(lhs.as_real().unwrap_or(0.0) * rhs.as_real().unwrap_or(0.0)))
		}
		_ => Err(unsupported(BinaryOperator::Mul, lhs, rhs)),
	}
}

fn div(lhs: &Value, rhs: &Value) -> Result<Value> {
	match (lhs, rhs) {
		(Value::Int(a), Value::Int(b)) => {
			if *b == 0 {
				return Err(Error::DivisionByZero);
			}
			a.checked_div(*b).map(Value::Int).ok_or(Error::ArithmeticOverflow)
		}
		(Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
			let b = rhs.as_real().unwrap_or(0.0);
			if b == 0.0 {
				return Err(Error::DivisionByZero);
			}
			Ok(Value::Real(lhs.as_real().unwrap_or(0.0) / b))
		}
		_ => Err(unsupported(BinaryOperator::Div, lhs, rhs)),
	}
}

fn modulo(lhs: &Value, rhs: &Value) -> Result<Value> {
	match (lhs, rhs) {
		(Value::Int(a), Value::Int(b)) => {
			if *b == 0 {
				return Err(Error::DivisionByZero);
			}
			a.checked_rem(*b).map(Value::Int).ok_or(Error::ArithmeticOverflow)
		}
		(Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
			let b = rhs.as_real().unwrap_or(0.0);
			if b == 0.0 {
				return Err(Error::DivisionByZero);
			}
			Ok(Value::Real(lhs.as_real().unwrap_or(0.0) % b))
		}
		_ => Err(unsupported(BinaryOperator::Mod, lhs, rhs)),
	}
}

/// Equality across the implicit-cast matrix. Doubles (and int / double
/// pairs) compare with the absolute tolerance; strings compare with the
/// lexical collation; temporal / string pairs parse the string side.
fn equal(lhs: &Value, rhs: &Value) -> Result<bool> {
	match (lhs, rhs) {
		(Value::Bool(a), Value::Bool(b)) => Ok(a == b),
		(Value::Bool(a), Value::Int(b)) => Ok(*a == (*b != 0)),
		(Value::Int(a), Value::Bool(b)) => Ok((*a != 0) == *b),
		(Value::Bool(a), Value::Real(b)) => Ok(*a == !reals_equal(*b, 0.0)),
		(Value::Real(a), Value::Bool(b)) => Ok(!reals_equal(*a, 0.0) == *b),
		(Value::Int(a), Value::Int(b)) => Ok(a == b),
		(Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
			Ok(reals_equal(lhs.as_real().unwrap_or(0.0), rhs.as_real().unwrap_or(0.0)))
		}
		(Value::Strand(a), Value::Strand(b)) => {
			Ok(lexical_cmp(a.as_str(), b.as_str()) == Ordering::Equal)
		}
		(Value::Date(a), Value::Date(b)) => Ok(a == b),
		(Value::Time(a), Value::Time(b)) => Ok(a == b),
		(Value::Timestamp(a), Value::Timestamp(b)) => Ok(a == b),
		(Value::Date(a), Value::Strand(b)) => Ok(*a == Date::parse(b.as_str())?),
		(Value::Strand(a), Value::Date(b)) => Ok(Date::parse(a.as_str())? == *b),
		(Value::Time(a), Value::Strand(b)) => Ok(*a == Time::parse(b.as_str())?),
		(Value::Strand(a), Value::Time(b)) => Ok(Time::parse(a.as_str())? == *b),
		(Value::Timestamp(a), Value::Strand(b)) => Ok(*a == Timestamp::parse(b.as_str())?),
		(Value::Strand(a), Value::Timestamp(b)) => Ok(Timestamp::parse(a.as_str())? == *b),
		_ => Err(unsupported(BinaryOperator::Eq, lhs, rhs)),
	}
}

/// The ordering behind `<`, `<=`, `>` and `>=`
fn ordering(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Ordering> {
	match (lhs, rhs) {
		(Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
		(Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
			let a = lhs.as_real().unwrap_or(0.0);
			let b = rhs.as_real().unwrap_or(0.0);
			Ok(a.total_cmp(&b))
		}
		(Value::Strand(a), Value::Strand(b)) => Ok(lexical_cmp(a.as_str(), b.as_str())),
		(Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
		(Value::Time(a), Value::Time(b)) => Ok(a.cmp(b)),
		(Value::Timestamp(a), Value::Timestamp(b)) => Ok(a.cmp(b)),
		(Value::Date(a), Value::Strand(b)) => Ok(a.cmp(&Date::parse(b.as_str())?)),
		(Value::Strand(a), Value::Date(b)) => Ok(Date::parse(a.as_str())?.cmp(b)),
		(Value::Time(a), Value::Strand(b)) => Ok(a.cmp(&Time::parse(b.as_str())?)),
		(Value::Strand(a), Value::Time(b)) => Ok(Time::parse(a.as_str())?.cmp(b)),
		(Value::Timestamp(a), Value::Strand(b)) => Ok(a.cmp(&Timestamp::parse(b.as_str())?)),
		(Value::Strand(a), Value::Timestamp(b)) => Ok(Timestamp::parse(a.as_str())?.cmp(b)),
		_ => Err(unsupported(op, lhs, rhs)),
	}
}

/// String concatenation; the non-string side is rendered in canonical
/// ISO form first.
fn concat(lhs: &Value, rhs: &Value) -> Result<Value> {
	let render = |val: &Value| -> Result<String> {
		match val {
			Value::Strand(v) => Ok(v.as_str().to_string()),
			Value::Int(_) | Value::Real(_) => Ok(val.to_string()),
			Value::Date(v) => Ok(v.to_string()),
			Value::Time(v) => Ok(v.to_string()),
			Value::Timestamp(v) => Ok(v.to_string()),
			_ => Err(unsupported(BinaryOperator::Concat, lhs, rhs)),
		}
	};
	if !matches!(lhs, Value::Strand(_)) && !matches!(rhs, Value::Strand(_)) {
		return Err(unsupported(BinaryOperator::Concat, lhs, rhs));
	}
	let mut out = render(lhs)?;
	out.push_str(&render(rhs)?);
	Ok(Value::from(out))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn null(kind: Kind) -> Value {
		Value::null_of(kind)
	}

	#[test]
	fn null_propagates_through_arithmetic() {
		let out = binary(BinaryOperator::Add, &null(Kind::Int), &Value::Int(1)).unwrap();
		assert!(out.is_null());
		assert_eq!(out.kind(), Kind::Int);
		let out = binary(BinaryOperator::Mul, &Value::Real(2.0), &null(Kind::Int)).unwrap();
		assert!(out.is_null());
		assert_eq!(out.kind(), Kind::Real);
	}

	#[test]
	fn and_truth_table() {
		let t = Value::Bool(true);
		let f = Value::Bool(false);
		let n = null(Kind::Bool);
		assert_eq!(binary(BinaryOperator::And, &t, &t).unwrap(), Value::Bool(true));
		assert_eq!(binary(BinaryOperator::And, &t, &f).unwrap(), Value::Bool(false));
		assert!(binary(BinaryOperator::And, &t, &n).unwrap().is_null());
		assert_eq!(binary(BinaryOperator::And, &f, &n).unwrap(), Value::Bool(false));
		assert_eq!(binary(BinaryOperator::And, &n, &f).unwrap(), Value::Bool(false));
		assert!(binary(BinaryOperator::And, &n, &n).unwrap().is_null());
	}

	#[test]
	fn or_truth_table() {
		let t = Value::Bool(true);
		let f = Value::Bool(false);
		let n = null(Kind::Bool);
		assert_eq!(binary(BinaryOperator::Or, &t, &n).unwrap(), Value::Bool(true));
		assert_eq!(binary(BinaryOperator::Or, &n, &t).unwrap(), Value::Bool(true));
		assert!(binary(BinaryOperator::Or, &f, &n).unwrap().is_null());
		assert_eq!(binary(BinaryOperator::Or, &f, &f).unwrap(), Value::Bool(false));
		assert!(binary(BinaryOperator::Or, &n, &n).unwrap().is_null());
	}

	#[test]
	fn is_matches_nulls_symmetrically() {
		let n = null(Kind::Bool);
		let t = Value::Bool(true);
		assert_eq!(binary(BinaryOperator::Is, &n, &n).unwrap(), Value::Bool(true));
		assert_eq!(binary(BinaryOperator::Is, &n, &t).unwrap(), Value::Bool(false));
		assert_eq!(binary(BinaryOperator::Is, &t, &n).unwrap(), Value::Bool(false));
		assert_eq!(binary(BinaryOperator::Is, &t, &t).unwrap(), Value::Bool(true));
		assert_eq!(binary(BinaryOperator::IsNot, &n, &t).unwrap(), Value::Bool(true));
	}

	#[test]
	fn doubles_compare_with_tolerance() {
		let a = Value::Real(1.00001);
		let b = Value::Real(1.00002);
		assert_eq!(binary(BinaryOperator::Eq, &a, &b).unwrap(), Value::Bool(true));
		let c = Value::Real(1.1);
		assert_eq!(binary(BinaryOperator::Eq, &a, &c).unwrap(), Value::Bool(false));
	}

	#[test]
	fn numeric_promotion() {
		let out = binary(BinaryOperator::Add, &Value::Int(2), &Value::Real(0.5)).unwrap();
		assert_eq!(out.kind(), Kind::Real);
		let out = binary(BinaryOperator::Div, &Value::Int(5), &Value::Int(4)).unwrap();
		assert_eq!(out, Value::Int(1));
	}

	#[test]
	fn division_by_zero_is_an_error() {
		assert!(matches!(
			binary(BinaryOperator::Div, &Value::Int(1), &Value::Int(0)),
			Err(Error::DivisionByZero)
		));
		assert!(matches!(
			binary(BinaryOperator::Mod, &Value::Real(1.0), &Value::Real(0.0)),
			Err(Error::DivisionByZero)
		));
	}

	#[test]
	fn date_minus_date_in_days() {
		let a = Value::Date(Date::parse("2012-02-01").unwrap());
		let b = Value::Date(Date::parse("2012-01-01").unwrap());
		assert_eq!(binary(BinaryOperator::Sub, &a, &b).unwrap(), Value::Int(31));
	}

	#[test]
	fn date_compares_against_iso_string() {
		let hired = Value::Date(Date::parse("2012-02-01").unwrap());
		let lit = Value::from("2012-01-01");
		assert_eq!(binary(BinaryOperator::Gt, &hired, &lit).unwrap(), Value::Bool(true));
	}

	#[test]
	fn malformed_temporal_literal_is_an_error() {
		let hired = Value::Date(Date::parse("2012-02-01").unwrap());
		let lit = Value::from("never");
		assert!(binary(BinaryOperator::Gt, &hired, &lit).is_err());
	}

	#[test]
	fn concat_formats_the_other_side() {
		let out =
			binary(BinaryOperator::Concat, &Value::from("id-"), &Value::Int(42)).unwrap();
		assert_eq!(out.as_str(), Some("id-42"));
		let date = Value::Date(Date::parse("2012-02-01").unwrap());
		let out = binary(BinaryOperator::Concat, &date, &Value::from("!")).unwrap();
		assert_eq!(out.as_str(), Some("2012-02-01!"));
	}

	#[test]
	fn unsupported_combination_is_reported() {
		let out = binary(BinaryOperator::Add, &Value::from("a"), &Value::Bool(true));
		assert!(matches!(out, Err(Error::UnsupportedOperation { .. })));
	}
}
