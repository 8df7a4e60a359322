use crate::val::{Date, Kind, Time, Timestamp, Value};
use std::fmt;

/// A literal as written in the statement text.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
	/// An untyped NULL; it assumes the boolean kind until an operator
	/// or cast gives it a concrete one
	Null,
	Bool(bool),
	Int(i64),
	Real(f64),
	String(String),
	Date(Date),
	Time(Time),
	Timestamp(Timestamp),
}

impl Literal {
	pub fn to_value(&self) -> Value {
		match self {
			Literal::Null => Value::null_of(Kind::Bool),
			Literal::Bool(v) => Value::Bool(*v),
			Literal::Int(v) => Value::Int(*v),
			Literal::Real(v) => Value::Real(*v),
			Literal::String(v) => Value::from(v.as_str()),
			Literal::Date(v) => Value::Date(*v),
			Literal::Time(v) => Value::Time(*v),
			Literal::Timestamp(v) => Value::Timestamp(*v),
		}
	}

	pub fn kind(&self) -> Kind {
		self.to_value().kind()
	}
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Literal::Null => write!(f, "NULL"),
			Literal::Bool(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
			Literal::Int(v) => write!(f, "{v}"),
			Literal::Real(v) => write!(f, "{v}"),
			Literal::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
			Literal::Date(v) => write!(f, "DATE'{v}'"),
			Literal::Time(v) => write!(f, "TIME'{v}'"),
			Literal::Timestamp(v) => write!(f, "TIMESTAMP'{v}'"),
		}
	}
}
