use serde::{Deserialize, Serialize};
use std::fmt;

/// The type tag of a [`crate::val::Value`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
	Bool,
	Int,
	Real,
	String,
	Date,
	Time,
	Timestamp,
}

impl Kind {
	/// Whether this is one of the numeric kinds
	pub fn is_numeric(&self) -> bool {
		matches!(self, Kind::Int | Kind::Real)
	}

	/// Whether this is one of the temporal kinds
	pub fn is_temporal(&self) -> bool {
		matches!(self, Kind::Date | Kind::Time | Kind::Timestamp)
	}

	/// Parse a SQL type name as it appears in DDL
	pub fn from_sql_name(name: &str) -> Option<Kind> {
		match name.to_ascii_uppercase().as_str() {
			"BOOLEAN" | "BOOL" => Some(Kind::Bool),
			"INTEGER" | "INT" | "BIGINT" => Some(Kind::Int),
			"REAL" | "FLOAT" | "DOUBLE" => Some(Kind::Real),
			"VARCHAR" | "CHAR" | "CHARACTER" | "STRING" => Some(Kind::String),
			"DATE" => Some(Kind::Date),
			"TIME" => Some(Kind::Time),
			"TIMESTAMP" => Some(Kind::Timestamp),
			_ => None,
		}
	}
}

impl fmt::Display for Kind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Kind::Bool => write!(f, "BOOLEAN"),
			Kind::Int => write!(f, "INTEGER"),
			Kind::Real => write!(f, "REAL"),
			Kind::String => write!(f, "VARCHAR"),
			Kind::Date => write!(f, "DATE"),
			Kind::Time => write!(f, "TIME"),
			Kind::Timestamp => write!(f, "TIMESTAMP"),
		}
	}
}
