//! Operator dispatch, casts, type inference and the scalar function
//! registry.

pub mod cast;
pub mod infer;
pub mod operate;

use crate::err::{Error, Result};
use crate::val::{Date, Kind, Time, Timestamp, Value};
use ahash::AHashMap;
use chrono::{Local, Timelike};
use once_cell::sync::Lazy;

/// A scalar function callable from an expression.
pub struct Function {
	name: &'static str,
	params: &'static [Kind],
	ret: Kind,
	func: fn(&[Value]) -> Result<Value>,
}

impl Function {
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// The declared parameter kinds; arguments are implicitly cast to
	/// these before the call.
	pub fn params(&self) -> &'static [Kind] {
		self.params
	}

	pub fn return_kind(&self) -> Kind {
		self.ret
	}

	pub fn call(&self, args: &[Value]) -> Result<Value> {
		if args.len() != self.params.len() {
			return Err(Error::FunctionArity {
				name: self.name.to_string(),
				expected: self.params.len(),
				found: args.len(),
			});
		}
		(self.func)(args)
	}
}

/// The read-only registry of built-in scalar functions, built once at
/// startup and shared by reference.
pub struct FunctionRegistry {
	functions: AHashMap<&'static str, Function>,
}

impl FunctionRegistry {
	pub fn get(&self, name: &str) -> Option<&Function> {
		self.functions.get(name.to_ascii_uppercase().as_str())
	}
}

pub static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(|| {
	let mut functions = AHashMap::new();
	for function in builtins() {
		functions.insert(function.name, function);
	}
	FunctionRegistry {
		functions,
	}
});

fn builtins() -> Vec<Function> {
	vec![
		Function {
			name: "UPPER",
			params: &[Kind::String],
			ret: Kind::String,
			func: |args| match &args[0] {
				Value::Strand(v) => Ok(Value::from(v.as_str().to_uppercase())),
				v => Ok(Value::null_of(v.kind())),
			},
		},
		Function {
			name: "LOWER",
			params: &[Kind::String],
			ret: Kind::String,
			func: |args| match &args[0] {
				Value::Strand(v) => Ok(Value::from(v.as_str().to_lowercase())),
				v => Ok(Value::null_of(v.kind())),
			},
		},
		Function {
			name: "CHAR_LENGTH",
			params: &[Kind::String],
			ret: Kind::Int,
			func: |args| match &args[0] {
				Value::Strand(v) => Ok(Value::Int(v.as_str().chars().count() as i64)),
				_ => Ok(Value::null_of(Kind::Int)),
			},
		},
		Function {
			name: "ABS",
			params: &[Kind::Real],
			ret: Kind::Real,
			func: |args| match &args[0] {
				Value::Real(v) => Ok(Value::Real(v.abs())),
				_ => Ok(Value::null_of(Kind::Real)),
			},
		},
		Function {
			name: "POW",
			params: &[Kind::Real, Kind::Real],
			ret: Kind::Real,
			func: |args| match (&args[0], &args[1]) {
				(Value::Real(base), Value::Real(exp)) => Ok(Value::Real(base.powf(*exp))),
				_ => Ok(Value::null_of(Kind::Real)),
			},
		},
		Function {
			name: "YEAR",
			params: &[Kind::Date],
			ret: Kind::Int,
			func: |args| match &args[0] {
				Value::Date(v) => Ok(Value::Int(v.year() as i64)),
				_ => Ok(Value::null_of(Kind::Int)),
			},
		},
		Function {
			name: "MONTH",
			params: &[Kind::Date],
			ret: Kind::Int,
			func: |args| match &args[0] {
				Value::Date(v) => Ok(Value::Int(v.month() as i64)),
				_ => Ok(Value::null_of(Kind::Int)),
			},
		},
		Function {
			name: "DAY",
			params: &[Kind::Date],
			ret: Kind::Int,
			func: |args| match &args[0] {
				Value::Date(v) => Ok(Value::Int(v.day() as i64)),
				_ => Ok(Value::null_of(Kind::Int)),
			},
		},
		Function {
			name: "CURRENT_DATE",
			params: &[],
			ret: Kind::Date,
			func: |_| Ok(Value::Date(Date::from_naive(Local::now().date_naive()))),
		},
		Function {
			name: "CURRENT_TIME",
			params: &[],
			ret: Kind::Time,
			func: |_| {
				let now = Local::now().time();
				let ms = now.num_seconds_from_midnight() * 1000 + now.nanosecond() / 1_000_000;
				Ok(Value::Time(Time::from_millis(ms.min(86_399_999))?))
			},
		},
		Function {
			name: "CURRENT_TIMESTAMP",
			params: &[],
			ret: Kind::Timestamp,
			func: |_| {
				let now = Local::now();
				let date = Date::from_naive(now.date_naive());
				let time = now.time();
				let ms =
					time.num_seconds_from_midnight() * 1000 + time.nanosecond() / 1_000_000;
				Ok(Value::Timestamp(Timestamp::new(
					date,
					Time::from_millis(ms.min(86_399_999))?,
				)))
			},
		},
	]
}
