//! The streaming CSV row decoder.
//!
//! One logical line is decoded into typed, null-aware values and
//! delivered through a [`RowSink`], one callback per declared column
//! type. Field errors are reported with enough position information
//! for the scan layer to log a diagnostic and skip the row.

use crate::err::{Error, Result};
use crate::val::{Date, Kind, Time, Timestamp};
use std::io::BufRead;

/// Decoding options for one CSV source
#[derive(Clone, Debug)]
pub struct CsvContext {
	pub file: String,
	pub delimiter: u8,
	pub skip_first_line: bool,
}

impl Default for CsvContext {
	fn default() -> Self {
		CsvContext {
			file: String::new(),
			delimiter: b',',
			skip_first_line: false,
		}
	}
}

/// Receives the typed values of one row, one callback per column
pub trait RowSink {
	fn on_long(&mut self, value: i64, null: bool) -> Result<()>;
	fn on_double(&mut self, value: f64, null: bool) -> Result<()>;
	fn on_string(&mut self, value: &str, null: bool) -> Result<()>;
	fn on_date(&mut self, value: Date, null: bool) -> Result<()>;
	fn on_time(&mut self, value: Time, null: bool) -> Result<()>;
	fn on_timestamp(&mut self, value: Timestamp, null: bool) -> Result<()>;
	fn on_boolean(&mut self, value: bool, null: bool) -> Result<()>;
}

/// A streaming line-oriented CSV decoder
pub struct CsvParser<R> {
	context: CsvContext,
	reader: R,
	types: Vec<Kind>,
	line: usize,
	buffer: String,
	header_pending: bool,
}

struct Field {
	text: String,
	quoted: bool,
	column: usize,
}

impl<R: BufRead> CsvParser<R> {
	pub fn new(context: CsvContext, reader: R, types: Vec<Kind>) -> CsvParser<R> {
		CsvParser {
			header_pending: context.skip_first_line,
			context,
			reader,
			types,
			line: 0,
			buffer: String::new(),
		}
	}

	/// The line number of the row delivered by the last
	/// [`CsvParser::parse_line`] call.
	pub fn line(&self) -> usize {
		self.line
	}

	fn error(&self, column: usize, field: usize, reason: impl Into<String>) -> Error {
		Error::CsvParse {
			file: self.context.file.clone(),
			line: self.line,
			column,
			field,
			reason: reason.into(),
		}
	}

	/// Decode the next line into the sink. Returns false on end of
	/// input. A [`Error::CsvParse`] leaves the reader positioned after
	/// the offending line, so the caller may log it and continue.
	pub fn parse_line(&mut self, sink: &mut dyn RowSink) -> Result<bool> {
		if self.header_pending {
			self.header_pending = false;
			if !self.read_line()? {
				return Ok(false);
			}
		}
		if !self.read_line()? {
			return Ok(false);
		}
		let fields = self.split_fields()?;
		if fields.len() != self.types.len() {
			let reason = if fields.len() > self.types.len() {
				format!("too many fields, expected {}", self.types.len())
			} else {
				format!("too few fields, expected {}", self.types.len())
			};
			return Err(self.error(0, fields.len(), reason));
		}
		for (n, field) in fields.iter().enumerate() {
			self.deliver(sink, field, self.types[n], n)?;
		}
		Ok(true)
	}

	fn read_line(&mut self) -> Result<bool> {
		self.buffer.clear();
		let count = self.reader.read_line(&mut self.buffer)?;
		if count == 0 {
			return Ok(false);
		}
		self.line += 1;
		while self.buffer.ends_with('\n') || self.buffer.ends_with('\r') {
			self.buffer.pop();
		}
		Ok(true)
	}

	/// Split the current line on the delimiter, honoring single and
	/// double quotes with doubled-quote escapes. Spaces directly after
	/// a delimiter are skipped.
	fn split_fields(&self) -> Result<Vec<Field>> {
		let bytes = self.buffer.as_bytes();
		let delimiter = self.context.delimiter;
		let mut fields = Vec::with_capacity(self.types.len());
		let mut n = 0;
		loop {
			if !fields.is_empty() {
				while n < bytes.len() && bytes[n] == b' ' {
					n += 1;
				}
			}
			let column = n;
			if n < bytes.len() && (bytes[n] == b'"' || bytes[n] == b'\'') {
				let quote = bytes[n];
				n += 1;
				let mut text = String::new();
				let mut closed = false;
				while n < bytes.len() {
					if bytes[n] == quote {
						// a doubled quote is one literal quote
						if n + 1 < bytes.len() && bytes[n + 1] == quote {
							text.push(quote as char);
							n += 2;
							continue;
						}
						n += 1;
						closed = true;
						break;
					}
					let ch = self.buffer[n..].chars().next().expect("in-bounds char");
					text.push(ch);
					n += ch.len_utf8();
				}
				if !closed {
					return Err(self.error(
						column,
						fields.len(),
						format!("expected a closing {} quote", quote as char),
					));
				}
				if n < bytes.len() && bytes[n] != delimiter {
					return Err(self.error(
						n,
						fields.len(),
						"unexpected characters after closing quote",
					));
				}
				fields.push(Field {
					text,
					quoted: true,
					column,
				});
			} else {
				let start = n;
				while n < bytes.len() && bytes[n] != delimiter {
					n += 1;
				}
				let text = &self.buffer[start..n];
				if text.ends_with('"') || text.ends_with('\'') {
					return Err(self.error(
						n,
						fields.len(),
						"unexpected quote at the end of an unquoted field",
					));
				}
				fields.push(Field {
					text: text.to_string(),
					quoted: false,
					column,
				});
			}
			if n >= bytes.len() {
				break;
			}
			// step over the delimiter
			n += 1;
		}
		Ok(fields)
	}

	fn deliver(
		&self,
		sink: &mut dyn RowSink,
		field: &Field,
		kind: Kind,
		index: usize,
	) -> Result<()> {
		// an empty unquoted field is the null of the declared type
		let null = field.text.is_empty() && !field.quoted;
		let text = field.text.as_str();
		let fail = |reason: String| self.error(field.column, index, reason);
		match kind {
			Kind::Int => {
				if null {
					return sink.on_long(0, true);
				}
				let value = parse_long(text)
					.ok_or_else(|| fail(format!("field '{text}' is not an integer")))?;
				sink.on_long(value, false)
			}
			Kind::Real => {
				if null {
					return sink.on_double(0.0, true);
				}
				let value = text
					.parse::<f64>()
					.map_err(|_| fail(format!("field '{text}' is not a real")))?;
				sink.on_double(value, false)
			}
			Kind::Bool => {
				if null {
					return sink.on_boolean(false, true);
				}
				let bytes = text.as_bytes();
				if bytes.len() != 1 || !bytes[0].is_ascii_digit() {
					return Err(fail(format!("field '{text}' is not a boolean")));
				}
				sink.on_boolean(bytes[0] != b'0', false)
			}
			Kind::Date => {
				if null {
					return sink.on_date(Date::from_julian_day(0), true);
				}
				let value = Date::parse(text)
					.map_err(|_| fail(format!("field '{text}' is not a date (YYYY-MM-DD)")))?;
				sink.on_date(value, false)
			}
			Kind::Time => {
				if null {
					return sink.on_time(Time::midnight(), true);
				}
				let value = Time::parse(text)
					.map_err(|_| fail(format!("field '{text}' is not a time (HH:MM:SS)")))?;
				sink.on_time(value, false)
			}
			Kind::Timestamp => {
				if null {
					let zero = Timestamp::new(Date::from_julian_day(0), Time::midnight());
					return sink.on_timestamp(zero, true);
				}
				let value = Timestamp::parse(text).map_err(|_| {
					fail(format!("field '{text}' is not a timestamp (YYYY-MM-DDTHH:MM:SS)"))
				})?;
				sink.on_timestamp(value, false)
			}
			Kind::String => sink.on_string(text, null),
		}
	}
}

/// Strict integer parsing: an optional sign followed by digits only
fn parse_long(text: &str) -> Option<i64> {
	let rest = text.strip_prefix(['-', '+']).unwrap_or(text);
	if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	text.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::val::Value;
	use std::io::Cursor;

	#[derive(Default)]
	struct VecSink {
		row: Vec<Value>,
	}

	impl RowSink for VecSink {
		fn on_long(&mut self, value: i64, null: bool) -> Result<()> {
			self.row.push(if null {
				Value::null_of(Kind::Int)
			} else {
				Value::Int(value)
			});
			Ok(())
		}
		fn on_double(&mut self, value: f64, null: bool) -> Result<()> {
			self.row.push(if null {
				Value::null_of(Kind::Real)
			} else {
				Value::Real(value)
			});
			Ok(())
		}
		fn on_string(&mut self, value: &str, null: bool) -> Result<()> {
			self.row.push(if null {
				Value::null_of(Kind::String)
			} else {
				Value::from(value)
			});
			Ok(())
		}
		fn on_date(&mut self, value: Date, null: bool) -> Result<()> {
			self.row.push(if null {
				Value::null_of(Kind::Date)
			} else {
				Value::Date(value)
			});
			Ok(())
		}
		fn on_time(&mut self, value: Time, null: bool) -> Result<()> {
			self.row.push(if null {
				Value::null_of(Kind::Time)
			} else {
				Value::Time(value)
			});
			Ok(())
		}
		fn on_timestamp(&mut self, value: Timestamp, null: bool) -> Result<()> {
			self.row.push(if null {
				Value::null_of(Kind::Timestamp)
			} else {
				Value::Timestamp(value)
			});
			Ok(())
		}
		fn on_boolean(&mut self, value: bool, null: bool) -> Result<()> {
			self.row.push(if null {
				Value::null_of(Kind::Bool)
			} else {
				Value::Bool(value)
			});
			Ok(())
		}
	}

	fn parser(input: &str, types: Vec<Kind>) -> CsvParser<Cursor<String>> {
		CsvParser::new(CsvContext::default(), Cursor::new(input.to_string()), types)
	}

	fn parse_all(input: &str, types: Vec<Kind>) -> Vec<Vec<Value>> {
		let mut parser = parser(input, types);
		let mut rows = Vec::new();
		loop {
			let mut sink = VecSink::default();
			match parser.parse_line(&mut sink) {
				Ok(true) => rows.push(sink.row),
				Ok(false) => break,
				Err(err) => panic!("unexpected error: {err}"),
			}
		}
		rows
	}

	#[test]
	fn decodes_typed_rows() {
		let rows = parse_all(
			"4711,1970-09-23,Lars,Fürstenberg,M,2012-02-01\n815,1969-05-17,Mark,Fürstenberg,M,2003-04-15\n",
			vec![Kind::Int, Kind::Date, Kind::String, Kind::String, Kind::String, Kind::Date],
		);
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0][0], Value::Int(4711));
		assert_eq!(rows[0][2], Value::from("Lars"));
		assert_eq!(rows[1][5], Value::Date(Date::parse("2003-04-15").unwrap()));
	}

	#[test]
	fn empty_fields_become_typed_nulls() {
		let rows = parse_all(",,\n", vec![Kind::Int, Kind::String, Kind::Date]);
		assert_eq!(rows.len(), 1);
		assert!(rows[0].iter().all(Value::is_null));
		assert_eq!(rows[0][2].kind(), Kind::Date);
	}

	#[test]
	fn quoted_strings_with_doubled_quotes() {
		let rows = parse_all(
			"\"say \"\"hi\"\"\",'o''clock'\n",
			vec![Kind::String, Kind::String],
		);
		assert_eq!(rows[0][0], Value::from("say \"hi\""));
		assert_eq!(rows[0][1], Value::from("o'clock"));
	}

	#[test]
	fn quoted_empty_string_is_not_null() {
		let rows = parse_all("''\n", vec![Kind::String]);
		assert_eq!(rows[0][0], Value::from(""));
	}

	#[test]
	fn skips_header_when_configured() {
		let context = CsvContext {
			skip_first_line: true,
			..CsvContext::default()
		};
		let mut parser = CsvParser::new(
			context,
			Cursor::new("id,name\n1,a\n".to_string()),
			vec![Kind::Int, Kind::String],
		);
		let mut sink = VecSink::default();
		assert!(parser.parse_line(&mut sink).unwrap());
		assert_eq!(sink.row[0], Value::Int(1));
	}

	#[test]
	fn alternate_delimiter_and_space_skipping() {
		let context = CsvContext {
			delimiter: b';',
			..CsvContext::default()
		};
		let mut parser = CsvParser::new(
			context,
			Cursor::new("1;  left\n".to_string()),
			vec![Kind::Int, Kind::String],
		);
		let mut sink = VecSink::default();
		assert!(parser.parse_line(&mut sink).unwrap());
		assert_eq!(sink.row[1], Value::from("left"));
	}

	#[test]
	fn strict_integer_rejects_trailing_garbage() {
		let mut parser = parser("12x\n", vec![Kind::Int]);
		let mut sink = VecSink::default();
		let err = parser.parse_line(&mut sink).unwrap_err();
		assert!(matches!(err, Error::CsvParse { line: 1, .. }));
	}

	#[test]
	fn field_count_mismatch_is_recoverable() {
		let mut parser = parser("1,2,3\n4,5\n6,7\n", vec![Kind::Int, Kind::Int]);
		let mut sink = VecSink::default();
		assert!(parser.parse_line(&mut sink).is_err());
		// the reader is positioned after the bad line
		let mut sink = VecSink::default();
		assert!(parser.parse_line(&mut sink).unwrap());
		assert_eq!(sink.row, vec![Value::Int(4), Value::Int(5)]);
		let mut sink = VecSink::default();
		assert!(parser.parse_line(&mut sink).unwrap());
		assert!(!parser.parse_line(&mut VecSink::default()).unwrap());
	}

	#[test]
	fn boolean_needs_a_single_digit() {
		let rows = parse_all("1,0\n", vec![Kind::Bool, Kind::Bool]);
		assert_eq!(rows[0], vec![Value::Bool(true), Value::Bool(false)]);
		let mut parser = parser("true\n", vec![Kind::Bool]);
		assert!(parser.parse_line(&mut VecSink::default()).is_err());
	}

	#[test]
	fn crlf_line_endings() {
		let rows = parse_all("1,a\r\n2,b\r\n", vec![Kind::Int, Kind::String]);
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[1][1], Value::from("b"));
	}
}
