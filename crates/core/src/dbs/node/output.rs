//! The output root: renders rows as delimiter-separated text.

use crate::dbs::node::{BoxedOperator, Operator};
use crate::err::Result;
use crate::exe::iter::RowProvider;
use std::io::Write;

/// Writes a header of column names followed by one line per row.
/// Nulls render as the literal `NULL`, reals with six fixed digits,
/// temporals in ISO form.
pub struct OutputNode {
	input: BoxedOperator,
	delimiter: char,
	header: bool,
}

impl OutputNode {
	pub fn new(input: BoxedOperator) -> OutputNode {
		OutputNode {
			input,
			delimiter: ',',
			header: true,
		}
	}

	pub fn with_header(mut self, header: bool) -> OutputNode {
		self.header = header;
		self
	}

	/// Drain the tree, returning the number of result rows written
	pub fn process(&mut self, out: &mut dyn Write) -> Result<u64> {
		if self.header {
			let names: Vec<String> = self
				.input
				.column_infos()
				.iter()
				.map(|info| info.name.clone())
				.collect();
			writeln!(out, "{}", names.join(&self.delimiter.to_string()))?;
		}
		let mut count = 0u64;
		while let Some(row) = self.input.next_row()? {
			let mut line = String::new();
			for (n, value) in row.iter().enumerate() {
				if n > 0 {
					line.push(self.delimiter);
				}
				line.push_str(&value.to_string());
			}
			writeln!(out, "{line}")?;
			count += 1;
		}
		Ok(count)
	}
}
