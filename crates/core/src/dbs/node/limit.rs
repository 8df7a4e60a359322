//! The limit / offset node.

use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::ColumnInfo;
use crate::err::Result;
use crate::exe::iter::{Row, RowProvider};

/// Skips the first `offset` rows, then yields at most `limit` more.
pub struct LimitNode {
	input: BoxedOperator,
	limit: Option<u64>,
	offset: u64,
	skipped: u64,
	yielded: u64,
}

impl LimitNode {
	pub fn new(input: BoxedOperator, limit: Option<u64>, offset: u64) -> LimitNode {
		LimitNode {
			input,
			limit,
			offset,
			skipped: 0,
			yielded: 0,
		}
	}
}

impl Operator for LimitNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		self.input.column_infos()
	}
}

impl RowProvider for LimitNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if let Some(limit) = self.limit {
			if self.yielded >= limit {
				return Ok(None);
			}
		}
		while self.skipped < self.offset {
			if self.input.next_row()?.is_none() {
				return Ok(None);
			}
			self.skipped += 1;
		}
		match self.input.next_row()? {
			Some(row) => {
				self.yielded += 1;
				Ok(Some(row))
			}
			None => Ok(None),
		}
	}
}
