//! The union node.

use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::ColumnInfo;
use crate::err::{Error, Result};
use crate::exe::iter::{Row, RowProvider};

/// Yields every row of the first input, then every row of the second.
/// The schemas must agree by position.
pub struct UnionNode {
	first: BoxedOperator,
	second: BoxedOperator,
	on_second: bool,
}

impl UnionNode {
	pub fn new(first: BoxedOperator, second: BoxedOperator) -> Result<UnionNode> {
		let lhs = first.column_infos();
		let rhs = second.column_infos();
		if lhs.len() != rhs.len() {
			return Err(Error::SqlValidation(format!(
				"UNION inputs differ in column count ({} vs {})",
				lhs.len(),
				rhs.len()
			)));
		}
		for (left, right) in lhs.iter().zip(rhs) {
			let compatible = left.kind == right.kind
				|| (left.kind.is_numeric() && right.kind.is_numeric());
			if !compatible {
				return Err(Error::SqlValidation(format!(
					"UNION column '{}' has incompatible types {} and {}",
					left.name, left.kind, right.kind
				)));
			}
		}
		Ok(UnionNode {
			first,
			second,
			on_second: false,
		})
	}
}

impl Operator for UnionNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		self.first.column_infos()
	}
}

impl RowProvider for UnionNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if !self.on_second {
			if let Some(row) = self.first.next_row()? {
				return Ok(Some(row));
			}
			self.on_second = true;
		}
		self.second.next_row()
	}
}
