//! The sort node.

use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::{self, ColumnInfo};
use crate::err::Result;
use crate::exe::block::BlockManager;
use crate::exe::iter::{Row, RowProvider, SortOrder, SortingIter};

/// Materializes the input and replays it in sort order.
pub struct SortNode {
	input: BoxedOperator,
	manager: BlockManager,
	iter: SortingIter,
}

impl SortNode {
	pub fn new(input: BoxedOperator, manager: BlockManager, orders: Vec<SortOrder>) -> SortNode {
		let types = symbol::kinds(input.column_infos());
		SortNode {
			input,
			manager,
			iter: SortingIter::new(types, orders),
		}
	}
}

impl Operator for SortNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		self.input.column_infos()
	}
}

impl RowProvider for SortNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if !self.iter.filled() {
			self.iter.fill(&mut *self.input, &self.manager)?;
		}
		self.iter.next_row()
	}
}
