//! Grouped and full-scan aggregation nodes.

use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::{self, ColumnInfo};
use crate::err::Result;
use crate::exe::aggr::Aggregator;
use crate::exe::block::BlockManager;
use crate::exe::iter::{GroupingIter, Row, RowProvider};

/// Hash aggregation over the input, one output row per group. With an
/// empty key list this is the full-scan aggregate, which always emits
/// exactly one row.
pub struct GroupNode {
	input: BoxedOperator,
	manager: BlockManager,
	key_indices: Vec<usize>,
	input_indices: Vec<usize>,
	prototypes: Vec<Aggregator>,
	infos: Vec<ColumnInfo>,
	iter: GroupingIter,
}

impl GroupNode {
	/// `prototypes[i]` aggregates input column `input_indices[i]`; the
	/// output schema lists the non-suppressed accumulators in order.
	pub fn new(
		input: BoxedOperator,
		manager: BlockManager,
		key_indices: Vec<usize>,
		input_indices: Vec<usize>,
		prototypes: Vec<Aggregator>,
		infos: Vec<ColumnInfo>,
	) -> GroupNode {
		let output_types = prototypes
			.iter()
			.filter(|prototype| !prototype.suppress())
			.map(Aggregator::output)
			.collect();
		GroupNode {
			input,
			manager,
			key_indices,
			input_indices,
			prototypes,
			infos,
			iter: GroupingIter::new(output_types),
		}
	}

	/// A distinct filter: every column is a grouping key carried
	/// through unchanged.
	pub fn distinct(input: BoxedOperator, manager: BlockManager) -> GroupNode {
		let infos = input.column_infos().to_vec();
		let kinds = symbol::kinds(&infos);
		let key_indices: Vec<usize> = (0..kinds.len()).collect();
		let prototypes =
			kinds.iter().map(|kind| Aggregator::pass_through(*kind, false)).collect();
		GroupNode::new(input, manager, key_indices.clone(), key_indices, prototypes, infos)
	}
}

impl Operator for GroupNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		&self.infos
	}
}

impl RowProvider for GroupNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if !self.iter.filled() {
			self.iter.fill(
				&mut *self.input,
				&self.manager,
				&self.key_indices,
				&self.input_indices,
				&self.prototypes,
			)?;
		}
		self.iter.next_row()
	}
}
