//! The join nodes: nested-loop cross join and the hash-based
//! equi-join it upgrades to.

use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::{self, ColumnInfo};
use crate::err::Result;
use crate::exe::block::BlockManager;
use crate::exe::iter::{CachingIter, HashingIter, Row, RowProvider};

fn joined_infos(lhs: &dyn Operator, rhs: &dyn Operator) -> Vec<ColumnInfo> {
	let mut infos = lhs.column_infos().to_vec();
	infos.extend_from_slice(rhs.column_infos());
	infos
}

/// The cartesian product of two inputs. The right input is
/// materialized once and rewound for every left row.
pub struct CrossJoinNode {
	lhs: BoxedOperator,
	rhs: BoxedOperator,
	manager: BlockManager,
	cache: CachingIter,
	current: Option<Row>,
	infos: Vec<ColumnInfo>,
}

impl CrossJoinNode {
	pub fn new(lhs: BoxedOperator, rhs: BoxedOperator, manager: BlockManager) -> CrossJoinNode {
		let infos = joined_infos(&*lhs, &*rhs);
		let cache = CachingIter::new(symbol::kinds(rhs.column_infos()));
		CrossJoinNode {
			lhs,
			rhs,
			manager,
			cache,
			current: None,
			infos,
		}
	}
}

impl Operator for CrossJoinNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		&self.infos
	}
}

impl RowProvider for CrossJoinNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if !self.cache.filled() {
			self.cache.fill(&mut *self.rhs, &self.manager)?;
		}
		loop {
			if self.current.is_none() {
				match self.lhs.next_row()? {
					Some(row) => {
						self.current = Some(row);
						self.cache.rewind();
					}
					None => return Ok(None),
				}
			}
			match self.cache.next_row()? {
				Some(rhs_row) => {
					let mut row = self.current.clone().expect("left row is current");
					row.extend(rhs_row);
					return Ok(Some(row));
				}
				None => self.current = None,
			}
		}
	}
}

/// An inner equi-join: the right input is materialized into a hash
/// table keyed on its join column, and each left row probes it.
pub struct HashJoinNode {
	lhs: BoxedOperator,
	rhs: BoxedOperator,
	manager: BlockManager,
	lhs_key: usize,
	hash: HashingIter,
	current: Option<Row>,
	infos: Vec<ColumnInfo>,
}

impl HashJoinNode {
	pub fn new(
		lhs: BoxedOperator,
		rhs: BoxedOperator,
		lhs_key: usize,
		rhs_key: usize,
		manager: BlockManager,
	) -> HashJoinNode {
		let infos = joined_infos(&*lhs, &*rhs);
		let hash = HashingIter::new(symbol::kinds(rhs.column_infos()), rhs_key);
		HashJoinNode {
			lhs,
			rhs,
			manager,
			lhs_key,
			hash,
			current: None,
			infos,
		}
	}
}

impl Operator for HashJoinNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		&self.infos
	}
}

impl RowProvider for HashJoinNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if !self.hash.filled() {
			self.hash.fill(&mut *self.rhs, &self.manager)?;
		}
		loop {
			if self.current.is_none() {
				match self.lhs.next_row()? {
					Some(row) => {
						let key = &row[self.lhs_key];
						// a null key matches nothing
						if key.is_null() {
							continue;
						}
						self.hash.set_context_for_key(key);
						self.current = Some(row);
					}
					None => return Ok(None),
				}
			}
			match self.hash.next_key_value_row()? {
				Some(rhs_row) => {
					let mut row = self.current.clone().expect("left row is current");
					row.extend(rhs_row);
					return Ok(Some(row));
				}
				None => self.current = None,
			}
		}
	}
}
