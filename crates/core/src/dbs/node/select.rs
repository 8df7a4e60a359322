//! The filter node.

use crate::dbs::compile::{fill_store, CompiledExpr};
use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::ColumnInfo;
use crate::err::{Error, Result};
use crate::exe::iter::{Row, RowProvider};
use crate::exe::vm::VariableStore;
use crate::val::{Kind, Value};

/// Yields the input rows for which the predicate is true; a null
/// predicate result counts as false.
pub struct SelectNode {
	input: BoxedOperator,
	predicate: CompiledExpr,
	store: VariableStore,
}

impl SelectNode {
	pub fn new(input: BoxedOperator, predicate: CompiledExpr) -> Result<SelectNode> {
		if predicate.kind() != Kind::Bool {
			return Err(Error::SqlValidation(format!(
				"the filter condition must be a boolean, found {}",
				predicate.kind()
			)));
		}
		Ok(SelectNode {
			input,
			predicate,
			store: VariableStore::new(),
		})
	}
}

impl Operator for SelectNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		self.input.column_infos()
	}
}

impl RowProvider for SelectNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		while let Some(row) = self.input.next_row()? {
			fill_store(&mut self.store, &row);
			if let Value::Bool(true) = self.predicate.evaluate(&self.store)? {
				return Ok(Some(row));
			}
		}
		Ok(None)
	}
}
