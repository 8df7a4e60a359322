//! The extended projection node.

use crate::dbs::compile::{fill_store, CompiledExpr};
use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::ColumnInfo;
use crate::err::Result;
use crate::exe::iter::{Row, RowProvider};
use crate::exe::vm::VariableStore;

/// One output column: either a pure column reference passed through
/// without re-evaluation, or a compiled expression.
pub enum Projection {
	Column(usize),
	Expr(CompiledExpr),
}

/// Evaluates the configured expression list once per input row.
pub struct ProjectNode {
	input: BoxedOperator,
	projections: Vec<Projection>,
	infos: Vec<ColumnInfo>,
	store: VariableStore,
}

impl ProjectNode {
	pub fn new(
		input: BoxedOperator,
		projections: Vec<Projection>,
		infos: Vec<ColumnInfo>,
	) -> ProjectNode {
		debug_assert_eq!(projections.len(), infos.len());
		ProjectNode {
			input,
			projections,
			infos,
			store: VariableStore::new(),
		}
	}
}

impl Operator for ProjectNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		&self.infos
	}
}

impl RowProvider for ProjectNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		let row = match self.input.next_row()? {
			Some(row) => row,
			None => return Ok(None),
		};
		let needs_eval =
			self.projections.iter().any(|p| matches!(p, Projection::Expr(_)));
		if needs_eval {
			fill_store(&mut self.store, &row);
		}
		let mut out = Row::with_capacity(self.projections.len());
		for projection in &self.projections {
			match projection {
				Projection::Column(slot) => out.push(row[*slot].clone()),
				Projection::Expr(expr) => out.push(expr.evaluate(&self.store)?),
			}
		}
		Ok(Some(out))
	}
}
