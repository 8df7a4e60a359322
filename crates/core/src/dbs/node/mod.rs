//! The pull-based operator nodes.
//!
//! Every node implements the same contract: expose an output schema
//! and yield one row per call until exhausted. A parent owns its
//! children, so dropping the root tears the whole tree down, which is
//! also how a query is cancelled.

pub mod group;
pub mod join;
pub mod limit;
pub mod output;
pub mod project;
pub mod scan;
pub mod select;
pub mod sort;
pub mod union;

use crate::dbs::symbol::ColumnInfo;
use crate::exe::iter::RowProvider;

/// One node of the operator tree. The row contract itself is the
/// [`RowProvider`] supertrait, which also lets the materializing block
/// iterators pull from a node directly.
pub trait Operator: RowProvider {
	/// The output schema of this node
	fn column_infos(&self) -> &[ColumnInfo];
}

pub type BoxedOperator = Box<dyn Operator + Send>;
