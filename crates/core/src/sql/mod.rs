//! The statement model: expressions, select blocks, DDL, and the
//! operator enums shared with the dispatch layer.

pub mod expression;
pub mod literal;
pub mod operator;
pub mod select;
pub mod statement;

pub use self::expression::{ColumnRef, Expr};
pub use self::literal::Literal;
pub use self::operator::{AggregateOp, BinaryOperator, UnaryOperator};
pub use self::select::{FromItem, Join, JoinKind, OrderBy, Query, Select, SelectItem, TableRef};
pub use self::statement::{
	ColumnDef, CreateTable, MappingDef, Statement, TableConstraint,
};
