use crate::sql::expression::{ColumnRef, Expr};
use std::fmt;

/// One entry of the select list.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectItem {
	/// `*`
	Wildcard,
	/// `alias.*`
	QualifiedWildcard(String),
	Expr {
		expr: Expr,
		alias: Option<String>,
	},
}

/// A table reference with an optional alias.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableRef {
	pub name: String,
	pub alias: Option<String>,
}

impl TableRef {
	/// The name the table's columns are qualified with downstream
	pub fn output_name(&self) -> &str {
		self.alias.as_deref().unwrap_or(&self.name)
	}
}

impl fmt::Display for TableRef {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match &self.alias {
			Some(alias) => write!(f, "{} {alias}", self.name),
			None => write!(f, "{}", self.name),
		}
	}
}

/// The join variants the grammar accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinKind {
	Cross,
	Inner,
	Left,
	Right,
	Full,
	NaturalInner,
	NaturalLeft,
	NaturalRight,
	NaturalFull,
}

impl fmt::Display for JoinKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			JoinKind::Cross => write!(f, "CROSS JOIN"),
			JoinKind::Inner => write!(f, "INNER JOIN"),
			JoinKind::Left => write!(f, "LEFT OUTER JOIN"),
			JoinKind::Right => write!(f, "RIGHT OUTER JOIN"),
			JoinKind::Full => write!(f, "FULL OUTER JOIN"),
			JoinKind::NaturalInner => write!(f, "NATURAL JOIN"),
			JoinKind::NaturalLeft => write!(f, "NATURAL LEFT OUTER JOIN"),
			JoinKind::NaturalRight => write!(f, "NATURAL RIGHT OUTER JOIN"),
			JoinKind::NaturalFull => write!(f, "NATURAL FULL OUTER JOIN"),
		}
	}
}

/// A join attached to a from-list entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Join {
	pub kind: JoinKind,
	pub table: TableRef,
	pub on: Option<Expr>,
}

/// One entry of the from list: a table and its chained joins.
#[derive(Clone, Debug, PartialEq)]
pub struct FromItem {
	pub table: TableRef,
	pub joins: Vec<Join>,
}

/// One sort specification.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
	pub expr: Expr,
	pub descending: bool,
}

/// A plain SELECT block.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Select {
	pub distinct: bool,
	pub items: Vec<SelectItem>,
	pub from: Vec<FromItem>,
	pub selection: Option<Expr>,
	pub group_by: Vec<ColumnRef>,
	pub having: Option<Expr>,
	pub order_by: Vec<OrderBy>,
	pub limit: Option<Expr>,
	pub offset: Option<Expr>,
}

/// A query: a SELECT block or a UNION of two queries.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
	Select(Box<Select>),
	Union {
		left: Box<Query>,
		right: Box<Query>,
		all: bool,
	},
}
