use crate::sql::literal::Literal;
use crate::sql::operator::{AggregateOp, BinaryOperator, UnaryOperator};
use crate::val::Kind;
use std::fmt;

/// A possibly qualified column reference.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ColumnRef {
	pub qualifier: Option<String>,
	pub name: String,
}

impl ColumnRef {
	pub fn new(qualifier: Option<String>, name: String) -> ColumnRef {
		ColumnRef {
			qualifier,
			name,
		}
	}
}

impl fmt::Display for ColumnRef {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match &self.qualifier {
			Some(qualifier) => write!(f, "{qualifier}.{}", self.name),
			None => write!(f, "{}", self.name),
		}
	}
}

/// One expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
	Literal(Literal),
	Column(ColumnRef),
	Binary {
		op: BinaryOperator,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Unary {
		op: UnaryOperator,
		expr: Box<Expr>,
	},
	Between {
		expr: Box<Expr>,
		negated: bool,
		low: Box<Expr>,
		high: Box<Expr>,
	},
	InList {
		expr: Box<Expr>,
		negated: bool,
		list: Vec<Expr>,
	},
	Like {
		expr: Box<Expr>,
		negated: bool,
		pattern: String,
	},
	Cast {
		expr: Box<Expr>,
		into: Kind,
	},
	Function {
		name: String,
		args: Vec<Expr>,
	},
	Aggregate {
		op: AggregateOp,
		distinct: bool,
		/// `None` for `COUNT(*)`
		arg: Option<Box<Expr>>,
	},
}

impl Expr {
	pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
		Expr::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn unary(op: UnaryOperator, expr: Expr) -> Expr {
		Expr::Unary {
			op,
			expr: Box::new(expr),
		}
	}

	/// Whether any node of this expression is an aggregate call
	pub fn contains_aggregate(&self) -> bool {
		match self {
			Expr::Aggregate {
				..
			} => true,
			Expr::Literal(_) | Expr::Column(_) => false,
			Expr::Binary {
				left,
				right,
				..
			} => left.contains_aggregate() || right.contains_aggregate(),
			Expr::Unary {
				expr,
				..
			} => expr.contains_aggregate(),
			Expr::Between {
				expr,
				low,
				high,
				..
			} => {
				expr.contains_aggregate() || low.contains_aggregate() || high.contains_aggregate()
			}
			Expr::InList {
				expr,
				list,
				..
			} => expr.contains_aggregate() || list.iter().any(Expr::contains_aggregate),
			Expr::Like {
				expr,
				..
			} => expr.contains_aggregate(),
			Expr::Cast {
				expr,
				..
			} => expr.contains_aggregate(),
			Expr::Function {
				args,
				..
			} => args.iter().any(Expr::contains_aggregate),
		}
	}

	/// Collect every column referenced below this node
	pub fn columns(&self, out: &mut Vec<ColumnRef>) {
		match self {
			Expr::Column(column) => out.push(column.clone()),
			Expr::Literal(_) => (),
			Expr::Binary {
				left,
				right,
				..
			} => {
				left.columns(out);
				right.columns(out);
			}
			Expr::Unary {
				expr,
				..
			} => expr.columns(out),
			Expr::Between {
				expr,
				low,
				high,
				..
			} => {
				expr.columns(out);
				low.columns(out);
				high.columns(out);
			}
			Expr::InList {
				expr,
				list,
				..
			} => {
				expr.columns(out);
				for item in list {
					item.columns(out);
				}
			}
			Expr::Like {
				expr,
				..
			} => expr.columns(out),
			Expr::Cast {
				expr,
				..
			} => expr.columns(out),
			Expr::Function {
				args,
				..
			} => {
				for arg in args {
					arg.columns(out);
				}
			}
			Expr::Aggregate {
				arg,
				..
			} => {
				if let Some(arg) = arg {
					arg.columns(out);
				}
			}
		}
	}
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Expr::Literal(literal) => write!(f, "{literal}"),
			Expr::Column(column) => write!(f, "{column}"),
			Expr::Binary {
				op,
				left,
				right,
			} => write!(f, "({left} {op} {right})"),
			Expr::Unary {
				op: UnaryOperator::Not,
				expr,
			} => write!(f, "(NOT {expr})"),
			Expr::Unary {
				op,
				expr,
			} => write!(f, "{op}{expr}"),
			Expr::Between {
				expr,
				negated,
				low,
				high,
			} => {
				let not = if *negated { " NOT" } else { "" };
				write!(f, "({expr}{not} BETWEEN {low} AND {high})")
			}
			Expr::InList {
				expr,
				negated,
				list,
			} => {
				let not = if *negated { " NOT" } else { "" };
				write!(f, "({expr}{not} IN (")?;
				for (n, item) in list.iter().enumerate() {
					if n > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{item}")?;
				}
				write!(f, "))")
			}
			Expr::Like {
				expr,
				negated,
				pattern,
			} => {
				let not = if *negated { " NOT" } else { "" };
				write!(f, "({expr}{not} LIKE '{}')", pattern.replace('\'', "''"))
			}
			Expr::Cast {
				expr,
				into,
			} => write!(f, "CAST({expr} AS {into})"),
			Expr::Function {
				name,
				args,
			} => {
				write!(f, "{name}(")?;
				for (n, arg) in args.iter().enumerate() {
					if n > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{arg}")?;
				}
				write!(f, ")")
			}
			Expr::Aggregate {
				op: AggregateOp::CountStar,
				..
			} => write!(f, "COUNT(*)"),
			Expr::Aggregate {
				op,
				distinct,
				arg,
			} => {
				let distinct = if *distinct { "DISTINCT " } else { "" };
				match arg {
					Some(arg) => write!(f, "{op}({distinct}{arg})"),
					None => write!(f, "{op}({distinct})"),
				}
			}
		}
	}
}
