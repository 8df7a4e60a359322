use std::fmt;

/// Binary operators with a direct dispatch entry.
///
/// `BETWEEN`, `IN` and `LIKE` are not listed here: they are structural
/// forms compiled into their own stack machine instructions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOperator {
	Concat,
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	Gt,
	Ge,
	Lt,
	Le,
	Eq,
	Neq,
	And,
	Or,
	Is,
	IsNot,
}

impl fmt::Display for BinaryOperator {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			BinaryOperator::Concat => write!(f, "||"),
			BinaryOperator::Add => write!(f, "+"),
			BinaryOperator::Sub => write!(f, "-"),
			BinaryOperator::Mul => write!(f, "*"),
			BinaryOperator::Div => write!(f, "/"),
			BinaryOperator::Mod => write!(f, "%"),
			BinaryOperator::Gt => write!(f, ">"),
			BinaryOperator::Ge => write!(f, ">="),
			BinaryOperator::Lt => write!(f, "<"),
			BinaryOperator::Le => write!(f, "<="),
			BinaryOperator::Eq => write!(f, "="),
			BinaryOperator::Neq => write!(f, "<>"),
			BinaryOperator::And => write!(f, "AND"),
			BinaryOperator::Or => write!(f, "OR"),
			BinaryOperator::Is => write!(f, "IS"),
			BinaryOperator::IsNot => write!(f, "IS NOT"),
		}
	}
}

/// The built-in aggregate functions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AggregateOp {
	Count,
	CountStar,
	Sum,
	Avg,
	Min,
	Max,
	Arbitrary,
}

impl AggregateOp {
	/// Resolve an aggregate function name
	pub fn from_name(name: &str) -> Option<AggregateOp> {
		match name.to_ascii_uppercase().as_str() {
			"COUNT" => Some(AggregateOp::Count),
			"SUM" => Some(AggregateOp::Sum),
			"AVG" => Some(AggregateOp::Avg),
			"MIN" => Some(AggregateOp::Min),
			"MAX" => Some(AggregateOp::Max),
			"ARBITRARY" => Some(AggregateOp::Arbitrary),
			_ => None,
		}
	}
}

impl fmt::Display for AggregateOp {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			AggregateOp::Count => write!(f, "COUNT"),
			AggregateOp::CountStar => write!(f, "COUNT(*)"),
			AggregateOp::Sum => write!(f, "SUM"),
			AggregateOp::Avg => write!(f, "AVG"),
			AggregateOp::Min => write!(f, "MIN"),
			AggregateOp::Max => write!(f, "MAX"),
			AggregateOp::Arbitrary => write!(f, "ARBITRARY"),
		}
	}
}

/// Unary operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UnaryOperator {
	Not,
	Minus,
	Plus,
}

impl fmt::Display for UnaryOperator {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			UnaryOperator::Not => write!(f, "NOT"),
			UnaryOperator::Minus => write!(f, "-"),
			UnaryOperator::Plus => write!(f, "+"),
		}
	}
}
