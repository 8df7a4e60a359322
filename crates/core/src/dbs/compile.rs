//! Lowering expressions into stack machine programs.
//!
//! The compiler walks the expression tree bottom up, resolving column
//! references to schema slots, checking operand types through the
//! inference tables, and emitting one instruction stream per
//! expression.

use crate::dbs::symbol::{self, ColumnInfo};
use crate::err::{Error, Result};
use crate::exe::vm::{Instruction, StackMachine, VariableStore};
use crate::fnc::{infer, FunctionRegistry, REGISTRY};
use crate::sql::{Expr, UnaryOperator};
use crate::val::{Kind, Value};
use regex::Regex;

/// A compiled expression together with its inferred result kind.
#[derive(Clone, Debug)]
pub struct CompiledExpr {
	machine: StackMachine,
	kind: Kind,
}

impl CompiledExpr {
	pub fn kind(&self) -> Kind {
		self.kind
	}

	pub fn machine(&self) -> &StackMachine {
		&self.machine
	}

	/// Evaluate against one row's bindings
	pub fn evaluate(&self, store: &VariableStore) -> Result<Value> {
		self.machine.evaluate(store, &REGISTRY)
	}
}

/// Bind every slot of a row into a variable store
pub fn fill_store(store: &mut VariableStore, row: &[Value]) {
	for (slot, value) in row.iter().enumerate() {
		store.add_variable(slot, value.clone());
	}
}

/// Compile an expression against the schema of the operator feeding it
pub fn compile(expr: &Expr, schema: &[ColumnInfo]) -> Result<CompiledExpr> {
	let mut compiler = Compiler {
		schema,
		functions: &REGISTRY,
		machine: StackMachine::default(),
	};
	let kind = compiler.emit(expr)?;
	Ok(CompiledExpr {
		machine: compiler.machine,
		kind,
	})
}

/// Translate a SQL LIKE pattern into an anchored regex: `%` matches any
/// run of characters, `_` exactly one.
pub fn like_pattern_to_regex(pattern: &str) -> Result<Regex> {
	let mut out = String::with_capacity(pattern.len() + 8);
	out.push_str("(?s)^");
	for ch in pattern.chars() {
		match ch {
			'%' => out.push_str(".*"),
			'_' => out.push('.'),
			ch => out.push_str(&regex::escape(&ch.to_string())),
		}
	}
	out.push('$');
	Regex::new(&out).map_err(|err| Error::SqlValidation(format!("bad LIKE pattern: {err}")))
}

struct Compiler<'a> {
	schema: &'a [ColumnInfo],
	functions: &'a FunctionRegistry,
	machine: StackMachine,
}

impl Compiler<'_> {
	/// Emit the instructions for one node and return its result kind
	fn emit(&mut self, expr: &Expr) -> Result<Kind> {
		match expr {
			Expr::Literal(literal) => {
				let value = literal.to_value();
				let kind = value.kind();
				self.machine.add_instruction(Instruction::Push(value));
				Ok(kind)
			}
			Expr::Column(column) => {
				let slot = symbol::resolve(self.schema, column)?;
				self.machine.add_instruction(Instruction::PushVar(slot));
				Ok(self.schema[slot].kind)
			}
			Expr::Binary {
				op,
				left,
				right,
			} => {
				let lhs = self.emit(left)?;
				let rhs = self.emit(right)?;
				let kind = infer::binary(*op, lhs, rhs)?;
				self.machine.add_instruction(binary_instruction(*op));
				Ok(kind)
			}
			Expr::Unary {
				op,
				expr,
			} => {
				let rhs = self.emit(expr)?;
				let kind = infer::unary(*op, rhs)?;
				self.machine.add_instruction(match op {
					UnaryOperator::Not => Instruction::Not,
					UnaryOperator::Minus => Instruction::Minus,
					UnaryOperator::Plus => Instruction::Plus,
				});
				Ok(kind)
			}
			Expr::Between {
				expr,
				negated,
				low,
				high,
			} => {
				// the machine pops the probe first, then the bounds
				let high_kind = self.emit(high)?;
				let low_kind = self.emit(low)?;
				let probe = self.emit(expr)?;
				infer::binary(crate::sql::BinaryOperator::Ge, probe, low_kind)?;
				infer::binary(crate::sql::BinaryOperator::Le, probe, high_kind)?;
				self.machine.add_instruction(Instruction::Between);
				if *negated {
					self.machine.add_instruction(Instruction::Not);
				}
				Ok(Kind::Bool)
			}
			Expr::InList {
				expr,
				negated,
				list,
			} => {
				if list.is_empty() {
					return Err(Error::SqlValidation("an IN list cannot be empty".into()));
				}
				let mut kinds = Vec::with_capacity(list.len());
				for item in list {
					kinds.push(self.emit(item)?);
				}
				let probe = self.emit(expr)?;
				for kind in kinds {
					infer::binary(crate::sql::BinaryOperator::Eq, probe, kind)?;
				}
				self.machine.add_instruction(Instruction::In(list.len()));
				if *negated {
					self.machine.add_instruction(Instruction::Not);
				}
				Ok(Kind::Bool)
			}
			Expr::Like {
				expr,
				negated,
				pattern,
			} => {
				let probe = self.emit(expr)?;
				if !infer::castable(probe, Kind::String) {
					return Err(Error::SqlValidation(format!(
						"LIKE needs a string operand, found {probe}"
					)));
				}
				let regex = like_pattern_to_regex(pattern)?;
				self.machine.add_instruction(Instruction::Like(regex));
				if *negated {
					self.machine.add_instruction(Instruction::Not);
				}
				Ok(Kind::Bool)
			}
			Expr::Cast {
				expr,
				into,
			} => {
				let from = self.emit(expr)?;
				if !infer::castable(from, *into) {
					return Err(Error::Cast {
						from,
						into: *into,
						value: expr.to_string(),
					});
				}
				self.machine.add_instruction(Instruction::Cast(*into));
				Ok(*into)
			}
			Expr::Function {
				name,
				args,
			} => {
				let function = self
					.functions
					.get(name)
					.ok_or_else(|| Error::FunctionNotFound(name.clone()))?;
				if args.len() != function.params().len() {
					return Err(Error::FunctionArity {
						name: name.clone(),
						expected: function.params().len(),
						found: args.len(),
					});
				}
				for arg in args {
					self.emit(arg)?;
				}
				self.machine.add_instruction(Instruction::Func(function.name().to_string()));
				Ok(function.return_kind())
			}
			Expr::Aggregate {
				..
			} => Err(Error::SqlValidation(format!(
				"aggregate '{expr}' is not allowed in this context"
			))),
		}
	}
}

fn binary_instruction(op: crate::sql::BinaryOperator) -> Instruction {
	use crate::sql::BinaryOperator as Op;
	match op {
		Op::Concat => Instruction::Concat,
		Op::Add => Instruction::Add,
		Op::Sub => Instruction::Sub,
		Op::Mul => Instruction::Mul,
		Op::Div => Instruction::Div,
		Op::Mod => Instruction::Mod,
		Op::Gt => Instruction::Gt,
		Op::Ge => Instruction::Ge,
		Op::Lt => Instruction::Lt,
		Op::Le => Instruction::Le,
		Op::Eq => Instruction::Eq,
		Op::Neq => Instruction::Neq,
		Op::And => Instruction::And,
		Op::Or => Instruction::Or,
		Op::Is => Instruction::Is,
		Op::IsNot => Instruction::IsNot,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::syn;

	fn parse_expr(input: &str) -> Expr {
		let tokens = crate::syn::lexer::Lexer::new(input).tokenize().unwrap();
		syn::parser::Parser::new(tokens).parse_expr().unwrap()
	}

	fn schema() -> Vec<ColumnInfo> {
		vec![
			ColumnInfo::new(Some("e".to_string()), "id", Kind::Int),
			ColumnInfo::new(Some("e".to_string()), "name", Kind::String),
			ColumnInfo::new(Some("e".to_string()), "hired", Kind::Date),
		]
	}

	fn eval(input: &str, row: &[Value]) -> Result<Value> {
		let compiled = compile(&parse_expr(input), &schema())?;
		let mut store = VariableStore::new();
		fill_store(&mut store, row);
		compiled.evaluate(&store)
	}

	fn sample_row() -> Vec<Value> {
		vec![
			Value::Int(4711),
			Value::from("Fürstenberg"),
			Value::Date(crate::val::Date::parse("2012-02-01").unwrap()),
		]
	}

	#[test]
	fn compiles_arithmetic_with_column_refs() {
		let out = eval("id + 1", &sample_row()).unwrap();
		assert_eq!(out, Value::Int(4712));
	}

	#[test]
	fn infers_result_kinds() {
		assert_eq!(compile(&parse_expr("id / 2"), &schema()).unwrap().kind(), Kind::Int);
		assert_eq!(compile(&parse_expr("id / 2.0"), &schema()).unwrap().kind(), Kind::Real);
		assert_eq!(
			compile(&parse_expr("hired > DATE'2012-01-01'"), &schema()).unwrap().kind(),
			Kind::Bool
		);
	}

	#[test]
	fn like_translates_wildcards() {
		let out = eval("name LIKE '%berg'", &sample_row()).unwrap();
		assert_eq!(out, Value::Bool(true));
		let out = eval("name LIKE 'F_rstenberg'", &sample_row()).unwrap();
		assert_eq!(out, Value::Bool(true));
		let out = eval("name LIKE 'F%x'", &sample_row()).unwrap();
		assert_eq!(out, Value::Bool(false));
	}

	#[test]
	fn like_escapes_regex_metacharacters() {
		let row = vec![Value::Int(1), Value::from("a.b"), Value::null_of(Kind::Date)];
		assert_eq!(eval("name LIKE 'a.b'", &row).unwrap(), Value::Bool(true));
		assert_eq!(eval("name LIKE 'axb'", &row).unwrap(), Value::Bool(false));
	}

	#[test]
	fn between_and_in() {
		assert_eq!(eval("id BETWEEN 5000 AND 4000", &sample_row()).unwrap(), Value::Bool(true));
		assert_eq!(eval("id IN (1, 4711, 9)", &sample_row()).unwrap(), Value::Bool(true));
		assert_eq!(eval("id NOT IN (1, 9)", &sample_row()).unwrap(), Value::Bool(true));
	}

	#[test]
	fn bad_types_fail_at_compile_time() {
		assert!(compile(&parse_expr("name + 1"), &schema()).is_err());
		assert!(compile(&parse_expr("CAST(hired AS INTEGER)"), &schema()).is_err());
		assert!(compile(&parse_expr("nope + 1"), &schema()).is_err());
	}

	#[test]
	fn unknown_function_fails_at_compile_time() {
		assert!(matches!(
			compile(&parse_expr("NO_SUCH(1)"), &schema()),
			Err(Error::FunctionNotFound(_))
		));
	}

	#[test]
	fn aggregates_are_rejected_here() {
		assert!(matches!(
			compile(&parse_expr("SUM(id)"), &schema()),
			Err(Error::SqlValidation(_))
		));
	}
}
