//! The expression stack machine.
//!
//! A compiled expression is a linear list of instructions evaluated
//! against a per-row [`VariableStore`]. The final top of stack is the
//! expression result.

use crate::err::{Error, Result};
use crate::fnc::{cast, operate, FunctionRegistry};
use crate::sql::operator::{BinaryOperator, UnaryOperator};
use crate::val::{Kind, Value};
use regex::Regex;
use std::fmt;

/// One stack machine step
#[derive(Clone, Debug)]
pub enum Instruction {
	Nop,
	/// Push an immediate value
	Push(Value),
	/// Push the variable bound to this slot
	PushVar(usize),
	Add,
	Sub,
	Div,
	Mod,
	Mul,
	Not,
	Plus,
	Minus,
	Eq,
	Neq,
	Gt,
	Ge,
	Lt,
	Le,
	And,
	Or,
	Concat,
	Is,
	IsNot,
	/// Pop lhs, from and to; push whether lhs lies between them,
	/// accepting the bounds in either order
	Between,
	/// Look the function up, pop its arguments, push its result
	Func(String),
	/// Replace the top of stack with its cast into the given kind
	Cast(Kind),
	/// Pop lhs and this many candidates; push whether any equals lhs
	In(usize),
	/// Pop lhs; push whether the precompiled pattern matches it
	Like(Regex),
}

impl Instruction {
	fn binary_operator(&self) -> Option<BinaryOperator> {
		Some(match self {
			Instruction::Add => BinaryOperator::Add,
			Instruction::Sub => BinaryOperator::Sub,
			Instruction::Div => BinaryOperator::Div,
			Instruction::Mod => BinaryOperator::Mod,
			Instruction::Mul => BinaryOperator::Mul,
			Instruction::Eq => BinaryOperator::Eq,
			Instruction::Neq => BinaryOperator::Neq,
			Instruction::Gt => BinaryOperator::Gt,
			Instruction::Ge => BinaryOperator::Ge,
			Instruction::Lt => BinaryOperator::Lt,
			Instruction::Le => BinaryOperator::Le,
			Instruction::And => BinaryOperator::And,
			Instruction::Or => BinaryOperator::Or,
			Instruction::Concat => BinaryOperator::Concat,
			Instruction::Is => BinaryOperator::Is,
			Instruction::IsNot => BinaryOperator::IsNot,
			_ => return None,
		})
	}
}

impl fmt::Display for Instruction {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Instruction::Nop => write!(f, "NOP"),
			Instruction::Push(value) => write!(f, "PUSH {value}"),
			Instruction::PushVar(slot) => write!(f, "PUSHVAR {slot}"),
			Instruction::Add => write!(f, "ADD"),
			Instruction::Sub => write!(f, "SUB"),
			Instruction::Div => write!(f, "DIV"),
			Instruction::Mod => write!(f, "MOD"),
			Instruction::Mul => write!(f, "MUL"),
			Instruction::Not => write!(f, "NOT"),
			Instruction::Plus => write!(f, "PLUS"),
			Instruction::Minus => write!(f, "MINUS"),
			Instruction::Eq => write!(f, "EQ"),
			Instruction::Neq => write!(f, "NEQ"),
			Instruction::Gt => write!(f, "GT"),
			Instruction::Ge => write!(f, "GE"),
			Instruction::Lt => write!(f, "LT"),
			Instruction::Le => write!(f, "LE"),
			Instruction::And => write!(f, "AND"),
			Instruction::Or => write!(f, "OR"),
			Instruction::Concat => write!(f, "CONCAT"),
			Instruction::Is => write!(f, "IS"),
			Instruction::IsNot => write!(f, "IS NOT"),
			Instruction::Between => write!(f, "BETWEEN"),
			Instruction::Func(name) => write!(f, "FUNC {name}"),
			Instruction::Cast(kind) => write!(f, "CAST {kind}"),
			Instruction::In(arity) => write!(f, "IN {arity}"),
			Instruction::Like(regex) => write!(f, "LIKE {}", regex.as_str()),
		}
	}
}

/// Per-row variable bindings, indexed by dense slot number
#[derive(Default)]
pub struct VariableStore {
	variables: Vec<Value>,
}

impl VariableStore {
	pub fn new() -> VariableStore {
		VariableStore::default()
	}

	pub fn add_variable(&mut self, slot: usize, value: Value) {
		if self.variables.len() <= slot {
			self.variables.resize(slot + 1, Value::null_of(Kind::Int));
		}
		self.variables[slot] = value;
	}

	pub fn get(&self, slot: usize) -> Option<&Value> {
		self.variables.get(slot)
	}
}

/// A compiled expression
#[derive(Clone, Debug, Default)]
pub struct StackMachine {
	instructions: Vec<Instruction>,
}

impl StackMachine {
	pub fn new(instructions: Vec<Instruction>) -> StackMachine {
		StackMachine {
			instructions,
		}
	}

	pub fn add_instruction(&mut self, instruction: Instruction) {
		self.instructions.push(instruction);
	}

	pub fn instructions(&self) -> &[Instruction] {
		&self.instructions
	}

	/// Evaluate the expression against one row's bindings
	pub fn evaluate(
		&self,
		store: &VariableStore,
		functions: &FunctionRegistry,
	) -> Result<Value> {
		let mut stack: Vec<Value> = Vec::with_capacity(8);
		let pop = |stack: &mut Vec<Value>| stack.pop().ok_or(Error::StackExhausted);
		for instruction in &self.instructions {
			if let Some(op) = instruction.binary_operator() {
				let rhs = pop(&mut stack)?;
				let lhs = pop(&mut stack)?;
				stack.push(operate::binary(op, &lhs, &rhs)?);
				continue;
			}
			match instruction {
				Instruction::Nop => (),
				Instruction::Push(value) => stack.push(value.clone()),
				Instruction::PushVar(slot) => {
					let value = store.get(*slot).ok_or(Error::StackExhausted)?;
					stack.push(value.clone());
				}
				Instruction::Not => {
					let rhs = pop(&mut stack)?;
					stack.push(operate::unary(UnaryOperator::Not, &rhs)?);
				}
				Instruction::Minus => {
					let rhs = pop(&mut stack)?;
					stack.push(operate::unary(UnaryOperator::Minus, &rhs)?);
				}
				// the value on top does not change
				Instruction::Plus => (),
				Instruction::Between => {
					let lhs = pop(&mut stack)?;
					let from = pop(&mut stack)?;
					let to = pop(&mut stack)?;
					stack.push(between(&lhs, &from, &to)?);
				}
				Instruction::Func(name) => {
					let function = functions
						.get(name)
						.ok_or_else(|| Error::FunctionNotFound(name.clone()))?;
					let mut args = Vec::with_capacity(function.params().len());
					for _ in function.params() {
						args.push(pop(&mut stack)?);
					}
					args.reverse();
					for (arg, kind) in args.iter_mut().zip(function.params()) {
						if arg.kind() != *kind {
							*arg = cast::implicit(arg, *kind)?;
						}
					}
					stack.push(function.call(&args)?);
				}
				Instruction::Cast(kind) => {
					let rhs = pop(&mut stack)?;
					stack.push(cast::cast(&rhs, *kind)?);
				}
				Instruction::In(arity) => {
					let lhs = pop(&mut stack)?;
					let mut found = false;
					for _ in 0..*arity {
						let candidate = pop(&mut stack)?;
						if found || lhs.is_null() {
							continue;
						}
						if let Value::Bool(true) =
							operate::binary(BinaryOperator::Eq, &lhs, &candidate)?
						{
							found = true;
						}
					}
					if lhs.is_null() {
						stack.push(Value::null_of(Kind::Bool));
					} else {
						stack.push(Value::Bool(found));
					}
				}
				Instruction::Like(regex) => {
					let lhs = pop(&mut stack)?;
					if lhs.is_null() {
						stack.push(Value::null_of(Kind::Bool));
						continue;
					}
					let text = match lhs {
						Value::Strand(ref v) => v.as_str().to_string(),
						ref other => match cast::cast(other, Kind::String)? {
							Value::Strand(v) => v.as_str().to_string(),
							_ => {
								return Err(Error::Cast {
									from: other.kind(),
									into: Kind::String,
									value: other.to_string(),
								})
							}
						},
					};
					stack.push(Value::Bool(regex.is_match(&text)));
				}
				_ => unreachable!("binary opcodes are handled above"),
			}
		}
		pop(&mut stack)
	}
}

/// `from <= lhs <= to`, accepting the bounds in either order. A null
/// anywhere yields a null boolean.
fn between(lhs: &Value, from: &Value, to: &Value) -> Result<Value> {
	if lhs.is_null() || from.is_null() || to.is_null() {
		return Ok(Value::null_of(Kind::Bool));
	}
	let (low, high) = match operate::binary(BinaryOperator::Ge, to, from)? {
		Value::Bool(true) => (from, to),
		_ => (to, from),
	};
	match operate::binary(BinaryOperator::Ge, lhs, low)? {
		Value::Bool(true) => operate::binary(BinaryOperator::Le, lhs, high),
		other => Ok(other),
	}
}

impl fmt::Display for StackMachine {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for instruction in &self.instructions {
			writeln!(f, "{instruction}")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fnc::REGISTRY;

	fn eval(instructions: Vec<Instruction>) -> Result<Value> {
		StackMachine::new(instructions).evaluate(&VariableStore::new(), &REGISTRY)
	}

	#[test]
	fn arithmetic_program() {
		// 3 + 6
		let out = eval(vec![
			Instruction::Push(Value::Int(3)),
			Instruction::Push(Value::Int(6)),
			Instruction::Add,
		])
		.unwrap();
		assert_eq!(out, Value::Int(9));
	}

	#[test]
	fn cast_then_add() {
		// CAST('7' AS INTEGER) + 1
		let out = eval(vec![
			Instruction::Push(Value::from("7")),
			Instruction::Cast(Kind::Int),
			Instruction::Push(Value::Int(1)),
			Instruction::Add,
		])
		.unwrap();
		assert_eq!(out, Value::Int(8));
	}

	#[test]
	fn variables_resolve_by_slot() {
		let mut store = VariableStore::new();
		store.add_variable(1, Value::Int(41));
		let machine = StackMachine::new(vec![
			Instruction::PushVar(1),
			Instruction::Push(Value::Int(1)),
			Instruction::Add,
		]);
		assert_eq!(machine.evaluate(&store, &REGISTRY).unwrap(), Value::Int(42));
	}

	#[test]
	fn between_accepts_either_bound_order() {
		for (from, to) in [(5, 10), (10, 5)] {
			let out = eval(vec![
				Instruction::Push(Value::Int(to)),
				Instruction::Push(Value::Int(from)),
				Instruction::Push(Value::Int(7)),
				Instruction::Between,
			])
			.unwrap();
			assert_eq!(out, Value::Bool(true), "bounds {from}..{to}");
		}
		let out = eval(vec![
			Instruction::Push(Value::Int(10)),
			Instruction::Push(Value::Int(5)),
			Instruction::Push(Value::Int(12)),
			Instruction::Between,
		])
		.unwrap();
		assert_eq!(out, Value::Bool(false));
	}

	#[test]
	fn in_list_matches_any() {
		let out = eval(vec![
			Instruction::Push(Value::Int(1)),
			Instruction::Push(Value::Int(2)),
			Instruction::Push(Value::Int(3)),
			Instruction::Push(Value::Int(2)),
			Instruction::In(3),
		])
		.unwrap();
		assert_eq!(out, Value::Bool(true));
		let out = eval(vec![
			Instruction::Push(Value::Int(1)),
			Instruction::Push(Value::Int(9)),
			Instruction::In(1),
		])
		.unwrap();
		assert_eq!(out, Value::Bool(false));
	}

	#[test]
	fn like_matches_precompiled_pattern() {
		let regex = Regex::new("^F.*berg$").unwrap();
		let out = eval(vec![
			Instruction::Push(Value::from("Fürstenberg")),
			Instruction::Like(regex),
		])
		.unwrap();
		assert_eq!(out, Value::Bool(true));
	}

	#[test]
	fn function_call_applies_implicit_casts() {
		// POW(2, 10) with integer arguments and real parameters
		let out = eval(vec![
			Instruction::Push(Value::Int(2)),
			Instruction::Push(Value::Int(10)),
			Instruction::Func("POW".to_string()),
		])
		.unwrap();
		assert_eq!(out, Value::Real(1024.0));
	}

	#[test]
	fn empty_stack_is_an_error() {
		assert!(matches!(eval(vec![Instruction::Add]), Err(Error::StackExhausted)));
	}
}
