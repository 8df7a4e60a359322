//! The statement text front end: tokenizer and parser.

pub mod lexer;
pub mod parser;
pub mod token;

use crate::err::Result;
use crate::sql::Statement;

/// Parse one statement
pub fn parse(input: &str) -> Result<Statement> {
	let tokens = lexer::Lexer::new(input).tokenize()?;
	parser::Parser::new(tokens).parse_statement()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sql::{
		AggregateOp, BinaryOperator, Expr, JoinKind, Literal, Query, SelectItem, Statement,
	};
	use crate::val::Kind;

	fn parse_select(input: &str) -> crate::sql::Select {
		match parse(input).unwrap() {
			Statement::Query(Query::Select(select)) => *select,
			other => panic!("expected a select, got {other:?}"),
		}
	}

	#[test]
	fn select_with_filter_and_order() {
		let select = parse_select(
			"SELECT id, last AS surname FROM employees WHERE hired > DATE'2012-01-01' ORDER BY birth DESC LIMIT 1 OFFSET 2",
		);
		assert_eq!(select.items.len(), 2);
		assert!(select.selection.is_some());
		assert_eq!(select.order_by.len(), 1);
		assert!(select.order_by[0].descending);
		assert_eq!(select.limit, Some(Expr::Literal(Literal::Int(1))));
		assert_eq!(select.offset, Some(Expr::Literal(Literal::Int(2))));
		match &select.items[1] {
			SelectItem::Expr {
				alias,
				..
			} => assert_eq!(alias.as_deref(), Some("surname")),
			other => panic!("unexpected item {other:?}"),
		}
	}

	#[test]
	fn wildcards() {
		let select = parse_select("SELECT *, e.* FROM employees e");
		assert_eq!(select.items[0], SelectItem::Wildcard);
		assert_eq!(select.items[1], SelectItem::QualifiedWildcard("e".to_string()));
		assert_eq!(select.from[0].table.alias.as_deref(), Some("e"));
	}

	#[test]
	fn operator_precedence() {
		let select = parse_select("SELECT 1 + 2 * 3 FROM system_dual");
		match &select.items[0] {
			SelectItem::Expr {
				expr: Expr::Binary {
					op: BinaryOperator::Add,
					right,
					..
				},
				..
			} => {
				assert!(matches!(
					**right,
					Expr::Binary {
						op: BinaryOperator::Mul,
						..
					}
				));
			}
			other => panic!("unexpected item {other:?}"),
		}
	}

	#[test]
	fn predicates() {
		parse_select("SELECT a FROM t WHERE a BETWEEN 10 AND 5");
		parse_select("SELECT a FROM t WHERE a NOT IN (1, 2, 3)");
		parse_select("SELECT a FROM t WHERE b LIKE '%berg'");
		parse_select("SELECT a FROM t WHERE a IS NOT NULL AND b IS TRUE");
		parse_select("SELECT a FROM t WHERE NOT (a = 1 OR b = 2)");
	}

	#[test]
	fn aggregates() {
		let select =
			parse_select("SELECT sex, COUNT(*), SUM(DISTINCT id) FROM employees GROUP BY sex");
		assert_eq!(select.group_by.len(), 1);
		match &select.items[1] {
			SelectItem::Expr {
				expr: Expr::Aggregate {
					op,
					..
				},
				..
			} => assert_eq!(*op, AggregateOp::CountStar),
			other => panic!("unexpected item {other:?}"),
		}
		match &select.items[2] {
			SelectItem::Expr {
				expr: Expr::Aggregate {
					op,
					distinct,
					..
				},
				..
			} => {
				assert_eq!(*op, AggregateOp::Sum);
				assert!(distinct);
			}
			other => panic!("unexpected item {other:?}"),
		}
	}

	#[test]
	fn joins() {
		let select = parse_select(
			"SELECT e.id, d.name FROM emp e JOIN dept d ON e.dept_id = d.id CROSS JOIN x",
		);
		assert_eq!(select.from[0].joins.len(), 2);
		assert_eq!(select.from[0].joins[0].kind, JoinKind::Inner);
		assert!(select.from[0].joins[0].on.is_some());
		assert_eq!(select.from[0].joins[1].kind, JoinKind::Cross);
	}

	#[test]
	fn union_chain() {
		match parse("SELECT a FROM t UNION ALL SELECT b FROM u UNION SELECT c FROM v").unwrap() {
			Statement::Query(Query::Union {
				all,
				left,
				..
			}) => {
				assert!(!all);
				assert!(matches!(
					*left,
					Query::Union {
						all: true,
						..
					}
				));
			}
			other => panic!("expected a union, got {other:?}"),
		}
	}

	#[test]
	fn create_table() {
		match parse(
			"CREATE TABLE employees (id INTEGER PRIMARY KEY, first VARCHAR(64) NOT NULL, \
			 sex CHAR DEFAULT 'M', born DATE, CHECK (id > 0))",
		)
		.unwrap()
		{
			Statement::CreateTable(create) => {
				assert_eq!(create.name, "employees");
				assert_eq!(create.columns.len(), 4);
				assert!(create.columns[0].primary);
				assert_eq!(create.columns[1].kind, Kind::String);
				assert_eq!(create.columns[1].size, Some(64));
				assert!(create.columns[1].not_null);
				assert_eq!(create.columns[2].default, Some(Literal::String("M".to_string())));
				assert_eq!(create.constraints.len(), 1);
			}
			other => panic!("expected a create table, got {other:?}"),
		}
	}

	#[test]
	fn char_varying_is_a_string() {
		match parse("CREATE TABLE t (name CHAR VARYING(10))").unwrap() {
			Statement::CreateTable(create) => {
				assert_eq!(create.columns[0].kind, Kind::String);
				assert_eq!(create.columns[0].size, Some(10));
			}
			other => panic!("expected a create table, got {other:?}"),
		}
	}

	#[test]
	fn mappings() {
		match parse("CREATE MAPPING employees ('data/emp*.csv', ';', TRUE)").unwrap() {
			Statement::CreateMapping(mapping) => {
				assert_eq!(mapping.pattern, "data/emp*.csv");
				assert_eq!(mapping.delimiter, b';');
				assert!(mapping.skip_first_line);
			}
			other => panic!("expected a create mapping, got {other:?}"),
		}
		assert!(matches!(
			parse("DROP MAPPING employees").unwrap(),
			Statement::DropMapping(name) if name == "employees"
		));
	}

	#[test]
	fn alter_table() {
		assert!(matches!(
			parse("ALTER TABLE t ADD COLUMN age INTEGER").unwrap(),
			Statement::AlterTableAdd {
				..
			}
		));
		assert!(matches!(
			parse("ALTER TABLE t DROP COLUMN age").unwrap(),
			Statement::AlterTableDrop {
				..
			}
		));
	}

	#[test]
	fn explain_ast() {
		match parse("EXPLAIN AST SELECT a FROM t").unwrap() {
			Statement::ExplainAst(inner) => {
				assert!(matches!(*inner, Statement::Query(_)));
			}
			other => panic!("expected an explain, got {other:?}"),
		}
	}

	#[test]
	fn errors_carry_positions() {
		match parse("SELECT FROM t") {
			Err(crate::err::Error::SqlParse {
				line,
				column,
				..
			}) => {
				assert_eq!(line, 1);
				assert!(column > 1);
			}
			other => panic!("expected a parse error, got {other:?}"),
		}
	}

	#[test]
	fn trailing_garbage_is_rejected() {
		assert!(parse("SELECT a FROM t garbage garbage").is_err());
	}
}
