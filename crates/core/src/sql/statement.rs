use crate::sql::expression::Expr;
use crate::sql::literal::Literal;
use crate::sql::select::{Query, Select, SelectItem};
use crate::val::Kind;
use std::fmt;
use std::fmt::Write as _;

/// One column declaration in a CREATE TABLE or ALTER TABLE statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
	pub name: String,
	pub kind: Kind,
	/// The declared length of a VARCHAR(n)
	pub size: Option<u32>,
	pub primary: bool,
	pub not_null: bool,
	pub unique: bool,
	pub default: Option<Literal>,
	pub check: Option<Expr>,
}

/// A table-level constraint declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum TableConstraint {
	PrimaryKey(Vec<String>),
	Unique(Vec<String>),
	Check(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTable {
	pub name: String,
	pub columns: Vec<ColumnDef>,
	pub constraints: Vec<TableConstraint>,
}

/// A mapping declaration binding a table name to CSV sources.
#[derive(Clone, Debug, PartialEq)]
pub struct MappingDef {
	pub name: String,
	pub pattern: String,
	pub delimiter: u8,
	pub skip_first_line: bool,
}

/// One parsed statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
	Query(Query),
	CreateTable(CreateTable),
	AlterTableAdd {
		table: String,
		column: ColumnDef,
	},
	AlterTableDrop {
		table: String,
		column: String,
	},
	DropTable(String),
	CreateMapping(MappingDef),
	DropMapping(String),
	ExplainAst(Box<Statement>),
}

impl Statement {
	/// Render the parse tree for EXPLAIN AST
	pub fn ast_dump(&self) -> String {
		let mut out = String::new();
		self.dump_into(&mut out, 0);
		out
	}

	fn dump_into(&self, out: &mut String, depth: usize) {
		let pad = "  ".repeat(depth);
		match self {
			Statement::Query(query) => dump_query(query, out, depth),
			Statement::CreateTable(create) => {
				let _ = writeln!(out, "{pad}CreateTable {}", create.name);
				for column in &create.columns {
					let mut flags = String::new();
					if column.primary {
						flags.push_str(" PRIMARY KEY");
					}
					if column.not_null {
						flags.push_str(" NOT NULL");
					}
					if column.unique {
						flags.push_str(" UNIQUE");
					}
					if let Some(default) = &column.default {
						let _ = write!(flags, " DEFAULT {default}");
					}
					if let Some(check) = &column.check {
						let _ = write!(flags, " CHECK {check}");
					}
					let _ =
						writeln!(out, "{pad}  Column {} {}{flags}", column.name, column.kind);
				}
				for constraint in &create.constraints {
					match constraint {
						TableConstraint::PrimaryKey(columns) => {
							let _ = writeln!(out, "{pad}  PrimaryKey {}", columns.join(", "));
						}
						TableConstraint::Unique(columns) => {
							let _ = writeln!(out, "{pad}  Unique {}", columns.join(", "));
						}
						TableConstraint::Check(expr) => {
							let _ = writeln!(out, "{pad}  Check {expr}");
						}
					}
				}
			}
			Statement::AlterTableAdd {
				table,
				column,
			} => {
				let _ = writeln!(
					out,
					"{pad}AlterTable {table} ADD COLUMN {} {}",
					column.name, column.kind
				);
			}
			Statement::AlterTableDrop {
				table,
				column,
			} => {
				let _ = writeln!(out, "{pad}AlterTable {table} DROP COLUMN {column}");
			}
			Statement::DropTable(name) => {
				let _ = writeln!(out, "{pad}DropTable {name}");
			}
			Statement::CreateMapping(mapping) => {
				let _ = writeln!(
					out,
					"{pad}CreateMapping {} '{}' delimiter '{}' skip-header {}",
					mapping.name,
					mapping.pattern,
					mapping.delimiter as char,
					mapping.skip_first_line
				);
			}
			Statement::DropMapping(name) => {
				let _ = writeln!(out, "{pad}DropMapping {name}");
			}
			Statement::ExplainAst(inner) => {
				let _ = writeln!(out, "{pad}Explain");
				inner.dump_into(out, depth + 1);
			}
		}
	}
}

fn dump_query(query: &Query, out: &mut String, depth: usize) {
	let pad = "  ".repeat(depth);
	match query {
		Query::Union {
			left,
			right,
			all,
		} => {
			let _ = writeln!(out, "{pad}Union{}", if *all { " ALL" } else { "" });
			dump_query(left, out, depth + 1);
			dump_query(right, out, depth + 1);
		}
		Query::Select(select) => dump_select(select, out, depth),
	}
}

fn dump_select(select: &Select, out: &mut String, depth: usize) {
	let pad = "  ".repeat(depth);
	let _ = writeln!(out, "{pad}Select{}", if select.distinct { " DISTINCT" } else { "" });
	for item in &select.items {
		match item {
			SelectItem::Wildcard => {
				let _ = writeln!(out, "{pad}  Item *");
			}
			SelectItem::QualifiedWildcard(qualifier) => {
				let _ = writeln!(out, "{pad}  Item {qualifier}.*");
			}
			SelectItem::Expr {
				expr,
				alias,
			} => match alias {
				Some(alias) => {
					let _ = writeln!(out, "{pad}  Item {expr} AS {alias}");
				}
				None => {
					let _ = writeln!(out, "{pad}  Item {expr}");
				}
			},
		}
	}
	for item in &select.from {
		let _ = writeln!(out, "{pad}  From {}", item.table);
		for join in &item.joins {
			match &join.on {
				Some(on) => {
					let _ = writeln!(out, "{pad}    {} {} ON {on}", join.kind, join.table);
				}
				None => {
					let _ = writeln!(out, "{pad}    {} {}", join.kind, join.table);
				}
			}
		}
	}
	if let Some(selection) = &select.selection {
		let _ = writeln!(out, "{pad}  Where {selection}");
	}
	if !select.group_by.is_empty() {
		let columns: Vec<String> = select.group_by.iter().map(ToString::to_string).collect();
		let _ = writeln!(out, "{pad}  GroupBy {}", columns.join(", "));
	}
	if let Some(having) = &select.having {
		let _ = writeln!(out, "{pad}  Having {having}");
	}
	for order in &select.order_by {
		let direction = if order.descending { "DESC" } else { "ASC" };
		let _ = writeln!(out, "{pad}  OrderBy {} {direction}", order.expr);
	}
	if let Some(limit) = &select.limit {
		let _ = writeln!(out, "{pad}  Limit {limit}");
	}
	if let Some(offset) = &select.offset {
		let _ = writeln!(out, "{pad}  Offset {offset}");
	}
}

impl fmt::Display for Statement {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.ast_dump().trim_end())
	}
}
