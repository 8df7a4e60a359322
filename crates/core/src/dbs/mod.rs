//! Statement execution: the session owns the catalog, plans queries
//! into operator trees, and streams result rows to a writer.

pub mod compile;
pub mod node;
pub mod plan;
pub mod symbol;

use crate::cat::{Catalog, Column, Mapping, Table};
use crate::dbs::node::output::OutputNode;
use crate::dbs::plan::Planner;
use crate::err::{Error, Result};
use crate::exe::block::BlockManager;
use crate::sql::{CreateTable, Statement, TableConstraint};
use crate::syn;
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// What a statement did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
	/// A query completed and wrote this many result rows
	Rows(u64),
	/// A DDL statement completed
	Done,
}

/// An embeddable engine session.
pub struct Session {
	catalog: Catalog,
}

impl Session {
	/// A session with an in-memory catalog
	pub fn memory() -> Session {
		Session {
			catalog: Catalog::new(),
		}
	}

	/// A session whose catalog persists under the given directory
	pub fn open(directory: impl Into<PathBuf>) -> Result<Session> {
		Ok(Session {
			catalog: Catalog::open(directory)?,
		})
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	/// Parse, validate, plan and run one statement, streaming any
	/// result rows into the writer.
	pub fn execute(&mut self, input: &str, out: &mut dyn Write) -> Result<Outcome> {
		let statement = syn::parse(input)?;
		self.execute_statement(&statement, out)
	}

	fn execute_statement(
		&mut self,
		statement: &Statement,
		out: &mut dyn Write,
	) -> Result<Outcome> {
		match statement {
			Statement::Query(query) => {
				let manager = BlockManager::default();
				let planner = Planner::new(&self.catalog, manager.clone());
				let root = planner.plan_query(query)?;
				let rows = OutputNode::new(root).process(out)?;
				debug!(
					rows,
					blocks = manager.total(),
					peak = manager.max_used(),
					"query finished"
				);
				Ok(Outcome::Rows(rows))
			}
			Statement::CreateTable(create) => {
				validate_create_table(create)?;
				self.catalog.create_table(Table::from(create))?;
				Ok(Outcome::Done)
			}
			Statement::AlterTableAdd {
				table,
				column,
			} => {
				self.catalog.add_column(table, Column::from(column))?;
				Ok(Outcome::Done)
			}
			Statement::AlterTableDrop {
				table,
				column,
			} => {
				self.catalog.drop_column(table, column)?;
				Ok(Outcome::Done)
			}
			Statement::DropTable(name) => {
				self.catalog.drop_table(name)?;
				Ok(Outcome::Done)
			}
			Statement::CreateMapping(mapping) => {
				self.catalog.create_mapping(Mapping::from(mapping))?;
				Ok(Outcome::Done)
			}
			Statement::DropMapping(name) => {
				self.catalog.drop_mapping(name)?;
				Ok(Outcome::Done)
			}
			Statement::ExplainAst(inner) => {
				out.write_all(inner.ast_dump().as_bytes())?;
				Ok(Outcome::Done)
			}
		}
	}
}

fn validate_create_table(create: &CreateTable) -> Result<()> {
	let mut names = HashSet::new();
	for column in &create.columns {
		if !names.insert(column.name.to_ascii_lowercase()) {
			return Err(Error::SqlValidation(format!(
				"duplicate column '{}' in table '{}'",
				column.name, create.name
			)));
		}
	}
	for constraint in &create.constraints {
		let columns = match constraint {
			TableConstraint::PrimaryKey(columns) | TableConstraint::Unique(columns) => columns,
			TableConstraint::Check(_) => continue,
		};
		for column in columns {
			if !names.contains(&column.to_ascii_lowercase()) {
				return Err(Error::SqlValidation(format!(
					"constraint references unknown column '{column}'"
				)));
			}
		}
	}
	Ok(())
}
