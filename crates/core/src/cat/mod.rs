//! The catalog: table definitions, CSV mappings, and the virtual
//! system tables. Declarations can be persisted as JSON under a data
//! directory and are loaded again at session start.

pub mod system;

use crate::err::{Error, Result};
use crate::sql::{ColumnDef, CreateTable, MappingDef};
use crate::val::Kind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One column of a declared table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Column {
	pub name: String,
	pub kind: Kind,
	pub size: Option<u32>,
	pub primary: bool,
	pub not_null: bool,
	pub unique: bool,
	/// The declared DEFAULT, kept as statement text
	pub default: Option<String>,
	/// The declared CHECK, kept as statement text
	pub check: Option<String>,
}

impl From<&ColumnDef> for Column {
	fn from(def: &ColumnDef) -> Self {
		Column {
			name: def.name.clone(),
			kind: def.kind,
			size: def.size,
			primary: def.primary,
			not_null: def.not_null,
			unique: def.unique,
			default: def.default.as_ref().map(ToString::to_string),
			check: def.check.as_ref().map(ToString::to_string),
		}
	}
}

/// One declared table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Table {
	pub name: String,
	pub columns: Vec<Column>,
}

impl Table {
	/// Find a column by name, case-insensitively
	pub fn column(&self, name: &str) -> Option<(usize, &Column)> {
		self.columns
			.iter()
			.enumerate()
			.find(|(_, column)| column.name.eq_ignore_ascii_case(name))
	}

	pub fn column_kinds(&self) -> Vec<Kind> {
		self.columns.iter().map(|column| column.kind).collect()
	}
}

impl From<&CreateTable> for Table {
	fn from(create: &CreateTable) -> Self {
		Table {
			name: create.name.clone(),
			columns: create.columns.iter().map(Column::from).collect(),
		}
	}
}

/// A mapping binding a table name to one or more CSV files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mapping {
	pub name: String,
	pub pattern: String,
	pub delimiter: u8,
	pub skip_first_line: bool,
}

impl From<&MappingDef> for Mapping {
	fn from(def: &MappingDef) -> Self {
		Mapping {
			name: def.name.clone(),
			pattern: def.pattern.clone(),
			delimiter: def.delimiter,
			skip_first_line: def.skip_first_line,
		}
	}
}

impl Mapping {
	/// Expand the file-or-glob pattern, in lexical filename order.
	/// Relative patterns resolve against the catalog's base directory.
	pub fn resolve(&self, base: Option<&Path>) -> Result<Vec<PathBuf>> {
		let pattern = match base {
			Some(base) if !Path::new(&self.pattern).is_absolute() => {
				base.join(&self.pattern).display().to_string()
			}
			_ => self.pattern.clone(),
		};
		let mut files: Vec<PathBuf> = glob::glob(&pattern)
			.map_err(|err| Error::SqlValidation(format!("bad file pattern: {err}")))?
			.filter_map(|entry| entry.ok())
			.collect();
		files.sort();
		if files.is_empty() {
			return Err(Error::SqlValidation(format!(
				"mapping '{}' matches no files under pattern '{}'",
				self.name, self.pattern
			)));
		}
		Ok(files)
	}
}

#[derive(Default, Serialize, Deserialize)]
struct Declarations {
	tables: BTreeMap<String, Table>,
	mappings: BTreeMap<String, Mapping>,
}

/// The session catalog.
#[derive(Default)]
pub struct Catalog {
	declarations: Declarations,
	directory: Option<PathBuf>,
}

const CATALOG_FILE: &str = "catalog.json";

impl Catalog {
	/// An in-memory catalog without persistence
	pub fn new() -> Catalog {
		Catalog::default()
	}

	/// A catalog persisted under the given directory
	pub fn open(directory: impl Into<PathBuf>) -> Result<Catalog> {
		let directory = directory.into();
		let file = directory.join(CATALOG_FILE);
		let declarations = if file.exists() {
			let text = std::fs::read_to_string(&file)?;
			serde_json::from_str(&text)?
		} else {
			Declarations::default()
		};
		debug!(directory = %directory.display(), "opened catalog");
		Ok(Catalog {
			declarations,
			directory: Some(directory),
		})
	}

	pub fn directory(&self) -> Option<&Path> {
		self.directory.as_deref()
	}

	fn persist(&self) -> Result<()> {
		if let Some(directory) = &self.directory {
			std::fs::create_dir_all(directory)?;
			let text = serde_json::to_string_pretty(&self.declarations)?;
			std::fs::write(directory.join(CATALOG_FILE), text)?;
		}
		Ok(())
	}

	fn key(name: &str) -> String {
		name.to_ascii_lowercase()
	}

	// ------------------------------------------------------------------
	// Tables

	pub fn create_table(&mut self, table: Table) -> Result<()> {
		let key = Self::key(&table.name);
		if self.declarations.tables.contains_key(&key) || system::table(&table.name).is_some() {
			return Err(Error::TableExists(table.name));
		}
		self.declarations.tables.insert(key, table);
		self.persist()
	}

	pub fn drop_table(&mut self, name: &str) -> Result<()> {
		self.declarations
			.tables
			.remove(&Self::key(name))
			.ok_or_else(|| Error::TableNotFound(name.to_string()))?;
		self.persist()
	}

	/// Look a table up, covering the virtual system tables as well
	pub fn table(&self, name: &str) -> Result<Table> {
		if let Some(table) = self.declarations.tables.get(&Self::key(name)) {
			return Ok(table.clone());
		}
		system::table(name).ok_or_else(|| Error::TableNotFound(name.to_string()))
	}

	pub fn tables(&self) -> impl Iterator<Item = &Table> {
		self.declarations.tables.values()
	}

	pub fn add_column(&mut self, name: &str, column: Column) -> Result<()> {
		let table = self
			.declarations
			.tables
			.get_mut(&Self::key(name))
			.ok_or_else(|| Error::TableNotFound(name.to_string()))?;
		if table.column(&column.name).is_some() {
			return Err(Error::SqlValidation(format!(
				"column '{}' already exists on table '{name}'",
				column.name
			)));
		}
		table.columns.push(column);
		self.persist()
	}

	pub fn drop_column(&mut self, name: &str, column: &str) -> Result<()> {
		let table = self
			.declarations
			.tables
			.get_mut(&Self::key(name))
			.ok_or_else(|| Error::TableNotFound(name.to_string()))?;
		let (index, _) = table.column(column).ok_or_else(|| Error::ColumnNotFound {
			table: name.to_string(),
			column: column.to_string(),
		})?;
		if table.columns.len() == 1 {
			return Err(Error::SqlValidation(format!(
				"cannot drop the last column of table '{name}'"
			)));
		}
		table.columns.remove(index);
		self.persist()
	}

	// ------------------------------------------------------------------
	// Mappings

	pub fn create_mapping(&mut self, mapping: Mapping) -> Result<()> {
		let key = Self::key(&mapping.name);
		self.declarations.mappings.insert(key, mapping);
		self.persist()
	}

	pub fn drop_mapping(&mut self, name: &str) -> Result<()> {
		self.declarations
			.mappings
			.remove(&Self::key(name))
			.ok_or_else(|| Error::MappingNotFound(name.to_string()))?;
		self.persist()
	}

	pub fn mapping(&self, name: &str) -> Result<&Mapping> {
		self.declarations
			.mappings
			.get(&Self::key(name))
			.ok_or_else(|| Error::MappingNotFound(name.to_string()))
	}

	pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
		self.declarations.mappings.values()
	}
}
