//! The virtual system tables, populated from the catalog on scan.

use crate::cat::{Catalog, Column, Table};
use crate::exe::iter::Row;
use crate::val::{Kind, Value};

fn column(name: &str, kind: Kind) -> Column {
	Column {
		name: name.to_string(),
		kind,
		size: None,
		primary: false,
		not_null: false,
		unique: false,
		default: None,
		check: None,
	}
}

/// The schema of a system table, if the name denotes one
pub fn table(name: &str) -> Option<Table> {
	let columns = match name.to_ascii_lowercase().as_str() {
		"system_dual" => vec![column("dummy", Kind::String)],
		"system_tables" => vec![column("table_name", Kind::String)],
		"system_columns" => vec![
			column("table_name", Kind::String),
			column("column_name", Kind::String),
			column("type", Kind::String),
			column("primary_key", Kind::Bool),
			column("not_null", Kind::Bool),
		],
		"system_mappings" => vec![
			column("mapping_name", Kind::String),
			column("pattern", Kind::String),
		],
		_ => return None,
	};
	Some(Table {
		name: name.to_ascii_lowercase(),
		columns,
	})
}

/// The rows of a system table
pub fn rows(name: &str, catalog: &Catalog) -> Vec<Row> {
	match name.to_ascii_lowercase().as_str() {
		"system_dual" => vec![vec![Value::from("X")]],
		"system_tables" => {
			catalog.tables().map(|table| vec![Value::from(table.name.as_str())]).collect()
		}
		"system_columns" => catalog
			.tables()
			.flat_map(|table| {
				table.columns.iter().map(|column| {
					vec![
						Value::from(table.name.as_str()),
						Value::from(column.name.as_str()),
						Value::from(column.kind.to_string()),
						Value::Bool(column.primary),
						Value::Bool(column.not_null),
					]
				})
			})
			.collect(),
		"system_mappings" => catalog
			.mappings()
			.map(|mapping| {
				vec![Value::from(mapping.name.as_str()), Value::from(mapping.pattern.as_str())]
			})
			.collect(),
		_ => Vec::new(),
	}
}
