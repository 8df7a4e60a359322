//! Output schemas and identifier resolution.
//!
//! Every operator exposes an ordered list of [`ColumnInfo`] records.
//! A parent resolves the identifiers of its own expressions against
//! its children's schemas, producing the dense slot indices the stack
//! machine binds at evaluation time.

use crate::err::{Error, Result};
use crate::sql::ColumnRef;
use crate::val::Kind;

/// One output column of an operator.
#[derive(Clone, Debug)]
pub struct ColumnInfo {
	/// The table name or alias this column is qualified with
	pub qualifier: Option<String>,
	/// The column name or select-list alias
	pub name: String,
	pub kind: Kind,
}

impl ColumnInfo {
	pub fn new(qualifier: Option<String>, name: impl Into<String>, kind: Kind) -> ColumnInfo {
		ColumnInfo {
			qualifier,
			name: name.into(),
			kind,
		}
	}

	/// The fully qualified display name
	pub fn qualified(&self) -> String {
		match &self.qualifier {
			Some(qualifier) => format!("{qualifier}.{}", self.name),
			None => self.name.clone(),
		}
	}

	fn matches(&self, column: &ColumnRef) -> bool {
		if !self.name.eq_ignore_ascii_case(&column.name) {
			return false;
		}
		match &column.qualifier {
			Some(qualifier) => {
				self.qualifier.as_deref().is_some_and(|q| q.eq_ignore_ascii_case(qualifier))
			}
			None => true,
		}
	}
}

/// Resolve a column reference to its slot in the schema
pub fn resolve(schema: &[ColumnInfo], column: &ColumnRef) -> Result<usize> {
	let mut found = None;
	for (slot, info) in schema.iter().enumerate() {
		if info.matches(column) {
			if found.is_some() {
				return Err(Error::SqlValidation(format!(
					"column reference '{column}' is ambiguous"
				)));
			}
			found = Some(slot);
		}
	}
	found.ok_or_else(|| Error::SqlValidation(format!("unknown column '{column}'")))
}

/// The kinds of a schema, in slot order
pub fn kinds(schema: &[ColumnInfo]) -> Vec<Kind> {
	schema.iter().map(|info| info.kind).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Vec<ColumnInfo> {
		vec![
			ColumnInfo::new(Some("e".to_string()), "id", Kind::Int),
			ColumnInfo::new(Some("d".to_string()), "id", Kind::Int),
			ColumnInfo::new(Some("d".to_string()), "name", Kind::String),
		]
	}

	#[test]
	fn qualified_lookup() {
		let slot =
			resolve(&schema(), &ColumnRef::new(Some("d".to_string()), "id".to_string())).unwrap();
		assert_eq!(slot, 1);
	}

	#[test]
	fn unqualified_lookup_must_be_unambiguous() {
		assert!(resolve(&schema(), &ColumnRef::new(None, "id".to_string())).is_err());
		let slot = resolve(&schema(), &ColumnRef::new(None, "name".to_string())).unwrap();
		assert_eq!(slot, 2);
	}

	#[test]
	fn case_insensitive() {
		let slot =
			resolve(&schema(), &ColumnRef::new(Some("D".to_string()), "NAME".to_string()))
				.unwrap();
		assert_eq!(slot, 2);
	}

	#[test]
	fn unknown_columns_are_validation_errors() {
		assert!(matches!(
			resolve(&schema(), &ColumnRef::new(None, "nope".to_string())),
			Err(Error::SqlValidation(_))
		));
	}
}
