//! An embeddable SQL query engine over CSV files.
//!
//! A [`Session`] owns a catalog of table declarations and CSV
//! mappings. Statements are parsed, validated against the catalog,
//! planned into a tree of pull-based operators, and executed by
//! streaming rows through a block-allocated value store.
//!
//! ```no_run
//! use csvdb_core::Session;
//!
//! fn main() -> csvdb_core::Result<()> {
//! 	let mut session = Session::memory();
//! 	let mut out = Vec::new();
//! 	session.execute(
//! 		"CREATE TABLE employees (id INTEGER, first VARCHAR(64), hired DATE)",
//! 		&mut out,
//! 	)?;
//! 	session.execute("CREATE MAPPING employees ('data/employees*.csv')", &mut out)?;
//! 	session.execute(
//! 		"SELECT id, first FROM employees WHERE hired > DATE'2012-01-01'",
//! 		&mut out,
//! 	)?;
//! 	Ok(())
//! }
//! ```

pub mod cat;
pub mod cnf;
pub mod dbs;
pub mod err;
pub mod exe;
pub mod fnc;
pub mod sql;
pub mod syn;
pub mod val;

pub use crate::dbs::{Outcome, Session};
pub use crate::err::{Error, Result};
pub use crate::val::{Date, Kind, Time, Timestamp, Value};
