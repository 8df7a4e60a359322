//! Shared fixtures for the end-to-end tests.
#![allow(dead_code)]

use csvdb_core::{Error, Outcome, Result, Session};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

pub struct Env {
	pub dir: TempDir,
	pub session: Session,
}

impl Env {
	/// A fresh session whose catalog persists under a temp directory
	pub fn new() -> Env {
		let dir = tempfile::tempdir().expect("temp directory");
		let session = Session::open(dir.path()).expect("session opens");
		Env {
			dir,
			session,
		}
	}

	/// Drop a CSV file into the data directory
	pub fn write_csv(&self, name: &str, content: &str) {
		let mut file = File::create(self.dir.path().join(name)).expect("csv file");
		file.write_all(content.as_bytes()).expect("csv content");
	}

	/// Run a statement, discarding any output
	pub fn execute(&mut self, sql: &str) -> Result<Outcome> {
		let mut out = Vec::new();
		self.session.execute(sql, &mut out)
	}

	/// Run a query and collect the output lines (header first)
	pub fn query(&mut self, sql: &str) -> Vec<String> {
		match self.try_query(sql) {
			Ok(lines) => lines,
			Err(err) => panic!("query '{sql}' failed: {err}"),
		}
	}

	pub fn try_query(&mut self, sql: &str) -> Result<Vec<String>> {
		let mut out = Vec::new();
		self.session.execute(sql, &mut out)?;
		let text = String::from_utf8(out).expect("utf-8 output");
		Ok(text.lines().map(ToString::to_string).collect())
	}

	pub fn expect_error(&mut self, sql: &str) -> Error {
		match self.try_query(sql) {
			Ok(lines) => panic!("query '{sql}' unexpectedly succeeded: {lines:?}"),
			Err(err) => err,
		}
	}

	/// The two-row employees fixture
	pub fn with_employees() -> Env {
		let mut env = Env::new();
		env.write_csv(
			"employees.csv",
			"4711,1970-09-23,Lars,Fürstenberg,M,2012-02-01\n\
			 815,1969-05-17,Mark,Fürstenberg,M,2003-04-15\n",
		);
		env.execute(
			"CREATE TABLE employees (id INTEGER PRIMARY KEY, birth DATE, \
			 first VARCHAR(64), last VARCHAR(64), sex CHAR, hired DATE)",
		)
		.expect("create table");
		env.execute("CREATE MAPPING employees ('employees.csv')").expect("create mapping");
		env
	}
}
