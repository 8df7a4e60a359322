//! Catalog statements and the system tables.

mod helpers;

use csvdb_core::{Error, Session};
use helpers::Env;

#[test]
fn create_alter_drop_roundtrip() {
	let mut env = Env::new();
	env.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name VARCHAR(32) NOT NULL)").unwrap();
	env.execute("ALTER TABLE t ADD COLUMN age INTEGER").unwrap();
	let lines = env.query(
		"SELECT column_name FROM system_columns WHERE table_name = 't' ORDER BY column_name",
	);
	assert_eq!(&lines[1..], ["age", "id", "name"]);
	env.execute("ALTER TABLE t DROP COLUMN age").unwrap();
	env.execute("DROP TABLE t").unwrap();
	let lines = env.query("SELECT table_name FROM system_tables");
	assert_eq!(lines.len(), 1);
}

#[test]
fn duplicate_tables_and_columns_are_rejected() {
	let mut env = Env::new();
	env.execute("CREATE TABLE t (id INTEGER)").unwrap();
	assert!(matches!(
		env.expect_error("CREATE TABLE t (id INTEGER)"),
		Error::TableExists(_)
	));
	assert!(matches!(
		env.expect_error("CREATE TABLE u (id INTEGER, id INTEGER)"),
		Error::SqlValidation(_)
	));
	assert!(matches!(
		env.expect_error("CREATE TABLE v (id INTEGER, PRIMARY KEY (nope))"),
		Error::SqlValidation(_)
	));
}

#[test]
fn mappings_show_up_in_system_mappings() {
	let mut env = Env::new();
	env.execute("CREATE TABLE m (id INTEGER)").unwrap();
	env.execute("CREATE MAPPING m ('m-*.csv', ';', FALSE)").unwrap();
	let lines = env.query("SELECT mapping_name, pattern FROM system_mappings");
	assert_eq!(&lines[1..], ["m,m-*.csv"]);
	env.execute("DROP MAPPING m").unwrap();
	assert!(matches!(env.expect_error("DROP MAPPING m"), Error::MappingNotFound(_)));
}

#[test]
fn missing_table_or_mapping_fails_the_query() {
	let mut env = Env::new();
	assert!(matches!(
		env.expect_error("SELECT * FROM missing"),
		Error::TableNotFound(_)
	));
	env.execute("CREATE TABLE unmapped (id INTEGER)").unwrap();
	assert!(matches!(
		env.expect_error("SELECT * FROM unmapped"),
		Error::MappingNotFound(_)
	));
}

#[test]
fn catalog_survives_a_session_restart() {
	let env = {
		let mut env = Env::new();
		env.write_csv("r.csv", "1\n");
		env.execute("CREATE TABLE r (id INTEGER)").unwrap();
		env.execute("CREATE MAPPING r ('r.csv')").unwrap();
		env
	};
	let mut session = Session::open(env.dir.path()).unwrap();
	let mut out = Vec::new();
	session.execute("SELECT id FROM r", &mut out).unwrap();
	let text = String::from_utf8(out).unwrap();
	assert_eq!(text, "id\n1\n");
}

#[test]
fn parse_errors_carry_positions() {
	let mut env = Env::new();
	match env.expect_error("SELECT 1 FROM system_dual WHERE") {
		Error::SqlParse {
			line,
			column,
			..
		} => {
			assert_eq!(line, 1);
			assert!(column > 20);
		}
		other => panic!("expected a parse error, got {other}"),
	}
}
