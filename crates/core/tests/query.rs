//! End-to-end query scenarios.

mod helpers;

use helpers::Env;

#[test]
fn scan_with_filter() {
	let mut env = Env::with_employees();
	let lines = env.query("SELECT * FROM employees WHERE hired > DATE'2012-01-01'");
	assert_eq!(lines[0], "id,birth,first,last,sex,hired");
	assert_eq!(lines.len(), 2);
	assert_eq!(lines[1], "4711,1970-09-23,Lars,Fürstenberg,M,2012-02-01");
}

#[test]
fn arithmetic_and_cast_over_dual() {
	let mut env = Env::new();
	let lines = env.query("SELECT 3 + 6, CAST('7' AS INTEGER) + 1 FROM system_dual");
	assert_eq!(lines.len(), 2);
	assert_eq!(lines[1], "9,8");
}

#[test]
fn group_with_count() {
	let mut env = Env::with_employees();
	let lines = env.query("SELECT sex, COUNT(*) FROM employees GROUP BY sex");
	assert_eq!(lines[0], "sex,COUNT(*)");
	assert_eq!(lines.len(), 2);
	assert_eq!(lines[1], "M,2");
}

#[test]
fn order_by_hidden_column_with_limit() {
	let mut env = Env::with_employees();
	let lines = env.query("SELECT id FROM employees ORDER BY birth DESC LIMIT 1");
	assert_eq!(lines, vec!["id", "4711"]);
}

#[test]
fn inner_join_matches_by_key() {
	let mut env = Env::new();
	env.write_csv("emp.csv", "1,10\n2,20\n");
	env.write_csv("dept.csv", "10,A\n20,B\n");
	env.execute("CREATE TABLE emp (id INTEGER, dept_id INTEGER)").unwrap();
	env.execute("CREATE TABLE dept (id INTEGER, name VARCHAR(10))").unwrap();
	env.execute("CREATE MAPPING emp ('emp.csv')").unwrap();
	env.execute("CREATE MAPPING dept ('dept.csv')").unwrap();
	let lines =
		env.query("SELECT e.id, d.name FROM emp e JOIN dept d ON e.dept_id = d.id");
	assert_eq!(lines[0], "id,name");
	assert_eq!(&lines[1..], ["1,A", "2,B"]);
}

#[test]
fn hash_join_equals_cross_join_filter() {
	let mut env = Env::new();
	env.write_csv("l.csv", "1\n2\n2\n3\n");
	env.write_csv("r.csv", "2,x\n2,y\n3,z\n");
	env.execute("CREATE TABLE l (k INTEGER)").unwrap();
	env.execute("CREATE TABLE r (k INTEGER, v VARCHAR(4))").unwrap();
	env.execute("CREATE MAPPING l ('l.csv')").unwrap();
	env.execute("CREATE MAPPING r ('r.csv')").unwrap();
	// the equality predicate takes the hash path
	let mut joined =
		env.query("SELECT l.k, r.v FROM l JOIN r ON l.k = r.k")[1..].to_vec();
	// the cross join plus filter takes the nested loop path
	let mut crossed = env
		.query("SELECT l.k, r.v FROM l CROSS JOIN r WHERE l.k = r.k")[1..]
		.to_vec();
	joined.sort();
	crossed.sort();
	assert_eq!(joined, crossed);
	assert_eq!(joined.len(), 5);
}

#[test]
fn null_predicates() {
	let mut env = Env::new();
	env.write_csv("t.csv", ",1\n");
	env.execute("CREATE TABLE t (a INTEGER, b INTEGER)").unwrap();
	env.execute("CREATE MAPPING t ('t.csv')").unwrap();
	let lines = env.query("SELECT a IS NULL, a IS NOT NULL FROM t");
	assert_eq!(lines[1], "true,false");
	// a null comparison result filters the row out
	let lines = env.query("SELECT b FROM t WHERE a > 0");
	assert_eq!(lines.len(), 1);
}

#[test]
fn expressions_in_the_select_list() {
	let mut env = Env::with_employees();
	let lines = env.query(
		"SELECT first || ' ' || last AS name, hired - birth FROM employees WHERE id = 815",
	);
	assert_eq!(lines[0], "name,(hired - birth)");
	assert_eq!(lines[1], "Mark Fürstenberg,12386");
}

#[test]
fn aggregates_without_grouping() {
	let mut env = Env::with_employees();
	let lines = env.query(
		"SELECT COUNT(*), SUM(id), MIN(id), MAX(id), AVG(id), ARBITRARY(sex) FROM employees",
	);
	assert_eq!(lines.len(), 2);
	assert_eq!(lines[1], "2,5526,815,4711,2763,M");
}

#[test]
fn count_of_all_null_column_is_null() {
	let mut env = Env::new();
	env.write_csv("n.csv", ",x\n,y\n");
	env.execute("CREATE TABLE n (a INTEGER, b VARCHAR(4))").unwrap();
	env.execute("CREATE MAPPING n ('n.csv')").unwrap();
	let lines = env.query("SELECT COUNT(a), COUNT(*) FROM n");
	assert_eq!(lines[1], "NULL,2");
}

#[test]
fn having_filters_groups() {
	let mut env = Env::new();
	env.write_csv("s.csv", "a,1\na,2\nb,5\n");
	env.execute("CREATE TABLE s (k VARCHAR(4), v INTEGER)").unwrap();
	env.execute("CREATE MAPPING s ('s.csv')").unwrap();
	let lines =
		env.query("SELECT k, SUM(v) FROM s GROUP BY k HAVING SUM(v) > 4 ORDER BY k");
	assert_eq!(lines.len(), 2);
	assert_eq!(lines[1], "b,5");
}

#[test]
fn distinct_and_union() {
	let mut env = Env::new();
	env.write_csv("u.csv", "1\n1\n2\n");
	env.execute("CREATE TABLE u (a INTEGER)").unwrap();
	env.execute("CREATE MAPPING u ('u.csv')").unwrap();
	let mut lines = env.query("SELECT DISTINCT a FROM u")[1..].to_vec();
	lines.sort();
	assert_eq!(lines, ["1", "2"]);
	let lines = env.query("SELECT a FROM u UNION ALL SELECT a FROM u");
	assert_eq!(lines.len(), 7);
	let mut lines = env.query("SELECT a FROM u UNION SELECT a FROM u")[1..].to_vec();
	lines.sort();
	assert_eq!(lines, ["1", "2"]);
}

#[test]
fn limit_offset_pagination() {
	let mut env = Env::new();
	env.write_csv("p.csv", "1\n2\n3\n4\n5\n");
	env.execute("CREATE TABLE p (a INTEGER)").unwrap();
	env.execute("CREATE MAPPING p ('p.csv')").unwrap();
	let lines = env.query("SELECT a FROM p ORDER BY a LIMIT 2 OFFSET 1");
	assert_eq!(&lines[1..], ["2", "3"]);
}

#[test]
fn like_and_between_and_in() {
	let mut env = Env::with_employees();
	let lines = env.query("SELECT id FROM employees WHERE last LIKE '%berg'");
	assert_eq!(lines.len(), 3);
	// the bounds are accepted in either order
	let lines = env.query("SELECT id FROM employees WHERE id BETWEEN 5000 AND 1000");
	assert_eq!(&lines[1..], ["4711"]);
	let lines = env.query("SELECT id FROM employees WHERE id IN (815, 99)");
	assert_eq!(&lines[1..], ["815"]);
}

#[test]
fn malformed_rows_are_skipped_not_fatal() {
	let mut env = Env::new();
	env.write_csv("broken.csv", "1,a\nbad,b\n3,c\n");
	env.execute("CREATE TABLE broken (id INTEGER, v VARCHAR(4))").unwrap();
	env.execute("CREATE MAPPING broken ('broken.csv')").unwrap();
	let lines = env.query("SELECT id FROM broken");
	assert_eq!(&lines[1..], ["1", "3"]);
}

#[test]
fn multi_file_mapping_in_filename_order() {
	let mut env = Env::new();
	env.write_csv("part-2.csv", "3\n4\n");
	env.write_csv("part-1.csv", "1\n2\n");
	env.execute("CREATE TABLE parts (a INTEGER)").unwrap();
	env.execute("CREATE MAPPING parts ('part-*.csv')").unwrap();
	let lines = env.query("SELECT a FROM parts");
	assert_eq!(&lines[1..], ["1", "2", "3", "4"]);
}

#[test]
fn scan_with_header_and_delimiter_options() {
	let mut env = Env::new();
	env.write_csv("opt.csv", "id;name\n1;alpha\n2;beta\n");
	env.execute("CREATE TABLE opt (id INTEGER, name VARCHAR(8))").unwrap();
	env.execute("CREATE MAPPING opt ('opt.csv', ';', TRUE)").unwrap();
	let lines = env.query("SELECT name FROM opt WHERE id = 2");
	assert_eq!(&lines[1..], ["beta"]);
}

#[test]
fn unsupported_join_types_are_validation_errors() {
	let mut env = Env::with_employees();
	let err = env
		.expect_error("SELECT * FROM employees e LEFT JOIN employees f ON e.id = f.id");
	assert!(matches!(err, csvdb_core::Error::SqlValidation(_)), "got {err}");
}

#[test]
fn unknown_column_is_a_validation_error() {
	let mut env = Env::with_employees();
	let err = env.expect_error("SELECT nope FROM employees");
	assert!(matches!(err, csvdb_core::Error::SqlValidation(_)), "got {err}");
}

#[test]
fn division_by_zero_is_fatal() {
	let mut env = Env::new();
	let err = env.expect_error("SELECT 1 / 0 FROM system_dual");
	assert!(matches!(err, csvdb_core::Error::DivisionByZero), "got {err}");
}

#[test]
fn scalar_functions() {
	let mut env = Env::with_employees();
	let lines = env.query("SELECT UPPER(first), CHAR_LENGTH(first) FROM employees WHERE id = 4711");
	assert_eq!(lines[1], "LARS,4");
	let lines = env.query("SELECT YEAR(birth) FROM employees WHERE id = 815");
	assert_eq!(lines[1], "1969");
}

#[test]
fn explain_ast_renders_the_tree() {
	let mut env = Env::with_employees();
	let lines = env.query("EXPLAIN AST SELECT id FROM employees WHERE id = 1");
	assert!(lines[0].starts_with("Select"));
	assert!(lines.iter().any(|line| line.contains("Where")));
}
