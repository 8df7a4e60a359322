//! The recursive descent statement parser.
//!
//! Most functions peek one token and pick a production; expression
//! parsing is classic precedence climbing from `OR` down to the
//! primaries.

use crate::err::{Error, Result};
use crate::sql::{
	AggregateOp, BinaryOperator, ColumnDef, ColumnRef, CreateTable, Expr, FromItem, Join,
	JoinKind, Literal, MappingDef, OrderBy, Query, Select, SelectItem, Statement,
	TableConstraint, TableRef, UnaryOperator,
};
use crate::syn::token::{Token, TokenKind};
use crate::val::{Date, Kind, Time, Timestamp};

/// Keywords which may not double as a bare alias
const RESERVED: &[&str] = &[
	"FROM", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "UNION", "AS", "ON", "JOIN",
	"INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL", "AND", "OR", "NOT", "ASC",
	"DESC", "ALL", "DISTINCT", "BETWEEN", "IN", "LIKE", "IS", "SELECT",
];

pub struct Parser {
	tokens: Vec<Token>,
	position: usize,
}

impl Parser {
	pub fn new(tokens: Vec<Token>) -> Parser {
		Parser {
			tokens,
			position: 0,
		}
	}

	fn peek(&self) -> &Token {
		&self.tokens[self.position.min(self.tokens.len() - 1)]
	}

	fn peek_at(&self, ahead: usize) -> &Token {
		&self.tokens[(self.position + ahead).min(self.tokens.len() - 1)]
	}

	fn advance(&mut self) -> Token {
		let token = self.peek().clone();
		if self.position < self.tokens.len() - 1 {
			self.position += 1;
		}
		token
	}

	fn error_at(&self, token: &Token, message: impl Into<String>) -> Error {
		Error::SqlParse {
			line: token.line,
			column: token.column,
			message: message.into(),
		}
	}

	fn error_here(&self, message: impl Into<String>) -> Error {
		self.error_at(self.peek(), message.into())
	}

	fn eat(&mut self, kind: &TokenKind) -> bool {
		if &self.peek().kind == kind {
			self.advance();
			true
		} else {
			false
		}
	}

	fn expect(&mut self, kind: &TokenKind) -> Result<()> {
		if self.eat(kind) {
			Ok(())
		} else {
			Err(self.error_here(format!("expected '{kind}', found '{}'", self.peek().kind)))
		}
	}

	fn eat_keyword(&mut self, keyword: &str) -> bool {
		if self.peek().is_keyword(keyword) {
			self.advance();
			true
		} else {
			false
		}
	}

	fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
		if self.eat_keyword(keyword) {
			Ok(())
		} else {
			Err(self.error_here(format!("expected {keyword}, found '{}'", self.peek().kind)))
		}
	}

	fn ident(&mut self) -> Result<String> {
		match &self.peek().kind {
			TokenKind::Ident(name) => {
				let name = name.clone();
				self.advance();
				Ok(name)
			}
			TokenKind::QuotedIdent(name) => {
				let name = name.clone();
				self.advance();
				Ok(name)
			}
			kind => Err(self.error_here(format!("expected an identifier, found '{kind}'"))),
		}
	}

	// ------------------------------------------------------------------
	// Statements

	pub fn parse_statement(&mut self) -> Result<Statement> {
		let statement = match &self.peek().kind {
			TokenKind::Ident(word) if word.eq_ignore_ascii_case("SELECT") => {
				Statement::Query(self.parse_query()?)
			}
			TokenKind::LParen => Statement::Query(self.parse_query()?),
			TokenKind::Ident(word) if word.eq_ignore_ascii_case("CREATE") => {
				self.advance();
				if self.eat_keyword("TABLE") {
					self.parse_create_table()?
				} else if self.eat_keyword("MAPPING") {
					self.parse_create_mapping()?
				} else {
					return Err(self.error_here("expected TABLE or MAPPING after CREATE"));
				}
			}
			TokenKind::Ident(word) if word.eq_ignore_ascii_case("ALTER") => {
				self.advance();
				self.expect_keyword("TABLE")?;
				self.parse_alter_table()?
			}
			TokenKind::Ident(word) if word.eq_ignore_ascii_case("DROP") => {
				self.advance();
				if self.eat_keyword("TABLE") {
					Statement::DropTable(self.ident()?)
				} else if self.eat_keyword("MAPPING") {
					Statement::DropMapping(self.ident()?)
				} else {
					return Err(self.error_here("expected TABLE or MAPPING after DROP"));
				}
			}
			TokenKind::Ident(word) if word.eq_ignore_ascii_case("EXPLAIN") => {
				self.advance();
				self.expect_keyword("AST")?;
				Statement::ExplainAst(Box::new(self.parse_statement()?))
			}
			kind => return Err(self.error_here(format!("unexpected '{kind}'"))),
		};
		self.eat(&TokenKind::Semicolon);
		if self.peek().kind != TokenKind::Eof {
			return Err(self.error_here(format!(
				"unexpected '{}' after the statement",
				self.peek().kind
			)));
		}
		Ok(statement)
	}

	// ------------------------------------------------------------------
	// Queries

	fn parse_query(&mut self) -> Result<Query> {
		let mut query = self.parse_query_primary()?;
		while self.eat_keyword("UNION") {
			let all = self.eat_keyword("ALL");
			let right = self.parse_query_primary()?;
			query = Query::Union {
				left: Box::new(query),
				right: Box::new(right),
				all,
			};
		}
		Ok(query)
	}

	fn parse_query_primary(&mut self) -> Result<Query> {
		if self.eat(&TokenKind::LParen) {
			let query = self.parse_query()?;
			self.expect(&TokenKind::RParen)?;
			return Ok(query);
		}
		Ok(Query::Select(Box::new(self.parse_select()?)))
	}

	fn parse_select(&mut self) -> Result<Select> {
		self.expect_keyword("SELECT")?;
		let mut select = Select::default();
		if self.eat_keyword("DISTINCT") {
			select.distinct = true;
		} else {
			self.eat_keyword("ALL");
		}
		loop {
			select.items.push(self.parse_select_item()?);
			if !self.eat(&TokenKind::Comma) {
				break;
			}
		}
		self.expect_keyword("FROM")?;
		loop {
			select.from.push(self.parse_from_item()?);
			if !self.eat(&TokenKind::Comma) {
				break;
			}
		}
		if self.eat_keyword("WHERE") {
			select.selection = Some(self.parse_expr()?);
		}
		if self.eat_keyword("GROUP") {
			self.expect_keyword("BY")?;
			loop {
				select.group_by.push(self.parse_column_ref()?);
				if !self.eat(&TokenKind::Comma) {
					break;
				}
			}
		}
		if self.eat_keyword("HAVING") {
			select.having = Some(self.parse_expr()?);
		}
		if self.eat_keyword("ORDER") {
			self.expect_keyword("BY")?;
			loop {
				let expr = self.parse_expr()?;
				let descending = if self.eat_keyword("DESC") {
					true
				} else {
					self.eat_keyword("ASC");
					false
				};
				select.order_by.push(OrderBy {
					expr,
					descending,
				});
				if !self.eat(&TokenKind::Comma) {
					break;
				}
			}
		}
		if self.eat_keyword("LIMIT") {
			select.limit = Some(self.parse_expr()?);
			if self.eat_keyword("OFFSET") {
				select.offset = Some(self.parse_expr()?);
			}
		}
		Ok(select)
	}

	fn parse_select_item(&mut self) -> Result<SelectItem> {
		if self.eat(&TokenKind::Star) {
			return Ok(SelectItem::Wildcard);
		}
		if matches!(self.peek().kind, TokenKind::Ident(_) | TokenKind::QuotedIdent(_))
			&& self.peek_at(1).kind == TokenKind::Dot
			&& self.peek_at(2).kind == TokenKind::Star
		{
			let qualifier = self.ident()?;
			self.advance();
			self.advance();
			return Ok(SelectItem::QualifiedWildcard(qualifier));
		}
		let expr = self.parse_expr()?;
		let alias = self.parse_alias()?;
		Ok(SelectItem::Expr {
			expr,
			alias,
		})
	}

	fn parse_alias(&mut self) -> Result<Option<String>> {
		if self.eat_keyword("AS") {
			return Ok(Some(self.ident()?));
		}
		match &self.peek().kind {
			TokenKind::Ident(name)
				if !RESERVED.iter().any(|kw| name.eq_ignore_ascii_case(kw)) =>
			{
				Ok(Some(self.ident()?))
			}
			TokenKind::QuotedIdent(_) => Ok(Some(self.ident()?)),
			_ => Ok(None),
		}
	}

	fn parse_table_ref(&mut self) -> Result<TableRef> {
		let name = self.ident()?;
		let alias = self.parse_alias()?;
		Ok(TableRef {
			name,
			alias,
		})
	}

	fn parse_from_item(&mut self) -> Result<FromItem> {
		let table = self.parse_table_ref()?;
		let mut joins = Vec::new();
		loop {
			let kind = if self.eat_keyword("CROSS") {
				self.expect_keyword("JOIN")?;
				JoinKind::Cross
			} else if self.eat_keyword("NATURAL") {
				let kind = if self.eat_keyword("LEFT") {
					JoinKind::NaturalLeft
				} else if self.eat_keyword("RIGHT") {
					JoinKind::NaturalRight
				} else if self.eat_keyword("FULL") {
					JoinKind::NaturalFull
				} else {
					self.eat_keyword("INNER");
					JoinKind::NaturalInner
				};
				self.eat_keyword("OUTER");
				self.expect_keyword("JOIN")?;
				kind
			} else if self.eat_keyword("INNER") {
				self.expect_keyword("JOIN")?;
				JoinKind::Inner
			} else if self.eat_keyword("LEFT") {
				self.eat_keyword("OUTER");
				self.expect_keyword("JOIN")?;
				JoinKind::Left
			} else if self.eat_keyword("RIGHT") {
				self.eat_keyword("OUTER");
				self.expect_keyword("JOIN")?;
				JoinKind::Right
			} else if self.eat_keyword("FULL") {
				self.eat_keyword("OUTER");
				self.expect_keyword("JOIN")?;
				JoinKind::Full
			} else if self.eat_keyword("JOIN") {
				JoinKind::Inner
			} else {
				break;
			};
			let table = self.parse_table_ref()?;
			let on = match kind {
				JoinKind::Cross
				| JoinKind::NaturalInner
				| JoinKind::NaturalLeft
				| JoinKind::NaturalRight
				| JoinKind::NaturalFull => None,
				_ => {
					self.expect_keyword("ON")?;
					Some(self.parse_expr()?)
				}
			};
			joins.push(Join {
				kind,
				table,
				on,
			});
		}
		Ok(FromItem {
			table,
			joins,
		})
	}

	fn parse_column_ref(&mut self) -> Result<ColumnRef> {
		let first = self.ident()?;
		if self.eat(&TokenKind::Dot) {
			let name = self.ident()?;
			Ok(ColumnRef::new(Some(first), name))
		} else {
			Ok(ColumnRef::new(None, first))
		}
	}

	// ------------------------------------------------------------------
	// Expressions

	pub fn parse_expr(&mut self) -> Result<Expr> {
		self.parse_or()
	}

	fn parse_or(&mut self) -> Result<Expr> {
		let mut expr = self.parse_and()?;
		while self.eat_keyword("OR") {
			let right = self.parse_and()?;
			expr = Expr::binary(BinaryOperator::Or, expr, right);
		}
		Ok(expr)
	}

	fn parse_and(&mut self) -> Result<Expr> {
		let mut expr = self.parse_not()?;
		while self.eat_keyword("AND") {
			let right = self.parse_not()?;
			expr = Expr::binary(BinaryOperator::And, expr, right);
		}
		Ok(expr)
	}

	fn parse_not(&mut self) -> Result<Expr> {
		if self.eat_keyword("NOT") {
			let expr = self.parse_not()?;
			return Ok(Expr::unary(UnaryOperator::Not, expr));
		}
		self.parse_predicate()
	}

	fn parse_predicate(&mut self) -> Result<Expr> {
		let expr = self.parse_additive()?;
		let negated = self.eat_keyword("NOT");
		if self.eat_keyword("BETWEEN") {
			let low = self.parse_additive()?;
			self.expect_keyword("AND")?;
			let high = self.parse_additive()?;
			return Ok(Expr::Between {
				expr: Box::new(expr),
				negated,
				low: Box::new(low),
				high: Box::new(high),
			});
		}
		if self.eat_keyword("IN") {
			self.expect(&TokenKind::LParen)?;
			let mut list = Vec::new();
			loop {
				list.push(self.parse_expr()?);
				if !self.eat(&TokenKind::Comma) {
					break;
				}
			}
			self.expect(&TokenKind::RParen)?;
			return Ok(Expr::InList {
				expr: Box::new(expr),
				negated,
				list,
			});
		}
		if self.eat_keyword("LIKE") {
			let pattern = match &self.peek().kind {
				TokenKind::String(pattern) => pattern.clone(),
				_ => return Err(self.error_here("the LIKE pattern must be a string literal")),
			};
			self.advance();
			return Ok(Expr::Like {
				expr: Box::new(expr),
				negated,
				pattern,
			});
		}
		if negated {
			return Err(self.error_here("expected BETWEEN, IN or LIKE after NOT"));
		}
		if self.eat_keyword("IS") {
			let negated = self.eat_keyword("NOT");
			let literal = if self.eat_keyword("NULL") || self.eat_keyword("UNKNOWN") {
				Literal::Null
			} else if self.eat_keyword("TRUE") {
				Literal::Bool(true)
			} else if self.eat_keyword("FALSE") {
				Literal::Bool(false)
			} else {
				return Err(self.error_here("expected TRUE, FALSE, NULL or UNKNOWN after IS"));
			};
			let op = if negated {
				BinaryOperator::IsNot
			} else {
				BinaryOperator::Is
			};
			return Ok(Expr::binary(op, expr, Expr::Literal(literal)));
		}
		let op = match self.peek().kind {
			TokenKind::Eq => BinaryOperator::Eq,
			TokenKind::Neq => BinaryOperator::Neq,
			TokenKind::Lt => BinaryOperator::Lt,
			TokenKind::Le => BinaryOperator::Le,
			TokenKind::Gt => BinaryOperator::Gt,
			TokenKind::Ge => BinaryOperator::Ge,
			_ => return Ok(expr),
		};
		self.advance();
		let right = self.parse_additive()?;
		Ok(Expr::binary(op, expr, right))
	}

	fn parse_additive(&mut self) -> Result<Expr> {
		let mut expr = self.parse_multiplicative()?;
		loop {
			let op = match self.peek().kind {
				TokenKind::Plus => BinaryOperator::Add,
				TokenKind::Minus => BinaryOperator::Sub,
				TokenKind::Concat => BinaryOperator::Concat,
				_ => return Ok(expr),
			};
			self.advance();
			let right = self.parse_multiplicative()?;
			expr = Expr::binary(op, expr, right);
		}
	}

	fn parse_multiplicative(&mut self) -> Result<Expr> {
		let mut expr = self.parse_unary()?;
		loop {
			let op = match self.peek().kind {
				TokenKind::Star => BinaryOperator::Mul,
				TokenKind::Slash => BinaryOperator::Div,
				TokenKind::Percent => BinaryOperator::Mod,
				_ => return Ok(expr),
			};
			self.advance();
			let right = self.parse_unary()?;
			expr = Expr::binary(op, expr, right);
		}
	}

	fn parse_unary(&mut self) -> Result<Expr> {
		if self.eat(&TokenKind::Minus) {
			let expr = self.parse_unary()?;
			return Ok(Expr::unary(UnaryOperator::Minus, expr));
		}
		if self.eat(&TokenKind::Plus) {
			let expr = self.parse_unary()?;
			return Ok(Expr::unary(UnaryOperator::Plus, expr));
		}
		self.parse_primary()
	}

	fn parse_primary(&mut self) -> Result<Expr> {
		match self.peek().kind.clone() {
			TokenKind::Int(value) => {
				self.advance();
				Ok(Expr::Literal(Literal::Int(value)))
			}
			TokenKind::Real(value) => {
				self.advance();
				Ok(Expr::Literal(Literal::Real(value)))
			}
			TokenKind::String(value) => {
				self.advance();
				Ok(Expr::Literal(Literal::String(value)))
			}
			TokenKind::LParen => {
				self.advance();
				let expr = self.parse_expr()?;
				self.expect(&TokenKind::RParen)?;
				Ok(expr)
			}
			TokenKind::Ident(word) => self.parse_word(word),
			TokenKind::QuotedIdent(_) => {
				let column = self.parse_column_ref()?;
				Ok(Expr::Column(column))
			}
			kind => Err(self.error_here(format!("unexpected '{kind}' in an expression"))),
		}
	}

	/// An identifier in expression position: a keyword literal, a
	/// typed literal, CAST, a function or aggregate call, or a column
	/// reference.
	fn parse_word(&mut self, word: String) -> Result<Expr> {
		if word.eq_ignore_ascii_case("NULL") || word.eq_ignore_ascii_case("UNKNOWN") {
			self.advance();
			return Ok(Expr::Literal(Literal::Null));
		}
		if word.eq_ignore_ascii_case("TRUE") {
			self.advance();
			return Ok(Expr::Literal(Literal::Bool(true)));
		}
		if word.eq_ignore_ascii_case("FALSE") {
			self.advance();
			return Ok(Expr::Literal(Literal::Bool(false)));
		}
		// DATE'2012-02-01' and friends
		if let TokenKind::String(text) = &self.peek_at(1).kind {
			let text = text.clone();
			let literal = if word.eq_ignore_ascii_case("DATE") {
				Some(Literal::Date(Date::parse(&text).map_err(|err| {
					self.error_here(err.to_string())
				})?))
			} else if word.eq_ignore_ascii_case("TIME") {
				Some(Literal::Time(Time::parse(&text).map_err(|err| {
					self.error_here(err.to_string())
				})?))
			} else if word.eq_ignore_ascii_case("TIMESTAMP") {
				Some(Literal::Timestamp(Timestamp::parse(&text).map_err(|err| {
					self.error_here(err.to_string())
				})?))
			} else {
				None
			};
			if let Some(literal) = literal {
				self.advance();
				self.advance();
				return Ok(Expr::Literal(literal));
			}
		}
		if word.eq_ignore_ascii_case("CAST") {
			self.advance();
			self.expect(&TokenKind::LParen)?;
			let expr = self.parse_expr()?;
			self.expect_keyword("AS")?;
			let (into, _) = self.parse_type()?;
			self.expect(&TokenKind::RParen)?;
			return Ok(Expr::Cast {
				expr: Box::new(expr),
				into,
			});
		}
		// a call
		if self.peek_at(1).kind == TokenKind::LParen {
			self.advance();
			self.advance();
			if let Some(op) = AggregateOp::from_name(&word) {
				return self.parse_aggregate_call(op);
			}
			let mut args = Vec::new();
			if !self.eat(&TokenKind::RParen) {
				loop {
					args.push(self.parse_expr()?);
					if !self.eat(&TokenKind::Comma) {
						break;
					}
				}
				self.expect(&TokenKind::RParen)?;
			}
			return Ok(Expr::Function {
				name: word.to_uppercase(),
				args,
			});
		}
		let column = self.parse_column_ref()?;
		Ok(Expr::Column(column))
	}

	fn parse_aggregate_call(&mut self, op: AggregateOp) -> Result<Expr> {
		if op == AggregateOp::Count && self.eat(&TokenKind::Star) {
			self.expect(&TokenKind::RParen)?;
			return Ok(Expr::Aggregate {
				op: AggregateOp::CountStar,
				distinct: false,
				arg: None,
			});
		}
		let distinct = if self.eat_keyword("DISTINCT") {
			true
		} else {
			self.eat_keyword("ALL");
			false
		};
		let arg = self.parse_expr()?;
		self.expect(&TokenKind::RParen)?;
		Ok(Expr::Aggregate {
			op,
			distinct,
			arg: Some(Box::new(arg)),
		})
	}

	// ------------------------------------------------------------------
	// Types

	/// Parse a type name, returning the kind and a declared length
	fn parse_type(&mut self) -> Result<(Kind, Option<u32>)> {
		let name = self.ident()?;
		if name.eq_ignore_ascii_case("CHAR") && self.eat_keyword("VARYING") {
			let size = self.parse_type_size()?;
			return Ok((Kind::String, size));
		}
		let kind = Kind::from_sql_name(&name)
			.ok_or_else(|| self.error_here(format!("unknown type '{name}'")))?;
		let size = if kind == Kind::String {
			self.parse_type_size()?
		} else {
			None
		};
		Ok((kind, size))
	}

	fn parse_type_size(&mut self) -> Result<Option<u32>> {
		if !self.eat(&TokenKind::LParen) {
			return Ok(None);
		}
		let size = match self.peek().kind {
			TokenKind::Int(size) if size > 0 => size as u32,
			_ => return Err(self.error_here("expected a positive length")),
		};
		self.advance();
		self.expect(&TokenKind::RParen)?;
		Ok(Some(size))
	}

	// ------------------------------------------------------------------
	// DDL

	fn parse_create_table(&mut self) -> Result<Statement> {
		let name = self.ident()?;
		self.expect(&TokenKind::LParen)?;
		let mut columns = Vec::new();
		let mut constraints = Vec::new();
		loop {
			if self.peek().is_keyword("PRIMARY") {
				self.advance();
				self.expect_keyword("KEY")?;
				constraints.push(TableConstraint::PrimaryKey(self.parse_column_list()?));
			} else if self.peek().is_keyword("UNIQUE") {
				self.advance();
				constraints.push(TableConstraint::Unique(self.parse_column_list()?));
			} else if self.peek().is_keyword("CHECK") {
				self.advance();
				self.expect(&TokenKind::LParen)?;
				let expr = self.parse_expr()?;
				self.expect(&TokenKind::RParen)?;
				constraints.push(TableConstraint::Check(expr));
			} else {
				columns.push(self.parse_column_def()?);
			}
			if !self.eat(&TokenKind::Comma) {
				break;
			}
		}
		self.expect(&TokenKind::RParen)?;
		if columns.is_empty() {
			return Err(self.error_here("a table needs at least one column"));
		}
		Ok(Statement::CreateTable(CreateTable {
			name,
			columns,
			constraints,
		}))
	}

	fn parse_column_list(&mut self) -> Result<Vec<String>> {
		self.expect(&TokenKind::LParen)?;
		let mut columns = Vec::new();
		loop {
			columns.push(self.ident()?);
			if !self.eat(&TokenKind::Comma) {
				break;
			}
		}
		self.expect(&TokenKind::RParen)?;
		Ok(columns)
	}

	fn parse_column_def(&mut self) -> Result<ColumnDef> {
		let name = self.ident()?;
		let (kind, size) = self.parse_type()?;
		let mut column = ColumnDef {
			name,
			kind,
			size,
			primary: false,
			not_null: false,
			unique: false,
			default: None,
			check: None,
		};
		loop {
			if self.eat_keyword("PRIMARY") {
				self.expect_keyword("KEY")?;
				column.primary = true;
			} else if self.eat_keyword("NOT") {
				self.expect_keyword("NULL")?;
				column.not_null = true;
			} else if self.eat_keyword("UNIQUE") {
				column.unique = true;
			} else if self.eat_keyword("DEFAULT") {
				column.default = Some(self.parse_literal()?);
			} else if self.eat_keyword("CHECK") {
				self.expect(&TokenKind::LParen)?;
				column.check = Some(self.parse_expr()?);
				self.expect(&TokenKind::RParen)?;
			} else {
				return Ok(column);
			}
		}
	}

	fn parse_literal(&mut self) -> Result<Literal> {
		match self.parse_unary()? {
			Expr::Literal(literal) => Ok(literal),
			Expr::Unary {
				op: UnaryOperator::Minus,
				expr,
			} => match *expr {
				Expr::Literal(Literal::Int(value)) => Ok(Literal::Int(-value)),
				Expr::Literal(Literal::Real(value)) => Ok(Literal::Real(-value)),
				_ => Err(self.error_here("expected a literal")),
			},
			_ => Err(self.error_here("expected a literal")),
		}
	}

	fn parse_alter_table(&mut self) -> Result<Statement> {
		let table = self.ident()?;
		if self.eat_keyword("ADD") {
			self.eat_keyword("COLUMN");
			let column = self.parse_column_def()?;
			return Ok(Statement::AlterTableAdd {
				table,
				column,
			});
		}
		if self.eat_keyword("DROP") {
			self.eat_keyword("COLUMN");
			let column = self.ident()?;
			return Ok(Statement::AlterTableDrop {
				table,
				column,
			});
		}
		Err(self.error_here("expected ADD or DROP after ALTER TABLE"))
	}

	fn parse_create_mapping(&mut self) -> Result<Statement> {
		let name = self.ident()?;
		self.expect(&TokenKind::LParen)?;
		let pattern = match &self.peek().kind {
			TokenKind::String(pattern) => pattern.clone(),
			_ => return Err(self.error_here("expected a file pattern string")),
		};
		self.advance();
		let mut mapping = MappingDef {
			name,
			pattern,
			delimiter: b',',
			skip_first_line: false,
		};
		if self.eat(&TokenKind::Comma) {
			match &self.peek().kind {
				TokenKind::String(delimiter) if delimiter.len() == 1 => {
					mapping.delimiter = delimiter.as_bytes()[0];
					self.advance();
				}
				_ => {
					return Err(
						self.error_here("expected a single character delimiter string")
					)
				}
			}
			if self.eat(&TokenKind::Comma) {
				if self.eat_keyword("TRUE") {
					mapping.skip_first_line = true;
				} else if self.eat_keyword("FALSE") {
					mapping.skip_first_line = false;
				} else {
					return Err(self.error_here("expected TRUE or FALSE for skip-header"));
				}
			}
		}
		self.expect(&TokenKind::RParen)?;
		Ok(Statement::CreateMapping(mapping))
	}
}
