//! The statement tokenizer.

use crate::err::{Error, Result};
use crate::syn::token::{Token, TokenKind};

pub struct Lexer<'a> {
	source: &'a str,
	bytes: &'a [u8],
	position: usize,
	line: usize,
	column: usize,
}

impl<'a> Lexer<'a> {
	pub fn new(source: &'a str) -> Lexer<'a> {
		Lexer {
			source,
			bytes: source.as_bytes(),
			position: 0,
			line: 1,
			column: 1,
		}
	}

	/// Tokenize the whole source, ending with an EOF token
	pub fn tokenize(mut self) -> Result<Vec<Token>> {
		let mut tokens = Vec::new();
		loop {
			let token = self.next_token()?;
			let done = token.kind == TokenKind::Eof;
			tokens.push(token);
			if done {
				return Ok(tokens);
			}
		}
	}

	fn error(&self, message: impl Into<String>) -> Error {
		Error::SqlParse {
			line: self.line,
			column: self.column,
			message: message.into(),
		}
	}

	fn peek(&self) -> Option<u8> {
		self.bytes.get(self.position).copied()
	}

	fn peek_at(&self, ahead: usize) -> Option<u8> {
		self.bytes.get(self.position + ahead).copied()
	}

	fn bump(&mut self) -> Option<u8> {
		let byte = self.peek()?;
		self.position += 1;
		if byte == b'\n' {
			self.line += 1;
			self.column = 1;
		} else {
			self.column += 1;
		}
		Some(byte)
	}

	fn skip_trivia(&mut self) -> Result<()> {
		loop {
			match self.peek() {
				Some(b' ' | b'\t' | b'\r' | b'\n') => {
					self.bump();
				}
				// a line comment
				Some(b'-') if self.peek_at(1) == Some(b'-') => {
					while let Some(byte) = self.peek() {
						if byte == b'\n' {
							break;
						}
						self.bump();
					}
				}
				// a block comment
				Some(b'/') if self.peek_at(1) == Some(b'*') => {
					self.bump();
					self.bump();
					loop {
						match self.peek() {
							Some(b'*') if self.peek_at(1) == Some(b'/') => {
								self.bump();
								self.bump();
								break;
							}
							Some(_) => {
								self.bump();
							}
							None => return Err(self.error("unterminated block comment")),
						}
					}
				}
				_ => return Ok(()),
			}
		}
	}

	fn token(&self, kind: TokenKind, line: usize, column: usize) -> Token {
		Token {
			kind,
			line,
			column,
		}
	}

	fn next_token(&mut self) -> Result<Token> {
		self.skip_trivia()?;
		let line = self.line;
		let column = self.column;
		let byte = match self.peek() {
			Some(byte) => byte,
			None => return Ok(self.token(TokenKind::Eof, line, column)),
		};
		let kind = match byte {
			b',' => {
				self.bump();
				TokenKind::Comma
			}
			b'.' => {
				self.bump();
				TokenKind::Dot
			}
			b'(' => {
				self.bump();
				TokenKind::LParen
			}
			b')' => {
				self.bump();
				TokenKind::RParen
			}
			b'*' => {
				self.bump();
				TokenKind::Star
			}
			b'+' => {
				self.bump();
				TokenKind::Plus
			}
			b'-' => {
				self.bump();
				TokenKind::Minus
			}
			b'/' => {
				self.bump();
				TokenKind::Slash
			}
			b'%' => {
				self.bump();
				TokenKind::Percent
			}
			b';' => {
				self.bump();
				TokenKind::Semicolon
			}
			b'|' => {
				self.bump();
				if self.peek() == Some(b'|') {
					self.bump();
					TokenKind::Concat
				} else {
					return Err(self.error("expected '||'"));
				}
			}
			b'=' => {
				self.bump();
				TokenKind::Eq
			}
			b'<' => {
				self.bump();
				match self.peek() {
					Some(b'>') => {
						self.bump();
						TokenKind::Neq
					}
					Some(b'=') => {
						self.bump();
						TokenKind::Le
					}
					_ => TokenKind::Lt,
				}
			}
			b'>' => {
				self.bump();
				if self.peek() == Some(b'=') {
					self.bump();
					TokenKind::Ge
				} else {
					TokenKind::Gt
				}
			}
			b'!' => {
				self.bump();
				if self.peek() == Some(b'=') {
					self.bump();
					TokenKind::Neq
				} else {
					return Err(self.error("expected '!='"));
				}
			}
			b'\'' => self.string()?,
			b'"' => self.quoted_ident()?,
			b'0'..=b'9' => self.number()?,
			byte if byte.is_ascii_alphabetic() || byte == b'_' => self.ident(),
			byte => {
				return Err(self.error(format!("unexpected character '{}'", byte as char)))
			}
		};
		Ok(self.token(kind, line, column))
	}

	fn string(&mut self) -> Result<TokenKind> {
		self.bump();
		let mut text = String::new();
		loop {
			match self.bump() {
				Some(b'\'') => {
					// a doubled quote is one literal quote
					if self.peek() == Some(b'\'') {
						self.bump();
						text.push('\'');
						continue;
					}
					return Ok(TokenKind::String(text));
				}
				Some(byte) => {
					// recover any multi-byte character we started
					if byte.is_ascii() {
						text.push(byte as char);
					} else {
						let start = self.position - 1;
						let ch = self.source[start..]
							.chars()
							.next()
							.ok_or_else(|| self.error("invalid character"))?;
						for _ in 1..ch.len_utf8() {
							self.bump();
						}
						text.push(ch);
					}
				}
				None => return Err(self.error("unterminated string literal")),
			}
		}
	}

	fn quoted_ident(&mut self) -> Result<TokenKind> {
		self.bump();
		let start = self.position;
		while let Some(byte) = self.peek() {
			if byte == b'"' {
				let name = self.source[start..self.position].to_string();
				self.bump();
				return Ok(TokenKind::QuotedIdent(name));
			}
			self.bump();
		}
		Err(self.error("unterminated quoted identifier"))
	}

	fn number(&mut self) -> Result<TokenKind> {
		let start = self.position;
		while matches!(self.peek(), Some(b'0'..=b'9')) {
			self.bump();
		}
		let mut real = false;
		if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
			real = true;
			self.bump();
			while matches!(self.peek(), Some(b'0'..=b'9')) {
				self.bump();
			}
		}
		if matches!(self.peek(), Some(b'e' | b'E')) {
			let mut ahead = 1;
			if matches!(self.peek_at(1), Some(b'+' | b'-')) {
				ahead = 2;
			}
			if matches!(self.peek_at(ahead), Some(b'0'..=b'9')) {
				real = true;
				for _ in 0..=ahead {
					self.bump();
				}
				while matches!(self.peek(), Some(b'0'..=b'9')) {
					self.bump();
				}
			}
		}
		let text = &self.source[start..self.position];
		if real {
			text.parse::<f64>()
				.map(TokenKind::Real)
				.map_err(|_| self.error(format!("invalid number '{text}'")))
		} else {
			text.parse::<i64>()
				.map(TokenKind::Int)
				.map_err(|_| self.error(format!("integer '{text}' out of range")))
		}
	}

	fn ident(&mut self) -> TokenKind {
		let start = self.position;
		while matches!(self.peek(), Some(byte) if byte.is_ascii_alphanumeric() || byte == b'_') {
			self.bump();
		}
		TokenKind::Ident(self.source[start..self.position].to_string())
	}
}
