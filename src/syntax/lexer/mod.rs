mod automata;
mod cursor;
mod error;
#[cfg(test)]
mod tests;
mod token;

use crate::symbol;
use automata::Automata;
use super::SourcePos;
pub use cursor::Cursor;
pub use error::{Error, ErrorKind};
pub use token::{ArithOp, Keyword, Literal, Operator, Token, TokenKind};


/// The lexer for Corolla source code.
/// Line breaks terminate statements after certain tokens, in which case the lexer inserts
/// a semicolon token.
#[derive(Debug)]
pub struct Lexer<'a, 'b> {
	automata: Automata<'a, 'b>,
	/// The last produced token, used to decide whether to insert a semicolon.
	last: Option<(SourcePos, bool)>,
	/// A token read ahead while inserting a semicolon.
	pending: Option<Token>,
}


impl<'a, 'b> Lexer<'a, 'b> {
	pub fn new(cursor: Cursor<'a>, interner: &'b mut symbol::Interner) -> Self {
		Self {
			automata: Automata::new(cursor, interner),
			last: None,
			pending: None,
		}
	}


	fn produce(&mut self, token: Token) -> Token {
		self.last = Some((token.pos, token.kind.ends_line()));
		token
	}


	fn semicolon(&mut self, pos: SourcePos) -> Token {
		self.last = None;
		Token { kind: TokenKind::Semicolon, pos }
	}
}


impl<'a, 'b> Iterator for Lexer<'a, 'b> {
	type Item = Result<Token, Error>;

	fn next(&mut self) -> Option<Self::Item> {
		if let Some(token) = self.pending.take() {
			return Some(Ok(self.produce(token)));
		}

		match (self.automata.next(), self.last) {
			(Some(Ok(token)), Some((pos, true))) if token.pos.line > pos.line => {
				self.pending = Some(token);
				Some(Ok(self.semicolon(pos)))
			}

			(Some(Ok(token)), _) => Some(Ok(self.produce(token))),

			(Some(Err(error)), _) => Some(Err(error)),

			(None, Some((_, true))) => {
				let pos = self.automata.pos();
				Some(Ok(self.semicolon(pos)))
			}

			(None, _) => None,
		}
	}
}
