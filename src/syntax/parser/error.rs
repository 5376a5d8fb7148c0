use std::fmt::Display as _;

use super::{SourcePos, Token, TokenKind};
use crate::{fmt::Display, symbol};


/// The kind of token the parser was expecting.
#[derive(Debug)]
pub enum Expected {
	Token(TokenKind),
	Message(&'static str),
}


impl<'a> Display<'a> for Expected {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Token(token) => {
				"'".fmt(f)?;
				token.fmt(f, context)?;
				"'".fmt(f)
			}
			Self::Message(msg) => msg.fmt(f),
		}
	}
}


/// A parser error.
#[derive(Debug)]
pub enum Error {
	/// Premature EOF.
	UnexpectedEof,
	/// Unexpected token.
	Unexpected { token: Token, expected: Expected },
	/// A well formed construct in a place where it is not allowed.
	Invalid { what: &'static str, pos: SourcePos },
}


impl Error {
	pub fn unexpected_eof() -> Self {
		Self::UnexpectedEof
	}


	pub fn unexpected(token: Token, expected: TokenKind) -> Self {
		Self::Unexpected { token, expected: Expected::Token(expected) }
	}


	pub fn unexpected_msg(token: Token, message: &'static str) -> Self {
		Self::Unexpected { token, expected: Expected::Message(message) }
	}


	pub fn invalid(what: &'static str, pos: SourcePos) -> Self {
		Self::Invalid { what, pos }
	}
}


impl<'a> Display<'a> for Error {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::UnexpectedEof => "unexpected end of file".fmt(f),

			Self::Unexpected { token: Token { kind, pos }, expected } => {
				write!(f, "{}: unexpected '", pos)?;
				kind.fmt(f, context)?;
				"', expected ".fmt(f)?;
				expected.fmt(f, context)
			}

			Self::Invalid { what, pos } => write!(f, "{}: {}", pos, what),
		}
	}
}
