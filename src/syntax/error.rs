use std::fmt::Display as _;

use super::{lexer, parser};
use crate::{fmt::Display, symbol};


/// Syntax error.
#[derive(Debug)]
pub enum Error {
	Lexer(lexer::Error),
	Parser(parser::Error),
}


impl<'a> Display<'a> for Error {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Lexer(error) => error.fmt(f),
			Self::Parser(error) => error.fmt(f, context),
		}
	}
}
