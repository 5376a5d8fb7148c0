use std::fmt::Display as _;

use super::SourcePos;
use crate::{
	fmt::Display,
	symbol::{self, Symbol},
};


/// All keywords in the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
	Func,
	Type,
	Var,
	Const,
	If,
	Else,
	For,
	Range,
	Switch,
	Case,
	Default,
	Select,
	Break,
	Continue,
	Goto,
	Fallthrough,
	Return,
	Defer,
	Yield,
	Make,
	Map,
	Chan,
}


impl Keyword {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Func => "func",
			Self::Type => "type",
			Self::Var => "var",
			Self::Const => "const",
			Self::If => "if",
			Self::Else => "else",
			Self::For => "for",
			Self::Range => "range",
			Self::Switch => "switch",
			Self::Case => "case",
			Self::Default => "default",
			Self::Select => "select",
			Self::Break => "break",
			Self::Continue => "continue",
			Self::Goto => "goto",
			Self::Fallthrough => "fallthrough",
			Self::Return => "return",
			Self::Defer => "defer",
			Self::Yield => "yield",
			Self::Make => "make",
			Self::Map => "map",
			Self::Chan => "chan",
		}
	}
}


impl std::fmt::Display for Keyword {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}


/// Literals for non-composite types.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Nil,
	True,
	False,
	Int(i64),
	Float(f64),
	// String literals are not interned because they probably won't be repeated very often.
	String(Box<[u8]>),
}


impl std::fmt::Display for Literal {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Nil => "nil".fmt(f),
			Self::True => "true".fmt(f),
			Self::False => "false".fmt(f),
			Self::Int(int) => int.fmt(f),
			Self::Float(float) => write!(f, "{:?}", float),
			Self::String(string) => write!(f, "{:?}", bstr::ByteSlice::as_bstr(&string[..])),
		}
	}
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
	Plus,  // +
	Minus, // -
	Times, // *
	Div,   // /
	Mod,   // %

	Equals,        // ==
	NotEquals,     // !=
	Greater,       // >
	GreaterEquals, // >=
	Lower,         // <
	LowerEquals,   // <=

	Not, // !
	And, // &&
	Or,  // ||

	Arrow, // <-

	Assign,          // =
	Define,          // :=
	AssignOp(ArithOp), // +=, -=, *=, /=, %=
	Increment,       // ++
	Decrement,       // --
}


/// The arithmetic operators that have a compound assignment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
	Plus,
	Minus,
	Times,
	Div,
	Mod,
}


impl Operator {
	/// Strict equality operators (==, !=).
	pub fn is_equality(&self) -> bool {
		matches!(self, Self::Equals | Self::NotEquals)
	}


	/// Non-strict comparison operators (>, >=, <, <=).
	pub fn is_comparison(&self) -> bool {
		matches!(
			self,
			Self::Lower | Self::LowerEquals | Self::Greater | Self::GreaterEquals
		)
	}


	/// Additive arithmetic operators (+, -).
	pub fn is_term(&self) -> bool {
		matches!(self, Self::Plus | Self::Minus)
	}


	/// Multiplicative arithmetic operators (*, /, %).
	pub fn is_factor(&self) -> bool {
		matches!(self, Self::Times | Self::Div | Self::Mod)
	}


	/// Unary operators (-, !, <-)
	pub fn is_unary(&self) -> bool {
		matches!(self, Self::Not | Self::Minus | Self::Arrow)
	}


	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Plus => "+",
			Self::Minus => "-",
			Self::Times => "*",
			Self::Div => "/",
			Self::Mod => "%",
			Self::Equals => "==",
			Self::NotEquals => "!=",
			Self::Greater => ">",
			Self::GreaterEquals => ">=",
			Self::Lower => "<",
			Self::LowerEquals => "<=",
			Self::Not => "!",
			Self::And => "&&",
			Self::Or => "||",
			Self::Arrow => "<-",
			Self::Assign => "=",
			Self::Define => ":=",
			Self::AssignOp(ArithOp::Plus) => "+=",
			Self::AssignOp(ArithOp::Minus) => "-=",
			Self::AssignOp(ArithOp::Times) => "*=",
			Self::AssignOp(ArithOp::Div) => "/=",
			Self::AssignOp(ArithOp::Mod) => "%=",
			Self::Increment => "++",
			Self::Decrement => "--",
		}
	}
}


impl std::fmt::Display for Operator {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}


/// All possible kinds of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
	Identifier(Symbol),
	Keyword(Keyword),
	Operator(Operator),
	Literal(Literal),

	Colon,     // :
	Comma,     // ,
	Dot,       // .
	Semicolon, // ; or an inserted line terminator

	OpenParens,  // (
	CloseParens, // )

	OpenBracket,  // [
	CloseBracket, // ]

	OpenBrace,  // {
	CloseBrace, // }
}


impl TokenKind {
	/// Whether a line break after this token terminates a statement.
	pub fn ends_line(&self) -> bool {
		matches!(
			self,
			Self::Identifier(_)
				| Self::Literal(_)
				| Self::CloseParens
				| Self::CloseBracket
				| Self::CloseBrace
				| Self::Keyword(
					Keyword::Break | Keyword::Continue | Keyword::Fallthrough | Keyword::Return
				)
				| Self::Operator(Operator::Increment | Operator::Decrement)
		)
	}
}


impl<'a> Display<'a> for TokenKind {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Identifier(symbol) => symbol.fmt(f, context),
			Self::Keyword(keyword) => keyword.fmt(f),
			Self::Operator(op) => op.fmt(f),
			Self::Literal(literal) => literal.fmt(f),
			Self::Colon => ":".fmt(f),
			Self::Comma => ",".fmt(f),
			Self::Dot => ".".fmt(f),
			Self::Semicolon => ";".fmt(f),
			Self::OpenParens => "(".fmt(f),
			Self::CloseParens => ")".fmt(f),
			Self::OpenBracket => "[".fmt(f),
			Self::CloseBracket => "]".fmt(f),
			Self::OpenBrace => "{".fmt(f),
			Self::CloseBrace => "}".fmt(f),
		}
	}
}


/// A lexical token.
#[derive(Debug, Clone)]
pub struct Token {
	pub kind: TokenKind,
	pub pos: SourcePos,
}
