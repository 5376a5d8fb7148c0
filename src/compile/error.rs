use std::{path::Path, sync::Arc};

use crate::{
	fmt::{self, Display},
	semantic::program::{Name, Signature},
	symbol::{self, Symbol},
	syntax::SourcePos,
	term::color,
};


/// The kind of lowering error.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
	/// A function reached from suspension points of different signatures.
	ConflictingSignature {
		first: Signature,
		second: Signature,
	},
	/// A construct the lowering does not support in a suspending function.
	UnsupportedStatement(&'static str),
	/// A loop post statement other than a call free assignment.
	UnsupportedPostStatement,
	/// A labeled branch that does not target an enclosing statement.
	UnresolvedLabel(Name),
	/// A deferred call to a suspending function.
	UnsupportedDefer,
}


/// A lowering error, in the function where it was detected.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
	pub kind: ErrorKind,
	pub function: Symbol,
	pub path: Arc<Path>,
	pub pos: SourcePos,
}


impl Error {
	pub fn new(kind: ErrorKind, function: Symbol, path: Arc<Path>, pos: SourcePos) -> Self {
		Self { kind, function, path, pos }
	}
}


impl<'a> Display<'a> for ErrorKind {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::ConflictingSignature { first, second } => write!(
				f,
				"conflicting suspension signatures {} and {}",
				color::Fg(color::Yellow, first),
				color::Fg(color::Yellow, second),
			),

			Self::UnsupportedStatement(statement) => write!(
				f,
				"{} is not supported in suspending functions",
				color::Fg(color::Yellow, statement),
			),

			Self::UnsupportedPostStatement => f.write_str("unsupported loop post statement"),

			Self::UnresolvedLabel(label) => write!(
				f,
				"label {} does not resolve to an enclosing statement",
				color::Fg(color::Yellow, fmt::Show(label, context)),
			),

			Self::UnsupportedDefer => f.write_str("deferred call to a suspending function"),
		}
	}
}


impl<'a> Display<'a> for Error {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		write!(
			f,
			"{}: {} ({}) in {} - {}",
			color::Fg(color::Red, "Error"),
			self.path.display(),
			self.pos,
			color::Fg(color::Blue, fmt::Show(self.function, context)),
			fmt::Show(&self.kind, context),
		)
	}
}
