use std::fmt::Display as _;

use super::{Errors, Error, ErrorKind};
use crate::{
	fmt::{self, Display},
	symbol,
	term::color
};


/// Context for displaying errors.
#[derive(Debug, Copy, Clone)]
pub struct ErrorsDisplayContext<'a> {
	/// Max number of displayed errors.
	pub max_errors: Option<usize>,
	/// Symbol interner.
	pub interner: &'a symbol::Interner,
}


/// Write a symbol between quotes.
fn quoted(
	f: &mut std::fmt::Formatter,
	what: &str,
	symbol: &symbol::Symbol,
	context: &symbol::Interner,
) -> std::fmt::Result {
	write!(f, "{} '", what)?;
	symbol.fmt(f, context)?;
	"'".fmt(f)
}


impl<'a> Display<'a> for ErrorKind {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::UndeclaredVariable(symbol) => quoted(f, "undeclared variable", symbol, context),
			Self::UndeclaredFunction(symbol) => quoted(f, "undeclared function", symbol, context),
			Self::UndeclaredType(symbol) => quoted(f, "undeclared type", symbol, context),
			Self::UndeclaredLabel(symbol) => quoted(f, "undeclared label", symbol, context),
			Self::DuplicateVariable(symbol) => quoted(f, "duplicate variable", symbol, context),
			Self::DuplicateFunction(symbol) => quoted(f, "duplicate function", symbol, context),
			Self::DuplicateType(symbol) => quoted(f, "duplicate type", symbol, context),
			Self::DuplicateLabel(symbol) => quoted(f, "duplicate label", symbol, context),
			Self::AssignToConstant(symbol) => quoted(f, "assignment to constant", symbol, context),

			Self::InvalidAssignment => "invalid assignment".fmt(f),

			Self::NonLiteralConstant => "constant initializer is not a literal".fmt(f),

			Self::BreakOutsideLoop => "break statement outside loop, switch or select".fmt(f),

			Self::ContinueOutsideLoop => "continue statement outside loop".fmt(f),

			Self::MisplacedFallthrough => "misplaced fallthrough statement".fmt(f),

			Self::Goto => "goto is not supported".fmt(f),

			Self::MisplacedTypeGuard => "type guard outside type switch".fmt(f),

			Self::ArgumentCount { function, expected, got } => {
				quoted(f, "call to", function, context)?;
				write!(f, " with {} arguments, expected {}", got, expected)
			}

			Self::ReturnMismatch { expected: Some(ty) } => {
				write!(f, "missing return value of type {}", ty)
			}

			Self::ReturnMismatch { expected: None } => {
				"return value in function without result".fmt(f)
			}

			Self::NotAValue(symbol) => quoted(f, "type used as value:", symbol, context),
		}
	}
}


impl<'a> Display<'a> for Error {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		write!(
			f,
			"{}: {} ({}) - ",
			color::Fg(color::Red, "Error"),
			self.path.display(),
			self.pos,
		)?;
		self.kind.fmt(f, context)
	}
}


impl<'a> Display<'a> for Errors {
	type Context = ErrorsDisplayContext<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		for (ix, error) in self.0.iter().enumerate() {
			if let Some(max) = context.max_errors {
				if max <= ix {
					writeln!(
						f,
						"{} {}",
						color::Fg(color::Red, self.0.len() - max),
						color::Fg(color::Red, "more supressed semantic errors"),
					)?;

					break;
				}
			}

			writeln!(f, "{}", fmt::Show(error, context.interner))?;
		}

		Ok(())
	}
}
