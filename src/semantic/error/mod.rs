mod fmt;

use std::{path::Path, sync::Arc};

use super::{program::Type, Symbol, SourcePos};
pub use fmt::ErrorsDisplayContext;


/// Semantic errors.
#[derive(Debug, Default)]
pub struct Errors(pub Vec<Error>);


impl Errors {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}


	pub fn push(&mut self, error: Error) {
		self.0.push(error)
	}
}


impl IntoIterator for Errors {
	type Item = Error;
	type IntoIter = std::vec::IntoIter<Error>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}


impl Extend<Error> for Errors {
	fn extend<T>(&mut self, iter: T)
	where
		T : IntoIterator<Item = Error>,
	{
		self.0.extend(iter)
	}
}


/// The kind of semantic error.
#[derive(Debug)]
pub enum ErrorKind {
	/// Variable usage before variable declaration.
	UndeclaredVariable(Symbol),
	/// Call to a function that is neither declared nor a builtin.
	UndeclaredFunction(Symbol),
	UndeclaredType(Symbol),
	/// Branch to a label that is not declared in the function.
	UndeclaredLabel(Symbol),
	/// Variable declared with the same name twice in the same scope.
	/// Includes function parameters.
	DuplicateVariable(Symbol),
	DuplicateFunction(Symbol),
	DuplicateType(Symbol),
	DuplicateLabel(Symbol),
	AssignToConstant(Symbol),
	/// Assignment to something that is not a variable or an index.
	InvalidAssignment,
	/// Constants must be scalar literals.
	NonLiteralConstant,
	/// Break statement outside loop, switch or select.
	BreakOutsideLoop,
	ContinueOutsideLoop,
	/// Fallthrough anywhere but at the end of a non-final case of a value switch.
	MisplacedFallthrough,
	/// Unstructured jumps are not supported.
	Goto,
	/// Type guard outside a type switch tag.
	MisplacedTypeGuard,
	/// Call with the wrong number of arguments.
	ArgumentCount {
		function: Symbol,
		expected: usize,
		got: usize,
	},
	/// Return without a value in a function with a result, or the other way around.
	ReturnMismatch {
		expected: Option<Type>,
	},
	/// Type used as a value.
	NotAValue(Symbol),
}


/// A semantic error.
#[derive(Debug)]
pub struct Error {
	pub kind: ErrorKind,
	pub path: Arc<Path>,
	pub pos: SourcePos,
}


impl Error {
	pub fn new(kind: ErrorKind, path: Arc<Path>, pos: SourcePos) -> Self {
		Self { kind, path, pos }
	}
}
