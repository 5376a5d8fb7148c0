use std::{
	fmt::{self, Display},
	path::Path,
	sync::Arc,
};

use crate::syntax;


/// Where a panic happened. Unlike syntax positions, these own their path, as panics may
/// outlive the program and cross threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePos {
	pub path: Arc<Path>,
	pub line: u32,
	pub column: u32,
}


impl SourcePos {
	pub fn new(pos: syntax::SourcePos, path: &Arc<Path>) -> Self {
		let syntax::SourcePos { line, column } = pos;

		Self { path: path.clone(), line, column }
	}
}


impl Display for SourcePos {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
	}
}
