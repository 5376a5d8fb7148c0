use super::{Cursor, Root, State, Transition};


/// The state for lexing line comments. The leading slashes have already been consumed.
#[derive(Debug)]
pub(super) struct Comment;


impl Comment {
	pub fn visit(self, cursor: &Cursor) -> Transition {
		match cursor.peek() {
			// Newline marks the end of the comment. The newline itself is left for the root
			// state, as it may terminate a statement.
			Some(b'\n') => Transition::resume(Root),

			// Otherwise, eat everything.
			_ => Transition::step(self),
		}
	}
}


impl From<Comment> for State {
	fn from(state: Comment) -> State {
		Self::Comment(state)
	}
}
