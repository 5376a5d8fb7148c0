use super::{
	symbol::SymbolChar,
	word::IsWord,
	Cursor,
	Error,
	NumberLiteral,
	State,
	StringLiteral,
	Symbol,
	Token,
	Transition,
	Word,
};


/// The top level lexer state.
#[derive(Debug)]
pub(super) struct Root;


impl Root {
	pub fn visit(self, cursor: &Cursor) -> Transition {
		match cursor.peek() {
			// Whitespace.
			Some(c) if c.is_ascii_whitespace() => Transition::step(self),

			// String literals.
			Some(b'"') => Transition::step(StringLiteral::at(cursor)),

			// Number literals.
			Some(c) if c.is_ascii_digit() => Transition::step(NumberLiteral::at(cursor)),

			// Identifiers and keywords.
			Some(c) if c.is_word_start() => Transition::resume(Word::at(cursor)),

			// Symbols, including comments.
			Some(c) => match SymbolChar::from_first(c) {
				SymbolChar::None => Transition::error(self, Error::unexpected(c, cursor.pos())),

				SymbolChar::Single(kind) => {
					Transition::produce(self, Token { kind, pos: cursor.pos() })
				}

				SymbolChar::Double { first } => Transition::step(Symbol::from_first(first, cursor)),
			},

			// Eof.
			None => Transition::step(self),
		}
	}
}


impl From<Root> for State {
	fn from(state: Root) -> State {
		State::Root(state)
	}
}
