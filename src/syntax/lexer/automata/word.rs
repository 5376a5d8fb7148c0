use super::{
	Cursor,
	Keyword,
	Literal,
	Root,
	SourcePos,
	State,
	SymbolInterner,
	Token,
	TokenKind,
	Transition,
};


/// The state for lexing identifiers and keywords.
#[derive(Debug)]
pub(super) struct Word {
	start_offset: usize,
	pos: SourcePos,
}


impl Word {
	pub fn at(cursor: &Cursor) -> Self {
		Self { start_offset: cursor.offset(), pos: cursor.pos() }
	}


	pub fn visit(self, cursor: &Cursor, interner: &mut SymbolInterner) -> Transition {
		// We don't need to check if the first character is a number here, because the Root
		// state will only transition to this state if that is the case.
		match cursor.peek() {
			// Word character.
			Some(c) if c.is_word() => Transition::step(self),

			// If we visit EOF or a non-identifier character, we should just produce.
			_ => {
				let word = cursor.since(self.start_offset);
				let kind = to_token(word, interner);

				Transition::resume_produce(Root, Token { kind, pos: self.pos })
			}
		}
	}
}


impl From<Word> for State {
	fn from(state: Word) -> State {
		State::Word(state)
	}
}


pub fn to_token(word: &[u8], interner: &mut SymbolInterner) -> TokenKind {
	let keyword = TokenKind::Keyword;

	match word {
		// Keywords:
		b"func" => keyword(Keyword::Func),
		b"type" => keyword(Keyword::Type),
		b"var" => keyword(Keyword::Var),
		b"const" => keyword(Keyword::Const),
		b"if" => keyword(Keyword::If),
		b"else" => keyword(Keyword::Else),
		b"for" => keyword(Keyword::For),
		b"range" => keyword(Keyword::Range),
		b"switch" => keyword(Keyword::Switch),
		b"case" => keyword(Keyword::Case),
		b"default" => keyword(Keyword::Default),
		b"select" => keyword(Keyword::Select),
		b"break" => keyword(Keyword::Break),
		b"continue" => keyword(Keyword::Continue),
		b"goto" => keyword(Keyword::Goto),
		b"fallthrough" => keyword(Keyword::Fallthrough),
		b"return" => keyword(Keyword::Return),
		b"defer" => keyword(Keyword::Defer),
		b"yield" => keyword(Keyword::Yield),
		b"make" => keyword(Keyword::Make),
		b"map" => keyword(Keyword::Map),
		b"chan" => keyword(Keyword::Chan),

		// Literals:
		b"nil" => TokenKind::Literal(Literal::Nil),
		b"true" => TokenKind::Literal(Literal::True),
		b"false" => TokenKind::Literal(Literal::False),

		// Identifier:
		ident => {
			let symbol = interner.get_or_intern(ident);
			TokenKind::Identifier(symbol)
		}
	}
}


/// Helper trait for checking if a character is a valid word constituent.
pub trait IsWord {
	fn is_word_start(&self) -> bool;
	fn is_word(&self) -> bool;
}


impl IsWord for u8 {
	fn is_word_start(&self) -> bool {
		self.is_ascii_alphabetic() || *self == b'_'
	}

	fn is_word(&self) -> bool {
		self.is_ascii_alphanumeric() || *self == b'_'
	}
}
