use super::{
	Cursor,
	Error,
	ErrorKind,
	Literal,
	Root,
	SourcePos,
	State,
	Token,
	TokenKind,
	Transition,
};


/// The portion of a number literal being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
	/// Digits before the dot, in the literal's radix.
	Integral { digits: bool },
	/// Digits after the dot.
	Fraction { digits: bool },
	/// The exponent, which may start with a sign.
	Exponent { signed: bool, digits: bool },
}


/// Number literals: decimal ints and floats, and ints prefixed by `0x`, `0o` or `0b`.
/// Digits may be separated by underscores.
#[derive(Debug)]
pub(super) struct NumberLiteral {
	start_offset: usize,
	radix: u32,
	part: Part,
	pos: SourcePos,
}


impl NumberLiteral {
	/// The first digit has already been consumed when this state is entered.
	pub fn at(cursor: &Cursor) -> Self {
		Self {
			start_offset: cursor.offset(),
			radix: 10,
			part: Part::Integral { digits: true },
			pos: cursor.pos(),
		}
	}


	pub fn visit(mut self, cursor: &Cursor) -> Transition {
		let c = match cursor.peek() {
			Some(c) => c,
			None => return self.finish(cursor),
		};

		match (self.part, c) {
			// Separator.
			(_, b'_') => Transition::step(self),

			// Radix prefix, only right after a leading zero.
			(Part::Integral { .. }, b'x' | b'X' | b'o' | b'O' | b'b' | b'B') if self.after_leading_zero(cursor) => {
				self.radix = match c.to_ascii_lowercase() {
					b'x' => 16,
					b'o' => 8,
					_ => 2,
				};
				self.part = Part::Integral { digits: false };
				Transition::step(self)
			}

			(Part::Integral { .. }, c) if (c as char).is_digit(self.radix) => {
				self.part = Part::Integral { digits: true };
				Transition::step(self)
			}

			(Part::Integral { .. }, b'.') if self.radix == 10 => {
				self.part = Part::Fraction { digits: false };
				Transition::step(self)
			}

			(Part::Integral { .. }, b'e' | b'E') | (Part::Fraction { .. }, b'e' | b'E') if self.radix == 10 => {
				self.part = Part::Exponent { signed: false, digits: false };
				Transition::step(self)
			}

			(Part::Fraction { .. }, c) if c.is_ascii_digit() => {
				self.part = Part::Fraction { digits: true };
				Transition::step(self)
			}

			(Part::Exponent { signed: false, digits: false }, b'+' | b'-') => {
				self.part = Part::Exponent { signed: true, digits: false };
				Transition::step(self)
			}

			(Part::Exponent { signed, .. }, c) if c.is_ascii_digit() => {
				self.part = Part::Exponent { signed, digits: true };
				Transition::step(self)
			}

			// Anything else ends the literal.
			_ => self.finish(cursor),
		}
	}


	fn after_leading_zero(&self, cursor: &Cursor) -> bool {
		self.radix == 10
			&& cursor.offset() == self.start_offset + 1
			&& cursor.since(self.start_offset) == b"0"
	}


	/// Produce the literal, without consuming the current character.
	fn finish(self, cursor: &Cursor) -> Transition {
		// A bare trailing dot is fine, but not when a name is glued to it.
		let glued = self.part == Part::Fraction { digits: false }
			&& cursor.peek().map_or(false, |c| c.is_ascii_alphabetic());

		let incomplete = glued || matches!(
			self.part,
			Part::Integral { digits: false } | Part::Exponent { digits: false, .. }
		);

		if incomplete {
			let kind = match cursor.peek() {
				Some(c) => ErrorKind::Unexpected(c),
				None => ErrorKind::UnexpectedEof,
			};

			return Transition::error(Root, Error { error: kind, pos: self.pos });
		}

		match self.parse(cursor.since(self.start_offset)) {
			Some(literal) => Transition::resume_produce(
				Root,
				Token { kind: TokenKind::Literal(literal), pos: self.pos },
			),

			None => Transition::error(
				Root,
				Error::invalid_number(cursor.since(self.start_offset), self.pos),
			),
		}
	}


	fn parse(&self, number: &[u8]) -> Option<Literal> {
		// Separators must sit between digits.
		if number.ends_with(b"_") || number.windows(2).any(|pair| pair == b"__") {
			return None;
		}

		let digits: String = number
			.iter()
			.filter(|&&c| c != b'_')
			.map(|&c| c as char)
			.collect();

		match self.part {
			Part::Integral { .. } if self.radix == 10 => digits.parse().ok().map(Literal::Int),

			Part::Integral { .. } => i64::from_str_radix(&digits[2 ..], self.radix)
				.ok()
				.map(Literal::Int),

			Part::Fraction { .. } | Part::Exponent { .. } => digits.parse().ok().map(Literal::Float),
		}
	}
}


impl From<NumberLiteral> for State {
	fn from(state: NumberLiteral) -> State {
		State::NumberLiteral(state)
	}
}
