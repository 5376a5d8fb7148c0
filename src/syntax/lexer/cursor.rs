use super::SourcePos;


/// A position in the input of the lexer, which only moves forward.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
	input: &'a [u8],
	offset: usize,
	pos: SourcePos,
}


impl<'a> Cursor<'a> {
	pub fn pos(&self) -> SourcePos {
		self.pos
	}


	pub fn offset(&self) -> usize {
		self.offset
	}


	pub fn is_eof(&self) -> bool {
		self.offset >= self.input.len()
	}


	pub fn peek(&self) -> Option<u8> {
		self.input.get(self.offset).copied()
	}


	/// The input from the given offset up to and excluding the current character.
	pub fn since(&self, offset: usize) -> &'a [u8] {
		&self.input[offset .. self.offset]
	}


	/// The input from the given offset up to and including the current character.
	pub fn through(&self, offset: usize) -> &'a [u8] {
		let end = (self.offset + 1).min(self.input.len());
		&self.input[offset .. end]
	}


	pub fn step(&mut self) {
		if let Some(&c) = self.input.get(self.offset) {
			self.pos.visit(c);
			self.offset += 1;
		}
	}
}


impl<'a> From<&'a [u8]> for Cursor<'a> {
	fn from(input: &'a [u8]) -> Self {
		Self { input, offset: 0, pos: SourcePos::default() }
	}
}


impl<'a> From<&'a crate::syntax::Source> for Cursor<'a> {
	fn from(source: &'a crate::syntax::Source) -> Self {
		Self::from(&source.contents[..])
	}
}
