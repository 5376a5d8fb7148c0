mod fmt;

use std::borrow::Cow;

use intaglio::{bytes::SymbolTable, Symbol as Id};


/// An interned identifier, label or path.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Symbol(Id);


/// The default symbol stands for names that failed to parse, and is never produced by
/// interning.
impl Default for Symbol {
	fn default() -> Self {
		Self(Id::new(0))
	}
}


impl From<Symbol> for usize {
	fn from(symbol: Symbol) -> usize {
		symbol.0.id() as usize
	}
}


/// Interner for every name in a program. A single interner is shared by all packages
/// processed in one run, so that symbols of generated code resolve with it.
#[derive(Debug)]
pub struct Interner(SymbolTable);


impl Interner {
	pub fn new() -> Self {
		let mut table = SymbolTable::new();

		// Reserve the id of the default symbol.
		table
			.intern(&b"<ill-formed>"[..])
			.expect("symbol table overflow");

		Self(table)
	}


	/// Get the symbol for a name, interning it if needed.
	pub fn get_or_intern<T>(&mut self, name: T) -> Symbol
	where
		T: AsRef<[u8]>,
	{
		let name = name.as_ref();

		if let Some(id) = self.0.check_interned(name) {
			return Symbol(id);
		}

		let id = self.0
			.intern(name.to_vec())
			.expect("symbol table overflow");

		Symbol(id)
	}


	pub fn resolve(&self, symbol: Symbol) -> Option<&[u8]> {
		if symbol == Symbol::default() {
			None
		} else {
			self.0.get(symbol.0)
		}
	}


	/// The name of a symbol, with invalid utf-8 replaced.
	pub fn name(&self, symbol: Symbol) -> Option<Cow<str>> {
		self.resolve(symbol).map(String::from_utf8_lossy)
	}
}


#[cfg(test)]
mod tests {
	use super::*;


	#[test]
	fn test_interning() {
		let mut interner = Interner::new();

		let squares = interner.get_or_intern("squares");
		assert_eq!(interner.get_or_intern(b"squares"), squares);
		assert_ne!(interner.get_or_intern("parent"), squares);

		assert_eq!(interner.name(squares).as_deref(), Some("squares"));
		assert_eq!(interner.resolve(Symbol::default()), None);
	}
}
