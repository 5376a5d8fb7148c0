use std::collections::HashMap;

use super::{program::VarId, ErrorKind, Symbol};


/// A scope stack.
#[derive(Debug, Default)]
pub struct Stack(Vec<HashMap<Symbol, VarId>>);


impl Stack {
	/// Enter a new empty scope.
	pub fn enter(&mut self) {
		self.0.push(HashMap::new());
	}


	/// Exit the current scope.
	/// Panics if the stack is empty.
	pub fn exit(&mut self) -> HashMap<Symbol, VarId> {
		self.0
			.pop()
			.expect("attempt to exit empty stack")
	}


	/// Declares a symbol in the current scope.
	/// Panics if the stack is empty.
	pub fn declare(&mut self, symbol: Symbol, var: VarId) -> Result<VarId, ErrorKind> {
		let scope = self.0.last_mut().expect("empty scope stack");

		if scope.contains_key(&symbol) {
			Err(ErrorKind::DuplicateVariable(symbol))
		} else {
			scope.insert(symbol, var);
			Ok(var)
		}
	}


	/// Find the innermost declaration of a symbol.
	pub fn resolve(&self, symbol: Symbol) -> Option<VarId> {
		self.0
			.iter()
			.rev()
			.find_map(|scope| scope.get(&symbol).copied())
	}
}
