use std::fmt::{self, Display};

use bstr::ByteSlice;

use super::{Array, Dict, Str, Value};


impl Display for Str {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.as_bytes().as_bstr().fmt(f)
	}
}


impl Display for Array {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let array = self.borrow();
		let mut iter = array.iter();

		write!(f, "[")?;

		if let Some(item) = iter.next() {
			write!(f, "{}", item)?;
		}

		for item in iter {
			write!(f, " {}", item)?;
		}

		write!(f, "]")
	}
}


/// Entries are shown in key order.
impl Display for Dict {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let mut iter = self.keys().into_iter();

		write!(f, "map[")?;

		if let Some(key) = iter.next() {
			write!(f, "{}:{}", key, self.get(&key).unwrap_or_default())?;
		}

		for key in iter {
			write!(f, " {}:{}", key, self.get(&key).unwrap_or_default())?;
		}

		write!(f, "]")
	}
}


impl Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Nil => write!(f, "nil"),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Int(int) => write!(f, "{}", int),
			Self::Float(float) => write!(f, "{}", float),
			Self::String(string) => write!(f, "{}", string),
			Self::Array(array) => write!(f, "{}", array),
			Self::Dict(dict) => write!(f, "{}", dict),
			Self::Channel(channel) => write!(f, "chan({:#x})", channel.addr()),
			Self::Deferred(deferred) => write!(f, "deferred({:?})", deferred.callee()),
		}
	}
}
