use std::{convert::TryFrom, ops::Deref};

use gc::{Gc, Finalize, Trace};

use super::{IndexOutOfBounds, Value};


/// Immutable byte strings. Copies share the bytes, and no operation mutates them.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Trace, Finalize)]
pub struct Str(Gc<Box<[u8]>>);


impl Str {
	/// Shallow copy.
	pub fn copy(&self) -> Self {
		Self(self.0.clone())
	}


	pub fn as_bytes(&self) -> &[u8] {
		self.0.deref()
	}


	/// Indexing yields the byte at the index as a string of length one.
	pub fn index(&self, index: i64) -> Result<Value, IndexOutOfBounds> {
		let byte = usize::try_from(index)
			.ok()
			.and_then(|index| self.as_bytes().get(index ..= index))
			.ok_or(IndexOutOfBounds)?;

		Ok(Value::String(byte.into()))
	}


	pub fn concat(&self, other: &Str) -> Self {
		[self.as_bytes(), other.as_bytes()].concat().into()
	}


	pub fn len(&self) -> usize {
		self.as_bytes().len()
	}
}


impl AsRef<[u8]> for Str {
	fn as_ref(&self) -> &[u8] {
		self.as_bytes()
	}
}


impl From<&[u8]> for Str {
	fn from(bytes: &[u8]) -> Self {
		Self(Gc::new(bytes.into()))
	}
}


impl From<Box<[u8]>> for Str {
	fn from(bytes: Box<[u8]>) -> Self {
		Self(Gc::new(bytes))
	}
}


impl From<Vec<u8>> for Str {
	fn from(bytes: Vec<u8>) -> Self {
		bytes.into_boxed_slice().into()
	}
}


impl From<&str> for Str {
	fn from(string: &str) -> Self {
		string.as_bytes().into()
	}
}


impl From<String> for Str {
	fn from(string: String) -> Self {
		string.into_bytes().into()
	}
}


#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;


	#[test]
	fn test_index() {
		let string = Str::from("go");

		assert_matches!(string.index(1), Ok(Value::String(ref byte)) => assert_eq!(byte.as_bytes(), b"o"));
		assert_eq!(string.index(2), Err(IndexOutOfBounds));
		assert_eq!(string.index(-1), Err(IndexOutOfBounds));
	}


	#[test]
	fn test_concat() {
		let joined = Str::from("co").concat(&Str::from("rolla"));

		assert_eq!(joined.as_bytes(), b"corolla");
		assert_eq!(joined.len(), 7);
	}


	#[test]
	fn test_display_invalid_utf8() {
		assert_eq!(Str::from("corolla").to_string(), "corolla");
		assert_eq!(Str::from(&b"a\xffb"[..]).to_string(), "a\u{FFFD}b");
	}
}
