mod array;
mod channel;
mod deferred;
mod dict;
mod float;
mod fmt;
mod snapshot;
mod string;

use gc::{Finalize, Trace};

use crate::semantic::program::Type;
pub use array::Array;
pub use channel::{Channel, ChannelError};
pub use deferred::Deferred;
pub use dict::Dict;
pub use float::Float;
pub use snapshot::{Freezer, Snapshot, Target, Thawer};
pub use string::Str;


/// Index out of bounds error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfBounds;


/// A value in the language.
/// Arrays, dicts and channels are shared references. Strings are immutable.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Trace, Finalize)]
pub enum Value {
	Nil,
	Bool(bool),
	Int(i64),
	Float(Float),
	String(Str),
	Array(Array),
	Dict(Dict),
	Channel(Channel),
	/// A recorded deferred call. Only found in the defer lists of lowered functions.
	Deferred(Deferred),
}


impl Value {
	/// Shallow copy.
	pub fn copy(&self) -> Self {
		match self {
			Self::Nil => Self::Nil,
			Self::Bool(b) => Self::Bool(*b),
			Self::Int(int) => Self::Int(*int),
			Self::Float(float) => Self::Float(float.copy()),
			Self::String(string) => Self::String(string.copy()),
			Self::Array(array) => Self::Array(array.copy()),
			Self::Dict(dict) => Self::Dict(dict.copy()),
			Self::Channel(channel) => Self::Channel(channel.copy()),
			Self::Deferred(deferred) => Self::Deferred(deferred.copy()),
		}
	}


	/// Whether the value has the given dynamic type.
	/// Element types are not checked, as values do not carry them.
	pub fn has_type(&self, ty: &Type) -> bool {
		match (self, ty) {
			(_, Type::Any) => true,
			(Self::Nil, Type::Nil) => true,
			(Self::Bool(_), Type::Bool) => true,
			(Self::Int(_), Type::Int) => true,
			(Self::Float(_), Type::Float) => true,
			(Self::String(_), Type::String) => true,
			(Self::Array(_), Type::Array(_)) => true,
			(Self::Dict(_), Type::Map(_, _)) => true,
			(Self::Channel(_), Type::Chan(_)) => true,
			_ => false,
		}
	}
}


impl Default for Value {
	fn default() -> Self {
		Self::Nil
	}
}


impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}


impl From<i64> for Value {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}


impl From<f64> for Value {
	fn from(float: f64) -> Self {
		Self::Float(float.into())
	}
}


impl From<Float> for Value {
	fn from(float: Float) -> Self {
		Self::Float(float)
	}
}


impl<'a> From<&'a str> for Value {
	fn from(string: &'a str) -> Self {
		Self::String(string.into())
	}
}


impl<'a> From<&'a [u8]> for Value {
	fn from(string: &'a [u8]) -> Self {
		Self::String(string.into())
	}
}


impl From<Str> for Value {
	fn from(string: Str) -> Self {
		Self::String(string)
	}
}


impl From<Array> for Value {
	fn from(array: Array) -> Self {
		Self::Array(array)
	}
}


impl From<Dict> for Value {
	fn from(dict: Dict) -> Self {
		Self::Dict(dict)
	}
}


impl From<Channel> for Value {
	fn from(channel: Channel) -> Self {
		Self::Channel(channel)
	}
}


impl From<Deferred> for Value {
	fn from(deferred: Deferred) -> Self {
		Self::Deferred(deferred)
	}
}
