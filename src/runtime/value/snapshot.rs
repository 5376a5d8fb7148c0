//! The plain form of values: thread safe and serializable. Shared arrays, dicts, channels
//! and deferred calls get an id when first frozen, and later occurrences refer to it, so
//! sharing and cycles survive a round trip through the same freezer and thawer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
	coroutine::MarshalError,
	runtime::lib,
	semantic::program::{Callee, FnId},
};
use super::{Array, Channel, Deferred, Dict, Value};


/// The target of a deferred call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
	/// A function, by index in the program.
	Function(u32),
	/// A builtin, by registered name.
	Builtin(String),
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
	Nil,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(Box<[u8]>),
	Array {
		id: u32,
		items: Vec<Snapshot>,
	},
	Dict {
		id: u32,
		entries: Vec<(Snapshot, Snapshot)>,
	},
	Channel {
		id: u32,
		capacity: Option<usize>,
		closed: bool,
		buffer: Vec<Snapshot>,
	},
	Deferred {
		id: u32,
		target: Target,
		args: Vec<Snapshot>,
	},
	/// A shared value frozen earlier by the same freezer.
	Ref(u32),
}


impl Snapshot {
	/// Freeze a single value.
	pub fn of(value: &Value) -> Self {
		Freezer::default().freeze(value)
	}
}


impl Default for Snapshot {
	fn default() -> Self {
		Self::Nil
	}
}


impl From<i64> for Snapshot {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}


impl<'a> From<&'a str> for Snapshot {
	fn from(string: &'a str) -> Self {
		Self::String(string.as_bytes().into())
	}
}


#[derive(Debug, Default)]
pub struct Freezer {
	ids: HashMap<usize, u32>,
}


impl Freezer {
	/// Get a new id for the address, or the existing one as an error.
	fn register(&mut self, addr: usize) -> Result<u32, u32> {
		let next = self.ids.len() as u32;

		match self.ids.get(&addr) {
			Some(&id) => Err(id),
			None => {
				self.ids.insert(addr, next);
				Ok(next)
			}
		}
	}


	pub fn freeze(&mut self, value: &Value) -> Snapshot {
		match value {
			Value::Nil => Snapshot::Nil,
			Value::Bool(b) => Snapshot::Bool(*b),
			Value::Int(int) => Snapshot::Int(*int),
			Value::Float(float) => Snapshot::Float(float.0),
			Value::String(string) => Snapshot::String(string.as_bytes().into()),

			Value::Array(array) => match self.register(array.addr()) {
				Err(id) => Snapshot::Ref(id),
				Ok(id) => Snapshot::Array {
					id,
					items: array
						.borrow()
						.iter()
						.map(|item| self.freeze(item))
						.collect(),
				},
			},

			Value::Dict(dict) => match self.register(dict.addr()) {
				Err(id) => Snapshot::Ref(id),
				Ok(id) => Snapshot::Dict {
					id,
					// Key order keeps the byte form deterministic.
					entries: dict
						.keys()
						.into_iter()
						.map(
							|key| {
								let value = dict.get(&key).unwrap_or_default();
								(self.freeze(&key), self.freeze(&value))
							}
						)
						.collect(),
				},
			},

			Value::Channel(channel) => match self.register(channel.addr()) {
				Err(id) => Snapshot::Ref(id),
				Ok(id) => Snapshot::Channel {
					id,
					capacity: channel.capacity(),
					closed: channel.is_closed(),
					buffer: channel
						.buffered()
						.iter()
						.map(|item| self.freeze(item))
						.collect(),
				},
			},

			Value::Deferred(deferred) => match self.register(deferred.addr()) {
				Err(id) => Snapshot::Ref(id),
				Ok(id) => Snapshot::Deferred {
					id,
					target: match deferred.callee() {
						Callee::Function(FnId(ix)) => Target::Function(ix),
						Callee::Builtin(name) => Target::Builtin(name.to_owned()),
					},
					args: deferred
						.args()
						.iter()
						.map(|arg| self.freeze(arg))
						.collect(),
				},
			},
		}
	}
}


#[derive(Debug)]
pub struct Thawer {
	values: HashMap<u32, Value>,
	/// The number of functions in the program, to validate deferred calls.
	functions: usize,
}


impl Thawer {
	pub fn new(functions: usize) -> Self {
		Self { values: HashMap::new(), functions }
	}


	pub fn thaw(&mut self, snapshot: Snapshot) -> Result<Value, MarshalError> {
		match snapshot {
			Snapshot::Nil => Ok(Value::Nil),
			Snapshot::Bool(b) => Ok(b.into()),
			Snapshot::Int(int) => Ok(int.into()),
			Snapshot::Float(float) => Ok(float.into()),
			Snapshot::String(string) => Ok(Value::String(string.into())),

			Snapshot::Array { id, items } => {
				let array = Array::new(Vec::with_capacity(items.len()));
				self.values.insert(id, array.copy().into());

				for item in items {
					let item = self.thaw(item)?;
					array.push(item);
				}

				Ok(array.into())
			}

			Snapshot::Dict { id, entries } => {
				let dict = Dict::new(HashMap::with_capacity(entries.len()));
				self.values.insert(id, dict.copy().into());

				for (key, value) in entries {
					let key = self.thaw(key)?;
					let value = self.thaw(value)?;
					dict.insert(key, value);
				}

				Ok(dict.into())
			}

			Snapshot::Channel { id, capacity, closed, buffer } => {
				let channel = Channel::from_parts(capacity, closed, Vec::new());
				self.values.insert(id, channel.copy().into());

				let mut items = Vec::with_capacity(buffer.len());
				for item in buffer {
					items.push(self.thaw(item)?);
				}

				channel.fill(items);

				Ok(channel.into())
			}

			Snapshot::Deferred { id, target, args } => {
				let callee = match target {
					Target::Function(ix) if (ix as usize) < self.functions => Callee::Function(FnId(ix)),

					Target::Function(ix) => return Err(
						MarshalError::Value(format!("function index {} out of range", ix))
					),

					Target::Builtin(name) => match lib::get(&name) {
						Some(builtin) => Callee::Builtin(builtin.name()),
						None => return Err(MarshalError::Value(format!("unknown builtin {}", name))),
					},
				};

				let mut values = Vec::with_capacity(args.len());
				for arg in args {
					values.push(self.thaw(arg)?);
				}

				let deferred = Deferred::new(callee, values);
				self.values.insert(id, deferred.copy().into());

				Ok(deferred.into())
			}

			Snapshot::Ref(id) => self.values
				.get(&id)
				.map(Value::copy)
				.ok_or_else(|| MarshalError::Value(format!("dangling reference {}", id))),
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sharing_survives() {
		let inner = Array::new(vec![1.into(), "two".into()]);
		let outer = Array::new(vec![inner.copy().into(), inner.copy().into()]);

		let snapshot = Snapshot::of(&outer.into());

		match &snapshot {
			Snapshot::Array { items, .. } => assert_eq!(items[1], Snapshot::Ref(1)),
			snapshot => panic!("expected array, got {:?}", snapshot),
		}

		let value = Thawer::new(0)
			.thaw(snapshot)
			.expect("snapshot should thaw");

		let outer = match &value {
			Value::Array(array) => array.copy(),
			value => panic!("expected array, got {}", value),
		};

		let first = outer.index(0).expect("missing item");
		let second = outer.index(1).expect("missing item");

		match (&first, &second) {
			(Value::Array(first), Value::Array(second)) => {
				assert_eq!(first.addr(), second.addr());
				first.push(Value::Nil);
				assert_eq!(second.len(), 3);
			}

			items => panic!("expected arrays, got {:?}", items),
		}
	}


	#[test]
	fn test_cycle() {
		let array = Array::new(Vec::new());
		array.push(array.copy().into());

		let snapshot = Snapshot::of(&array.into());
		let value = Thawer::new(0).thaw(snapshot).expect("snapshot should thaw");

		match &value {
			Value::Array(array) => match &array.index(0) {
				Ok(Value::Array(item)) => assert_eq!(item.addr(), array.addr()),
				item => panic!("expected array, got {:?}", item),
			},
			value => panic!("expected array, got {}", value),
		}
	}


	#[test]
	fn test_invalid_references() {
		assert!(Thawer::new(0).thaw(Snapshot::Ref(3)).is_err());

		let deferred = Snapshot::Deferred {
			id: 0,
			target: Target::Function(2),
			args: Vec::new(),
		};
		assert!(Thawer::new(1).thaw(deferred).is_err());

		let deferred = Snapshot::Deferred {
			id: 0,
			target: Target::Builtin("println".into()),
			args: vec!["done".into()],
		};
		assert!(Thawer::new(0).thaw(deferred).is_ok());
	}
}
