use std::{
	cmp::Ordering,
	collections::{HashMap, BTreeMap},
	hash::{Hash, Hasher},
	ops::Deref,
};

use gc::{Gc, GcCell, GcCellRef, GcCellRefMut, Finalize, Trace};

use super::Value;


/// A dict in the language. Copies share the same storage.
#[derive(Debug, Default, PartialEq, Eq)]
#[derive(Trace, Finalize)]
pub struct Dict(Gc<GcCell<HashMap<Value, Value>>>);


impl Dict {
	pub fn new(dict: HashMap<Value, Value>) -> Self {
		Self(Gc::new(GcCell::new(dict)))
	}


	/// Shallow copy.
	pub fn copy(&self) -> Self {
		Self(self.0.clone())
	}


	/// The identity of the shared storage.
	pub fn addr(&self) -> usize {
		self.0.deref() as *const GcCell<HashMap<Value, Value>> as usize
	}


	/// Borrow the hashmap.
	pub fn borrow(&self) -> GcCellRef<HashMap<Value, Value>> {
		self.0.deref().borrow()
	}


	/// Borrow the hashmap mutably.
	pub fn borrow_mut(&self) -> GcCellRefMut<HashMap<Value, Value>> {
		self.0.deref().borrow_mut()
	}


	pub fn insert(&self, key: Value, value: Value) {
		self.borrow_mut().insert(key, value);
	}


	pub fn remove(&self, key: &Value) -> Option<Value> {
		self.borrow_mut().remove(key)
	}


	/// Get the value for the given key.
	pub fn get(&self, key: &Value) -> Option<Value> {
		self
			.borrow()
			.get(key)
			.map(Value::copy)
	}


	pub fn contains(&self, key: &Value) -> bool {
		self
			.borrow()
			.contains_key(key)
	}


	/// The keys, in ascending order.
	pub fn keys(&self) -> Vec<Value> {
		let mut keys: Vec<Value> = self
			.borrow()
			.keys()
			.map(Value::copy)
			.collect();

		keys.sort();
		keys
	}


	pub fn len(&self) -> i64 {
		self.borrow().len() as i64
	}


	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}


/// Dicts may be dict keys, which requires a total order.
impl PartialOrd for Dict {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}


impl Ord for Dict {
	fn cmp(&self, other: &Self) -> Ordering {
		// Expensive, but hash maps have no order of their own.
		let _self = self.borrow();
		let _self: BTreeMap<&Value, &Value> = _self.iter().collect();

		let _other = other.borrow();
		let _other: BTreeMap<&Value, &Value> = _other.iter().collect();

		_self.cmp(&_other)
	}
}


// GcCell does not implement Eq because `borrow` might panic.
#[allow(clippy::derive_hash_xor_eq)]
impl Hash for Dict {
	fn hash<H: Hasher>(&self, state: &mut H) {
		let _self = self.borrow();
		let _self: BTreeMap<&Value, &Value> = _self.iter().collect();

		_self.hash(state)
	}
}
