use std::{
	cmp::Ordering,
	hash::{Hash, Hasher},
	ops::Deref,
};

use gc::{Gc, Finalize, Trace};

use crate::semantic::program::Callee;
use super::Value;


#[derive(Debug)]
#[derive(Trace, Finalize)]
struct Call {
	#[unsafe_ignore_trace]
	callee: Callee,
	args: Vec<Value>,
}


/// A deferred call, with its arguments evaluated when the call was deferred.
/// Deferred calls are compared by identity.
#[derive(Debug)]
#[derive(Trace, Finalize)]
pub struct Deferred(Gc<Call>);


impl Deferred {
	pub fn new(callee: Callee, args: Vec<Value>) -> Self {
		Self(Gc::new(Call { callee, args }))
	}


	/// Shallow copy.
	pub fn copy(&self) -> Self {
		Self(self.0.clone())
	}


	pub fn addr(&self) -> usize {
		self.0.deref() as *const Call as usize
	}


	pub fn callee(&self) -> Callee {
		self.0.callee
	}


	pub fn args(&self) -> &[Value] {
		&self.0.args
	}
}


impl PartialEq for Deferred {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}


impl Eq for Deferred { }


impl PartialOrd for Deferred {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}


impl Ord for Deferred {
	fn cmp(&self, other: &Self) -> Ordering {
		self.addr().cmp(&other.addr())
	}
}


impl Hash for Deferred {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state)
	}
}
