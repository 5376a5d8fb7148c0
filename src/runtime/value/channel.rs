use std::{
	cmp::Ordering,
	hash::{Hash, Hasher},
	ops::Deref,
};

use gc::{Gc, GcCell, Finalize, Trace};

use super::Value;


/// Why a channel operation can't complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
	Closed,
	/// The buffer of a bounded channel is full.
	Full,
	/// Nothing to receive from an open channel.
	Empty,
}


#[derive(Debug)]
#[derive(Trace, Finalize)]
struct State {
	buffer: Vec<Value>,
	/// Unbounded when missing.
	capacity: Option<usize>,
	closed: bool,
}


/// A channel in the language. There is a single thread of execution, so operations that
/// would wait for another party fail instead.
/// Channels are compared by identity.
#[derive(Debug)]
#[derive(Trace, Finalize)]
pub struct Channel(Gc<GcCell<State>>);


impl Channel {
	pub fn new(capacity: Option<usize>) -> Self {
		Self::from_parts(capacity, false, Vec::new())
	}


	pub fn from_parts(capacity: Option<usize>, closed: bool, buffer: Vec<Value>) -> Self {
		Self(Gc::new(GcCell::new(State { buffer, capacity, closed })))
	}


	/// Append values to the buffer, ignoring the capacity. Used to rebuild saved channels.
	pub(super) fn fill<I>(&self, values: I)
	where
		I: IntoIterator<Item = Value>,
	{
		self.0.borrow_mut().buffer.extend(values)
	}


	/// Shallow copy.
	pub fn copy(&self) -> Self {
		Self(self.0.clone())
	}


	/// The identity of the channel.
	pub fn addr(&self) -> usize {
		self.0.deref() as *const GcCell<State> as usize
	}


	pub fn send(&self, value: Value) -> Result<(), ChannelError> {
		let mut state = self.0.borrow_mut();

		if state.closed {
			return Err(ChannelError::Closed);
		}

		match state.capacity {
			Some(capacity) if state.buffer.len() >= capacity => Err(ChannelError::Full),
			_ => {
				state.buffer.push(value);
				Ok(())
			}
		}
	}


	/// Receive the oldest buffered value. A closed and drained channel yields `None`.
	pub fn receive(&self) -> Result<Option<Value>, ChannelError> {
		let mut state = self.0.borrow_mut();

		if !state.buffer.is_empty() {
			Ok(Some(state.buffer.remove(0)))
		} else if state.closed {
			Ok(None)
		} else {
			Err(ChannelError::Empty)
		}
	}


	pub fn close(&self) -> Result<(), ChannelError> {
		let mut state = self.0.borrow_mut();

		if state.closed {
			Err(ChannelError::Closed)
		} else {
			state.closed = true;
			Ok(())
		}
	}


	/// Whether a send would not fail for lack of room. Sends on closed channels are ready,
	/// and fail when performed.
	pub fn can_send(&self) -> bool {
		let state = self.0.borrow();

		match state.capacity {
			_ if state.closed => true,
			Some(capacity) => state.buffer.len() < capacity,
			None => true,
		}
	}


	pub fn can_receive(&self) -> bool {
		let state = self.0.borrow();
		!state.buffer.is_empty() || state.closed
	}


	pub fn capacity(&self) -> Option<usize> {
		self.0.borrow().capacity
	}


	pub fn is_closed(&self) -> bool {
		self.0.borrow().closed
	}


	/// Copies of the buffered values, oldest first.
	pub fn buffered(&self) -> Vec<Value> {
		self.0
			.borrow()
			.buffer
			.iter()
			.map(Value::copy)
			.collect()
	}


	pub fn len(&self) -> i64 {
		self.0.borrow().buffer.len() as i64
	}


	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}


impl PartialEq for Channel {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}


impl Eq for Channel { }


impl PartialOrd for Channel {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}


impl Ord for Channel {
	fn cmp(&self, other: &Self) -> Ordering {
		self.addr().cmp(&other.addr())
	}
}


impl Hash for Channel {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state)
	}
}
