//! The re-entrant driver: every step calls the entry function again on the caller's
//! thread, and lowered code skips the work it already completed.

use serde::{de::DeserializeOwned, Serialize};

use super::{Context, MarshalError, Signal, Stack, State};


/// The entry point of a replayed coroutine.
pub type Entry<R, S, V, E> = Box<dyn FnMut(&mut Context<R, S, V>) -> Result<(), E>>;


pub struct Coroutine<R, S, V, E> {
	context: Context<R, S, V>,
	entry: Entry<R, S, V, E>,
	state: State,
}


impl<R, S, V, E> Coroutine<R, S, V, E>
where
	S: Default,
	E: Signal,
{
	pub fn new<F>(entry: F) -> Self
	where
		F: FnMut(&mut Context<R, S, V>) -> Result<(), E> + 'static,
	{
		Self {
			context: Context::default(),
			entry: Box::new(entry),
			state: State::Created,
		}
	}


	/// Run until the next suspension point or until the entry returns.
	/// Returns whether a new value was yielded.
	pub fn step(&mut self) -> Result<bool, E> {
		match self.state {
			State::Done => return Ok(false),

			State::Created if self.context.stopping() => {
				tracing::debug!(target: "coroutine", "cancelled before start");
				self.state = State::Done;
				return Ok(false);
			}

			State::Running => panic!("coroutine stepped from inside its own step"),

			_ => (),
		}

		self.state = State::Running;
		self.context.rewind();

		let result = (self.entry)(&mut self.context);

		match result {
			Ok(()) => {
				tracing::debug!(target: "coroutine", "entry returned");
				self.state = State::Done;
				Ok(false)
			}

			Err(error) if error.is_unwind() && self.context.unwinding() && !self.context.stopping() => {
				tracing::debug!(target: "coroutine", frames = self.context.stack().len(), "suspended");
				self.state = State::Suspended;
				Ok(true)
			}

			Err(error) if error.is_unwind() => {
				tracing::debug!(target: "coroutine", "cancelled");
				self.state = State::Done;
				Ok(false)
			}

			Err(error) => {
				self.state = State::Done;
				Err(error)
			}
		}
	}
}


impl<R, S, V, E> Coroutine<R, S, V, E> {
	/// The last yielded value, if the last step yielded.
	pub fn recv(&self) -> Option<&R> {
		match self.state {
			State::Suspended => self.context.recv(),
			_ => None,
		}
	}


	/// Set the value handed to the suspension point on the next step.
	pub fn send(&mut self, value: S) {
		self.context.send(value);
	}


	/// Arm cancellation. The next step unwinds through every pending cleanup.
	pub fn cancel(&mut self) {
		self.context.stop();
	}


	pub fn done(&self) -> bool {
		self.state == State::Done
	}


	pub fn state(&self) -> State {
		self.state
	}


	pub fn context(&self) -> &Context<R, S, V> {
		&self.context
	}


	/// Resume from a stack that was saved elsewhere.
	pub fn restore(&mut self, stack: Stack<V>) {
		self.context.replace_stack(stack);
		self.state = State::Suspended;
	}


	/// Compact the frame storage and return the stack, ready to be serialized.
	pub fn snapshot(&mut self) -> &Stack<V> {
		self.context.stack_mut().compact();
		self.context.stack()
	}
}


impl<R, S, V, E> Coroutine<R, S, V, E>
where
	V: Serialize + DeserializeOwned,
{
	pub fn marshal_append(&mut self, buffer: &mut Vec<u8>) -> Result<(), MarshalError> {
		self.snapshot().marshal_append(buffer)
	}


	pub fn unmarshal(&mut self, buffer: &[u8]) -> Result<usize, MarshalError> {
		let mut stack = Stack::default();
		let consumed = stack.unmarshal(buffer)?;
		self.restore(stack);
		Ok(consumed)
	}
}
