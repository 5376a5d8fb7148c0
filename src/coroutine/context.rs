use std::fmt::{self, Display};

use super::Stack;


/// The unwind signal. Raised by a suspension point to return control to the driver
/// through every enclosing activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unwind;


impl Display for Unwind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		"unwind".fmt(f)
	}
}


impl std::error::Error for Unwind { }


/// An error type that can carry the unwind signal.
pub trait Signal: From<Unwind> {
	fn is_unwind(&self) -> bool;
}


impl Signal for Unwind {
	fn is_unwind(&self) -> bool {
		true
	}
}


/// The coroutine context for the re-entrant model: the frame stack plus the values
/// exchanged at suspension points.
/// `R` is the type of yielded values, `S` the type of values sent on resume, and `V` the
/// type of values kept in frame storage.
#[derive(Debug)]
pub struct Context<R, S, V> {
	stack: Stack<V>,
	recv: Option<R>,
	send: Option<S>,
	stop: bool,
	unwinding: bool,
}


impl<R, S, V> Context<R, S, V>
where
	S: Default,
{
	/// Suspend, or complete a pending resume.
	/// When the current frame is resuming, the resume completes here and the sent value is
	/// returned, unless the coroutine was cancelled. Otherwise the value is stashed for the
	/// driver and the unwind signal is raised.
	pub fn yield_(&mut self, value: R) -> Result<S, Unwind> {
		let frame = self.stack.top_mut();

		if frame.resuming {
			frame.resuming = false;

			if self.stop {
				tracing::trace!(target: "coroutine", "suspension point cancelled");
				return Err(Unwind);
			}

			tracing::trace!(target: "coroutine", "suspension point resumed");
			Ok(self.send.take().unwrap_or_default())
		} else {
			frame.resuming = true;
			self.recv = Some(value);
			self.unwinding = true;

			tracing::trace!(target: "coroutine", fp = ?self.stack.fp(), "suspension point reached");
			Err(Unwind)
		}
	}
}


impl<R, S, V> Context<R, S, V> {
	pub fn stack(&self) -> &Stack<V> {
		&self.stack
	}


	pub fn stack_mut(&mut self) -> &mut Stack<V> {
		&mut self.stack
	}


	/// Whether the current exit is a suspension, in which case cleanups must save state
	/// instead of completing.
	pub fn unwinding(&self) -> bool {
		self.unwinding
	}


	/// Whether the coroutine was cancelled.
	pub fn stopping(&self) -> bool {
		self.stop
	}


	pub fn recv(&self) -> Option<&R> {
		self.recv.as_ref()
	}


	pub fn send(&mut self, value: S) {
		self.send = Some(value);
	}


	pub fn stop(&mut self) {
		self.stop = true;
	}


	pub(super) fn replace_stack(&mut self, stack: Stack<V>) {
		self.stack = stack;
	}


	/// Prepare for replaying from the entry point.
	pub(super) fn rewind(&mut self) {
		self.stack.rewind();
		self.unwinding = false;
	}
}


impl<R, S, V> Default for Context<R, S, V> {
	fn default() -> Self {
		Self {
			stack: Stack::default(),
			recv: None,
			send: None,
			stop: false,
			unwinding: false,
		}
	}
}
