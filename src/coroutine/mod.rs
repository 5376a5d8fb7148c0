//! Language independent coroutine machinery: the frame stack that lowered functions save
//! their state into, and the two drivers that run a coroutine body.

mod context;
mod frame;
pub mod handoff;
pub mod replay;
mod stack;
#[cfg(test)]
mod tests;

pub use context::{Context, Signal, Unwind};
pub use frame::{Frame, Storage};
pub use stack::{MarshalError, Stack};


/// The lifecycle of a coroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// Not yet stepped.
	Created,
	/// Stopped at a suspension point.
	Suspended,
	/// Currently inside a step.
	Running,
	/// Returned, failed or cancelled. Stepping a finished coroutine is a no-op.
	Done,
}
