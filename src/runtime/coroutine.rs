//! Coroutines over functions of a program, with either driver. Values cross the driver
//! boundary in their plain form, so that both drivers expose the same interface.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
	coroutine::{handoff, replay, Context, MarshalError, Stack, State},
	semantic::program::{FnId, Program},
};
use super::{
	value::{Freezer, Snapshot, Thawer, Value},
	Mode,
	Options,
	Panic,
	Runtime,
	SourcePos,
};


/// The operations shared by both drivers.
pub trait Driver {
	/// Run until the next suspension point or until the function returns.
	/// Returns whether a new value was yielded.
	fn step(&mut self) -> Result<bool, Panic>;

	/// The last yielded value.
	fn recv(&self) -> Option<Snapshot>;

	/// Set the value to be returned by the pending suspension point on the next step.
	fn send(&mut self, value: Snapshot) -> Result<(), MarshalError>;

	/// Request cancellation. The next step unwinds the function, running deferred calls.
	fn cancel(&mut self);

	fn done(&self) -> bool;

	fn state(&self) -> State;
}


#[cfg(not(feature = "handoff"))]
pub type Coroutine = Replay;

#[cfg(feature = "handoff")]
pub type Coroutine = Handoff;


/// A coroutine of the model selected at build time, over the program form it runs.
#[cfg(not(feature = "handoff"))]
pub fn spawn(
	_original: &Arc<Program>,
	lowered: &Arc<Program>,
	entry: FnId,
	args: Vec<Snapshot>,
	options: Options,
) -> Coroutine {
	Replay::new(lowered.clone(), entry, args, options)
}


/// A coroutine of the model selected at build time, over the program form it runs.
#[cfg(feature = "handoff")]
pub fn spawn(
	original: &Arc<Program>,
	_lowered: &Arc<Program>,
	entry: FnId,
	args: Vec<Snapshot>,
	options: Options,
) -> Coroutine {
	Handoff::new(original.clone(), entry, args, options)
}


/// A lowered function driven by re-entry.
pub struct Replay {
	program: Arc<Program>,
	coroutine: replay::Coroutine<Value, Value, Value, Panic>,
}


impl Replay {
	/// The program must be lowered.
	pub fn new(program: Arc<Program>, entry: FnId, args: Vec<Snapshot>, options: Options) -> Self {
		let shared = program.clone();
		let mut rng = ChaCha8Rng::seed_from_u64(options.seed);

		let coroutine = replay::Coroutine::new(
			move |context: &mut Context<Value, Value, Value>| -> Result<(), Panic> {
				let function = shared.function(entry);
				let pos = SourcePos::new(function.pos, &function.path);

				// Arguments are fresh on every step, as the entry is called again.
				let mut thawer = Thawer::new(shared.functions.len());
				let mut values = Vec::with_capacity(args.len());
				for arg in args.iter() {
					values.push(thawer.thaw(arg.clone())?);
				}

				let mut runtime = Runtime::new(&shared, Mode::Replay(context), &mut rng, &options);
				runtime.call(entry, values, pos)?;

				Ok(())
			}
		);

		Self { program, coroutine }
	}


	/// The number of live frames.
	pub fn depth(&self) -> usize {
		self.coroutine.context().stack().len()
	}


	/// Append the serialized frame stack to the buffer. Values shared between frames stay
	/// shared.
	pub fn marshal_append(&mut self, buffer: &mut Vec<u8>) -> Result<(), MarshalError> {
		let mut freezer = Freezer::default();

		self.coroutine
			.snapshot()
			.map(|value| freezer.freeze(value))
			.marshal_append(buffer)
	}


	/// Restore the frame stack from a serialized one, returning the number of bytes read.
	/// The coroutine must be built over the same program and entry that produced it.
	pub fn unmarshal(&mut self, buffer: &[u8]) -> Result<usize, MarshalError> {
		let mut stack: Stack<Snapshot> = Stack::default();
		let read = stack.unmarshal(buffer)?;

		let mut thawer = Thawer::new(self.program.functions.len());
		let stack = stack.try_map(|snapshot| thawer.thaw(snapshot))?;

		self.coroutine.restore(stack);

		Ok(read)
	}
}


impl Driver for Replay {
	fn step(&mut self) -> Result<bool, Panic> {
		self.coroutine.step()
	}


	fn recv(&self) -> Option<Snapshot> {
		self.coroutine.recv().map(Snapshot::of)
	}


	fn send(&mut self, value: Snapshot) -> Result<(), MarshalError> {
		let value = Thawer::new(self.program.functions.len()).thaw(value)?;
		self.coroutine.send(value);
		Ok(())
	}


	fn cancel(&mut self) {
		self.coroutine.cancel()
	}


	fn done(&self) -> bool {
		self.coroutine.done()
	}


	fn state(&self) -> State {
		self.coroutine.state()
	}
}


/// A function of the original program, running on its own thread.
pub struct Handoff {
	coroutine: handoff::Coroutine<Snapshot, Snapshot, Panic>,
}


impl Handoff {
	pub fn new(program: Arc<Program>, entry: FnId, args: Vec<Snapshot>, options: Options) -> Self {
		let coroutine = handoff::Coroutine::new(
			move |yielder: &handoff::Yielder<Snapshot, Snapshot>| -> Result<(), Panic> {
				let function = program.function(entry);
				let pos = SourcePos::new(function.pos, &function.path);

				let mut thawer = Thawer::new(program.functions.len());
				let mut values = Vec::with_capacity(args.len());
				for arg in args {
					values.push(thawer.thaw(arg)?);
				}

				let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
				let mut runtime = Runtime::new(&program, Mode::Handoff(yielder), &mut rng, &options);
				runtime.call(entry, values, pos)?;

				Ok(())
			}
		);

		Self { coroutine }
	}
}


impl Driver for Handoff {
	fn step(&mut self) -> Result<bool, Panic> {
		self.coroutine.step()
	}


	fn recv(&self) -> Option<Snapshot> {
		self.coroutine.recv().cloned()
	}


	fn send(&mut self, value: Snapshot) -> Result<(), MarshalError> {
		self.coroutine.send(value);
		Ok(())
	}


	fn cancel(&mut self) {
		self.coroutine.cancel()
	}


	fn done(&self) -> bool {
		self.coroutine.done()
	}


	fn state(&self) -> State {
		self.coroutine.state()
	}
}
