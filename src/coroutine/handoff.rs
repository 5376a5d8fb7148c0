//! The thread handoff driver: the body runs on its own thread and trades control with the
//! driver over rendezvous channels, so exactly one side runs at a time.
//! No frame bookkeeping is needed because the thread keeps the call stack alive, but the
//! state cannot be serialized.

use std::{
	sync::mpsc::{self, Receiver, SyncSender},
	thread::{self, JoinHandle},
};

use super::{Signal, State, Unwind};


/// Messages from the driver to the body.
#[derive(Debug)]
enum Command<S> {
	Resume(Option<S>),
	Stop,
}


/// Messages from the body to the driver.
#[derive(Debug)]
enum Event<R> {
	Yield(R),
	Done,
}


/// The body side of the handoff.
#[derive(Debug)]
pub struct Yielder<R, S> {
	commands: Receiver<Command<S>>,
	events: SyncSender<Event<R>>,
}


impl<R, S> Yielder<R, S>
where
	S: Default,
{
	/// Hand the value to the driver and block until the next step.
	/// A cancelled or dropped driver raises the unwind signal.
	pub fn yield_(&self, value: R) -> Result<S, Unwind> {
		self.events
			.send(Event::Yield(value))
			.map_err(|_| Unwind)?;

		match self.commands.recv() {
			Ok(Command::Resume(value)) => Ok(value.unwrap_or_default()),
			Ok(Command::Stop) | Err(_) => Err(Unwind),
		}
	}
}


pub struct Coroutine<R, S, E> {
	commands: SyncSender<Command<S>>,
	events: Receiver<Event<R>>,
	thread: Option<JoinHandle<Result<(), E>>>,
	recv: Option<R>,
	send: Option<S>,
	stop: bool,
	state: State,
}


impl<R, S, E> Coroutine<R, S, E>
where
	R: Send + 'static,
	S: Send + Default + 'static,
	E: Signal + Send + 'static,
{
	/// Spawn the body thread. The body does not run before the first step.
	pub fn new<F>(body: F) -> Self
	where
		F: FnOnce(&Yielder<R, S>) -> Result<(), E> + Send + 'static,
	{
		let (commands, commands_rx) = mpsc::sync_channel(0);
		let (events_tx, events) = mpsc::sync_channel(0);

		let thread = thread::spawn(
			move || {
				match commands_rx.recv() {
					Ok(Command::Resume(_)) => (),
					Ok(Command::Stop) | Err(_) => return Ok(()),
				}

				let yielder = Yielder { commands: commands_rx, events: events_tx };
				let result = body(&yielder);

				// The driver may be gone already.
				let _ = yielder.events.send(Event::Done);

				result
			}
		);

		Self {
			commands,
			events,
			thread: Some(thread),
			recv: None,
			send: None,
			stop: false,
			state: State::Created,
		}
	}


	/// Unblock the body and wait until it yields or finishes.
	/// Returns whether a new value was yielded.
	pub fn step(&mut self) -> Result<bool, E> {
		if self.state == State::Done {
			return Ok(false);
		}

		let command =
			if self.stop {
				Command::Stop
			} else {
				Command::Resume(self.send.take())
			};

		self.state = State::Running;
		self.recv = None;

		if self.commands.send(command).is_err() {
			return self.finish();
		}

		match self.events.recv() {
			Ok(Event::Yield(value)) => {
				tracing::debug!(target: "coroutine", "handoff suspended");
				self.recv = Some(value);
				self.state = State::Suspended;
				Ok(true)
			}

			Ok(Event::Done) | Err(_) => self.finish(),
		}
	}


	/// Join the body thread and report its outcome.
	fn finish(&mut self) -> Result<bool, E> {
		self.state = State::Done;

		let thread = match self.thread.take() {
			Some(thread) => thread,
			None => return Ok(false),
		};

		match thread.join() {
			Ok(Ok(())) => Ok(false),
			Ok(Err(error)) if error.is_unwind() => {
				tracing::debug!(target: "coroutine", "handoff cancelled");
				Ok(false)
			}
			Ok(Err(error)) => Err(error),
			Err(payload) => std::panic::resume_unwind(payload),
		}
	}
}


impl<R, S, E> Coroutine<R, S, E> {
	pub fn recv(&self) -> Option<&R> {
		self.recv.as_ref()
	}


	pub fn send(&mut self, value: S) {
		self.send = Some(value);
	}


	pub fn cancel(&mut self) {
		self.stop = true;
	}


	pub fn done(&self) -> bool {
		self.state == State::Done
	}


	pub fn state(&self) -> State {
		self.state
	}
}


impl<R, S, E> Drop for Coroutine<R, S, E> {
	fn drop(&mut self) {
		if let Some(thread) = self.thread.take() {
			// The body is parked waiting for a command. Stop it until it finishes, and ignore
			// send failures, which mean it already did.
			let _ = self.commands.send(Command::Stop);

			while let Ok(Event::Yield(_)) = self.events.recv() {
				let _ = self.commands.send(Command::Stop);
			}

			let _ = thread.join();
		}
	}
}
