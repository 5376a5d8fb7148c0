use std::{
	cell::RefCell,
	rc::Rc,
	sync::{Arc, Mutex},
};

use assert_matches::assert_matches;

use super::{handoff, replay, Context, Signal, Stack, State, Storage, Unwind};


#[derive(Debug, PartialEq)]
enum Failure {
	Unwind,
	Broken(&'static str),
}


impl From<Unwind> for Failure {
	fn from(_: Unwind) -> Self {
		Self::Unwind
	}
}


impl Signal for Failure {
	fn is_unwind(&self) -> bool {
		*self == Self::Unwind
	}
}


type Ctx = Context<i64, i64, i64>;


fn ip(context: &Ctx, fp: usize) -> u32 {
	context.stack().frame(fp).ip
}


fn set_ip(context: &mut Ctx, fp: usize, ip: u32) {
	context.stack_mut().frame_mut(fp).ip = ip;
}


/// A hand lowered generator:
/// `for i := 1; i <= 4; i++ { yield(i * i) }`
fn squares(context: &mut Ctx) -> Result<(), Unwind> {
	let fp = context.stack_mut().push();
	let mut i = 1;

	if ip(context, fp) > 0 {
		let storage = &context.stack().frame(fp).storage;
		if storage.has(0) {
			i = *storage.get(0);
		}
	}

	let result: Result<(), Unwind> = (|| {
		while i <= 4 {
			if ip(context, fp) < 2 {
				context.yield_(i * i)?;
				set_ip(context, fp, 2);
			}

			i += 1;
			set_ip(context, fp, 1);
		}

		Ok(())
	})();

	if result.is_err() && context.unwinding() {
		context.stack_mut().frame_mut(fp).storage.set(0, i);
	} else {
		context.stack_mut().pop();
	}

	result
}


/// Calls `squares` twice in sequence.
fn twice(context: &mut Ctx) -> Result<(), Unwind> {
	let fp = context.stack_mut().push();

	let result: Result<(), Unwind> = (|| {
		if ip(context, fp) < 2 {
			squares(context)?;
			set_ip(context, fp, 2);
		}

		squares(context)
	})();

	if !(result.is_err() && context.unwinding()) {
		context.stack_mut().pop();
	}

	result
}


fn collect<E: Signal + std::fmt::Debug>(coroutine: &mut replay::Coroutine<i64, i64, i64, E>) -> Vec<i64> {
	let mut values = Vec::new();

	while coroutine.step().expect("step failed") {
		values.push(*coroutine.recv().expect("missing yielded value"));
	}

	values
}


#[test]
fn test_stack_push_pop() {
	let mut stack: Stack<i64> = Stack::default();

	assert_eq!(stack.push(), 0);
	assert_eq!(stack.push(), 1);
	stack.top_mut().ip = 7;
	assert_eq!(stack.len(), 2);

	stack.pop();
	assert_eq!(stack.fp(), Some(0));
	stack.pop();
	assert_eq!(stack.fp(), None);
	assert!(stack.is_empty());
}


#[test]
fn test_stack_replay_reuses_frames() {
	let mut stack: Stack<i64> = Stack::default();

	stack.push();
	stack.push();
	stack.top_mut().ip = 3;
	stack.top_mut().storage.set(1, 42);

	stack.rewind();

	assert_eq!(stack.push(), 0);
	assert_eq!(stack.push(), 1);
	assert_eq!(stack.top().ip, 3);
	assert_eq!(stack.top().storage.get(1), &42);
	assert_eq!(stack.len(), 2);
}


#[test]
#[should_panic]
fn test_stack_pop_not_topmost() {
	let mut stack: Stack<i64> = Stack::default();

	stack.push();
	stack.push();
	stack.rewind();
	stack.push();

	stack.pop();
}


#[test]
#[should_panic]
fn test_stack_top_empty() {
	let stack: Stack<i64> = Stack::default();
	stack.top();
}


#[test]
#[should_panic]
fn test_storage_unset_slot() {
	let mut storage = Storage::default();
	storage.set(2, 1);
	storage.get(0);
}


#[test]
fn test_storage() {
	let mut storage = Storage::default();

	storage.set(3, "three");
	assert!(storage.has(3));
	assert!(!storage.has(0));
	assert!(!storage.has(10));
	assert_eq!(storage.len(), 4);

	storage.delete(3);
	assert!(!storage.has(3));
	assert_eq!(storage.len(), 4);

	storage.set(1, "one");
	storage.compact();
	assert_eq!(storage.len(), 2);
	assert_eq!(storage.get(1), &"one");
}


#[test]
fn test_stack_marshal() {
	let mut stack: Stack<i64> = Stack::default();
	stack.push();
	stack.top_mut().storage.set(2, -5);
	stack.top_mut().resuming = true;

	let mut buffer = b"prefix".to_vec();
	let start = buffer.len();
	stack.marshal_append(&mut buffer).expect("marshal failed");
	buffer.extend_from_slice(b"trailer");

	let mut restored: Stack<i64> = Stack::default();
	let consumed = restored.unmarshal(&buffer[start ..]).expect("unmarshal failed");

	assert_eq!(restored, stack);
	assert_eq!(&buffer[start + consumed ..], b"trailer");
}


#[test]
fn test_yield_protocol() {
	let mut context: Ctx = Context::default();

	context.stack_mut().push();
	assert_eq!(context.yield_(9), Err(Unwind));
	assert!(context.unwinding());
	assert_eq!(context.recv(), Some(&9));
	assert!(context.stack().top().resuming);

	context.rewind();
	context.stack_mut().push();
	context.send(4);
	assert_eq!(context.yield_(9), Ok(4));
	assert!(!context.stack().top().resuming);
}


#[test]
fn test_replay_squares() {
	let mut coroutine = replay::Coroutine::new(squares);

	assert_eq!(coroutine.state(), State::Created);
	assert_eq!(collect(&mut coroutine), vec![1, 4, 9, 16]);
	assert!(coroutine.done());
	assert!(!coroutine.step().expect("step failed"));
	assert!(coroutine.context().stack().is_empty());
}


#[test]
fn test_replay_squares_serialized() {
	let mut values = Vec::new();
	let mut buffer = Vec::new();

	loop {
		let mut coroutine = replay::Coroutine::new(squares);

		if !buffer.is_empty() {
			coroutine.unmarshal(&buffer).expect("unmarshal failed");
		}

		if !coroutine.step().expect("step failed") {
			break;
		}

		values.push(*coroutine.recv().expect("missing yielded value"));

		buffer.clear();
		coroutine.marshal_append(&mut buffer).expect("marshal failed");
	}

	assert_eq!(values, vec![1, 4, 9, 16]);
}


#[test]
fn test_replay_frames_do_not_bleed() {
	let mut coroutine = replay::Coroutine::new(twice);
	assert_eq!(collect(&mut coroutine), vec![1, 4, 9, 16, 1, 4, 9, 16]);
}


#[test]
fn test_replay_send() {
	let mut coroutine = replay::Coroutine::new(
		|context: &mut Ctx| -> Result<(), Unwind> {
			let fp = context.stack_mut().push();

			let result: Result<(), Unwind> = (|| {
				let mut total = 0;
				if ip(context, fp) > 0 {
					total = *context.stack().frame(fp).storage.get(0);
				}

				if ip(context, fp) < 2 {
					total += context.yield_(0)?;
					context.stack_mut().frame_mut(fp).storage.set(0, total);
					set_ip(context, fp, 2);
				}

				context.yield_(total * 10)?;
				Ok(())
			})();

			if !(result.is_err() && context.unwinding()) {
				context.stack_mut().pop();
			}

			result
		}
	);

	assert!(coroutine.step().expect("step failed"));
	assert_eq!(coroutine.recv(), Some(&0));

	coroutine.send(7);
	assert!(coroutine.step().expect("step failed"));
	assert_eq!(coroutine.recv(), Some(&70));

	assert!(!coroutine.step().expect("step failed"));
}


#[test]
fn test_replay_cancel_runs_cleanups_innermost_first() {
	let log = Rc::new(RefCell::new(Vec::new()));

	fn level(context: &mut Ctx, depth: u32, log: &Rc<RefCell<Vec<u32>>>) -> Result<(), Unwind> {
		context.stack_mut().push();

		let result =
			if depth == 0 {
				context.yield_(1).map(|_| ())
			} else {
				level(context, depth - 1, log)
			};

		if !(result.is_err() && context.unwinding()) {
			log.borrow_mut().push(depth);
			context.stack_mut().pop();
		}

		result
	}

	let entry_log = log.clone();
	let mut coroutine = replay::Coroutine::new(
		move |context: &mut Ctx| level(context, 2, &entry_log)
	);

	assert!(coroutine.step().expect("step failed"));
	assert!(log.borrow().is_empty());

	coroutine.cancel();
	coroutine.cancel();

	assert!(!coroutine.step().expect("step failed"));
	assert!(coroutine.done());
	assert_eq!(*log.borrow(), vec![0, 1, 2]);

	assert!(!coroutine.step().expect("step failed"));
	assert_eq!(log.borrow().len(), 3);
}


#[test]
fn test_replay_cancel_before_start() {
	let mut coroutine = replay::Coroutine::new(squares);
	coroutine.cancel();

	assert!(!coroutine.step().expect("step failed"));
	assert!(coroutine.done());
}


#[test]
fn test_replay_failure() {
	let mut coroutine = replay::Coroutine::new(
		|context: &mut Context<i64, i64, i64>| -> Result<(), Failure> {
			context.stack_mut().push();
			Err(Failure::Broken("boom"))
		}
	);

	assert_matches!(coroutine.step(), Err(Failure::Broken("boom")));
	assert!(coroutine.done());
}


#[test]
fn test_handoff_squares() {
	let mut coroutine = handoff::Coroutine::new(
		|yielder: &handoff::Yielder<i64, i64>| -> Result<(), Unwind> {
			for i in 1 ..= 4 {
				yielder.yield_(i * i)?;
			}
			Ok(())
		}
	);

	let mut values = Vec::new();
	while coroutine.step().expect("step failed") {
		values.push(*coroutine.recv().expect("missing yielded value"));
	}

	assert_eq!(values, vec![1, 4, 9, 16]);
	assert!(coroutine.done());
}


#[test]
fn test_handoff_send_and_cancel() {
	let cleanups = Arc::new(Mutex::new(0));
	let body_cleanups = cleanups.clone();

	let mut coroutine = handoff::Coroutine::new(
		move |yielder: &handoff::Yielder<i64, i64>| -> Result<(), Unwind> {
			let mut total = 0;

			let result: Result<(), Unwind> = (|| loop {
				total += yielder.yield_(total)?;
			})();

			*body_cleanups.lock().expect("poisoned lock") += 1;

			result
		}
	);

	assert!(coroutine.step().expect("step failed"));
	assert_eq!(coroutine.recv(), Some(&0));

	coroutine.send(5);
	assert!(coroutine.step().expect("step failed"));
	assert_eq!(coroutine.recv(), Some(&5));

	coroutine.cancel();
	assert!(!coroutine.step().expect("step failed"));
	assert!(coroutine.done());
	assert_eq!(*cleanups.lock().expect("poisoned lock"), 1);
}


#[test]
fn test_handoff_failure() {
	let mut coroutine = handoff::Coroutine::new(
		|yielder: &handoff::Yielder<i64, i64>| -> Result<(), Failure> {
			yielder.yield_(1)?;
			Err(Failure::Broken("late"))
		}
	);

	assert!(coroutine.step().expect("step failed"));
	assert_matches!(coroutine.step(), Err(Failure::Broken("late")));
	assert!(coroutine.done());
}


#[test]
fn test_handoff_drop_while_suspended() {
	let cleanups = Arc::new(Mutex::new(0));
	let body_cleanups = cleanups.clone();

	{
		let mut coroutine = handoff::Coroutine::new(
			move |yielder: &handoff::Yielder<i64, i64>| -> Result<(), Unwind> {
				let result = yielder.yield_(1).map(|_| ());
				*body_cleanups.lock().expect("poisoned lock") += 1;
				result
			}
		);

		assert!(coroutine.step().expect("step failed"));
	}

	assert_eq!(*cleanups.lock().expect("poisoned lock"), 1);
}
