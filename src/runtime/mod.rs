//! The interpreter. Programs run either before lowering, suspending through the thread
//! handoff driver, or after lowering, with lowered functions keeping their state in the
//! frames of the replay driver's context.

mod coroutine;
mod flow;
pub mod lib;
mod panic;
mod source;
#[cfg(test)]
mod tests;
pub mod value;

use std::{
	cmp::Ordering,
	collections::HashMap,
	io::{self, Write},
};
#[cfg(test)]
use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
	coroutine::{handoff::Yielder, Context, Stack},
	semantic::program::{
		BinaryOp,
		Block,
		Callee,
		Comm,
		Expr,
		FnId,
		FrameOp,
		Function,
		Guards,
		LabelId,
		Literal,
		LocalKind,
		Place,
		Program,
		ReceiveTarget,
		SelectCase,
		Statement,
		SwitchCase,
		SwitchTag,
		Type,
		UnaryOp,
		VarId,
	},
	syntax,
};
pub use coroutine::{spawn, Driver, Handoff, Replay};
pub use panic::Panic;
pub use source::SourcePos;
pub use value::{Snapshot, Value};
use flow::Flow;
use value::{Array, Channel, ChannelError, Deferred, Dict, Float, Thawer};


/// Where the output of the print builtins goes.
#[derive(Debug, Clone)]
pub enum Output {
	Stdout,
	/// A shared buffer, for tests that inspect the output.
	#[cfg(test)]
	Buffer(Arc<Mutex<Vec<u8>>>),
}


impl Output {
	pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
		match self {
			Self::Stdout => {
				let stdout = io::stdout();
				let mut stdout = stdout.lock();
				stdout.write_all(bytes)?;
				stdout.flush()
			}

			#[cfg(test)]
			Self::Buffer(buffer) => {
				buffer
					.lock()
					.map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned output buffer"))?
					.extend_from_slice(bytes);

				Ok(())
			}
		}
	}
}


#[derive(Debug, Clone)]
pub struct Options {
	pub output: Output,
	/// Seed for the choice among ready select cases.
	pub seed: u64,
	/// The maximum depth of nested calls.
	pub max_depth: usize,
}


#[cfg(test)]
impl Options {
	/// Options that write to a fresh buffer, which is also returned.
	pub fn buffered() -> (Self, Arc<Mutex<Vec<u8>>>) {
		let buffer = Arc::new(Mutex::new(Vec::new()));

		let options = Self {
			output: Output::Buffer(buffer.clone()),
			..Self::default()
		};

		(options, buffer)
	}
}


impl Default for Options {
	fn default() -> Self {
		Self {
			output: Output::Stdout,
			seed: 0,
			max_depth: 256,
		}
	}
}


/// How suspension points are executed.
pub enum Mode<'a> {
	/// Outside any coroutine: suspension points panic.
	Plain,
	/// Lowered code under the replay driver.
	Replay(&'a mut Context<Value, Value, Value>),
	/// Original code on the thread of a handoff coroutine.
	Handoff(&'a Yielder<Snapshot, Snapshot>),
}


/// The state of a single function call.
struct Activation<'p> {
	function: &'p Function,
	locals: Vec<Value>,
	/// The frame index, once a lowered function pushed it.
	fp: Option<usize>,
	/// Deferred calls of functions that were not lowered.
	defers: Vec<Deferred>,
}


impl<'p> Activation<'p> {
	fn get(&self, var: VarId) -> Value {
		self.locals[var.0 as usize].copy()
	}


	fn set(&mut self, var: VarId, value: Value) {
		self.locals[var.0 as usize] = value;
	}


	fn pos(&self, pos: syntax::SourcePos) -> SourcePos {
		SourcePos::new(pos, &self.function.path)
	}


	fn fp(&self) -> usize {
		self.fp.expect("frame operation before push")
	}
}


/// The arguments and environment of a builtin call.
pub struct CallContext<'r, 'a> {
	pub runtime: &'r mut Runtime<'a>,
	pub args_start: usize,
	pub pos: SourcePos,
}


impl<'r, 'a> CallContext<'r, 'a> {
	pub fn args(&self) -> &[Value] {
		&self.runtime.arguments[self.args_start ..]
	}


	pub fn args_mut(&mut self) -> &mut [Value] {
		&mut self.runtime.arguments[self.args_start ..]
	}


	/// Write to the configured output.
	pub fn write(&mut self, bytes: &[u8]) -> Result<(), Panic> {
		self.runtime.options.output
			.write(bytes)
			.map_err(|error| Panic::io(error, self.pos.clone()))
	}
}


pub struct Runtime<'a> {
	program: &'a Program,
	mode: Mode<'a>,
	rng: &'a mut ChaCha8Rng,
	options: &'a Options,
	/// Arguments of builtin calls.
	arguments: Vec<Value>,
	depth: usize,
}


/// Run a function outside any coroutine.
pub fn run(program: &Program, entry: FnId, args: Vec<Value>, options: &Options) -> Result<Value, Panic> {
	let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
	let function = program.function(entry);
	let pos = SourcePos::new(function.pos, &function.path);

	Runtime::new(program, Mode::Plain, &mut rng, options).call(entry, args, pos)
}


impl<'a> Runtime<'a> {
	pub fn new(
		program: &'a Program,
		mode: Mode<'a>,
		rng: &'a mut ChaCha8Rng,
		options: &'a Options,
	) -> Self {
		Self {
			program,
			mode,
			rng,
			options,
			arguments: Vec::new(),
			depth: 0,
		}
	}


	/// Call a function of the program.
	pub fn call(&mut self, id: FnId, args: Vec<Value>, pos: SourcePos) -> Result<Value, Panic> {
		let program = self.program;
		let function = program.function(id);

		if args.len() != function.params as usize {
			return Err(Panic::invalid_args(args.len() as u32, function.params, pos));
		}

		if self.depth >= self.options.max_depth {
			return Err(Panic::stack_overflow(pos));
		}

		let mut locals = args;
		locals.resize_with(function.locals.len(), Value::default);

		let mut activation = Activation {
			function,
			locals,
			fp: None,
			defers: Vec::new(),
		};

		self.depth += 1;
		let result = self.exec_block(&function.body, &mut activation);
		let result = self.run_defers(result, &mut activation);
		self.depth -= 1;

		match result? {
			Flow::Regular => Ok(Value::Nil),
			Flow::Return(value) => Ok(value),
			flow => panic!("invalid flow at function exit: {:?}", flow),
		}
	}


	/// Run the deferred calls of an activation, last first. Deferred calls run when the
	/// function returns or unwinds, but not when it panics.
	fn run_defers(
		&mut self,
		result: Result<Flow, Panic>,
		activation: &mut Activation<'a>,
	) -> Result<Flow, Panic> {
		match result {
			Ok(_) | Err(Panic::Unwind) => {
				let pos = activation.pos(activation.function.pos);

				while let Some(deferred) = activation.defers.pop() {
					self.call_deferred(&deferred, pos.clone())?;
				}

				result
			}

			Err(panic) => Err(panic),
		}
	}


	fn call_deferred(&mut self, deferred: &Deferred, pos: SourcePos) -> Result<Value, Panic> {
		let args = deferred
			.args()
			.iter()
			.map(Value::copy)
			.collect();

		self.call_callee(deferred.callee(), args, pos)
	}


	fn call_callee(&mut self, callee: Callee, args: Vec<Value>, pos: SourcePos) -> Result<Value, Panic> {
		match callee {
			Callee::Function(id) => self.call(id, args, pos),

			Callee::Builtin(name) => {
				let builtin = lib::get(name).expect("unregistered builtin");

				let args_start = self.arguments.len();
				self.arguments.extend(args);

				let result = builtin.call(CallContext { runtime: self, args_start, pos });

				self.arguments.truncate(args_start);

				result
			}
		}
	}


	fn exec_block(&mut self, block: &'a Block, activation: &mut Activation<'a>) -> Result<Flow, Panic> {
		for statement in block.0.iter() {
			match self.exec(statement, activation)? {
				Flow::Regular => (),
				flow => return Ok(flow),
			}
		}

		Ok(Flow::Regular)
	}


	fn exec(&mut self, statement: &'a Statement, activation: &mut Activation<'a>) -> Result<Flow, Panic> {
		let function: &'a Function = activation.function;

		match statement {
			// Block.
			Statement::Block(block) => self.exec_block(block, activation),

			// Variable declaration.
			Statement::Declare { var, init, .. } => {
				let value = match init {
					Some(init) => self.eval(init, activation)?,
					None => zero(&function.local(*var).ty),
				};

				activation.set(*var, value);

				Ok(Flow::Regular)
			}

			// Constant declaration.
			Statement::Const { var, .. } => {
				let value = match &function.local(*var).kind {
					LocalKind::Const(literal) => self.literal(literal, activation)?,
					kind => panic!("constant declaration of {:?}", kind),
				};

				activation.set(*var, value);

				Ok(Flow::Regular)
			}

			// Types have no runtime representation.
			Statement::Type { .. } => Ok(Flow::Regular),

			// Assignment.
			Statement::Assign { place, value, pos } => {
				match place {
					Place::Variable(var) => {
						let value = self.eval(value, activation)?;
						activation.set(*var, value);
					}

					Place::Index { object, index } => {
						let object = self.eval(object, activation)?;
						let index = self.eval(index, activation)?;
						let value = self.eval(value, activation)?;

						store(object, index, value, activation.pos(*pos))?;
					}
				}

				Ok(Flow::Regular)
			}

			// Channel send.
			Statement::Send { channel, value, pos } => {
				let channel = self.eval(channel, activation)?;
				let value = self.eval(value, activation)?;

				send(channel, value, activation.pos(*pos))?;

				Ok(Flow::Regular)
			}

			// Expression statement.
			Statement::Expr(expr) => {
				self.eval(expr, activation)?;
				Ok(Flow::Regular)
			}

			// If.
			Statement::If { init, condition, then, otherwise, .. } => {
				if let Some(init) = init {
					self.exec(init, activation)?;
				}

				if self.condition(condition, activation)? {
					self.exec_block(then, activation)
				} else {
					self.exec_block(otherwise, activation)
				}
			}

			// For.
			Statement::For { label, init, condition, post, body, .. } => {
				if let Some(init) = init {
					self.exec(init, activation)?;
				}

				loop {
					if let Some(condition) = condition {
						if !self.condition(condition, activation)? {
							break;
						}
					}

					match self.exec_block(body, activation)? {
						Flow::Regular => (),
						Flow::Break(target) if targets(*label, target) => break,
						Flow::Continue(target) if targets(*label, target) => (),
						flow => return Ok(flow),
					}

					if let Some(post) = post {
						self.exec(post, activation)?;
					}
				}

				Ok(Flow::Regular)
			}

			// Range.
			Statement::Range { label, key, value, expr, body, pos, .. } => {
				let collection = self.eval(expr, activation)?;
				let pos = activation.pos(*pos);
				self.range(*label, *key, *value, collection, body, pos, activation)
			}

			// Switch.
			Statement::Switch { label, init, tag, cases, .. } => {
				if let Some(init) = init {
					self.exec(init, activation)?;
				}

				self.switch(*label, tag, cases, activation)
			}

			// Select.
			Statement::Select { label, cases, pos } => {
				let pos = activation.pos(*pos);
				self.select(*label, cases, pos, activation)
			}

			// Branch.
			Statement::Branch { label, selector, arms, pos } => {
				let arm = match self.eval(selector, activation)? {
					Value::Int(ix) if ix >= 0 && (ix as usize) < arms.len() => &arms[ix as usize],
					Value::Int(_) => return Ok(Flow::Regular),
					value => return Err(Panic::invalid_operand(&value, activation.pos(*pos))),
				};

				match self.exec_block(arm, activation)? {
					Flow::Break(target) if targets(*label, target) => Ok(Flow::Regular),
					flow => Ok(flow),
				}
			}

			Statement::Break { label, .. } => Ok(Flow::Break(*label)),

			Statement::Continue { label, .. } => Ok(Flow::Continue(*label)),

			Statement::Fallthrough { .. } => Ok(Flow::Fallthrough),

			// Return.
			Statement::Return { value, .. } => {
				let value = match value {
					Some(value) => self.eval(value, activation)?,
					None => Value::Nil,
				};

				Ok(Flow::Return(value))
			}

			// Defer.
			Statement::Defer { call, .. } => {
				let deferred = self.defer(call, activation)?;
				activation.defers.push(deferred);

				Ok(Flow::Regular)
			}

			Statement::Frame(op) => {
				self.frame(op, activation)?;
				Ok(Flow::Regular)
			}

			// Dispatch.
			Statement::Dispatch(arms) => {
				let fp = activation.fp();
				let last = arms.len().saturating_sub(1);

				for (ix, (end, statement)) in arms.iter().enumerate() {
					if self.stack().frame(fp).ip >= *end {
						continue;
					}

					match self.exec(statement, activation)? {
						Flow::Regular => (),
						flow => return Ok(flow),
					}

					if ix != last {
						self.stack().frame_mut(fp).ip = *end;
					}
				}

				Ok(Flow::Regular)
			}

			// Scoped.
			Statement::Scoped { body, unwind, complete } => {
				let result = self.exec_block(body, activation);

				match result {
					Err(Panic::Unwind) if self.suspending() => {
						self.exec_block(unwind, activation)?;
						result
					}

					Ok(_) | Err(Panic::Unwind) => {
						self.exec_block(complete, activation)?;
						result
					}

					Err(panic) => Err(panic),
				}
			}
		}
	}


	fn frame(&mut self, op: &'a FrameOp, activation: &mut Activation<'a>) -> Result<(), Panic> {
		match op {
			FrameOp::Push => {
				let fp = match &mut self.mode {
					Mode::Replay(context) => context.stack_mut().push(),
					_ => return Err(
						Panic::YieldOutsideCoroutine { pos: activation.pos(activation.function.pos) }
					),
				};

				activation.fp = Some(fp);
			}

			FrameOp::Pop => {
				self.stack().pop();
				activation.fp = None;
			}

			FrameOp::SetIp(ip) => {
				let fp = activation.fp();
				self.stack().frame_mut(fp).ip = *ip;
			}

			FrameOp::Save { slot, var } => {
				let fp = activation.fp();
				let value = activation.get(*var);
				self.stack().frame_mut(fp).storage.set(*slot as usize, value);
			}

			FrameOp::Restore { slot, var } => {
				let fp = activation.fp();
				let storage = &self.stack().frame(fp).storage;

				if storage.has(*slot as usize) {
					let value = storage.get(*slot as usize).copy();
					activation.set(*var, value);
				}
			}

			FrameOp::Defer { list, call } => {
				let deferred = self.defer(call, activation)?;

				match &activation.get(*list) {
					Value::Array(array) => array.push(deferred.into()),
					value => panic!("defer list is not an array: {}", value),
				}
			}

			FrameOp::RunDefers { list } => {
				let pos = activation.pos(activation.function.pos);

				if let Value::Array(array) = &activation.get(*list) {
					while let Some(deferred) = array.pop() {
						match &deferred {
							Value::Deferred(deferred) => { self.call_deferred(deferred, pos.clone())?; }
							value => panic!("invalid deferred call: {}", value),
						}
					}
				}
			}
		}

		Ok(())
	}


	/// The frame stack. Only valid for lowered code under the replay driver.
	fn stack(&mut self) -> &mut Stack<Value> {
		match &mut self.mode {
			Mode::Replay(context) => context.stack_mut(),
			_ => panic!("frame operation outside the replay driver"),
		}
	}


	/// Whether the coroutine is suspending, as opposed to being cancelled.
	fn suspending(&self) -> bool {
		match &self.mode {
			Mode::Replay(context) => context.unwinding() && !context.stopping(),
			_ => false,
		}
	}


	/// Evaluate the operands of a deferred call.
	fn defer(&mut self, call: &'a Expr, activation: &mut Activation<'a>) -> Result<Deferred, Panic> {
		match call {
			Expr::Call { callee, args, .. } => {
				let mut values = Vec::with_capacity(args.len());

				for arg in args.iter() {
					values.push(self.eval(arg, activation)?);
				}

				Ok(Deferred::new(*callee, values))
			}

			expr => panic!("deferred expression is not a call: {:?}", expr),
		}
	}


	#[allow(clippy::too_many_arguments)]
	fn range(
		&mut self,
		label: Option<LabelId>,
		key: Option<VarId>,
		value: Option<VarId>,
		collection: Value,
		body: &'a Block,
		pos: SourcePos,
		activation: &mut Activation<'a>,
	) -> Result<Flow, Panic> {
		// Keys are taken upfront, and deleted keys are skipped.
		let keys = match &collection {
			Value::Dict(dict) => dict.keys(),
			_ => Vec::new(),
		};

		let mut index: i64 = 0;

		loop {
			let (item_key, item_value) = match &collection {
				// Array.
				Value::Array(array) => {
					if index >= array.len() {
						break;
					}

					let item = array
						.index(index)
						.map_err(|_| Panic::index_out_of_bounds(&Value::Int(index), pos.clone()))?;

					(Value::Int(index), item)
				}

				// String.
				Value::String(string) => {
					if index >= string.len() as i64 {
						break;
					}

					let item = string
						.index(index)
						.map_err(|_| Panic::index_out_of_bounds(&Value::Int(index), pos.clone()))?;

					(Value::Int(index), item)
				}

				// Int.
				Value::Int(count) => {
					if index >= *count {
						break;
					}

					(Value::Int(index), Value::Nil)
				}

				// Dict.
				Value::Dict(dict) => {
					let key = match keys.get(index as usize) {
						Some(key) => key.copy(),
						None => break,
					};

					match dict.get(&key) {
						Some(item) => (key, item),
						None => {
							index += 1;
							continue;
						}
					}
				}

				// Channel.
				Value::Channel(channel) => match channel.receive() {
					Ok(Some(item)) => (item, Value::Nil),
					Ok(None) => break,
					Err(_) => return Err(Panic::blocked(pos)),
				},

				Value::Nil => break,

				other => return Err(Panic::invalid_operand(other, pos)),
			};

			index += 1;

			if let Some(key) = key {
				activation.set(key, item_key);
			}

			if let Some(value) = value {
				activation.set(value, item_value);
			}

			match self.exec_block(body, activation)? {
				Flow::Regular => (),
				Flow::Break(target) if targets(label, target) => break,
				Flow::Continue(target) if targets(label, target) => (),
				flow => return Ok(flow),
			}
		}

		Ok(Flow::Regular)
	}


	fn switch(
		&mut self,
		label: Option<LabelId>,
		tag: &'a SwitchTag,
		cases: &'a [SwitchCase],
		activation: &mut Activation<'a>,
	) -> Result<Flow, Panic> {
		let (tag, binding) = match tag {
			SwitchTag::None => (None, None),
			SwitchTag::Value(expr) => (Some(self.eval(expr, activation)?), None),
			SwitchTag::Type { binding, expr } => (Some(self.eval(expr, activation)?), *binding),
		};

		let mut selected = None;
		let mut default = None;

		'cases: for (ix, case) in cases.iter().enumerate() {
			match &case.guards {
				Guards::Default => default = Some(ix),

				Guards::Values(guards) => {
					for guard in guards.iter() {
						let matches = match &tag {
							Some(tag) => {
								let guard = self.eval(guard, activation)?;
								equals(tag, &guard)
							}

							None => self.condition(guard, activation)?,
						};

						if matches {
							selected = Some(ix);
							break 'cases;
						}
					}
				}

				Guards::Types(types) => {
					let tag = tag.as_ref().expect("type switch without tag");

					if types.iter().any(|ty| tag.has_type(ty)) {
						selected = Some(ix);
						break 'cases;
					}
				}
			}
		}

		let mut ix = match selected.or(default) {
			Some(ix) => ix,
			None => return Ok(Flow::Regular),
		};

		loop {
			if let (Some(binding), Some(tag)) = (binding, &tag) {
				activation.set(binding, tag.copy());
			}

			match self.exec_block(&cases[ix].body, activation)? {
				Flow::Fallthrough if ix + 1 < cases.len() => ix += 1,
				Flow::Regular | Flow::Fallthrough => break,
				Flow::Break(target) if targets(label, target) => break,
				flow => return Ok(flow),
			}
		}

		Ok(Flow::Regular)
	}


	fn select(
		&mut self,
		label: Option<LabelId>,
		cases: &'a [SelectCase],
		pos: SourcePos,
		activation: &mut Activation<'a>,
	) -> Result<Flow, Panic> {
		// Operands are evaluated once, in source order.
		let mut operands = Vec::with_capacity(cases.len());

		for case in cases.iter() {
			let operand = match &case.comm {
				Comm::Receive { channel, .. } => (self.eval(channel, activation)?, None),

				Comm::Send { channel, value } => {
					let channel = self.eval(channel, activation)?;
					let value = self.eval(value, activation)?;
					(channel, Some(value))
				}

				Comm::Default => (Value::Nil, None),
			};

			match &operand.0 {
				Value::Channel(_) | Value::Nil => (),
				value => return Err(Panic::invalid_operand(value, pos)),
			}

			operands.push(operand);
		}

		let ready: Vec<usize> = cases
			.iter()
			.zip(operands.iter())
			.enumerate()
			.filter(
				|(_, (case, (channel, _)))| match (&case.comm, channel) {
					(Comm::Receive { .. }, Value::Channel(channel)) => channel.can_receive(),
					(Comm::Send { .. }, Value::Channel(channel)) => channel.can_send(),
					_ => false,
				}
			)
			.map(|(ix, _)| ix)
			.collect();

		let chosen = if ready.is_empty() {
			match cases.iter().position(|case| matches!(case.comm, Comm::Default)) {
				Some(ix) => ix,
				None => return Err(Panic::blocked(pos)),
			}
		} else {
			ready[self.rng.gen_range(0 .. ready.len())]
		};

		tracing::trace!(target: "corolla::runtime", ready = ready.len(), chosen, "select");

		let case = &cases[chosen];
		let (channel, value) = operands.swap_remove(chosen);

		match &case.comm {
			Comm::Receive { target, .. } => {
				let received = receive(channel, pos.clone())?;

				match target {
					ReceiveTarget::Discard => (),
					ReceiveTarget::Define(var) => activation.set(*var, received),
					ReceiveTarget::Assign(Place::Variable(var)) => activation.set(*var, received),
					ReceiveTarget::Assign(Place::Index { object, index }) => {
						let object = self.eval(object, activation)?;
						let index = self.eval(index, activation)?;
						store(object, index, received, pos)?;
					}
				}
			}

			Comm::Send { .. } => send(channel, value.unwrap_or_default(), pos)?,

			Comm::Default => (),
		}

		match self.exec_block(&case.body, activation)? {
			Flow::Break(target) if targets(label, target) => Ok(Flow::Regular),
			flow => Ok(flow),
		}
	}


	/// Evaluate a boolean expression.
	fn condition(&mut self, expr: &'a Expr, activation: &mut Activation<'a>) -> Result<bool, Panic> {
		match self.eval(expr, activation)? {
			Value::Bool(b) => Ok(b),
			value => Err(Panic::invalid_operand(&value, activation.pos(expr.pos()))),
		}
	}


	fn literal(&mut self, literal: &'a Literal, activation: &mut Activation<'a>) -> Result<Value, Panic> {
		match literal {
			// Nil.
			Literal::Nil => Ok(Value::Nil),

			// Bool.
			Literal::Bool(b) => Ok((*b).into()),

			// Int.
			Literal::Int(int) => Ok((*int).into()),

			// Float.
			Literal::Float(float) => Ok((*float).into()),

			// String.
			Literal::String(string) => Ok((&string[..]).into()),

			// Array.
			Literal::Array(items) => {
				let mut array = Vec::with_capacity(items.len());

				for item in items.iter() {
					array.push(self.eval(item, activation)?);
				}

				Ok(Array::new(array).into())
			}

			// Dict.
			Literal::Dict(items) => {
				let mut dict = HashMap::with_capacity(items.len());

				for (key, value) in items.iter() {
					let key = self.eval(key, activation)?;
					let value = self.eval(value, activation)?;
					dict.insert(key, value);
				}

				Ok(Dict::new(dict).into())
			}
		}
	}


	fn eval(&mut self, expr: &'a Expr, activation: &mut Activation<'a>) -> Result<Value, Panic> {
		match expr {
			// Variable.
			Expr::Variable { var, .. } => Ok(activation.get(*var)),

			// Literal.
			Expr::Literal { literal, .. } => self.literal(literal, activation),

			// Unary operator.
			Expr::UnaryOp { op, operand, pos } => {
				let value = self.eval(operand, activation)?;

				match (op, &value) {
					(UnaryOp::Minus, Value::Int(int)) => Ok(int.wrapping_neg().into()),
					(UnaryOp::Minus, Value::Float(float)) => Ok((-float).into()),
					(UnaryOp::Not, Value::Bool(b)) => Ok((!b).into()),
					(_, value) => Err(Panic::invalid_operand(value, activation.pos(*pos))),
				}
			}

			// Short circuiting operators.
			Expr::BinaryOp { left, op: BinaryOp::And, right, .. } => {
				let value = self.condition(left, activation)? && self.condition(right, activation)?;
				Ok(value.into())
			}

			Expr::BinaryOp { left, op: BinaryOp::Or, right, .. } => {
				let value = self.condition(left, activation)? || self.condition(right, activation)?;
				Ok(value.into())
			}

			// Binary operator.
			Expr::BinaryOp { left, op, right, pos } => {
				let left = self.eval(left, activation)?;
				let right = self.eval(right, activation)?;

				binary(*op, left, right, activation.pos(*pos))
			}

			// Index.
			Expr::Index { object, index, pos } => {
				let object = self.eval(object, activation)?;
				let index = self.eval(index, activation)?;

				load(object, index, activation.pos(*pos))
			}

			// Call.
			Expr::Call { callee, args, pos } => {
				let mut values = Vec::with_capacity(args.len());

				for arg in args.iter() {
					values.push(self.eval(arg, activation)?);
				}

				self.call_callee(*callee, values, activation.pos(*pos))
			}

			// Make.
			Expr::Make { ty, size, pos } => {
				let size = match size {
					Some(size) => match self.eval(size, activation)? {
						Value::Int(size) if size >= 0 => Some(size as usize),
						value => return Err(Panic::invalid_operand(&value, activation.pos(*pos))),
					},
					None => None,
				};

				match ty {
					Type::Array(item) => {
						let items = (0 .. size.unwrap_or(0))
							.map(|_| zero(item))
							.collect();

						Ok(Array::new(items).into())
					}

					Type::Map(_, _) => Ok(Dict::default().into()),

					Type::Chan(_) => Ok(Channel::new(size).into()),

					ty => Ok(zero(ty)),
				}
			}

			// Channel receive.
			Expr::Receive { channel, pos } => {
				let channel = self.eval(channel, activation)?;
				receive(channel, activation.pos(*pos))
			}

			// Suspension point.
			Expr::Yield { value, pos, .. } => {
				let value = self.eval(value, activation)?;
				let pos = activation.pos(*pos);
				self.suspend(value, pos)
			}

			// Type test.
			Expr::TypeIs { expr, ty, .. } => {
				let value = self.eval(expr, activation)?;
				Ok(value.has_type(ty).into())
			}

			// Instruction pointer.
			Expr::FrameIp => {
				let fp = activation.fp();
				Ok(Value::Int(self.stack().frame(fp).ip as i64))
			}
		}
	}


	/// Hand a value to the driver, and get the value sent on resume.
	fn suspend(&mut self, value: Value, pos: SourcePos) -> Result<Value, Panic> {
		match &mut self.mode {
			Mode::Replay(context) => Ok(context.yield_(value)?),

			Mode::Handoff(yielder) => {
				let sent = yielder.yield_(Snapshot::of(&value))?;
				Ok(Thawer::new(self.program.functions.len()).thaw(sent)?)
			}

			Mode::Plain => Err(Panic::YieldOutsideCoroutine { pos }),
		}
	}
}


/// Whether a break or continue with the given target exits the labeled statement.
fn targets(label: Option<LabelId>, target: Option<LabelId>) -> bool {
	target.is_none() || target == label
}


/// The zero value of a type.
fn zero(ty: &Type) -> Value {
	match ty {
		Type::Int => Value::Int(0),
		Type::Float => 0.0.into(),
		Type::Bool => false.into(),
		Type::String => "".into(),
		Type::Array(_) => Array::new(Vec::new()).into(),
		Type::Map(_, _) => Dict::default().into(),
		Type::Any | Type::Nil | Type::Chan(_) => Value::Nil,
	}
}


fn load(object: Value, index: Value, pos: SourcePos) -> Result<Value, Panic> {
	match (&object, &index) {
		(Value::Array(array), Value::Int(ix)) => array
			.index(*ix)
			.map_err(|_| Panic::index_out_of_bounds(&index, pos)),

		(Value::String(string), Value::Int(ix)) => string
			.index(*ix)
			.map_err(|_| Panic::index_out_of_bounds(&index, pos)),

		(Value::Dict(dict), key) => dict
			.get(key)
			.ok_or_else(|| Panic::missing_key(key, pos)),

		(Value::Array(_), _) | (Value::String(_), _) => Err(Panic::invalid_operand(&index, pos)),

		_ => Err(Panic::invalid_operand(&object, pos)),
	}
}


fn store(object: Value, index: Value, value: Value, pos: SourcePos) -> Result<(), Panic> {
	match (&object, &index) {
		(Value::Array(array), Value::Int(ix)) => array
			.set(*ix, value)
			.map_err(|_| Panic::index_out_of_bounds(&index, pos)),

		(Value::Array(_), _) => Err(Panic::invalid_operand(&index, pos)),

		(Value::Dict(dict), _) => {
			dict.insert(index, value);
			Ok(())
		}

		_ => Err(Panic::invalid_operand(&object, pos)),
	}
}


fn send(channel: Value, value: Value, pos: SourcePos) -> Result<(), Panic> {
	match &channel {
		Value::Channel(channel) => channel
			.send(value)
			.map_err(
				|error| match error {
					ChannelError::Closed => Panic::closed_channel(pos),
					_ => Panic::blocked(pos),
				}
			),

		// Sending on a nil channel blocks forever.
		Value::Nil => Err(Panic::blocked(pos)),

		value => Err(Panic::invalid_operand(value, pos)),
	}
}


/// Receive from a channel. A closed and drained channel yields nil.
fn receive(channel: Value, pos: SourcePos) -> Result<Value, Panic> {
	match &channel {
		Value::Channel(channel) => match channel.receive() {
			Ok(value) => Ok(value.unwrap_or_default()),
			Err(_) => Err(Panic::blocked(pos)),
		},

		Value::Nil => Err(Panic::blocked(pos)),

		value => Err(Panic::invalid_operand(value, pos)),
	}
}


/// Equality, with ints and floats compared as numbers.
fn equals(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => Float::of(left) == Float::of(right),
		_ => left == right,
	}
}


fn compare(left: &Value, right: &Value) -> Option<Ordering> {
	match (left, right) {
		(Value::Int(left), Value::Int(right)) => Some(left.cmp(right)),
		(Value::String(left), Value::String(right)) => Some(left.cmp(right)),
		_ => Float::of(left)?.partial(&Float::of(right)?),
	}
}


fn binary(op: BinaryOp, left: Value, right: Value, pos: SourcePos) -> Result<Value, Panic> {
	use BinaryOp::*;

	let value = match (op, &left, &right) {
		// Int arithmetic wraps around.
		(Plus, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
		(Minus, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
		(Times, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
		(Div, Value::Int(_), Value::Int(0)) | (Mod, Value::Int(_), Value::Int(0)) => {
			return Err(Panic::division_by_zero(pos))
		}
		(Div, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_div(*b)),
		(Mod, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_rem(*b)),

		(Plus, Value::String(a), Value::String(b)) => Value::String(a.concat(b)),

		(Plus, _, _) | (Minus, _, _) | (Times, _, _) | (Div, _, _) | (Mod, _, _) => {
			let (a, b) = match (Float::of(&left), Float::of(&right)) {
				(Some(a), Some(b)) => (a, b),
				(None, _) => return Err(Panic::invalid_operand(&left, pos)),
				(_, None) => return Err(Panic::invalid_operand(&right, pos)),
			};

			match a.arith(op, &b) {
				Some(result) => result.into(),
				None => return Err(Panic::invalid_operand(&right, pos)),
			}
		}

		(Equals, _, _) => equals(&left, &right).into(),
		(NotEquals, _, _) => (!equals(&left, &right)).into(),

		(Lower, _, _) | (LowerEquals, _, _) | (Greater, _, _) | (GreaterEquals, _, _) => {
			let ordering = match compare(&left, &right) {
				Some(ordering) => ordering,
				None => return Err(Panic::invalid_operand(&right, pos)),
			};

			let result = match op {
				Lower => ordering == Ordering::Less,
				LowerEquals => ordering != Ordering::Greater,
				Greater => ordering == Ordering::Greater,
				_ => ordering != Ordering::Less,
			};

			result.into()
		}

		(And, _, _) | (Or, _, _) => match (&left, &right) {
			(Value::Bool(a), Value::Bool(b)) => (if op == And { *a && *b } else { *a || *b }).into(),
			(Value::Bool(_), _) => return Err(Panic::invalid_operand(&right, pos)),
			_ => return Err(Panic::invalid_operand(&left, pos)),
		},
	};

	Ok(value)
}
