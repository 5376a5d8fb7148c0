use std::{
	io,
	fmt::{self, Display},
};

use super::{SourcePos, Value};
use crate::{
	coroutine::{MarshalError, Signal, Unwind},
	term::color,
};


/// Runtime failures of the language, plus the unwind signal of suspension points.
/// Values are kept in their string form, so that panics can leave the thread that
/// raised them.
#[derive(Debug)]
pub enum Panic {
	/// The coroutine is suspending or being cancelled. Not an error.
	Unwind,
	StackOverflow { pos: SourcePos },
	DivisionByZero { pos: SourcePos },
	IndexOutOfBounds {
		index: Box<str>,
		pos: SourcePos,
	},
	MissingKey {
		key: Box<str>,
		pos: SourcePos,
	},
	InvalidOperand {
		value: Box<str>,
		pos: SourcePos,
	},
	InvalidArgs {
		expected: u32,
		got: u32,
		pos: SourcePos,
	},
	ClosedChannel { pos: SourcePos },
	/// A channel operation that can never complete, as nothing else runs concurrently.
	Blocked { pos: SourcePos },
	YieldOutsideCoroutine { pos: SourcePos },
	/// A call to the `panic` builtin.
	User {
		message: Box<str>,
		pos: SourcePos,
	},
	Io {
		error: io::Error,
		pos: SourcePos,
	},
	InvalidSnapshot(MarshalError),
}


impl Panic {
	pub fn stack_overflow(pos: SourcePos) -> Self {
		Self::StackOverflow { pos }
	}


	pub fn division_by_zero(pos: SourcePos) -> Self {
		Self::DivisionByZero { pos }
	}


	pub fn index_out_of_bounds(index: &Value, pos: SourcePos) -> Self {
		Self::IndexOutOfBounds { index: index.to_string().into(), pos }
	}


	pub fn missing_key(key: &Value, pos: SourcePos) -> Self {
		Self::MissingKey { key: key.to_string().into(), pos }
	}


	pub fn invalid_operand(value: &Value, pos: SourcePos) -> Self {
		Self::InvalidOperand { value: value.to_string().into(), pos }
	}


	pub fn invalid_args(got: u32, expected: u32, pos: SourcePos) -> Self {
		Self::InvalidArgs { expected, got, pos }
	}


	pub fn closed_channel(pos: SourcePos) -> Self {
		Self::ClosedChannel { pos }
	}


	pub fn blocked(pos: SourcePos) -> Self {
		Self::Blocked { pos }
	}


	pub fn io(error: io::Error, pos: SourcePos) -> Self {
		Self::Io { error, pos }
	}
}


impl From<Unwind> for Panic {
	fn from(_: Unwind) -> Self {
		Self::Unwind
	}
}


impl From<MarshalError> for Panic {
	fn from(error: MarshalError) -> Self {
		Self::InvalidSnapshot(error)
	}
}


impl Signal for Panic {
	fn is_unwind(&self) -> bool {
		matches!(self, Self::Unwind)
	}
}


impl Display for Panic {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let panic = color::Fg(color::Red, "Panic");

		match self {
			Self::Unwind => "coroutine unwinding".fmt(f),

			Self::StackOverflow { pos } => write!(f, "{} in {}: stack overflow", panic, pos),

			Self::DivisionByZero { pos } => write!(f, "{} in {}: division by zero", panic, pos),

			Self::IndexOutOfBounds { index, pos } => write!(
				f,
				"{} in {}: index {} out of bounds",
				panic,
				pos,
				color::Fg(color::Yellow, index)
			),

			Self::MissingKey { key, pos } => write!(
				f,
				"{} in {}: missing key {}",
				panic,
				pos,
				color::Fg(color::Yellow, key)
			),

			Self::InvalidOperand { value, pos } => write!(
				f,
				"{} in {}: invalid operand {}",
				panic,
				pos,
				color::Fg(color::Yellow, value)
			),

			Self::InvalidArgs { expected, got, pos } => write!(
				f,
				"{} in {}: expected {} arguments, got {}",
				panic,
				pos,
				color::Fg(color::Yellow, expected),
				color::Fg(color::Yellow, got),
			),

			Self::ClosedChannel { pos } => write!(f, "{} in {}: operation on closed channel", panic, pos),

			Self::Blocked { pos } => write!(f, "{} in {}: channel operation blocks forever", panic, pos),

			Self::YieldOutsideCoroutine { pos } => write!(f, "{} in {}: yield outside coroutine", panic, pos),

			Self::User { message, pos } => write!(f, "{} in {}: {}", panic, pos, message),

			Self::Io { error, pos } => write!(f, "{} in {}: {}", panic, pos, error),

			Self::InvalidSnapshot(error) => write!(f, "{}: invalid snapshot: {}", panic, error),
		}
	}
}


impl std::error::Error for Panic { }
