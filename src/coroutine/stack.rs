use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::Frame;


/// Failure to convert a stack to or from its byte form.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
	#[error("malformed stack: {0}")]
	Json(#[from] serde_json::Error),
	#[error("no stack in buffer")]
	Empty,
	#[error("{0}")]
	Value(String),
}


/// A call stack of activations.
/// The frame pointer indexes the innermost active call. Frames above it belong to calls
/// that are being replayed, and are reused by the next push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack<V> {
	frames: Vec<Frame<V>>,
	fp: Option<usize>,
}


impl<V> Stack<V> {
	/// Enter an activation, returning the index of its frame.
	/// When a deeper frame already exists, this is a replay descent and that frame is
	/// reused. Otherwise a fresh frame is appended.
	pub fn push(&mut self) -> usize {
		let fp = self.fp.map_or(0, |fp| fp + 1);

		if fp == self.frames.len() {
			self.frames.push(Frame::default());
		}

		self.fp = Some(fp);

		fp
	}


	/// Leave the topmost activation after it completed.
	/// Panics if the current activation is not the topmost, as that means the caller is
	/// unwinding rather than completing.
	pub fn pop(&mut self) {
		match self.fp {
			Some(fp) if fp + 1 == self.frames.len() => {
				self.frames.pop();
				self.fp = fp.checked_sub(1);
			}

			Some(fp) => panic!(
				"pop of frame {} while {} frames are live",
				fp,
				self.frames.len()
			),

			None => panic!("pop of empty stack"),
		}
	}


	/// The frame of the current activation.
	/// Panics if no activation was pushed.
	pub fn top(&self) -> &Frame<V> {
		let fp = self.fp.expect("top of empty stack");
		&self.frames[fp]
	}


	pub fn top_mut(&mut self) -> &mut Frame<V> {
		let fp = self.fp.expect("top of empty stack");
		&mut self.frames[fp]
	}


	pub fn frame(&self, ix: usize) -> &Frame<V> {
		&self.frames[ix]
	}


	pub fn frame_mut(&mut self, ix: usize) -> &mut Frame<V> {
		&mut self.frames[ix]
	}


	pub fn fp(&self) -> Option<usize> {
		self.fp
	}


	/// Rewind the frame pointer before replaying from the entry point.
	pub fn rewind(&mut self) {
		self.fp = None;
	}


	pub fn len(&self) -> usize {
		self.frames.len()
	}


	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}


	/// Drop trailing absent slots from every frame.
	pub fn compact(&mut self) {
		for frame in self.frames.iter_mut() {
			frame.storage.compact();
		}
	}


	pub fn map<U, F>(&self, mut f: F) -> Stack<U>
	where
		F: FnMut(&V) -> U,
	{
		Stack {
			frames: self.frames
				.iter()
				.map(|frame| frame.map(&mut f))
				.collect(),
			fp: self.fp,
		}
	}


	pub fn try_map<U, E, F>(self, mut f: F) -> Result<Stack<U>, E>
	where
		F: FnMut(V) -> Result<U, E>,
	{
		let mut frames = Vec::with_capacity(self.frames.len());

		for frame in self.frames {
			frames.push(frame.try_map(&mut f)?);
		}

		Ok(Stack { frames, fp: self.fp })
	}
}


impl<V> Stack<V>
where
	V: Serialize + DeserializeOwned,
{
	/// Append the byte form of the stack to the buffer.
	pub fn marshal_append(&self, buffer: &mut Vec<u8>) -> Result<(), MarshalError> {
		serde_json::to_writer(buffer, self)?;
		Ok(())
	}


	/// Replace the stack with the one at the start of the buffer, returning how many bytes
	/// were consumed.
	pub fn unmarshal(&mut self, buffer: &[u8]) -> Result<usize, MarshalError> {
		let mut stream = serde_json::Deserializer
			::from_slice(buffer)
			.into_iter::<Self>();

		match stream.next() {
			Some(Ok(stack)) => {
				*self = stack;
				Ok(stream.byte_offset())
			}

			Some(Err(error)) => Err(error.into()),

			None => Err(MarshalError::Empty),
		}
	}
}


impl<V> Default for Stack<V> {
	fn default() -> Self {
		Self { frames: Vec::new(), fp: None }
	}
}
