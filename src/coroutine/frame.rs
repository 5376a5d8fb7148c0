use serde::{Deserialize, Serialize};


/// Sparse slot storage for the locals of one activation.
/// Each slot carries an explicit presence bit, so a saved default value is never confused
/// with a slot that was never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage<V>(Vec<Option<V>>);


impl<V> Storage<V> {
	/// Get the value of a slot.
	/// Panics if the slot was never set, which means the save/restore protocol was broken.
	pub fn get(&self, ix: usize) -> &V {
		match self.0.get(ix) {
			Some(Some(value)) => value,
			_ => panic!("read of unset storage slot {}", ix),
		}
	}


	/// Set the value of a slot, growing the storage if needed.
	pub fn set(&mut self, ix: usize, value: V) {
		if ix >= self.0.len() {
			self.0.resize_with(ix + 1, || None);
		}

		self.0[ix] = Some(value);
	}


	/// Check if a slot holds a value.
	pub fn has(&self, ix: usize) -> bool {
		matches!(self.0.get(ix), Some(Some(_)))
	}


	/// Clear a slot. The storage never shrinks here, see `compact`.
	pub fn delete(&mut self, ix: usize) {
		if let Some(slot) = self.0.get_mut(ix) {
			*slot = None;
		}
	}


	/// Drop trailing absent slots.
	pub fn compact(&mut self) {
		while let Some(None) = self.0.last() {
			self.0.pop();
		}

		self.0.shrink_to_fit();
	}


	/// The number of slots, including absent ones.
	pub fn len(&self) -> usize {
		self.0.len()
	}


	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}


	pub fn map<U, F>(&self, mut f: F) -> Storage<U>
	where
		F: FnMut(&V) -> U,
	{
		Storage(
			self.0
				.iter()
				.map(|slot| slot.as_ref().map(&mut f))
				.collect()
		)
	}


	pub fn try_map<U, E, F>(self, mut f: F) -> Result<Storage<U>, E>
	where
		F: FnMut(V) -> Result<U, E>,
	{
		let mut slots = Vec::with_capacity(self.0.len());

		for slot in self.0 {
			slots.push(slot.map(&mut f).transpose()?);
		}

		Ok(Storage(slots))
	}
}


impl<V> Default for Storage<V> {
	fn default() -> Self {
		Self(Vec::new())
	}
}


/// One activation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame<V> {
	/// The instruction pointer. Zero means the activation has not completed any statement.
	pub ip: u32,
	pub storage: Storage<V>,
	/// Set while control is returning through this frame because of a suspension, and
	/// cleared once the suspension point is replayed.
	pub resuming: bool,
}


impl<V> Frame<V> {
	pub fn map<U, F>(&self, f: F) -> Frame<U>
	where
		F: FnMut(&V) -> U,
	{
		Frame {
			ip: self.ip,
			storage: self.storage.map(f),
			resuming: self.resuming,
		}
	}


	pub fn try_map<U, E, F>(self, f: F) -> Result<Frame<U>, E>
	where
		F: FnMut(V) -> Result<U, E>,
	{
		Ok(
			Frame {
				ip: self.ip,
				storage: self.storage.try_map(f)?,
				resuming: self.resuming,
			}
		)
	}
}


impl<V> Default for Frame<V> {
	fn default() -> Self {
		Self { ip: 0, storage: Storage::default(), resuming: false }
	}
}
