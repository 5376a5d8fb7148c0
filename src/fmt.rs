use std::fmt::Write;

/// Formatting that needs outside state, such as the symbol interner to print names, or the
/// enclosing function to print its variables.
pub trait Display<'a> {
	type Context: 'a;

	fn fmt(&self, f: &mut std::fmt::Formatter<'_>, context: Self::Context) -> std::fmt::Result;
}


impl<'a, T> Display<'a> for &T
where
	T: Display<'a>,
{
	type Context = T::Context;

	fn fmt(&self, f: &mut std::fmt::Formatter<'_>, context: Self::Context) -> std::fmt::Result {
		T::fmt(self, f, context)
	}
}


impl<'a, T> Display<'a> for Box<T>
where
	T: Display<'a> + ?Sized,
{
	type Context = T::Context;

	fn fmt(&self, f: &mut std::fmt::Formatter<'_>, context: Self::Context) -> std::fmt::Result {
		T::fmt(self, f, context)
	}
}


/// Pairs a value with its context, for use with `format!` and friends.
#[derive(Debug)]
pub struct Show<T, C>(pub T, pub C);


impl<'a, T, C> std::fmt::Display for Show<T, C>
where
	T: Display<'a, Context = C>,
	C: Copy,
{
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		self.0.fmt(f, self.1)
	}
}


/// Block nesting in printed programs, one tab per level.
#[derive(Debug, Default, Copy, Clone)]
pub struct Indentation(pub u8);


impl Indentation {
	pub fn increase(self) -> Self {
		Self(self.0.saturating_add(1))
	}
}


impl std::fmt::Display for Indentation {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		(0 .. self.0).try_for_each(|_| f.write_char('\t'))
	}
}


/// Format the items, with the separator between each pair.
pub fn sep_by<T, I, F, S>(
	iter: I,
	f: &mut std::fmt::Formatter,
	mut format: F,
	separator: S,
) -> std::fmt::Result
where
	I: Iterator<Item = T>,
	F: FnMut(T, &mut std::fmt::Formatter) -> std::fmt::Result,
	S: std::fmt::Display,
{
	for (ix, item) in iter.enumerate() {
		if ix > 0 {
			separator.fmt(f)?;
		}

		format(item, f)?;
	}

	Ok(())
}
