use std::fmt::{self, Debug, Display};

use termion::color as term;
pub use termion::color::{Blue, Red, Yellow};


/// Colors are disabled when the `NO_COLOR` environment variable is set.
fn enabled() -> bool {
	std::env::var_os("NO_COLOR").is_none()
}


/// Paint the foreground with a given color when formatting the value.
pub struct Fg<C, T>(pub C, pub T);


impl<C, T> Fg<C, T>
where
	C: term::Color + Copy,
{
	fn paint<F>(&self, f: &mut fmt::Formatter, inner: F) -> fmt::Result
	where
		F: FnOnce(&T, &mut fmt::Formatter) -> fmt::Result,
	{
		if !enabled() {
			return inner(&self.1, f);
		}

		write!(f, "{}", term::Fg(self.0))?;
		inner(&self.1, f)?;
		write!(f, "{}", term::Fg(term::Reset))
	}
}


impl<C, T> Debug for Fg<C, T>
where
	C: term::Color + Copy,
	T: Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.paint(f, T::fmt)
	}
}


impl<C, T> Display for Fg<C, T>
where
	C: term::Color + Copy,
	T: Display,
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.paint(f, T::fmt)
	}
}
