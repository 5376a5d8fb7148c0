use super::{Interner, Symbol};
use crate::fmt::Display;


impl<'a> Display<'a> for Symbol {
	type Context = &'a Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter<'_>, interner: Self::Context) -> std::fmt::Result {
		match interner.name(*self) {
			Some(name) => f.write_str(&name),
			None => f.write_str("<ill-formed>"),
		}
	}
}
