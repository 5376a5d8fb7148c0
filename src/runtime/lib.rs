automod::dir!("src/runtime/lib");

use super::{
	CallContext,
	Panic,
	Value,
};


/// A native function of the language.
pub trait NativeFun {
	/// The name the function is called by.
	fn name(&self) -> &'static str;

	/// Call the function. Arguments are found in the context.
	fn call(&self, context: CallContext) -> Result<Value, Panic>;
}


/// A registered builtin.
pub struct Builtin(pub &'static (dyn NativeFun + Sync));


inventory::collect!(Builtin);


/// Find a builtin by name.
pub fn get(name: &str) -> Option<&'static (dyn NativeFun + Sync)> {
	inventory::iter::<Builtin>
		.into_iter()
		.map(|builtin| builtin.0)
		.find(|builtin| builtin.name() == name)
}


/// The registered name of a builtin, if there is one by that name.
pub fn name(name: &[u8]) -> Option<&'static str> {
	let name = std::str::from_utf8(name).ok()?;
	get(name).map(|builtin| builtin.name())
}

