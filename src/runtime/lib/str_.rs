use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Str) }

/// The printed form of a value.
struct Str;

impl NativeFun for Str {
	fn name(&self) -> &'static str { "str" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ value @ Value::String(_) ] => Ok(value.copy()),
			[ value ] => Ok(value.to_string().as_str().into()),
			args => Err(Panic::invalid_args(args.len() as u32, 1, context.pos.clone()))
		}
	}
}
