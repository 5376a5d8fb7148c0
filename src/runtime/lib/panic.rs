use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&PanicFun) }

/// Raise a language panic with the printed form of the argument.
struct PanicFun;

impl NativeFun for PanicFun {
	fn name(&self) -> &'static str { "panic" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ value ] => Err(
				Panic::User {
					message: value.to_string().into(),
					pos: context.pos.clone(),
				}
			),

			args => Err(Panic::invalid_args(args.len() as u32, 1, context.pos.clone()))
		}
	}
}
