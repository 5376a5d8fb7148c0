use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Close) }

struct Close;

impl NativeFun for Close {
	fn name(&self) -> &'static str { "close" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ Value::Channel(ref channel) ] => channel
				.close()
				.map(|()| Value::Nil)
				.map_err(|_| Panic::closed_channel(context.pos.clone())),

			[ other ] => Err(Panic::invalid_operand(other, context.pos.clone())),
			args => Err(Panic::invalid_args(args.len() as u32, 1, context.pos.clone()))
		}
	}
}
