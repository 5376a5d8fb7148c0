use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Pop) }

struct Pop;

impl NativeFun for Pop {
	fn name(&self) -> &'static str { "pop" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ Value::Array(ref array) ] => array
				.pop()
				.ok_or_else(|| Panic::index_out_of_bounds(&Value::Int(0), context.pos.clone())),

			[ other ] => Err(Panic::invalid_operand(other, context.pos.clone())),
			args => Err(Panic::invalid_args(args.len() as u32, 1, context.pos.clone()))
		}
	}
}
