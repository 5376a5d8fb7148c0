use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Push) }

struct Push;

impl NativeFun for Push {
	fn name(&self) -> &'static str { "push" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ Value::Array(ref array), value ] => {
				array.push(value.copy());
				Ok(Value::Nil)
			},

			[ other, _ ] => Err(Panic::invalid_operand(other, context.pos.clone())),
			args => Err(Panic::invalid_args(args.len() as u32, 2, context.pos.clone()))
		}
	}
}
