use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Delete) }

/// Remove a key from a dict. Missing keys are ignored.
struct Delete;

impl NativeFun for Delete {
	fn name(&self) -> &'static str { "delete" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ Value::Dict(ref dict), key ] => {
				dict.remove(key);
				Ok(Value::Nil)
			}

			[ Value::Nil, _ ] => Ok(Value::Nil),

			[ other, _ ] => Err(Panic::invalid_operand(other, context.pos.clone())),
			args => Err(Panic::invalid_args(args.len() as u32, 2, context.pos.clone()))
		}
	}
}
