use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Has) }

/// Whether a collection has the given key, with the same keys as `keys`.
struct Has;

impl NativeFun for Has {
	fn name(&self) -> &'static str { "has" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		let within = |index: &Value, len: i64| match index {
			Value::Int(index) => Ok(Value::Bool(0 <= *index && *index < len)),
			other => Err(Panic::invalid_operand(other, context.pos.clone())),
		};

		match context.args() {
			[ Value::Dict(ref dict), key ] => Ok(Value::Bool(dict.contains(key))),
			[ Value::Array(ref array), index ] => within(index, array.len()),
			[ Value::String(ref string), index ] => within(index, string.len() as i64),
			[ Value::Int(count), index ] => within(index, *count),
			[ Value::Nil, _ ] => Ok(Value::Bool(false)),
			[ other, _ ] => Err(Panic::invalid_operand(other, context.pos.clone())),
			args => Err(Panic::invalid_args(args.len() as u32, 2, context.pos.clone()))
		}
	}
}
