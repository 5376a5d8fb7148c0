use super::{Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Len) }

struct Len;

impl NativeFun for Len {
	fn name(&self) -> &'static str { "len" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ Value::Array(ref array) ] => Ok(Value::Int(array.len())),
			[ Value::Dict(ref dict) ] => Ok(Value::Int(dict.len())),
			[ Value::String(ref string) ] => Ok(Value::Int(string.len() as i64)),
			[ Value::Channel(ref channel) ] => Ok(Value::Int(channel.len())),
			[ Value::Nil ] => Ok(Value::Int(0)),
			[ other ] => Err(Panic::invalid_operand(other, context.pos.clone())),
			args => Err(Panic::invalid_args(args.len() as u32, 1, context.pos.clone()))
		}
	}
}
