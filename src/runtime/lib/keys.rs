use super::{Builtin, CallContext, NativeFun, Panic, Value};
use crate::runtime::value::Array;


inventory::submit! { Builtin(&Keys) }

/// The keys of a collection, in ascending order: dict keys, or the indices of arrays and
/// strings, or the integers below a count.
struct Keys;

impl Keys {
	fn count(count: i64) -> Value {
		Array::new((0 .. count).map(Value::Int).collect()).into()
	}
}

impl NativeFun for Keys {
	fn name(&self) -> &'static str { "keys" }

	fn call(&self, context: CallContext) -> Result<Value, Panic> {
		match context.args() {
			[ Value::Dict(ref dict) ] => Ok(Array::new(dict.keys()).into()),
			[ Value::Array(ref array) ] => Ok(Self::count(array.len())),
			[ Value::String(ref string) ] => Ok(Self::count(string.len() as i64)),
			[ Value::Int(count) ] => Ok(Self::count(*count)),
			[ Value::Nil ] => Ok(Self::count(0)),
			[ other ] => Err(Panic::invalid_operand(other, context.pos.clone())),
			args => Err(Panic::invalid_args(args.len() as u32, 1, context.pos.clone()))
		}
	}
}
