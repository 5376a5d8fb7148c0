use std::io::Write;

use super::{Builtin, CallContext, NativeFun, Panic, Value};


/// Write the printed form of the values, separated by the given bytes.
pub(super) fn format(values: &[Value], separator: &[u8], out: &mut Vec<u8>) {
	let mut iter = values.iter();

	if let Some(value) = iter.next() {
		format_value(value, out);
	}

	for value in iter {
		out.extend_from_slice(separator);
		format_value(value, out);
	}
}


fn format_value(value: &Value, out: &mut Vec<u8>) {
	match value {
		Value::String(string) => out.extend_from_slice(string.as_bytes()),
		// Writing to a vector never fails.
		value => { let _ = write!(out, "{}", value); }
	}
}


inventory::submit! { Builtin(&Print) }

struct Print;

impl NativeFun for Print {
	fn name(&self) -> &'static str { "print" }

	fn call(&self, mut context: CallContext) -> Result<Value, Panic> {
		let mut out = Vec::new();
		format(context.args(), b"", &mut out);

		context.write(&out)?;

		Ok(Value::Nil)
	}
}
