use super::{print, Builtin, CallContext, NativeFun, Panic, Value};


inventory::submit! { Builtin(&Println) }

/// Print the values separated by spaces, then a newline.
struct Println;

impl NativeFun for Println {
	fn name(&self) -> &'static str { "println" }

	fn call(&self, mut context: CallContext) -> Result<Value, Panic> {
		let mut out = Vec::new();
		print::format(context.args(), b" ", &mut out);
		out.push(b'\n');

		context.write(&out)?;

		Ok(Value::Nil)
	}
}
