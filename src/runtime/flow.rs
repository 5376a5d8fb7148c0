use super::value::Value;
use crate::semantic::program::LabelId;


/// Control flow in the language.
#[derive(Debug)]
pub enum Flow {
	/// Regular flow: follow everything in order.
	Regular,
	/// Return from function.
	Return(Value),
	/// Break from the labeled statement, or from the innermost one.
	Break(Option<LabelId>),
	/// Continue the labeled loop, or the innermost one.
	Continue(Option<LabelId>),
	/// Fall through to the next switch case.
	Fallthrough,
}
