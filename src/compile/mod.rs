//! Lowering of suspending functions into resumable functions: every function that may
//! reach a suspension point is rewritten to save its locals in a stack frame when the
//! coroutine suspends, and to skip the statements that already completed when it is
//! called again.

mod color;
mod desugar;
mod dispatch;
mod error;
#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU32, Ordering};

use crate::semantic::program::Program;
use color::Colors;
pub use error::{Error, ErrorKind};


static FRESH: AtomicU32 = AtomicU32::new(1);


/// A number for generated names, unique in the process.
fn fresh() -> u32 {
	FRESH.fetch_add(1, Ordering::Relaxed)
}


/// Lower every suspending function of the program.
/// Functions that never suspend are kept unchanged.
pub fn compile(program: &Program) -> Result<Program, Error> {
	let colors = color::color(program)?;
	let mut lowered = program.clone();

	for id in program.ids() {
		match colors.get(&id) {
			Some(signature) => {
				color::check_defers(program, id, &colors)?;

				let function = lowered.function_mut(id);
				let defers = desugar::desugar(function, &colors)?;
				dispatch::lower(function, signature.clone(), defers);
			}

			None => desugar::check_labels(program.function(id))?,
		}
	}

	tracing::info!(
		target: "corolla::compile",
		functions = program.functions.len(),
		lowered = colors.len(),
		"compiled"
	);

	Ok(lowered)
}
