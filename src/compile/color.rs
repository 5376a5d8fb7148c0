use std::collections::{HashMap, VecDeque};

use super::{Error, ErrorKind};
use crate::semantic::program::{Callee, Expr, FnId, Program, Signature, Statement};


/// The suspension signature of every function that must be lowered.
pub type Colors = HashMap<FnId, Signature>;


/// The call graph of a program, as edges from each callee to its callers.
/// Builtins are not part of the graph.
#[derive(Debug)]
pub struct CallGraph {
	callers: Vec<Vec<FnId>>,
}


impl CallGraph {
	pub fn new(program: &Program) -> Self {
		let mut callers = vec![Vec::new(); program.functions.len()];

		for caller in program.ids() {
			let mut callees = Vec::new();

			program
				.function(caller)
				.body
				.any_expr(
					&mut |expr| {
						if let Expr::Call { callee: Callee::Function(callee), .. } = expr {
							callees.push(*callee);
						}
						false
					}
				);

			callees.sort();
			callees.dedup();

			for callee in callees {
				callers[callee.0 as usize].push(caller);
			}
		}

		Self { callers }
	}


	pub fn callers(&self, function: FnId) -> &[FnId] {
		&self.callers[function.0 as usize]
	}
}


/// Color every function reaching a suspension point with the point's signature.
pub fn color(program: &Program) -> Result<Colors, Error> {
	let graph = CallGraph::new(program);
	let mut colors = Colors::new();

	for id in program.ids() {
		let function = program.function(id);

		let mut suspensions = Vec::new();
		function.body.any_expr(
			&mut |expr| {
				if let Expr::Yield { signature, pos, .. } = expr {
					suspensions.push((signature.clone(), *pos));
				}
				false
			}
		);

		for (signature, pos) in suspensions {
			propagate(&graph, &mut colors, id, signature)
				.map_err(
					|(conflict, first, second)| {
						// Report at the suspension point when it lies in the conflicting function.
						let pos = if conflict == id { pos } else { program.function(conflict).pos };
						let function = program.function(conflict);
						let kind = ErrorKind::ConflictingSignature { first, second };

						Error::new(kind, function.name, function.path.clone(), pos)
					}
				)?;
		}
	}

	for (id, signature) in colors.iter() {
		tracing::debug!(
			target: "corolla::compile",
			function = id.0,
			%signature,
			"colored"
		);
	}

	Ok(colors)
}


/// Walk the call graph backwards from a suspending function.
/// On conflict, returns the function and its two signatures.
fn propagate(
	graph: &CallGraph,
	colors: &mut Colors,
	origin: FnId,
	signature: Signature,
) -> Result<(), (FnId, Signature, Signature)> {
	let mut queue = VecDeque::new();
	queue.push_back(origin);

	while let Some(id) = queue.pop_front() {
		match colors.get(&id) {
			Some(color) if *color == signature => continue,

			Some(color) => return Err((id, color.clone(), signature)),

			None => {
				tracing::trace!(
					target: "corolla::compile",
					function = id.0,
					from = origin.0,
					"signature propagated"
				);

				colors.insert(id, signature.clone());
				queue.extend(graph.callers(id).iter().copied());
			}
		}
	}

	Ok(())
}


/// Check the deferred calls of a suspending function.
pub fn check_defers(program: &Program, id: FnId, colors: &Colors) -> Result<(), Error> {
	let function = program.function(id);
	let mut error = None;

	function.body.walk(
		&mut |statement| {
			if let Statement::Defer { call: Expr::Call { callee: Callee::Function(callee), .. }, pos } = statement {
				if error.is_none() && colors.contains_key(callee) {
					error = Some(*pos);
				}
			}
		}
	);

	match error {
		Some(pos) => Err(
			Error::new(ErrorKind::UnsupportedDefer, function.name, function.path.clone(), pos)
		),
		None => Ok(()),
	}
}
