//! Dispatch synthesis: number the statements of a desugared function by instruction
//! pointer spans, and wrap the body with frame management so that re-running the
//! function after a suspension skips the statements that already completed.

use crate::semantic::program::{
	BinaryOp,
	Block,
	Expr,
	FrameOp,
	Function,
	Literal,
	LocalKind,
	Signature,
	Statement,
	VarId,
};


/// The half open range of instruction pointer values of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
	pub start: u32,
	pub end: u32,
}


/// Lower a desugared function.
pub fn lower(function: &mut Function, signature: Signature, defers: Option<VarId>) {
	let body = std::mem::take(&mut function.body);

	let mut next = 1;
	let (body, span) = block(body, &mut next);

	let pos = function.pos;
	let mut statements = Vec::new();

	// Prologue: every local lives for the whole function.
	for (ix, local) in function.locals.iter().enumerate() {
		let var = VarId(ix as u32);

		match local.kind {
			LocalKind::Param => (),
			LocalKind::Var => statements.push(Statement::Declare { var, init: None, pos }),
			LocalKind::Const(_) => statements.push(Statement::Const { var, pos }),
			LocalKind::Type => statements.push(Statement::Type { var, pos }),
		}
	}

	let slots: Vec<(u32, VarId)> = function.locals
		.iter()
		.enumerate()
		.filter(|(_, local)| local.is_live())
		.enumerate()
		.map(|(slot, (ix, _))| (slot as u32, VarId(ix as u32)))
		.collect();

	statements.push(Statement::Frame(FrameOp::Push));

	let resuming = Expr::binary(Expr::FrameIp, BinaryOp::Greater, Expr::literal(Literal::Int(0), pos));
	let restore: Vec<Statement> = slots
		.iter()
		.map(|&(slot, var)| Statement::Frame(FrameOp::Restore { slot, var }))
		.collect();

	statements.push(
		Statement::If {
			init: None,
			condition: resuming,
			then: restore.into(),
			otherwise: Block::default(),
			pos,
		}
	);

	let unwind: Vec<Statement> = slots
		.iter()
		.map(|&(slot, var)| Statement::Frame(FrameOp::Save { slot, var }))
		.collect();

	let mut complete = Vec::new();
	if let Some(list) = defers {
		complete.push(Statement::Frame(FrameOp::RunDefers { list }));
	}
	complete.push(Statement::Frame(FrameOp::Pop));

	statements.push(
		Statement::Scoped {
			body,
			unwind: unwind.into(),
			complete: complete.into(),
		}
	);

	tracing::debug!(
		target: "corolla::compile",
		points = span.end - span.start,
		slots = slots.len(),
		defers = defers.is_some(),
		"lowered function"
	);

	function.body = statements.into();
	function.signature = Some(signature);
	function.lowered = true;
}


/// Number the statements of a block, and dispatch on them if there are several.
fn block(block: Block, next: &mut u32) -> (Block, Span) {
	let start = *next;

	let compiled: Vec<(u32, Statement)> = block.0
		.into_vec() // Use vec's owned iterator.
		.into_iter()
		.map(
			|child| {
				let (child, span) = statement(child, next);
				(span.end, child)
			}
		)
		.collect();

	let span = Span { start, end: *next };

	let block = if compiled.len() <= 1 {
		compiled
			.into_iter()
			.map(|(_, child)| child)
			.collect::<Vec<_>>()
			.into()
	} else {
		vec![Statement::Dispatch(compiled.into())].into()
	};

	(block, span)
}


fn statement(statement: Statement, next: &mut u32) -> (Statement, Span) {
	let start = *next;

	let statement = match statement {
		Statement::Block(body) => Statement::Block(block(body, next).0),

		Statement::If { init, condition, then, otherwise, pos } => {
			let (then, _) = block(then, next);
			let (otherwise, _) = block(otherwise, next);

			Statement::If { init, condition, then, otherwise, pos }
		}

		Statement::For { label, init, condition, post, body, pos } => {
			let (body, _) = block(body, next);

			// Each iteration starts over from the loop's first statement.
			let reset = Statement::Frame(FrameOp::SetIp(start));
			let post = match post {
				Some(post) => Statement::Block(vec![*post, reset].into()),
				None => reset,
			};

			Statement::For { label, init, condition, post: Some(Box::new(post)), body, pos }
		}

		Statement::Branch { label, selector, arms, pos } => {
			let arms: Vec<Block> = arms
				.into_vec() // Use vec's owned iterator.
				.into_iter()
				.map(|arm| block(arm, next).0)
				.collect();

			Statement::Branch { label, selector, arms: arms.into(), pos }
		}

		leaf => leaf,
	};

	// Leaves and empty compound statements take a single point.
	if *next == start {
		*next += 1;
	}

	(statement, Span { start, end: *next })
}
