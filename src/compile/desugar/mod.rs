//! Structural rewrite of suspending functions into a normal form where every statement
//! can be addressed by an instruction pointer span: declarations become assignments to
//! hoisted locals, conditions and tags are evaluated into temporaries, every branch
//! names its target, and ranges, switches and selects become plain loops and branches.

mod linearize;

use std::collections::HashSet;

use super::{fresh, Colors, Error, ErrorKind};
use crate::semantic::program::{
	BinaryOp,
	Block,
	Callee,
	Comm,
	Expr,
	FrameOp,
	Function,
	Guards,
	LabelId,
	Literal,
	LocalKind,
	Name,
	Place,
	ReceiveTarget,
	SelectCase,
	Statement,
	SwitchCase,
	SwitchTag,
	Type,
	VarId,
};
use crate::syntax::SourcePos;


/// Rewrite the body of a suspending function in place.
/// Returns the local holding the deferred calls, if the function defers any.
pub fn desugar(function: &mut Function, colors: &Colors) -> Result<Option<VarId>, Error> {
	let body = std::mem::take(&mut function.body);

	let mut desugar = Desugar {
		function,
		colors,
		targets: Vec::new(),
		referenced: HashSet::new(),
		defers: None,
	};

	let mut statements = Vec::new();
	desugar.block(body, &mut statements)?;

	let Desugar { function, referenced, defers, .. } = desugar;

	let mut body = Block::from(statements);
	remove_dead_labels(&mut body, &referenced);
	function.body = body;

	hoist(function);

	Ok(defers)
}


/// Check that every labeled branch of a function that is not lowered targets an enclosing
/// statement.
pub fn check_labels(function: &Function) -> Result<(), Error> {
	fn check<'a>(
		statements: Vec<&'a Statement>,
		targets: &mut Vec<(Option<LabelId>, bool)>,
		function: &Function,
	) -> Result<(), Error> {
		for statement in statements {
			let target = match statement {
				Statement::For { label, .. } | Statement::Range { label, .. } => Some((*label, true)),
				Statement::Switch { label, .. } | Statement::Select { label, .. } => Some((*label, false)),

				Statement::Break { label: Some(label), pos } => {
					if !targets.iter().any(|(target, _)| *target == Some(*label)) {
						return Err(unresolved(function, *label, *pos));
					}
					None
				}

				Statement::Continue { label: Some(label), pos } => {
					if !targets.iter().any(|(target, is_loop)| *is_loop && *target == Some(*label)) {
						return Err(unresolved(function, *label, *pos));
					}
					None
				}

				_ => None,
			};

			if let Some(target) = target {
				targets.push(target);
			}

			let result = check(statement.children(), targets, function);

			if target.is_some() {
				targets.pop();
			}

			result?;
		}

		Ok(())
	}

	check(function.body.0.iter().collect(), &mut Vec::new(), function)
}


fn unresolved(function: &Function, label: LabelId, pos: SourcePos) -> Error {
	Error::new(
		ErrorKind::UnresolvedLabel(function.label(label).name),
		function.name,
		function.path.clone(),
		pos,
	)
}


/// An enclosing statement that branches may target.
#[derive(Debug, Clone, Copy)]
struct Target {
	/// The label given in the source code.
	user: Option<LabelId>,
	/// The label of the lowered statement.
	label: LabelId,
	is_loop: bool,
}


/// The kind of collection a range statement iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
	Sequence,
	Count,
	Keyed,
}


struct Desugar<'a> {
	function: &'a mut Function,
	colors: &'a Colors,
	/// Enclosing branch targets, innermost last.
	targets: Vec<Target>,
	/// Labels targeted by some branch.
	referenced: HashSet<LabelId>,
	/// The list of deferred calls, created on the first defer.
	defers: Option<VarId>,
}


impl<'a> Desugar<'a> {
	fn error(&self, kind: ErrorKind, pos: SourcePos) -> Error {
		Error::new(kind, self.function.name, self.function.path.clone(), pos)
	}


	/// Declare a compiler temporary.
	fn temp(&mut self, prefix: &'static str, ty: Type) -> VarId {
		self.function.declare(Name::Temp(prefix, fresh()), ty, LocalKind::Var)
	}


	fn is_temp(&self, var: VarId) -> bool {
		matches!(self.function.local(var).name, Name::Temp(..))
	}


	fn defers(&mut self) -> VarId {
		match self.defers {
			Some(list) => list,
			None => {
				let list = self.temp("defers", Type::Array(Box::new(Type::Any)));
				self.defers = Some(list);
				list
			}
		}
	}


	/// Enter a breakable statement, creating its label.
	fn enter(&mut self, user: Option<LabelId>, is_loop: bool) -> Target {
		let label = self.function.declare_label(Name::Temp("L", fresh()));
		let target = Target { user, label, is_loop };
		self.targets.push(target);
		target
	}


	/// Find the label targeted by a break or continue.
	fn resolve(&mut self, label: Option<LabelId>, is_continue: bool, pos: SourcePos) -> Result<LabelId, Error> {
		let target = self.targets
			.iter()
			.rev()
			.find(
				|target| match label {
					Some(label) => target.user == Some(label),
					None => !is_continue || target.is_loop,
				}
			)
			.copied();

		match (target, label) {
			(Some(target), _) if !is_continue || target.is_loop => {
				self.referenced.insert(target.label);
				Ok(target.label)
			}

			(_, Some(label)) => Err(self.error(ErrorKind::UnresolvedLabel(self.function.label(label).name), pos)),

			(_, None) => Err(
				self.error(
					ErrorKind::UnsupportedStatement(if is_continue { "continue" } else { "break" }),
					pos,
				)
			),
		}
	}


	fn block(&mut self, block: Block, out: &mut Vec<Statement>) -> Result<(), Error> {
		for statement in block.0.into_vec() { // Use vec's owned iterator.
			self.statement(statement, out)?;
		}

		Ok(())
	}


	/// Desugar a nested block, after the given statements.
	fn nested(&mut self, block: Block, mut prelude: Vec<Statement>) -> Result<Block, Error> {
		self.block(block, &mut prelude)?;
		Ok(prelude.into())
	}


	fn statement(&mut self, statement: Statement, out: &mut Vec<Statement>) -> Result<(), Error> {
		match statement {
			Statement::Block(block) => self.block(block, out),

			Statement::Declare { var, init, pos } => {
				let value = init.unwrap_or_else(
					|| Expr::literal(self.function.local(var).ty.zero(), pos)
				);

				self.assign(Place::Variable(var), value, pos, out);
				Ok(())
			}

			// Constants and types are declared in the prologue.
			Statement::Const { .. } | Statement::Type { .. } => Ok(()),

			Statement::Assign { place, value, pos } => {
				self.assign(place, value, pos, out);
				Ok(())
			}

			Statement::Send { channel, value, pos } => {
				let (channel, value) = self.pair(channel, value, out);
				out.push(Statement::Send { channel, value, pos });
				Ok(())
			}

			Statement::Expr(expr) => {
				let expr = self.tail(expr, out);
				out.push(Statement::Expr(expr));
				Ok(())
			}

			Statement::If { init, condition, then, otherwise, pos } => {
				if let Some(init) = init {
					self.statement(*init, out)?;
				}

				let condition = self.condition(condition, pos, out);
				let then = self.nested(then, Vec::new())?;
				let otherwise = self.nested(otherwise, Vec::new())?;

				out.push(Statement::If { init: None, condition, then, otherwise, pos });
				Ok(())
			}

			Statement::For { label, init, condition, post, body, pos } => {
				if let Some(init) = init {
					self.statement(*init, out)?;
				}

				let post = match post {
					Some(post) => Some(Box::new(self.post(*post)?)),
					None => None,
				};

				let target = self.enter(label, true);

				let mut prelude = Vec::new();
				if let Some(condition) = condition {
					self.exit_if(Expr::not(condition), target.label, pos, &mut prelude);
				}

				let body = self.nested(body, prelude);
				self.targets.pop();

				out.push(
					Statement::For {
						label: Some(target.label),
						init: None,
						condition: None,
						post,
						body: body?,
						pos,
					}
				);

				Ok(())
			}

			Statement::Range { label, key, value, expr, ty, body, pos } => {
				let collection = match &ty {
					Some(Type::Chan(_)) => return Err(
						self.error(ErrorKind::UnsupportedStatement("range over a channel"), pos)
					),
					Some(Type::Array(_)) | Some(Type::String) => Collection::Sequence,
					Some(Type::Int) => Collection::Count,
					_ => Collection::Keyed,
				};

				self.range(label, key, value, expr, ty, collection, body, pos, out)
			}

			Statement::Switch { label, init, tag, cases, pos } => {
				if let Some(init) = init {
					self.statement(*init, out)?;
				}

				self.switch(label, tag, cases, pos, out)
			}

			Statement::Select { label, cases, pos } => self.select(label, cases, pos, out),

			Statement::Break { label, pos } => {
				let label = self.resolve(label, false, pos)?;
				out.push(Statement::Break { label: Some(label), pos });
				Ok(())
			}

			Statement::Continue { label, pos } => {
				let label = self.resolve(label, true, pos)?;
				out.push(Statement::Continue { label: Some(label), pos });
				Ok(())
			}

			Statement::Fallthrough { pos } => Err(
				self.error(ErrorKind::UnsupportedStatement("fallthrough"), pos)
			),

			Statement::Return { value, pos } => {
				let value = value.map(|value| self.tail(value, out));
				out.push(Statement::Return { value, pos });
				Ok(())
			}

			Statement::Defer { call, .. } => {
				let list = self.defers();

				let call = match call {
					Expr::Call { callee, args, pos } => {
						let args = self.operands(args.into_vec(), out);
						Expr::Call { callee, args: args.into(), pos }
					}

					call => self.tail(call, out),
				};

				out.push(Statement::Frame(FrameOp::Defer { list, call }));
				Ok(())
			}

			Statement::Branch { .. }
			| Statement::Frame(_)
			| Statement::Dispatch(_)
			| Statement::Scoped { .. } => panic!("lowering statement in source function"),
		}
	}


	/// Check a loop post statement, which must not have effects besides the assignment.
	fn post(&self, statement: Statement) -> Result<Statement, Error> {
		let calls = |expr: &Expr| expr.any(
			&mut |expr| matches!(expr, Expr::Call { .. } | Expr::Yield { .. })
		);

		match statement {
			Statement::Assign { place, value, pos } => {
				if calls(&value) || place.exprs().into_iter().any(calls) {
					Err(self.error(ErrorKind::UnsupportedPostStatement, pos))
				} else {
					Ok(Statement::Assign { place, value, pos })
				}
			}

			Statement::Declare { pos, .. }
			| Statement::Send { pos, .. }
			| Statement::Defer { pos, .. } => Err(self.error(ErrorKind::UnsupportedPostStatement, pos)),

			Statement::Expr(expr) => Err(self.error(ErrorKind::UnsupportedPostStatement, expr.pos())),

			_ => Err(self.error(ErrorKind::UnsupportedPostStatement, self.function.pos)),
		}
	}


	/// Evaluate a branch condition into a temporary, unless it can't change.
	fn condition(&mut self, condition: Expr, pos: SourcePos, out: &mut Vec<Statement>) -> Expr {
		match &condition {
			Expr::Literal { .. } => condition,

			Expr::Variable { var, .. } if self.is_temp(*var) => condition,

			_ => {
				let var = self.temp("c", Type::Bool);
				self.assign(Place::Variable(var), condition, pos, out);
				Expr::variable(var, pos)
			}
		}
	}


	/// `_c = condition; if _c { break label }`
	fn exit_if(&mut self, condition: Expr, label: LabelId, pos: SourcePos, out: &mut Vec<Statement>) {
		self.branch_if(condition, Statement::Break { label: Some(label), pos }, pos, out);
		self.referenced.insert(label);
	}


	fn branch_if(&mut self, condition: Expr, branch: Statement, pos: SourcePos, out: &mut Vec<Statement>) {
		let condition = self.condition(condition, pos, out);

		out.push(
			Statement::If {
				init: None,
				condition,
				then: vec![branch].into(),
				otherwise: Block::default(),
				pos,
			}
		);
	}


	/// Iterate a snapshot of the collection with a counter.
	/// Keyed collections iterate their keys, skipping the ones deleted during iteration.
	#[allow(clippy::too_many_arguments)]
	fn range(
		&mut self,
		label: Option<LabelId>,
		key: Option<VarId>,
		value: Option<VarId>,
		expr: Expr,
		ty: Option<Type>,
		collection: Collection,
		body: Block,
		pos: SourcePos,
		out: &mut Vec<Statement>,
	) -> Result<(), Error> {
		let variable = |var| Expr::variable(var, pos);
		let call = |name: &'static str, args: Vec<Expr>| Expr::Call {
			callee: Callee::Builtin(name),
			args: args.into(),
			pos,
		};

		let object = self.temp("a", ty.unwrap_or(Type::Any));
		self.assign(Place::Variable(object), expr, pos, out);

		let keys = match collection {
			Collection::Keyed => {
				let keys = self.temp("k", Type::Array(Box::new(Type::Any)));
				out.push(assignment(keys, call("keys", vec![variable(object)]), pos));
				Some(keys)
			}

			_ => None,
		};

		let bound = match keys {
			Some(keys) => call("len", vec![variable(keys)]),
			None if collection == Collection::Count => variable(object),
			None => call("len", vec![variable(object)]),
		};

		let index = self.temp("i", Type::Int);
		out.push(assignment(index, Expr::literal(Literal::Int(0), pos), pos));

		let target = self.enter(label, true);
		let mut prelude = Vec::new();

		self.exit_if(Expr::binary(variable(index), BinaryOp::GreaterEquals, bound), target.label, pos, &mut prelude);

		let current = match keys {
			Some(keys) => Expr::Index {
				object: Box::new(variable(keys)),
				index: Box::new(variable(index)),
				pos,
			},

			None => variable(index),
		};

		if keys.is_some() {
			let missing = Expr::not(call("has", vec![variable(object), current.clone()]));
			let skip = Statement::Continue { label: Some(target.label), pos };

			self.branch_if(missing, skip, pos, &mut prelude);
			self.referenced.insert(target.label);
		}

		if let Some(key) = key {
			prelude.push(assignment(key, current.clone(), pos));
		}

		match value {
			Some(value) if collection != Collection::Count => {
				let item = Expr::Index {
					object: Box::new(variable(object)),
					index: Box::new(current),
					pos,
				};

				prelude.push(assignment(value, item, pos));
			}

			_ => (),
		}

		let body = self.nested(body, prelude);
		self.targets.pop();

		let post = assignment(
			index,
			Expr::binary(variable(index), BinaryOp::Plus, Expr::literal(Literal::Int(1), pos)),
			pos,
		);

		out.push(
			Statement::For {
				label: Some(target.label),
				init: None,
				condition: None,
				post: Some(Box::new(post)),
				body: body?,
				pos,
			}
		);

		Ok(())
	}


	/// Select the case into a temporary with an if chain, then branch on it.
	fn switch(
		&mut self,
		label: Option<LabelId>,
		tag: SwitchTag,
		cases: Box<[SwitchCase]>,
		pos: SourcePos,
		out: &mut Vec<Statement>,
	) -> Result<(), Error> {
		let (tag, binding) = match tag {
			SwitchTag::None => (None, None),

			SwitchTag::Value(expr) => (Some(self.stash("t", expr, pos, out)), None),

			SwitchTag::Type { binding, expr } => (Some(self.stash("t", expr, pos, out)), binding),
		};

		let selector = self.temp("s", Type::Int);
		out.push(assignment(selector, Expr::literal(Literal::Int(-1), pos), pos));

		let select = |ix: usize| assignment(selector, Expr::literal(Literal::Int(ix as i64), pos), pos);

		let mut chain = match cases.iter().position(|case| matches!(case.guards, Guards::Default)) {
			Some(default) => vec![select(default)],
			None => Vec::new(),
		};

		for (ix, case) in cases.iter().enumerate().rev() {
			let variable = |var| Expr::variable(var, case.pos);

			let guards: Vec<Expr> = match (&case.guards, tag) {
				(Guards::Default, _) => continue,

				(Guards::Values(values), Some(tag)) => values
					.iter()
					.map(|value| Expr::binary(variable(tag), BinaryOp::Equals, value.clone()))
					.collect(),

				(Guards::Values(values), None) => values.to_vec(),

				(Guards::Types(types), tag) => {
					let tag = tag.expect("type switch without tag");

					types
						.iter()
						.map(
							|ty| Expr::TypeIs {
								expr: Box::new(variable(tag)),
								ty: ty.clone(),
								pos: case.pos,
							}
						)
						.collect()
				}
			};

			let guard = guards
				.into_iter()
				.reduce(|left, right| Expr::binary(left, BinaryOp::Or, right))
				.unwrap_or_else(|| Expr::literal(Literal::Bool(false), case.pos));

			let mut link = Vec::new();
			let condition = self.condition(guard, case.pos, &mut link);

			link.push(
				Statement::If {
					init: None,
					condition,
					then: vec![select(ix)].into(),
					otherwise: chain.into(),
					pos: case.pos,
				}
			);

			chain = link;
		}

		out.extend(chain);

		let target = self.enter(label, false);
		let mut arms = Vec::with_capacity(cases.len());

		for case in cases.into_vec() { // Use vec's owned iterator.
			let mut prelude = Vec::new();

			if let (Some(binding), Some(tag)) = (binding, tag) {
				prelude.push(assignment(binding, Expr::variable(tag, case.pos), case.pos));
			}

			match self.nested(case.body, prelude) {
				Ok(arm) => arms.push(arm),
				Err(error) => {
					self.targets.pop();
					return Err(error);
				}
			}
		}

		self.targets.pop();

		out.push(
			Statement::Branch {
				label: Some(target.label),
				selector: Expr::variable(selector, pos),
				arms: arms.into(),
				pos,
			}
		);

		Ok(())
	}


	/// Record the chosen case and the received value with a select that only assigns
	/// temporaries, then branch on the chosen case.
	fn select(
		&mut self,
		label: Option<LabelId>,
		cases: Box<[SelectCase]>,
		pos: SourcePos,
		out: &mut Vec<Statement>,
	) -> Result<(), Error> {
		// Channels and sent values are evaluated once, in source order, before choosing.
		let mut operands = Vec::new();

		for case in cases.iter() {
			match &case.comm {
				Comm::Receive { channel, .. } => operands.push(channel.clone()),
				Comm::Send { channel, value } => {
					operands.push(channel.clone());
					operands.push(value.clone());
				}
				Comm::Default => (),
			}
		}

		let operands: Vec<Expr> = self
			.operands(operands, out)
			.into_iter()
			.map(|operand| self.value(operand, out))
			.collect();
		let mut operands = operands.into_iter();

		let selector = self.temp("s", Type::Int);
		out.push(assignment(selector, Expr::literal(Literal::Int(-1), pos), pos));

		let mut recording = Vec::with_capacity(cases.len());
		let mut arms = Vec::with_capacity(cases.len());

		for (ix, case) in cases.into_vec().into_iter().enumerate() { // Use vec's owned iterator.
			let mut next = || operands.next().expect("missing select operand");

			let (comm, received) = match case.comm {
				Comm::Receive { target, .. } => {
					let channel = next();

					let (target, received) = match target {
						ReceiveTarget::Discard => (ReceiveTarget::Discard, None),

						ReceiveTarget::Define(var) => {
							let ty = self.function.local(var).ty.clone();
							let temp = self.temp("r", ty);
							(ReceiveTarget::Assign(Place::Variable(temp)), Some((Place::Variable(var), temp)))
						}

						ReceiveTarget::Assign(place) => {
							let temp = self.temp("r", Type::Any);
							(ReceiveTarget::Assign(Place::Variable(temp)), Some((place, temp)))
						}
					};

					(Comm::Receive { target, channel }, received)
				}

				Comm::Send { .. } => {
					let channel = next();
					let value = next();
					(Comm::Send { channel, value }, None)
				}

				Comm::Default => (Comm::Default, None),
			};

			recording.push(
				SelectCase {
					comm,
					body: vec![assignment(selector, Expr::literal(Literal::Int(ix as i64), case.pos), case.pos)].into(),
					pos: case.pos,
				}
			);

			arms.push((received, case.body, case.pos));
		}

		out.push(Statement::Select { label: None, cases: recording.into(), pos });

		let target = self.enter(label, false);
		let mut branches = Vec::with_capacity(arms.len());

		for (received, body, pos) in arms {
			let mut prelude = Vec::new();

			if let Some((place, temp)) = received {
				self.assign(place, Expr::variable(temp, pos), pos, &mut prelude);
			}

			match self.nested(body, prelude) {
				Ok(arm) => branches.push(arm),
				Err(error) => {
					self.targets.pop();
					return Err(error);
				}
			}
		}

		self.targets.pop();

		out.push(
			Statement::Branch {
				label: Some(target.label),
				selector: Expr::variable(selector, pos),
				arms: branches.into(),
				pos,
			}
		);

		Ok(())
	}


	/// Evaluate an expression into a new temporary.
	fn stash(&mut self, prefix: &'static str, expr: Expr, pos: SourcePos, out: &mut Vec<Statement>) -> VarId {
		let var = self.temp(prefix, Type::Any);
		self.assign(Place::Variable(var), expr, pos, out);
		var
	}
}


fn assignment(var: VarId, value: Expr, pos: SourcePos) -> Statement {
	Statement::Assign { place: Place::Variable(var), value, pos }
}


/// Remove the labels of statements no branch targets.
fn remove_dead_labels(block: &mut Block, referenced: &HashSet<LabelId>) {
	let keep = |label: &mut Option<LabelId>| {
		if let Some(id) = *label {
			if !referenced.contains(&id) {
				*label = None;
			}
		}
	};

	for statement in block.0.iter_mut() {
		match statement {
			Statement::Block(block) => remove_dead_labels(block, referenced),

			Statement::If { then, otherwise, .. } => {
				remove_dead_labels(then, referenced);
				remove_dead_labels(otherwise, referenced);
			}

			Statement::For { label, body, .. } => {
				keep(label);
				remove_dead_labels(body, referenced);
			}

			Statement::Branch { label, arms, .. } => {
				keep(label);
				for arm in arms.iter_mut() {
					remove_dead_labels(arm, referenced);
				}
			}

			_ => (),
		}
	}
}


/// Give every local declared in the body a unique name, as all of them now live in the
/// function prologue.
fn hoist(function: &mut Function) {
	for local in function.locals.iter_mut() {
		match (&local.kind, local.name) {
			(LocalKind::Param, _) => (),
			(_, Name::User(symbol)) => local.name = Name::Hoisted(symbol, fresh()),
			_ => (),
		}
	}
}
