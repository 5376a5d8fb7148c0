mod error;
mod scope;
pub mod program;
#[cfg(test)]
mod tests;

use std::{
	collections::{HashMap, HashSet},
	path::Path,
	sync::Arc,
};

use crate::{runtime::lib as builtins, symbol::{self, Symbol}};
use super::syntax::{ast, SourcePos};
pub use error::{Error, ErrorKind, Errors, ErrorsDisplayContext};
pub use program::Program;
use program::{
	Alias,
	Block,
	Callee,
	Comm,
	Expr,
	FnId,
	Function,
	Guards,
	LabelId,
	Literal,
	LocalKind,
	Name,
	Place,
	ReceiveTarget,
	SelectCase,
	Signature,
	Statement,
	SwitchCase,
	SwitchTag,
	Type,
	UnaryOp,
	VarId,
};


/// Perform semantic analysis in the syntax trees of every source file of a package.
pub fn analyze(
	path: &Path,
	asts: Vec<ast::Ast>,
	interner: &mut symbol::Interner,
) -> Result<Program, Errors> {
	let blank = interner.get_or_intern("_");
	let interner = &*interner;

	let mut errors = Errors::default();
	let mut type_decls = Vec::new();
	let mut fun_decls = Vec::new();

	for ast in asts {
		let path: Arc<Path> = ast.path.into();

		for item in ast.items.into_vec() { // Use vec's owned iterator.
			match item {
				ast::Item::Type { name, ty, pos } => type_decls.push((name, ty, pos, path.clone())),
				ast::Item::Function(function) => fun_decls.push((function, path.clone())),
			}
		}
	}

	// Aliases may reference each other in any order, so they are resolved on demand.
	let mut resolver = AliasResolver {
		interner,
		decls: HashMap::new(),
		resolved: HashMap::new(),
		visiting: HashSet::new(),
	};

	for (name, ty, pos, path) in type_decls.iter() {
		let is_builtin = builtin_type(*name, interner).is_some();

		if is_builtin || resolver.decls.insert(*name, ty).is_some() {
			errors.push(Error::new(ErrorKind::DuplicateType(*name), path.clone(), *pos));
		}
	}

	let mut aliases = Vec::new();

	for (name, ty, pos, path) in type_decls.iter() {
		match resolver.resolve(ty) {
			Ok(ty) => {
				if !aliases.iter().any(|alias: &Alias| alias.name == *name) {
					aliases.push(Alias { name: *name, ty, pos: *pos });
				}
			}

			Err((symbol, pos)) => errors.push(
				Error::new(ErrorKind::UndeclaredType(symbol), path.clone(), pos)
			),
		}
	}

	let mut package = Package {
		interner,
		blank,
		aliases: HashMap::new(),
		functions: HashMap::new(),
		headers: Vec::new(),
	};

	let mut headers = Vec::new();

	for (function, path) in fun_decls {
		if package.functions.contains_key(&function.name) {
			errors.push(
				Error::new(ErrorKind::DuplicateFunction(function.name), path, function.pos)
			);
			continue;
		}

		let mut resolve = |ty: &ast::TypeExpr| match resolver.resolve(ty) {
			Ok(ty) => Some(ty),
			Err((symbol, pos)) => {
				errors.push(Error::new(ErrorKind::UndeclaredType(symbol), path.clone(), pos));
				None
			}
		};

		let params: Vec<_> = function.params
			.iter()
			.map(|param| (param.name, resolve(&param.ty), param.pos))
			.collect();

		let result = function.result.as_ref().and_then(&mut resolve);

		let id = FnId(package.headers.len() as u32);
		package.functions.insert(function.name, id);
		package.headers.push((params.len(), result.clone()));

		headers.push(Header { function, path, params, result });
	}

	package.aliases = resolver.resolved;

	let functions: Vec<Option<Function>> = headers
		.into_iter()
		.map(|header| analyze_function(header, &package, &mut errors))
		.collect();

	tracing::debug!(
		target: "corolla::semantic",
		path = %path.display(),
		functions = functions.len(),
		errors = errors.0.len(),
		"analyzed package"
	);

	match functions.into_iter().collect::<Option<Vec<Function>>>() {
		Some(functions) if errors.is_empty() => Ok(
			Program {
				path: path.into(),
				aliases,
				functions,
			}
		),

		_ => Err(errors),
	}
}


/// Package wide declarations.
#[derive(Debug)]
struct Package<'a> {
	interner: &'a symbol::Interner,
	/// The blank identifier.
	blank: Symbol,
	aliases: HashMap<Symbol, Type>,
	functions: HashMap<Symbol, FnId>,
	/// Arity and result type, by function id.
	headers: Vec<(usize, Option<Type>)>,
}


/// A function declaration with its resolved signature.
struct Header {
	function: ast::Function,
	path: Arc<Path>,
	/// Parameters. The type is missing if it failed to resolve.
	params: Vec<(Symbol, Option<Type>, SourcePos)>,
	result: Option<Type>,
}


fn builtin_type(name: Symbol, interner: &symbol::Interner) -> Option<Type> {
	interner
		.resolve(name)
		.and_then(Type::builtin)
}


/// Resolution of top level type aliases.
struct AliasResolver<'a> {
	interner: &'a symbol::Interner,
	decls: HashMap<Symbol, &'a ast::TypeExpr>,
	resolved: HashMap<Symbol, Type>,
	/// Aliases being resolved, to detect cycles.
	visiting: HashSet<Symbol>,
}


impl<'a> AliasResolver<'a> {
	/// Resolve a type expression, returning the offending name on failure.
	fn resolve(&mut self, ty: &ast::TypeExpr) -> Result<Type, (Symbol, SourcePos)> {
		match ty {
			ast::TypeExpr::Named { name, pos } => {
				if let Some(ty) = builtin_type(*name, self.interner) {
					return Ok(ty);
				}

				if let Some(ty) = self.resolved.get(name) {
					return Ok(ty.clone());
				}

				match self.decls.get(name).copied() {
					Some(decl) if self.visiting.insert(*name) => {
						let ty = self.resolve(decl);
						self.visiting.remove(name);

						let ty = ty?;
						self.resolved.insert(*name, ty.clone());
						Ok(ty)
					}

					_ => Err((*name, *pos)),
				}
			}

			ast::TypeExpr::Nil { .. } => Ok(Type::Nil),

			ast::TypeExpr::Array { item, .. } => Ok(Type::Array(Box::new(self.resolve(item)?))),

			ast::TypeExpr::Map { key, value, .. } => Ok(
				Type::Map(Box::new(self.resolve(key)?), Box::new(self.resolve(value)?))
			),

			ast::TypeExpr::Chan { item, .. } => Ok(Type::Chan(Box::new(self.resolve(item)?))),
		}
	}
}


fn analyze_function(header: Header, package: &Package, errors: &mut Errors) -> Option<Function> {
	let Header { function: decl, path, params, result } = header;

	let mut function = Function {
		name: decl.name,
		path: path.clone(),
		params: 0,
		result,
		locals: Vec::new(),
		labels: Vec::new(),
		body: Block::default(),
		signature: None,
		lowered: false,
		pos: decl.pos,
	};

	let mut labels = HashMap::new();
	collect_labels(&decl.body, &mut labels, &mut function, &path, errors);

	let mut scope = scope::Stack::default();

	let body = {
		let mut context = Context::new(package, &mut function, &mut scope, &labels, &path, errors);

		let mut params_ok = true;

		for (name, ty, pos) in params {
			params_ok &= ty.is_some();

			let ty = ty.unwrap_or(Type::Any);
			params_ok &= declare(name, ty, LocalKind::Param, pos, &mut context).is_some();
			context.function.params += 1;
		}

		// Parameters share the scope of the function body.
		let body = analyze_statements(decl.body.0, &mut context);

		body.filter(|_| params_ok)
	};

	function.body = body?;

	Some(function)
}


/// Declare every label of the function.
fn collect_labels(
	block: &ast::Block,
	labels: &mut HashMap<Symbol, LabelId>,
	function: &mut Function,
	path: &Arc<Path>,
	errors: &mut Errors,
) {
	fn visit(
		statement: &ast::Statement,
		labels: &mut HashMap<Symbol, LabelId>,
		function: &mut Function,
		path: &Arc<Path>,
		errors: &mut Errors,
	) {
		match statement {
			ast::Statement::Labeled { label, statement, pos } => {
				if labels.contains_key(label) {
					errors.push(Error::new(ErrorKind::DuplicateLabel(*label), path.clone(), *pos));
				} else {
					let id = function.declare_label(Name::User(*label));
					labels.insert(*label, id);
				}

				visit(statement, labels, function, path, errors);
			}

			ast::Statement::Block(block)
			| ast::Statement::For { body: block, .. }
			| ast::Statement::Range { body: block, .. } => {
				collect_labels(block, labels, function, path, errors)
			}

			ast::Statement::If { then, otherwise, .. } => {
				collect_labels(then, labels, function, path, errors);
				if let Some(otherwise) = otherwise {
					collect_labels(otherwise, labels, function, path, errors);
				}
			}

			ast::Statement::Switch { cases, .. } => {
				for case in cases.iter() {
					collect_labels(&case.body, labels, function, path, errors);
				}
			}

			ast::Statement::Select { cases, .. } => {
				for case in cases.iter() {
					collect_labels(&case.body, labels, function, path, errors);
				}
			}

			_ => (),
		}
	}

	for statement in block.0.iter() {
		visit(statement, labels, function, path, errors);
	}
}


fn analyze_statements(statements: Box<[ast::Statement]>, context: &mut Context) -> Option<Block> {
	let block = analyze_items(
		analyze_statement,
		statements.into_vec(), // Use vec's owned iterator.
		context,
	)?;

	Some(block.into())
}


fn analyze_block(block: ast::Block, context: &mut Context) -> Option<Block> {
	let mut context = context.enter_block();
	analyze_statements(block.0, &mut context)
}


fn analyze_statement(statement: ast::Statement, context: &mut Context) -> Option<Statement> {
	analyze_labeled(statement, None, context)
}


/// Analyze a statement which may be the target of a label.
fn analyze_labeled(
	statement: ast::Statement,
	label: Option<LabelId>,
	context: &mut Context,
) -> Option<Statement> {
	match statement {
		ast::Statement::Block(block) => Some(Statement::Block(analyze_block(block, context)?)),

		ast::Statement::Var { name, ty, init, pos } => {
			let ty = ty.map(|ty| analyze_type(&ty, context));
			let init = init.map(|init| analyze_expr(init, context));

			let local_ty = match (&ty, &init) {
				(Some(Some(ty)), _) => ty.clone(),
				(None, Some(Some(init))) => type_of(init, context).unwrap_or(Type::Any),
				_ => Type::Any,
			};

			let var = declare(name, local_ty, LocalKind::Var, pos, context);

			lift(ty)?;
			let init = lift(init)?;

			Some(Statement::Declare { var: var?, init, pos })
		}

		ast::Statement::Define { name, init, pos } => {
			let init = analyze_expr(init, context);

			let ty = init
				.as_ref()
				.and_then(|init| type_of(init, context))
				.unwrap_or(Type::Any);

			let var = declare(name, ty, LocalKind::Var, pos, context);

			Some(Statement::Declare { var: var?, init: Some(init?), pos })
		}

		ast::Statement::Const { name, value, pos } => {
			let literal = const_literal(value, context);

			let ty = match &literal {
				Some(literal) => literal_type(literal),
				None => Type::Any,
			};

			let var = declare(name, ty, LocalKind::Const(literal?), pos, context)?;

			Some(Statement::Const { var, pos })
		}

		ast::Statement::Type { name, ty, pos } => {
			let ty = analyze_type(&ty, context);

			if builtin_type(name, context.package.interner).is_some() {
				context.report(ErrorKind::DuplicateType(name), pos);
				return None;
			}

			let var = declare(name, ty?, LocalKind::Type, pos, context)?;

			Some(Statement::Type { var, pos })
		}

		ast::Statement::Assign { target, op, value, pos } => {
			let is_blank = matches!(
				&target,
				ast::Expr::Identifier { identifier, .. } if *identifier == context.package.blank
			);

			if is_blank && op.is_none() {
				return Some(Statement::Expr(analyze_expr(value, context)?));
			}

			let place = analyze_place(target, context);
			let value = analyze_expr(value, context);

			let place = place?;
			let value = match op {
				Some(op) => Expr::binary(place_expr(&place, pos), op, value?),
				None => value?,
			};

			Some(Statement::Assign { place, value, pos })
		}

		ast::Statement::IncDec { target, increment, pos } => {
			let place = analyze_place(target, context)?;

			let op = if increment { ast::BinaryOp::Plus } else { ast::BinaryOp::Minus };
			let value = Expr::binary(place_expr(&place, pos), op, Expr::literal(Literal::Int(1), pos));

			Some(Statement::Assign { place, value, pos })
		}

		ast::Statement::Send { channel, value, pos } => {
			let channel = analyze_expr(channel, context);
			let value = analyze_expr(value, context);

			Some(Statement::Send { channel: channel?, value: value?, pos })
		}

		ast::Statement::Expr(expr) => Some(Statement::Expr(analyze_expr(expr, context)?)),

		ast::Statement::If { init, condition, then, otherwise, pos } => {
			let mut context = context.enter_block();

			let init = init.map(|init| analyze_statement(*init, &mut context));
			let condition = analyze_expr(condition, &mut context);
			let then = analyze_block(then, &mut context);
			let otherwise = match otherwise {
				Some(otherwise) => analyze_block(otherwise, &mut context),
				None => Some(Block::default()),
			};

			Some(
				Statement::If {
					init: lift(init)?.map(Box::new),
					condition: condition?,
					then: then?,
					otherwise: otherwise?,
					pos,
				}
			)
		}

		ast::Statement::For { init, condition, post, body, pos } => {
			let mut context = context.enter_block();

			let init = init.map(|init| analyze_statement(*init, &mut context));
			let condition = condition.map(|condition| analyze_expr(condition, &mut context));
			let post = post.map(|post| analyze_statement(*post, &mut context));

			let body = {
				let mut context = context.enter_loop();
				analyze_statements(body.0, &mut context)
			};

			Some(
				Statement::For {
					label,
					init: lift(init)?.map(Box::new),
					condition: lift(condition)?,
					post: lift(post)?.map(Box::new),
					body: body?,
					pos,
				}
			)
		}

		ast::Statement::Range { key, value, expr, body, pos } => {
			let expr = analyze_expr(expr, context);
			let ty = expr.as_ref().and_then(|expr| type_of(expr, context));

			let mut context = context.enter_loop();

			let (key_ty, value_ty) = range_types(ty.as_ref());

			let key = declare_binding(key, key_ty, &mut context);
			let value = declare_binding(value, value_ty, &mut context);

			let body = analyze_statements(body.0, &mut context);

			Some(
				Statement::Range {
					label,
					key: key?,
					value: value?,
					expr: expr?,
					ty,
					body: body?,
					pos,
				}
			)
		}

		ast::Statement::Switch { init, tag, cases, pos } => {
			let mut context = context.enter_block();

			let init = init.map(|init| analyze_statement(*init, &mut context));

			let (tag, is_type_switch) = match tag {
				ast::SwitchTag::None => (Some(SwitchTag::None), false),

				ast::SwitchTag::Value(expr) => (analyze_expr(expr, &mut context).map(SwitchTag::Value), false),

				ast::SwitchTag::Type { binding, expr } => {
					let expr = analyze_expr(expr, &mut context);

					let binding = match binding {
						Some((name, pos)) => declare(name, Type::Any, LocalKind::Var, pos, &mut context).map(Some),
						None => Some(None),
					};

					let tag = expr
						.zip(binding)
						.map(|(expr, binding)| SwitchTag::Type { binding, expr });

					(tag, true)
				}
			};

			let count = cases.len();

			let cases = {
				let mut context = context.enter_breakable();

				analyze_items(
					|(ix, case), context| {
						let fallthrough = !is_type_switch && ix + 1 < count;
						analyze_case(case, fallthrough, context)
					},
					cases.into_vec().into_iter().enumerate(), // Use vec's owned iterator.
					&mut context,
				)
			};

			Some(
				Statement::Switch {
					label,
					init: lift(init)?.map(Box::new),
					tag: tag?,
					cases: cases?,
					pos,
				}
			)
		}

		ast::Statement::Select { cases, pos } => {
			let mut context = context.enter_breakable();

			let cases = analyze_items(
				analyze_select_case,
				cases.into_vec(), // Use vec's owned iterator.
				&mut context,
			)?;

			Some(Statement::Select { label, cases, pos })
		}

		ast::Statement::Labeled { label, statement, .. } => {
			let id = context.labels.get(&label).copied();

			match *statement {
				statement @ (
					ast::Statement::For { .. }
					| ast::Statement::Range { .. }
					| ast::Statement::Switch { .. }
					| ast::Statement::Select { .. }
				) => analyze_labeled(statement, id, context),

				// Labels of other statements can only be targeted by goto.
				statement => analyze_labeled(statement, None, context),
			}
		}

		ast::Statement::Break { label, pos } => match label {
			Some(label) => Some(Statement::Break { label: Some(resolve_label(label, pos, context)?), pos }),

			None if context.in_breakable => Some(Statement::Break { label: None, pos }),

			None => {
				context.report(ErrorKind::BreakOutsideLoop, pos);
				None
			}
		},

		ast::Statement::Continue { label, pos } => match label {
			Some(label) => Some(Statement::Continue { label: Some(resolve_label(label, pos, context)?), pos }),

			None if context.in_loop => Some(Statement::Continue { label: None, pos }),

			None => {
				context.report(ErrorKind::ContinueOutsideLoop, pos);
				None
			}
		},

		ast::Statement::Goto { pos, .. } => {
			context.report(ErrorKind::Goto, pos);
			None
		}

		// Valid fallthroughs are handled by the enclosing switch case.
		ast::Statement::Fallthrough { pos } => {
			context.report(ErrorKind::MisplacedFallthrough, pos);
			None
		}

		ast::Statement::Return { value, pos } => {
			let value = value.map(|value| analyze_expr(value, context));

			match (&context.function.result, &value) {
				(Some(ty), None) => {
					let expected = Some(ty.clone());
					context.report(ErrorKind::ReturnMismatch { expected }, pos);
					return None;
				}

				(None, Some(_)) => {
					context.report(ErrorKind::ReturnMismatch { expected: None }, pos);
					return None;
				}

				_ => (),
			}

			Some(Statement::Return { value: lift(value)?, pos })
		}

		ast::Statement::Defer { call, pos } => Some(Statement::Defer { call: analyze_expr(call, context)?, pos }),
	}
}


fn analyze_case(case: ast::SwitchCase, fallthrough: bool, context: &mut Context) -> Option<SwitchCase> {
	let mut context = context.enter_block();

	let guards = match case.guards {
		ast::Guards::Default => Some(Guards::Default),

		ast::Guards::Values(values) => analyze_items(
			analyze_expr,
			values.into_vec(), // Use vec's owned iterator.
			&mut context,
		).map(Guards::Values),

		ast::Guards::Types(types) => analyze_items(
			|ty, context| analyze_type(&ty, context),
			types.into_vec(), // Use vec's owned iterator.
			&mut context,
		).map(Guards::Types),
	};

	let mut statements = case.body.0.into_vec();

	let last = match statements.last() {
		Some(ast::Statement::Fallthrough { .. }) if fallthrough => statements.pop(),
		_ => None,
	};

	let body = analyze_items(analyze_statement, statements, &mut context);

	let mut body = body?.into_vec();

	if let Some(ast::Statement::Fallthrough { pos }) = last {
		body.push(Statement::Fallthrough { pos });
	}

	Some(
		SwitchCase {
			guards: guards?,
			body: body.into(),
			pos: case.pos,
		}
	)
}


fn analyze_select_case(case: ast::SelectCase, context: &mut Context) -> Option<SelectCase> {
	let mut context = context.enter_block();

	let comm = match case.comm {
		ast::Comm::Receive { target, channel } => {
			let channel = analyze_expr(channel, &mut context);

			let target = match target {
				ast::ReceiveTarget::Discard => Some(ReceiveTarget::Discard),

				ast::ReceiveTarget::Define(name, pos) => {
					let ty = match channel.as_ref().and_then(|channel| type_of(channel, &context)) {
						Some(Type::Chan(item)) => *item,
						_ => Type::Any,
					};

					declare(name, ty, LocalKind::Var, pos, &mut context).map(ReceiveTarget::Define)
				}

				ast::ReceiveTarget::Assign(expr) => analyze_place(expr, &mut context).map(ReceiveTarget::Assign),
			};

			channel
				.zip(target)
				.map(|(channel, target)| Comm::Receive { target, channel })
		}

		ast::Comm::Send { channel, value } => {
			let channel = analyze_expr(channel, &mut context);
			let value = analyze_expr(value, &mut context);

			channel
				.zip(value)
				.map(|(channel, value)| Comm::Send { channel, value })
		}

		ast::Comm::Default => Some(Comm::Default),
	};

	let body = analyze_statements(case.body.0, &mut context);

	Some(
		SelectCase {
			comm: comm?,
			body: body?,
			pos: case.pos,
		}
	)
}


fn analyze_place(expr: ast::Expr, context: &mut Context) -> Option<Place> {
	match expr {
		ast::Expr::Identifier { identifier, pos } => {
			let var = resolve_var(identifier, pos, context)?;

			match context.function.local(var).kind {
				LocalKind::Param | LocalKind::Var => Some(Place::Variable(var)),

				LocalKind::Const(_) => {
					context.report(ErrorKind::AssignToConstant(identifier), pos);
					None
				}

				LocalKind::Type => {
					context.report(ErrorKind::NotAValue(identifier), pos);
					None
				}
			}
		}

		ast::Expr::Index { object, index, .. } => {
			let object = analyze_expr(*object, context);
			let index = analyze_expr(*index, context);

			Some(Place::Index { object: object?, index: index? })
		}

		expr => {
			context.report(ErrorKind::InvalidAssignment, expr.pos());
			None
		}
	}
}


/// The expression that reads a place.
fn place_expr(place: &Place, pos: SourcePos) -> Expr {
	match place {
		Place::Variable(var) => Expr::variable(*var, pos),
		Place::Index { object, index } => Expr::Index {
			object: Box::new(object.clone()),
			index: Box::new(index.clone()),
			pos,
		},
	}
}


fn analyze_expr(expr: ast::Expr, context: &mut Context) -> Option<Expr> {
	match expr {
		ast::Expr::Identifier { identifier, pos } => {
			let var = resolve_var(identifier, pos, context)?;

			if let LocalKind::Type = context.function.local(var).kind {
				context.report(ErrorKind::NotAValue(identifier), pos);
				return None;
			}

			Some(Expr::Variable { var, pos })
		}

		ast::Expr::Literal { literal, pos } => Some(
			Expr::Literal { literal: analyze_literal(literal, context)?, pos }
		),

		ast::Expr::UnaryOp { op, operand, pos } => {
			let operand = Box::new(analyze_expr(*operand, context)?);

			match op {
				ast::UnaryOp::Minus => Some(Expr::UnaryOp { op: UnaryOp::Minus, operand, pos }),
				ast::UnaryOp::Not => Some(Expr::UnaryOp { op: UnaryOp::Not, operand, pos }),
				ast::UnaryOp::Receive => Some(Expr::Receive { channel: operand, pos }),
			}
		}

		ast::Expr::BinaryOp { left, op, right, pos } => {
			let left = analyze_expr(*left, context);
			let right = analyze_expr(*right, context);

			Some(
				Expr::BinaryOp {
					left: Box::new(left?),
					op,
					right: Box::new(right?),
					pos,
				}
			)
		}

		ast::Expr::Index { object, index, pos } => {
			let object = analyze_expr(*object, context);
			let index = analyze_expr(*index, context);

			Some(
				Expr::Index {
					object: Box::new(object?),
					index: Box::new(index?),
					pos,
				}
			)
		}

		ast::Expr::Call { function, args, pos } => {
			let args = analyze_items(
				analyze_expr,
				args.into_vec(), // Use vec's owned iterator.
				context,
			);

			let callee = resolve_callee(function, args.as_ref().map(|args| args.len()), pos, context);

			Some(Expr::Call { callee: callee?, args: args?, pos })
		}

		ast::Expr::Make { ty, size, pos } => {
			let ty = analyze_type(&ty, context);
			let size = size.map(|size| analyze_expr(*size, context));

			Some(
				Expr::Make {
					ty: ty?,
					size: lift(size)?.map(Box::new),
					pos,
				}
			)
		}

		ast::Expr::Yield { yields, receives, value, pos } => {
			let yields = analyze_type(&yields, context);
			let receives = analyze_type(&receives, context);
			let value = analyze_expr(*value, context);

			Some(
				Expr::Yield {
					signature: Signature { yields: yields?, receives: receives? },
					value: Box::new(value?),
					pos,
				}
			)
		}

		ast::Expr::TypeGuard { pos, .. } => {
			context.report(ErrorKind::MisplacedTypeGuard, pos);
			None
		}
	}
}


fn analyze_literal(literal: ast::Literal, context: &mut Context) -> Option<Literal> {
	match literal {
		ast::Literal::Nil => Some(Literal::Nil),

		ast::Literal::Bool(b) => Some(Literal::Bool(b)),

		ast::Literal::Int(i) => Some(Literal::Int(i)),

		ast::Literal::Float(f) => Some(Literal::Float(f)),

		ast::Literal::String(s) => Some(Literal::String(s)),

		ast::Literal::Array(array) => {
			let array = analyze_items(
				analyze_expr,
				array.into_vec(), // Use vec's owned iterator.
				context
			)?;

			Some(Literal::Array(array))
		}

		ast::Literal::Dict(items) => {
			let items = analyze_items(
				|(key, value), context| {
					let key = analyze_expr(key, context);
					let value = analyze_expr(value, context);
					key.zip(value)
				},
				items.into_vec(), // Use vec's owned iterator.
				context,
			)?;

			Some(Literal::Dict(items))
		}
	}
}


/// The value of a constant, which must be a scalar literal, possibly negated.
fn const_literal(expr: ast::Expr, context: &mut Context) -> Option<Literal> {
	match expr {
		ast::Expr::Literal { literal, pos } => match literal {
			ast::Literal::Nil => Some(Literal::Nil),
			ast::Literal::Bool(b) => Some(Literal::Bool(b)),
			ast::Literal::Int(i) => Some(Literal::Int(i)),
			ast::Literal::Float(f) => Some(Literal::Float(f)),
			ast::Literal::String(s) => Some(Literal::String(s)),
			_ => {
				context.report(ErrorKind::NonLiteralConstant, pos);
				None
			}
		},

		ast::Expr::UnaryOp { op: ast::UnaryOp::Minus, operand, pos } => {
			match const_literal(*operand, context)? {
				Literal::Int(i) => Some(Literal::Int(i.wrapping_neg())),
				Literal::Float(f) => Some(Literal::Float(-f)),
				_ => {
					context.report(ErrorKind::NonLiteralConstant, pos);
					None
				}
			}
		}

		expr => {
			context.report(ErrorKind::NonLiteralConstant, expr.pos());
			None
		}
	}
}


fn analyze_type(ty: &ast::TypeExpr, context: &mut Context) -> Option<Type> {
	match ty {
		ast::TypeExpr::Named { name, pos } => {
			if let Some(ty) = builtin_type(*name, context.package.interner) {
				return Some(ty);
			}

			let local = context.scope
				.resolve(*name)
				.map(|var| context.function.local(var))
				.filter(|local| matches!(local.kind, LocalKind::Type));

			if let Some(local) = local {
				return Some(local.ty.clone());
			}

			match context.package.aliases.get(name) {
				Some(ty) => Some(ty.clone()),
				None => {
					context.report(ErrorKind::UndeclaredType(*name), *pos);
					None
				}
			}
		}

		ast::TypeExpr::Nil { .. } => Some(Type::Nil),

		ast::TypeExpr::Array { item, .. } => Some(Type::Array(Box::new(analyze_type(item, context)?))),

		ast::TypeExpr::Map { key, value, .. } => {
			let key = analyze_type(key, context);
			let value = analyze_type(value, context);

			Some(Type::Map(Box::new(key?), Box::new(value?)))
		}

		ast::TypeExpr::Chan { item, .. } => Some(Type::Chan(Box::new(analyze_type(item, context)?))),
	}
}


fn resolve_var(symbol: Symbol, pos: SourcePos, context: &mut Context) -> Option<VarId> {
	let var = context.scope.resolve(symbol);

	if var.is_none() {
		context.report(ErrorKind::UndeclaredVariable(symbol), pos);
	}

	var
}


fn resolve_label(label: Symbol, pos: SourcePos, context: &mut Context) -> Option<LabelId> {
	let id = context.labels.get(&label).copied();

	if id.is_none() {
		context.report(ErrorKind::UndeclaredLabel(label), pos);
	}

	id
}


/// Resolve a call target. User functions take precedence over builtins.
fn resolve_callee(
	function: Symbol,
	argc: Option<usize>,
	pos: SourcePos,
	context: &mut Context,
) -> Option<Callee> {
	if let Some(&id) = context.package.functions.get(&function) {
		let (expected, _) = &context.package.headers[id.0 as usize];

		match argc {
			Some(got) if got != *expected => {
				let expected = *expected;
				context.report(ErrorKind::ArgumentCount { function, expected, got }, pos);
				None
			}

			_ => Some(Callee::Function(id)),
		}
	} else {
		let builtin = context.package.interner
			.resolve(function)
			.and_then(builtins::name);

		if builtin.is_none() {
			context.report(ErrorKind::UndeclaredFunction(function), pos);
		}

		builtin.map(Callee::Builtin)
	}
}


/// Declare a range binding, unless it is missing or blank.
fn declare_binding(
	binding: Option<(Symbol, SourcePos)>,
	ty: Type,
	context: &mut Context,
) -> Option<Option<VarId>> {
	match binding {
		Some((name, pos)) if name != context.package.blank => Some(
			Some(declare(name, ty, LocalKind::Var, pos, context)?)
		),
		_ => Some(None),
	}
}


/// Declare a local in the current scope. The blank identifier is never in scope.
fn declare(
	name: Symbol,
	ty: Type,
	kind: LocalKind,
	pos: SourcePos,
	context: &mut Context,
) -> Option<VarId> {
	let var = context.function.declare(Name::User(name), ty, kind);

	if name == context.package.blank {
		return Some(var);
	}

	match context.scope.declare(name, var) {
		Ok(var) => Some(var),
		Err(error) => {
			context.report(error, pos);
			None
		}
	}
}


fn literal_type(literal: &Literal) -> Type {
	match literal {
		Literal::Nil => Type::Nil,
		Literal::Bool(_) => Type::Bool,
		Literal::Int(_) => Type::Int,
		Literal::Float(_) => Type::Float,
		Literal::String(_) => Type::String,
		Literal::Array(_) => Type::Array(Box::new(Type::Any)),
		Literal::Dict(_) => Type::Map(Box::new(Type::Any), Box::new(Type::Any)),
	}
}


/// The static type of an expression, when it can be told without a type checker.
fn type_of(expr: &Expr, context: &Context) -> Option<Type> {
	match expr {
		Expr::Variable { var, .. } => match &context.function.local(*var).ty {
			Type::Any => None,
			ty => Some(ty.clone()),
		},

		Expr::Literal { literal, .. } => Some(literal_type(literal)),

		Expr::UnaryOp { op: UnaryOp::Not, .. } => Some(Type::Bool),

		Expr::UnaryOp { operand, .. } => type_of(operand, context),

		Expr::BinaryOp { left, op, .. } => {
			use ast::BinaryOp::*;
			match op {
				Equals | NotEquals | Greater | GreaterEquals | Lower | LowerEquals | And | Or => {
					Some(Type::Bool)
				}
				_ => type_of(left, context),
			}
		}

		Expr::Index { object, .. } => match type_of(object, context)? {
			Type::Array(item) => Some(*item),
			Type::Map(_, value) => Some(*value),
			Type::String => Some(Type::String),
			_ => None,
		},

		Expr::Call { callee: Callee::Function(id), .. } => {
			context.package.headers[id.0 as usize].1.clone()
		}

		Expr::Call { callee: Callee::Builtin(name), .. } => match *name {
			"len" => Some(Type::Int),
			"str" => Some(Type::String),
			"has" => Some(Type::Bool),
			"keys" => Some(Type::Array(Box::new(Type::Any))),
			_ => None,
		},

		Expr::Make { ty, .. } => Some(ty.clone()),

		Expr::Receive { channel, .. } => match type_of(channel, context)? {
			Type::Chan(item) => Some(*item),
			_ => None,
		},

		Expr::Yield { signature, .. } => Some(signature.receives.clone()),

		Expr::TypeIs { .. } => Some(Type::Bool),

		Expr::FrameIp => Some(Type::Int),
	}
}


/// The types of the key and value bindings of a range loop.
fn range_types(ty: Option<&Type>) -> (Type, Type) {
	match ty {
		Some(Type::Array(item)) => (Type::Int, (**item).clone()),
		Some(Type::String) => (Type::Int, Type::String),
		Some(Type::Int) => (Type::Int, Type::Any),
		Some(Type::Map(key, value)) => ((**key).clone(), (**value).clone()),
		Some(Type::Chan(item)) => ((**item).clone(), Type::Any),
		_ => (Type::Any, Type::Any),
	}
}


/// Flip an optional analysis result: a missing item is fine, a failed one is not.
fn lift<T>(item: Option<Option<T>>) -> Option<Option<T>> {
	match item {
		Some(Some(item)) => Some(Some(item)),
		Some(None) => None,
		None => Some(None),
	}
}


fn analyze_items<T, U, F, I>(
	mut analyze: F,
	iter: I,
	context: &mut Context,
) -> Option<Box<[U]>>
where
	I: IntoIterator<Item = T>,
	F: FnMut(T, &mut Context) -> Option<U>,
{
	let mut error = false;
	let mut items = Vec::new();

	for item in iter {
		if let Some(item) = analyze(item, context) {
			items.push(item);
		} else {
			error = true;
		}
	}

	if error {
		None
	} else {
		Some(items.into_boxed_slice())
	}
}


/// Static semantic analysis of a function body.
struct Context<'a> {
	package: &'a Package<'a>,
	/// The function being built, holding the local and label tables.
	function: &'a mut Function,
	/// Scope stack to resolve variables.
	scope: &'a mut scope::Stack,
	labels: &'a HashMap<Symbol, LabelId>,
	path: &'a Arc<Path>,
	/// Collected errors.
	errors: &'a mut Errors,
	/// Whether the analyzer is inside a loop.
	in_loop: bool,
	/// Whether the analyzer is inside a loop, switch or select.
	in_breakable: bool,
}


impl<'a> Context<'a> {
	fn new(
		package: &'a Package<'a>,
		function: &'a mut Function,
		scope: &'a mut scope::Stack,
		labels: &'a HashMap<Symbol, LabelId>,
		path: &'a Arc<Path>,
		errors: &'a mut Errors,
	) -> Self {
		scope.enter();

		Self {
			package,
			function,
			scope,
			labels,
			path,
			errors,
			in_loop: false,
			in_breakable: false,
		}
	}


	fn enter_block<'b>(&'b mut self) -> Context<'b> {
		self.scope.enter();

		Context {
			package: self.package,
			function: self.function,
			scope: self.scope,
			labels: self.labels,
			path: self.path,
			errors: self.errors,
			in_loop: self.in_loop,
			in_breakable: self.in_breakable,
		}
	}


	fn enter_loop<'b>(&'b mut self) -> Context<'b> {
		let mut context = self.enter_block();
		context.in_loop = true;
		context.in_breakable = true;
		context
	}


	/// Enter a switch or select.
	fn enter_breakable<'b>(&'b mut self) -> Context<'b> {
		let mut context = self.enter_block();
		context.in_breakable = true;
		context
	}


	fn report(&mut self, error: ErrorKind, pos: SourcePos) {
		self.errors.push(Error::new(error, self.path.clone(), pos));
	}
}


impl<'a> Drop for Context<'a> {
	fn drop(&mut self) {
		self.scope.exit();
	}
}
