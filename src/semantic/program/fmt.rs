//! Rendering of programs as source code. Lowered functions use a handful of compiler
//! intrinsics (`__frame_*`) for the frame operations, which have no source syntax.

use std::fmt::Display as _;

use super::{
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
	Program,
	ReceiveTarget,
	SelectCase,
	Statement,
	SwitchCase,
	SwitchTag,
	UnaryOp,
	VarId,
};
use crate::{
	fmt::{self, Display, Indentation},
	symbol,
};


impl<'a> Display<'a> for Name {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::User(symbol) => symbol.fmt(f, context),
			Self::Temp(prefix, id) => write!(f, "_{}{}", prefix, id),
			Self::Hoisted(symbol, id) => {
				"_".fmt(f)?;
				symbol.fmt(f, context)?;
				id.fmt(f)
			}
		}
	}
}


impl BinaryOp {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Plus => "+",
			Self::Minus => "-",
			Self::Times => "*",
			Self::Div => "/",
			Self::Mod => "%",
			Self::Equals => "==",
			Self::NotEquals => "!=",
			Self::Greater => ">",
			Self::GreaterEquals => ">=",
			Self::Lower => "<",
			Self::LowerEquals => "<=",
			Self::And => "&&",
			Self::Or => "||",
		}
	}
}


/// The context for displaying function bodies.
#[derive(Debug, Copy, Clone)]
pub struct Context<'a> {
	interner: &'a symbol::Interner,
	function: &'a Function,
	/// Function names, by id.
	names: &'a [symbol::Symbol],
	indentation: Indentation,
}


impl<'a> Context<'a> {
	pub fn new(
		interner: &'a symbol::Interner,
		function: &'a Function,
		names: &'a [symbol::Symbol],
	) -> Self {
		Self { interner, function, names, indentation: Indentation::default() }
	}


	/// Increase the indentation level.
	fn indent(mut self) -> Self {
		self.indentation = self.indentation.increase();
		self
	}


	fn var(&self, f: &mut std::fmt::Formatter, var: VarId) -> std::fmt::Result {
		self.function.local(var).name.fmt(f, self.interner)
	}


	fn label(&self, f: &mut std::fmt::Formatter, label: LabelId) -> std::fmt::Result {
		self.function.label(label).name.fmt(f, self.interner)
	}


	/// Write a labeled statement prefix.
	fn label_prefix(&self, f: &mut std::fmt::Formatter, label: Option<LabelId>) -> std::fmt::Result {
		if let Some(label) = label {
			self.label(f, label)?;
			": ".fmt(f)?;
		}

		Ok(())
	}
}


/// Write an indented block with braces, starting at the current line.
fn block(f: &mut std::fmt::Formatter, block: &Block, context: Context) -> std::fmt::Result {
	"{\n".fmt(f)?;
	lines(f, block.0.iter(), context.indent())?;
	context.indentation.fmt(f)?;
	"}".fmt(f)
}


/// Write each statement in its own line.
fn lines<'b, I>(f: &mut std::fmt::Formatter, statements: I, context: Context) -> std::fmt::Result
where
	I: Iterator<Item = &'b Statement>,
{
	for statement in statements {
		context.indentation.fmt(f)?;
		statement.fmt(f, context)?;
		"\n".fmt(f)?;
	}

	Ok(())
}


fn string(f: &mut std::fmt::Formatter, bytes: &[u8]) -> std::fmt::Result {
	"\"".fmt(f)?;

	for c in String::from_utf8_lossy(bytes).chars() {
		match c {
			'"' => "\\\"".fmt(f)?,
			'\\' => "\\\\".fmt(f)?,
			'\n' => "\\n".fmt(f)?,
			'\t' => "\\t".fmt(f)?,
			'\0' => "\\0".fmt(f)?,
			c => c.fmt(f)?,
		}
	}

	"\"".fmt(f)
}


impl<'a> Display<'a> for Literal {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Nil => "nil".fmt(f),
			Self::Bool(b) => b.fmt(f),
			Self::Int(int) => int.fmt(f),
			Self::Float(float) => write!(f, "{:?}", float),
			Self::String(bytes) => string(f, bytes),

			Self::Array(items) => {
				"[".fmt(f)?;
				fmt::sep_by(items.iter(), f, |item, f| item.fmt(f, context), ", ")?;
				"]".fmt(f)
			}

			Self::Dict(items) => {
				"{".fmt(f)?;
				fmt::sep_by(
					items.iter(),
					f,
					|(key, value), f| {
						key.fmt(f, context)?;
						": ".fmt(f)?;
						value.fmt(f, context)
					},
					", ",
				)?;
				"}".fmt(f)
			}
		}
	}
}


/// Write an operand, parenthesized if it is an operator application.
fn operand(f: &mut std::fmt::Formatter, expr: &Expr, context: Context) -> std::fmt::Result {
	match expr {
		Expr::BinaryOp { .. } | Expr::UnaryOp { .. } => {
			"(".fmt(f)?;
			expr.fmt(f, context)?;
			")".fmt(f)
		}
		expr => expr.fmt(f, context),
	}
}


fn args(f: &mut std::fmt::Formatter, args: &[Expr], context: Context) -> std::fmt::Result {
	"(".fmt(f)?;
	fmt::sep_by(args.iter(), f, |arg, f| arg.fmt(f, context), ", ")?;
	")".fmt(f)
}


impl<'a> Display<'a> for Expr {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Variable { var, .. } => context.var(f, *var),

			Self::Literal { literal, .. } => literal.fmt(f, context),

			Self::UnaryOp { op, operand: expr, .. } => {
				match op {
					UnaryOp::Minus => "-".fmt(f)?,
					UnaryOp::Not => "!".fmt(f)?,
				}
				operand(f, expr, context)
			}

			Self::BinaryOp { left, op, right, .. } => {
				operand(f, left, context)?;
				write!(f, " {} ", op.as_str())?;
				operand(f, right, context)
			}

			Self::Index { object, index, .. } => {
				operand(f, object, context)?;
				"[".fmt(f)?;
				index.fmt(f, context)?;
				"]".fmt(f)
			}

			Self::Call { callee, args: arguments, .. } => {
				callee.fmt(f, context)?;
				args(f, arguments, context)
			}

			Self::Make { ty, size, .. } => {
				write!(f, "make({}", ty)?;
				if let Some(size) = size {
					", ".fmt(f)?;
					size.fmt(f, context)?;
				}
				")".fmt(f)
			}

			Self::Receive { channel, .. } => {
				"<-".fmt(f)?;
				operand(f, channel, context)
			}

			Self::Yield { signature, value, .. } => {
				write!(f, "yield{}(", signature)?;
				value.fmt(f, context)?;
				")".fmt(f)
			}

			Self::TypeIs { expr, ty, .. } => {
				"__type_is(".fmt(f)?;
				expr.fmt(f, context)?;
				write!(f, ", {})", ty)
			}

			Self::FrameIp => "__frame_ip()".fmt(f),
		}
	}
}


impl<'a> Display<'a> for Callee {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Function(id) => match context.names.get(id.0 as usize) {
				Some(name) => name.fmt(f, context.interner),
				None => write!(f, "__function{}", id.0),
			},
			Self::Builtin(name) => name.fmt(f),
		}
	}
}


impl<'a> Display<'a> for Place {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Variable(var) => context.var(f, *var),
			Self::Index { object, index } => {
				operand(f, object, context)?;
				"[".fmt(f)?;
				index.fmt(f, context)?;
				"]".fmt(f)
			}
		}
	}
}


impl<'a> Display<'a> for SwitchCase {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match &self.guards {
			Guards::Default => "default:".fmt(f)?,
			Guards::Values(values) => {
				"case ".fmt(f)?;
				fmt::sep_by(values.iter(), f, |value, f| value.fmt(f, context), ", ")?;
				":".fmt(f)?;
			}
			Guards::Types(types) => {
				"case ".fmt(f)?;
				fmt::sep_by(types.iter(), f, |ty, f| ty.fmt(f), ", ")?;
				":".fmt(f)?;
			}
		}

		"\n".fmt(f)?;
		lines(f, self.body.0.iter(), context.indent())
	}
}


impl<'a> Display<'a> for SelectCase {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match &self.comm {
			Comm::Default => "default:".fmt(f)?,

			Comm::Send { channel, value } => {
				"case ".fmt(f)?;
				channel.fmt(f, context)?;
				" <- ".fmt(f)?;
				value.fmt(f, context)?;
				":".fmt(f)?;
			}

			Comm::Receive { target, channel } => {
				"case ".fmt(f)?;
				match target {
					ReceiveTarget::Discard => (),
					ReceiveTarget::Define(var) => {
						context.var(f, *var)?;
						" := ".fmt(f)?;
					}
					ReceiveTarget::Assign(place) => {
						place.fmt(f, context)?;
						" = ".fmt(f)?;
					}
				}
				"<-".fmt(f)?;
				operand(f, channel, context)?;
				":".fmt(f)?;
			}
		}

		"\n".fmt(f)?;
		lines(f, self.body.0.iter(), context.indent())
	}
}


/// Write the cases of a switch-like statement, closing the braces.
fn cases<'b, T, I>(f: &mut std::fmt::Formatter, cases: I, context: Context<'b>) -> std::fmt::Result
where
	T: Display<'b, Context = Context<'b>> + 'b,
	I: Iterator<Item = &'b T>,
{
	"{\n".fmt(f)?;

	for case in cases {
		context.indentation.fmt(f)?;
		case.fmt(f, context)?;
	}

	context.indentation.fmt(f)?;
	"}".fmt(f)
}


impl<'a> Display<'a> for FrameOp {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Push => "__frame_push()".fmt(f),
			Self::Pop => "__frame_pop()".fmt(f),
			Self::SetIp(ip) => write!(f, "__frame_set_ip({})", ip),

			Self::Save { slot, var } => {
				write!(f, "__frame_save({}, ", slot)?;
				context.var(f, *var)?;
				")".fmt(f)
			}

			Self::Restore { slot, var } => {
				write!(f, "if __frame_has({}) {{ ", slot)?;
				context.var(f, *var)?;
				write!(f, " = __frame_get({}) }}", slot)
			}

			Self::Defer { list, call } => {
				"__frame_defer(".fmt(f)?;
				context.var(f, *list)?;
				", ".fmt(f)?;
				call.fmt(f, context)?;
				")".fmt(f)
			}

			Self::RunDefers { list } => {
				"__frame_run_defers(".fmt(f)?;
				context.var(f, *list)?;
				")".fmt(f)
			}
		}
	}
}


impl<'a> Display<'a> for Statement {
	type Context = Context<'a>;

	fn fmt(&self, f: &mut std::fmt::Formatter, context: Self::Context) -> std::fmt::Result {
		match self {
			Self::Block(statements) => block(f, statements, context),

			Self::Declare { var, init, .. } => {
				"var ".fmt(f)?;
				context.var(f, *var)?;
				write!(f, " {}", context.function.local(*var).ty)?;
				if let Some(init) = init {
					" = ".fmt(f)?;
					init.fmt(f, context)?;
				}
				Ok(())
			}

			Self::Const { var, .. } => {
				"const ".fmt(f)?;
				context.var(f, *var)?;
				" = ".fmt(f)?;
				match &context.function.local(*var).kind {
					LocalKind::Const(literal) => literal.fmt(f, context),
					_ => "nil".fmt(f),
				}
			}

			Self::Type { var, .. } => {
				"type ".fmt(f)?;
				context.var(f, *var)?;
				write!(f, " = {}", context.function.local(*var).ty)
			}

			Self::Assign { place, value, .. } => {
				place.fmt(f, context)?;
				" = ".fmt(f)?;
				value.fmt(f, context)
			}

			Self::Send { channel, value, .. } => {
				channel.fmt(f, context)?;
				" <- ".fmt(f)?;
				value.fmt(f, context)
			}

			Self::Expr(expr) => expr.fmt(f, context),

			Self::If { init, condition, then, otherwise, .. } => {
				"if ".fmt(f)?;
				if let Some(init) = init {
					init.fmt(f, context)?;
					"; ".fmt(f)?;
				}
				condition.fmt(f, context)?;
				" ".fmt(f)?;
				block(f, then, context)?;

				if !otherwise.is_empty() {
					" else ".fmt(f)?;
					block(f, otherwise, context)?;
				}

				Ok(())
			}

			Self::For { label, init, condition, post, body, .. } => {
				context.label_prefix(f, *label)?;
				"for ".fmt(f)?;

				if init.is_some() || post.is_some() {
					if let Some(init) = init {
						init.fmt(f, context)?;
					}
					"; ".fmt(f)?;
					if let Some(condition) = condition {
						condition.fmt(f, context)?;
					}
					"; ".fmt(f)?;
					if let Some(post) = post {
						post.fmt(f, context)?;
					}
					" ".fmt(f)?;
				} else if let Some(condition) = condition {
					condition.fmt(f, context)?;
					" ".fmt(f)?;
				}

				block(f, body, context)
			}

			Self::Range { label, key, value, expr, body, .. } => {
				context.label_prefix(f, *label)?;
				"for ".fmt(f)?;

				match (key, value) {
					(None, None) => (),
					(Some(key), None) => {
						context.var(f, *key)?;
						" := ".fmt(f)?;
					}
					(key, Some(value)) => {
						match key {
							Some(key) => context.var(f, *key)?,
							None => "_".fmt(f)?,
						}
						", ".fmt(f)?;
						context.var(f, *value)?;
						" := ".fmt(f)?;
					}
				}

				"range ".fmt(f)?;
				expr.fmt(f, context)?;
				" ".fmt(f)?;
				block(f, body, context)
			}

			Self::Switch { label, init, tag, cases: arms, .. } => {
				context.label_prefix(f, *label)?;
				"switch ".fmt(f)?;

				if let Some(init) = init {
					init.fmt(f, context)?;
					"; ".fmt(f)?;
				}

				match tag {
					SwitchTag::None => (),
					SwitchTag::Value(expr) => {
						expr.fmt(f, context)?;
						" ".fmt(f)?;
					}
					SwitchTag::Type { binding, expr } => {
						if let Some(binding) = binding {
							context.var(f, *binding)?;
							" := ".fmt(f)?;
						}
						operand(f, expr, context)?;
						".(type) ".fmt(f)?;
					}
				}

				cases(f, arms.iter(), context)
			}

			Self::Select { label, cases: arms, .. } => {
				context.label_prefix(f, *label)?;
				"select ".fmt(f)?;
				cases(f, arms.iter(), context)
			}

			Self::Branch { label, selector, arms, .. } => {
				context.label_prefix(f, *label)?;
				"switch ".fmt(f)?;
				selector.fmt(f, context)?;
				" {\n".fmt(f)?;

				for (ix, arm) in arms.iter().enumerate() {
					context.indentation.fmt(f)?;
					writeln!(f, "case {}:", ix)?;
					lines(f, arm.0.iter(), context.indent())?;
				}

				context.indentation.fmt(f)?;
				"}".fmt(f)
			}

			Self::Break { label, .. } => {
				"break".fmt(f)?;
				if let Some(label) = label {
					" ".fmt(f)?;
					context.label(f, *label)?;
				}
				Ok(())
			}

			Self::Continue { label, .. } => {
				"continue".fmt(f)?;
				if let Some(label) = label {
					" ".fmt(f)?;
					context.label(f, *label)?;
				}
				Ok(())
			}

			Self::Fallthrough { .. } => "fallthrough".fmt(f),

			Self::Return { value, .. } => {
				"return".fmt(f)?;
				if let Some(value) = value {
					" ".fmt(f)?;
					value.fmt(f, context)?;
				}
				Ok(())
			}

			Self::Defer { call, .. } => {
				"defer ".fmt(f)?;
				call.fmt(f, context)
			}

			Self::Frame(op) => op.fmt(f, context),

			Self::Dispatch(arms) => {
				"switch {\n".fmt(f)?;

				let last = arms.len().saturating_sub(1);
				let inner = context.indent();

				for (ix, (end, statement)) in arms.iter().enumerate() {
					context.indentation.fmt(f)?;
					writeln!(f, "case __frame_ip() < {}:", end)?;
					lines(f, std::iter::once(statement), inner)?;

					if ix != last {
						inner.indentation.fmt(f)?;
						writeln!(f, "__frame_set_ip({})", end)?;
						inner.indentation.fmt(f)?;
						"fallthrough\n".fmt(f)?;
					}
				}

				context.indentation.fmt(f)?;
				"}".fmt(f)
			}

			Self::Scoped { body, unwind, complete } => {
				let inner = context.indent();
				let nested = inner.indent();

				"defer func() {\n".fmt(f)?;
				inner.indentation.fmt(f)?;
				"if __frame_unwinding() {\n".fmt(f)?;
				lines(f, unwind.0.iter(), nested)?;
				inner.indentation.fmt(f)?;
				"} else {\n".fmt(f)?;
				lines(f, complete.0.iter(), nested)?;
				inner.indentation.fmt(f)?;
				"}\n".fmt(f)?;
				context.indentation.fmt(f)?;
				"}()\n".fmt(f)?;

				let mut body = body.0.iter().peekable();
				while let Some(statement) = body.next() {
					context.indentation.fmt(f)?;
					statement.fmt(f, context)?;
					if body.peek().is_some() {
						"\n".fmt(f)?;
					}
				}

				Ok(())
			}
		}
	}
}


impl<'a> Display<'a> for Function {
	type Context = (&'a symbol::Interner, &'a [symbol::Symbol]);

	fn fmt(&self, f: &mut std::fmt::Formatter, (interner, names): Self::Context) -> std::fmt::Result {
		let context = Context::new(interner, self, names);

		if let Some(signature) = &self.signature {
			writeln!(f, "//corolla:suspends {}", signature)?;
		}

		"func ".fmt(f)?;
		self.name.fmt(f, interner)?;
		"(".fmt(f)?;
		fmt::sep_by(
			self.param_ids(),
			f,
			|param, f| {
				context.var(f, param)?;
				write!(f, " {}", self.local(param).ty)
			},
			", ",
		)?;
		")".fmt(f)?;

		if let Some(result) = &self.result {
			write!(f, " {}", result)?;
		}

		" ".fmt(f)?;
		block(f, &self.body, context)
	}
}


impl<'a> Display<'a> for Program {
	type Context = &'a symbol::Interner;

	fn fmt(&self, f: &mut std::fmt::Formatter, interner: Self::Context) -> std::fmt::Result {
		let names: Vec<symbol::Symbol> = self.functions
			.iter()
			.map(|function| function.name)
			.collect();

		for alias in &self.aliases {
			"type ".fmt(f)?;
			alias.name.fmt(f, interner)?;
			writeln!(f, " = {}", alias.ty)?;
		}

		if !self.aliases.is_empty() {
			"\n".fmt(f)?;
		}

		fmt::sep_by(
			self.functions.iter(),
			f,
			|function, f| function.fmt(f, (interner, names.as_slice())),
			"\n\n",
		)?;

		"\n".fmt(f)
	}
}
