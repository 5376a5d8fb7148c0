pub mod fmt;

use std::{
	fmt::{self as std_fmt, Display},
	path::Path,
	sync::Arc,
};

use super::SourcePos;
pub use crate::symbol::Symbol;
pub use crate::syntax::ast::BinaryOp;


/// Index of a function in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FnId(pub u32);


/// Index of a local in a function's local table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);


/// Index of a label in a function's label table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub u32);


/// Resolved types. Aliases are expanded during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
	Int,
	Float,
	Bool,
	String,
	Any,
	Nil,
	Array(Box<Type>),
	Map(Box<Type>, Box<Type>),
	Chan(Box<Type>),
}


impl Type {
	/// Get the builtin type for a name, if any.
	pub fn builtin(name: &[u8]) -> Option<Self> {
		match name {
			b"int" => Some(Self::Int),
			b"float" => Some(Self::Float),
			b"bool" => Some(Self::Bool),
			b"string" => Some(Self::String),
			b"any" => Some(Self::Any),
			b"nil" => Some(Self::Nil),
			_ => None,
		}
	}


	/// The literal of the zero value of this type.
	pub fn zero(&self) -> Literal {
		match self {
			Self::Int => Literal::Int(0),
			Self::Float => Literal::Float(0.0),
			Self::Bool => Literal::Bool(false),
			Self::String => Literal::String(Box::default()),
			Self::Any | Self::Nil | Self::Chan(_) => Literal::Nil,
			Self::Array(_) => Literal::Array(Box::default()),
			Self::Map(_, _) => Literal::Dict(Box::default()),
		}
	}
}


impl Display for Type {
	fn fmt(&self, f: &mut std_fmt::Formatter) -> std_fmt::Result {
		match self {
			Self::Int => "int".fmt(f),
			Self::Float => "float".fmt(f),
			Self::Bool => "bool".fmt(f),
			Self::String => "string".fmt(f),
			Self::Any => "any".fmt(f),
			Self::Nil => "nil".fmt(f),
			Self::Array(item) => write!(f, "[]{}", item),
			Self::Map(key, value) => write!(f, "map[{}]{}", key, value),
			Self::Chan(item) => write!(f, "chan {}", item),
		}
	}
}


/// The pair of types exchanged at a suspension point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
	/// The type of the values handed to the driver.
	pub yields: Type,
	/// The type of the values sent back on resume.
	pub receives: Type,
}


impl Display for Signature {
	fn fmt(&self, f: &mut std_fmt::Formatter) -> std_fmt::Result {
		write!(f, "[{}, {}]", self.yields, self.receives)
	}
}


/// The name of a local or label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Name {
	/// A name from the source code.
	User(Symbol),
	/// A compiler temporary, with a prefix and a unique number.
	Temp(&'static str, u32),
	/// A user name moved to the function prologue, made unique by a number.
	Hoisted(Symbol, u32),
}


#[derive(Debug, Clone)]
pub enum LocalKind {
	Param,
	Var,
	/// Constants always hold the given literal.
	Const(Literal),
	/// A local type alias. The type of the local is the aliased type.
	Type,
}


#[derive(Debug, Clone)]
pub struct Local {
	pub name: Name,
	pub ty: Type,
	pub kind: LocalKind,
}


impl Local {
	/// Whether the local holds a value that must survive a suspension.
	pub fn is_live(&self) -> bool {
		matches!(self.kind, LocalKind::Param | LocalKind::Var)
	}
}


#[derive(Debug, Clone)]
pub struct Label {
	pub name: Name,
}


/// A block is a list of statements.
#[derive(Debug, Clone, Default)]
pub struct Block(pub Box<[Statement]>);


impl From<Box<[Statement]>> for Block {
	fn from(block: Box<[Statement]>) -> Self {
		Self(block)
	}
}


impl From<Vec<Statement>> for Block {
	fn from(block: Vec<Statement>) -> Self {
		Self(block.into_boxed_slice())
	}
}


impl Block {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}


#[derive(Debug, Clone)]
pub enum Literal {
	Nil,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(Box<[u8]>),
	Array(Box<[Expr]>),
	Dict(Box<[(Expr, Expr)]>),
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Minus, // -
	Not,   // !
}


/// The target of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Callee {
	Function(FnId),
	/// Builtins are referenced by their registered name.
	Builtin(&'static str),
}


/// Expressions of all kinds in the language.
#[derive(Debug, Clone)]
pub enum Expr {
	Variable {
		var: VarId,
		pos: SourcePos,
	},
	Literal {
		literal: Literal,
		pos: SourcePos,
	},
	UnaryOp {
		op: UnaryOp,
		operand: Box<Expr>,
		pos: SourcePos,
	},
	BinaryOp {
		left: Box<Expr>,
		op: BinaryOp,
		right: Box<Expr>,
		pos: SourcePos,
	},
	Index {
		object: Box<Expr>,
		index: Box<Expr>,
		pos: SourcePos,
	},
	Call {
		callee: Callee,
		args: Box<[Expr]>,
		pos: SourcePos,
	},
	Make {
		ty: Type,
		size: Option<Box<Expr>>,
		pos: SourcePos,
	},
	/// `<-ch`
	Receive {
		channel: Box<Expr>,
		pos: SourcePos,
	},
	/// A suspension point.
	Yield {
		signature: Signature,
		value: Box<Expr>,
		pos: SourcePos,
	},
	/// Whether the value has the given dynamic type. Produced by the compiler for type
	/// switches.
	TypeIs {
		expr: Box<Expr>,
		ty: Type,
		pos: SourcePos,
	},
	/// The instruction pointer of the current frame. Only in lowered functions.
	FrameIp,
}


impl Expr {
	pub fn pos(&self) -> SourcePos {
		match self {
			Self::Variable { pos, .. }
			| Self::Literal { pos, .. }
			| Self::UnaryOp { pos, .. }
			| Self::BinaryOp { pos, .. }
			| Self::Index { pos, .. }
			| Self::Call { pos, .. }
			| Self::Make { pos, .. }
			| Self::Receive { pos, .. }
			| Self::Yield { pos, .. }
			| Self::TypeIs { pos, .. } => *pos,
			Self::FrameIp => SourcePos::default(),
		}
	}


	pub fn variable(var: VarId, pos: SourcePos) -> Self {
		Self::Variable { var, pos }
	}


	pub fn literal(literal: Literal, pos: SourcePos) -> Self {
		Self::Literal { literal, pos }
	}


	pub fn not(operand: Expr) -> Self {
		let pos = operand.pos();
		Self::UnaryOp { op: UnaryOp::Not, operand: Box::new(operand), pos }
	}


	pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
		let pos = left.pos();
		Self::BinaryOp { left: Box::new(left), op, right: Box::new(right), pos }
	}


	/// Visit every direct subexpression.
	pub fn children(&self) -> Vec<&Expr> {
		match self {
			Self::Variable { .. } | Self::FrameIp => Vec::new(),

			Self::Literal { literal, .. } => match literal {
				Literal::Array(items) => items.iter().collect(),
				Literal::Dict(items) => items
					.iter()
					.flat_map(|(key, value)| vec![key, value])
					.collect(),
				_ => Vec::new(),
			},

			Self::UnaryOp { operand, .. } => vec![&**operand],
			Self::BinaryOp { left, right, .. } => vec![&**left, &**right],
			Self::Index { object, index, .. } => vec![&**object, &**index],
			Self::Call { args, .. } => args.iter().collect(),
			Self::Make { size, .. } => size.iter().map(|size| &**size).collect(),
			Self::Receive { channel, .. } => vec![&**channel],
			Self::Yield { value, .. } => vec![&**value],
			Self::TypeIs { expr, .. } => vec![&**expr],
		}
	}


	/// Whether any node of this expression satisfies the predicate.
	pub fn any<F>(&self, predicate: &mut F) -> bool
	where
		F: FnMut(&Expr) -> bool,
	{
		predicate(self) || self.children().into_iter().any(|expr| expr.any(predicate))
	}
}


/// Assignable places.
#[derive(Debug, Clone)]
pub enum Place {
	Variable(VarId),
	Index {
		object: Expr,
		index: Expr,
	},
}


#[derive(Debug, Clone)]
pub enum Guards {
	Default,
	Values(Box<[Expr]>),
	Types(Box<[Type]>),
}


#[derive(Debug, Clone)]
pub struct SwitchCase {
	pub guards: Guards,
	pub body: Block,
	pub pos: SourcePos,
}


#[derive(Debug, Clone)]
pub enum SwitchTag {
	/// Cases are boolean conditions.
	None,
	Value(Expr),
	Type {
		binding: Option<VarId>,
		expr: Expr,
	},
}


#[derive(Debug, Clone)]
pub enum ReceiveTarget {
	Discard,
	Define(VarId),
	Assign(Place),
}


#[derive(Debug, Clone)]
pub enum Comm {
	Receive {
		target: ReceiveTarget,
		channel: Expr,
	},
	Send {
		channel: Expr,
		value: Expr,
	},
	Default,
}


#[derive(Debug, Clone)]
pub struct SelectCase {
	pub comm: Comm,
	pub body: Block,
	pub pos: SourcePos,
}


/// Frame operations of lowered functions.
#[derive(Debug, Clone)]
pub enum FrameOp {
	/// Enter the activation's frame.
	Push,
	/// Leave the activation's frame after completion.
	Pop,
	SetIp(u32),
	/// Store the variable in the given slot.
	Save {
		slot: u32,
		var: VarId,
	},
	/// Load the variable from the given slot, if the slot is present.
	Restore {
		slot: u32,
		var: VarId,
	},
	/// Append a deferred call record to the list variable.
	Defer {
		list: VarId,
		call: Expr,
	},
	/// Run the deferred calls in the list, last first.
	RunDefers {
		list: VarId,
	},
}


/// Statements of all kinds in the language.
#[derive(Debug, Clone)]
pub enum Statement {
	Block(Block),
	/// `var` and `:=` declarations. Without an initializer, the zero value of the type
	/// is assigned.
	Declare {
		var: VarId,
		init: Option<Expr>,
		pos: SourcePos,
	},
	Const {
		var: VarId,
		pos: SourcePos,
	},
	Type {
		var: VarId,
		pos: SourcePos,
	},
	Assign {
		place: Place,
		value: Expr,
		pos: SourcePos,
	},
	Send {
		channel: Expr,
		value: Expr,
		pos: SourcePos,
	},
	Expr(Expr),
	If {
		init: Option<Box<Statement>>,
		condition: Expr,
		then: Block,
		otherwise: Block,
		pos: SourcePos,
	},
	For {
		label: Option<LabelId>,
		init: Option<Box<Statement>>,
		condition: Option<Expr>,
		post: Option<Box<Statement>>,
		body: Block,
		pos: SourcePos,
	},
	Range {
		label: Option<LabelId>,
		key: Option<VarId>,
		value: Option<VarId>,
		expr: Expr,
		/// The static type of the ranged expression, when known.
		ty: Option<Type>,
		body: Block,
		pos: SourcePos,
	},
	Switch {
		label: Option<LabelId>,
		init: Option<Box<Statement>>,
		tag: SwitchTag,
		cases: Box<[SwitchCase]>,
		pos: SourcePos,
	},
	Select {
		label: Option<LabelId>,
		cases: Box<[SelectCase]>,
		pos: SourcePos,
	},
	/// Run the arm indexed by the selector, if any. Produced by the compiler.
	Branch {
		label: Option<LabelId>,
		selector: Expr,
		arms: Box<[Block]>,
		pos: SourcePos,
	},
	/// A missing label targets the innermost breakable statement.
	Break {
		label: Option<LabelId>,
		pos: SourcePos,
	},
	/// A missing label targets the innermost loop.
	Continue {
		label: Option<LabelId>,
		pos: SourcePos,
	},
	Fallthrough {
		pos: SourcePos,
	},
	Return {
		value: Option<Expr>,
		pos: SourcePos,
	},
	Defer {
		call: Expr,
		pos: SourcePos,
	},
	Frame(FrameOp),
	/// Each arm runs if the instruction pointer is lower than its end, which then becomes
	/// the instruction pointer, except for the last arm.
	Dispatch(Box<[(u32, Statement)]>),
	/// Run the body, then `unwind` if it exits because the coroutine is suspending, or
	/// `complete` otherwise, including cancellation.
	Scoped {
		body: Block,
		unwind: Block,
		complete: Block,
	},
}


impl Place {
	pub fn exprs(&self) -> Vec<&Expr> {
		match self {
			Self::Variable(_) => Vec::new(),
			Self::Index { object, index } => vec![object, index],
		}
	}
}


impl Statement {
	/// The expressions evaluated by the statement itself, excluding nested statements.
	pub fn exprs(&self) -> Vec<&Expr> {
		match self {
			Self::Declare { init, .. } => init.iter().collect(),

			Self::Assign { place, value, .. } => {
				let mut exprs = place.exprs();
				exprs.push(value);
				exprs
			}

			Self::Send { channel, value, .. } => vec![channel, value],

			Self::Expr(expr) => vec![expr],

			Self::If { condition, .. } => vec![condition],

			Self::For { condition, .. } => condition.iter().collect(),

			Self::Range { expr, .. } => vec![expr],

			Self::Switch { tag, cases, .. } => {
				let mut exprs = match tag {
					SwitchTag::None => Vec::new(),
					SwitchTag::Value(expr) | SwitchTag::Type { expr, .. } => vec![expr],
				};

				for case in cases.iter() {
					if let Guards::Values(values) = &case.guards {
						exprs.extend(values.iter());
					}
				}

				exprs
			}

			Self::Select { cases, .. } => {
				let mut exprs = Vec::new();

				for case in cases.iter() {
					match &case.comm {
						Comm::Receive { target, channel } => {
							exprs.push(channel);
							if let ReceiveTarget::Assign(place) = target {
								exprs.extend(place.exprs());
							}
						}

						Comm::Send { channel, value } => {
							exprs.push(channel);
							exprs.push(value);
						}

						Comm::Default => (),
					}
				}

				exprs
			}

			Self::Branch { selector, .. } => vec![selector],

			Self::Return { value, .. } => value.iter().collect(),

			Self::Defer { call, .. } | Self::Frame(FrameOp::Defer { call, .. }) => vec![call],

			Self::Block(_)
			| Self::Const { .. }
			| Self::Type { .. }
			| Self::Break { .. }
			| Self::Continue { .. }
			| Self::Fallthrough { .. }
			| Self::Frame(_)
			| Self::Dispatch(_)
			| Self::Scoped { .. } => Vec::new(),
		}
	}


	/// The statements nested directly in this one.
	pub fn children(&self) -> Vec<&Statement> {
		fn blocks<'a, I>(blocks: I) -> Vec<&'a Statement>
		where
			I: Iterator<Item = &'a Block>,
		{
			blocks.flat_map(|block| block.0.iter()).collect()
		}

		match self {
			Self::Block(block) => block.0.iter().collect(),

			Self::If { init, then, otherwise, .. } => init
				.iter()
				.map(|init| &**init)
				.chain(then.0.iter())
				.chain(otherwise.0.iter())
				.collect(),

			Self::For { init, post, body, .. } => init
				.iter()
				.chain(post.iter())
				.map(|statement| &**statement)
				.chain(body.0.iter())
				.collect(),

			Self::Range { body, .. } => body.0.iter().collect(),

			Self::Switch { init, cases, .. } => init
				.iter()
				.map(|init| &**init)
				.chain(blocks(cases.iter().map(|case| &case.body)))
				.collect(),

			Self::Select { cases, .. } => blocks(cases.iter().map(|case| &case.body)),

			Self::Branch { arms, .. } => blocks(arms.iter()),

			Self::Dispatch(arms) => arms.iter().map(|(_, statement)| statement).collect(),

			Self::Scoped { body, unwind, complete } => blocks([body, unwind, complete].iter().copied()),

			_ => Vec::new(),
		}
	}
}


impl Block {
	/// Visit every statement, including nested ones, in source order.
	pub fn walk<F>(&self, visit: &mut F)
	where
		F: FnMut(&Statement),
	{
		fn walk_statement<F: FnMut(&Statement)>(statement: &Statement, visit: &mut F) {
			visit(statement);

			for child in statement.children() {
				walk_statement(child, visit);
			}
		}

		for statement in self.0.iter() {
			walk_statement(statement, visit);
		}
	}


	/// Whether any expression in the block, including nested ones, satisfies the predicate.
	pub fn any_expr<F>(&self, predicate: &mut F) -> bool
	where
		F: FnMut(&Expr) -> bool,
	{
		let mut found = false;

		self.walk(
			&mut |statement| {
				if !found {
					found = statement
						.exprs()
						.into_iter()
						.any(|expr| expr.any(&mut *predicate));
				}
			}
		);

		found
	}
}


#[derive(Debug, Clone)]
pub struct Function {
	pub name: Symbol,
	pub path: Arc<Path>,
	/// The first `params` locals are the parameters.
	pub params: u32,
	pub result: Option<Type>,
	pub locals: Vec<Local>,
	pub labels: Vec<Label>,
	pub body: Block,
	/// The suspension signature, assigned by coloring.
	pub signature: Option<Signature>,
	/// Whether the body was rewritten to save and restore its state in frames.
	pub lowered: bool,
	pub pos: SourcePos,
}


impl Function {
	pub fn local(&self, var: VarId) -> &Local {
		&self.locals[var.0 as usize]
	}


	pub fn label(&self, label: LabelId) -> &Label {
		&self.labels[label.0 as usize]
	}


	/// Add a local to the table.
	pub fn declare(&mut self, name: Name, ty: Type, kind: LocalKind) -> VarId {
		let var = VarId(self.locals.len() as u32);
		self.locals.push(Local { name, ty, kind });
		var
	}


	/// Add a label to the table.
	pub fn declare_label(&mut self, name: Name) -> LabelId {
		let label = LabelId(self.labels.len() as u32);
		self.labels.push(Label { name });
		label
	}


	pub fn param_ids(&self) -> impl Iterator<Item = VarId> {
		(0 .. self.params).map(VarId)
	}
}


/// A top level type alias.
#[derive(Debug, Clone)]
pub struct Alias {
	pub name: Symbol,
	pub ty: Type,
	pub pos: SourcePos,
}


/// A statically correct package: every source file of a directory.
#[derive(Debug, Clone)]
pub struct Program {
	/// The package path, the directory or file given to the analysis.
	pub path: Arc<Path>,
	pub aliases: Vec<Alias>,
	pub functions: Vec<Function>,
}


impl Program {
	pub fn function(&self, id: FnId) -> &Function {
		&self.functions[id.0 as usize]
	}


	pub fn function_mut(&mut self, id: FnId) -> &mut Function {
		&mut self.functions[id.0 as usize]
	}


	/// Find a function by name.
	pub fn find(&self, name: Symbol) -> Option<FnId> {
		self.functions
			.iter()
			.position(|function| function.name == name)
			.map(|ix| FnId(ix as u32))
	}


	pub fn ids(&self) -> impl Iterator<Item = FnId> {
		(0 .. self.functions.len() as u32).map(FnId)
	}
}
