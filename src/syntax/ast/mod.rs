use std::path::Path;

use super::{lexer, SourcePos};
pub use crate::symbol::Symbol;
pub use lexer::ArithOp;


/// A block is a list of statements, constituting a new scope.
#[derive(Debug, Default)]
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


/// Type expressions, as written in the source code.
#[derive(Debug)]
pub enum TypeExpr {
	/// A builtin type name or a declared alias.
	Named {
		name: Symbol,
		pos: SourcePos,
	},
	/// The type of nil.
	Nil {
		pos: SourcePos,
	},
	/// `[]T`
	Array {
		item: Box<TypeExpr>,
		pos: SourcePos,
	},
	/// `map[K]V`
	Map {
		key: Box<TypeExpr>,
		value: Box<TypeExpr>,
		pos: SourcePos,
	},
	/// `chan T`
	Chan {
		item: Box<TypeExpr>,
		pos: SourcePos,
	},
}


impl TypeExpr {
	pub fn pos(&self) -> SourcePos {
		match self {
			Self::Named { pos, .. }
			| Self::Nil { pos }
			| Self::Array { pos, .. }
			| Self::Map { pos, .. }
			| Self::Chan { pos, .. } => *pos,
		}
	}
}


/// Literals of all types in the language.
#[derive(Debug)]
pub enum Literal {
	Nil,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(Box<[u8]>),
	Array(Box<[Expr]>),
	Dict(Box<[(Expr, Expr)]>),
}


impl From<lexer::Literal> for Literal {
	fn from(literal: lexer::Literal) -> Self {
		match literal {
			lexer::Literal::Nil => Literal::Nil,
			lexer::Literal::True => Literal::Bool(true),
			lexer::Literal::False => Literal::Bool(false),
			lexer::Literal::Int(int) => Literal::Int(int),
			lexer::Literal::Float(float) => Literal::Float(float),
			lexer::Literal::String(string) => Literal::String(string),
		}
	}
}


/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Minus,   // -
	Not,     // !
	Receive, // <-
}


/// Warning, the following instance may panic if used with unmapped operators.
impl From<lexer::Operator> for UnaryOp {
	fn from(op: lexer::Operator) -> Self {
		match op {
			lexer::Operator::Minus => UnaryOp::Minus,
			lexer::Operator::Not => UnaryOp::Not,
			lexer::Operator::Arrow => UnaryOp::Receive,
			_ => panic!("invalid operator"),
		}
	}
}


/// Binary operators.
/// Assignment and indexing are not represented as operators, but directly as
/// statements/expressions instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Plus,  // +
	Minus, // -
	Times, // *
	Div,   // /
	Mod,   // %

	Equals,        // ==
	NotEquals,     // !=
	Greater,       // >
	GreaterEquals, // >=
	Lower,         // <
	LowerEquals,   // <=

	And, // &&
	Or,  // ||
}


/// Warning, the following instance may panic if used with unmapped operators.
impl From<lexer::Operator> for BinaryOp {
	fn from(op: lexer::Operator) -> Self {
		match op {
			lexer::Operator::Plus => BinaryOp::Plus,
			lexer::Operator::Minus => BinaryOp::Minus,
			lexer::Operator::Times => BinaryOp::Times,
			lexer::Operator::Div => BinaryOp::Div,
			lexer::Operator::Mod => BinaryOp::Mod,
			lexer::Operator::Equals => BinaryOp::Equals,
			lexer::Operator::NotEquals => BinaryOp::NotEquals,
			lexer::Operator::Greater => BinaryOp::Greater,
			lexer::Operator::GreaterEquals => BinaryOp::GreaterEquals,
			lexer::Operator::Lower => BinaryOp::Lower,
			lexer::Operator::LowerEquals => BinaryOp::LowerEquals,
			lexer::Operator::And => BinaryOp::And,
			lexer::Operator::Or => BinaryOp::Or,
			_ => panic!("invalid operator"),
		}
	}
}


impl From<ArithOp> for BinaryOp {
	fn from(op: ArithOp) -> Self {
		match op {
			ArithOp::Plus => BinaryOp::Plus,
			ArithOp::Minus => BinaryOp::Minus,
			ArithOp::Times => BinaryOp::Times,
			ArithOp::Div => BinaryOp::Div,
			ArithOp::Mod => BinaryOp::Mod,
		}
	}
}


/// Expressions of all kinds in the language.
#[derive(Debug)]
pub enum Expr {
	Identifier {
		identifier: Symbol,
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
	/// Index ([]) operator.
	Index {
		object: Box<Expr>,
		index: Box<Expr>,
		pos: SourcePos,
	},
	/// Functions are called by name only.
	Call {
		function: Symbol,
		args: Box<[Expr]>,
		pos: SourcePos,
	},
	/// `make(T[, size])`
	Make {
		ty: TypeExpr,
		size: Option<Box<Expr>>,
		pos: SourcePos,
	},
	/// `yield[Y, R](value)`, the suspension primitive.
	Yield {
		yields: TypeExpr,
		receives: TypeExpr,
		value: Box<Expr>,
		pos: SourcePos,
	},
	/// `v.(type)`, only valid as the tag of a type switch.
	TypeGuard {
		expr: Box<Expr>,
		pos: SourcePos,
	},
}


impl Expr {
	pub fn pos(&self) -> SourcePos {
		match self {
			Self::Identifier { pos, .. }
			| Self::Literal { pos, .. }
			| Self::UnaryOp { pos, .. }
			| Self::BinaryOp { pos, .. }
			| Self::Index { pos, .. }
			| Self::Call { pos, .. }
			| Self::Make { pos, .. }
			| Self::Yield { pos, .. }
			| Self::TypeGuard { pos, .. } => *pos,
		}
	}
}


/// The guards of a switch case.
#[derive(Debug)]
pub enum Guards {
	/// The default case.
	Default,
	/// Cases of a value switch.
	Values(Box<[Expr]>),
	/// Cases of a type switch.
	Types(Box<[TypeExpr]>),
}


#[derive(Debug)]
pub struct SwitchCase {
	pub guards: Guards,
	pub body: Block,
	pub pos: SourcePos,
}


/// The tag of a switch statement.
#[derive(Debug)]
pub enum SwitchTag {
	/// `switch { ... }`, cases are boolean conditions.
	None,
	/// `switch expr { ... }`
	Value(Expr),
	/// `switch [binding :=] expr.(type) { ... }`
	Type {
		binding: Option<(Symbol, SourcePos)>,
		expr: Expr,
	},
}


/// Where the value received in a select case goes.
#[derive(Debug)]
pub enum ReceiveTarget {
	/// `case <-ch:`
	Discard,
	/// `case v := <-ch:`
	Define(Symbol, SourcePos),
	/// `case v = <-ch:`
	Assign(Expr),
}


/// The communication of a select case.
#[derive(Debug)]
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


#[derive(Debug)]
pub struct SelectCase {
	pub comm: Comm,
	pub body: Block,
	pub pos: SourcePos,
}


/// Statements of all kinds in the language.
#[derive(Debug)]
pub enum Statement {
	/// Nested block.
	Block(Block),
	/// `var name [T] [= init]`
	Var {
		name: Symbol,
		ty: Option<TypeExpr>,
		init: Option<Expr>,
		pos: SourcePos,
	},
	/// `name := init`
	Define {
		name: Symbol,
		init: Expr,
		pos: SourcePos,
	},
	/// `const name = value`
	Const {
		name: Symbol,
		value: Expr,
		pos: SourcePos,
	},
	/// `type name = T`
	Type {
		name: Symbol,
		ty: TypeExpr,
		pos: SourcePos,
	},
	/// `target = value` or `target op= value`.
	Assign {
		target: Expr,
		op: Option<BinaryOp>,
		value: Expr,
		pos: SourcePos,
	},
	/// `target++` or `target--`.
	IncDec {
		target: Expr,
		increment: bool,
		pos: SourcePos,
	},
	/// `channel <- value`
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
		/// Else-if chains are nested as a single if statement in this block.
		otherwise: Option<Block>,
		pos: SourcePos,
	},
	/// `for [init]; [cond]; [post] { body }`, including the condition-only and infinite
	/// forms.
	For {
		init: Option<Box<Statement>>,
		condition: Option<Expr>,
		post: Option<Box<Statement>>,
		body: Block,
		pos: SourcePos,
	},
	/// `for [key[, value] :=] range expr { body }`
	Range {
		key: Option<(Symbol, SourcePos)>,
		value: Option<(Symbol, SourcePos)>,
		expr: Expr,
		body: Block,
		pos: SourcePos,
	},
	Switch {
		init: Option<Box<Statement>>,
		tag: SwitchTag,
		cases: Box<[SwitchCase]>,
		pos: SourcePos,
	},
	Select {
		cases: Box<[SelectCase]>,
		pos: SourcePos,
	},
	/// `label: statement`
	Labeled {
		label: Symbol,
		statement: Box<Statement>,
		pos: SourcePos,
	},
	Break {
		label: Option<Symbol>,
		pos: SourcePos,
	},
	Continue {
		label: Option<Symbol>,
		pos: SourcePos,
	},
	Goto {
		label: Symbol,
		pos: SourcePos,
	},
	Fallthrough {
		pos: SourcePos,
	},
	Return {
		value: Option<Expr>,
		pos: SourcePos,
	},
	/// `defer f(args)`
	Defer {
		call: Expr,
		pos: SourcePos,
	},
}


#[derive(Debug)]
pub struct Param {
	pub name: Symbol,
	pub ty: TypeExpr,
	pub pos: SourcePos,
}


#[derive(Debug)]
pub struct Function {
	pub name: Symbol,
	pub params: Box<[Param]>,
	pub result: Option<TypeExpr>,
	pub body: Block,
	pub pos: SourcePos,
}


/// Top level declarations.
#[derive(Debug)]
pub enum Item {
	Type {
		name: Symbol,
		ty: TypeExpr,
		pos: SourcePos,
	},
	Function(Function),
}


/// The abstract syntax tree for a source file.
#[derive(Debug)]
pub struct Ast {
	/// The source path. May be something fictional, like "<stdin>".
	pub path: Box<Path>,
	/// The declarations.
	pub items: Box<[Item]>,
}
