mod error;
#[cfg(test)]
mod tests;

use std::iter::Peekable;

use super::lexer::{Keyword, Operator, Token, TokenKind};
use super::{ast, SourcePos};
pub use error::Error;


/// The parser may report multiple errors before finishing. Instead of allocating those in
/// an vector, we delegate such handling to the caller.
pub trait ErrorReporter {
	fn report(&mut self, error: Error);
}


impl<F> ErrorReporter for F
where
	F: FnMut(Error),
{
	fn report(&mut self, error: Error) {
		self(error)
	}
}


/// The parser for Corolla syntax.
#[derive(Debug)]
pub struct Parser<I, E>
where
	I: Iterator<Item = Token>,
{
	// We don't use a std::iter::Peekable for the current token because we must be able to
	// move from `token`, but Peekable only returns a reference. The cursor is peekable to
	// provide a second token of lookahead, needed for labels.
	cursor: Peekable<I>,
	token: Option<Token>,
	error_reporter: E,
}


impl<I, E> Parser<I, E>
where
	I: Iterator<Item = Token>,
	E: ErrorReporter,
{
	/// Create a new parser for the given input.
	pub fn new(cursor: I, error_reporter: E) -> Self {
		let mut cursor = cursor.peekable();
		let token = cursor.next();

		Self { cursor, token, error_reporter }
	}


	/// Parse the input, producing the top level declarations.
	/// Errors are reported, and parsing resumes at the next declaration.
	pub fn parse(mut self) -> Box<[ast::Item]> {
		let mut items = Vec::new();

		loop {
			match &self.token {
				Some(Token { kind: TokenKind::Semicolon, .. }) => self.step(),

				Some(_) => match self.parse_item() {
					Ok(item) => items.push(item),
					Err(error) => {
						self.error_reporter.report(error);
						self.synchronize();
					}
				},

				None => break,
			}
		}

		items.into_boxed_slice()
	}


	/// Skip tokens until the start of the next top level declaration.
	fn synchronize(&mut self) {
		// Always skip at least one token, so that we make progress.
		self.step();

		while let Some(token) = &self.token {
			match token.kind {
				TokenKind::Keyword(Keyword::Func) | TokenKind::Keyword(Keyword::Type) => break,
				_ => self.step(),
			}
		}
	}


	/// Step the cursor, placing the next token on self.token.
	fn step(&mut self) {
		self.token = self.cursor.next();
	}


	/// Try and eat a token.
	fn eat<F, T>(&mut self, eat: F) -> Result<T, Error>
	where
		F: FnOnce(Token) -> Result<T, (Error, Token)>,
	{
		if let Some(token) = self.token.take() {
			match eat(token) {
				Ok(value) => {
					// Token successfully consumed.
					self.step();
					Ok(value)
				}

				Err((error, token)) => {
					// Fail, rollback the token and produce an error.
					self.token = Some(token);
					Err(error)
				}
			}
		} else {
			Err(Error::unexpected_eof())
		}
	}


	/// Consume the expected token, or produce an error.
	fn expect(&mut self, expected: TokenKind) -> Result<SourcePos, Error> {
		self.eat(|token| match token {
			Token { kind, pos } if kind == expected => Ok(pos),
			token => Err((Error::unexpected(token.clone(), expected), token)),
		})
	}


	/// Whether the current token is of the given kind.
	fn at(&self, kind: &TokenKind) -> bool {
		matches!(&self.token, Some(token) if &token.kind == kind)
	}


	/// Whether the token after the current one is of the given kind.
	fn peek_is(&mut self, kind: &TokenKind) -> bool {
		matches!(self.cursor.peek(), Some(token) if &token.kind == kind)
	}


	/// The position of the current token, for constructs that don't consume it.
	fn pos(&self) -> Option<SourcePos> {
		self.token.as_ref().map(|token| token.pos)
	}


	/// Parse a top level declaration.
	fn parse_item(&mut self) -> Result<ast::Item, Error> {
		match self.token.take() {
			Some(Token { kind: TokenKind::Keyword(Keyword::Func), pos }) => {
				self.step();

				let name = self.parse_identifier()?;
				self.expect(TokenKind::OpenParens)?;
				let params = self.comma_sep(TokenKind::CloseParens, |parser| {
					let pos = parser.pos();
					let name = parser.parse_identifier()?;
					let ty = parser.parse_type()?;

					Ok(ast::Param { name, ty, pos: pos.unwrap_or_default() })
				})?;
				self.expect(TokenKind::CloseParens)?;

				let result =
					if self.at(&TokenKind::OpenBrace) {
						None
					} else {
						Some(self.parse_type()?)
					};

				let body = self.parse_block()?;

				Ok(ast::Item::Function(ast::Function { name, params, result, body, pos }))
			}

			Some(Token { kind: TokenKind::Keyword(Keyword::Type), pos }) => {
				self.step();

				let (name, ty) = self.parse_type_decl()?;

				Ok(ast::Item::Type { name, ty, pos })
			}

			Some(token) => {
				self.token = Some(token.clone());
				Err(Error::unexpected_msg(token, "declaration"))
			}

			None => Err(Error::unexpected_eof()),
		}
	}


	/// Parse `name = T`, after the type keyword.
	fn parse_type_decl(&mut self) -> Result<(ast::Symbol, ast::TypeExpr), Error> {
		let name = self.parse_identifier()?;
		self.expect(TokenKind::Operator(Operator::Assign))?;
		let ty = self.parse_type()?;

		Ok((name, ty))
	}


	/// Parse a type expression.
	fn parse_type(&mut self) -> Result<ast::TypeExpr, Error> {
		match self.token.take() {
			Some(Token { kind: TokenKind::Identifier(name), pos }) => {
				self.step();
				Ok(ast::TypeExpr::Named { name, pos })
			}

			Some(Token { kind: TokenKind::Literal(super::lexer::Literal::Nil), pos }) => {
				self.step();
				Ok(ast::TypeExpr::Nil { pos })
			}

			Some(Token { kind: TokenKind::OpenBracket, pos }) => {
				self.step();

				self.expect(TokenKind::CloseBracket)?;
				let item = self.parse_type()?;

				Ok(ast::TypeExpr::Array { item: item.into(), pos })
			}

			Some(Token { kind: TokenKind::Keyword(Keyword::Map), pos }) => {
				self.step();

				self.expect(TokenKind::OpenBracket)?;
				let key = self.parse_type()?;
				self.expect(TokenKind::CloseBracket)?;
				let value = self.parse_type()?;

				Ok(ast::TypeExpr::Map { key: key.into(), value: value.into(), pos })
			}

			Some(Token { kind: TokenKind::Keyword(Keyword::Chan), pos }) => {
				self.step();

				let item = self.parse_type()?;

				Ok(ast::TypeExpr::Chan { item: item.into(), pos })
			}

			Some(token) => {
				self.token = Some(token.clone());
				Err(Error::unexpected_msg(token, "type"))
			}

			None => Err(Error::unexpected_eof()),
		}
	}


	/// Parse a braced block of statements.
	fn parse_block(&mut self) -> Result<ast::Block, Error> {
		self.expect(TokenKind::OpenBrace)?;
		let block = self.parse_statements()?;
		self.expect(TokenKind::CloseBrace)?;

		Ok(block)
	}


	/// Parse a list of statements, stopping at a closing brace or at a case clause.
	fn parse_statements(&mut self) -> Result<ast::Block, Error> {
		let mut block = Vec::new();

		loop {
			match &self.token {
				Some(Token { kind: TokenKind::Semicolon, .. }) => self.step(),

				Some(Token { kind: TokenKind::CloseBrace, .. })
				| Some(Token { kind: TokenKind::Keyword(Keyword::Case), .. })
				| Some(Token { kind: TokenKind::Keyword(Keyword::Default), .. }) => break,

				Some(_) => {
					block.push(self.parse_statement()?);

					// Statements must be terminated, unless they end the list.
					match &self.token {
						Some(Token { kind: TokenKind::Semicolon, .. }) => self.step(),
						Some(Token { kind: TokenKind::CloseBrace, .. }) => (),
						Some(token) => {
							let token = token.clone();
							return Err(Error::unexpected(token, TokenKind::Semicolon));
						}
						None => return Err(Error::unexpected_eof()),
					}
				}

				None => break,
			}
		}

		Ok(block.into())
	}


	/// Parse a single statement.
	fn parse_statement(&mut self) -> Result<ast::Statement, Error> {
		let colon_follows = self.peek_is(&TokenKind::Colon);

		match self.token.take() {
			// Labeled statement.
			Some(Token { kind: TokenKind::Identifier(label), pos }) if colon_follows => {
				self.step(); // Identifier.
				self.step(); // Colon.

				let statement = self.parse_statement()?;

				Ok(ast::Statement::Labeled { label, statement: statement.into(), pos })
			}

			// Nested block.
			Some(token @ Token { kind: TokenKind::OpenBrace, .. }) => {
				self.token = Some(token);
				Ok(ast::Statement::Block(self.parse_block()?))
			}

			// Var.
			Some(Token { kind: TokenKind::Keyword(Keyword::Var), pos }) => {
				self.step();

				let name = self.parse_identifier()?;

				let ty =
					if self.at(&TokenKind::Operator(Operator::Assign)) {
						None
					} else {
						Some(self.parse_type()?)
					};

				let init =
					if self.at(&TokenKind::Operator(Operator::Assign)) {
						self.step();
						Some(self.parse_expression()?)
					} else {
						None
					};

				if ty.is_none() && init.is_none() {
					return Err(Error::invalid("variable declaration requires a type or a value", pos));
				}

				Ok(ast::Statement::Var { name, ty, init, pos })
			}

			// Const.
			Some(Token { kind: TokenKind::Keyword(Keyword::Const), pos }) => {
				self.step();

				let name = self.parse_identifier()?;
				self.expect(TokenKind::Operator(Operator::Assign))?;
				let value = self.parse_expression()?;

				Ok(ast::Statement::Const { name, value, pos })
			}

			// Type.
			Some(Token { kind: TokenKind::Keyword(Keyword::Type), pos }) => {
				self.step();

				let (name, ty) = self.parse_type_decl()?;

				Ok(ast::Statement::Type { name, ty, pos })
			}

			// If.
			Some(Token { kind: TokenKind::Keyword(Keyword::If), pos }) => {
				self.step();
				self.parse_if(pos)
			}

			// For.
			Some(Token { kind: TokenKind::Keyword(Keyword::For), pos }) => {
				self.step();
				self.parse_for(pos)
			}

			// Switch.
			Some(Token { kind: TokenKind::Keyword(Keyword::Switch), pos }) => {
				self.step();
				self.parse_switch(pos)
			}

			// Select.
			Some(Token { kind: TokenKind::Keyword(Keyword::Select), pos }) => {
				self.step();
				self.parse_select(pos)
			}

			// Break.
			Some(Token { kind: TokenKind::Keyword(Keyword::Break), pos }) => {
				self.step();
				let label = self.parse_optional_identifier();

				Ok(ast::Statement::Break { label, pos })
			}

			// Continue.
			Some(Token { kind: TokenKind::Keyword(Keyword::Continue), pos }) => {
				self.step();
				let label = self.parse_optional_identifier();

				Ok(ast::Statement::Continue { label, pos })
			}

			// Goto.
			Some(Token { kind: TokenKind::Keyword(Keyword::Goto), pos }) => {
				self.step();
				let label = self.parse_identifier()?;

				Ok(ast::Statement::Goto { label, pos })
			}

			// Fallthrough.
			Some(Token { kind: TokenKind::Keyword(Keyword::Fallthrough), pos }) => {
				self.step();

				Ok(ast::Statement::Fallthrough { pos })
			}

			// Return.
			Some(Token { kind: TokenKind::Keyword(Keyword::Return), pos }) => {
				self.step();

				let value = match &self.token {
					Some(Token { kind: TokenKind::Semicolon, .. })
					| Some(Token { kind: TokenKind::CloseBrace, .. })
					| None => None,
					Some(_) => Some(self.parse_expression()?),
				};

				Ok(ast::Statement::Return { value, pos })
			}

			// Defer.
			Some(Token { kind: TokenKind::Keyword(Keyword::Defer), pos }) => {
				self.step();

				let call = self.parse_expression()?;

				if !matches!(call, ast::Expr::Call { .. }) {
					return Err(Error::invalid("expression in defer must be a function call", pos));
				}

				Ok(ast::Statement::Defer { call, pos })
			}

			// Simple statements.
			Some(token) => {
				self.token = Some(token);
				self.parse_simple_statement()
			}

			// EOF.
			None => Err(Error::unexpected_eof()),
		}
	}


	/// Parse a simple statement: expression, send, increment/decrement, assignment or short
	/// variable declaration.
	fn parse_simple_statement(&mut self) -> Result<ast::Statement, Error> {
		let expr = self.parse_expression()?;
		self.parse_simple_statement_rest(expr)
	}


	/// Parse the remainder of a simple statement that starts with the given expression.
	fn parse_simple_statement_rest(&mut self, expr: ast::Expr) -> Result<ast::Statement, Error> {
		match self.token.take() {
			Some(Token { kind: TokenKind::Operator(Operator::Define), pos }) => {
				self.step();

				let name = Self::expect_identifier(expr)?;
				let init = self.parse_expression()?;

				Ok(ast::Statement::Define { name, init, pos })
			}

			Some(Token { kind: TokenKind::Operator(Operator::Assign), pos }) => {
				self.step();

				let value = self.parse_expression()?;

				Ok(ast::Statement::Assign { target: expr, op: None, value, pos })
			}

			Some(Token { kind: TokenKind::Operator(Operator::AssignOp(op)), pos }) => {
				self.step();

				let value = self.parse_expression()?;

				Ok(ast::Statement::Assign { target: expr, op: Some(op.into()), value, pos })
			}

			Some(Token { kind: TokenKind::Operator(Operator::Increment), pos }) => {
				self.step();
				Ok(ast::Statement::IncDec { target: expr, increment: true, pos })
			}

			Some(Token { kind: TokenKind::Operator(Operator::Decrement), pos }) => {
				self.step();
				Ok(ast::Statement::IncDec { target: expr, increment: false, pos })
			}

			Some(Token { kind: TokenKind::Operator(Operator::Arrow), pos }) => {
				self.step();

				let value = self.parse_expression()?;

				Ok(ast::Statement::Send { channel: expr, value, pos })
			}

			token => {
				self.token = token;
				Ok(ast::Statement::Expr(expr))
			}
		}
	}


	/// Parse an if statement, after the if keyword.
	fn parse_if(&mut self, pos: SourcePos) -> Result<ast::Statement, Error> {
		let first = self.parse_simple_statement()?;

		let (init, condition) =
			if self.at(&TokenKind::Semicolon) {
				self.step();
				(Some(first.into()), self.parse_expression()?)
			} else {
				(None, Self::expect_expression(first, pos)?)
			};

		let then = self.parse_block()?;

		let otherwise =
			if self.at(&TokenKind::Keyword(Keyword::Else)) {
				self.step();

				match self.token.take() {
					Some(Token { kind: TokenKind::Keyword(Keyword::If), pos }) => {
						self.step();
						let statement = self.parse_if(pos)?;
						Some(vec![statement].into())
					}

					token => {
						self.token = token;
						Some(self.parse_block()?)
					}
				}
			} else {
				None
			};

		Ok(ast::Statement::If { init, condition, then, otherwise, pos })
	}


	/// Parse a for statement, after the for keyword.
	fn parse_for(&mut self, pos: SourcePos) -> Result<ast::Statement, Error> {
		match self.token.take() {
			// Infinite loop.
			Some(token @ Token { kind: TokenKind::OpenBrace, .. }) => {
				self.token = Some(token);
				let body = self.parse_block()?;

				return Ok(ast::Statement::For { init: None, condition: None, post: None, body, pos });
			}

			// Range without variables.
			Some(Token { kind: TokenKind::Keyword(Keyword::Range), .. }) => {
				self.step();
				return self.parse_range(None, None, pos);
			}

			token => self.token = token,
		}

		let init =
			if self.at(&TokenKind::Semicolon) {
				None
			} else {
				let first = self.parse_expression()?;
				let range_follows = self.peek_is(&TokenKind::Keyword(Keyword::Range));

				match self.token.take() {
					// Range with key and value.
					Some(Token { kind: TokenKind::Comma, .. }) => {
						self.step();

						let key = Self::expect_binding(first)?;
						let value = Self::expect_binding(self.parse_expression()?)?;
						self.expect(TokenKind::Operator(Operator::Define))?;
						self.expect(TokenKind::Keyword(Keyword::Range))?;

						return self.parse_range(Some(key), Some(value), pos);
					}

					// Range with key, or a short variable declaration.
					Some(Token { kind: TokenKind::Operator(Operator::Define), .. }) if range_follows => {
						self.step(); // Define.
						self.step(); // Range.

						let key = Self::expect_binding(first)?;

						return self.parse_range(Some(key), None, pos);
					}

					token => {
						self.token = token;
						Some(self.parse_simple_statement_rest(first)?)
					}
				}
			};

		// Condition only.
		if self.at(&TokenKind::OpenBrace) {
			let condition = match init {
				Some(statement) => Some(Self::expect_expression(statement, pos)?),
				None => None,
			};
			let body = self.parse_block()?;

			return Ok(ast::Statement::For { init: None, condition, post: None, body, pos });
		}

		self.expect(TokenKind::Semicolon)?;

		let condition =
			if self.at(&TokenKind::Semicolon) {
				None
			} else {
				Some(self.parse_expression()?)
			};

		self.expect(TokenKind::Semicolon)?;

		let post =
			if self.at(&TokenKind::OpenBrace) {
				None
			} else {
				Some(self.parse_simple_statement()?.into())
			};

		let body = self.parse_block()?;

		Ok(ast::Statement::For { init: init.map(Box::new), condition, post, body, pos })
	}


	/// Parse the remainder of a range loop, after the range keyword.
	fn parse_range(
		&mut self,
		key: Option<(ast::Symbol, SourcePos)>,
		value: Option<(ast::Symbol, SourcePos)>,
		pos: SourcePos,
	) -> Result<ast::Statement, Error> {
		let expr = self.parse_expression()?;
		let body = self.parse_block()?;

		Ok(ast::Statement::Range { key, value, expr, body, pos })
	}


	/// Parse a switch statement, after the switch keyword.
	fn parse_switch(&mut self, pos: SourcePos) -> Result<ast::Statement, Error> {
		let mut init = None;
		let mut tag = None;

		if !self.at(&TokenKind::OpenBrace) {
			let first = self.parse_simple_statement()?;

			if self.at(&TokenKind::Semicolon) {
				self.step();
				init = Some(Box::new(first));

				if !self.at(&TokenKind::OpenBrace) {
					tag = Some(self.parse_simple_statement()?);
				}
			} else {
				tag = Some(first);
			}
		}

		let tag = match tag {
			None => ast::SwitchTag::None,

			Some(ast::Statement::Expr(ast::Expr::TypeGuard { expr, .. })) => {
				ast::SwitchTag::Type { binding: None, expr: *expr }
			}

			Some(ast::Statement::Define { name, init: ast::Expr::TypeGuard { expr, .. }, pos }) => {
				ast::SwitchTag::Type { binding: Some((name, pos)), expr: *expr }
			}

			Some(statement) => ast::SwitchTag::Value(Self::expect_expression(statement, pos)?),
		};

		let is_type_switch = matches!(tag, ast::SwitchTag::Type { .. });

		self.expect(TokenKind::OpenBrace)?;

		let mut cases = Vec::new();

		loop {
			match self.token.take() {
				Some(Token { kind: TokenKind::Keyword(Keyword::Case), pos }) => {
					self.step();

					let guards =
						if is_type_switch {
							ast::Guards::Types(self.comma_sep(TokenKind::Colon, Self::parse_type)?)
						} else {
							ast::Guards::Values(self.comma_sep(TokenKind::Colon, Self::parse_expression)?)
						};

					self.expect(TokenKind::Colon)?;
					let body = self.parse_statements()?;

					cases.push(ast::SwitchCase { guards, body, pos });
				}

				Some(Token { kind: TokenKind::Keyword(Keyword::Default), pos }) => {
					self.step();

					self.expect(TokenKind::Colon)?;
					let body = self.parse_statements()?;

					cases.push(ast::SwitchCase { guards: ast::Guards::Default, body, pos });
				}

				Some(Token { kind: TokenKind::CloseBrace, .. }) => {
					self.step();
					break;
				}

				Some(token) => {
					self.token = Some(token.clone());
					return Err(Error::unexpected_msg(token, "case or default"));
				}

				None => return Err(Error::unexpected_eof()),
			}
		}

		Ok(ast::Statement::Switch { init, tag, cases: cases.into(), pos })
	}


	/// Parse a select statement, after the select keyword.
	fn parse_select(&mut self, pos: SourcePos) -> Result<ast::Statement, Error> {
		self.expect(TokenKind::OpenBrace)?;

		let mut cases = Vec::new();

		loop {
			match self.token.take() {
				Some(Token { kind: TokenKind::Keyword(Keyword::Case), pos }) => {
					self.step();

					let comm = match self.parse_simple_statement()? {
						ast::Statement::Expr(ast::Expr::UnaryOp { op: ast::UnaryOp::Receive, operand, .. }) => {
							ast::Comm::Receive { target: ast::ReceiveTarget::Discard, channel: *operand }
						}

						ast::Statement::Define {
							name,
							init: ast::Expr::UnaryOp { op: ast::UnaryOp::Receive, operand, .. },
							pos,
						} => ast::Comm::Receive {
							target: ast::ReceiveTarget::Define(name, pos),
							channel: *operand,
						},

						ast::Statement::Assign {
							target,
							op: None,
							value: ast::Expr::UnaryOp { op: ast::UnaryOp::Receive, operand, .. },
							..
						} => ast::Comm::Receive {
							target: ast::ReceiveTarget::Assign(target),
							channel: *operand,
						},

						ast::Statement::Send { channel, value, .. } => ast::Comm::Send { channel, value },

						_ => return Err(Error::invalid("select case must be a send or a receive", pos)),
					};

					self.expect(TokenKind::Colon)?;
					let body = self.parse_statements()?;

					cases.push(ast::SelectCase { comm, body, pos });
				}

				Some(Token { kind: TokenKind::Keyword(Keyword::Default), pos }) => {
					self.step();

					self.expect(TokenKind::Colon)?;
					let body = self.parse_statements()?;

					cases.push(ast::SelectCase { comm: ast::Comm::Default, body, pos });
				}

				Some(Token { kind: TokenKind::CloseBrace, .. }) => {
					self.step();
					break;
				}

				Some(token) => {
					self.token = Some(token.clone());
					return Err(Error::unexpected_msg(token, "case or default"));
				}

				None => return Err(Error::unexpected_eof()),
			}
		}

		Ok(ast::Statement::Select { cases: cases.into(), pos })
	}


	/// Parse a single expression.
	fn parse_expression(&mut self) -> Result<ast::Expr, Error> {
		let parse_factor =
			move |parser: &mut Self| parser.parse_binop(Self::parse_unop, Operator::is_factor);

		let parse_term =
			move |parser: &mut Self| parser.parse_binop(parse_factor, Operator::is_term);

		let parse_comparison = move |parser: &mut Self| {
			parser.parse_binop(parse_term, |op| op.is_equality() || op.is_comparison())
		};

		let parse_and =
			move |parser: &mut Self| parser.parse_binop(parse_comparison, |&op| op == Operator::And);

		let parse_or =
			move |parser: &mut Self| parser.parse_binop(parse_and, |&op| op == Operator::Or);

		parse_or(self)
	}


	/// Parse a higher precedence expression, optionally ending as a binary operator.
	fn parse_binop<P, F>(
		&mut self,
		mut parse_higher_prec_op: P,
		mut check: F,
	) -> Result<ast::Expr, Error>
	where
		P: FnMut(&mut Self) -> Result<ast::Expr, Error>,
		F: FnMut(&Operator) -> bool,
	{
		let mut expr = parse_higher_prec_op(self)?;

		loop {
			match self.token.take() {
				Some(Token { kind: TokenKind::Operator(op), pos }) if check(&op) => {
					self.step();

					let right = parse_higher_prec_op(self)?;

					expr = ast::Expr::BinaryOp {
						left: expr.into(),
						op: op.into(),
						right: right.into(),
						pos,
					};
				}

				token => {
					self.token = token;
					break;
				}
			}
		}

		Ok(expr)
	}


	/// Parse a higher precedence expression, optionally starting with a unary operator.
	fn parse_unop(&mut self) -> Result<ast::Expr, Error> {
		match self.token.take() {
			Some(Token { kind: TokenKind::Operator(op), pos }) if op.is_unary() => {
				self.step();

				let operand = self.parse_unop()?;

				Ok(ast::Expr::UnaryOp {
					op: op.into(),
					operand: operand.into(),
					pos,
				})
			}

			token => {
				self.token = token;
				self.parse_postfix()
			}
		}
	}


	/// Parse a primary expression followed by any number of calls, subscripts and type
	/// guards.
	fn parse_postfix(&mut self) -> Result<ast::Expr, Error> {
		let mut expr = self.parse_primary()?;

		loop {
			match self.token.take() {
				// Subscript.
				Some(Token { kind: TokenKind::OpenBracket, pos }) => {
					self.step();

					let index = self.parse_expression()?;
					self.expect(TokenKind::CloseBracket)?;

					expr = ast::Expr::Index { object: expr.into(), index: index.into(), pos };
				}

				// Function call.
				Some(Token { kind: TokenKind::OpenParens, pos }) => {
					self.step();

					let function = match expr {
						ast::Expr::Identifier { identifier, .. } => identifier,
						_ => return Err(Error::invalid("functions may only be called by name", pos)),
					};

					let args = self.comma_sep(TokenKind::CloseParens, Self::parse_expression)?;
					self.expect(TokenKind::CloseParens)?;

					expr = ast::Expr::Call { function, args, pos };
				}

				// Type guard.
				Some(Token { kind: TokenKind::Dot, pos }) => {
					self.step();

					self.expect(TokenKind::OpenParens)?;
					self.expect(TokenKind::Keyword(Keyword::Type))?;
					self.expect(TokenKind::CloseParens)?;

					expr = ast::Expr::TypeGuard { expr: expr.into(), pos };
				}

				token => {
					self.token = token;
					return Ok(expr);
				}
			}
		}
	}


	/// Parse a higher precedence expression.
	fn parse_primary(&mut self) -> Result<ast::Expr, Error> {
		match self.token.take() {
			// Identifier.
			Some(Token { kind: TokenKind::Identifier(identifier), pos }) => {
				self.step();

				Ok(ast::Expr::Identifier { identifier, pos })
			}

			// Basic literal.
			Some(Token { kind: TokenKind::Literal(literal), pos }) => {
				self.step();

				Ok(ast::Expr::Literal { literal: literal.into(), pos })
			}

			// Array literal.
			Some(Token { kind: TokenKind::OpenBracket, pos }) => {
				self.step();

				let items = self.comma_sep(TokenKind::CloseBracket, Self::parse_expression)?;
				self.expect(TokenKind::CloseBracket)?;

				Ok(ast::Expr::Literal { literal: ast::Literal::Array(items), pos })
			}

			// Dict literal.
			Some(Token { kind: TokenKind::OpenBrace, pos }) => {
				self.step();

				let items = self.comma_sep(TokenKind::CloseBrace, |parser| {
					let key = parser.parse_expression()?;
					parser.expect(TokenKind::Colon)?;
					let value = parser.parse_expression()?;

					Ok((key, value))
				})?;
				self.expect(TokenKind::CloseBrace)?;

				Ok(ast::Expr::Literal { literal: ast::Literal::Dict(items), pos })
			}

			// Make.
			Some(Token { kind: TokenKind::Keyword(Keyword::Make), pos }) => {
				self.step();

				self.expect(TokenKind::OpenParens)?;
				let ty = self.parse_type()?;

				let size =
					if self.at(&TokenKind::Comma) {
						self.step();
						Some(self.parse_expression()?.into())
					} else {
						None
					};

				self.expect(TokenKind::CloseParens)?;

				Ok(ast::Expr::Make { ty, size, pos })
			}

			// Yield.
			Some(Token { kind: TokenKind::Keyword(Keyword::Yield), pos }) => {
				self.step();

				self.expect(TokenKind::OpenBracket)?;
				let yields = self.parse_type()?;
				self.expect(TokenKind::Comma)?;
				let receives = self.parse_type()?;
				self.expect(TokenKind::CloseBracket)?;

				self.expect(TokenKind::OpenParens)?;
				let value = self.parse_expression()?;
				self.expect(TokenKind::CloseParens)?;

				Ok(ast::Expr::Yield { yields, receives, value: value.into(), pos })
			}

			// Parenthesis.
			Some(Token { kind: TokenKind::OpenParens, .. }) => {
				self.step();

				let expr = self.parse_expression()?;
				self.expect(TokenKind::CloseParens)?;

				Ok(expr)
			}

			// Some other unexpected token.
			Some(token) => {
				// We need to restore the token because it may be some delimiter.
				self.token = Some(token.clone());
				Err(Error::unexpected_msg(token, "expression"))
			}

			None => Err(Error::unexpected_eof()),
		}
	}


	/// Parse a identifier.
	fn parse_identifier(&mut self) -> Result<ast::Symbol, Error> {
		self.eat(|token| match token {
			Token { kind: TokenKind::Identifier(symbol), .. } => Ok(symbol),
			token => Err((Error::unexpected_msg(token.clone(), "identifier"), token)),
		})
	}


	/// Parse an identifier if there is one, as in labels of break and continue.
	fn parse_optional_identifier(&mut self) -> Option<ast::Symbol> {
		match self.token {
			Some(Token { kind: TokenKind::Identifier(symbol), .. }) => {
				self.step();
				Some(symbol)
			}

			_ => None,
		}
	}


	/// Comma-separated items, up to the given closing token, which is not consumed. A
	/// trailing comma is allowed.
	fn comma_sep<P, R>(&mut self, close: TokenKind, mut parse: P) -> Result<Box<[R]>, Error>
	where
		P: FnMut(&mut Self) -> Result<R, Error>,
	{
		let mut items = Vec::new();

		while !self.at(&close) {
			items.push(parse(self)?);

			match self.token {
				Some(Token { kind: TokenKind::Comma, .. }) => self.step(),
				_ => break,
			}
		}

		Ok(items.into())
	}


	/// Extract the identifier of the left side of a short variable declaration.
	fn expect_identifier(expr: ast::Expr) -> Result<ast::Symbol, Error> {
		match expr {
			ast::Expr::Identifier { identifier, .. } => Ok(identifier),
			expr => Err(Error::invalid("expected identifier on the left side of :=", expr.pos())),
		}
	}


	/// Extract a range loop variable.
	fn expect_binding(expr: ast::Expr) -> Result<(ast::Symbol, SourcePos), Error> {
		match expr {
			ast::Expr::Identifier { identifier, pos } => Ok((identifier, pos)),
			expr => Err(Error::invalid("expected identifier in range clause", expr.pos())),
		}
	}


	/// Extract the expression of an expression statement, as in conditions.
	fn expect_expression(statement: ast::Statement, pos: SourcePos) -> Result<ast::Expr, Error> {
		match statement {
			ast::Statement::Expr(expr) => Ok(expr),
			_ => Err(Error::invalid("expected expression, found statement", pos)),
		}
	}
}
