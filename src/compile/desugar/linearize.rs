//! Expression linearization: every statement of a lowered function may suspend at most
//! once, and only as the last effect of its evaluation. Whatever is evaluated before the
//! suspension is stored in temporaries, so that re-executing the statement on resume
//! yields the same values.

use super::{assignment, Desugar};
use crate::semantic::program::{
	BinaryOp,
	Block,
	Callee,
	Expr,
	Literal,
	Place,
	Statement,
	Type,
};
use crate::syntax::SourcePos;


impl<'a> Desugar<'a> {
	/// Whether evaluating the expression may suspend the coroutine.
	pub(super) fn suspends(&self, expr: &Expr) -> bool {
		expr.any(
			&mut |expr| match expr {
				Expr::Yield { .. } => true,
				Expr::Call { callee: Callee::Function(id), .. } => self.colors.contains_key(id),
				_ => false,
			}
		)
	}


	/// Lower an expression to contain at most one suspension, evaluated after every other
	/// effect of the expression. Prior effects are emitted as statements.
	pub(super) fn tail(&mut self, expr: Expr, out: &mut Vec<Statement>) -> Expr {
		if !self.suspends(&expr) {
			return expr;
		}

		match expr {
			Expr::Call { callee, args, pos } if self.suspends_when_called(&callee) => {
				let mut stable = Vec::with_capacity(args.len());

				for arg in args.into_vec() { // Use vec's owned iterator.
					let arg = self.value(arg, out);
					stable.push(self.stable(arg, out));
				}

				Expr::Call { callee, args: stable.into(), pos }
			}

			Expr::Yield { signature, value, pos } => {
				let value = self.value(*value, out);
				let value = self.stable(value, out);

				Expr::Yield { signature, value: Box::new(value), pos }
			}

			// Short circuit operators only evaluate the suspending operand conditionally.
			Expr::BinaryOp { left, op: op @ (BinaryOp::And | BinaryOp::Or), right, pos }
				if self.suspends(&right) =>
			{
				let result = self.temp("c", Type::Bool);

				let left = self.value(*left, out);
				out.push(assignment(result, left, pos));

				let mut then = Vec::new();
				let right = self.tail(*right, &mut then);
				then.push(assignment(result, right, pos));

				let condition = match op {
					BinaryOp::And => Expr::variable(result, pos),
					_ => Expr::not(Expr::variable(result, pos)),
				};

				out.push(
					Statement::If {
						init: None,
						condition,
						then: then.into(),
						otherwise: Block::default(),
						pos,
					}
				);

				Expr::variable(result, pos)
			}

			Expr::BinaryOp { left, op, right, pos } => {
				let (left, right) = self.pair(*left, *right, out);
				Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right), pos }
			}

			Expr::Index { object, index, pos } => {
				let (object, index) = self.pair(*object, *index, out);
				Expr::Index { object: Box::new(object), index: Box::new(index), pos }
			}

			Expr::UnaryOp { op, operand, pos } => {
				let operand = self.tail(*operand, out);
				Expr::UnaryOp { op, operand: Box::new(operand), pos }
			}

			Expr::Call { callee, args, pos } => {
				let args = self.operands(args.into_vec(), out);
				Expr::Call { callee, args: args.into(), pos }
			}

			Expr::Make { ty, size, pos } => Expr::Make {
				ty,
				size: size.map(|size| Box::new(self.tail(*size, out))),
				pos,
			},

			Expr::Receive { channel, pos } => {
				let channel = self.tail(*channel, out);
				Expr::Receive { channel: Box::new(channel), pos }
			}

			Expr::TypeIs { expr, ty, pos } => {
				let expr = self.tail(*expr, out);
				Expr::TypeIs { expr: Box::new(expr), ty, pos }
			}

			Expr::Literal { literal: Literal::Array(items), pos } => {
				let items = self.operands(items.into_vec(), out);
				Expr::literal(Literal::Array(items.into()), pos)
			}

			Expr::Literal { literal: Literal::Dict(items), pos } => {
				let flat = items
					.into_vec()
					.into_iter()
					.flat_map(|(key, value)| vec![key, value])
					.collect();

				let mut flat = self.operands(flat, out).into_iter();
				let mut items = Vec::new();

				while let (Some(key), Some(value)) = (flat.next(), flat.next()) {
					items.push((key, value));
				}

				Expr::literal(Literal::Dict(items.into()), pos)
			}

			expr => expr,
		}
	}


	fn suspends_when_called(&self, callee: &Callee) -> bool {
		match callee {
			Callee::Function(id) => self.colors.contains_key(id),
			Callee::Builtin(_) => false,
		}
	}


	/// Lower a list of operands evaluated left to right. Operands before the last
	/// suspending one are made stable, the last one is lowered in tail position.
	pub(super) fn operands(&mut self, operands: Vec<Expr>, out: &mut Vec<Statement>) -> Vec<Expr> {
		let last = operands.iter().rposition(|operand| self.suspends(operand));

		let mut lowered = Vec::with_capacity(operands.len());

		for (ix, operand) in operands.into_iter().enumerate() {
			let operand = match last {
				Some(last) if ix < last => {
					let operand = self.value(operand, out);
					self.stable(operand, out)
				}

				Some(last) if ix == last => self.tail(operand, out),

				_ => operand,
			};

			lowered.push(operand);
		}

		lowered
	}


	pub(super) fn pair(&mut self, first: Expr, second: Expr, out: &mut Vec<Statement>) -> (Expr, Expr) {
		let mut operands = self.operands(vec![first, second], out);
		let second = operands.pop().expect("missing operand");
		let first = operands.pop().expect("missing operand");
		(first, second)
	}


	/// Evaluate a suspending expression into a temporary.
	pub(super) fn value(&mut self, expr: Expr, out: &mut Vec<Statement>) -> Expr {
		if !self.suspends(&expr) {
			return expr;
		}

		let pos = expr.pos();
		let expr = self.tail(expr, out);
		let var = self.temp("v", Type::Any);
		out.push(assignment(var, expr, pos));

		Expr::variable(var, pos)
	}


	/// Evaluate an expression into a temporary, unless it yields the same value when
	/// evaluated again after a resume.
	pub(super) fn stable(&mut self, expr: Expr, out: &mut Vec<Statement>) -> Expr {
		if is_stable(&expr) {
			return expr;
		}

		let pos = expr.pos();
		let var = self.temp("v", Type::Any);
		out.push(assignment(var, expr, pos));

		Expr::variable(var, pos)
	}


	/// Assign a value to a place, evaluating the place's operands first.
	pub(super) fn assign(&mut self, place: Place, value: Expr, pos: SourcePos, out: &mut Vec<Statement>) {
		match place {
			Place::Variable(var) => {
				let value = self.tail(value, out);
				out.push(Statement::Assign { place: Place::Variable(var), value, pos });
			}

			Place::Index { object, index } => {
				let mut operands = self.operands(vec![object, index, value], out);
				let value = operands.pop().expect("missing operand");
				let index = operands.pop().expect("missing operand");
				let object = operands.pop().expect("missing operand");

				out.push(Statement::Assign { place: Place::Index { object, index }, value, pos });
			}
		}
	}
}


/// Whether an expression has no effects and reads nothing mutable besides locals.
fn is_stable(expr: &Expr) -> bool {
	match expr {
		Expr::Variable { .. } | Expr::FrameIp => true,

		Expr::Literal { literal, .. } => !matches!(literal, Literal::Array(_) | Literal::Dict(_)),

		Expr::UnaryOp { operand, .. } => is_stable(operand),

		Expr::BinaryOp { left, right, .. } => is_stable(left) && is_stable(right),

		Expr::TypeIs { expr, .. } => is_stable(expr),

		_ => false,
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::syntax::SourcePos;

	#[test]
	fn test_stable_expressions() {
		let pos = SourcePos::default();
		let int = |value| Expr::literal(Literal::Int(value), pos);

		assert!(is_stable(&Expr::binary(int(1), BinaryOp::Plus, int(2))));
		assert!(is_stable(&Expr::not(Expr::literal(Literal::Bool(true), pos))));
		assert!(!is_stable(&Expr::literal(Literal::Array(Box::default()), pos)));
		assert!(
			!is_stable(
				&Expr::Call {
					callee: Callee::Builtin("len"),
					args: Box::new([int(1)]),
					pos,
				}
			)
		);
	}
}
