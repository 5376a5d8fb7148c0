use std::{
	cmp::Ordering,
	fmt::{self, Display},
	hash::{Hash, Hasher},
	ops::Neg,
};

use gc::{Finalize, Trace};

use crate::semantic::program::BinaryOp;
use super::Value;


/// Floats of the language. Ints mix with floats in arithmetic and comparisons, being
/// promoted to floats.
/// Floats may be dict keys, so they are totally ordered: NaN sorts before every number and
/// never equals anything, but all NaNs share a hash.
#[derive(Debug, Default, Clone)]
#[derive(Trace, Finalize)]
pub struct Float(pub f64);


impl Float {
	/// Shallow copy.
	pub fn copy(&self) -> Self {
		Self(self.0)
	}


	/// The value as a float, if it is a number.
	pub fn of(value: &Value) -> Option<Self> {
		match value {
			Value::Int(int) => Some((*int).into()),
			Value::Float(float) => Some(float.copy()),
			_ => None,
		}
	}


	pub fn is_nan(&self) -> bool {
		self.0.is_nan()
	}


	/// Apply an arithmetic operator. Division by zero follows IEEE 754. Returns None for
	/// operators that don't produce numbers.
	pub fn arith(&self, op: BinaryOp, rhs: &Self) -> Option<Self> {
		let (a, b) = (self.0, rhs.0);

		let result = match op {
			BinaryOp::Plus => a + b,
			BinaryOp::Minus => a - b,
			BinaryOp::Times => a * b,
			BinaryOp::Div => a / b,
			BinaryOp::Mod => a % b,
			_ => return None,
		};

		Some(Self(result))
	}


	/// Numeric ordering, where NaN is unordered.
	pub fn partial(&self, other: &Self) -> Option<Ordering> {
		self.0.partial_cmp(&other.0)
	}
}


impl PartialEq for Float {
	fn eq(&self, other: &Self) -> bool {
		self.partial(other) == Some(Ordering::Equal)
	}
}


impl Eq for Float { }


impl PartialOrd for Float {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}


impl Ord for Float {
	fn cmp(&self, other: &Self) -> Ordering {
		self.partial(other).unwrap_or_else(
			|| self.is_nan().cmp(&other.is_nan()).reverse()
		)
	}
}


impl Hash for Float {
	fn hash<H: Hasher>(&self, state: &mut H) {
		if self.is_nan() {
			f64::NAN.to_bits().hash(state)
		} else if self.0 == 0.0 {
			0u64.hash(state) // Zero and negative zero are equal.
		} else {
			self.0.to_bits().hash(state)
		}
	}
}


impl Neg for &Float {
	type Output = Float;

	fn neg(self) -> Float {
		Float(-self.0)
	}
}


/// Integral floats keep a trailing `.0`, to tell them apart from ints.
impl Display for Float {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if self.0.is_finite() && self.0.fract() == 0.0 && self.0.abs() < 1e16 {
			write!(f, "{:.1}", self.0)
		} else {
			write!(f, "{}", self.0)
		}
	}
}


impl From<f64> for Float {
	fn from(f: f64) -> Self {
		Self(f)
	}
}


impl From<i64> for Float {
	fn from(int: i64) -> Self {
		Self(int as f64)
	}
}


#[cfg(test)]
mod tests {
	use super::*;


	#[test]
	fn test_nan() {
		let nan = Float(f64::NAN);

		assert_ne!(nan, nan.copy());
		assert_eq!(nan.cmp(&Float(f64::NEG_INFINITY)), Ordering::Less);
		assert_eq!(Float(1.0).cmp(&nan), Ordering::Greater);
	}


	#[test]
	fn test_arith() {
		let two = Float::of(&Value::Int(2)).expect("ints are numbers");

		assert_eq!(two.arith(BinaryOp::Div, &Float(0.5)), Some(Float(4.0)));
		assert_eq!(two.arith(BinaryOp::Div, &Float(0.0)), Some(Float(f64::INFINITY)));
		assert_eq!(two.arith(BinaryOp::Equals, &two), None);
		assert_eq!(Float::of(&Value::Bool(true)), None);
	}


	#[test]
	fn test_display() {
		assert_eq!(Float(3.0).to_string(), "3.0");
		assert_eq!(Float(-0.25).to_string(), "-0.25");
		assert_eq!(Float(f64::INFINITY).to_string(), "inf");
	}
}
