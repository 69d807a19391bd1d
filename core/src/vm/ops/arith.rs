use anyhow::{Result, bail};

use crate::bytecode::ArithOp;
use crate::error::VmError;
use crate::value::{OperandStack, Operands, Value};

const FRACTION_MASK: i64 = Value::ONE - 1;

impl ArithOp {
    #[inline]
    pub const fn is_unary(self) -> bool {
        matches!(
            self,
            ArithOp::Not | ArithOp::Abs | ArithOp::Neg | ArithOp::Floor | ArithOp::Ceiling
        )
    }

    pub fn apply(self, stack: &mut OperandStack) -> Result<()> {
        if self.is_unary() {
            let a = stack.peek(0)?;
            return stack.replace_top(self.unary(a));
        }
        stack.require(2)?;
        if self == ArithOp::Div && !stack.peek(0)?.is_true() {
            bail!(VmError::DivisionByZero);
        }
        let (a, b) = stack.pop2()?;
        stack.push(self.binary(a, b))
    }

    fn unary(self, a: Value) -> Value {
        match (self, a) {
            (ArithOp::Not, _) => Value::from_bool(!a.is_true()),
            (ArithOp::Abs, Value::Int(n) | Value::F26Dot6(n)) => a.with_same_mode(n.wrapping_abs()),
            (ArithOp::Neg, Value::Int(n) | Value::F26Dot6(n)) => a.with_same_mode(n.wrapping_neg()),
            (ArithOp::Floor, Value::F26Dot6(bits)) => Value::F26Dot6(bits & !FRACTION_MASK),
            (ArithOp::Ceiling, Value::F26Dot6(bits)) => {
                Value::F26Dot6(bits.wrapping_add(FRACTION_MASK) & !FRACTION_MASK)
            }
            // whole numbers are already floored
            (ArithOp::Floor | ArithOp::Ceiling, Value::Int(_)) => a,
            _ => unreachable!("{self} is not unary"),
        }
    }

    /// `a` was pushed before `b`.
    fn binary(self, a: Value, b: Value) -> Value {
        use std::cmp::Ordering::*;
        let ops = Value::promote(a, b);
        match self {
            ArithOp::Lt => Value::from_bool(Value::compare(a, b) == Less),
            ArithOp::LtEq => Value::from_bool(Value::compare(a, b) != Greater),
            ArithOp::Gt => Value::from_bool(Value::compare(a, b) == Greater),
            ArithOp::GtEq => Value::from_bool(Value::compare(a, b) != Less),
            ArithOp::Eq => Value::from_bool(Value::compare(a, b) == Equal),
            ArithOp::Neq => Value::from_bool(Value::compare(a, b) != Equal),
            ArithOp::And => Value::from_bool(a.is_true() && b.is_true()),
            ArithOp::Or => Value::from_bool(a.is_true() || b.is_true()),
            ArithOp::Add => ops.map(i64::wrapping_add),
            ArithOp::Sub => ops.map(i64::wrapping_sub),
            ArithOp::Max => ops.map(i64::max),
            ArithOp::Min => ops.map(i64::min),
            ArithOp::Mul => match ops {
                Operands::Ints(x, y) => Value::Int(x.wrapping_mul(y)),
                Operands::Fixed(x, y) => Value::F26Dot6(mul_26dot6(x, y)),
            },
            ArithOp::Div => match ops {
                Operands::Ints(x, y) => Value::Int(x.wrapping_div(y)),
                Operands::Fixed(x, y) => Value::F26Dot6(div_26dot6(x, y)),
            },
            _ => unreachable!("{self} is not binary"),
        }
    }
}

/// 26.6 product rounded half away from zero, saturating at the i64 range.
fn mul_26dot6(x: i64, y: i64) -> i64 {
    let product = x as i128 * y as i128;
    let half = (Value::ONE / 2) as i128;
    let rounded = if product < 0 { product - half } else { product + half };
    saturate(rounded / Value::ONE as i128)
}

/// 26.6 quotient truncated toward zero. `y` must be non-zero.
fn div_26dot6(x: i64, y: i64) -> i64 {
    saturate(x as i128 * Value::ONE as i128 / y as i128)
}

#[inline]
fn saturate(n: i128) -> i64 {
    n.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
