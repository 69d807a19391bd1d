use std::cmp::Ordering;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{IndexKind, VmError};

/// A stack or register cell.
///
/// `F26Dot6` holds the raw scaled value: `F26Dot6(64)` is 1.0. An `Int(n)` is
/// promoted to `F26Dot6(n * 64)` whenever it meets a fixed-point operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    F26Dot6(i64),
}

/// Operand pair after numeric promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    Ints(i64, i64),
    Fixed(i64, i64),
}

impl Value {
    pub const ONE: i64 = 64;

    pub const FALSE: Value = Value::Int(0);
    pub const TRUE: Value = Value::Int(1);

    /// Nearest 26.6 value to `f`.
    pub fn from_f64(f: f64) -> Self {
        Value::F26Dot6((f * Self::ONE as f64).round() as i64)
    }

    #[inline]
    pub fn from_bool(b: bool) -> Self {
        if b { Value::TRUE } else { Value::FALSE }
    }

    #[inline]
    pub fn is_fixed(self) -> bool {
        matches!(self, Value::F26Dot6(_))
    }

    #[inline]
    pub fn is_true(self) -> bool {
        match self {
            Value::Int(n) | Value::F26Dot6(n) => n != 0,
        }
    }

    /// Raw 26.6 bits of the value. Integers too large for 26.6 saturate.
    #[inline]
    pub fn fixed_bits(self) -> i64 {
        match self {
            Value::Int(n) => n.saturating_mul(Self::ONE),
            Value::F26Dot6(bits) => bits,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Value::Int(n) => n as f64,
            Value::F26Dot6(bits) => bits as f64 / Self::ONE as f64,
        }
    }

    /// Whole-unit part, truncated toward zero.
    #[inline]
    pub fn integer_part(self) -> i64 {
        match self {
            Value::Int(n) => n,
            Value::F26Dot6(bits) => bits / Self::ONE,
        }
    }

    /// Interpret the value as a non-negative index into `kind`.
    pub fn to_index(self, kind: IndexKind) -> Result<u32> {
        let index = self.integer_part();
        u32::try_from(index).map_err(|_| VmError::InvalidIndex { kind, index }.into())
    }

    /// Interpret the value as a storage location. Every non-negative integer
    /// part is addressable.
    pub fn to_location(self) -> Result<u64> {
        let index = self.integer_part();
        u64::try_from(index).map_err(|_| {
            VmError::InvalidIndex {
                kind: IndexKind::Storage,
                index,
            }
            .into()
        })
    }

    /// Rebuild a value in the representation of `self` from promoted bits.
    #[inline]
    pub fn with_same_mode(self, n: i64) -> Self {
        match self {
            Value::Int(_) => Value::Int(n),
            Value::F26Dot6(_) => Value::F26Dot6(n),
        }
    }

    pub fn promote(a: Value, b: Value) -> Operands {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Operands::Ints(x, y),
            _ => Operands::Fixed(a.fixed_bits(), b.fixed_bits()),
        }
    }

    /// Numeric ordering after promotion.
    pub fn compare(a: Value, b: Value) -> Ordering {
        match Self::promote(a, b) {
            Operands::Ints(x, y) | Operands::Fixed(x, y) => x.cmp(&y),
        }
    }
}

impl Operands {
    /// Apply `op` to the promoted pair, keeping the promoted representation.
    pub fn map(self, op: impl FnOnce(i64, i64) -> i64) -> Value {
        match self {
            Operands::Ints(x, y) => Value::Int(op(x, y)),
            Operands::Fixed(x, y) => Value::F26Dot6(op(x, y)),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::from_f64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::from_bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::F26Dot6(_) => write!(f, "{}f", self.to_f64()),
        }
    }
}
