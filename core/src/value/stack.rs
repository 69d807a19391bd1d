use anyhow::{Result, bail};

use super::value::Value;
use crate::error::VmError;

/// Operand stack. Index `len - 1` is the top.
///
/// Every fallible operation checks its preconditions before mutating, so a
/// failed instruction leaves the stack untouched.
#[derive(Debug, Clone)]
pub struct OperandStack {
    values: Vec<Value>,
    max_depth: usize,
}

impl Default for OperandStack {
    fn default() -> Self {
        Self::new(crate::config::VmConfig::default().max_stack_depth)
    }
}

impl OperandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            values: Vec::with_capacity(max_depth.min(256)),
            max_depth,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Bottom-to-top view.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// Fail with `StackUnderflow` unless at least `n` values are present.
    #[inline]
    pub fn require(&self, n: usize) -> Result<()> {
        if self.values.len() < n {
            bail!(VmError::StackUnderflow {
                needed: n,
                available: self.values.len(),
            });
        }
        Ok(())
    }

    /// Fail with `StackOverflow` unless `n` more values fit.
    #[inline]
    pub fn reserve(&self, n: usize) -> Result<()> {
        if self.values.len() + n > self.max_depth {
            bail!(VmError::StackOverflow { limit: self.max_depth });
        }
        Ok(())
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.reserve(1)?;
        self.values.push(value.into());
        Ok(())
    }

    pub fn extend(&mut self, values: impl ExactSizeIterator<Item = Value>) -> Result<()> {
        self.reserve(values.len())?;
        self.values.extend(values);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value> {
        self.values.pop().ok_or_else(|| {
            VmError::StackUnderflow {
                needed: 1,
                available: 0,
            }
            .into()
        })
    }

    /// Pop two values, returning them in push order `(a, b)` where `b` was on top.
    pub fn pop2(&mut self) -> Result<(Value, Value)> {
        self.require(2)?;
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    /// Value `depth` slots below the top; depth 0 is the top.
    pub fn peek(&self, depth: usize) -> Result<Value> {
        self.require(depth + 1)?;
        Ok(self.values[self.values.len() - 1 - depth])
    }

    /// Replace the top value.
    pub fn replace_top(&mut self, value: Value) -> Result<()> {
        self.require(1)?;
        if let Some(top) = self.values.last_mut() {
            *top = value;
        }
        Ok(())
    }

    /// Remove and return the value `depth` slots below the top.
    pub fn remove_at_depth(&mut self, depth: usize) -> Result<Value> {
        self.require(depth + 1)?;
        let index = self.values.len() - 1 - depth;
        Ok(self.values.remove(index))
    }

    /// Swap the values at the given depths.
    pub fn swap_depths(&mut self, a: usize, b: usize) -> Result<()> {
        self.require(a.max(b) + 1)?;
        let len = self.values.len();
        self.values.swap(len - 1 - a, len - 1 - b);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
