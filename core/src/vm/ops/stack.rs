use anyhow::{Result, bail};

use crate::bytecode::StackOp;
use crate::error::{IndexKind, VmError};
use crate::value::{OperandStack, Value};

impl StackOp {
    pub fn apply(self, stack: &mut OperandStack) -> Result<()> {
        match self {
            StackOp::Dup => {
                let top = stack.peek(0)?;
                stack.push(top)
            }
            StackOp::Pop => stack.pop().map(drop),
            StackOp::Clear => {
                stack.clear();
                Ok(())
            }
            StackOp::Swap => stack.swap_depths(0, 1),
            StackOp::Depth => {
                let depth = stack.len() as i64;
                stack.push(Value::Int(depth))
            }
            StackOp::CIndex => {
                let depth = element_depth(stack)?;
                stack.pop()?;
                let copy = stack.peek(depth)?;
                stack.push(copy)
            }
            StackOp::MIndex => {
                let depth = element_depth(stack)?;
                stack.pop()?;
                let moved = stack.remove_at_depth(depth)?;
                stack.push(moved)
            }
            StackOp::Roll => {
                stack.require(3)?;
                let third = stack.remove_at_depth(2)?;
                stack.push(third)
            }
        }
    }
}

/// Validate the 1-based element index on top of the stack for CINDEX/MINDEX
/// and return the 0-based depth it names once the index itself is popped.
fn element_depth(stack: &OperandStack) -> Result<usize> {
    let k = stack.peek(0)?.integer_part();
    if k < 1 {
        bail!(VmError::InvalidIndex {
            kind: IndexKind::StackDepth,
            index: k,
        });
    }
    let below = stack.len() - 1;
    if k as u64 > below as u64 {
        bail!(VmError::StackUnderflow {
            needed: (k as usize).saturating_add(1),
            available: stack.len(),
        });
    }
    Ok(k as usize - 1)
}
