use anyhow::Result;

use crate::bytecode::StorageOp;
use crate::error::IndexKind;
use crate::value::{ControlValueTable, OperandStack, StorageArea, Value};

impl StorageOp {
    /// Operands are validated before anything is popped, so a rejected
    /// location or index leaves the stack unchanged.
    pub fn apply(self, stack: &mut OperandStack, storage: &mut StorageArea, cvt: &mut ControlValueTable) -> Result<()> {
        match self {
            StorageOp::Ws => {
                stack.require(2)?;
                let value = stack.peek(0)?;
                let location = stack.peek(1)?.to_location()?;
                stack.pop2()?;
                storage.write(location, value);
                Ok(())
            }
            StorageOp::Rs => {
                let location = stack.peek(0)?.to_location()?;
                let value = storage.read(location)?;
                stack.replace_top(value)
            }
            StorageOp::Wcvtp | StorageOp::Wcvtf => {
                stack.require(2)?;
                let value = match self {
                    // font units are whole numbers
                    StorageOp::Wcvtf => Value::Int(stack.peek(0)?.integer_part()),
                    _ => stack.peek(0)?,
                };
                let index = stack.peek(1)?.to_index(IndexKind::ControlValue)?;
                cvt.set(index, value)?;
                stack.pop2()?;
                Ok(())
            }
            StorageOp::Rcvt => {
                let index = stack.peek(0)?.to_index(IndexKind::ControlValue)?;
                let value = cvt.get(index)?;
                stack.replace_top(value)
            }
        }
    }
}
