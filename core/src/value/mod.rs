//! Runtime data of the hinting VM: numeric cells, the operand stack and the
//! two register files (storage area and control value table).

mod stack;
mod storage;
#[allow(clippy::module_inception)]
mod value;

pub use stack::OperandStack;
pub use storage::{ControlValueTable, StorageArea};
pub use value::{Operands, Value};
