//! TrueType instruction encoding.

mod decoder;
mod instruction;
mod opcode;

pub use decoder::{Decoder, decode, disassemble, encode};
pub use instruction::{
    ArithOp, ControlOp, Instruction, MAX_INLINE_PUSH, NPUSHB, NPUSHW, PUSHB_BASE, PUSHW_BASE, PushForm,
    PushOp, PushWidth, StackOp, StorageOp,
};
pub use opcode::{OpcodeClass, classify, supported_opcode_count};
