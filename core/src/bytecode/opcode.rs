//! Static opcode table shared by the decoder and the disassembler.

use once_cell::sync::Lazy;

use super::instruction::{
    ArithOp, ControlOp, NPUSHB, NPUSHW, PUSHB_BASE, PUSHW_BASE, PushWidth, StackOp, StorageOp,
};

/// Decoding class of an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeClass {
    Stack(StackOp),
    Arith(ArithOp),
    Storage(StorageOp),
    Control(ControlOp),
    /// NPUSHB/NPUSHW; count follows the opcode.
    PrefixedPush(PushWidth),
    /// PUSHB[n]/PUSHW[n] with `count` literals.
    InlinePush(PushWidth, u8),
}

static OPCODE_TABLE: Lazy<[Option<OpcodeClass>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    for &op in StackOp::ALL {
        table[op.opcode() as usize] = Some(OpcodeClass::Stack(op));
    }
    for &op in ArithOp::ALL {
        table[op.opcode() as usize] = Some(OpcodeClass::Arith(op));
    }
    for &op in StorageOp::ALL {
        table[op.opcode() as usize] = Some(OpcodeClass::Storage(op));
    }
    for &op in ControlOp::ALL {
        table[op.opcode() as usize] = Some(OpcodeClass::Control(op));
    }
    table[NPUSHB as usize] = Some(OpcodeClass::PrefixedPush(PushWidth::Bytes));
    table[NPUSHW as usize] = Some(OpcodeClass::PrefixedPush(PushWidth::Words));
    for n in 0..8u8 {
        table[(PUSHB_BASE + n) as usize] = Some(OpcodeClass::InlinePush(PushWidth::Bytes, n + 1));
        table[(PUSHW_BASE + n) as usize] = Some(OpcodeClass::InlinePush(PushWidth::Words, n + 1));
    }
    table
});

#[inline]
pub fn classify(byte: u8) -> Option<OpcodeClass> {
    OPCODE_TABLE[byte as usize]
}

/// Number of opcode bytes the VM understands.
pub fn supported_opcode_count() -> usize {
    OPCODE_TABLE.iter().filter(|c| c.is_some()).count()
}
