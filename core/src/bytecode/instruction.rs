//! Decoded instruction families.
//!
//! An [`Instruction`] is an immutable description of one operation. Push
//! instructions carry their literal operands; every other family is a bare
//! opcode whose operands come from the stack at run time.

use std::fmt;

use anyhow::{Result, bail};

use crate::error::VmError;

/// Declares a fixed single-byte opcode family with its table of
/// (variant, opcode, mnemonic) rows.
macro_rules! opcode_family {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal => $mnemonic:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            #[inline]
            pub const fn opcode(self) -> u8 {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            #[inline]
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $($name::$variant => $mnemonic,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.mnemonic())
            }
        }
    };
}

opcode_family! {
    /// Pure operand-stack manipulation.
    StackOp {
        Dup = 0x20 => "DUP",
        Pop = 0x21 => "POP",
        Clear = 0x22 => "CLEAR",
        Swap = 0x23 => "SWAP",
        Depth = 0x24 => "DEPTH",
        CIndex = 0x25 => "CINDEX",
        MIndex = 0x26 => "MINDEX",
        Roll = 0x8A => "ROLL",
    }
}

opcode_family! {
    /// Comparison, logic and 26.6-aware arithmetic.
    ArithOp {
        Lt = 0x50 => "LT",
        LtEq = 0x51 => "LTEQ",
        Gt = 0x52 => "GT",
        GtEq = 0x53 => "GTEQ",
        Eq = 0x54 => "EQ",
        Neq = 0x55 => "NEQ",
        And = 0x5A => "AND",
        Or = 0x5B => "OR",
        Not = 0x5C => "NOT",
        Add = 0x60 => "ADD",
        Sub = 0x61 => "SUB",
        Div = 0x62 => "DIV",
        Mul = 0x63 => "MUL",
        Abs = 0x64 => "ABS",
        Neg = 0x65 => "NEG",
        Floor = 0x66 => "FLOOR",
        Ceiling = 0x67 => "CEILING",
        Max = 0x8B => "MAX",
        Min = 0x8C => "MIN",
    }
}

opcode_family! {
    /// Storage area and control value table access.
    StorageOp {
        Ws = 0x42 => "WS",
        Rs = 0x43 => "RS",
        Wcvtp = 0x44 => "WCVTP",
        Rcvt = 0x45 => "RCVT",
        Wcvtf = 0x70 => "WCVTF",
    }
}

opcode_family! {
    /// Function definition, calls and conditionals.
    ControlOp {
        Else = 0x1B => "ELSE",
        LoopCall = 0x2A => "LOOPCALL",
        Call = 0x2B => "CALL",
        Fdef = 0x2C => "FDEF",
        Endf = 0x2D => "ENDF",
        If = 0x58 => "IF",
        Eif = 0x59 => "EIF",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushWidth {
    /// Unsigned 8-bit literals.
    Bytes,
    /// Big-endian signed 16-bit literals.
    Words,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushForm {
    /// NPUSHB/NPUSHW: the byte after the opcode holds the count.
    Prefixed,
    /// PUSHB[n]/PUSHW[n]: the count is encoded in the opcode's low three bits.
    Inline,
}

pub const NPUSHB: u8 = 0x40;
pub const NPUSHW: u8 = 0x41;
pub const PUSHB_BASE: u8 = 0xB0;
pub const PUSHW_BASE: u8 = 0xB8;
/// Largest literal count an inline push can carry.
pub const MAX_INLINE_PUSH: usize = 8;

/// Literal push with its decoded operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PushOp {
    pub width: PushWidth,
    pub form: PushForm,
    pub values: Vec<i32>,
}

impl PushOp {
    /// Byte push using the shortest form for `values`.
    pub fn bytes(values: impl IntoIterator<Item = u8>) -> Self {
        let values: Vec<i32> = values.into_iter().map(i32::from).collect();
        Self::shortest(PushWidth::Bytes, values)
    }

    /// Word push using the shortest form for `values`.
    pub fn words(values: impl IntoIterator<Item = i16>) -> Self {
        let values: Vec<i32> = values.into_iter().map(i32::from).collect();
        Self::shortest(PushWidth::Words, values)
    }

    fn shortest(width: PushWidth, values: Vec<i32>) -> Self {
        let form = if (1..=MAX_INLINE_PUSH).contains(&values.len()) {
            PushForm::Inline
        } else {
            PushForm::Prefixed
        };
        Self { width, form, values }
    }

    /// Opcode byte for this push, validating the literal count for its form.
    pub fn opcode(&self) -> Result<u8> {
        let count = self.values.len();
        match self.form {
            PushForm::Prefixed => {
                if count > u8::MAX as usize {
                    bail!(VmError::malformed(0, format!("{} cannot carry {count} literals", self.mnemonic())));
                }
                Ok(match self.width {
                    PushWidth::Bytes => NPUSHB,
                    PushWidth::Words => NPUSHW,
                })
            }
            PushForm::Inline => {
                if !(1..=MAX_INLINE_PUSH).contains(&count) {
                    bail!(VmError::malformed(0, format!("{} cannot carry {count} literals", self.mnemonic())));
                }
                let base = match self.width {
                    PushWidth::Bytes => PUSHB_BASE,
                    PushWidth::Words => PUSHW_BASE,
                };
                Ok(base + (count - 1) as u8)
            }
        }
    }

    pub const fn mnemonic(&self) -> &'static str {
        match (self.form, self.width) {
            (PushForm::Prefixed, PushWidth::Bytes) => "NPUSHB",
            (PushForm::Prefixed, PushWidth::Words) => "NPUSHW",
            (PushForm::Inline, PushWidth::Bytes) => "PUSHB",
            (PushForm::Inline, PushWidth::Words) => "PUSHW",
        }
    }
}

impl fmt::Display for PushOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.form {
            PushForm::Prefixed => write!(f, "{}", self.mnemonic())?,
            PushForm::Inline => write!(f, "{}[{}]", self.mnemonic(), self.values.len())?,
        }
        for v in &self.values {
            write!(f, " {v}")?;
        }
        Ok(())
    }
}

/// One decoded hinting instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    Push(PushOp),
    Stack(StackOp),
    Arith(ArithOp),
    Storage(StorageOp),
    Control(ControlOp),
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push(p) => p.mnemonic(),
            Instruction::Stack(op) => op.mnemonic(),
            Instruction::Arith(op) => op.mnemonic(),
            Instruction::Storage(op) => op.mnemonic(),
            Instruction::Control(op) => op.mnemonic(),
        }
    }

    #[inline]
    pub fn is_control(&self, op: ControlOp) -> bool {
        matches!(self, Instruction::Control(c) if *c == op)
    }
}

impl From<StackOp> for Instruction {
    fn from(op: StackOp) -> Self {
        Instruction::Stack(op)
    }
}

impl From<ArithOp> for Instruction {
    fn from(op: ArithOp) -> Self {
        Instruction::Arith(op)
    }
}

impl From<StorageOp> for Instruction {
    fn from(op: StorageOp) -> Self {
        Instruction::Storage(op)
    }
}

impl From<ControlOp> for Instruction {
    fn from(op: ControlOp) -> Self {
        Instruction::Control(op)
    }
}

impl From<PushOp> for Instruction {
    fn from(op: PushOp) -> Self {
        Instruction::Push(op)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(p) => p.fmt(f),
            Instruction::Stack(op) => op.fmt(f),
            Instruction::Arith(op) => op.fmt(f),
            Instruction::Storage(op) => op.fmt(f),
            Instruction::Control(op) => op.fmt(f),
        }
    }
}
