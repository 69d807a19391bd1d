//! Byte stream <-> instruction sequence.
//!
//! Decoding is purely syntactic: CALL targets are not followed and literals
//! are kept as raw integers.

use anyhow::{Result, bail};

use super::instruction::{Instruction, PushForm, PushOp, PushWidth};
use super::opcode::{OpcodeClass, classify};
use crate::error::VmError;

/// Cursor over one hinting program.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pc: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pc: 0 }
    }

    /// Offset of the next opcode byte.
    #[inline]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Decode the instruction at the cursor, or `None` at end of stream.
    pub fn next_instruction(&mut self) -> Result<Option<Instruction>> {
        let start = self.pc;
        let Some(&byte) = self.bytes.get(start) else {
            return Ok(None);
        };
        self.pc += 1;
        let ins = match classify(byte) {
            Some(OpcodeClass::Stack(op)) => Instruction::Stack(op),
            Some(OpcodeClass::Arith(op)) => Instruction::Arith(op),
            Some(OpcodeClass::Storage(op)) => Instruction::Storage(op),
            Some(OpcodeClass::Control(op)) => Instruction::Control(op),
            Some(OpcodeClass::PrefixedPush(width)) => {
                let count = self.read_u8(start, "missing literal count")? as usize;
                Instruction::Push(self.read_push(start, width, PushForm::Prefixed, count)?)
            }
            Some(OpcodeClass::InlinePush(width, count)) => {
                Instruction::Push(self.read_push(start, width, PushForm::Inline, count as usize)?)
            }
            None => bail!(VmError::malformed(start, format!("unrecognized opcode 0x{byte:02X}"))),
        };
        Ok(Some(ins))
    }

    fn read_u8(&mut self, start: usize, what: &str) -> Result<u8> {
        match self.bytes.get(self.pc) {
            Some(&b) => {
                self.pc += 1;
                Ok(b)
            }
            None => bail!(VmError::malformed(start, what)),
        }
    }

    fn read_push(&mut self, start: usize, width: PushWidth, form: PushForm, count: usize) -> Result<PushOp> {
        let size = match width {
            PushWidth::Bytes => count,
            PushWidth::Words => count * 2,
        };
        let end = self.pc + size;
        if end > self.bytes.len() {
            bail!(VmError::malformed(
                start,
                format!(
                    "push of {count} literal(s) needs {size} byte(s), {} left",
                    self.bytes.len() - self.pc
                ),
            ));
        }
        let raw = &self.bytes[self.pc..end];
        let values = match width {
            PushWidth::Bytes => raw.iter().map(|&b| b as i32).collect(),
            PushWidth::Words => raw
                .chunks_exact(2)
                .map(|w| i16::from_be_bytes([w[0], w[1]]) as i32)
                .collect(),
        };
        self.pc = end;
        Ok(PushOp { width, form, values })
    }
}

/// Decode a whole program. Fails without a partial result on the first
/// malformed instruction.
pub fn decode(bytes: &[u8]) -> Result<Vec<Instruction>> {
    let mut decoder = Decoder::new(bytes);
    let mut out = Vec::with_capacity(bytes.len());
    while let Some(ins) = decoder.next_instruction()? {
        out.push(ins);
    }
    Ok(out)
}

/// Serialize instructions back to bytecode. A literal that does not fit the
/// push width is rejected rather than truncated.
pub fn encode(instructions: &[Instruction]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(instructions.len());
    for ins in instructions {
        match ins {
            Instruction::Push(push) => {
                let offset = out.len();
                out.push(push.opcode()?);
                if push.form == PushForm::Prefixed {
                    out.push(push.values.len() as u8);
                }
                for &v in &push.values {
                    match push.width {
                        PushWidth::Bytes => match u8::try_from(v) {
                            Ok(b) => out.push(b),
                            Err(_) => bail!(literal_out_of_range(offset, push, v)),
                        },
                        PushWidth::Words => match i16::try_from(v) {
                            Ok(w) => out.extend_from_slice(&w.to_be_bytes()),
                            Err(_) => bail!(literal_out_of_range(offset, push, v)),
                        },
                    }
                }
            }
            Instruction::Stack(op) => out.push(op.opcode()),
            Instruction::Arith(op) => out.push(op.opcode()),
            Instruction::Storage(op) => out.push(op.opcode()),
            Instruction::Control(op) => out.push(op.opcode()),
        }
    }
    Ok(out)
}

fn literal_out_of_range(offset: usize, push: &PushOp, value: i32) -> VmError {
    VmError::malformed(offset, format!("literal {value} does not fit {}", push.mnemonic()))
}

/// One mnemonic per line, prefixed with the byte offset.
pub fn disassemble(bytes: &[u8]) -> Result<String> {
    let mut decoder = Decoder::new(bytes);
    let mut out = String::new();
    loop {
        let offset = decoder.pc();
        match decoder.next_instruction()? {
            Some(ins) => out.push_str(&format!("{offset:04}: {ins}\n")),
            None => break,
        }
    }
    Ok(out)
}
