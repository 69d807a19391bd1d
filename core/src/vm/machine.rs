//! The hinting virtual machine.
//!
//! One instance is one hinting session for one font:
//! create -> `prime` (runs `prep`) -> `execute` any number of glyph programs
//! -> drop. The operand stack, storage area, control value table and
//! function table all persist across `execute` calls. Instances are not
//! shareable across threads; use one per thread over a shared
//! [`FontContext`].

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::functions::FunctionTable;
use crate::bytecode::{ControlOp, Instruction, decode};
use crate::config::VmConfig;
use crate::error::{IndexKind, VmError, VmState};
use crate::font::FontContext;
use crate::value::{ControlValueTable, OperandStack, StorageArea, Value};

/// Function body being recorded between FDEF and ENDF.
#[derive(Debug)]
struct Capture {
    id: u32,
    body: Vec<Instruction>,
}

pub struct VirtualMachine {
    config: VmConfig,
    stack: OperandStack,
    storage: StorageArea,
    cvt: ControlValueTable,
    functions: FunctionTable,
    font: Option<Arc<dyn FontContext>>,
    capture: Option<Capture>,
    /// Decoded `fpgm`, kept for reruns.
    font_program: Option<Arc<[Instruction]>>,
    font_program_loaded: bool,
    in_font_program: bool,
    primed: bool,
    call_depth: usize,
    steps: u64,
}

/// Serializable copy of the VM's observable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSnapshot {
    /// Bottom to top.
    pub stack: Vec<Value>,
    pub storage: Vec<(u64, Value)>,
    pub control_values: Vec<Value>,
    pub functions: Vec<u32>,
}

impl VmSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl VirtualMachine {
    /// A VM without a font; CALL can only reach functions defined by the
    /// programs it executes.
    pub fn new(config: VmConfig) -> Self {
        Self {
            stack: OperandStack::new(config.max_stack_depth),
            storage: StorageArea::new(),
            cvt: ControlValueTable::default(),
            functions: FunctionTable::new(),
            font: None,
            capture: None,
            font_program: None,
            font_program_loaded: false,
            in_font_program: false,
            primed: false,
            call_depth: 0,
            steps: 0,
            config,
        }
    }

    pub fn with_font(config: VmConfig, font: Arc<dyn FontContext>) -> Self {
        let mut vm = Self::new(config);
        vm.cvt = ControlValueTable::from_funits(font.control_values());
        vm.font = Some(font);
        vm
    }

    /// Run the font's control value program once. Later calls are no-ops.
    pub fn prime(&mut self) -> Result<()> {
        if self.primed {
            return Ok(());
        }
        self.primed = true;
        let Some(font) = self.font.clone() else {
            return Ok(());
        };
        let Some(prep) = font.control_value_program() else {
            debug!(target: "hintvm::session", "font has no prep program");
            return Ok(());
        };
        let program = decode(prep).context("failed to decode prep")?;
        debug!(target: "hintvm::session", instructions = program.len(), "running prep");
        self.steps = 0;
        self.run_program(&program).context("prep program failed")
    }

    /// Run the font program now instead of on the first unresolved CALL.
    /// A no-op once it has run; later misses still rerun it.
    pub fn load_font_program(&mut self) -> Result<()> {
        if self.font_program_loaded {
            return Ok(());
        }
        self.steps = 0;
        self.run_font_program()
    }

    /// Decode and run a program against the current state.
    pub fn execute_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let program = decode(bytes)?;
        self.execute(&program)
    }

    /// Run `program` against the current stack, storage and function table.
    pub fn execute(&mut self, program: &[Instruction]) -> Result<()> {
        self.steps = 0;
        self.run_program(program)
    }

    #[inline]
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    #[inline]
    pub fn stack_mut(&mut self) -> &mut OperandStack {
        &mut self.stack
    }

    #[inline]
    pub fn storage(&self) -> &StorageArea {
        &self.storage
    }

    pub fn storage_value(&self, location: u64) -> Option<Value> {
        self.storage.get(location)
    }

    pub fn set_storage_value(&mut self, location: u64, value: impl Into<Value>) {
        self.storage.write(location, value.into());
    }

    #[inline]
    pub fn control_values(&self) -> &ControlValueTable {
        &self.cvt
    }

    #[inline]
    pub fn control_values_mut(&mut self) -> &mut ControlValueTable {
        &mut self.cvt
    }

    #[inline]
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    #[inline]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    #[inline]
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    #[inline]
    pub fn font_program_loaded(&self) -> bool {
        self.font_program_loaded
    }

    /// Instructions fetched plus function iterations entered by the most
    /// recent top-level run.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn snapshot(&self) -> VmSnapshot {
        VmSnapshot {
            stack: self.stack.as_slice().to_vec(),
            storage: self.storage.entries(),
            control_values: self.cvt.as_slice().to_vec(),
            functions: self.functions.ids(),
        }
    }

    fn state(&self) -> VmState {
        match &self.capture {
            Some(c) => VmState::Capturing(c.id),
            None => VmState::Normal,
        }
    }

    /// Run a complete program; it must not end inside a function definition.
    /// Any error drops a pending capture so the VM is back in NORMAL.
    fn run_program(&mut self, program: &[Instruction]) -> Result<()> {
        let result = self.run(program);
        let pending = self.capture.take();
        result?;
        if let Some(capture) = pending {
            bail!(VmError::UnterminatedFunction(capture.id));
        }
        Ok(())
    }

    fn run(&mut self, program: &[Instruction]) -> Result<()> {
        let mut pc = 0;
        while let Some(ins) = program.get(pc) {
            pc += 1;
            self.tick()?;

            if self.capture.is_some() {
                self.record(ins)?;
                continue;
            }

            trace!(target: "hintvm::exec", pc = pc - 1, op = %ins, depth = self.stack.len());
            let step = match ins {
                Instruction::Push(push) => self
                    .stack
                    .extend(push.values.iter().map(|&v| Value::Int(v as i64))),
                Instruction::Stack(op) => op.apply(&mut self.stack),
                Instruction::Arith(op) => op.apply(&mut self.stack),
                Instruction::Storage(op) => op.apply(&mut self.stack, &mut self.storage, &mut self.cvt),
                Instruction::Control(op) => self.control(*op, program, pc).map(|next| pc = next),
            };
            step.with_context(|| format!("{} at instruction {}", ins.mnemonic(), pc - 1))?;
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        match self.config.max_steps {
            Some(limit) if self.steps > limit => bail!(VmError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    /// CAPTURING: everything but ENDF is appended to the body unexecuted.
    fn record(&mut self, ins: &Instruction) -> Result<()> {
        match ins {
            Instruction::Control(ControlOp::Endf) => self.end_function(),
            Instruction::Control(ControlOp::Fdef) => bail!(VmError::IllegalStateTransition {
                opcode: "FDEF",
                state: self.state(),
            }),
            _ => {
                if let Some(capture) = self.capture.as_mut() {
                    capture.body.push(ins.clone());
                }
            }
        }
        Ok(())
    }

    /// Execute a control instruction fetched from `program`; `pc` already
    /// points past it. Returns the next pc.
    fn control(&mut self, op: ControlOp, program: &[Instruction], pc: usize) -> Result<usize> {
        match op {
            ControlOp::Fdef => {
                let id = self.stack.peek(0)?.to_index(IndexKind::Function)?;
                self.stack.pop()?;
                self.capture = Some(Capture { id, body: Vec::new() });
                Ok(pc)
            }
            ControlOp::Endf => bail!(VmError::IllegalStateTransition {
                opcode: "ENDF",
                state: self.state(),
            }),
            ControlOp::Call => {
                let id = self.stack.peek(0)?.to_index(IndexKind::Function)?;
                self.stack.pop()?;
                self.call(id, 1)?;
                Ok(pc)
            }
            ControlOp::LoopCall => {
                self.stack.require(2)?;
                let id = self.stack.peek(0)?.to_index(IndexKind::Function)?;
                let count = self.stack.peek(1)?.integer_part();
                self.stack.pop2()?;
                if count > 0 {
                    self.call(id, count)?;
                }
                Ok(pc)
            }
            ControlOp::If => {
                let condition = self.stack.pop()?;
                if condition.is_true() {
                    Ok(pc)
                } else {
                    skip_conditional(program, pc, true)
                }
            }
            // only reached at the end of a taken IF branch
            ControlOp::Else => skip_conditional(program, pc, false),
            ControlOp::Eif => Ok(pc),
        }
    }

    fn end_function(&mut self) {
        let Some(Capture { id, body }) = self.capture.take() else {
            return;
        };
        let len = body.len();
        if self.functions.define(id, body) {
            debug!(target: "hintvm::functions", id, instructions = len, "function defined");
        } else {
            warn!(target: "hintvm::functions", id, "function already defined; keeping first definition");
        }
    }

    /// Run function `id` `count` times against the caller's stack and storage.
    fn call(&mut self, id: u32, count: i64) -> Result<()> {
        let body = self.resolve(id)?;
        if self.call_depth >= self.config.max_call_depth {
            bail!(VmError::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        self.call_depth += 1;
        let result = (0..count).try_for_each(|_| {
            self.tick()?;
            self.run(&body)
        });
        self.call_depth -= 1;
        result.with_context(|| format!("in function {id}"))
    }

    /// Look `id` up, running the font program on a miss. FDEF ids come off
    /// the stack, so each rerun may define functions the last one did not.
    fn resolve(&mut self, id: u32) -> Result<Arc<[Instruction]>> {
        if let Some(body) = self.functions.get(id) {
            return Ok(body);
        }
        if !self.in_font_program {
            debug!(target: "hintvm::functions", id, "resolving function from font program");
            self.run_font_program()?;
        }
        match self.functions.get(id) {
            Some(body) => Ok(body),
            None => bail!(VmError::UnresolvedFunction(id)),
        }
    }

    /// Run the whole font program; every FDEF in it lands in the function
    /// table, not just the one that triggered the run. Existing ids keep
    /// their first body.
    fn run_font_program(&mut self) -> Result<()> {
        let Some(program) = self.decoded_font_program()? else {
            return Ok(());
        };
        self.font_program_loaded = true;
        debug!(target: "hintvm::session", instructions = program.len(), "running font program");
        self.in_font_program = true;
        let result = self.run_program(&program);
        self.in_font_program = false;
        result.context("font program failed")?;
        debug!(target: "hintvm::session", functions = self.functions.len(), "font program done");
        Ok(())
    }

    fn decoded_font_program(&mut self) -> Result<Option<Arc<[Instruction]>>> {
        if let Some(program) = &self.font_program {
            return Ok(Some(Arc::clone(program)));
        }
        let Some(fpgm) = self.font.as_ref().and_then(|font| font.font_program()) else {
            return Ok(None);
        };
        let program: Arc<[Instruction]> = decode(fpgm).context("failed to decode fpgm")?.into();
        self.font_program = Some(Arc::clone(&program));
        Ok(Some(program))
    }
}

/// Find where execution resumes when skipping from just after an IF (or a
/// taken branch's ELSE) at `from`. With `stop_at_else`, a same-level ELSE
/// ends the skip; otherwise only the matching EIF does.
fn skip_conditional(program: &[Instruction], from: usize, stop_at_else: bool) -> Result<usize> {
    let mut nesting = 1usize;
    for (offset, ins) in program[from..].iter().enumerate() {
        match ins {
            Instruction::Control(ControlOp::If) => nesting += 1,
            Instruction::Control(ControlOp::Else) if nesting == 1 && stop_at_else => {
                return Ok(from + offset + 1);
            }
            Instruction::Control(ControlOp::Eif) => {
                nesting -= 1;
                if nesting == 0 {
                    return Ok(from + offset + 1);
                }
            }
            _ => {}
        }
    }
    bail!(VmError::UnbalancedConditional)
}
