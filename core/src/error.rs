use std::fmt;

/// Execution state of the VM when an opcode was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Normal,
    Capturing(u32),
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmState::Normal => write!(f, "normal"),
            VmState::Capturing(id) => write!(f, "capturing function {id}"),
        }
    }
}

/// What an index-like operand was addressing when it was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    StackDepth,
    Storage,
    ControlValue,
    Function,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::StackDepth => "stack depth",
            IndexKind::Storage => "storage location",
            IndexKind::ControlValue => "control value index",
            IndexKind::Function => "function id",
        };
        f.write_str(name)
    }
}

/// Failure kinds raised while decoding or executing hinting programs.
///
/// Errors travel as `anyhow::Error`; use `downcast_ref::<VmError>()` to
/// recover the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Truncated push instruction or unknown opcode.
    MalformedProgram { offset: usize, reason: String },
    StackUnderflow { needed: usize, available: usize },
    StackOverflow { limit: usize },
    UnresolvedFunction(u32),
    UninitializedStorage(u64),
    IllegalStateTransition { opcode: &'static str, state: VmState },
    UnterminatedFunction(u32),
    UnbalancedConditional,
    InvalidIndex { kind: IndexKind, index: i64 },
    DivisionByZero,
    StepLimitExceeded { limit: u64 },
    CallDepthExceeded { limit: usize },
}

impl VmError {
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        VmError::MalformedProgram {
            offset,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::MalformedProgram { offset, reason } => {
                write!(f, "malformed program at byte {offset}: {reason}")
            }
            VmError::StackUnderflow { needed, available } => {
                write!(f, "stack underflow: needed {needed} operand(s), {available} available")
            }
            VmError::StackOverflow { limit } => write!(f, "stack overflow: depth limit {limit} reached"),
            VmError::UnresolvedFunction(id) => write!(f, "call to undefined function {id}"),
            VmError::UninitializedStorage(loc) => write!(f, "read of uninitialized storage location {loc}"),
            VmError::IllegalStateTransition { opcode, state } => {
                write!(f, "{opcode} is not allowed while {state}")
            }
            VmError::UnterminatedFunction(id) => write!(f, "function {id} is missing its ENDF"),
            VmError::UnbalancedConditional => write!(f, "IF without matching EIF"),
            VmError::InvalidIndex { kind, index } => write!(f, "invalid {kind}: {index}"),
            VmError::DivisionByZero => write!(f, "division by zero"),
            VmError::StepLimitExceeded { limit } => write!(f, "instruction budget of {limit} steps exhausted"),
            VmError::CallDepthExceeded { limit } => write!(f, "call depth limit {limit} exceeded"),
        }
    }
}

impl std::error::Error for VmError {}
