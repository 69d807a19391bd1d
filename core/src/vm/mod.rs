//! Hinting VM runtime
//!
//! Dispatch, function capture and lazy resolution live in `machine`; the
//! per-family instruction semantics live in `ops`.

mod functions;
mod machine;
mod ops;

pub use functions::FunctionTable;
pub use machine::{VirtualMachine, VmSnapshot};
