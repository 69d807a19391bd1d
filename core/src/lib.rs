//! TrueType/OpenType hinting instruction VM.
//!
//! Decodes `fpgm`, `prep` and glyph instruction streams and executes them on
//! an operand stack with a persistent storage area and a lazily built
//! function table. Rendering is out of scope: callers inspect the resulting
//! stack and register state.

pub mod bytecode;
pub mod config;
pub mod error;
pub mod font;
pub mod util;
pub mod value;
pub mod vm;

pub use bytecode::{Instruction, decode, encode};
pub use config::VmConfig;
pub use error::VmError;
pub use font::{FontContext, FontTables};
pub use value::Value;
pub use vm::{VirtualMachine, VmSnapshot};
