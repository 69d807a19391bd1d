//! Execution semantics of the stack, arithmetic and storage families.
//!
//! Each family gets an inherent `apply`; control flow needs the whole VM
//! and lives in `machine.rs`.

mod arith;
mod stack;
mod storage;
