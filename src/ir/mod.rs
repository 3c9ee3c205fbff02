//! Typed intermediate representation
//!
//! Functions are sequences of basic blocks over virtual registers in
//! SSA-like form; variables live in explicit stack slots. The module is
//! the unit handed to a backend for final emission.

pub mod builder;
pub mod instr;
pub mod lower;
pub mod print;
pub mod types;

pub use builder::IrBuilder;
pub use instr::{CmpOp, Instr, InstrKind, Terminator};
pub use lower::{lower, LowerError, Mode};
pub use print::print_module;
pub use types::{BasicBlock, BlockId, ExternalFn, Function, Global, IrType, Module, VReg};
