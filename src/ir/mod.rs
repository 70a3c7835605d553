//! # Intermediate Representation
//!
//! The unit of code the instrumentation engine rewrites: a [`Module`] owning
//! global variables, external declarations, and [`Function`] definitions made
//! of [`BasicBlock`]s of straight-line [`Instruction`]s, each block ending in
//! exactly one [`Terminator`].
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs          # This file - module definition and re-exports
//! ├── instruction.rs  # Ty, ValueId, BlockId, Operand, Instruction, Terminator
//! ├── module.rs       # BasicBlock, Function, GlobalVar, FuncDecl, Module
//! ├── builder.rs      # FunctionBuilder - positioned instruction emission
//! └── dump.rs         # Textual IR listing
//! ```
//!
//! ## Key Types
//!
//! - [`ValueId`] - virtual value handle (per-function supply)
//! - [`BlockId`] - stable block handle; layout order is tracked separately so
//!   blocks can be inserted mid-function without invalidating handles
//! - [`Module`] - get-or-create tables for declarations, globals, and
//!   interned string literals
//! - [`Function::split_block`] - the canonical CFG-preserving block split

mod builder;
mod dump;
mod instruction;
mod module;

pub use builder::FunctionBuilder;
pub use dump::{dump_function, dump_module};
pub use instruction::{BlockId, Instruction, Operand, Terminator, Ty, ValueId};
pub use module::{BasicBlock, FuncDecl, Function, GlobalInit, GlobalVar, Module, ParamAttrs};
