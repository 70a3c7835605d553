//! # parity-probe - Address-Parity Instrumentation for IR Modules
//!
//! [![License: MIT](https://img.shields.io/badge/License-MIT-yellow.svg)](https://opensource.org/licenses/MIT)
//!
//! A module rewriting engine: it walks a unit of code (a module of functions,
//! basic blocks, and instructions), locates every memory access, and
//! mechanically rewrites the control-flow graph around each one to emit a
//! runtime diagnostic conditioned on the parity of the accessed address.
//!
//! ## Features
//!
//! - **Self-contained IR** - modules, functions, block arenas with stable
//!   handles, and a CFG-preserving block split
//! - **The `parity-trace` pass** - get-or-create declaration injection,
//!   in-order access enumeration, block splitting, and two-way branch
//!   synthesis, exposed as a plain `instrument(&mut Module) -> bool`
//! - **Pass pipeline** - named passes, a registry, and comma-separated
//!   pipeline parsing for embedders
//! - **Interpreter** - deterministic execution with captured diagnostic
//!   output, so instrumented behavior is observable in tests
//!
//! ## Quick Start
//!
//! ```rust
//! use parity_probe::ir::{FunctionBuilder, GlobalInit, Module, Operand, Ty};
//! use parity_probe::{instrument, Machine};
//!
//! # fn main() -> parity_probe::Result<()> {
//! // A function with a single store to a global.
//! let mut module = Module::new("demo");
//! module.get_or_insert_global("g", GlobalInit::Int { ty: Ty::I32, value: 0 });
//! let mut b = FunctionBuilder::new("main");
//! b.store(Ty::I32, Operand::const_i32(7), Operand::global("g"));
//! b.ret(None);
//! module.add_function(b.build());
//!
//! // Inject the parity diagnostics.
//! assert!(instrument(&mut module));
//!
//! // Run it and observe one diagnostic line per access.
//! let mut machine = Machine::new(&module);
//! machine.run("main")?;
//! assert_eq!(
//!     machine.lines(),
//!     vec!["In function main, store in address 0x1000, it is Even"]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Module → collect accesses → inject printf + template → split blocks →
//!   even/odd arms with diagnostic calls → rejoined CFG
//! ```
//!
//! ### Main Components
//!
//! - [`ir::Module`] / [`ir::Function`] / [`ir::BasicBlock`] - the unit of
//!   code being transformed
//! - [`ir::FunctionBuilder`] - positioned IR construction
//! - [`instrument`] - the instrumentation engine
//! - [`PassManager`] / [`PassRegistry`] - pipeline assembly by pass name
//! - [`Machine`] - interpreter capturing diagnostic output
//!
//! ## Diagnostic Contract
//!
//! Each executed memory access produces one line rendered from the template
//! `"In function %s, %s in address %p, it is %s\n"`: the enclosing function
//! name, the opcode label (`load`/`store`), the address, and `Even`/`Odd`
//! by the low bit of the address.
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

/// Version of the parity-probe library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod interp;
pub mod ir;
pub mod pass;

// Re-export main types
pub use error::{Error, Result};
pub use interp::Machine;
pub use ir::{dump_function, dump_module};
pub use pass::{
    instrument, instrument_with_stats, FunctionSites, InstrumentationStats, ModulePass,
    ParityTracePass, PassManager, PassOutcome, PassRegistry,
};
