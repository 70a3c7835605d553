//! Error types for parity-probe

use thiserror::Error;

/// parity-probe errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Pipeline errors
    /// Pipeline description referenced a pass name that is not registered
    #[error("Unknown pass: {name}")]
    UnknownPass {
        /// Pass name as written in the pipeline description
        name: String,
    },

    /// Pipeline description contained no pass names
    #[error("Empty pass pipeline")]
    EmptyPipeline,

    // Module errors
    /// Reference to a function the module does not define
    #[error("Unknown function: {name}")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    // Interpreter errors
    /// Call to a symbol that is neither defined nor an intercepted runtime entry
    #[error("Call to undefined function: {name}")]
    UndefinedCallee {
        /// Callee symbol name
        name: String,
    },

    /// Memory access outside the mapped global/stack regions
    #[error("Memory access out of bounds: address 0x{address:x} ({width} bytes)")]
    MemoryFault {
        /// Faulting address
        address: u64,
        /// Access width in bytes
        width: usize,
    },

    /// Use of a value that was never assigned in the current frame
    #[error("Use of unassigned value %{0}")]
    UnassignedValue(u32),

    /// Execution step budget exhausted
    #[error("Execution limit exceeded (max: {limit} steps)")]
    StepLimitExceeded {
        /// Maximum allowed steps
        limit: usize,
    },

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }
}

/// Result type for parity-probe operations
pub type Result<T> = std::result::Result<T, Error>;
