//! Error types for the compilation crate.

use thiserror::Error;

use alsvid_ir::IrError;

/// Errors that can occur during transpilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// No connectivity graph was supplied.
    #[error("no connectivity graph supplied to the pipeline")]
    MissingConnectivity,

    /// A routing pass ran before any placement pass produced a layout.
    #[error("routing pass '{0}' requires a placement pass to run first")]
    MissingPlacer(&'static str),

    /// Circuit needs more physical qubits than the device has.
    #[error("circuit requires {required} qubits but the device has {available}")]
    CircuitTooLarge {
        /// Qubits required by the circuit.
        required: u32,
        /// Physical qubits available.
        available: u32,
    },

    /// A user-supplied placement is not a valid layout for the circuit.
    #[error("invalid placement: {0}")]
    InvalidPlacement(String),

    /// Subgraph placement needs at least two two-qubit gates to grow from.
    #[error("subgraph placement requires at least 2 two-qubit gates, circuit has {0}")]
    TooFewInteractions(usize),

    /// `sampling_split` must lie in (0, 1].
    #[error("sampling_split must be in (0, 1], got {0}")]
    InvalidSamplingSplit(f64),

    /// No path between two physical qubits: the connectivity is disconnected.
    #[error("no path between physical qubits {q0} and {q1}")]
    RoutingFailed {
        /// First physical qubit.
        q0: u32,
        /// Second physical qubit.
        q1: u32,
    },

    /// Circuit construction failed while rewriting.
    #[error("circuit rewrite failed: {0}")]
    Ir(#[from] IrError),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
