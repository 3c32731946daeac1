//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A qubit index exceeds the circuit size.
    #[error("qubit q{qubit} out of range for circuit with {nqubits} qubits")]
    QubitOutOfRange {
        /// Offending qubit index.
        qubit: u32,
        /// Number of qubits in the circuit.
        nqubits: u32,
    },

    /// Wrong number of operands for a gate.
    #[error("gate '{gate}' expects {expected} qubit(s), got {got}")]
    ArityMismatch {
        /// Gate name.
        gate: &'static str,
        /// Expected operand count.
        expected: usize,
        /// Actual operand count.
        got: usize,
    },

    /// The same qubit appears twice in one instruction.
    #[error("gate '{gate}' applied to duplicate qubits")]
    DuplicateQubits {
        /// Gate name.
        gate: &'static str,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
