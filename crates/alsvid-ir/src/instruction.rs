//! Instructions: gates bound to their operand qubits.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::qubit::QubitId;

/// A gate applied to specific qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The gate to apply.
    pub gate: Gate,
    /// Target qubits, in gate-operand order.
    pub qubits: Vec<QubitId>,
}

impl Instruction {
    /// Create an instruction, checking operand arity.
    pub fn new(gate: Gate, qubits: Vec<QubitId>) -> IrResult<Self> {
        match gate.num_qubits() {
            Some(expected) if qubits.len() != expected as usize => {
                return Err(IrError::ArityMismatch {
                    gate: gate.name(),
                    expected: expected as usize,
                    got: qubits.len(),
                });
            }
            None if qubits.is_empty() => {
                return Err(IrError::ArityMismatch {
                    gate: gate.name(),
                    expected: 1,
                    got: 0,
                });
            }
            _ => {}
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for q in &qubits {
            if !seen.insert(*q) {
                return Err(IrError::DuplicateQubits { gate: gate.name() });
            }
        }
        Ok(Self { gate, qubits })
    }

    /// Create a single-qubit instruction.
    pub fn single(gate: Gate, qubit: QubitId) -> Self {
        Self {
            gate,
            qubits: vec![qubit],
        }
    }

    /// Create a two-qubit instruction.
    pub fn two(gate: Gate, q0: QubitId, q1: QubitId) -> Self {
        Self {
            gate,
            qubits: vec![q0, q1],
        }
    }

    /// Whether this is a two-qubit entangling instruction.
    pub fn is_two_qubit(&self) -> bool {
        self.gate.is_two_qubit()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.gate.name())?;
        for (i, q) in self.qubits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{q}")?;
        }
        write!(f, ")")
    }
}
