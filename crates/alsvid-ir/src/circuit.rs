//! High-level circuit builder API.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::Instruction;
use crate::qubit::QubitId;

/// A quantum circuit as an ordered instruction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits the circuit addresses.
    nqubits: u32,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit over `nqubits` qubits.
    pub fn new(nqubits: u32) -> Self {
        Self {
            nqubits,
            instructions: vec![],
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.nqubits
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Append a validated instruction.
    pub fn add(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        for q in &instruction.qubits {
            if q.0 >= self.nqubits {
                return Err(IrError::QubitOutOfRange {
                    qubit: q.0,
                    nqubits: self.nqubits,
                });
            }
        }
        self.instructions.push(instruction);
        Ok(self)
    }

    /// Append a gate, validating arity and operand range.
    pub fn append(&mut self, gate: Gate, qubits: Vec<QubitId>) -> IrResult<&mut Self> {
        let instruction = Instruction::new(gate, qubits)?;
        self.add(instruction)
    }

    // =========================================================================
    // Builder methods for common gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::Z, qubit))
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::RX(theta), qubit))
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::RY(theta), qubit))
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::RZ(theta), qubit))
    }

    /// Apply the universal single-qubit gate U3(θ, φ, λ).
    pub fn u3(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add(Instruction::single(Gate::U3(theta, phi, lambda), qubit))
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::CX, vec![control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, q0: QubitId, q1: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::CZ, vec![q0, q1])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q0: QubitId, q1: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::Swap, vec![q0, q1])
    }

    /// Measure the given qubits.
    pub fn m(&mut self, qubits: &[QubitId]) -> IrResult<&mut Self> {
        self.append(Gate::M, qubits.to_vec())
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    /// Group instructions into moments.
    ///
    /// A gate joins the earliest moment in which none of its qubits are
    /// already busy, preserving per-qubit program order. Returned as lists of
    /// instruction indices into [`Circuit::instructions`].
    pub fn moments(&self) -> Vec<Vec<usize>> {
        let mut moments: Vec<Vec<usize>> = vec![];
        let mut next_free: FxHashMap<QubitId, usize> = FxHashMap::default();
        for (idx, instruction) in self.instructions.iter().enumerate() {
            let moment = instruction
                .qubits
                .iter()
                .map(|q| next_free.get(q).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            if moment == moments.len() {
                moments.push(vec![]);
            }
            moments[moment].push(idx);
            for q in &instruction.qubits {
                next_free.insert(*q, moment + 1);
            }
        }
        moments
    }

    /// Ordered qubit pairs of the two-qubit gates, measurements excluded.
    ///
    /// This is the interaction list the placers and the router score against.
    pub fn two_qubit_interactions(&self) -> Vec<(QubitId, QubitId)> {
        self.instructions
            .iter()
            .filter(|inst| inst.is_two_qubit())
            .map(|inst| (inst.qubits[0], inst.qubits[1]))
            .collect()
    }

    /// Whether every instruction uses only hardware-native gates.
    pub fn is_native(&self) -> bool {
        self.instructions.iter().all(|inst| inst.gate.is_native())
    }
}
