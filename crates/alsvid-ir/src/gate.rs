//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Gates understood by the compilation stack.
///
/// The hardware-native subset is {`I`, `Z`, `RZ`, `U3`, `CZ`, `M`}; everything
/// else must be lowered by the unroller before reaching the pulse compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// Rotation around X axis.
    RX(f64),
    /// Rotation around Y axis.
    RY(f64),
    /// Rotation around Z axis.
    RZ(f64),
    /// Universal single-qubit gate U3(θ, φ, λ).
    U3(f64, f64, f64),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// Measurement in the computational basis. Accepts any number of targets.
    M,
}

impl Gate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::I => "id",
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::H => "h",
            Gate::S => "s",
            Gate::Sdg => "sdg",
            Gate::T => "t",
            Gate::Tdg => "tdg",
            Gate::RX(_) => "rx",
            Gate::RY(_) => "ry",
            Gate::RZ(_) => "rz",
            Gate::U3(_, _, _) => "u3",
            Gate::CX => "cx",
            Gate::CZ => "cz",
            Gate::Swap => "swap",
            Gate::M => "measure",
        }
    }

    /// Number of qubits this gate operates on. `None` for variadic gates
    /// (measurement).
    #[inline]
    pub fn num_qubits(&self) -> Option<u32> {
        match self {
            Gate::I
            | Gate::X
            | Gate::Y
            | Gate::Z
            | Gate::H
            | Gate::S
            | Gate::Sdg
            | Gate::T
            | Gate::Tdg
            | Gate::RX(_)
            | Gate::RY(_)
            | Gate::RZ(_)
            | Gate::U3(_, _, _) => Some(1),
            Gate::CX | Gate::CZ | Gate::Swap => Some(2),
            Gate::M => None,
        }
    }

    /// Whether the gate is directly realizable as a pulse template.
    #[inline]
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Gate::I | Gate::Z | Gate::RZ(_) | Gate::U3(_, _, _) | Gate::CZ | Gate::M
        )
    }

    /// Whether the gate entangles exactly two qubits (measurements excluded).
    #[inline]
    pub fn is_two_qubit(&self) -> bool {
        matches!(self, Gate::CX | Gate::CZ | Gate::Swap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_names() {
        assert_eq!(Gate::CZ.name(), "cz");
        assert_eq!(Gate::U3(0.1, 0.2, 0.3).name(), "u3");
        assert_eq!(Gate::M.name(), "measure");
    }

    #[test]
    fn test_native_set() {
        assert!(Gate::CZ.is_native());
        assert!(Gate::RZ(1.0).is_native());
        assert!(!Gate::H.is_native());
        assert!(!Gate::CX.is_native());
    }

    #[test]
    fn test_arity() {
        assert_eq!(Gate::H.num_qubits(), Some(1));
        assert_eq!(Gate::Swap.num_qubits(), Some(2));
        assert_eq!(Gate::M.num_qubits(), None);
    }
}
