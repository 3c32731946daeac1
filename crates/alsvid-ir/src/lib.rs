//! Alsvid Circuit Intermediate Representation
//!
//! This crate provides the gate-level circuit types consumed by the
//! transpiler and the pulse compiler. Circuits here are flat instruction
//! lists; scheduling structure is recovered on demand through
//! [`Circuit::moments`], which groups gates that could execute concurrently
//! while preserving per-qubit ordering.
//!
//! # Example
//!
//! ```rust
//! use alsvid_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new(2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cz(QubitId(0), QubitId(1)).unwrap();
//! circuit.m(&[QubitId(0), QubitId(1)]).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.moments().len(), 3);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::Gate;
pub use instruction::Instruction;
pub use qubit::QubitId;
