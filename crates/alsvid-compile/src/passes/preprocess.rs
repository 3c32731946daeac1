//! Structural checks before placement.

use alsvid_ir::Circuit;
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Rejects circuits larger than the device and pads smaller ones to the
/// physical qubit count, so every later pass works on full-width circuits.
pub struct Preprocessing;

impl Pass for Preprocessing {
    fn name(&self) -> &'static str {
        "Preprocessing"
    }

    fn kind(&self) -> PassKind {
        PassKind::Preprocessing
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let connectivity = properties
            .connectivity
            .as_ref()
            .ok_or(CompileError::MissingConnectivity)?;

        let available = connectivity.num_qubits();
        let required = circuit.num_qubits();
        if required > available {
            return Err(CompileError::CircuitTooLarge {
                required,
                available,
            });
        }

        if required < available {
            debug!(
                "padding circuit from {} to {} qubits to cover the device",
                required, available
            );
            let mut padded = Circuit::new(available);
            for instruction in circuit.instructions() {
                padded.add(instruction.clone())?;
            }
            *circuit = padded;
        }

        Ok(())
    }
}
