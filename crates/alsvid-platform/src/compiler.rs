//! Circuit-to-pulse compilation.
//!
//! Walks a transpiled circuit moment by moment and turns native gates into
//! calibrated pulses. Z rotations never emit pulses: they accumulate in a
//! per-qubit virtual phase register that offsets the phase of every later
//! drive pulse on that qubit.

use rustc_hash::{FxHashMap, FxHashSet};
use std::f64::consts::PI;
use tracing::instrument;

use alsvid_ir::{Circuit, Gate, QubitId};
use alsvid_pulse::{PulseId, PulseSequence};

use crate::error::{PlatformError, PlatformResult};
use crate::platform::Platform;

/// A compiled circuit: the pulse sequence plus, for each measurement gate,
/// the readout pulses it produced (instruction index, pulse ids).
#[derive(Debug, Clone)]
pub struct CompiledSequence {
    /// The scheduled pulses.
    pub sequence: PulseSequence,
    /// Readout pulse ids per measurement instruction.
    pub measurements: Vec<(usize, Vec<PulseId>)>,
}

/// Compile a native-gate circuit into a pulse sequence.
///
/// Each gate instance is processed at most once even if it shows up in
/// several moments. A non-native gate is fatal: it means the transpile
/// upstream is incomplete.
#[instrument(skip(platform, circuit), fields(ops = circuit.num_ops()))]
pub fn compile(platform: &Platform, circuit: &Circuit) -> PlatformResult<CompiledSequence> {
    let mut sequence = PulseSequence::new();
    let mut virtual_phases: FxHashMap<u32, f64> = FxHashMap::default();
    let mut measurements: Vec<(usize, Vec<PulseId>)> = vec![];
    let mut processed: FxHashSet<usize> = FxHashSet::default();

    for moment in circuit.moments() {
        let moment_start = sequence.finish();
        for index in moment {
            if !processed.insert(index) {
                continue;
            }
            let instruction = &circuit.instructions()[index];
            match &instruction.gate {
                Gate::I => {}

                Gate::Z => {
                    let qubit = instruction.qubits[0].0;
                    *virtual_phases.entry(qubit).or_insert(0.0) += PI;
                }

                Gate::RZ(theta) => {
                    let qubit = instruction.qubits[0].0;
                    *virtual_phases.entry(qubit).or_insert(0.0) += theta;
                }

                Gate::U3(theta, phi, lambda) => {
                    let qubit = instruction.qubits[0].0;
                    // U3(θ, φ, λ) = RZ(φ) RX(-π/2) RZ(θ) RX(π/2) RZ(λ),
                    // realized as two physical π/2 pulses and three frame updates
                    let phase = virtual_phases.entry(qubit).or_insert(0.0);
                    *phase += lambda;
                    let start = sequence
                        .qubit_pulses(QubitId(qubit))
                        .finish()
                        .max(moment_start);
                    let first = platform.create_rx90_pulse(qubit, start, *phase)?;
                    let first_finish = first.finish();
                    sequence.add(first);
                    *phase += theta;
                    // the second pulse is RX(-π/2): same envelope, π phase offset
                    let second =
                        platform.create_rx90_pulse(qubit, first_finish, *phase - PI)?;
                    sequence.add(second);
                    *phase += phi;
                }

                Gate::M => {
                    let start = sequence
                        .qubits_pulses(&instruction.qubits)
                        .finish()
                        .max(moment_start);
                    let mut pulse_ids = vec![];
                    for qubit in &instruction.qubits {
                        let readout = platform.create_mz_pulse(qubit.0, start)?;
                        pulse_ids.push(readout.id());
                        sequence.add(readout);
                    }
                    measurements.push((index, pulse_ids));
                }

                Gate::CZ => {
                    let (a, b) = (instruction.qubits[0].0, instruction.qubits[1].0);
                    let (template, template_phases) = platform.create_cz_sequence(a, b)?;

                    // the template may touch more qubits than the gate (couplers,
                    // spectator flux); start after all of them are free
                    let mut touched: Vec<QubitId> = instruction.qubits.clone();
                    for pulse in template.pulses() {
                        if !touched.contains(&pulse.qubit) {
                            touched.push(pulse.qubit);
                        }
                    }
                    let start = sequence
                        .qubits_pulses(&touched)
                        .finish()
                        .max(moment_start);

                    for pulse in template {
                        let mut shifted = pulse;
                        shifted.start += start;
                        sequence.add(shifted);
                    }
                    for (qubit, phase) in template_phases {
                        *virtual_phases.entry(qubit).or_insert(0.0) += phase;
                    }
                }

                other => return Err(PlatformError::UnsupportedGate(other.name())),
            }
        }
    }

    Ok(CompiledSequence {
        sequence,
        measurements,
    })
}
