//! Immutable platform settings snapshot and calibration updates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use alsvid_compile::CouplingMap;
use alsvid_hal::InstrumentConfig;
use alsvid_pulse::Shape;

use crate::error::{PlatformError, PlatformResult};
use crate::natives::NativeGateTemplates;
use crate::qubit::{Coupler, Qubit};

/// One complete, immutable configuration snapshot of a platform.
///
/// Loaded from the runcard by the (out-of-scope) serialization collaborator
/// and handed over as an in-memory value. Calibration routines never mutate a
/// snapshot: [`PlatformSettings::apply`] returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Platform name.
    pub name: String,
    /// Number of qubits.
    pub nqubits: u32,
    /// Default wait between shots, in ns.
    pub relaxation_time: u64,
    /// Digitizer sampling rate in S/s.
    pub sampling_rate: f64,
    /// Physical connectivity as an edge list.
    pub topology: Vec<(u32, u32)>,
    /// Qubit characterization records.
    pub qubits: FxHashMap<u32, Qubit>,
    /// Coupler characterization records.
    pub couplers: FxHashMap<u32, Coupler>,
    /// Native-gate pulse templates.
    pub natives: NativeGateTemplates,
    /// Instrument configurations.
    pub instruments: Vec<InstrumentConfig>,
}

impl PlatformSettings {
    /// Connectivity graph of the topology edge list.
    pub fn connectivity(&self) -> CouplingMap {
        CouplingMap::from_edges(self.nqubits, self.topology.iter().copied())
    }

    /// Apply one calibration update, returning a new snapshot.
    pub fn apply(&self, update: &CalibrationUpdate) -> PlatformResult<PlatformSettings> {
        let mut next = self.clone();
        let qubit = next
            .qubits
            .get_mut(&update.qubit)
            .ok_or(PlatformError::UnknownQubit(update.qubit))?;
        let natives = next
            .natives
            .single_mut(update.qubit)
            .ok_or(PlatformError::UnknownQubit(update.qubit))?;

        use CalibrationParameter::*;
        match update.parameter {
            ReadoutFrequency(frequency) => {
                // keep the LO fixed: shift the IF along with the carrier
                if let Some(if_frequency) = natives.mz.if_frequency.as_mut() {
                    *if_frequency += frequency - natives.mz.frequency;
                }
                natives.mz.frequency = frequency;
                qubit.readout_frequency = frequency;
            }
            BareResonatorFrequency(frequency) => {
                qubit.bare_resonator_frequency = frequency;
            }
            DriveFrequency(frequency) => {
                if let Some(if_frequency) = natives.rx.if_frequency.as_mut() {
                    *if_frequency += frequency - natives.rx.frequency;
                }
                natives.rx.frequency = frequency;
                qubit.drive_frequency = frequency;
            }
            Sweetspot(bias) => qubit.sweetspot = bias,
            ReadoutAmplitude(amplitude) => natives.mz.amplitude = amplitude,
            DriveAmplitude(amplitude) => {
                natives.rx.amplitude = amplitude;
                qubit.pi_pulse_amplitude = amplitude;
            }
            DriveDuration(duration) => natives.rx.duration = duration,
            T1(t1) => qubit.t1 = t1,
            T2(t2) => qubit.t2 = t2,
            T2SpinEcho(t2) => qubit.t2_spin_echo = t2,
            Threshold(threshold) => qubit.threshold = Some(threshold),
            IqAngle(angle) => qubit.iq_angle = angle,
            MeanGndStates(point) => qubit.mean_gnd_states = point,
            MeanExcStates(point) => qubit.mean_exc_states = point,
            DragBeta(beta) => match natives.rx.shape {
                Shape::Drag { rel_sigma, .. } => {
                    natives.rx.shape = Shape::Drag { rel_sigma, beta };
                }
                _ => {
                    return Err(PlatformError::InvalidCalibration {
                        qubit: update.qubit,
                        reason: format!(
                            "drag beta update needs a drag RX shape, found {}",
                            natives.rx.shape.name()
                        ),
                    });
                }
            },
        }

        debug!("calibration applied to qubit {}", update.qubit);
        Ok(next)
    }

    /// Apply a batch of updates, returning the final snapshot.
    pub fn apply_all(&self, updates: &[CalibrationUpdate]) -> PlatformResult<PlatformSettings> {
        let mut snapshot = self.clone();
        for update in updates {
            snapshot = snapshot.apply(update)?;
        }
        Ok(snapshot)
    }
}

/// A single calibrated value to fold into the settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationUpdate {
    /// Qubit the value belongs to.
    pub qubit: u32,
    /// The calibrated parameter.
    pub parameter: CalibrationParameter,
}

/// Parameters calibration routines can update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationParameter {
    /// Dressed readout frequency, Hz.
    ReadoutFrequency(f64),
    /// Bare resonator frequency, Hz.
    BareResonatorFrequency(f64),
    /// Qubit drive frequency, Hz.
    DriveFrequency(f64),
    /// Flux sweetspot, V.
    Sweetspot(f64),
    /// Readout pulse amplitude.
    ReadoutAmplitude(f64),
    /// Pi pulse amplitude.
    DriveAmplitude(f64),
    /// Pi pulse duration, ns.
    DriveDuration(u64),
    /// Relaxation time, ns.
    T1(f64),
    /// Dephasing time, ns.
    T2(f64),
    /// Spin-echo dephasing time, ns.
    T2SpinEcho(f64),
    /// Discrimination threshold, V.
    Threshold(f64),
    /// IQ rotation angle, rad.
    IqAngle(f64),
    /// Mean ground-state IQ point.
    MeanGndStates((f64, f64)),
    /// Mean excited-state IQ point.
    MeanExcStates((f64, f64)),
    /// DRAG derivative coefficient.
    DragBeta(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::natives::{PulseTemplate, SingleQubitNatives};

    fn settings() -> PlatformSettings {
        let mut qubits = FxHashMap::default();
        qubits.insert(0, Qubit::new(0));
        let mut natives = NativeGateTemplates::new();
        natives.insert_single(
            0,
            SingleQubitNatives {
                rx: PulseTemplate {
                    duration: 40,
                    amplitude: 0.5,
                    frequency: 5.0e9,
                    if_frequency: Some(200e6),
                    shape: Shape::Drag {
                        rel_sigma: 5.0,
                        beta: 0.0,
                    },
                },
                mz: PulseTemplate {
                    duration: 2000,
                    amplitude: 0.1,
                    frequency: 7.0e9,
                    if_frequency: Some(100e6),
                    shape: Shape::Rectangular,
                },
            },
        );
        PlatformSettings {
            name: "test".into(),
            nqubits: 1,
            relaxation_time: 50_000,
            sampling_rate: 1e9,
            qubits,
            natives,
            ..PlatformSettings::default()
        }
    }

    #[test]
    fn test_apply_returns_new_snapshot() {
        let before = settings();
        let after = before
            .apply(&CalibrationUpdate {
                qubit: 0,
                parameter: CalibrationParameter::DriveFrequency(5.1e9),
            })
            .unwrap();

        assert_eq!(before.qubits[&0].drive_frequency, 0.0);
        assert_eq!(after.qubits[&0].drive_frequency, 5.1e9);
        // the IF moved with the carrier, keeping the LO target fixed
        let rx = &after.natives.single(0).unwrap().rx;
        assert_eq!(rx.frequency, 5.1e9);
        assert_eq!(rx.if_frequency, Some(200e6 + 0.1e9));
    }

    #[test]
    fn test_apply_unknown_qubit() {
        let result = settings().apply(&CalibrationUpdate {
            qubit: 7,
            parameter: CalibrationParameter::T1(1.0),
        });
        assert!(matches!(result, Err(PlatformError::UnknownQubit(7))));
    }

    #[test]
    fn test_drag_beta_needs_drag_shape() {
        let snapshot = settings()
            .apply(&CalibrationUpdate {
                qubit: 0,
                parameter: CalibrationParameter::DragBeta(0.35),
            })
            .unwrap();
        match snapshot.natives.single(0).unwrap().rx.shape {
            Shape::Drag { beta, .. } => assert_eq!(beta, 0.35),
            _ => panic!("shape changed unexpectedly"),
        }
    }

    #[test]
    fn test_drive_amplitude_updates_both_records() {
        let snapshot = settings()
            .apply(&CalibrationUpdate {
                qubit: 0,
                parameter: CalibrationParameter::DriveAmplitude(0.42),
            })
            .unwrap();
        assert_eq!(snapshot.qubits[&0].pi_pulse_amplitude, 0.42);
        assert_eq!(snapshot.natives.single(0).unwrap().rx.amplitude, 0.42);
    }
}
