//! Sweep parameter description.

use serde::{Deserialize, Serialize};
use std::fmt;

use alsvid_ir::QubitId;

use crate::error::{PulseError, PulseResult};
use crate::pulse::PulseId;

/// Identifier for a tunable coupler.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CouplerId(pub u32);

impl fmt::Display for CouplerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Parameter a sweeper varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Pulse carrier frequency.
    Frequency,
    /// Pulse amplitude.
    Amplitude,
    /// Pulse duration.
    Duration,
    /// Pulse relative phase.
    RelativePhase,
    /// Pulse start time.
    Start,
    /// Flux bias offset.
    Bias,
    /// Sequencer gain.
    Gain,
    /// Output attenuation.
    Attenuation,
    /// Local oscillator frequency.
    LoFrequency,
}

impl Parameter {
    /// Swept by the control hardware within a single upload.
    pub fn is_realtime(self) -> bool {
        matches!(
            self,
            Parameter::Frequency
                | Parameter::Gain
                | Parameter::Bias
                | Parameter::Amplitude
                | Parameter::Start
                | Parameter::Duration
                | Parameter::RelativePhase
        )
    }

    /// Requires one host-orchestrated execution per value.
    pub fn is_near_time(self) -> bool {
        matches!(self, Parameter::Attenuation | Parameter::LoFrequency)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parameter::Frequency => "frequency",
            Parameter::Amplitude => "amplitude",
            Parameter::Duration => "duration",
            Parameter::RelativePhase => "relative_phase",
            Parameter::Start => "start",
            Parameter::Bias => "bias",
            Parameter::Gain => "gain",
            Parameter::Attenuation => "attenuation",
            Parameter::LoFrequency => "lo_frequency",
        };
        write!(f, "{name}")
    }
}

/// What a sweeper is bound to. Exactly one kind per sweeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepTargets {
    /// Pulses whose parameter varies.
    Pulses(Vec<PulseId>),
    /// Qubits whose port/flux parameter varies.
    Qubits(Vec<QubitId>),
    /// Couplers whose flux parameter varies.
    Couplers(Vec<CouplerId>),
}

impl SweepTargets {
    fn kind(&self) -> &'static str {
        match self {
            SweepTargets::Pulses(_) => "pulse",
            SweepTargets::Qubits(_) => "qubit",
            SweepTargets::Couplers(_) => "coupler",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            SweepTargets::Pulses(p) => p.is_empty(),
            SweepTargets::Qubits(q) => q.is_empty(),
            SweepTargets::Couplers(c) => c.is_empty(),
        }
    }
}

/// A parameter to vary over a value range during execution.
///
/// Constructed per experiment and consumed read-only: the sweep engine makes
/// truncated copies when it has to split a range, it never mutates the
/// original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweeper {
    /// The parameter being varied.
    pub parameter: Parameter,
    /// Ordered values the parameter takes.
    pub values: Vec<f64>,
    /// Pulses, qubits or couplers the sweep applies to.
    pub targets: SweepTargets,
}

impl Sweeper {
    /// Create a sweeper, validating parameter/target compatibility.
    pub fn new(parameter: Parameter, values: Vec<f64>, targets: SweepTargets) -> PulseResult<Self> {
        if values.is_empty() {
            return Err(PulseError::EmptyValues(parameter));
        }
        if targets.is_empty() {
            return Err(PulseError::EmptyTargets(parameter));
        }
        let compatible = match (&parameter, &targets) {
            (
                Parameter::Frequency
                | Parameter::Amplitude
                | Parameter::Duration
                | Parameter::RelativePhase
                | Parameter::Start
                | Parameter::Gain
                | Parameter::LoFrequency,
                SweepTargets::Pulses(_),
            ) => true,
            (Parameter::Bias | Parameter::Attenuation, SweepTargets::Qubits(_)) => true,
            (Parameter::Bias, SweepTargets::Couplers(_)) => true,
            _ => false,
        };
        if !compatible {
            return Err(PulseError::IncompatibleTargets {
                parameter,
                targets: targets.kind(),
            });
        }
        Ok(Self {
            parameter,
            values,
            targets,
        })
    }

    /// Copy of this sweeper restricted to `values[range]`.
    pub fn truncated(&self, range: std::ops::Range<usize>) -> Sweeper {
        Sweeper {
            parameter: self.parameter,
            values: self.values[range].to_vec(),
            targets: self.targets.clone(),
        }
    }

    /// Pulse targets, empty slice when bound to qubits/couplers.
    pub fn pulse_targets(&self) -> &[PulseId] {
        match &self.targets {
            SweepTargets::Pulses(p) => p,
            _ => &[],
        }
    }

    /// Qubit targets, empty slice when bound to pulses/couplers.
    pub fn qubit_targets(&self) -> &[QubitId] {
        match &self.targets {
            SweepTargets::Qubits(q) => q,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Parameter::Frequency.is_realtime());
        assert!(Parameter::RelativePhase.is_realtime());
        assert!(Parameter::Attenuation.is_near_time());
        assert!(Parameter::LoFrequency.is_near_time());
        assert!(!Parameter::Attenuation.is_realtime());
    }

    #[test]
    fn test_target_compatibility() {
        let ok = Sweeper::new(
            Parameter::Frequency,
            vec![1.0, 2.0],
            SweepTargets::Pulses(vec![PulseId(0)]),
        );
        assert!(ok.is_ok());

        let bad = Sweeper::new(
            Parameter::Attenuation,
            vec![1.0],
            SweepTargets::Pulses(vec![PulseId(0)]),
        );
        assert!(matches!(bad, Err(PulseError::IncompatibleTargets { .. })));

        let coupler_bias = Sweeper::new(
            Parameter::Bias,
            vec![0.0, 0.1],
            SweepTargets::Couplers(vec![CouplerId(0)]),
        );
        assert!(coupler_bias.is_ok());
    }

    #[test]
    fn test_empty_values_rejected() {
        let result = Sweeper::new(
            Parameter::Frequency,
            vec![],
            SweepTargets::Pulses(vec![PulseId(0)]),
        );
        assert!(matches!(result, Err(PulseError::EmptyValues(_))));
    }

    #[test]
    fn test_truncated_copy() {
        let sweeper = Sweeper::new(
            Parameter::Frequency,
            vec![1.0, 2.0, 3.0, 4.0],
            SweepTargets::Pulses(vec![PulseId(0)]),
        )
        .unwrap();
        let head = sweeper.truncated(0..2);
        assert_eq!(head.values, vec![1.0, 2.0]);
        assert_eq!(sweeper.values.len(), 4);
    }
}
