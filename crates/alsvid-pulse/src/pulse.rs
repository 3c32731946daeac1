//! Pulse value type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use alsvid_ir::QubitId;

use crate::shape::Shape;

static NEXT_PULSE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique pulse identity, preserved across clones.
///
/// A sweep copies the sequence before mutating pulse parameters; results stay
/// keyed by the id of the copied pulse, which equals the original's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PulseId(pub u64);

impl PulseId {
    fn fresh() -> Self {
        PulseId(NEXT_PULSE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PulseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Logical channel name a pulse plays on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(name: &str) -> Self {
        ChannelId(name.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(name: String) -> Self {
        ChannelId(name)
    }
}

/// Role of a pulse on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseKind {
    /// Qubit drive pulse.
    Drive,
    /// Resonator readout pulse.
    Readout,
    /// Qubit flux bias pulse.
    Flux,
    /// Coupler flux bias pulse.
    CouplerFlux,
}

impl PulseKind {
    fn label(self) -> &'static str {
        match self {
            PulseKind::Drive => "DrivePulse",
            PulseKind::Readout => "ReadoutPulse",
            PulseKind::Flux => "FluxPulse",
            PulseKind::CouplerFlux => "CouplerFluxPulse",
        }
    }
}

/// An analog pulse scheduled on a channel.
///
/// `finish = start + duration` always holds. Once a pulse is part of a
/// scheduled sequence it is only rewritten by the sweep engine, and then only
/// on a copy of the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    id: PulseId,
    /// Pulse role.
    pub kind: PulseKind,
    /// Qubit the pulse addresses.
    pub qubit: QubitId,
    /// Channel the pulse plays on.
    pub channel: ChannelId,
    /// Start time in ns.
    pub start: u64,
    /// Duration in ns.
    pub duration: u64,
    /// Dimensionless amplitude in [-1, 1].
    pub amplitude: f64,
    /// Carrier frequency in Hz.
    pub frequency: f64,
    /// Phase relative to the channel frame, in rad.
    pub relative_phase: f64,
    /// Envelope shape.
    pub shape: Shape,
}

impl Pulse {
    /// Create a pulse with a fresh identity.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: PulseKind,
        qubit: QubitId,
        channel: ChannelId,
        start: u64,
        duration: u64,
        amplitude: f64,
        frequency: f64,
        relative_phase: f64,
        shape: Shape,
    ) -> Self {
        Self {
            id: PulseId::fresh(),
            kind,
            qubit,
            channel,
            start,
            duration,
            amplitude,
            frequency,
            relative_phase,
            shape,
        }
    }

    /// Stable identity of this pulse.
    pub fn id(&self) -> PulseId {
        self.id
    }

    /// End time in ns.
    pub fn finish(&self) -> u64 {
        self.start + self.duration
    }

    /// Whether this is a readout pulse.
    pub fn is_readout(&self) -> bool {
        self.kind == PulseKind::Readout
    }

    /// Human-readable rendering used as the result key presented to callers.
    pub fn serial(&self) -> String {
        format!(
            "{}({}, {}, {}, {})",
            self.kind.label(),
            self.qubit,
            self.channel,
            self.start,
            self.duration
        )
    }
}

impl fmt::Display for Pulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive_pulse(start: u64, duration: u64) -> Pulse {
        Pulse::new(
            PulseKind::Drive,
            QubitId(0),
            ChannelId::from("d0"),
            start,
            duration,
            0.5,
            5.2e9,
            0.0,
            Shape::Rectangular,
        )
    }

    #[test]
    fn test_finish_invariant() {
        let pulse = drive_pulse(16, 40);
        assert_eq!(pulse.finish(), 56);
    }

    #[test]
    fn test_clone_keeps_identity() {
        let pulse = drive_pulse(0, 40);
        let copy = pulse.clone();
        assert_eq!(pulse.id(), copy.id());
    }

    #[test]
    fn test_fresh_pulses_differ() {
        let a = drive_pulse(0, 40);
        let b = drive_pulse(0, 40);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_serial() {
        let pulse = drive_pulse(8, 32);
        assert_eq!(pulse.serial(), "DrivePulse(q0, d0, 8, 32)");
    }
}
