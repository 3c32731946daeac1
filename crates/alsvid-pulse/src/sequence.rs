//! Ordered, time-indexed pulse collections.

use serde::{Deserialize, Serialize};

use alsvid_ir::QubitId;

use crate::pulse::{ChannelId, Pulse, PulseId};

/// An ordered collection of pulses on a shared timeline.
///
/// Insertion order is preserved but carries no timing meaning; execution
/// order is given by each pulse's `start`. Filtered views return new
/// sequences sorted by start time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PulseSequence {
    pulses: Vec<Pulse>,
}

impl PulseSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pulse.
    pub fn add(&mut self, pulse: Pulse) {
        self.pulses.push(pulse);
    }

    /// Append all pulses of another sequence.
    pub fn extend(&mut self, other: PulseSequence) {
        self.pulses.extend(other.pulses);
    }

    /// Pulses in insertion order.
    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// Mutable access by pulse identity.
    pub fn pulse_mut(&mut self, id: PulseId) -> Option<&mut Pulse> {
        self.pulses.iter_mut().find(|p| p.id() == id)
    }

    /// Look up a pulse by identity.
    pub fn pulse(&self, id: PulseId) -> Option<&Pulse> {
        self.pulses.iter().find(|p| p.id() == id)
    }

    /// Whether a pulse with this identity is present.
    pub fn contains(&self, id: PulseId) -> bool {
        self.pulse(id).is_some()
    }

    /// Number of pulses.
    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    /// Whether the sequence holds no pulses.
    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    /// End of the last pulse, 0 for an empty sequence.
    pub fn finish(&self) -> u64 {
        self.pulses.iter().map(Pulse::finish).max().unwrap_or(0)
    }

    /// Start of the earliest pulse, 0 for an empty sequence.
    pub fn start(&self) -> u64 {
        self.pulses.iter().map(|p| p.start).min().unwrap_or(0)
    }

    /// Occupied span in ns; drives relaxation-time padding.
    pub fn duration(&self) -> u64 {
        self.finish() - self.start()
    }

    /// Pulses on a channel, sorted by start.
    pub fn channel_pulses(&self, channel: &ChannelId) -> PulseSequence {
        self.filtered(|p| &p.channel == channel)
    }

    /// Pulses on any of the given channels, sorted by start.
    pub fn channels_pulses(&self, channels: &[ChannelId]) -> PulseSequence {
        self.filtered(|p| channels.contains(&p.channel))
    }

    /// Pulses addressed to a qubit, sorted by start.
    pub fn qubit_pulses(&self, qubit: QubitId) -> PulseSequence {
        self.filtered(|p| p.qubit == qubit)
    }

    /// Pulses addressed to any of the given qubits, sorted by start.
    pub fn qubits_pulses(&self, qubits: &[QubitId]) -> PulseSequence {
        self.filtered(|p| qubits.contains(&p.qubit))
    }

    /// All readout pulses, sorted by start.
    pub fn readout_pulses(&self) -> PulseSequence {
        self.filtered(Pulse::is_readout)
    }

    fn filtered(&self, keep: impl Fn(&Pulse) -> bool) -> PulseSequence {
        let mut pulses: Vec<Pulse> = self.pulses.iter().filter(|p| keep(p)).cloned().collect();
        pulses.sort_by_key(|p| p.start);
        PulseSequence { pulses }
    }
}

impl IntoIterator for PulseSequence {
    type Item = Pulse;
    type IntoIter = std::vec::IntoIter<Pulse>;

    fn into_iter(self) -> Self::IntoIter {
        self.pulses.into_iter()
    }
}

impl<'a> IntoIterator for &'a PulseSequence {
    type Item = &'a Pulse;
    type IntoIter = std::slice::Iter<'a, Pulse>;

    fn into_iter(self) -> Self::IntoIter {
        self.pulses.iter()
    }
}

impl FromIterator<Pulse> for PulseSequence {
    fn from_iter<T: IntoIterator<Item = Pulse>>(iter: T) -> Self {
        Self {
            pulses: iter.into_iter().collect(),
        }
    }
}
