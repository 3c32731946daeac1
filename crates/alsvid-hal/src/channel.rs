//! Logical wires and shared local oscillators.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use alsvid_pulse::ChannelId;

/// Role an instrument plays in the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentRole {
    /// Synthesizes drive/flux waveforms.
    Control,
    /// Plays readout pulses and digitizes the return.
    Readout,
}

#[derive(Debug)]
struct LoState {
    name: String,
    frequency: Option<f64>,
    power: Option<f64>,
}

/// Shared handle to a local oscillator.
///
/// One LO is typically shared by several multiplexed channels; the handle
/// caches the last written values so repeated writes of the same value can be
/// skipped at the driver level.
#[derive(Debug, Clone)]
pub struct LocalOscillator {
    inner: Arc<Mutex<LoState>>,
}

impl LocalOscillator {
    /// Create an LO handle with nothing written yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LoState {
                name: name.into(),
                frequency: None,
                power: None,
            })),
        }
    }

    /// LO name.
    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    /// Last written frequency in Hz.
    pub fn frequency(&self) -> Option<f64> {
        self.lock().frequency
    }

    /// Record a frequency write. Returns `true` when the value changed and
    /// the driver must push it to the device.
    pub fn set_frequency(&self, frequency: f64) -> bool {
        let mut state = self.lock();
        if state.frequency == Some(frequency) {
            return false;
        }
        state.frequency = Some(frequency);
        true
    }

    /// Last written power in dBm.
    pub fn power(&self) -> Option<f64> {
        self.lock().power
    }

    /// Record a power write. Returns `true` when the value changed.
    pub fn set_power(&self, power: f64) -> bool {
        let mut state = self.lock();
        if state.power == Some(power) {
            return false;
        }
        state.power = Some(power);
        true
    }

    /// Whether two handles point at the same oscillator.
    pub fn same_as(&self, other: &LocalOscillator) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LoState> {
        self.inner.lock().expect("local oscillator state poisoned")
    }
}

/// A logical wire from an instrument port to the fridge.
///
/// Channels are shared across multiplexed qubits; the qubit→channel edges
/// live on the qubit records, not here.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Channel name, referenced by pulses.
    pub name: ChannelId,
    /// Instrument this channel is wired to.
    pub instrument: Option<String>,
    /// Port identifier on that instrument.
    pub port: Option<String>,
    /// Shared LO used for up/downconversion, if any.
    pub local_oscillator: Option<LocalOscillator>,
}

impl Channel {
    /// Create a bare named channel.
    pub fn new(name: impl Into<ChannelId>) -> Self {
        Self {
            name: name.into(),
            instrument: None,
            port: None,
            local_oscillator: None,
        }
    }

    /// Wire the channel to an instrument port.
    #[must_use]
    pub fn with_port(mut self, instrument: impl Into<String>, port: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self.port = Some(port.into());
        self
    }

    /// Attach a shared LO.
    #[must_use]
    pub fn with_local_oscillator(mut self, lo: LocalOscillator) -> Self {
        self.local_oscillator = Some(lo);
        self
    }
}
