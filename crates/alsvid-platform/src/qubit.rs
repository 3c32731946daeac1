//! Qubit and coupler characterization records.

use serde::{Deserialize, Serialize};

use alsvid_pulse::{ChannelId, CouplerId};

/// Characterization record of one physical qubit.
///
/// Frequencies are Hz, times ns, voltages V. Channel fields hold zero or one
/// channel name per role; the channels themselves (and the instruments behind
/// them) live on the platform and may be shared across multiplexed qubits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qubit {
    /// Qubit index on the chip.
    pub name: u32,
    /// Bare resonator frequency.
    #[serde(default)]
    pub bare_resonator_frequency: f64,
    /// Dressed readout frequency.
    #[serde(default)]
    pub readout_frequency: f64,
    /// Qubit drive frequency.
    #[serde(default)]
    pub drive_frequency: f64,
    /// Flux sweetspot bias.
    #[serde(default)]
    pub sweetspot: f64,
    /// Amplitude of the calibrated pi pulse.
    #[serde(default)]
    pub pi_pulse_amplitude: f64,
    /// Relaxation time.
    #[serde(default)]
    pub t1: f64,
    /// Dephasing time.
    #[serde(default)]
    pub t2: f64,
    /// Spin-echo dephasing time.
    #[serde(default)]
    pub t2_spin_echo: f64,
    /// Single-shot discrimination threshold.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// IQ-plane rotation applied before thresholding, in rad.
    #[serde(default)]
    pub iq_angle: f64,
    /// Mean ground-state IQ point.
    #[serde(default)]
    pub mean_gnd_states: (f64, f64),
    /// Mean excited-state IQ point.
    #[serde(default)]
    pub mean_exc_states: (f64, f64),

    /// Readout channel.
    #[serde(default)]
    pub readout: Option<ChannelId>,
    /// Acquisition feedback channel.
    #[serde(default)]
    pub feedback: Option<ChannelId>,
    /// Drive channel.
    #[serde(default)]
    pub drive: Option<ChannelId>,
    /// Flux bias channel.
    #[serde(default)]
    pub flux: Option<ChannelId>,
    /// TWPA pump channel.
    #[serde(default)]
    pub twpa: Option<ChannelId>,
}

impl Qubit {
    /// Create a bare record for a qubit index.
    pub fn new(name: u32) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Channels owned by this qubit, in role order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        [
            self.readout.as_ref(),
            self.feedback.as_ref(),
            self.drive.as_ref(),
            self.flux.as_ref(),
            self.twpa.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Characterization record of one tunable coupler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coupler {
    /// Coupler index.
    pub name: CouplerId,
    /// Flux sweetspot bias.
    #[serde(default)]
    pub sweetspot: f64,
    /// Flux bias channel.
    #[serde(default)]
    pub flux: Option<ChannelId>,
}
