//! Instrument capability trait.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use alsvid_pulse::{ExecutionParameters, PulseId, PulseSequence, Sweeper};

use crate::error::{InstrumentError, InstrumentResult};

/// Free-form driver settings, handed over by the runcard collaborator.
pub type InstrumentSettings = serde_json::Map<String, serde_json::Value>;

/// On-device memory limits that bound sweep decomposition and batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepLimits {
    /// Maximum hardware-accumulated bins per upload.
    pub max_bins: usize,
    /// Maximum waveform samples per sequencer.
    pub max_waveform_samples: usize,
    /// Maximum readout pulses in one uploaded sequence.
    pub max_readout_pulses: usize,
    /// Maximum independent sequences batched into one upload.
    pub max_batch_sequences: usize,
    /// Whether amplitude can be swept in real time. When `false`, amplitude
    /// sweeps are realized as gain sweeps with the pulse amplitude forced
    /// to one.
    pub supports_rt_amplitude: bool,
}

impl Default for SweepLimits {
    fn default() -> Self {
        Self {
            max_bins: 1 << 17,
            max_waveform_samples: 16_380,
            max_readout_pulses: 128,
            max_batch_sequences: 32,
            supports_rt_amplitude: false,
        }
    }
}

/// Raw acquisition data for one readout pulse: per-sample or per-bin I/Q
/// plus thresholded states, flattened over bins × shots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAcquisition {
    /// In-phase samples.
    pub i: Vec<f64>,
    /// Quadrature samples.
    pub q: Vec<f64>,
    /// Classified {0, 1} states.
    pub states: Vec<u8>,
}

/// A control or readout backend.
///
/// All methods block until the hardware round-trip completes. Implementations
/// cache their [`SweepLimits`] at construction; `limits` never fails.
///
/// The port-parameter setters default to [`InstrumentError::Unsupported`]
/// so drivers only implement the knobs their hardware has.
pub trait Instrument: Send {
    /// Name of this instrument instance.
    fn name(&self) -> &str;

    /// Device limits, cached at construction time.
    fn limits(&self) -> &SweepLimits;

    /// Whether a device connection is established.
    fn is_connected(&self) -> bool;

    /// Establish the device connection.
    fn connect(&mut self) -> InstrumentResult<()>;

    /// Push calibration settings to the device.
    fn setup(&mut self, settings: &InstrumentSettings) -> InstrumentResult<()>;

    /// Translate and upload a pulse sequence, together with any real-time
    /// sweep the device should loop over.
    fn upload(
        &mut self,
        sequence: &PulseSequence,
        options: &ExecutionParameters,
        sweepers: &[Sweeper],
    ) -> InstrumentResult<()>;

    /// Arm and start the uploaded program.
    fn play_sequence(&mut self) -> InstrumentResult<()>;

    /// Block until acquisition completes and return data per readout pulse.
    fn acquire(&mut self) -> InstrumentResult<FxHashMap<PulseId, RawAcquisition>>;

    /// Stop any running program.
    fn stop(&mut self) -> InstrumentResult<()>;

    /// Tear down the device connection.
    fn disconnect(&mut self) -> InstrumentResult<()>;

    /// Set output attenuation on a port, in dB.
    fn set_attenuation(&mut self, _port: &str, _value: f64) -> InstrumentResult<()> {
        Err(InstrumentError::Unsupported {
            instrument: self.name().to_string(),
            operation: "attenuation",
        })
    }

    /// Set sequencer gain on a port, dimensionless.
    fn set_gain(&mut self, _port: &str, _value: f64) -> InstrumentResult<()> {
        Err(InstrumentError::Unsupported {
            instrument: self.name().to_string(),
            operation: "gain",
        })
    }

    /// Set flux bias offset on a port, in V.
    fn set_bias(&mut self, _port: &str, _value: f64) -> InstrumentResult<()> {
        Err(InstrumentError::Unsupported {
            instrument: self.name().to_string(),
            operation: "bias",
        })
    }

    /// Set the up/downconversion LO frequency on a port, in Hz.
    fn set_lo_frequency(&mut self, _port: &str, _value: f64) -> InstrumentResult<()> {
        Err(InstrumentError::Unsupported {
            instrument: self.name().to_string(),
            operation: "lo_frequency",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare {
        limits: SweepLimits,
    }

    impl Instrument for Bare {
        fn name(&self) -> &str {
            "bare"
        }
        fn limits(&self) -> &SweepLimits {
            &self.limits
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn connect(&mut self) -> InstrumentResult<()> {
            Ok(())
        }
        fn setup(&mut self, _settings: &InstrumentSettings) -> InstrumentResult<()> {
            Ok(())
        }
        fn upload(
            &mut self,
            _sequence: &PulseSequence,
            _options: &ExecutionParameters,
            _sweepers: &[Sweeper],
        ) -> InstrumentResult<()> {
            Ok(())
        }
        fn play_sequence(&mut self) -> InstrumentResult<()> {
            Ok(())
        }
        fn acquire(&mut self) -> InstrumentResult<FxHashMap<PulseId, RawAcquisition>> {
            Ok(FxHashMap::default())
        }
        fn stop(&mut self) -> InstrumentResult<()> {
            Ok(())
        }
        fn disconnect(&mut self) -> InstrumentResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_limits() {
        let limits = SweepLimits::default();
        assert_eq!(limits.max_bins, 131_072);
        assert!(!limits.supports_rt_amplitude);
    }

    #[test]
    fn test_port_setters_default_to_unsupported() {
        let mut bare = Bare {
            limits: SweepLimits::default(),
        };
        let result = bare.set_attenuation("o1", 30.0);
        assert!(matches!(result, Err(InstrumentError::Unsupported { .. })));
    }
}
