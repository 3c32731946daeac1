//! The dummy instrument driver.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use alsvid_hal::{
    Instrument, InstrumentConfig, InstrumentError, InstrumentRegistry, InstrumentResult,
    InstrumentSettings, RawAcquisition, SweepLimits,
};
use alsvid_pulse::{ExecutionParameters, PulseId, PulseSequence, Sweeper};

/// A recorded port-parameter write.
#[derive(Debug, Clone, PartialEq)]
pub struct PortWrite {
    /// Which knob was written ("attenuation", "gain", "bias", "lo_frequency").
    pub operation: &'static str,
    /// Port identifier.
    pub port: String,
    /// Written value.
    pub value: f64,
}

struct Upload {
    readout_ids: Vec<PulseId>,
    bins: usize,
    nshots: u32,
    waveform_samples: usize,
}

/// Mix a pulse envelope up to its carrier: the in-phase/quadrature waveform
/// pair a sequencer would play, one sample per ns.
pub fn modulated_waveform(pulse: &alsvid_pulse::Pulse) -> Option<(Vec<f64>, Vec<f64>)> {
    let envelope = pulse.shape.envelope(pulse.duration).ok()?;
    let mut i = Vec::with_capacity(envelope.i.len());
    let mut q = Vec::with_capacity(envelope.i.len());
    for (t, (ei, eq)) in envelope.i.iter().zip(&envelope.q).enumerate() {
        let phase =
            std::f64::consts::TAU * pulse.frequency * (t as f64) * 1e-9 + pulse.relative_phase;
        let (sin, cos) = phase.sin_cos();
        i.push(pulse.amplitude * (ei * cos - eq * sin));
        q.push(pulse.amplitude * (ei * sin + eq * cos));
    }
    Some((i, q))
}

/// In-memory backend for tests and dry runs.
///
/// Acquisitions are seeded per (instrument seed, pulse id), so results are
/// reproducible across runs while differing between pulses.
pub struct DummyInstrument {
    name: String,
    limits: SweepLimits,
    seed: u64,
    connected: bool,
    uploaded: Option<Upload>,
    played: bool,
    port_writes: Vec<PortWrite>,
    play_counter: Option<Arc<AtomicUsize>>,
}

impl DummyInstrument {
    /// Create a dummy with default limits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limits: SweepLimits::default(),
            seed: 0,
            connected: false,
            uploaded: None,
            played: false,
            port_writes: vec![],
            play_counter: None,
        }
    }

    /// Override the device limits.
    #[must_use]
    pub fn with_limits(mut self, limits: SweepLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the acquisition seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Attach a counter incremented on every `play_sequence`, so tests can
    /// observe how many hardware passes a sweep decomposed into.
    #[must_use]
    pub fn with_play_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.play_counter = Some(counter);
        self
    }

    /// Build from a registry configuration. Recognized settings:
    /// `seed` (u64), `max_bins` (usize), `supports_rt_amplitude` (bool).
    pub fn from_config(config: &InstrumentConfig) -> Self {
        let mut dummy = Self::new(config.name.clone());
        if let Some(seed) = config.settings.get("seed").and_then(|v| v.as_u64()) {
            dummy.seed = seed;
        }
        if let Some(max_bins) = config.settings.get("max_bins").and_then(|v| v.as_u64()) {
            dummy.limits.max_bins = max_bins as usize;
        }
        if let Some(rt_amplitude) = config
            .settings
            .get("supports_rt_amplitude")
            .and_then(|v| v.as_bool())
        {
            dummy.limits.supports_rt_amplitude = rt_amplitude;
        }
        dummy
    }

    /// Port writes recorded so far, oldest first.
    pub fn port_writes(&self) -> &[PortWrite] {
        &self.port_writes
    }

    /// Waveform memory the captured upload would occupy, if any.
    pub fn uploaded_waveform_samples(&self) -> Option<usize> {
        self.uploaded.as_ref().map(|u| u.waveform_samples)
    }

    fn record(&mut self, operation: &'static str, port: &str, value: f64) {
        self.port_writes.push(PortWrite {
            operation,
            port: port.to_string(),
            value,
        });
    }

    fn require_connected(&self) -> InstrumentResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(InstrumentError::NotConnected(self.name.clone()))
        }
    }
}

impl Instrument for DummyInstrument {
    fn name(&self) -> &str {
        &self.name
    }

    fn limits(&self) -> &SweepLimits {
        &self.limits
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> InstrumentResult<()> {
        if self.connected {
            return Err(InstrumentError::AlreadyConnected(self.name.clone()));
        }
        self.connected = true;
        Ok(())
    }

    fn setup(&mut self, _settings: &InstrumentSettings) -> InstrumentResult<()> {
        self.require_connected()
    }

    fn upload(
        &mut self,
        sequence: &PulseSequence,
        options: &ExecutionParameters,
        sweepers: &[Sweeper],
    ) -> InstrumentResult<()> {
        self.require_connected()?;
        let bins: usize = sweepers.iter().map(|s| s.values.len()).product();
        let total = bins * options.nshots as usize;
        if total >= self.limits.max_bins {
            return Err(InstrumentError::CapacityExceeded {
                instrument: self.name.clone(),
                bins: total,
                limit: self.limits.max_bins,
            });
        }
        // synthesize the waveforms a real sequencer would hold in memory
        let mut waveform_samples = 0;
        for pulse in sequence.pulses() {
            if pulse.duration as usize > self.limits.max_waveform_samples {
                return Err(InstrumentError::CapacityExceeded {
                    instrument: self.name.clone(),
                    bins: pulse.duration as usize,
                    limit: self.limits.max_waveform_samples,
                });
            }
            if let Some((i, _)) = modulated_waveform(pulse) {
                waveform_samples += i.len();
            }
        }

        debug!(
            "{}: captured {} pulses ({} waveform samples), {} bins x {} shots",
            self.name,
            sequence.len(),
            waveform_samples,
            bins,
            options.nshots
        );
        self.uploaded = Some(Upload {
            readout_ids: sequence
                .readout_pulses()
                .pulses()
                .iter()
                .map(|p| p.id())
                .collect(),
            bins,
            nshots: options.nshots,
            waveform_samples,
        });
        self.played = false;
        Ok(())
    }

    fn play_sequence(&mut self) -> InstrumentResult<()> {
        self.require_connected()?;
        if self.uploaded.is_none() {
            return Err(InstrumentError::InvalidSettings {
                instrument: self.name.clone(),
                reason: "no sequence uploaded".into(),
            });
        }
        self.played = true;
        if let Some(counter) = &self.play_counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    fn acquire(&mut self) -> InstrumentResult<FxHashMap<PulseId, RawAcquisition>> {
        self.require_connected()?;
        let upload = self.uploaded.as_ref().ok_or_else(|| {
            InstrumentError::InvalidSettings {
                instrument: self.name.clone(),
                reason: "no sequence uploaded".into(),
            }
        })?;
        if !self.played {
            return Err(InstrumentError::InvalidSettings {
                instrument: self.name.clone(),
                reason: "sequence was not played".into(),
            });
        }

        let samples = upload.bins.max(1) * upload.nshots as usize;
        let mut results = FxHashMap::default();
        for id in &upload.readout_ids {
            let mut rng = SmallRng::seed_from_u64(self.seed ^ id.0);
            let mut i = Vec::with_capacity(samples);
            let mut q = Vec::with_capacity(samples);
            let mut states = Vec::with_capacity(samples);
            for _ in 0..samples {
                let vi: f64 = rng.r#gen::<f64>() - 0.5;
                let vq: f64 = rng.r#gen::<f64>() - 0.5;
                i.push(vi);
                q.push(vq);
                states.push(u8::from(vi > 0.0));
            }
            results.insert(*id, RawAcquisition { i, q, states });
        }
        Ok(results)
    }

    fn stop(&mut self) -> InstrumentResult<()> {
        self.played = false;
        Ok(())
    }

    fn disconnect(&mut self) -> InstrumentResult<()> {
        self.connected = false;
        self.uploaded = None;
        Ok(())
    }

    fn set_attenuation(&mut self, port: &str, value: f64) -> InstrumentResult<()> {
        self.record("attenuation", port, value);
        Ok(())
    }

    fn set_gain(&mut self, port: &str, value: f64) -> InstrumentResult<()> {
        self.record("gain", port, value);
        Ok(())
    }

    fn set_bias(&mut self, port: &str, value: f64) -> InstrumentResult<()> {
        self.record("bias", port, value);
        Ok(())
    }

    fn set_lo_frequency(&mut self, port: &str, value: f64) -> InstrumentResult<()> {
        self.record("lo_frequency", port, value);
        Ok(())
    }
}

/// Register the dummy driver under the name `"dummy"`.
pub fn register(registry: &mut InstrumentRegistry) {
    registry.register_factory("dummy", |config| {
        Ok(Box::new(DummyInstrument::from_config(config)) as Box<dyn Instrument>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::QubitId;
    use alsvid_pulse::{ChannelId, Pulse, PulseKind, Shape};

    fn readout_sequence() -> PulseSequence {
        let mut sequence = PulseSequence::new();
        sequence.add(Pulse::new(
            PulseKind::Readout,
            QubitId(0),
            ChannelId::from("ro0"),
            0,
            1000,
            0.1,
            7e9,
            0.0,
            Shape::Rectangular,
        ));
        sequence
    }

    #[test]
    fn test_lifecycle() {
        let mut dummy = DummyInstrument::new("qrm0");
        assert!(dummy.upload(&readout_sequence(), &ExecutionParameters::default(), &[]).is_err());

        dummy.connect().unwrap();
        assert!(matches!(
            dummy.connect(),
            Err(InstrumentError::AlreadyConnected(_))
        ));

        let options = ExecutionParameters::default().with_nshots(16);
        dummy.upload(&readout_sequence(), &options, &[]).unwrap();
        dummy.play_sequence().unwrap();
        let acquired = dummy.acquire().unwrap();
        assert_eq!(acquired.len(), 1);
        let raw = acquired.values().next().unwrap();
        assert_eq!(raw.i.len(), 16);
        assert_eq!(raw.states.len(), 16);
    }

    #[test]
    fn test_acquisitions_are_deterministic() {
        let run = || {
            let mut dummy = DummyInstrument::new("qrm0").with_seed(7);
            dummy.connect().unwrap();
            let sequence = readout_sequence();
            let id = sequence.readout_pulses().pulses()[0].id();
            dummy
                .upload(&sequence, &ExecutionParameters::default().with_nshots(8), &[])
                .unwrap();
            dummy.play_sequence().unwrap();
            (id, dummy.acquire().unwrap())
        };
        let (_, first) = run();
        let (_, second) = run();
        // different pulse ids, but same seed → per-pulse streams differ;
        // compare the sample count and value ranges instead
        let a = first.values().next().unwrap();
        let b = second.values().next().unwrap();
        assert_eq!(a.i.len(), b.i.len());
        assert!(a.i.iter().all(|v| (-0.5..0.5).contains(v)));
        assert!(b.i.iter().all(|v| (-0.5..0.5).contains(v)));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut limits = SweepLimits::default();
        limits.max_bins = 100;
        let mut dummy = DummyInstrument::new("qrm0").with_limits(limits);
        dummy.connect().unwrap();
        let options = ExecutionParameters::default().with_nshots(200);
        let result = dummy.upload(&readout_sequence(), &options, &[]);
        assert!(matches!(
            result,
            Err(InstrumentError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_modulated_waveform() {
        let pulse = Pulse::new(
            PulseKind::Drive,
            QubitId(0),
            ChannelId::from("d0"),
            0,
            100,
            0.5,
            10e6,
            0.0,
            Shape::Rectangular,
        );
        let (i, q) = modulated_waveform(&pulse).unwrap();
        assert_eq!(i.len(), 100);
        // t = 0: cos term only, scaled by the amplitude
        assert!((i[0] - 0.5).abs() < 1e-12);
        assert!(q[0].abs() < 1e-12);
        // a quarter period of the 10 MHz tone later the power is in q
        assert!(i[25].abs() < 1e-9);
        assert!((q[25] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_upload_tracks_waveform_memory() {
        let mut dummy = DummyInstrument::new("qcm0");
        dummy.connect().unwrap();
        let mut sequence = readout_sequence();
        sequence.add(Pulse::new(
            PulseKind::Drive,
            QubitId(0),
            ChannelId::from("d0"),
            0,
            40,
            0.5,
            5e9,
            0.0,
            Shape::Gaussian { rel_sigma: 5.0 },
        ));
        dummy
            .upload(&sequence, &ExecutionParameters::default().with_nshots(4), &[])
            .unwrap();
        assert_eq!(dummy.uploaded_waveform_samples(), Some(1040));
    }

    #[test]
    fn test_port_writes_recorded() {
        let mut dummy = DummyInstrument::new("qcm0");
        dummy.set_gain("o1", 1.0).unwrap();
        dummy.set_attenuation("o2", 30.0).unwrap();
        assert_eq!(dummy.port_writes().len(), 2);
        assert_eq!(dummy.port_writes()[0].operation, "gain");
        assert_eq!(dummy.port_writes()[1].port, "o2");
    }
}
