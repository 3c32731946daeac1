//! Platform: instruments, channels, characterization and execution.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, instrument, warn};

use alsvid_hal::{
    Channel, Instrument, InstrumentConfig, InstrumentRegistry, InstrumentRole, SweepLimits,
};
use alsvid_ir::Circuit;
use alsvid_pulse::{
    AcquisitionType, AveragingMode, ChannelId, ExecutionParameters, Pulse, PulseId, PulseKind,
    PulseSequence, Sweeper,
};
use alsvid_result::{
    AveragedIqResults, AveragedStateResults, IqResults, StateResults,
};

use crate::compiler::{self, CompiledSequence};
use crate::error::{PlatformError, PlatformResult};
use crate::qubit::Qubit;
use crate::settings::{CalibrationUpdate, PlatformSettings};
use crate::sweep::{self, DeviceSetting};
use crate::unrolling::batch_max_readout;

/// Channel roles a qubit can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Readout pulse output.
    Readout,
    /// Acquisition feedback input.
    Feedback,
    /// Drive output.
    Drive,
    /// Flux bias output.
    Flux,
    /// TWPA pump.
    Twpa,
}

impl ChannelRole {
    fn label(self) -> &'static str {
        match self {
            ChannelRole::Readout => "readout",
            ChannelRole::Feedback => "feedback",
            ChannelRole::Drive => "drive",
            ChannelRole::Flux => "flux",
            ChannelRole::Twpa => "twpa",
        }
    }
}

/// A decoded measurement outcome for one readout pulse.
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// Per-shot integrated I/Q points.
    Iq(IqResults),
    /// Shot-averaged I/Q points.
    AveragedIq(AveragedIqResults),
    /// Per-shot discriminated states.
    States(StateResults),
    /// Shot-averaged state populations.
    AveragedStates(AveragedStateResults),
}

impl ExecutionResult {
    /// Merge the outcome of a later sweep chunk into this one, appending
    /// along the bin axis. Kinds must match.
    pub fn merge(self, other: ExecutionResult) -> PlatformResult<ExecutionResult> {
        use ExecutionResult::*;
        match (self, other) {
            (Iq(a), Iq(b)) => Ok(Iq(a.concat(&b)?)),
            (AveragedIq(a), AveragedIq(b)) => Ok(AveragedIq(a.concat(&b))),
            (States(a), States(b)) => Ok(States(a.concat(&b)?)),
            (AveragedStates(a), AveragedStates(b)) => Ok(AveragedStates(a.concat(&b))),
            _ => Err(PlatformError::MixedResultKinds),
        }
    }

    /// Total acquired samples, summed over bins and shots. Averaged
    /// containers count one sample per bin.
    pub fn num_samples(&self) -> usize {
        match self {
            ExecutionResult::Iq(r) => r.num_samples(),
            ExecutionResult::AveragedIq(r) => r.i.len(),
            ExecutionResult::States(r) => r.num_samples(),
            ExecutionResult::AveragedStates(r) => r.probabilities.len(),
        }
    }
}

/// The platform controlling one quantum device.
pub struct Platform {
    settings: PlatformSettings,
    channels: FxHashMap<ChannelId, Channel>,
    instruments: Vec<(InstrumentConfig, Box<dyn Instrument>)>,
    is_connected: bool,
}

impl Platform {
    /// Build a platform from a settings snapshot, its channel wiring and a
    /// driver registry.
    pub fn new(
        settings: PlatformSettings,
        channels: Vec<Channel>,
        registry: &InstrumentRegistry,
    ) -> PlatformResult<Self> {
        let mut instruments = Vec::with_capacity(settings.instruments.len());
        for config in &settings.instruments {
            let driver = registry.create(config)?;
            instruments.push((config.clone(), driver));
        }
        Ok(Self {
            settings,
            channels: channels.into_iter().map(|c| (c.name.clone(), c)).collect(),
            instruments,
            is_connected: false,
        })
    }

    /// Platform name.
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> &PlatformSettings {
        &self.settings
    }

    /// Whether `connect` has completed.
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Characterization record of a qubit.
    pub fn qubit(&self, qubit: u32) -> PlatformResult<&Qubit> {
        self.settings
            .qubits
            .get(&qubit)
            .ok_or(PlatformError::UnknownQubit(qubit))
    }

    /// Fold calibration updates into a new settings snapshot and swap it in.
    pub fn update(&mut self, updates: &[CalibrationUpdate]) -> PlatformResult<()> {
        self.settings = self.settings.apply_all(updates)?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connect to every instrument, in order.
    pub fn connect(&mut self) -> PlatformResult<()> {
        if self.is_connected {
            return Err(PlatformError::AlreadyConnected(self.settings.name.clone()));
        }
        for (config, driver) in &mut self.instruments {
            info!("connecting to instrument '{}'", config.name);
            driver.connect()?;
        }
        self.is_connected = true;
        Ok(())
    }

    /// Push calibration settings to every instrument.
    pub fn setup(&mut self) -> PlatformResult<()> {
        for (config, driver) in &mut self.instruments {
            driver.setup(&config.settings)?;
        }
        Ok(())
    }

    /// Stop all instruments.
    pub fn stop(&mut self) -> PlatformResult<()> {
        for (_, driver) in &mut self.instruments {
            driver.stop()?;
        }
        Ok(())
    }

    /// Best-effort stop of every instrument, for termination handlers.
    ///
    /// Errors are logged and swallowed so one refusing instrument cannot keep
    /// the others running. An acquisition blocked inside a driver cannot be
    /// interrupted from here.
    pub fn emergency_stop(&mut self) {
        for (config, driver) in &mut self.instruments {
            if let Err(error) = driver.stop() {
                warn!("emergency stop of '{}' failed: {}", config.name, error);
            }
        }
    }

    /// Disconnect from every instrument.
    pub fn disconnect(&mut self) -> PlatformResult<()> {
        for (_, driver) in &mut self.instruments {
            driver.disconnect()?;
        }
        self.is_connected = false;
        Ok(())
    }

    // =========================================================================
    // Wiring lookups
    // =========================================================================

    /// Device limits aggregated over all control/readout instruments: the
    /// tightest bound wins, real-time amplitude needs unanimous support.
    pub fn sweep_limits(&self) -> SweepLimits {
        let mut aggregate = SweepLimits::default();
        for (config, driver) in &self.instruments {
            if !(config.has_role(InstrumentRole::Control)
                || config.has_role(InstrumentRole::Readout))
            {
                continue;
            }
            let limits = driver.limits();
            aggregate.max_bins = aggregate.max_bins.min(limits.max_bins);
            aggregate.max_waveform_samples = aggregate
                .max_waveform_samples
                .min(limits.max_waveform_samples);
            aggregate.max_readout_pulses =
                aggregate.max_readout_pulses.min(limits.max_readout_pulses);
            aggregate.max_batch_sequences =
                aggregate.max_batch_sequences.min(limits.max_batch_sequences);
            aggregate.supports_rt_amplitude &= limits.supports_rt_amplitude;
        }
        aggregate
    }

    fn channel(&self, id: &ChannelId) -> PlatformResult<&Channel> {
        self.channels
            .get(id)
            .ok_or_else(|| PlatformError::UnknownChannel(id.0.clone()))
    }

    /// Channel of a qubit for a role.
    pub fn qubit_channel(&self, qubit: u32, role: ChannelRole) -> PlatformResult<&ChannelId> {
        let record = self.qubit(qubit)?;
        let channel = match role {
            ChannelRole::Readout => record.readout.as_ref(),
            ChannelRole::Feedback => record.feedback.as_ref(),
            ChannelRole::Drive => record.drive.as_ref(),
            ChannelRole::Flux => record.flux.as_ref(),
            ChannelRole::Twpa => record.twpa.as_ref(),
        };
        channel.ok_or(PlatformError::MissingChannel {
            qubit,
            role: role.label(),
        })
    }

    fn instrument_mut(&mut self, name: &str) -> Option<&mut Box<dyn Instrument>> {
        self.instruments
            .iter_mut()
            .find(|(config, _)| config.name == name)
            .map(|(_, driver)| driver)
    }

    /// (instrument, port) wiring of a channel.
    fn channel_wiring(&self, id: &ChannelId) -> PlatformResult<(String, String)> {
        let channel = self.channel(id)?;
        match (&channel.instrument, &channel.port) {
            (Some(instrument), Some(port)) => Ok((instrument.clone(), port.clone())),
            _ => Err(PlatformError::UnknownChannel(format!(
                "{} (not wired to an instrument port)",
                id.0
            ))),
        }
    }

    /// Write an LO frequency, skipping the device round-trip when the cached
    /// value already matches.
    pub(crate) fn write_lo(&mut self, id: &ChannelId, frequency: f64) -> PlatformResult<()> {
        let channel = self.channel(id)?;
        if let Some(lo) = channel.local_oscillator.clone() {
            if !lo.set_frequency(frequency) {
                return Ok(()); // unchanged, skip the redundant write
            }
        }
        let wiring = match (&channel.instrument, &channel.port) {
            (Some(instrument), Some(port)) => Some((instrument.clone(), port.clone())),
            _ => None,
        };
        if let Some((instrument, port)) = wiring {
            if let Some(driver) = self.instrument_mut(&instrument) {
                driver.set_lo_frequency(&port, frequency)?;
            }
        }
        Ok(())
    }

    /// Current LO frequency serving a pulse, falling back to
    /// `pulse frequency − template IF` when nothing has been written yet.
    pub(crate) fn current_lo_for_pulse(&self, pulse: &Pulse) -> PlatformResult<f64> {
        let channel = self.channel(&pulse.channel)?;
        if let Some(lo) = &channel.local_oscillator {
            if let Some(frequency) = lo.frequency() {
                return Ok(frequency);
            }
        }
        Ok(pulse.frequency - self.template_if(pulse).unwrap_or(0.0))
    }

    fn template_if(&self, pulse: &Pulse) -> Option<f64> {
        let natives = self.settings.natives.single(pulse.qubit.0)?;
        match pulse.kind {
            PulseKind::Readout => natives.mz.if_frequency,
            PulseKind::Drive => natives.rx.if_frequency,
            PulseKind::Flux | PulseKind::CouplerFlux => None,
        }
    }

    pub(crate) fn apply_device_setting(&mut self, setting: &DeviceSetting) -> PlatformResult<()> {
        match setting {
            DeviceSetting::Attenuation { qubit, value } => {
                let channel = self.qubit_channel(*qubit, ChannelRole::Readout)?.clone();
                let (instrument, port) = self.channel_wiring(&channel)?;
                if let Some(driver) = self.instrument_mut(&instrument) {
                    driver.set_attenuation(&port, *value)?;
                }
                Ok(())
            }
            DeviceSetting::LoFrequency { channel, value } => self.write_lo(channel, *value),
            DeviceSetting::ExternalGain { channel, value } => {
                let (instrument, port) = self.channel_wiring(channel)?;
                if let Some(driver) = self.instrument_mut(&instrument) {
                    driver.set_gain(&port, *value)?;
                }
                Ok(())
            }
        }
    }

    // =========================================================================
    // Pulse factories
    // =========================================================================

    fn single_natives(&self, qubit: u32) -> PlatformResult<&crate::natives::SingleQubitNatives> {
        self.settings
            .natives
            .single(qubit)
            .ok_or(PlatformError::UnknownQubit(qubit))
    }

    /// Calibrated RX pi pulse.
    pub fn create_rx_pulse(
        &self,
        qubit: u32,
        start: u64,
        relative_phase: f64,
    ) -> PlatformResult<Pulse> {
        let template = &self.single_natives(qubit)?.rx;
        let channel = self.qubit_channel(qubit, ChannelRole::Drive)?.clone();
        Ok(Pulse::new(
            PulseKind::Drive,
            alsvid_ir::QubitId(qubit),
            channel,
            start,
            template.duration,
            template.amplitude,
            template.frequency,
            relative_phase,
            template.shape.clone(),
        ))
    }

    /// Calibrated RX pi/2 pulse: the pi pulse at half amplitude.
    pub fn create_rx90_pulse(
        &self,
        qubit: u32,
        start: u64,
        relative_phase: f64,
    ) -> PlatformResult<Pulse> {
        let mut pulse = self.create_rx_pulse(qubit, start, relative_phase)?;
        pulse.amplitude /= 2.0;
        Ok(pulse)
    }

    /// Drive pulse with the calibrated carrier but a caller-chosen duration.
    pub fn create_qubit_drive_pulse(
        &self,
        qubit: u32,
        start: u64,
        duration: u64,
        relative_phase: f64,
    ) -> PlatformResult<Pulse> {
        let mut pulse = self.create_rx_pulse(qubit, start, relative_phase)?;
        pulse.duration = duration;
        Ok(pulse)
    }

    /// Calibrated measurement pulse.
    pub fn create_mz_pulse(&self, qubit: u32, start: u64) -> PlatformResult<Pulse> {
        let template = &self.single_natives(qubit)?.mz;
        let channel = self.qubit_channel(qubit, ChannelRole::Readout)?.clone();
        Ok(Pulse::new(
            PulseKind::Readout,
            alsvid_ir::QubitId(qubit),
            channel,
            start,
            template.duration,
            template.amplitude,
            template.frequency,
            0.0,
            template.shape.clone(),
        ))
    }

    /// Alias for [`Platform::create_mz_pulse`].
    pub fn create_qubit_readout_pulse(&self, qubit: u32, start: u64) -> PlatformResult<Pulse> {
        self.create_mz_pulse(qubit, start)
    }

    /// Calibrated CZ template for a qubit pair, with template-relative start
    /// times, plus the virtual-Z phases it imprints.
    ///
    /// A fresh sequence and phase accumulator are built per call; symmetric
    /// templates resolve for both pair orderings.
    pub fn create_cz_sequence(
        &self,
        a: u32,
        b: u32,
    ) -> PlatformResult<(PulseSequence, FxHashMap<u32, f64>)> {
        let elements = self
            .settings
            .natives
            .cz(a, b)
            .ok_or(PlatformError::MissingCzCalibration { a, b })?
            .clone();

        let mut sequence = PulseSequence::new();
        let mut phases: FxHashMap<u32, f64> = FxHashMap::default();
        for element in elements {
            match element {
                crate::natives::CzElement::FluxPulse {
                    qubit,
                    relative_start,
                    duration,
                    amplitude,
                    shape,
                } => {
                    let channel = self.qubit_channel(qubit.0, ChannelRole::Flux)?.clone();
                    sequence.add(Pulse::new(
                        PulseKind::Flux,
                        qubit,
                        channel,
                        relative_start,
                        duration,
                        amplitude,
                        0.0,
                        0.0,
                        shape,
                    ));
                }
                crate::natives::CzElement::VirtualZ { qubit, phase } => {
                    *phases.entry(qubit.0).or_insert(0.0) += phase;
                }
            }
        }
        Ok((sequence, phases))
    }

    /// Compile a transpiled (native-gate) circuit into a pulse sequence.
    pub fn compile(&self, circuit: &Circuit) -> PlatformResult<CompiledSequence> {
        compiler::compile(self, circuit)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Execute a pulse sequence and decode the acquisitions.
    ///
    /// Results are keyed by readout pulse serial.
    #[instrument(skip(self, sequence, options), fields(pulses = sequence.len()))]
    pub fn execute_pulse_sequence(
        &mut self,
        sequence: &PulseSequence,
        options: &ExecutionParameters,
    ) -> PlatformResult<FxHashMap<String, ExecutionResult>> {
        let by_id = self.execute_internal(sequence, options, &[], &[])?;
        Ok(rekey_by_serial(sequence, by_id))
    }

    /// Execute a batch of independent sequences, bounded by the readout
    /// memory of the instruments: sequences are merged back to back with
    /// relaxation padding, executed per batch, and the results are split per
    /// input sequence again.
    pub fn execute_pulse_sequences(
        &mut self,
        sequences: &[PulseSequence],
        options: &ExecutionParameters,
    ) -> PlatformResult<Vec<FxHashMap<String, ExecutionResult>>> {
        let relaxation = options
            .relaxation_time
            .unwrap_or(self.settings.relaxation_time);
        let limits = self.sweep_limits();
        let mut outputs: Vec<FxHashMap<String, ExecutionResult>> = vec![];

        for batch in batch_max_readout(sequences, limits.max_readout_pulses) {
            // merge the batch into one timeline with relaxation gaps
            let mut merged = PulseSequence::new();
            let mut offset = 0;
            for sequence in &batch {
                for pulse in sequence.pulses() {
                    let mut shifted = pulse.clone();
                    shifted.start += offset;
                    merged.add(shifted);
                }
                offset = merged.finish() + relaxation;
            }

            let mut by_id = self.execute_internal(&merged, options, &[], &[])?;
            for sequence in &batch {
                let mut per_sequence = FxHashMap::default();
                for pulse in sequence.readout_pulses().pulses() {
                    let result = by_id.remove(&pulse.id()).ok_or_else(|| {
                        PlatformError::MissingAcquisition(pulse.serial())
                    })?;
                    per_sequence.insert(pulse.serial(), result);
                }
                outputs.push(per_sequence);
            }
        }
        Ok(outputs)
    }

    /// Execute a sweep. See the [`sweep`](crate::sweep) module for the
    /// decomposition rules.
    pub fn sweep(
        &mut self,
        sequence: &PulseSequence,
        options: &ExecutionParameters,
        sweepers: &[Sweeper],
    ) -> PlatformResult<FxHashMap<String, ExecutionResult>> {
        sweep::sweep(self, sequence, options, sweepers)
    }

    /// One full upload→play→acquire pass, with real-time sweepers attached
    /// and device overrides applied. Results are keyed by pulse id.
    pub(crate) fn execute_internal(
        &mut self,
        sequence: &PulseSequence,
        options: &ExecutionParameters,
        sweepers: &[Sweeper],
        overrides: &[DeviceSetting],
    ) -> PlatformResult<FxHashMap<PulseId, ExecutionResult>> {
        if !self.is_connected {
            return Err(PlatformError::NotConnected(self.settings.name.clone()));
        }

        // drivers see a resolved relaxation time; the repetition span they
        // program is sequence.finish() + relaxation
        let mut options = options.clone();
        if options.relaxation_time.is_none() {
            options.relaxation_time = Some(self.settings.relaxation_time);
        }
        let options = &options;

        self.stage_los(sequence, overrides)?;
        for setting in overrides {
            self.apply_device_setting(setting)?;
        }

        // partition the sequence per instrument
        let mut parts: Vec<(usize, PulseSequence)> = vec![];
        let mut covered: FxHashSet<ChannelId> = FxHashSet::default();
        for (index, (config, _)) in self.instruments.iter().enumerate() {
            if !(config.has_role(InstrumentRole::Control)
                || config.has_role(InstrumentRole::Readout))
            {
                continue;
            }
            let channels: Vec<ChannelId> = self
                .channels
                .values()
                .filter(|c| c.instrument.as_deref() == Some(config.name.as_str()))
                .map(|c| c.name.clone())
                .collect();
            covered.extend(channels.iter().cloned());
            parts.push((index, sequence.channels_pulses(&channels)));
        }
        for pulse in sequence.pulses() {
            if !covered.contains(&pulse.channel) {
                warn!(
                    "pulse {} plays on channel '{}' which no instrument drives",
                    pulse.serial(),
                    pulse.channel
                );
            }
        }

        // strict barrier: upload everywhere, then play everywhere, then acquire
        for (index, part) in &parts {
            let (config, driver) = &mut self.instruments[*index];
            debug!("uploading {} pulses to '{}'", part.len(), config.name);
            driver.upload(part, options, sweepers)?;
        }
        for (index, _) in &parts {
            let (_, driver) = &mut self.instruments[*index];
            driver.play_sequence()?;
        }
        let mut acquired = FxHashMap::default();
        for (index, part) in &parts {
            let (config, driver) = &mut self.instruments[*index];
            if !config.has_role(InstrumentRole::Readout) {
                continue;
            }
            if part.readout_pulses().is_empty() {
                continue;
            }
            for (id, raw) in driver.acquire()? {
                acquired.insert(id, raw);
            }
        }

        // decode
        let mut results = FxHashMap::default();
        for pulse in sequence.readout_pulses().pulses() {
            let raw = acquired
                .remove(&pulse.id())
                .ok_or_else(|| PlatformError::MissingAcquisition(pulse.serial()))?;
            let shots = options.nshots as usize;
            let decoded = match options.acquisition_type {
                AcquisitionType::Discrimination => {
                    let states = StateResults::new(raw.states, shots)?;
                    match options.averaging_mode {
                        AveragingMode::Cyclic => ExecutionResult::AveragedStates(states.average()),
                        AveragingMode::Singleshot => ExecutionResult::States(states),
                    }
                }
                AcquisitionType::Raw
                | AcquisitionType::Integration
                | AcquisitionType::Spectroscopy => {
                    let iq = IqResults::new(raw.i, raw.q, shots)?;
                    match options.averaging_mode {
                        AveragingMode::Cyclic => ExecutionResult::AveragedIq(iq.average()),
                        AveragingMode::Singleshot => ExecutionResult::Iq(iq),
                    }
                }
            };
            results.insert(pulse.id(), decoded);
        }
        Ok(results)
    }

    /// Derive and write the LO frequency of every channel used by the
    /// sequence from the pulse carriers and template IFs. Multiplexed pulses
    /// sharing one channel must agree on the LO target.
    fn stage_los(
        &mut self,
        sequence: &PulseSequence,
        overrides: &[DeviceSetting],
    ) -> PlatformResult<()> {
        let overridden: FxHashSet<&ChannelId> = overrides
            .iter()
            .filter_map(|s| match s {
                DeviceSetting::LoFrequency { channel, .. } => Some(channel),
                _ => None,
            })
            .collect();

        let mut writes: Vec<(ChannelId, f64)> = vec![];
        for (id, _) in &self.channels {
            if overridden.contains(id) {
                continue;
            }
            let pulses = sequence.channel_pulses(id);
            let mut targets: Vec<f64> = vec![];
            for pulse in pulses.pulses() {
                if let Some(if_frequency) = self.template_if(pulse) {
                    targets.push(pulse.frequency - if_frequency);
                }
            }
            let Some(&first) = targets.first() else {
                continue;
            };
            if targets.iter().any(|t| (t - first).abs() > 1.0) {
                return Err(PlatformError::InconsistentLoFrequencies {
                    channel: id.0.clone(),
                    targets,
                });
            }
            writes.push((id.clone(), first));
        }
        for (id, frequency) in writes {
            self.write_lo(&id, frequency)?;
        }
        Ok(())
    }
}

/// Re-key a per-pulse-id result map by the original pulse serials.
pub(crate) fn rekey_by_serial(
    sequence: &PulseSequence,
    mut by_id: FxHashMap<PulseId, ExecutionResult>,
) -> FxHashMap<String, ExecutionResult> {
    let mut out = FxHashMap::default();
    for pulse in sequence.readout_pulses().pulses() {
        if let Some(result) = by_id.remove(&pulse.id()) {
            out.insert(pulse.serial(), result);
        }
    }
    out
}
