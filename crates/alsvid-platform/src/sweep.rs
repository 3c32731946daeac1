//! Sweep execution: decomposition of parameter sweeps into hardware passes.
//!
//! A sweeper list is processed outermost-first through an explicit work
//! queue, never recursion, so pathological shot/sweep combinations cannot
//! exhaust the stack. Each frame carries the device settings staged by its
//! enclosing for-loop levels, the shot count of its chunk and the sweepers
//! still to resolve:
//!
//! - **near-time** parameters (attenuation, LO frequency) expand into one
//!   child frame per value, each carrying the port/LO write to apply before
//!   executing;
//! - **real-time** parameters ride inside a single upload, subject to the
//!   device bin memory: `nshots × ∏ len(values)` must stay below the limit,
//!   otherwise the shot count or the outermost value range is chunked;
//! - relative-phase ranges that wrap in phase-code space are split into
//!   monotonic sub-sweeps, because the device phase representation cannot
//!   wrap within one sweep.
//!
//! Per-pulse results start as `None` and later chunks are folded in with a
//! pure concatenating reducer; nothing is averaged here.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::f64::consts::TAU;
use tracing::{debug, instrument};

use alsvid_pulse::{
    ChannelId, ExecutionParameters, Parameter, PulseId, PulseSequence, Sweeper,
};

use crate::error::{PlatformError, PlatformResult};
use crate::platform::{ExecutionResult, Platform, rekey_by_serial};

/// A device parameter write staged by a for-loop sweep level.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DeviceSetting {
    /// Readout attenuation of a qubit's port, dB.
    Attenuation {
        /// Qubit index.
        qubit: u32,
        /// Attenuation value.
        value: f64,
    },
    /// Absolute LO frequency of a channel, Hz.
    LoFrequency {
        /// Channel whose LO moves.
        channel: ChannelId,
        /// Target frequency.
        value: f64,
    },
    /// External sequencer gain of a channel's port.
    ExternalGain {
        /// Channel whose port gain is set.
        channel: ChannelId,
        /// Gain value.
        value: f64,
    },
}

/// One unit of pending sweep work.
#[derive(Debug, Clone)]
struct SweepFrame {
    settings: Vec<DeviceSetting>,
    nshots: u32,
    sweepers: Vec<Sweeper>,
}

/// Execute `sequence` for every combination of sweeper values.
///
/// The sequence is copied before any sweep staging mutates pulse parameters;
/// results stay keyed by the identity of the original readout pulses and are
/// returned keyed by their serials.
#[instrument(skip_all, fields(sweepers = sweepers.len()))]
pub(crate) fn sweep(
    platform: &mut Platform,
    sequence: &PulseSequence,
    options: &ExecutionParameters,
    sweepers: &[Sweeper],
) -> PlatformResult<FxHashMap<String, ExecutionResult>> {
    let mut sequence = sequence.clone();

    for sweeper in sweepers {
        for id in sweeper.pulse_targets() {
            if !sequence.contains(*id) {
                return Err(PlatformError::SweeperPulseMissing(*id));
            }
        }
    }

    // outermost-first processing order. The caller-facing convention puts the
    // innermost sweeper first, so the list is reversed — except for the
    // attenuation-then-frequency pairing (punchout), which is kept as given.
    let mut ordered: Vec<Sweeper> = sweepers.to_vec();
    let punchout_order = ordered.windows(2).any(|pair| {
        pair[0].parameter == Parameter::Attenuation && pair[1].parameter == Parameter::Frequency
    });
    if !punchout_order {
        ordered.reverse();
    }

    // pre-sweep staging
    let limits = platform.sweep_limits();
    let mut staged: Vec<Sweeper> = Vec::with_capacity(ordered.len());
    let mut root_settings: Vec<DeviceSetting> = vec![];
    for sweeper in ordered {
        match sweeper.parameter {
            Parameter::Gain => {
                // only the internal (real-time) gain may vary
                stage_external_gain(&sequence, &sweeper, &mut root_settings)?;
                staged.push(sweeper);
            }
            Parameter::Amplitude if !limits.supports_rt_amplitude => {
                // no real-time amplitude on this hardware: sweep the gain
                // instead, with the pulse amplitude forced to one
                for id in sweeper.pulse_targets() {
                    if let Some(pulse) = sequence.pulse_mut(*id) {
                        pulse.amplitude = 1.0;
                    }
                }
                stage_external_gain(&sequence, &sweeper, &mut root_settings)?;
                let mut as_gain = sweeper;
                as_gain.parameter = Parameter::Gain;
                staged.push(as_gain);
            }
            _ => staged.push(sweeper),
        }
    }

    let readouts = sequence.readout_pulses();
    let mut results: FxHashMap<PulseId, Option<ExecutionResult>> = readouts
        .pulses()
        .iter()
        .map(|p| (p.id(), None))
        .collect();

    let mut queue: VecDeque<SweepFrame> = VecDeque::new();
    queue.push_back(SweepFrame {
        settings: root_settings,
        nshots: options.nshots,
        sweepers: staged,
    });
    while let Some(frame) = queue.pop_front() {
        process_frame(platform, &sequence, options, frame, &mut queue, &mut results)?;
    }

    let by_id = results
        .into_iter()
        .filter_map(|(id, result)| result.map(|r| (id, r)))
        .collect();
    Ok(rekey_by_serial(&sequence, by_id))
}

fn stage_external_gain(
    sequence: &PulseSequence,
    sweeper: &Sweeper,
    settings: &mut Vec<DeviceSetting>,
) -> PlatformResult<()> {
    for id in sweeper.pulse_targets() {
        let pulse = sequence
            .pulse(*id)
            .ok_or(PlatformError::SweeperPulseMissing(*id))?;
        let setting = DeviceSetting::ExternalGain {
            channel: pulse.channel.clone(),
            value: 1.0,
        };
        if !settings.contains(&setting) {
            settings.push(setting);
        }
    }
    Ok(())
}

/// Phase code of a relative-phase value: the fraction of a turn in [0, 1),
/// the representation the sequencer phase registers use.
fn phase_code(value: f64) -> f64 {
    value.rem_euclid(TAU) / TAU
}

fn process_frame(
    platform: &mut Platform,
    sequence: &PulseSequence,
    options: &ExecutionParameters,
    frame: SweepFrame,
    queue: &mut VecDeque<SweepFrame>,
    results: &mut FxHashMap<PulseId, Option<ExecutionResult>>,
) -> PlatformResult<()> {
    let SweepFrame {
        settings,
        nshots,
        sweepers,
    } = frame;

    // innermost level below a for-loop sweeper: one plain execution
    if sweepers.is_empty() {
        let chunk_options = options.clone().with_nshots(nshots);
        let outcome = platform.execute_internal(sequence, &chunk_options, &[], &settings)?;
        return accumulate(results, outcome);
    }

    let first = &sweepers[0];

    if first.parameter.is_near_time() {
        expand_near_time(platform, sequence, &settings, nshots, &sweepers, queue)?;
        return Ok(());
    }

    // a for-loop-only parameter below a real-time one cannot be executed;
    // the caller must reorder the sweepers
    if let Some(bad) = sweepers.iter().find(|s| !s.parameter.is_realtime()) {
        return Err(PlatformError::ForLoopInsideRealtime(bad.parameter));
    }

    // phase sweeps must not wrap within one hardware sweep
    if first.parameter == Parameter::RelativePhase {
        let codes: Vec<f64> = first.values.iter().map(|v| phase_code(*v)).collect();
        if codes.windows(2).any(|pair| pair[1] < pair[0]) {
            let mut start = 0;
            for index in 0..codes.len() {
                let cut = index + 1 == codes.len() || codes[index + 1] < codes[index];
                if cut {
                    let mut segment = sweepers.clone();
                    segment[0] = first.truncated(start..index + 1);
                    queue.push_back(SweepFrame {
                        settings: settings.clone(),
                        nshots,
                        sweepers: segment,
                    });
                    start = index + 1;
                }
            }
            debug!("relative-phase sweep split at phase-code wrap points");
            return Ok(());
        }
    }

    let max_bins = platform.sweep_limits().max_bins as u64;
    let product: u64 = sweepers.iter().map(|s| s.values.len() as u64).product();
    let bins = u64::from(nshots) * product;

    if bins < max_bins {
        let chunk_options = options.clone().with_nshots(nshots);
        let outcome = platform.execute_internal(sequence, &chunk_options, &sweepers, &settings)?;
        accumulate(results, outcome)
    } else if product < max_bins {
        // the sweep itself fits: chunk the shots
        let max_rt_nshots = (max_bins / product) as u32;
        let mut remaining = nshots;
        debug!(
            "splitting {} shots into chunks of {} ({} bins per value set)",
            nshots, max_rt_nshots, product
        );
        while remaining > 0 {
            let chunk = remaining.min(max_rt_nshots);
            queue.push_back(SweepFrame {
                settings: settings.clone(),
                nshots: chunk,
                sweepers: sweepers.clone(),
            });
            remaining -= chunk;
        }
        Ok(())
    } else {
        // even one shot over the full value grid overflows the device:
        // chunk the outermost value range and iterate once per shot
        let rest_product: u64 = sweepers[1..]
            .iter()
            .map(|s| s.values.len() as u64)
            .product();
        if rest_product >= max_bins {
            return Err(PlatformError::SweepTooLarge {
                bins: product as usize,
                limit: max_bins as usize,
            });
        }
        let max_rt_iterations = (max_bins / rest_product) as usize;
        debug!(
            "splitting outer sweeper into ranges of {} values, once per shot",
            max_rt_iterations
        );
        for _ in 0..nshots {
            let mut from = 0;
            while from < first.values.len() {
                let to = (from + max_rt_iterations).min(first.values.len());
                let mut chunk = sweepers.clone();
                chunk[0] = first.truncated(from..to);
                queue.push_back(SweepFrame {
                    settings: settings.clone(),
                    nshots: 1,
                    sweepers: chunk,
                });
                from = to;
            }
        }
        Ok(())
    }
}

/// Expand a for-loop sweeper into one child frame per value.
fn expand_near_time(
    platform: &mut Platform,
    sequence: &PulseSequence,
    settings: &[DeviceSetting],
    nshots: u32,
    sweepers: &[Sweeper],
    queue: &mut VecDeque<SweepFrame>,
) -> PlatformResult<()> {
    let first = &sweepers[0];
    let rest = &sweepers[1..];

    match first.parameter {
        Parameter::Attenuation => {
            for &value in &first.values {
                let mut child = settings.to_vec();
                for qubit in first.qubit_targets() {
                    child.push(DeviceSetting::Attenuation {
                        qubit: qubit.0,
                        value,
                    });
                }
                queue.push_back(SweepFrame {
                    settings: child,
                    nshots,
                    sweepers: rest.to_vec(),
                });
            }
        }
        Parameter::LoFrequency => {
            // values are offsets from the LO frequency currently serving
            // each target pulse, read once when the level is expanded
            let mut initial: Vec<(ChannelId, f64)> = vec![];
            for id in first.pulse_targets() {
                let pulse = sequence
                    .pulse(*id)
                    .ok_or(PlatformError::SweeperPulseMissing(*id))?;
                let lo = platform.current_lo_for_pulse(pulse)?;
                initial.push((pulse.channel.clone(), lo));
            }
            for &value in &first.values {
                let mut child = settings.to_vec();
                for (channel, lo) in &initial {
                    child.push(DeviceSetting::LoFrequency {
                        channel: channel.clone(),
                        value: lo + value,
                    });
                }
                queue.push_back(SweepFrame {
                    settings: child,
                    nshots,
                    sweepers: rest.to_vec(),
                });
            }
        }
        _ => unreachable!("only near-time parameters reach this expansion"),
    }
    Ok(())
}

/// Fold a chunk outcome into the running results: `None` takes the value,
/// anything else concatenates.
fn accumulate(
    results: &mut FxHashMap<PulseId, Option<ExecutionResult>>,
    outcome: FxHashMap<PulseId, ExecutionResult>,
) -> PlatformResult<()> {
    for (id, new) in outcome {
        let slot = results.entry(id).or_insert(None);
        let merged = match slot.take() {
            None => new,
            Some(previous) => previous.merge(new)?,
        };
        *slot = Some(merged);
    }
    Ok(())
}
