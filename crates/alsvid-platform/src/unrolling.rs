//! Sequence batching for unrolled execution.
//!
//! Splits a list of independent sequences into batches an instrument can
//! take in one upload. Each function is a greedy one-pass packing in
//! insertion order: no sequence is ever split across batches, no batch is
//! ever empty, and a single sequence exceeding the bound on its own forms a
//! batch of one.

use alsvid_pulse::PulseSequence;

/// Batches with at most `max_size` sequences each.
pub fn batch_max_sequences(
    sequences: &[PulseSequence],
    max_size: usize,
) -> Vec<Vec<&PulseSequence>> {
    sequences
        .chunks(max_size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Batches bounded by the summed non-readout duration, a proxy for the
/// control waveform memory the batch will need.
pub fn batch_max_duration(
    sequences: &[PulseSequence],
    max_duration: u64,
) -> Vec<Vec<&PulseSequence>> {
    batch_by(sequences, max_duration, |sequence| {
        sequence
            .duration()
            .saturating_sub(sequence.readout_pulses().duration())
    })
}

/// Batches with at most `max_measurements` readout pulses each.
pub fn batch_max_readout(
    sequences: &[PulseSequence],
    max_measurements: usize,
) -> Vec<Vec<&PulseSequence>> {
    batch_by(sequences, max_measurements as u64, |sequence| {
        sequence.readout_pulses().len() as u64
    })
}

fn batch_by(
    sequences: &[PulseSequence],
    bound: u64,
    weight: impl Fn(&PulseSequence) -> u64,
) -> Vec<Vec<&PulseSequence>> {
    let mut batches: Vec<Vec<&PulseSequence>> = vec![];
    let mut current: Vec<&PulseSequence> = vec![];
    let mut load: u64 = 0;
    for sequence in sequences {
        let cost = weight(sequence);
        if !current.is_empty() && load + cost > bound {
            batches.push(std::mem::take(&mut current));
            load = 0;
        }
        current.push(sequence);
        load += cost;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
