//! Property tests for sequence batching.

use proptest::prelude::*;

use alsvid_ir::QubitId;
use alsvid_platform::{batch_max_duration, batch_max_readout, batch_max_sequences};
use alsvid_pulse::{ChannelId, Pulse, PulseKind, PulseSequence, Shape};

fn sequence_with(readouts: usize, drive_duration: u64) -> PulseSequence {
    let mut sequence = PulseSequence::new();
    if drive_duration > 0 {
        sequence.add(Pulse::new(
            PulseKind::Drive,
            QubitId(0),
            ChannelId::from("d0"),
            0,
            drive_duration,
            0.5,
            5e9,
            0.0,
            Shape::Rectangular,
        ));
    }
    for _ in 0..readouts {
        sequence.add(Pulse::new(
            PulseKind::Readout,
            QubitId(0),
            ChannelId::from("ro0"),
            drive_duration,
            1000,
            0.1,
            7e9,
            0.0,
            Shape::Rectangular,
        ));
    }
    sequence
}

proptest! {
    /// Concatenating the batches reproduces the input exactly: no
    /// reordering, no drops, no empty batches; every batch respects the
    /// bound unless it is a single oversized sequence.
    #[test]
    fn readout_batches_round_trip(
        counts in prop::collection::vec(0usize..6, 0..24),
        bound in 1usize..8,
    ) {
        let sequences: Vec<PulseSequence> =
            counts.iter().map(|&n| sequence_with(n, 40)).collect();
        let batches = batch_max_readout(&sequences, bound);

        let recovered: Vec<usize> = batches
            .iter()
            .flatten()
            .map(|s| s.readout_pulses().len())
            .collect();
        prop_assert_eq!(recovered, counts);

        for batch in &batches {
            prop_assert!(!batch.is_empty());
            let total: usize = batch.iter().map(|s| s.readout_pulses().len()).sum();
            prop_assert!(total <= bound || batch.len() == 1);
        }
    }

    #[test]
    fn size_batches_round_trip(
        len in 0usize..40,
        bound in 1usize..9,
    ) {
        let sequences: Vec<PulseSequence> =
            (0..len).map(|_| sequence_with(1, 40)).collect();
        let batches = batch_max_sequences(&sequences, bound);

        let recovered: usize = batches.iter().map(|b| b.len()).sum();
        prop_assert_eq!(recovered, len);
        for batch in &batches {
            prop_assert!(!batch.is_empty());
            prop_assert!(batch.len() <= bound);
        }
    }

    #[test]
    fn duration_batches_round_trip(
        durations in prop::collection::vec(1u64..400, 0..24),
        bound in 1u64..1000,
    ) {
        let sequences: Vec<PulseSequence> =
            durations.iter().map(|&d| sequence_with(1, d)).collect();
        let batches = batch_max_duration(&sequences, bound);

        let recovered: usize = batches.iter().map(|b| b.len()).sum();
        prop_assert_eq!(recovered, durations.len());

        for batch in &batches {
            prop_assert!(!batch.is_empty());
            let total: u64 = batch
                .iter()
                .map(|s| s.duration().saturating_sub(s.readout_pulses().duration()))
                .sum();
            prop_assert!(total <= bound || batch.len() == 1);
        }
    }
}
