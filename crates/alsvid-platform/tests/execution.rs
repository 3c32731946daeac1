//! End-to-end execution through the dummy instruments.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use alsvid_adapter_dummy::register;
use alsvid_hal::InstrumentRegistry;
use alsvid_ir::{Circuit, QubitId};
use alsvid_platform::{ExecutionResult, Platform, PlatformError};
use alsvid_pulse::{AcquisitionType, AveragingMode, ExecutionParameters, PulseSequence};

use common::{connected_platform, test_channels, test_settings};

#[test]
fn execute_returns_iq_grid_per_readout_pulse() {
    let plays = Arc::new(AtomicUsize::new(0));
    let mut platform = connected_platform(plays.clone());

    let mut sequence = PulseSequence::new();
    let drive = platform.create_rx_pulse(0, 0, 0.0).unwrap();
    let readout = platform.create_mz_pulse(0, drive.finish()).unwrap();
    let serial = readout.serial();
    sequence.add(drive);
    sequence.add(readout);

    let options = ExecutionParameters::default().with_nshots(256);
    let results = platform.execute_pulse_sequence(&sequence, &options).unwrap();

    assert_eq!(results.len(), 1);
    match &results[&serial] {
        ExecutionResult::Iq(iq) => {
            assert_eq!(iq.num_bins(), 1);
            assert_eq!(iq.shots(), 256);
        }
        other => panic!("expected single-shot IQ results, got {other:?}"),
    }
    assert_eq!(common::executions(&plays), 1);
}

#[test]
fn discrimination_with_cyclic_averaging_yields_probabilities() {
    let plays = Arc::new(AtomicUsize::new(0));
    let mut platform = connected_platform(plays);

    let mut sequence = PulseSequence::new();
    let readout = platform.create_mz_pulse(0, 0).unwrap();
    let serial = readout.serial();
    sequence.add(readout);

    let options = ExecutionParameters::default()
        .with_nshots(128)
        .with_acquisition(AcquisitionType::Discrimination)
        .with_averaging(AveragingMode::Cyclic);
    let results = platform.execute_pulse_sequence(&sequence, &options).unwrap();

    match &results[&serial] {
        ExecutionResult::AveragedStates(states) => {
            assert_eq!(states.probabilities.len(), 1);
            let p = states.probabilities[0];
            assert!((0.0..=1.0).contains(&p), "probability out of range: {p}");
        }
        other => panic!("expected averaged states, got {other:?}"),
    }
}

#[test]
fn compile_walks_moments_with_virtual_phases() {
    let plays = Arc::new(AtomicUsize::new(0));
    let platform = connected_platform(plays);

    let (theta, phi, lambda) = (1.0, 0.5, 0.25);
    let mut circuit = Circuit::new(2);
    circuit.u3(theta, phi, lambda, QubitId(0)).unwrap();
    circuit.cz(QubitId(0), QubitId(1)).unwrap();
    circuit.m(&[QubitId(0), QubitId(1)]).unwrap();

    let compiled = platform.compile(&circuit).unwrap();
    let pulses = compiled.sequence.pulses();

    // two pi/2 drive pulses, one flux pulse, two readout pulses
    assert_eq!(pulses.len(), 5);
    let drives = compiled.sequence.qubit_pulses(QubitId(0));
    let first = &drives.pulses()[0];
    let second = &drives.pulses()[1];
    assert_eq!(first.start, 0);
    assert_eq!(second.start, first.finish());
    // RZ(λ) before the first pulse, RZ(θ) and the -π/2 trick before the second
    assert!((first.relative_phase - lambda).abs() < 1e-12);
    assert!((second.relative_phase - (lambda + theta - std::f64::consts::PI)).abs() < 1e-12);

    // the CZ flux pulse starts once both drive pulses are done
    let flux = compiled.sequence.channel_pulses(&"f0".into());
    assert_eq!(flux.pulses()[0].start, second.finish());

    // both readouts start together, after the flux pulse
    let readouts = compiled.sequence.readout_pulses();
    assert_eq!(readouts.len(), 2);
    assert_eq!(readouts.pulses()[0].start, readouts.pulses()[1].start);
    assert!(readouts.pulses()[0].start >= flux.pulses()[0].finish());

    // one measurement gate, two readout pulse ids recorded on it
    assert_eq!(compiled.measurements.len(), 1);
    assert_eq!(compiled.measurements[0].1.len(), 2);
}

#[test]
fn unsupported_gate_is_fatal() {
    let plays = Arc::new(AtomicUsize::new(0));
    let platform = connected_platform(plays);

    let mut circuit = Circuit::new(1);
    circuit.h(QubitId(0)).unwrap();
    let result = platform.compile(&circuit);
    assert!(matches!(result, Err(PlatformError::UnsupportedGate("h"))));
}

#[test]
fn multiplexed_lo_conflict_is_rejected() {
    // both qubits readout on ro0, with carriers 100 MHz apart but equal IFs:
    // the shared LO cannot serve both
    let mut settings = test_settings();
    if let Some(qubit) = settings.qubits.get_mut(&1) {
        qubit.readout = Some("ro0".into());
    }

    let mut registry = InstrumentRegistry::new();
    register(&mut registry);
    let mut platform = Platform::new(settings, test_channels(), &registry).unwrap();
    platform.connect().unwrap();

    let mut sequence = PulseSequence::new();
    sequence.add(platform.create_mz_pulse(0, 0).unwrap());
    sequence.add(platform.create_mz_pulse(1, 0).unwrap());

    let result = platform.execute_pulse_sequence(&sequence, &ExecutionParameters::default());
    assert!(matches!(
        result,
        Err(PlatformError::InconsistentLoFrequencies { .. })
    ));
}

#[test]
fn execute_requires_connection() {
    let mut registry = InstrumentRegistry::new();
    register(&mut registry);
    let mut platform = Platform::new(test_settings(), test_channels(), &registry).unwrap();

    let mut sequence = PulseSequence::new();
    sequence.add(platform.create_mz_pulse(0, 0).unwrap());
    let result = platform.execute_pulse_sequence(&sequence, &ExecutionParameters::default());
    assert!(matches!(result, Err(PlatformError::NotConnected(_))));
}

#[test]
fn transpiled_circuit_executes_end_to_end() {
    let plays = Arc::new(AtomicUsize::new(0));
    let mut platform = connected_platform(plays);

    // a non-native circuit: H and CNOT must be lowered before pulses
    let mut circuit = Circuit::new(2);
    circuit.h(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.m(&[QubitId(0), QubitId(1)]).unwrap();

    let connectivity = platform.settings().connectivity();
    let props = alsvid_compile::PropertySet::new()
        .with_target(connectivity, alsvid_compile::NativeGateSet::standard());
    let (pipeline, props) = alsvid_compile::Pipeline::standard(props);
    let (hardware, _layout) = pipeline.transpile(&circuit, props).unwrap();
    assert!(hardware.is_native());

    let compiled = platform.compile(&hardware).unwrap();
    let options = ExecutionParameters::default().with_nshots(64);
    let results = platform
        .execute_pulse_sequence(&compiled.sequence, &options)
        .unwrap();

    // one decoded result per measured qubit
    assert_eq!(results.len(), 2);
    for result in results.values() {
        match result {
            ExecutionResult::Iq(iq) => assert_eq!(iq.shots(), 64),
            other => panic!("expected IQ results, got {other:?}"),
        }
    }
}

#[test]
fn sequence_batches_execute_and_split_back() {
    let plays = Arc::new(AtomicUsize::new(0));
    let mut platform = connected_platform(plays);

    let mut sequences = vec![];
    for _ in 0..3 {
        let mut sequence = PulseSequence::new();
        sequence.add(platform.create_mz_pulse(0, 0).unwrap());
        sequences.push(sequence);
    }

    let options = ExecutionParameters::default().with_nshots(32);
    let outputs = platform.execute_pulse_sequences(&sequences, &options).unwrap();

    assert_eq!(outputs.len(), 3);
    for output in &outputs {
        assert_eq!(output.len(), 1);
    }
}
