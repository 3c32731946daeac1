//! Shared fixtures: a two-qubit platform wired to dummy instruments.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use alsvid_adapter_dummy::DummyInstrument;
use alsvid_hal::{Channel, Instrument, InstrumentConfig, InstrumentRegistry, InstrumentRole};
use alsvid_ir::QubitId;
use alsvid_platform::{
    CzElement, NativeGateTemplates, Platform, PlatformSettings, PulseTemplate, Qubit,
    SingleQubitNatives,
};
use alsvid_pulse::{ChannelId, Shape};

pub fn test_settings() -> PlatformSettings {
    let mut qubits = FxHashMap::default();
    for index in 0..2u32 {
        let mut qubit = Qubit::new(index);
        qubit.readout = Some(ChannelId(format!("ro{index}")));
        qubit.drive = Some(ChannelId(format!("d{index}")));
        qubit.flux = Some(ChannelId(format!("f{index}")));
        qubit.readout_frequency = 7.0e9 + f64::from(index) * 1e8;
        qubit.drive_frequency = 5.0e9 + f64::from(index) * 1e8;
        qubit.threshold = Some(0.0);
        qubits.insert(index, qubit);
    }

    let mut natives = NativeGateTemplates::new();
    for index in 0..2u32 {
        natives.insert_single(
            index,
            SingleQubitNatives {
                rx: PulseTemplate {
                    duration: 40,
                    amplitude: 0.5,
                    frequency: 5.0e9 + f64::from(index) * 1e8,
                    if_frequency: Some(200e6),
                    shape: Shape::Gaussian { rel_sigma: 5.0 },
                },
                mz: PulseTemplate {
                    duration: 2000,
                    amplitude: 0.1,
                    frequency: 7.0e9 + f64::from(index) * 1e8,
                    if_frequency: Some(100e6),
                    shape: Shape::Rectangular,
                },
            },
        );
    }
    natives.insert_cz(
        (0, 1),
        vec![
            CzElement::FluxPulse {
                qubit: QubitId(0),
                relative_start: 0,
                duration: 30,
                amplitude: 0.05,
                shape: Shape::Rectangular,
            },
            CzElement::VirtualZ {
                qubit: QubitId(0),
                phase: 0.3,
            },
            CzElement::VirtualZ {
                qubit: QubitId(1),
                phase: -0.2,
            },
        ],
    );

    PlatformSettings {
        name: "dummy-2q".into(),
        nqubits: 2,
        relaxation_time: 50_000,
        sampling_rate: 1e9,
        topology: vec![(0, 1)],
        qubits,
        couplers: FxHashMap::default(),
        natives,
        instruments: vec![
            InstrumentConfig::new("qcm0", "dummy").with_role(InstrumentRole::Control),
            InstrumentConfig::new("qrm0", "dummy").with_role(InstrumentRole::Readout),
        ],
    }
}

pub fn test_channels() -> Vec<Channel> {
    vec![
        Channel::new("d0").with_port("qcm0", "o1"),
        Channel::new("d1").with_port("qcm0", "o2"),
        Channel::new("f0").with_port("qcm0", "o3"),
        Channel::new("f1").with_port("qcm0", "o4"),
        Channel::new("ro0").with_port("qrm0", "o1"),
        Channel::new("ro1").with_port("qrm0", "o2"),
    ]
}

/// Build a connected platform. `plays` counts `play_sequence` calls across
/// both instruments, so one full execution pass adds two.
pub fn connected_platform(plays: Arc<AtomicUsize>) -> Platform {
    let mut registry = InstrumentRegistry::new();
    registry.register_factory("dummy", move |config| {
        let dummy = DummyInstrument::from_config(config).with_play_counter(plays.clone());
        Ok(Box::new(dummy) as Box<dyn Instrument>)
    });
    let mut platform =
        Platform::new(test_settings(), test_channels(), &registry).expect("platform builds");
    platform.connect().expect("dummy instruments connect");
    platform
}

/// Executions implied by the play counter (two instruments per pass).
pub fn executions(plays: &AtomicUsize) -> usize {
    plays.load(std::sync::atomic::Ordering::Relaxed) / 2
}
