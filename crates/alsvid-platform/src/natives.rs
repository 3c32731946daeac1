//! Native-gate pulse templates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use alsvid_ir::QubitId;
use alsvid_pulse::Shape;

/// Calibrated parameters of one native single-qubit pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseTemplate {
    /// Pulse duration in ns.
    pub duration: u64,
    /// Pulse amplitude.
    pub amplitude: f64,
    /// Carrier frequency in Hz.
    pub frequency: f64,
    /// Intermediate frequency in Hz, used to derive the LO target
    /// (`lo = frequency - if_frequency`).
    #[serde(default)]
    pub if_frequency: Option<f64>,
    /// Envelope shape.
    pub shape: Shape,
}

/// Native pulse templates of one qubit: the RX pi pulse and the MZ readout
/// pulse. RX90 is derived by halving the RX amplitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleQubitNatives {
    /// Calibrated RX pi pulse.
    pub rx: PulseTemplate,
    /// Calibrated measurement pulse.
    pub mz: PulseTemplate,
}

/// One element of a calibrated two-qubit gate template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CzElement {
    /// A flux pulse on one of the qubits (or the coupler between them).
    FluxPulse {
        /// Qubit the flux pulse lands on.
        qubit: QubitId,
        /// Start offset within the template, in ns.
        relative_start: u64,
        /// Duration in ns.
        duration: u64,
        /// Amplitude.
        amplitude: f64,
        /// Envelope shape.
        shape: Shape,
    },
    /// A software-only phase correction on one qubit.
    VirtualZ {
        /// Qubit whose frame advances.
        qubit: QubitId,
        /// Phase in rad.
        phase: f64,
    },
}

/// All calibrated native-gate templates of a platform.
///
/// CZ templates are stored per ordered pair; a symmetric template registered
/// once applies to both orderings through the lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeGateTemplates {
    single: FxHashMap<u32, SingleQubitNatives>,
    two: FxHashMap<(u32, u32), Vec<CzElement>>,
}

impl NativeGateTemplates {
    /// Create an empty template table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single-qubit templates of a qubit.
    pub fn insert_single(&mut self, qubit: u32, natives: SingleQubitNatives) {
        self.single.insert(qubit, natives);
    }

    /// Register a CZ template for a qubit pair.
    pub fn insert_cz(&mut self, pair: (u32, u32), elements: Vec<CzElement>) {
        self.two.insert(pair, elements);
    }

    /// Single-qubit templates of a qubit.
    pub fn single(&self, qubit: u32) -> Option<&SingleQubitNatives> {
        self.single.get(&qubit)
    }

    /// Mutable single-qubit templates, used by calibration updates.
    pub fn single_mut(&mut self, qubit: u32) -> Option<&mut SingleQubitNatives> {
        self.single.get_mut(&qubit)
    }

    /// CZ template for a pair, trying both orderings.
    pub fn cz(&self, a: u32, b: u32) -> Option<&Vec<CzElement>> {
        self.two.get(&(a, b)).or_else(|| self.two.get(&(b, a)))
    }

    /// Qubits with single-qubit templates.
    pub fn qubits(&self) -> impl Iterator<Item = u32> + '_ {
        self.single.keys().copied()
    }
}
