//! Error types for the platform crate.

use thiserror::Error;

use alsvid_hal::InstrumentError;
use alsvid_pulse::{Parameter, PulseError, PulseId};
use alsvid_result::ResultError;

/// Errors raised by the platform orchestration layer.
///
/// The sweep engine never catches any of these: every error propagates to
/// the caller, who owns reporting and experiment abort.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlatformError {
    /// Execution attempted before `connect`.
    #[error("platform '{0}' is not connected")]
    NotConnected(String),

    /// `connect` called twice.
    #[error("platform '{0}' is already connected")]
    AlreadyConnected(String),

    /// A qubit index is not part of the platform.
    #[error("qubit {0} is not defined on this platform")]
    UnknownQubit(u32),

    /// A qubit lacks the channel a pulse factory needs.
    #[error("qubit {qubit} has no {role} channel")]
    MissingChannel {
        /// Qubit index.
        qubit: u32,
        /// Channel role ("readout", "drive", "flux", ...).
        role: &'static str,
    },

    /// A channel name resolves to nothing.
    #[error("channel '{0}' is not wired on this platform")]
    UnknownChannel(String),

    /// No CZ pulse template calibrated for a qubit pair.
    #[error("calibration for CZ gate between qubits {a} and {b} not found")]
    MissingCzCalibration {
        /// First qubit of the pair.
        a: u32,
        /// Second qubit of the pair.
        b: u32,
    },

    /// A non-native gate reached the pulse compiler: the transpile upstream
    /// is incomplete.
    #[error("cannot compile '{0}' gate to pulses; transpile the circuit to the native set first")]
    UnsupportedGate(&'static str),

    /// Multiplexed pulses sharing one LO demand different LO frequencies.
    #[error("pulses multiplexed on channel '{channel}' need inconsistent LO frequencies {targets:?}")]
    InconsistentLoFrequencies {
        /// Shared channel.
        channel: String,
        /// Conflicting LO targets in Hz.
        targets: Vec<f64>,
    },

    /// A near-time sweeper is nested under a real-time sweeper. The caller
    /// must reorder the sweeper list.
    #[error("cannot nest for-loop sweeper '{0}' inside a real-time sweeper")]
    ForLoopInsideRealtime(Parameter),

    /// A sweeper references a pulse that is not in the swept sequence.
    #[error("sweeper references pulse {0} which is not part of the sequence")]
    SweeperPulseMissing(PulseId),

    /// A readout instrument returned no data for a readout pulse.
    #[error("no acquisition returned for readout pulse '{0}'")]
    MissingAcquisition(String),

    /// Chunked executions produced results of different kinds; the execution
    /// options changed mid-sweep.
    #[error("cannot merge results of different kinds across sweep chunks")]
    MixedResultKinds,

    /// The inner sweepers alone overflow the device bin memory, so no
    /// chunking of the outer range can make the sweep fit.
    #[error("sweep needs {bins} bins per shot, device limit is {limit}")]
    SweepTooLarge {
        /// Bins one shot of the sweep would need.
        bins: usize,
        /// Device bin limit.
        limit: usize,
    },

    /// Calibration update cannot be applied to the current settings.
    #[error("invalid calibration for qubit {qubit}: {reason}")]
    InvalidCalibration {
        /// Qubit index.
        qubit: u32,
        /// What was wrong.
        reason: String,
    },

    /// Instrument driver failure.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    /// Data-shape failure while decoding results.
    #[error(transparent)]
    Result(#[from] ResultError),

    /// Sweeper/pulse model failure.
    #[error(transparent)]
    Pulse(#[from] PulseError),
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
