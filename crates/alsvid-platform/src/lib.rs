//! Alsvid platform orchestration
//!
//! The [`Platform`] ties the stack together: it owns the characterization
//! records and native-gate pulse templates, compiles transpiled circuits into
//! pulse sequences ([`compiler`]), executes sequences over the instrument HAL
//! with a strict upload→play→acquire barrier, and decomposes parameter sweeps
//! into hardware-sized passes ([`sweep`]).
//!
//! Settings are an immutable snapshot: calibration routines produce a
//! [`CalibrationUpdate`] and [`PlatformSettings::apply`] returns a new
//! snapshot which the platform swaps in atomically.
//!
//! Everything is single-threaded and blocking. The only "parallelism" is
//! across instruments inside one execution, and even that is a strict
//! barrier: all uploads complete before any play, all plays before any
//! acquire, so multi-instrument timing stays synchronized by the shared
//! hardware trigger.

pub mod compiler;
pub mod error;
pub mod natives;
pub mod platform;
pub mod qubit;
pub mod settings;
pub mod sweep;
pub mod unrolling;

pub use compiler::CompiledSequence;
pub use error::{PlatformError, PlatformResult};
pub use natives::{CzElement, NativeGateTemplates, PulseTemplate, SingleQubitNatives};
pub use platform::{ChannelRole, ExecutionResult, Platform};
pub use qubit::{Coupler, Qubit};
pub use settings::{CalibrationParameter, CalibrationUpdate, PlatformSettings};
pub use unrolling::{batch_max_duration, batch_max_readout, batch_max_sequences};
