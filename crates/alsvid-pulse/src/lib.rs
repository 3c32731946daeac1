//! Alsvid pulse-level model
//!
//! Value types shared by the pulse compiler, the instrument HAL and the
//! sweep engine:
//!
//! - [`Pulse`] / [`PulseSequence`]: analog pulses on a shared timeline with
//!   channel/qubit/readout filtered views.
//! - [`Shape`]: envelope variants with waveform sampling.
//! - [`Sweeper`] / [`Parameter`]: a parameter to vary over a value range,
//!   classified as real-time (hardware-driven) or near-time (host-driven).
//! - [`ExecutionParameters`]: shot count, relaxation time, acquisition and
//!   averaging configuration.
//!
//! Pulses carry a [`PulseId`] that survives cloning, so a sweep can copy a
//! sequence, mutate the copies, and still key results by the identity of the
//! original pulses.

pub mod error;
pub mod execution;
pub mod pulse;
pub mod sequence;
pub mod shape;
pub mod sweeper;

pub use error::{PulseError, PulseResult};
pub use execution::{AcquisitionType, AveragingMode, ExecutionParameters};
pub use pulse::{ChannelId, Pulse, PulseId, PulseKind};
pub use sequence::PulseSequence;
pub use shape::{Envelope, Shape};
pub use sweeper::{CouplerId, Parameter, SweepTargets, Sweeper};
