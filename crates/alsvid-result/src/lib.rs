//! Alsvid measurement results
//!
//! Typed containers for acquisition outcomes, shaped (bins, shots):
//!
//! - [`IqResults`] — integrated I/Q points per shot, with lazily derived
//!   magnitude and phase. Averaging reduces over the shot axis and always
//!   averages i and q before deriving anything from them.
//! - [`StateResults`] — discriminated {0, 1} outcomes per shot, with per-bin
//!   state probabilities.
//!
//! `average` always produces a new immutable `Averaged*` container; nothing
//! here mutates in place. Containers from split executions are merged with
//! `concat`, which appends along the bin axis and insists on matching
//! shots-per-bin.
//!
//! The [`signal`] module holds the raw-trace decoding used by readout
//! drivers: IF demodulation/integration and IQ-plane state discrimination.

pub mod error;
pub mod iq;
pub mod signal;
pub mod state;

pub use error::{ResultError, ResultResult};
pub use iq::{AveragedIqResults, IqResults, RawWaveformResults};
pub use signal::{classify, demodulate_and_integrate};
pub use state::{AveragedStateResults, StateResults};
