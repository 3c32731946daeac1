//! Dummy instrument backend.
//!
//! Implements the full [`alsvid_hal::Instrument`] contract without any
//! hardware: uploads are captured, playback is a no-op, and `acquire`
//! synthesizes deterministic seeded I/Q data shaped exactly like a real
//! readout module's output (bins × shots per readout pulse). Port-parameter
//! writes are recorded so tests can assert on staging behavior.

mod instrument;

pub use instrument::{DummyInstrument, PortWrite, modulated_waveform, register};
