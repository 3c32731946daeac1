//! Alsvid Hardware Abstraction Layer
//!
//! The [`Instrument`] trait defines the lifecycle every backend implements:
//!
//! ```text
//!   connect() → setup() → upload() → play_sequence() → acquire() → stop() → disconnect()
//! ```
//!
//! # Design principles
//!
//! - **Blocking**: every instrument interaction is a synchronous round-trip.
//!   The engine runs single-threaded; cross-instrument synchronization is a
//!   hardware clock-distribution concern, not a scheduling one.
//! - **Strict barrier**: callers upload to every instrument before playing on
//!   any, and play on every instrument before acquiring from any.
//! - **Infallible introspection**: [`Instrument::limits`] is synchronous and
//!   infallible — limits are cached at construction time.
//! - **Configuration-driven**: concrete backends are chosen by driver name
//!   through the [`InstrumentRegistry`], never by runtime type lookup.

pub mod channel;
pub mod config;
pub mod error;
pub mod instrument;

pub use channel::{Channel, InstrumentRole, LocalOscillator};
pub use config::{InstrumentConfig, InstrumentRegistry};
pub use error::{InstrumentError, InstrumentResult};
pub use instrument::{Instrument, InstrumentSettings, RawAcquisition, SweepLimits};
