//! Error types for the HAL crate.

use thiserror::Error;

/// Errors raised by instrument drivers and the registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// `connect` called on an already connected instrument.
    #[error("instrument '{0}' is already connected")]
    AlreadyConnected(String),

    /// An operation that needs a connection ran before `connect`.
    #[error("instrument '{0}' is not connected")]
    NotConnected(String),

    /// The instrument could not be reached.
    #[error("connection to instrument '{instrument}' failed: {reason}")]
    ConnectionFailed {
        /// Instrument name.
        instrument: String,
        /// Driver-reported reason.
        reason: String,
    },

    /// The instrument does not support the requested operation.
    #[error("instrument '{instrument}' does not support {operation}")]
    Unsupported {
        /// Instrument name.
        instrument: String,
        /// Operation that was requested.
        operation: &'static str,
    },

    /// An upload exceeds the on-device memory.
    #[error("upload to '{instrument}' needs {bins} bins, device limit is {limit}")]
    CapacityExceeded {
        /// Instrument name.
        instrument: String,
        /// Bins the upload would need.
        bins: usize,
        /// Device bin limit.
        limit: usize,
    },

    /// No factory registered for a driver name.
    #[error("unknown instrument driver '{0}'")]
    UnknownDriver(String),

    /// Malformed driver settings.
    #[error("invalid settings for instrument '{instrument}': {reason}")]
    InvalidSettings {
        /// Instrument name.
        instrument: String,
        /// What was wrong.
        reason: String,
    },
}

/// Result type for HAL operations.
pub type InstrumentResult<T> = Result<T, InstrumentError>;
