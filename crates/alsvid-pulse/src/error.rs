//! Error types for the pulse crate.

use thiserror::Error;

use crate::sweeper::Parameter;

/// Errors in pulse and sweeper construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PulseError {
    /// A sweeper was constructed with an empty value range.
    #[error("sweeper for parameter '{0}' has no values")]
    EmptyValues(Parameter),

    /// A sweeper was constructed with no targets.
    #[error("sweeper for parameter '{0}' has no targets")]
    EmptyTargets(Parameter),

    /// Parameter and target kind do not go together.
    #[error("parameter '{parameter}' cannot be swept over {targets} targets")]
    IncompatibleTargets {
        /// The swept parameter.
        parameter: Parameter,
        /// Kind of the supplied targets ("pulse", "qubit" or "coupler").
        targets: &'static str,
    },

    /// A sampled envelope is shorter than the pulse duration.
    #[error("sampled envelope has {samples} samples for a {duration} ns pulse")]
    EnvelopeTooShort {
        /// Samples provided.
        samples: usize,
        /// Pulse duration in ns.
        duration: u64,
    },
}

/// Result type for pulse operations.
pub type PulseResult<T> = Result<T, PulseError>;
