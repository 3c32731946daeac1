//! Error types for result containers.

use thiserror::Error;

/// Data-shape errors, fatal at construction, never silently coerced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultError {
    /// I and Q arrays differ in length.
    #[error("i and q must have the same size, got {i} and {q}")]
    LengthMismatch {
        /// I samples.
        i: usize,
        /// Q samples.
        q: usize,
    },

    /// Sample count does not split evenly into shots.
    #[error("{samples} samples cannot be reshaped into bins of {shots} shots")]
    ShotMismatch {
        /// Total samples.
        samples: usize,
        /// Requested shots per bin.
        shots: usize,
    },

    /// Two containers with different shots-per-bin cannot be concatenated.
    #[error("cannot concatenate results with {left} and {right} shots per bin")]
    ConcatMismatch {
        /// Shots per bin of the left operand.
        left: usize,
        /// Shots per bin of the right operand.
        right: usize,
    },

    /// A discriminated state value is outside {0, 1}.
    #[error("state values must be 0 or 1, got {0}")]
    InvalidState(u8),
}

/// Result type for decoding operations.
pub type ResultResult<T> = Result<T, ResultError>;
