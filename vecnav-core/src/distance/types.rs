//! Error types shared by the distance helpers.

use thiserror::Error;

/// Convenient result alias for distance helpers.
pub type Result<T, E = DistanceError> = core::result::Result<T, E>;

/// Errors raised while validating or normalising vectors.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum DistanceError {
    /// A component was NaN or infinite.
    #[error("component {index} is not finite (value: {value})")]
    NonFinite {
        /// Position of the offending component.
        index: usize,
        /// Offending value.
        value: f32,
    },
    /// The vector has zero (or non-finite) L2 magnitude and cannot be
    /// normalised.
    #[error("vector has zero magnitude and cannot be normalised")]
    ZeroMagnitude,
    /// A metric name did not match any supported metric.
    #[error("unknown distance metric `{provided}`; expected `l2`, `ip`, or `cosine`")]
    UnknownMetric {
        /// Raw name supplied by the caller.
        provided: String,
    },
}
