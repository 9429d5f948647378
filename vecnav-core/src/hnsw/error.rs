//! Error types produced by the HNSW index.

use thiserror::Error;

use crate::{distance::DistanceError, error::define_error_codes};

/// Errors produced by [`crate::HnswIndex`] and its parameter builders.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum HnswError {
    /// Parameters were invalid for the current configuration.
    #[error("invalid HNSW parameter: {reason}")]
    InvalidParameters {
        /// Human-readable explanation of the rejected value.
        reason: String,
    },
    /// A vector's length disagreed with the index dimension.
    #[error("vector has {actual} dimension(s) but the index expects {expected}")]
    DimensionMismatch {
        /// Dimension configured on the index.
        expected: usize,
        /// Dimension of the rejected vector.
        actual: usize,
    },
    /// The index already stores `capacity` vectors.
    #[error("index is full: capacity of {capacity} vector(s) reached")]
    CapacityExceeded {
        /// Configured maximum element count.
        capacity: usize,
    },
    /// A search asked for fewer than one neighbour.
    #[error("k must be at least 1 (got {k})")]
    InvalidK {
        /// Rejected neighbour count.
        k: usize,
    },
    /// A vector contained non-finite values or could not be normalised.
    #[error("invalid vector: {0}")]
    InvalidVector(DistanceError),
    /// Attempted to operate on an inconsistent graph state.
    #[error("HNSW graph invariant violated: {message}")]
    GraphInvariantViolation {
        /// Description of the inconsistency.
        message: String,
    },
    /// A lock guarding shared graph state was poisoned by a panicking thread.
    #[error("{resource} lock poisoned")]
    LockPoisoned {
        /// Name of the poisoned resource.
        resource: &'static str,
    },
}

define_error_codes! {
    /// Stable codes describing [`HnswError`] variants.
    enum HnswErrorCode for HnswError {
        /// Parameters were invalid for the current configuration.
        InvalidParameters => InvalidParameters { .. } => "HNSW_INVALID_PARAMETERS",
        /// A vector's length disagreed with the index dimension.
        DimensionMismatch => DimensionMismatch { .. } => "HNSW_DIMENSION_MISMATCH",
        /// The index is full.
        CapacityExceeded => CapacityExceeded { .. } => "HNSW_CAPACITY_EXCEEDED",
        /// A search asked for fewer than one neighbour.
        InvalidK => InvalidK { .. } => "HNSW_INVALID_K",
        /// A vector contained non-finite values or could not be normalised.
        InvalidVector => InvalidVector(..) => "HNSW_INVALID_VECTOR",
        /// Attempted to operate on an inconsistent graph state.
        GraphInvariantViolation => GraphInvariantViolation { .. } => "HNSW_GRAPH_INVARIANT_VIOLATION",
        /// A lock guarding shared graph state was poisoned.
        LockPoisoned => LockPoisoned { .. } => "HNSW_LOCK_POISONED",
    }
}

impl From<DistanceError> for HnswError {
    fn from(err: DistanceError) -> Self {
        match err {
            DistanceError::UnknownMetric { .. } => Self::InvalidParameters {
                reason: err.to_string(),
            },
            other => Self::InvalidVector(other),
        }
    }
}

impl HnswError {
    pub(crate) fn poisoned(resource: &'static str) -> Self {
        Self::LockPoisoned { resource }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::GraphInvariantViolation {
            message: message.into(),
        }
    }
}
