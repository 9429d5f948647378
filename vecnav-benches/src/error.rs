//! Benchmark setup error type.

use vecnav_core::HnswError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic data generation was asked for an empty dataset.
    #[error("expected a non-zero value for {context}")]
    ZeroValue {
        /// A description of the parameter that was unexpectedly zero.
        context: &'static str,
    },
    /// Index construction or search failed.
    #[error("HNSW operation failed: {0}")]
    Hnsw(#[from] HnswError),
}
