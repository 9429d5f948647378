//! Parameter handling for the HNSW index.

use crate::distance::DistanceMetric;

use super::error::HnswError;

const DEFAULT_MAX_LEVEL: usize = 16;
const DEFAULT_RNG_SEED: u64 = 100;

/// Configuration parameters for an [`crate::HnswIndex`].
#[derive(Clone, Debug, PartialEq)]
pub struct HnswParams {
    dimension: usize,
    max_connections: usize,
    ef_construction: usize,
    ef: usize,
    metric: DistanceMetric,
    level_multiplier: f64,
    max_level: usize,
    rng_seed: u64,
}

impl HnswParams {
    /// Creates a parameter set for vectors of `dimension` components.
    ///
    /// `max_connections` is the per-layer fan-out `M`; layer 0 allows twice
    /// as many neighbours. `ef_construction` may be smaller than `M`: inserts
    /// always search at least `M` candidates.
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] when `dimension` is zero or
    /// when `max_connections` is below two.
    ///
    /// # Examples
    /// ```
    /// use vecnav_core::{DistanceMetric, HnswParams};
    ///
    /// let params = HnswParams::new(128, 16, 200)
    ///     .expect("parameters must be valid")
    ///     .with_metric(DistanceMetric::Cosine)
    ///     .with_rng_seed(7);
    /// assert_eq!(params.max_connections(), 16);
    /// assert_eq!(params.metric(), DistanceMetric::Cosine);
    /// ```
    pub fn new(
        dimension: usize,
        max_connections: usize,
        ef_construction: usize,
    ) -> Result<Self, HnswError> {
        if dimension == 0 {
            return Err(HnswError::InvalidParameters {
                reason: "dimension must be greater than zero".into(),
            });
        }
        if max_connections < 2 {
            return Err(HnswError::InvalidParameters {
                reason: format!("max_connections must be at least 2 (got {max_connections})"),
            });
        }
        Ok(Self {
            dimension,
            max_connections,
            ef_construction,
            ef: 0,
            metric: DistanceMetric::default(),
            level_multiplier: (max_connections as f64).ln().recip(),
            max_level: DEFAULT_MAX_LEVEL,
            rng_seed: DEFAULT_RNG_SEED,
        })
    }

    /// Sets the initial search breadth. Zero means "use `k`".
    #[must_use]
    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = ef;
        self
    }

    /// Selects the distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Seeds the internal RNG to make serial insertion deterministic.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Caps the maximum layer that will be sampled for new nodes.
    #[must_use]
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Returns the vector dimension accepted by the index.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the neighbour fan-out enforced on layers above zero.
    #[must_use]
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Returns the configured construction search breadth.
    #[must_use]
    pub fn ef_construction(&self) -> usize {
        self.ef_construction
    }

    /// Returns the initial search breadth.
    #[must_use]
    pub fn ef(&self) -> usize {
        self.ef
    }

    /// Returns the distance metric.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Returns the RNG seed.
    #[must_use]
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    pub(crate) fn max_level(&self) -> usize {
        self.max_level
    }

    pub(crate) fn level_multiplier(&self) -> f64 {
        self.level_multiplier
    }

    /// Neighbour capacity for `layer`: `2·M` on layer 0, `M` elsewhere.
    pub(crate) fn layer_capacity(&self, layer: usize) -> usize {
        if layer == 0 {
            self.max_connections.saturating_mul(2)
        } else {
            self.max_connections
        }
    }
}
