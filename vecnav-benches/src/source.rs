//! Deterministic synthetic vector sources.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use vecnav_core::{HnswIndex, HnswParams};

use crate::error::BenchSetupError;

/// Shape of a synthetic dataset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SyntheticConfig {
    /// Number of vectors to generate.
    pub point_count: usize,
    /// Components per vector.
    pub dimensions: usize,
    /// RNG seed; equal seeds yield equal data.
    pub seed: u64,
}

/// Vectors drawn uniformly from `[-1, 1)` in every dimension.
#[derive(Clone, Debug)]
pub struct SyntheticSource {
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl SyntheticSource {
    /// Generates a uniform dataset.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::ZeroValue`] when the point count or
    /// dimension is zero.
    ///
    /// # Examples
    /// ```
    /// use vecnav_benches::source::{SyntheticConfig, SyntheticSource};
    ///
    /// let source = SyntheticSource::generate(&SyntheticConfig {
    ///     point_count: 8,
    ///     dimensions: 3,
    ///     seed: 1,
    /// })
    /// .expect("valid config");
    /// assert_eq!(source.vectors().len(), 8);
    /// ```
    pub fn generate(config: &SyntheticConfig) -> Result<Self, BenchSetupError> {
        if config.point_count == 0 {
            return Err(BenchSetupError::ZeroValue {
                context: "point_count",
            });
        }
        if config.dimensions == 0 {
            return Err(BenchSetupError::ZeroValue {
                context: "dimensions",
            });
        }
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let vectors = (0..config.point_count)
            .map(|_| {
                (0..config.dimensions)
                    .map(|_| rng.gen_range(-1.0_f32..1.0))
                    .collect()
            })
            .collect();
        Ok(Self {
            vectors,
            dimensions: config.dimensions,
        })
    }

    /// Returns the generated vectors.
    #[must_use]
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Returns the vector dimension.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Builds an index over every vector, labelling each by position.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::Hnsw`] when the parameters are invalid or
    /// an insert fails.
    pub fn build_index(
        &self,
        max_connections: usize,
        ef_construction: usize,
        seed: u64,
    ) -> Result<HnswIndex, BenchSetupError> {
        let params = HnswParams::new(self.dimensions, max_connections, ef_construction)?
            .with_rng_seed(seed);
        let index = HnswIndex::with_capacity(params, self.vectors.len())?;
        for (label, vector) in (0_u64..).zip(&self.vectors) {
            index.insert(vector, label)?;
        }
        Ok(index)
    }

    /// Pairs each vector with its positional label for batch insertion.
    #[must_use]
    pub fn labelled(&self) -> Vec<(u64, Vec<f32>)> {
        (0_u64..).zip(self.vectors.iter().cloned()).collect()
    }
}
