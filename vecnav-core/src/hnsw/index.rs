//! The public HNSW index: owns the arena, graph, and tunables.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::distance::{DistanceMetric, normalise, validate_components};

use super::{
    arena::VectorArena,
    error::HnswError,
    graph::Graph,
    insert::Inserter,
    invariants::HnswInvariantChecker,
    level::LevelSampler,
    params::HnswParams,
    search::LayerSearcher,
    space::Space,
    types::{InternalId, Label, Neighbour, SearchHit},
};

/// Approximate nearest-neighbour index over fixed-dimension `f32` vectors.
///
/// Every operation takes `&self`; inserts and searches may run from many
/// threads at once. Serial inserts with the same seed build the same graph.
///
/// # Examples
/// ```
/// use vecnav_core::{HnswIndex, HnswParams};
///
/// let params = HnswParams::new(2, 8, 32).expect("parameters must be valid");
/// let index = HnswIndex::with_capacity(params, 3).expect("capacity must be valid");
/// index.insert(&[0.0, 0.0], 10).expect("insert must succeed");
/// index.insert(&[5.0, 5.0], 11).expect("insert must succeed");
/// index.insert(&[1.0, 0.0], 12).expect("insert must succeed");
///
/// let hits = index.search(&[0.9, 0.1], 2).expect("search must succeed");
/// assert_eq!(hits[0].label, 12);
/// assert_eq!(hits[1].label, 10);
/// ```
#[derive(Debug)]
pub struct HnswIndex {
    params: HnswParams,
    arena: VectorArena,
    graph: Graph,
    levels: LevelSampler,
    labels: DashMap<Label, Vec<InternalId>>,
    len: AtomicUsize,
    ef: AtomicUsize,
    ef_construction: AtomicUsize,
}

impl HnswIndex {
    /// Creates an empty index able to hold `capacity` vectors.
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] when `capacity` is zero.
    pub fn with_capacity(params: HnswParams, capacity: usize) -> Result<Self, HnswError> {
        if capacity == 0 {
            return Err(HnswError::InvalidParameters {
                reason: "capacity must be greater than zero".into(),
            });
        }
        let levels = LevelSampler::new(
            params.rng_seed(),
            params.level_multiplier(),
            params.max_level(),
        );
        Ok(Self {
            arena: VectorArena::with_capacity(capacity),
            graph: Graph::with_capacity(capacity),
            levels,
            labels: DashMap::new(),
            len: AtomicUsize::new(0),
            ef: AtomicUsize::new(params.ef()),
            ef_construction: AtomicUsize::new(params.ef_construction()),
            params,
        })
    }

    /// Inserts `vector` under `label`, returning its internal id.
    ///
    /// Cosine indices store a unit-length copy of the vector.
    ///
    /// # Errors
    /// Returns [`HnswError::DimensionMismatch`] for vectors of the wrong
    /// length, [`HnswError::InvalidVector`] for non-finite components or a
    /// zero vector under cosine, and [`HnswError::CapacityExceeded`] when the
    /// index is full. A rejected vector leaves the index untouched.
    #[instrument(
        name = "hnsw.insert",
        level = "debug",
        err,
        skip(self, vector),
        fields(dimension = vector.len())
    )]
    pub fn insert(&self, vector: &[f32], label: Label) -> Result<InternalId, HnswError> {
        let prepared = self.prepare(vector)?;
        let id = self.arena.store(prepared, label)?;
        let level = self.levels.sample()?;
        let inserter = Inserter::new(
            &self.graph,
            self.space(),
            &self.params,
            self.ef_construction.load(Ordering::Relaxed),
        );
        let outcome = inserter.link(id, level)?;
        self.labels.entry(label).or_default().push(id);
        self.len.fetch_add(1, Ordering::AcqRel);

        #[cfg(feature = "metrics")]
        {
            metrics::counter!("hnsw_inserts").increment(1);
            metrics::counter!("hnsw_prunes").increment(outcome.pruned as u64);
        }

        debug!(id, level, promoted = outcome.promoted, pruned = outcome.pruned, "inserted vector");
        Ok(id)
    }

    /// Inserts every `(label, vector)` pair in parallel on the rayon pool.
    ///
    /// The returned ids follow the order of `items`. Level sampling uses
    /// per-worker generators, so ids and graph shape are not reproducible
    /// across runs.
    ///
    /// # Errors
    /// Returns the first error raised by any insert; pairs already inserted
    /// stay in the index.
    #[instrument(
        name = "hnsw.insert_batch",
        level = "debug",
        err,
        skip(self, items),
        fields(count = items.len())
    )]
    pub fn insert_batch<V>(&self, items: &[(Label, V)]) -> Result<Vec<InternalId>, HnswError>
    where
        V: AsRef<[f32]> + Sync,
    {
        items
            .par_iter()
            .map(|(label, vector)| self.insert(vector.as_ref(), *label))
            .collect()
    }

    /// Returns up to `k` nearest neighbours of `query`, nearest first.
    ///
    /// The search breadth is `max(ef, k)`. Ties resolve by ascending id. An
    /// empty index yields an empty result.
    ///
    /// # Errors
    /// Returns [`HnswError::DimensionMismatch`] when `query` has the wrong
    /// length, [`HnswError::InvalidK`] when `k` is zero, and
    /// [`HnswError::InvalidVector`] for non-finite components or a zero query
    /// under cosine.
    #[instrument(
        name = "hnsw.search",
        level = "debug",
        err,
        skip(self, query),
        fields(dimension = query.len())
    )]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, HnswError> {
        self.check_dimension(query.len())?;
        if k == 0 {
            return Err(HnswError::InvalidK { k });
        }
        let prepared = self.prepare(query)?;

        #[cfg(feature = "metrics")]
        metrics::counter!("hnsw_searches").increment(1);

        let Some(entry) = self.graph.entry()? else {
            return Ok(Vec::new());
        };
        let searcher = LayerSearcher::new(&self.graph, self.space());
        let mut seed = Neighbour {
            id: entry.node,
            distance: searcher.space().to_query(&prepared, entry.node)?,
        };
        for layer in (1..=entry.level).rev() {
            seed = searcher.greedy_search_layer(&prepared, seed, layer)?;
        }
        let ef = self.ef.load(Ordering::Relaxed).max(k);
        let mut nearest = searcher.search_layer(&prepared, &[seed], 0, ef)?;
        nearest.truncate(k);

        nearest
            .into_iter()
            .map(|neighbour| {
                let label = self.arena.label(neighbour.id).ok_or_else(|| {
                    HnswError::invariant(format!("label missing for node {}", neighbour.id))
                })?;
                Ok(SearchHit {
                    id: neighbour.id,
                    label,
                    distance: neighbour.distance,
                })
            })
            .collect()
    }

    /// Updates the construction breadth and the search breadth together.
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] when `value` is negative.
    pub fn set_ef_construction(&self, value: i64) -> Result<(), HnswError> {
        let ef = usize::try_from(value).map_err(|_| HnswError::InvalidParameters {
            reason: format!("ef_construction must be non-negative (got {value})"),
        })?;
        self.ef_construction.store(ef, Ordering::Relaxed);
        self.ef.store(ef, Ordering::Relaxed);
        debug!(ef, "updated ef_construction and ef");
        Ok(())
    }

    /// Updates the search breadth only. Zero means "use `k`".
    pub fn set_ef(&self, ef: usize) {
        self.ef.store(ef, Ordering::Relaxed);
    }

    /// Number of vectors fully inserted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` when nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of vectors the index accepts.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Number of components every vector must have.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.params.dimension()
    }

    /// Distance metric fixed at construction.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.params.metric()
    }

    /// Neighbour limit `M` on layers above zero; layer 0 allows `2·M`.
    #[must_use]
    pub fn max_connections(&self) -> usize {
        self.params.max_connections()
    }

    /// Current search breadth.
    #[must_use]
    pub fn ef(&self) -> usize {
        self.ef.load(Ordering::Relaxed)
    }

    /// Current construction breadth, before the `M` floor is applied.
    #[must_use]
    pub fn ef_construction(&self) -> usize {
        self.ef_construction.load(Ordering::Relaxed)
    }

    /// Returns the stored vector for `id`, normalised under cosine.
    #[must_use]
    pub fn vector(&self, id: InternalId) -> Option<&[f32]> {
        self.arena.get(id)
    }

    /// Returns the label `id` was inserted under.
    #[must_use]
    pub fn label(&self, id: InternalId) -> Option<Label> {
        self.arena.label(id)
    }

    /// Returns every id inserted under `label`, ascending.
    #[must_use]
    pub fn ids_for_label(&self, label: Label) -> Vec<InternalId> {
        let mut ids = self
            .labels
            .get(&label)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Returns a checker for the structural invariants of this index.
    #[must_use]
    pub fn invariants(&self) -> HnswInvariantChecker<'_> {
        HnswInvariantChecker::new(self)
    }

    pub(crate) fn graph(&self) -> &Graph {
        &self.graph
    }

    pub(crate) fn arena(&self) -> &VectorArena {
        &self.arena
    }

    pub(crate) fn params(&self) -> &HnswParams {
        &self.params
    }

    fn space(&self) -> Space<'_> {
        Space::new(&self.arena, self.params.metric())
    }

    fn check_dimension(&self, actual: usize) -> Result<(), HnswError> {
        let expected = self.params.dimension();
        if actual == expected {
            Ok(())
        } else {
            Err(HnswError::DimensionMismatch { expected, actual })
        }
    }

    fn prepare(&self, vector: &[f32]) -> Result<Vec<f32>, HnswError> {
        self.check_dimension(vector.len())?;
        validate_components(vector)?;
        let mut owned = vector.to_vec();
        if self.params.metric().requires_normalisation() {
            normalise(&mut owned)?;
        }
        Ok(owned)
    }
}
