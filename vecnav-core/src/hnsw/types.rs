//! Types for HNSW graph operations (identifiers, entry points, and neighbour
//! ordering semantics). Distances are finite `f32` values; non-finite inputs
//! are rejected before they reach the graph.

use std::cmp::Ordering;

/// Dense storage slot assigned to each inserted vector.
pub type InternalId = usize;

/// Caller-supplied identifier associated with each inserted vector.
pub type Label = u64;

/// Entry point into the hierarchical graph used when searching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EntryPoint {
    pub(crate) node: InternalId,
    pub(crate) level: usize,
}

/// Neighbour discovered during a search, including its distance from the query.
///
/// Ordering is by distance, then by identifier, so ties resolve
/// deterministically.
///
/// # Examples
/// ```
/// use vecnav_core::Neighbour;
///
/// let near = Neighbour { id: 3, distance: 0.42 };
/// let tie = Neighbour { id: 1, distance: 0.42 };
/// assert!(tie < near);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Internal identifier of the neighbour.
    pub id: InternalId,
    /// Distance between the query and [`Neighbour::id`].
    pub distance: f32,
}

impl Eq for Neighbour {}

impl Ord for Neighbour {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Neighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single k-NN result returned by [`crate::HnswIndex::search`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchHit {
    /// Internal identifier of the matching vector.
    pub id: InternalId,
    /// Label supplied when the vector was inserted.
    pub label: Label,
    /// Distance from the query under the index metric.
    pub distance: f32,
}
