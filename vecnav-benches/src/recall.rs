//! Recall measurement helpers for HNSW benchmark quality reporting.

use std::collections::HashSet;

use vecnav_core::{DistanceMetric, Neighbour, SearchHit};

/// Integer recall score; convert to a fraction only when reporting.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RecallScore {
    /// Number of true neighbours found by the approximate search.
    pub hits: usize,
    /// Target count (min of k and oracle length).
    pub total: usize,
}

impl RecallScore {
    /// Adds another query's score to this aggregate.
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        Self {
            hits: self.hits + other.hits,
            total: self.total + other.total,
        }
    }

    /// Returns `hits / total`, or zero for an empty score.
    #[must_use]
    pub fn fraction(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.hits as f64 / self.total as f64
    }
}

/// Computes the exact top-k nearest neighbours by exhaustive scan.
///
/// Ids are positions in `vectors`; ties resolve by ascending id.
#[must_use]
pub fn brute_force_top_k(
    vectors: &[Vec<f32>],
    query: &[f32],
    k: usize,
    metric: DistanceMetric,
) -> Vec<Neighbour> {
    let mut neighbours: Vec<Neighbour> = vectors
        .iter()
        .enumerate()
        .map(|(id, vector)| Neighbour {
            id,
            distance: metric.distance(query, vector),
        })
        .collect();
    neighbours.sort_unstable();
    neighbours.truncate(k);
    neighbours
}

/// Computes recall@k as integer hits over a target count.
///
/// # Examples
///
/// ```
/// use vecnav_benches::recall::{RecallScore, recall_at_k};
/// use vecnav_core::{Neighbour, SearchHit};
///
/// let oracle = vec![
///     Neighbour { id: 0, distance: 0.1 },
///     Neighbour { id: 1, distance: 0.2 },
/// ];
/// let observed = vec![
///     SearchHit { id: 0, label: 0, distance: 0.1 },
///     SearchHit { id: 2, label: 2, distance: 0.3 },
/// ];
/// assert_eq!(recall_at_k(&oracle, &observed, 2), RecallScore { hits: 1, total: 2 });
/// ```
#[must_use]
pub fn recall_at_k(oracle: &[Neighbour], observed: &[SearchHit], k: usize) -> RecallScore {
    let total = k.min(oracle.len());
    if total == 0 {
        return RecallScore::default();
    }
    let oracle_ids: HashSet<usize> = oracle.iter().take(total).map(|n| n.id).collect();
    let hits = observed
        .iter()
        .take(total)
        .filter(|hit| oracle_ids.contains(&hit.id))
        .count();
    RecallScore { hits, total }
}
