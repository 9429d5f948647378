//! Neighbour-selection heuristic.
//!
//! Candidates are scanned nearest first. A candidate is admitted only when
//! it is closer to the base node than to every neighbour admitted so far,
//! which keeps links spread across directions instead of clustering. Slots
//! left empty by rejected candidates are not backfilled.

use super::{error::HnswError, space::Space, types::Neighbour};

/// Selects at most `capacity` neighbours from `candidates`.
///
/// Distances in `candidates` are measured from the base node. The input need
/// not be sorted; the result is ordered nearest first.
pub(crate) fn select_neighbours(
    candidates: &[Neighbour],
    capacity: usize,
    space: &Space<'_>,
) -> Result<Vec<Neighbour>, HnswError> {
    let mut ordered = candidates.to_vec();
    ordered.sort_unstable();
    ordered.dedup_by_key(|candidate| candidate.id);

    let mut selected: Vec<Neighbour> = Vec::with_capacity(capacity.min(ordered.len()));
    for candidate in ordered {
        if selected.len() >= capacity {
            break;
        }
        let mut diverse = true;
        for kept in &selected {
            if space.between(candidate.id, kept.id)? < candidate.distance {
                diverse = false;
                break;
            }
        }
        if diverse {
            selected.push(candidate);
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{distance::DistanceMetric, hnsw::arena::VectorArena};

    fn arena(points: &[[f32; 2]]) -> VectorArena {
        let arena = VectorArena::with_capacity(points.len());
        for (label, point) in points.iter().enumerate() {
            arena.store(point.to_vec(), label as u64).expect("room");
        }
        arena
    }

    fn from_base(space: &Space<'_>, base: usize, ids: &[usize]) -> Vec<Neighbour> {
        ids.iter()
            .map(|&id| Neighbour {
                id,
                distance: space.between(base, id).expect("stored"),
            })
            .collect()
    }

    #[test]
    fn rejects_candidates_shadowed_by_a_closer_pick() {
        // Base at origin; 1 and 2 lie on the same ray, 3 points the other way.
        let arena = arena(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [-3.0, 0.0]]);
        let space = Space::new(&arena, DistanceMetric::L2);
        let candidates = from_base(&space, 0, &[2, 3, 1]);
        let selected = select_neighbours(&candidates, 3, &space).expect("select");
        let ids: Vec<_> = selected.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let arena = arena(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]]);
        let space = Space::new(&arena, DistanceMetric::L2);
        let candidates = from_base(&space, 0, &[1, 2, 3, 4]);
        let selected = select_neighbours(&candidates, 2, &space).expect("select");
        assert_eq!(selected.len(), 2);
        assert!(selected.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let arena = arena(&[[0.0, 0.0]]);
        let space = Space::new(&arena, DistanceMetric::L2);
        assert!(select_neighbours(&[], 4, &space).expect("select").is_empty());
    }
}
