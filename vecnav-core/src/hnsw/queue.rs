//! Priority structures shared by layer search and insertion.
//!
//! `CandidateQueue` pops the nearest pending candidate first, while
//! `BestSet` keeps at most `ef` results and exposes the farthest one so the
//! search can decide when to stop. Both order by distance, then by id.

use std::{cmp::Reverse, collections::BinaryHeap};

use super::types::Neighbour;

/// Min-heap of candidates still to be expanded.
#[derive(Debug, Default)]
pub(crate) struct CandidateQueue {
    heap: BinaryHeap<Reverse<Neighbour>>,
}

impl CandidateQueue {
    pub(crate) fn push(&mut self, candidate: Neighbour) {
        self.heap.push(Reverse(candidate));
    }

    pub(crate) fn pop_nearest(&mut self) -> Option<Neighbour> {
        self.heap.pop().map(|Reverse(neighbour)| neighbour)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Bounded max-heap of the best results found so far.
#[derive(Debug)]
pub(crate) struct BestSet {
    heap: BinaryHeap<Neighbour>,
    capacity: usize,
}

impl BestSet {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "search breadth must be positive");
        Self {
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    pub(crate) fn farthest(&self) -> Option<Neighbour> {
        self.heap.peek().copied()
    }

    /// Returns whether `candidate` could still enter the set. Ties on
    /// distance go to the lower id.
    pub(crate) fn admits(&self, candidate: Neighbour) -> bool {
        !self.is_full() || self.farthest().is_some_and(|farthest| candidate < farthest)
    }

    /// Inserts the candidate, evicting the farthest entry on overflow.
    pub(crate) fn insert(&mut self, candidate: Neighbour) {
        self.heap.push(candidate);
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    /// Consumes the set, returning neighbours nearest first.
    pub(crate) fn into_sorted_vec(self) -> Vec<Neighbour> {
        self.heap.into_sorted_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(id: usize, distance: f32) -> Neighbour {
        Neighbour { id, distance }
    }

    #[test]
    fn candidate_queue_pops_nearest_first() {
        let mut queue = CandidateQueue::default();
        queue.push(at(4, 2.0));
        queue.push(at(1, 0.5));
        queue.push(at(9, 1.0));
        let order: Vec<_> = std::iter::from_fn(|| queue.pop_nearest())
            .map(|neighbour| neighbour.id)
            .collect();
        assert_eq!(order, vec![1, 9, 4]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn best_set_evicts_farthest_on_overflow() {
        let mut best = BestSet::with_capacity(2);
        best.insert(at(0, 3.0));
        best.insert(at(1, 1.0));
        assert!(best.is_full());
        assert!(best.admits(at(5, 2.0)));
        assert!(!best.admits(at(5, 3.0)));
        best.insert(at(2, 2.0));
        let ids: Vec<_> = best.into_sorted_vec().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn best_set_orders_ties_by_id() {
        let mut best = BestSet::with_capacity(3);
        best.insert(at(7, 1.0));
        best.insert(at(2, 1.0));
        best.insert(at(5, 0.5));
        let ids: Vec<_> = best.into_sorted_vec().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 2, 7]);
    }

    #[test]
    fn full_set_admits_an_equidistant_lower_id() {
        let mut best = BestSet::with_capacity(1);
        best.insert(at(1, 1.0));
        assert!(best.admits(at(0, 1.0)));
        assert!(!best.admits(at(2, 1.0)));
        best.insert(at(0, 1.0));
        assert_eq!(best.into_sorted_vec(), vec![at(0, 1.0)]);
    }
}
