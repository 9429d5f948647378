//! Layer search routines for the HNSW graph.
//!
//! Implements the greedy `ef = 1` descent used on upper layers and the
//! best-first breadth-`ef` search used on the target layer, shared by
//! insertion and k-NN queries.

use std::collections::HashSet;

use super::{
    error::HnswError,
    graph::Graph,
    queue::{BestSet, CandidateQueue},
    space::Space,
    types::{InternalId, Neighbour},
};

#[derive(Debug)]
struct SearchState {
    visited: HashSet<InternalId>,
    candidates: CandidateQueue,
    best: BestSet,
}

impl SearchState {
    fn new(ef: usize, seeds: &[Neighbour]) -> Self {
        let mut state = Self {
            visited: HashSet::with_capacity(ef.saturating_mul(4)),
            candidates: CandidateQueue::default(),
            best: BestSet::with_capacity(ef),
        };
        for seed in seeds {
            if state.visited.insert(seed.id) {
                state.candidates.push(*seed);
                state.best.insert(*seed);
            }
        }
        state
    }

    fn should_terminate(&self, nearest: Neighbour) -> bool {
        self.best.is_full()
            && self
                .best
                .farthest()
                .is_some_and(|farthest| nearest > farthest)
    }

    fn try_enqueue(&mut self, candidate: Neighbour) {
        if !self.best.admits(candidate) {
            return;
        }
        self.candidates.push(candidate);
        self.best.insert(candidate);
    }
}

#[derive(Debug)]
pub(crate) struct LayerSearcher<'a> {
    graph: &'a Graph,
    space: Space<'a>,
}

impl<'a> LayerSearcher<'a> {
    pub(crate) fn new(graph: &'a Graph, space: Space<'a>) -> Self {
        Self { graph, space }
    }

    pub(crate) fn space(&self) -> &Space<'a> {
        &self.space
    }

    /// Walks towards `query` on one layer, moving to a neighbour that orders
    /// strictly before the current node until none exists.
    pub(crate) fn greedy_search_layer(
        &self,
        query: &[f32],
        entry: Neighbour,
        layer: usize,
    ) -> Result<Neighbour, HnswError> {
        let mut current = entry;
        loop {
            let mut improved = false;
            for neighbour in self.graph.neighbours(current.id, layer)? {
                let candidate = Neighbour {
                    id: neighbour.id,
                    distance: self.space.to_query(query, neighbour.id)?,
                };
                if candidate < current {
                    current = candidate;
                    improved = true;
                }
            }
            if !improved {
                return Ok(current);
            }
        }
    }

    /// Best-first search returning up to `ef` neighbours, nearest first.
    pub(crate) fn search_layer(
        &self,
        query: &[f32],
        seeds: &[Neighbour],
        layer: usize,
        ef: usize,
    ) -> Result<Vec<Neighbour>, HnswError> {
        let mut state = SearchState::new(ef.max(1), seeds);
        while let Some(nearest) = state.candidates.pop_nearest() {
            if state.should_terminate(nearest) {
                break;
            }
            for neighbour in self.graph.neighbours(nearest.id, layer)? {
                if !state.visited.insert(neighbour.id) {
                    continue;
                }
                state.try_enqueue(Neighbour {
                    id: neighbour.id,
                    distance: self.space.to_query(query, neighbour.id)?,
                });
            }
        }

        #[cfg(feature = "metrics")]
        metrics::histogram!("hnsw_search_candidates").record(state.visited.len() as f64);

        Ok(state.best.into_sorted_vec())
    }
}
