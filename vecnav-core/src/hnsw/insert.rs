//! Links freshly stored vectors into the layered graph.
//!
//! The node is published before any edge is created so concurrent searches
//! that reach it through a new link always find its neighbour sets.

use super::{
    error::HnswError,
    graph::{EdgeRequest, Graph},
    params::HnswParams,
    search::LayerSearcher,
    select::select_neighbours,
    space::Space,
    types::{InternalId, Neighbour},
};

/// Per-insert view over the shared index state.
#[derive(Debug)]
pub(crate) struct Inserter<'a> {
    graph: &'a Graph,
    searcher: LayerSearcher<'a>,
    params: &'a HnswParams,
    ef_construction: usize,
}

/// Summary of a completed link pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LinkOutcome {
    pub(crate) promoted: bool,
    pub(crate) pruned: usize,
}

impl<'a> Inserter<'a> {
    pub(crate) fn new(
        graph: &'a Graph,
        space: Space<'a>,
        params: &'a HnswParams,
        ef_construction: usize,
    ) -> Self {
        Self {
            graph,
            searcher: LayerSearcher::new(graph, space),
            params,
            // Narrower searches than M starve the selection heuristic.
            ef_construction: ef_construction.max(params.max_connections()),
        }
    }

    /// Publishes node `id` at `level` and connects it on every layer it
    /// shares with the current entry point.
    pub(crate) fn link(&self, id: InternalId, level: usize) -> Result<LinkOutcome, HnswError> {
        self.graph.insert_node(id, level)?;
        if self.graph.try_set_initial_entry(id, level)? {
            return Ok(LinkOutcome {
                promoted: true,
                pruned: 0,
            });
        }
        let entry = self
            .graph
            .entry()?
            .ok_or_else(|| HnswError::invariant("entry point vanished during insert"))?;

        let space = self.searcher.space();
        let query = space.vector(id)?;
        let mut seed = Neighbour {
            id: entry.node,
            distance: space.to_query(query, entry.node)?,
        };
        for layer in (level + 1..=entry.level).rev() {
            seed = self.searcher.greedy_search_layer(query, seed, layer)?;
        }

        let mut seeds = vec![seed];
        let mut pruned = 0;
        for layer in (0..=level.min(entry.level)).rev() {
            let mut candidates =
                self.searcher
                    .search_layer(query, &seeds, layer, self.ef_construction)?;
            candidates.retain(|candidate| candidate.id != id);
            let capacity = self.params.layer_capacity(layer);
            for neighbour in select_neighbours(&candidates, capacity, space)? {
                pruned += self.graph.connect(
                    EdgeRequest {
                        origin: id,
                        target: neighbour.id,
                        layer,
                        distance: neighbour.distance,
                        capacity,
                    },
                    space,
                )?;
            }
            if !candidates.is_empty() {
                seeds = candidates;
            }
        }

        let promoted = self.graph.set_entry_if_higher(id, level)?;
        Ok(LinkOutcome { promoted, pruned })
    }
}
