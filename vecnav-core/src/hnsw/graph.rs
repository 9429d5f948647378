//! Graph store for the HNSW index.
//!
//! Nodes live in pre-allocated once-set slots indexed by internal id. Edges
//! are guarded per (node, layer) so concurrent inserts only contend when
//! they touch the same neighbour set. Writers hold at most two sets at a
//! time and always lock the lower id first, including while an eviction is
//! reconciled.

use std::sync::{OnceLock, RwLock};

use tracing::debug;

use super::{
    error::HnswError,
    node::Node,
    select::select_neighbours,
    space::Space,
    types::{EntryPoint, InternalId, Neighbour},
};

#[derive(Debug)]
pub(crate) struct Graph {
    nodes: Vec<OnceLock<Node>>,
    entry: RwLock<Option<EntryPoint>>,
}

/// Describes a single mirrored edge to create.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EdgeRequest {
    pub(crate) origin: InternalId,
    pub(crate) target: InternalId,
    pub(crate) layer: usize,
    pub(crate) distance: f32,
    pub(crate) capacity: usize,
}

impl Graph {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: (0..capacity).map(|_| OnceLock::new()).collect(),
            entry: RwLock::new(None),
        }
    }

    pub(crate) fn insert_node(&self, id: InternalId, level: usize) -> Result<(), HnswError> {
        let slot = self
            .nodes
            .get(id)
            .ok_or_else(|| HnswError::invariant(format!("node slot {id} out of bounds")))?;
        slot.set(Node::new(level))
            .map_err(|_| HnswError::invariant(format!("node {id} inserted twice")))
    }

    pub(crate) fn node(&self, id: InternalId) -> Option<&Node> {
        self.nodes.get(id).and_then(OnceLock::get)
    }

    pub(crate) fn node_or_err(&self, id: InternalId) -> Result<&Node, HnswError> {
        self.node(id)
            .ok_or_else(|| HnswError::invariant(format!("node {id} missing from graph")))
    }

    /// Copies the neighbour set of `id` on `layer`.
    pub(crate) fn neighbours(
        &self,
        id: InternalId,
        layer: usize,
    ) -> Result<Vec<Neighbour>, HnswError> {
        Ok(self.node_or_err(id)?.read(layer)?.clone())
    }

    pub(crate) fn entry(&self) -> Result<Option<EntryPoint>, HnswError> {
        self.entry
            .read()
            .map(|guard| *guard)
            .map_err(|_| HnswError::poisoned("entry point"))
    }

    /// Records `node` as the first entry point. Returns `false` when another
    /// insert got there first.
    pub(crate) fn try_set_initial_entry(
        &self,
        node: InternalId,
        level: usize,
    ) -> Result<bool, HnswError> {
        if self.entry()?.is_some() {
            return Ok(false);
        }
        let mut guard = self
            .entry
            .write()
            .map_err(|_| HnswError::poisoned("entry point"))?;
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(EntryPoint { node, level });
        Ok(true)
    }

    /// Promotes `node` to entry point when `level` exceeds the current top.
    pub(crate) fn set_entry_if_higher(
        &self,
        node: InternalId,
        level: usize,
    ) -> Result<bool, HnswError> {
        if self.entry()?.is_some_and(|current| level <= current.level) {
            return Ok(false);
        }
        let mut guard = self
            .entry
            .write()
            .map_err(|_| HnswError::poisoned("entry point"))?;
        if guard.is_some_and(|current| level <= current.level) {
            return Ok(false);
        }
        let previous = guard.replace(EntryPoint { node, level });
        debug!(node, level, previous = ?previous, "promoted entry point");
        Ok(true)
    }

    /// Links `origin` and `target` in both directions on one layer.
    ///
    /// A side pushed past `capacity` is pruned with the selection heuristic.
    /// Every evicted neighbour is then reconciled with its former owner, see
    /// [`Graph::reconcile_eviction`]. Returns the number of sets that were
    /// pruned.
    pub(crate) fn connect(&self, edge: EdgeRequest, space: &Space<'_>) -> Result<usize, HnswError> {
        let EdgeRequest {
            origin,
            target,
            layer,
            distance,
            capacity,
        } = edge;
        if origin == target {
            return Ok(0);
        }
        let (low, high) = ascending(origin, target);
        let low_node = self.node_or_err(low)?;
        let high_node = self.node_or_err(high)?;

        let mut evictions: Vec<(InternalId, InternalId)> = Vec::new();
        let mut pruned = 0;
        {
            let mut low_set = low_node.write(layer)?;
            let mut high_set = high_node.write(layer)?;
            for (owner, set, other) in [(low, &mut *low_set, high), (high, &mut *high_set, low)] {
                if !set.iter().any(|neighbour| neighbour.id == other) {
                    set.push(Neighbour {
                        id: other,
                        distance,
                    });
                }
                if set.len() <= capacity {
                    continue;
                }
                let kept = select_neighbours(set, capacity, space)?;
                evictions.extend(
                    set.iter()
                        .filter(|neighbour| !kept.iter().any(|k| k.id == neighbour.id))
                        .map(|neighbour| (owner, neighbour.id)),
                );
                debug!(node = owner, layer, before = set.len(), after = kept.len(), "pruned neighbour set");
                *set = kept;
                pruned += 1;
            }
        }

        for (owner, evicted) in evictions {
            self.reconcile_eviction(owner, evicted, layer, capacity)?;
        }
        Ok(pruned)
    }

    /// Restores symmetry after `owner` dropped `evicted` from its set.
    ///
    /// Both sets are locked in ascending id order. If the pair was linked
    /// again in the meantime nothing changes. Otherwise the reverse edge is
    /// removed, unless it is the last edge of `evicted`: then the forward
    /// edge is restored when `owner` has room below `capacity`. A one-way
    /// edge remains only when it has neither.
    fn reconcile_eviction(
        &self,
        owner: InternalId,
        evicted: InternalId,
        layer: usize,
        capacity: usize,
    ) -> Result<(), HnswError> {
        let (low, high) = ascending(owner, evicted);
        let mut low_set = self.node_or_err(low)?.write(layer)?;
        let mut high_set = self.node_or_err(high)?.write(layer)?;
        let (owner_set, evicted_set) = if owner == low {
            (&mut *low_set, &mut *high_set)
        } else {
            (&mut *high_set, &mut *low_set)
        };

        if owner_set.iter().any(|neighbour| neighbour.id == evicted) {
            return Ok(());
        }
        let Some(position) = evicted_set.iter().position(|neighbour| neighbour.id == owner) else {
            return Ok(());
        };
        if evicted_set.len() > 1 {
            evicted_set.remove(position);
        } else if owner_set.len() < capacity {
            let distance = evicted_set[position].distance;
            owner_set.push(Neighbour {
                id: evicted,
                distance,
            });
            debug!(node = owner, restored = evicted, layer, "restored last edge of evicted node");
        }
        Ok(())
    }
}

fn ascending(left: InternalId, right: InternalId) -> (InternalId, InternalId) {
    if left < right { (left, right) } else { (right, left) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{distance::DistanceMetric, hnsw::arena::VectorArena};

    fn line(count: usize) -> (VectorArena, Graph) {
        let arena = VectorArena::with_capacity(count);
        let graph = Graph::with_capacity(count);
        for id in 0..count {
            arena.store(vec![id as f32, 0.0], id as u64).expect("room");
            graph.insert_node(id, 0).expect("fresh slot");
        }
        (arena, graph)
    }

    fn edge(origin: usize, target: usize, space: &Space<'_>, capacity: usize) -> EdgeRequest {
        EdgeRequest {
            origin,
            target,
            layer: 0,
            distance: space.between(origin, target).expect("stored"),
            capacity,
        }
    }

    #[test]
    fn connect_mirrors_edges() {
        let (arena, graph) = line(2);
        let space = Space::new(&arena, DistanceMetric::L2);
        let pruned = graph.connect(edge(1, 0, &space, 4), &space).expect("connect");
        assert_eq!(pruned, 0);
        assert_eq!(graph.neighbours(0, 0).expect("node 0")[0].id, 1);
        assert_eq!(graph.neighbours(1, 0).expect("node 1")[0].id, 0);
    }

    #[test]
    fn connect_is_idempotent() {
        let (arena, graph) = line(2);
        let space = Space::new(&arena, DistanceMetric::L2);
        graph.connect(edge(0, 1, &space, 4), &space).expect("connect");
        graph.connect(edge(1, 0, &space, 4), &space).expect("connect");
        assert_eq!(graph.neighbours(0, 0).expect("node 0").len(), 1);
    }

    #[test]
    fn overflow_prunes_and_drops_reverse_edge() {
        // Node 0 sits at the origin; 1, 2 and 3 lie on one ray.
        let (arena, graph) = line(4);
        let space = Space::new(&arena, DistanceMetric::L2);
        graph.connect(edge(0, 1, &space, 2), &space).expect("connect");
        graph.connect(edge(0, 2, &space, 2), &space).expect("connect");
        graph.connect(edge(1, 2, &space, 2), &space).expect("connect");
        let pruned = graph.connect(edge(3, 2, &space, 2), &space).expect("connect");
        assert_eq!(pruned, 1);

        let of_two: Vec<_> = graph
            .neighbours(2, 0)
            .expect("node 2")
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(of_two, vec![1, 3]);
        let of_zero: Vec<_> = graph
            .neighbours(0, 0)
            .expect("node 0")
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(of_zero, vec![1]);
    }

    #[test]
    fn full_owner_leaves_the_last_edge_one_way() {
        let (arena, graph) = line(3);
        let space = Space::new(&arena, DistanceMetric::L2);
        graph.connect(edge(0, 2, &space, 1), &space).expect("connect");
        graph.connect(edge(1, 2, &space, 1), &space).expect("connect");
        // Node 2 keeps only 1 and has no room to take 0 back; node 0 must
        // not be left without neighbours.
        assert_eq!(graph.neighbours(2, 0).expect("node 2")[0].id, 1);
        assert_eq!(graph.neighbours(0, 0).expect("node 0")[0].id, 2);
    }

    #[test]
    fn last_edge_of_an_evicted_node_is_restored_when_owner_has_room() {
        // 0 keeps only 1 after pruning; 3 had no other neighbour.
        let (arena, graph) = line(4);
        let space = Space::new(&arena, DistanceMetric::L2);
        graph.connect(edge(0, 1, &space, 2), &space).expect("connect");
        graph.connect(edge(1, 2, &space, 2), &space).expect("connect");
        graph.connect(edge(0, 2, &space, 2), &space).expect("connect");
        let pruned = graph.connect(edge(0, 3, &space, 2), &space).expect("connect");
        assert_eq!(pruned, 1);

        let ids = |node| -> Vec<usize> {
            graph
                .neighbours(node, 0)
                .expect("node exists")
                .iter()
                .map(|n| n.id)
                .collect()
        };
        assert_eq!(ids(0), vec![1, 3]);
        assert_eq!(ids(1), vec![0, 2]);
        assert_eq!(ids(2), vec![1]);
        assert_eq!(ids(3), vec![0]);
    }

    #[test]
    fn relinked_pairs_survive_reconciliation() {
        let (arena, graph) = line(3);
        let space = Space::new(&arena, DistanceMetric::L2);
        graph.connect(edge(0, 1, &space, 4), &space).expect("connect");
        graph.connect(edge(1, 2, &space, 4), &space).expect("connect");
        graph.reconcile_eviction(0, 1, 0, 4).expect("reconcile");
        assert_eq!(graph.neighbours(0, 0).expect("node 0")[0].id, 1);
        assert_eq!(graph.neighbours(1, 0).expect("node 1").len(), 2);
    }

    #[test]
    fn entry_point_promotes_only_upwards() {
        let graph = Graph::with_capacity(3);
        assert!(graph.try_set_initial_entry(0, 1).expect("entry"));
        assert!(!graph.try_set_initial_entry(1, 4).expect("entry"));
        assert!(!graph.set_entry_if_higher(1, 1).expect("entry"));
        assert!(graph.set_entry_if_higher(2, 3).expect("entry"));
        assert_eq!(
            graph.entry().expect("entry"),
            Some(EntryPoint { node: 2, level: 3 })
        );
    }

    #[test]
    fn missing_layers_are_invariant_violations() {
        let graph = Graph::with_capacity(1);
        graph.insert_node(0, 0).expect("fresh slot");
        let err = graph.neighbours(0, 2).expect_err("node has one layer");
        assert!(matches!(err, HnswError::GraphInvariantViolation { .. }));
    }
}
