//! Structural invariant checks for the HNSW graph.
//!
//! The checkers are surfaced via [`crate::HnswIndex::invariants`] so tests
//! and diagnostics can assert graph health without reimplementing traversal.
//! Results are only meaningful while no insert is in flight.

use std::{collections::VecDeque, fmt};

use thiserror::Error;
use tracing::{Level, trace};

use super::{HnswIndex, error::HnswError, graph::Graph, node::Node, types::InternalId};

/// Enumerates the structural invariants of the graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HnswInvariant {
    /// Every edge targets a node that exists on the edge's layer, and the
    /// entry point sits on the top layer.
    LayerConsistency,
    /// No neighbour set exceeds `M` (or `2·M` on layer 0).
    DegreeBounds,
    /// Every node is reachable from the entry point on layer 0.
    Reachability,
    /// Every edge has a reverse edge on the same layer.
    ///
    /// Advisory: pruning keeps an evicted node's last edge even when its
    /// former owner is full, so a built graph may hold a few one-way edges.
    /// Not part of [`HnswInvariant::all`]; run it with
    /// [`HnswInvariantChecker::check`].
    BidirectionalLinks,
}

impl HnswInvariant {
    /// Returns the invariants every built graph upholds, in evaluation order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [
            Self::LayerConsistency,
            Self::DegreeBounds,
            Self::Reachability,
        ]
    }
}

/// Reason describing why a layer-consistency check failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LayerConsistencyDetail {
    /// The referenced node slot was never initialised.
    MissingNode,
    /// The referenced node exists but stops below the required layer.
    MissingLayer {
        /// Highest layer the node exposes.
        level: usize,
    },
}

impl fmt::Display for LayerConsistencyDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode => f.write_str("target node is missing"),
            Self::MissingLayer { level } => write!(f, "target node stops at layer {level}"),
        }
    }
}

/// Reports an invariant violation surfaced by [`HnswInvariantChecker`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HnswInvariantViolation {
    /// A node references a neighbour at a layer the neighbour does not expose.
    #[error("node {origin} references {target} at layer {layer}, but {detail}")]
    LayerConsistency {
        /// Node that emitted the invalid reference.
        origin: InternalId,
        /// Referenced neighbour identifier.
        target: InternalId,
        /// Layer index of the reference.
        layer: usize,
        /// Detailed failure reason.
        detail: LayerConsistencyDetail,
    },
    /// A node lives above the layer recorded for the entry point.
    #[error("node {node} reaches layer {level}, above the entry point at layer {entry_level}")]
    EntryBelowTop {
        /// Node found above the entry point.
        node: InternalId,
        /// Level of that node.
        level: usize,
        /// Level recorded for the entry point.
        entry_level: usize,
    },
    /// A node exceeded the degree bound for a specific layer.
    #[error("node {node} has {degree} connection(s) on layer {layer}, exceeding limit {limit}")]
    DegreeBounds {
        /// Node whose adjacency exceeded the allowed bound.
        node: InternalId,
        /// Layer containing the overflow.
        layer: usize,
        /// Actual neighbouring nodes counted.
        degree: usize,
        /// Maximum permitted neighbours for the layer.
        limit: usize,
    },
    /// Reported when a populated graph lacks an entry point.
    #[error("graph entry point missing despite populated nodes")]
    MissingEntryPoint,
    /// A node cannot be reached from the entry point on layer 0.
    #[error("node {node} is unreachable from the entry point")]
    UnreachableNode {
        /// Identifier of the unreachable node.
        node: InternalId,
    },
    /// A directed edge is missing its counterpart at the same layer.
    #[error("edge {origin}->{target} at layer {layer} is missing the reverse link")]
    MissingBacklink {
        /// Source node that exposes the one-way edge.
        origin: InternalId,
        /// Target node lacking the reverse edge.
        target: InternalId,
        /// Layer index containing the asymmetric edge.
        layer: usize,
    },
    /// Graph state could not be read because a lock was poisoned.
    #[error("graph state unreadable: {resource} lock poisoned")]
    Unreadable {
        /// Name of the poisoned resource.
        resource: &'static str,
    },
}

/// Decides whether a violation stops evaluation or is collected.
enum EvaluationMode<'a> {
    FailFast,
    Collect(&'a mut Vec<HnswInvariantViolation>),
}

impl EvaluationMode<'_> {
    fn record(&mut self, violation: HnswInvariantViolation) -> Result<(), HnswInvariantViolation> {
        match self {
            Self::FailFast => Err(violation),
            Self::Collect(sink) => {
                sink.push(violation);
                Ok(())
            }
        }
    }
}

fn violations_push(mode: &mut EvaluationMode<'_>, violation: HnswInvariantViolation) {
    if let EvaluationMode::Collect(sink) = mode {
        sink.push(violation);
    }
}

/// Helper returned by [`crate::HnswIndex::invariants`] to run structural checks.
#[derive(Debug)]
pub struct HnswInvariantChecker<'index> {
    index: &'index HnswIndex,
}

impl<'index> HnswInvariantChecker<'index> {
    pub(super) fn new(index: &'index HnswIndex) -> Self {
        Self { index }
    }

    /// Runs every invariant in [`HnswInvariant::all`], returning the first
    /// violation encountered.
    ///
    /// # Errors
    /// Returns the first [`HnswInvariantViolation`] found.
    ///
    /// # Examples
    /// ```
    /// use vecnav_core::{HnswIndex, HnswParams};
    ///
    /// let params = HnswParams::new(1, 4, 8).expect("params");
    /// let index = HnswIndex::with_capacity(params, 3).expect("capacity");
    /// for (label, value) in [0.0_f32, 1.0, 2.0].into_iter().enumerate() {
    ///     index.insert(&[value], label as u64).expect("insert");
    /// }
    /// index.invariants().check_all().expect("graph must be valid");
    /// ```
    pub fn check_all(&self) -> Result<(), HnswInvariantViolation> {
        self.check_many(HnswInvariant::all())
    }

    /// Runs a custom subset of invariants in the provided order.
    ///
    /// # Errors
    /// Returns the first [`HnswInvariantViolation`] found.
    pub fn check_many(
        &self,
        invariants: impl IntoIterator<Item = HnswInvariant>,
    ) -> Result<(), HnswInvariantViolation> {
        let mut mode = EvaluationMode::FailFast;
        for invariant in invariants {
            self.dispatch(invariant, &mut mode)?;
        }
        Ok(())
    }

    /// Runs a single invariant.
    ///
    /// # Errors
    /// Returns the first [`HnswInvariantViolation`] found.
    pub fn check(&self, invariant: HnswInvariant) -> Result<(), HnswInvariantViolation> {
        self.check_many([invariant])
    }

    /// Runs every invariant in [`HnswInvariant::all`] and returns all
    /// violations instead of stopping at the first.
    #[must_use]
    pub fn collect_all(&self) -> Vec<HnswInvariantViolation> {
        let mut violations = Vec::new();
        let mut mode = EvaluationMode::Collect(&mut violations);
        for invariant in HnswInvariant::all() {
            // Only lock failures escape collect mode.
            if let Err(err) = self.dispatch(invariant, &mut mode) {
                violations_push(&mut mode, err);
            }
        }
        violations
    }

    fn dispatch(
        &self,
        invariant: HnswInvariant,
        mode: &mut EvaluationMode<'_>,
    ) -> Result<(), HnswInvariantViolation> {
        trace!(?invariant, "checking invariant");
        let ctx = GraphContext {
            graph: self.index.graph(),
            published: self.index.arena().reserved(),
            max_connections: self.index.params().max_connections(),
        };
        match invariant {
            HnswInvariant::LayerConsistency => check_layer_consistency(ctx, mode),
            HnswInvariant::DegreeBounds => check_degree_bounds(ctx, mode),
            HnswInvariant::Reachability => check_reachability(ctx, mode),
            HnswInvariant::BidirectionalLinks => check_bidirectional(ctx, mode),
        }
    }
}

#[derive(Clone, Copy)]
struct GraphContext<'a> {
    graph: &'a Graph,
    published: usize,
    max_connections: usize,
}

impl<'a> GraphContext<'a> {
    fn nodes(self) -> impl Iterator<Item = (InternalId, &'a Node)> {
        (0..self.published).filter_map(move |id| self.graph.node(id).map(|node| (id, node)))
    }

    fn edges(self, node: &Node, layer: usize) -> Result<Vec<InternalId>, HnswInvariantViolation> {
        node.read(layer)
            .map(|set| set.iter().map(|neighbour| neighbour.id).collect())
            .map_err(|_| HnswInvariantViolation::Unreadable {
                resource: "neighbour set",
            })
    }

    fn ensure(
        self,
        origin: InternalId,
        target: InternalId,
        layer: usize,
    ) -> Result<&'a Node, HnswInvariantViolation> {
        let node = self
            .graph
            .node(target)
            .ok_or(HnswInvariantViolation::LayerConsistency {
                origin,
                target,
                layer,
                detail: LayerConsistencyDetail::MissingNode,
            })?;
        if node.level() < layer {
            return Err(HnswInvariantViolation::LayerConsistency {
                origin,
                target,
                layer,
                detail: LayerConsistencyDetail::MissingLayer {
                    level: node.level(),
                },
            });
        }
        Ok(node)
    }
}

fn entry_unreadable(_: HnswError) -> HnswInvariantViolation {
    HnswInvariantViolation::Unreadable {
        resource: "entry point",
    }
}

fn check_layer_consistency(
    ctx: GraphContext<'_>,
    mode: &mut EvaluationMode<'_>,
) -> Result<(), HnswInvariantViolation> {
    for (source, node) in ctx.nodes() {
        for layer in 0..=node.level() {
            for target in ctx.edges(node, layer)? {
                if let Err(err) = ctx.ensure(source, target, layer) {
                    mode.record(err)?;
                }
            }
        }
    }
    let Some(entry) = ctx.graph.entry().map_err(entry_unreadable)? else {
        return Ok(());
    };
    if let Err(err) = ctx.ensure(entry.node, entry.node, entry.level) {
        mode.record(err)?;
    }
    for (node_id, node) in ctx.nodes() {
        if node.level() > entry.level {
            mode.record(HnswInvariantViolation::EntryBelowTop {
                node: node_id,
                level: node.level(),
                entry_level: entry.level,
            })?;
        }
    }
    Ok(())
}

fn check_degree_bounds(
    ctx: GraphContext<'_>,
    mode: &mut EvaluationMode<'_>,
) -> Result<(), HnswInvariantViolation> {
    let upper = ctx.max_connections;
    let base_limit = upper.saturating_mul(2);
    for (node_id, node) in ctx.nodes() {
        for layer in 0..=node.level() {
            let limit = if layer == 0 { base_limit } else { upper };
            let degree = ctx.edges(node, layer)?.len();
            if degree > limit {
                mode.record(HnswInvariantViolation::DegreeBounds {
                    node: node_id,
                    layer,
                    degree,
                    limit,
                })?;
            }
        }
    }
    Ok(())
}

fn check_reachability(
    ctx: GraphContext<'_>,
    mode: &mut EvaluationMode<'_>,
) -> Result<(), HnswInvariantViolation> {
    if ctx.nodes().next().is_none() {
        return Ok(());
    }
    let Some(entry) = ctx.graph.entry().map_err(entry_unreadable)? else {
        return mode.record(HnswInvariantViolation::MissingEntryPoint);
    };

    let mut visited = vec![false; ctx.published];
    let mut queue = VecDeque::from([entry.node]);
    if let Some(slot) = visited.get_mut(entry.node) {
        *slot = true;
    }
    while let Some(node_id) = queue.pop_front() {
        let node = match ctx.ensure(node_id, node_id, 0) {
            Ok(node) => node,
            Err(err) => {
                mode.record(err)?;
                continue;
            }
        };
        for target in ctx.edges(node, 0)? {
            if let Some(seen) = visited.get_mut(target) {
                if !*seen {
                    *seen = true;
                    queue.push_back(target);
                }
            }
        }
    }

    for (node_id, _) in ctx.nodes() {
        if !visited[node_id] {
            mode.record(HnswInvariantViolation::UnreachableNode { node: node_id })?;
        }
    }
    Ok(())
}

fn check_bidirectional(
    ctx: GraphContext<'_>,
    mode: &mut EvaluationMode<'_>,
) -> Result<(), HnswInvariantViolation> {
    if tracing::enabled!(Level::TRACE) {
        let nodes = ctx.nodes().count();
        trace!(nodes, "checking bidirectional links");
    }
    for (source, node) in ctx.nodes() {
        for layer in 0..=node.level() {
            for target in ctx.edges(node, layer)? {
                let neighbour = match ctx.ensure(source, target, layer) {
                    Ok(neighbour) => neighbour,
                    Err(err) => {
                        mode.record(err)?;
                        continue;
                    }
                };
                if !ctx.edges(neighbour, layer)?.contains(&source) {
                    mode.record(HnswInvariantViolation::MissingBacklink {
                        origin: source,
                        target,
                        layer,
                    })?;
                }
            }
        }
    }
    Ok(())
}
