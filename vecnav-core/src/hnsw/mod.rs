//! Hierarchical Navigable Small World (HNSW) index over in-memory vectors.
//!
//! Vectors live in a pre-allocated arena addressed by dense internal ids.
//! The graph keeps one lock per (node, layer) neighbour set, so rayon
//! workers and scoped threads can insert and search through `&HnswIndex`
//! concurrently without a graph-wide lock.

mod arena;
mod error;
mod graph;
mod index;
mod insert;
mod invariants;
mod level;
mod node;
mod params;
mod queue;
mod search;
mod select;
mod space;
mod types;

pub use self::{
    error::{HnswError, HnswErrorCode},
    index::HnswIndex,
    invariants::{
        HnswInvariant, HnswInvariantChecker, HnswInvariantViolation, LayerConsistencyDetail,
    },
    params::HnswParams,
    types::{InternalId, Label, Neighbour, SearchHit},
};

#[cfg(test)]
mod tests;
