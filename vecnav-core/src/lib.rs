//! Vecnav core library: approximate nearest-neighbour search over `f32`
//! vectors with a Hierarchical Navigable Small World graph.
//!
//! ```
//! use vecnav_core::{DistanceMetric, HnswIndex, HnswParams};
//!
//! let params = HnswParams::new(3, 16, 200)
//!     .expect("parameters must be valid")
//!     .with_metric(DistanceMetric::Cosine);
//! let index = HnswIndex::with_capacity(params, 16).expect("capacity must be valid");
//! index.insert(&[1.0, 0.0, 0.0], 1).expect("insert must succeed");
//! index.insert(&[0.0, 1.0, 0.0], 2).expect("insert must succeed");
//!
//! let hits = index.search(&[2.0, 0.1, 0.0], 1).expect("search must succeed");
//! assert_eq!(hits[0].label, 1);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod distance;
mod error;
#[cfg(feature = "cpu")]
mod hnsw;

pub use crate::distance::{
    DistanceError, DistanceMetric, inner_product_distance, l2_norm, normalise, squared_euclidean,
    validate_components,
};

#[cfg(feature = "cpu")]
#[cfg_attr(docsrs, doc(cfg(feature = "cpu")))]
pub use crate::hnsw::{
    HnswError, HnswErrorCode, HnswIndex, HnswInvariant, HnswInvariantChecker,
    HnswInvariantViolation, HnswParams, InternalId, Label, LayerConsistencyDetail, Neighbour,
    SearchHit,
};
