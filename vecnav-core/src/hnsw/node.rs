//! Node storage for the HNSW graph.
//!
//! Each node owns one independently locked neighbour set per layer, from
//! layer 0 up to the level drawn at insertion.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{error::HnswError, types::Neighbour};

#[derive(Debug)]
pub(crate) struct Node {
    layers: Box<[RwLock<Vec<Neighbour>>]>,
}

impl Node {
    pub(crate) fn new(level: usize) -> Self {
        Self {
            layers: (0..=level).map(|_| RwLock::new(Vec::new())).collect(),
        }
    }

    pub(crate) fn level(&self) -> usize {
        self.layers.len() - 1
    }

    fn layer(&self, layer: usize) -> Result<&RwLock<Vec<Neighbour>>, HnswError> {
        self.layers.get(layer).ok_or_else(|| {
            HnswError::invariant(format!(
                "layer {layer} requested on a node of level {}",
                self.level()
            ))
        })
    }

    pub(crate) fn read(&self, layer: usize) -> Result<RwLockReadGuard<'_, Vec<Neighbour>>, HnswError> {
        self.layer(layer)?
            .read()
            .map_err(|_| HnswError::poisoned("neighbour set"))
    }

    pub(crate) fn write(
        &self,
        layer: usize,
    ) -> Result<RwLockWriteGuard<'_, Vec<Neighbour>>, HnswError> {
        self.layer(layer)?
            .write()
            .map_err(|_| HnswError::poisoned("neighbour set"))
    }
}
