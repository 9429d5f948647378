//! Distance evaluation against stored vectors.

use crate::distance::DistanceMetric;

use super::{arena::VectorArena, error::HnswError, types::InternalId};

/// Pairs the arena with the index metric so graph code can measure ids.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Space<'a> {
    arena: &'a VectorArena,
    metric: DistanceMetric,
}

impl<'a> Space<'a> {
    pub(crate) fn new(arena: &'a VectorArena, metric: DistanceMetric) -> Self {
        Self { arena, metric }
    }

    pub(crate) fn vector(&self, id: InternalId) -> Result<&'a [f32], HnswError> {
        self.arena
            .get(id)
            .ok_or_else(|| HnswError::invariant(format!("vector {id} missing from arena")))
    }

    #[inline]
    pub(crate) fn to_query(&self, query: &[f32], id: InternalId) -> Result<f32, HnswError> {
        Ok(self.metric.distance(query, self.vector(id)?))
    }

    #[inline]
    pub(crate) fn between(&self, left: InternalId, right: InternalId) -> Result<f32, HnswError> {
        Ok(self.metric.distance(self.vector(left)?, self.vector(right)?))
    }
}
