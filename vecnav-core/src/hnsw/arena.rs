//! Append-only storage for indexed vectors.
//!
//! Slots are allocated up front for the full capacity. An id is reserved
//! with a single atomic update and its slot is published exactly once, so
//! readers never take a lock.

use std::sync::{
    OnceLock,
    atomic::{AtomicUsize, Ordering},
};

use super::{
    error::HnswError,
    types::{InternalId, Label},
};

#[derive(Debug)]
struct StoredVector {
    components: Box<[f32]>,
    label: Label,
}

#[derive(Debug)]
pub(crate) struct VectorArena {
    slots: Vec<OnceLock<StoredVector>>,
    next_id: AtomicUsize,
}

impl VectorArena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            next_id: AtomicUsize::new(0),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of ids handed out so far, including slots still being written.
    pub(crate) fn reserved(&self) -> usize {
        self.next_id.load(Ordering::Acquire)
    }

    /// Reserves the next id and publishes `components` under it.
    pub(crate) fn store(&self, components: Vec<f32>, label: Label) -> Result<InternalId, HnswError> {
        let capacity = self.capacity();
        let id = self
            .next_id
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < capacity).then_some(current + 1)
            })
            .map_err(|_| HnswError::CapacityExceeded { capacity })?;
        let slot = self
            .slots
            .get(id)
            .ok_or_else(|| HnswError::invariant(format!("arena slot {id} out of bounds")))?;
        slot.set(StoredVector {
            components: components.into_boxed_slice(),
            label,
        })
        .map_err(|_| HnswError::invariant(format!("arena slot {id} published twice")))?;
        Ok(id)
    }

    #[inline]
    pub(crate) fn get(&self, id: InternalId) -> Option<&[f32]> {
        self.slots
            .get(id)
            .and_then(OnceLock::get)
            .map(|stored| &*stored.components)
    }

    pub(crate) fn label(&self, id: InternalId) -> Option<Label> {
        self.slots
            .get(id)
            .and_then(OnceLock::get)
            .map(|stored| stored.label)
    }
}
