use arc_swap::ArcSwap;
use log::debug;
use std::sync::Arc;

use crate::params::{ParameterId, ParameterSnapshot};

/// Host-side parameter source shared between the editing side and the audio thread.
///
/// Writers publish a whole new snapshot; the audio thread loads the current one
/// once per block, so it always sees all six values from the same instant.
pub struct ParameterStore {
    current: ArcSwap<ParameterSnapshot>,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(ParameterSnapshot::default())
    }
}

impl ParameterStore {
    pub fn new(initial: ParameterSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial.clamped()),
        }
    }

    /// Lock-free read of the current values.
    #[inline]
    pub fn snapshot(&self) -> ParameterSnapshot {
        **self.current.load()
    }

    /// Set one control, clamped to its declared range.
    pub fn set(&self, id: ParameterId, value: f32) {
        let value = id.spec().clamp(value);
        self.current
            .rcu(|current| Arc::new(current.with(id, value)));
        debug!("Parameter {id} set to {value}");
    }

    /// Set one control from its normalized 0..1 position.
    pub fn set_normalized(&self, id: ParameterId, normalized: f32) {
        self.set(id, id.spec().denormalize(normalized));
    }

    pub fn get(&self, id: ParameterId) -> f32 {
        self.snapshot().get(id)
    }

    /// Replace every value at once, e.g. after loading saved state.
    pub fn replace(&self, snapshot: ParameterSnapshot) {
        self.current.store(Arc::new(snapshot.clamped()));
        debug!("Parameters replaced: {snapshot:?}");
    }
}
