//! Per-device bookkeeping owned by the registry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::timer::TimerHandle;

/// Where a device instance is in the removal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Not tracked.
    Absent,
    /// Tracked and available.
    Present,
    /// Tracked, unavailable, waiting for the removal timer.
    PendingRemoval,
}

/// A scheduled removal. `generation` is unique per schedule and lets a late
/// timer recognize that it has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingRemoval {
    pub(crate) timer: TimerHandle,
    pub(crate) generation: u64,
}

#[derive(Debug)]
pub(crate) struct RegistryItem<D> {
    pub(crate) device: Arc<D>,
    pub(crate) pending_removal: Option<PendingRemoval>,
}

impl<D> RegistryItem<D> {
    pub(crate) fn new(device: Arc<D>) -> Self {
        Self {
            device,
            pending_removal: None,
        }
    }

    pub(crate) fn is_instance(&self, device: &Arc<D>) -> bool {
        Arc::ptr_eq(&self.device, device)
    }

    pub(crate) fn state(&self) -> ItemState {
        if self.pending_removal.is_some() {
            ItemState::PendingRemoval
        } else {
            ItemState::Present
        }
    }

    pub(crate) fn is_pending_generation(&self, generation: u64) -> bool {
        self.pending_removal
            .is_some_and(|pending| pending.generation == generation)
    }
}
