//! Tick completion signal.
//!
//! The scheduler publishes the generation of the snapshot it just handed to
//! the transport; submitters wait until the published generation covers
//! their own write. Only the latest value is kept, so bursts of ticks never
//! queue up.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::watch::{Receiver, Watch};

use crate::store::{generation_reached, Generation};

/// Single-slot broadcast of "snapshot with generation N has been sent".
///
/// `N` bounds how many submitters may wait at the same time.
pub struct CompletionSignal<M: RawMutex, const N: usize> {
    watch: Watch<M, Generation, N>,
}

impl<M: RawMutex, const N: usize> Default for CompletionSignal<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> CompletionSignal<M, N> {
    pub const fn new() -> Self {
        Self {
            watch: Watch::new(),
        }
    }

    /// Announce that the snapshot tagged `generation` has been transmitted.
    pub fn raise(&self, generation: Generation) {
        self.watch.sender().send(generation);
    }

    /// Claim one of the `N` waiter slots.
    ///
    /// Returns `None` when every slot is taken.
    pub fn waiter(&self) -> Option<CompletionWaiter<'_, M, N>> {
        self.watch.receiver().map(|receiver| CompletionWaiter { receiver })
    }
}

/// A claimed waiter slot. Dropping it frees the slot.
pub struct CompletionWaiter<'a, M: RawMutex, const N: usize> {
    receiver: Receiver<'a, M, Generation, N>,
}

impl<M: RawMutex, const N: usize> CompletionWaiter<'_, M, N> {
    /// Wait until a tick has transmitted generation `target` or a later one.
    pub async fn wait_for(&mut self, target: Generation) -> Generation {
        self.receiver
            .get_and(|published| generation_reached(*published, target))
            .await
    }
}
