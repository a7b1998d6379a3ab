//! Shared report store.
//!
//! Owns the one report every producer writes and the scheduler transmits,
//! plus the connection flag. The report and the flag sit behind separate
//! blocking mutexes because they are read and written independently.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::report::Report;

/// Monotonic (wrapping) counter of store writes.
pub type Generation = u32;

/// Returns `true` once `published` has caught up with `target`.
///
/// Wrap-safe as long as the two are less than half the counter range apart.
#[inline]
#[must_use]
pub fn generation_reached(published: Generation, target: Generation) -> bool {
    published.wrapping_sub(target) < Generation::MAX / 2
}

/// A consistent copy of the shared report together with the write that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub report: Report,
    pub generation: Generation,
}

#[derive(Clone, Copy)]
struct Slot {
    report: Report,
    generation: Generation,
}

/// Thread-safe owner of the shared report and the connection state.
pub struct ReportStore<M: RawMutex> {
    slot: Mutex<M, Cell<Slot>>,
    attached: Mutex<M, Cell<bool>>,
}

impl<M: RawMutex> Default for ReportStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> ReportStore<M> {
    /// Create a detached store holding the neutral report.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                report: Report::neutral(),
                generation: 0,
            })),
            attached: Mutex::new(Cell::new(false)),
        }
    }

    /// Current connection state.
    pub fn is_attached(&self) -> bool {
        self.attached.lock(Cell::get)
    }

    /// Flip the connection state. Only the handshake should call this.
    pub fn set_attached(&self, attached: bool) {
        self.attached.lock(|cell| cell.set(attached));
    }

    /// Overwrite the shared report, returning the generation of this write.
    pub fn replace(&self, report: Report) -> Generation {
        self.slot.lock(|cell| {
            let slot = cell.get();
            let generation = slot.generation.wrapping_add(1);
            cell.set(Slot { report, generation });
            generation
        })
    }

    /// Copy of the shared report.
    pub fn snapshot(&self) -> Report {
        self.slot.lock(|cell| cell.get().report)
    }

    /// Copy of the shared report and its generation, taken under one lock.
    pub fn snapshot_tagged(&self) -> Snapshot {
        self.slot.lock(|cell| {
            let slot = cell.get();
            Snapshot {
                report: slot.report,
                generation: slot.generation,
            }
        })
    }

    /// Generation of the most recent write.
    pub fn generation(&self) -> Generation {
        self.slot.lock(|cell| cell.get().generation)
    }
}
