//! Submission API used by every producer.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{with_timeout, Duration};

use crate::completion::CompletionSignal;
use crate::report::Report;
use crate::store::ReportStore;

/// Why a submission did not complete cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubmitError {
    /// No host attached; nothing was written.
    NotAttached,
    /// Report was stored but no tick confirmed it within the timeout. It will
    /// still go out on a later tick.
    DeliveryUncertain,
    /// Every waiter slot is in use; nothing was written.
    Busy,
}

/// Handle producers use to publish a report and wait for it to be sent.
///
/// Cheap to copy; all copies share the same store and completion signal.
pub struct Submitter<'a, M: RawMutex, const N: usize> {
    store: &'a ReportStore<M>,
    completion: &'a CompletionSignal<M, N>,
    timeout: Duration,
}

impl<M: RawMutex, const N: usize> Clone for Submitter<'_, M, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, const N: usize> Copy for Submitter<'_, M, N> {}

impl<'a, M: RawMutex, const N: usize> Submitter<'a, M, N> {
    pub fn new(
        store: &'a ReportStore<M>,
        completion: &'a CompletionSignal<M, N>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            completion,
            timeout,
        }
    }

    /// Whether the host is attached and submissions are accepted.
    pub fn is_attached(&self) -> bool {
        self.store.is_attached()
    }

    /// Publish `report` and wait until a tick has transmitted it.
    ///
    /// Fails fast with [`SubmitError::NotAttached`] while detached. Concurrent
    /// submissions are last-write-wins; several may ride on the same tick.
    pub async fn submit(&self, report: Report) -> Result<(), SubmitError> {
        if !self.store.is_attached() {
            warn!("submit rejected: gamepad not attached");
            return Err(SubmitError::NotAttached);
        }

        let Some(mut waiter) = self.completion.waiter() else {
            warn!("submit rejected: too many pending submissions");
            return Err(SubmitError::Busy);
        };

        let generation = self.store.replace(report);
        match with_timeout(self.timeout, waiter.wait_for(generation)).await {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!(
                    "submit: no tick within {} ms, delivery uncertain",
                    self.timeout.as_millis()
                );
                Err(SubmitError::DeliveryUncertain)
            }
        }
    }
}
