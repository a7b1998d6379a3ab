//! USB bus state as seen by the transport.
//!
//! The device stack reports bus events through callbacks; [`UsbLinkState`]
//! folds them into the mounted/suspended flags the scheduler polls once per
//! tick. Lock-free so the callbacks can run in any context.

use portable_atomic::{AtomicBool, Ordering};

/// Enabled/configured/suspended flags shared between the device stack and
/// the transport.
pub struct UsbLinkState {
    enabled: AtomicBool,
    configured: AtomicBool,
    suspended: AtomicBool,
}

impl UsbLinkState {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            configured: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }

    /// Bus connected (VBUS present and the peripheral enabled).
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Host has set a configuration.
    pub fn is_mounted(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Peripheral enabled or disabled. Disabling forgets everything.
    pub fn on_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        if !enabled {
            self.configured.store(false, Ordering::Release);
            self.suspended.store(false, Ordering::Release);
        }
    }

    /// Bus reset. The stack leaves suspend on reset without a separate
    /// resume callback, so both flags are cleared here.
    pub fn on_reset(&self) {
        self.configured.store(false, Ordering::Release);
        self.suspended.store(false, Ordering::Release);
    }

    pub fn on_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Release);
    }

    pub fn on_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }
}

impl Default for UsbLinkState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::completion::CompletionSignal;
    use crate::config::HidConfig;
    use crate::handshake::{HandshakeConfig, LinkPhase};
    use crate::report::Report;
    use crate::scheduler::TransmissionScheduler;
    use crate::store::ReportStore;
    use crate::transport::{HidTransport, TransportError};
    use core::future::Future;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_time::Duration;

    /// Transport whose bus state comes straight from a link.
    struct LinkTransport<'a> {
        link: &'a UsbLinkState,
    }

    impl HidTransport for LinkTransport<'_> {
        fn is_mounted(&self) -> bool {
            self.link.is_mounted()
        }

        fn is_suspended(&self) -> bool {
            self.link.is_suspended()
        }

        fn transmit(&mut self, _report: &Report) -> impl Future<Output = Result<(), TransportError>> {
            core::future::ready(Ok(()))
        }
    }

    fn enumerate(link: &UsbLinkState) {
        link.on_enabled(true);
        link.on_reset();
        link.on_configured(true);
    }

    #[test]
    fn test_enumeration_mounts() {
        let link = UsbLinkState::new();
        assert!(!link.is_enabled());
        assert!(!link.is_mounted());

        enumerate(&link);
        assert!(link.is_enabled());
        assert!(link.is_mounted());
        assert!(!link.is_suspended());
    }

    #[test]
    fn test_reset_clears_suspend() {
        let link = UsbLinkState::new();
        enumerate(&link);
        link.on_suspended(true);
        assert!(link.is_suspended());

        // Host wakes the bus with a reset instead of a resume
        link.on_reset();
        assert!(!link.is_suspended());
        assert!(!link.is_mounted());
        link.on_configured(true);
        assert!(link.is_mounted());
        assert!(!link.is_suspended());
    }

    #[test]
    fn test_disable_forgets_state() {
        let link = UsbLinkState::new();
        enumerate(&link);
        link.on_suspended(true);

        link.on_enabled(false);
        assert!(!link.is_enabled());
        assert!(!link.is_mounted());
        assert!(!link.is_suspended());
    }

    #[test]
    fn test_handshake_reruns_after_suspend_then_reset() {
        let link = UsbLinkState::new();
        let store = ReportStore::<CriticalSectionRawMutex>::new();
        let signal = CompletionSignal::<CriticalSectionRawMutex, 2>::new();
        let config = HidConfig::DEFAULT.with_handshake(HandshakeConfig {
            settle: Duration::from_millis(10),
            press_hold: Duration::from_millis(10),
            release_hold: Duration::from_millis(10),
        });
        let mut scheduler =
            TransmissionScheduler::new(&store, &signal, LinkTransport { link: &link }, &config);

        enumerate(&link);
        for _ in 0..10 {
            block_on(scheduler.tick());
        }
        assert!(store.is_attached());

        // Console goes to sleep
        link.on_suspended(true);
        block_on(scheduler.tick());
        assert!(!store.is_attached());

        // ...and wakes the pad with a bus reset and re-enumeration
        link.on_reset();
        link.on_configured(true);
        for _ in 0..10 {
            block_on(scheduler.tick());
        }
        assert_eq!(scheduler.phase(), LinkPhase::Attached);
        assert!(store.is_attached());
    }
}
