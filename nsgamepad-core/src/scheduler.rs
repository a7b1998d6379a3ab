//! TransmissionScheduler: the periodic task that feeds the transport.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};

use crate::completion::CompletionSignal;
use crate::config::HidConfig;
use crate::handshake::{Handshake, HandshakeAction, HandshakeTiming, LinkPhase};
use crate::report::Report;
use crate::store::{Generation, ReportStore};
use crate::transport::{HidTransport, TransportError};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Device not mounted; nothing happened, no signal raised.
    Unmounted,
    /// Tick spent on the connection handshake.
    Handshaking,
    /// Store snapshot with this generation was handed to the transport.
    Transmitted(Generation),
}

/// Periodic driver that owns the handshake and is the only path from the
/// shared report to the transport.
///
/// Every mounted tick ends by raising the completion signal, so a submitter
/// waits at most one period once its report is in the store.
pub struct TransmissionScheduler<'a, M: RawMutex, T, const N: usize> {
    store: &'a ReportStore<M>,
    completion: &'a CompletionSignal<M, N>,
    transport: T,
    handshake: Handshake,
    period: Duration,
    last_sent: Generation,
}

impl<'a, M: RawMutex, T: HidTransport, const N: usize> TransmissionScheduler<'a, M, T, N> {
    pub fn new(
        store: &'a ReportStore<M>,
        completion: &'a CompletionSignal<M, N>,
        transport: T,
        config: &HidConfig,
    ) -> Self {
        let timing = HandshakeTiming::new(&config.handshake, config.tick_period);
        Self {
            store,
            completion,
            transport,
            handshake: Handshake::new(timing),
            period: config.tick_period,
            last_sent: store.generation(),
        }
    }

    /// Run ticks forever at the configured period.
    ///
    /// Deadlines advance from the previous deadline, not from when the
    /// previous tick finished, so a slow tick does not shift later ones.
    pub async fn run(&mut self) -> ! {
        info!("transmission scheduler running, period {} ms", self.period.as_millis());
        let mut ticker = Ticker::every(self.period);
        loop {
            self.tick().await;
            ticker.next().await;
        }
    }

    /// Execute one tick.
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.transport.is_mounted() {
            return TickOutcome::Unmounted;
        }

        let suspended = self.transport.is_suspended();
        let attached = self.store.is_attached();

        let outcome = match self.handshake.advance(suspended, attached) {
            HandshakeAction::Begin(frame) => {
                self.last_sent = self.store.replace(frame);
                self.send(&frame).await;
                TickOutcome::Handshaking
            }
            HandshakeAction::Send(frame) => {
                self.send(&frame).await;
                TickOutcome::Handshaking
            }
            HandshakeAction::Hold => TickOutcome::Handshaking,
            HandshakeAction::Attach => {
                self.store.set_attached(true);
                info!("gamepad connected");
                self.transmit_snapshot().await
            }
            HandshakeAction::Detach => {
                self.store.set_attached(false);
                info!("gamepad disconnected");
                self.transmit_snapshot().await
            }
            HandshakeAction::None => self.transmit_snapshot().await,
        };

        self.completion.raise(self.last_sent);
        outcome
    }

    async fn transmit_snapshot(&mut self) -> TickOutcome {
        let snapshot = self.store.snapshot_tagged();
        self.send(&snapshot.report).await;
        self.last_sent = snapshot.generation;
        TickOutcome::Transmitted(snapshot.generation)
    }

    async fn send(&mut self, report: &Report) {
        match self.transport.transmit(report).await {
            Ok(()) => {}
            // Expected while the host has us suspended
            Err(TransportError::NotReady) => trace!("transport not ready, report dropped"),
            Err(e) => warn!("transport error: {:?}", e),
        }
    }

    /// Current connection phase.
    pub fn phase(&self) -> LinkPhase {
        self.handshake.phase()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::handshake::HandshakeConfig;
    use crate::report::{Button, StickSide};
    use crate::transport::mock::MockTransport;
    use embassy_futures::block_on;
    use embassy_futures::select::{select, Either};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::vec::Vec;

    type Store = ReportStore<CriticalSectionRawMutex>;
    type Signal = CompletionSignal<CriticalSectionRawMutex, 2>;

    fn quick_config() -> HidConfig {
        HidConfig::DEFAULT.with_handshake(HandshakeConfig {
            settle: Duration::from_millis(30),
            press_hold: Duration::from_millis(10),
            release_hold: Duration::from_millis(10),
        })
    }

    fn signal_raised_for(signal: &Signal, generation: Generation) -> bool {
        let mut waiter = signal.waiter().unwrap();
        let outcome = block_on(select(waiter.wait_for(generation), core::future::ready(())));
        matches!(outcome, Either::First(_))
    }

    #[test]
    fn test_unmounted_tick_is_a_no_op() {
        let store = Store::new();
        let signal = Signal::new();
        let transport = MockTransport::unmounted();
        let sent = transport.sent.clone();
        let mut scheduler = TransmissionScheduler::new(&store, &signal, transport, &quick_config());

        assert_eq!(block_on(scheduler.tick()), TickOutcome::Unmounted);
        assert!(sent.lock().unwrap().is_empty());
        assert!(!signal_raised_for(&signal, 0));
        assert_eq!(scheduler.phase(), LinkPhase::Detached);
        assert!(!store.is_attached());
    }

    #[test]
    fn test_handshake_sequence_then_attached() {
        let store = Store::new();
        let signal = Signal::new();
        let transport = MockTransport::mounted();
        let sent = transport.sent.clone();
        let config = quick_config();
        let mut scheduler = TransmissionScheduler::new(&store, &signal, transport, &config);

        let total = HandshakeTiming::new(&config.handshake, config.tick_period).total_ticks();
        assert_eq!(total, 6);

        let mut attach_flips = 0;
        let mut was_attached = store.is_attached();
        for _ in 0..total {
            block_on(scheduler.tick());
            if store.is_attached() != was_attached {
                attach_flips += 1;
                was_attached = store.is_attached();
            }
        }
        assert_eq!(attach_flips, 1);
        assert!(store.is_attached());
        assert_eq!(scheduler.phase(), LinkPhase::Attached);

        let mut pressed = Report::neutral();
        pressed.press(Button::WAKE);
        let frames: Vec<Report> = sent.lock().unwrap().clone();
        assert_eq!(
            frames,
            [Report::neutral(), pressed, Report::neutral(), Report::neutral()]
        );
    }

    #[test]
    fn test_handshake_resets_shared_report() {
        let store = Store::new();
        let signal = Signal::new();
        let mut stale = Report::neutral();
        stale.press(Button::Home);
        store.replace(stale);

        let mut scheduler =
            TransmissionScheduler::new(&store, &signal, MockTransport::mounted(), &quick_config());
        assert_eq!(block_on(scheduler.tick()), TickOutcome::Handshaking);
        assert_eq!(store.snapshot(), Report::neutral());
    }

    #[test]
    fn test_attached_tick_transmits_snapshot_and_signals() {
        let store = Store::new();
        let signal = Signal::new();
        let transport = MockTransport::mounted();
        let sent = transport.sent.clone();
        let mut scheduler = TransmissionScheduler::new(&store, &signal, transport, &quick_config());
        while !store.is_attached() {
            block_on(scheduler.tick());
        }

        let mut report = Report::neutral();
        report.press(Button::A);
        report.set_axis(StickSide::Left, 0x00, 0xFF);
        let generation = store.replace(report);
        assert!(!signal_raised_for(&signal, generation));

        assert_eq!(
            block_on(scheduler.tick()),
            TickOutcome::Transmitted(generation)
        );
        assert_eq!(sent.lock().unwrap().last().copied(), Some(report));
        assert!(signal_raised_for(&signal, generation));
    }

    #[test]
    fn test_signal_raised_every_tick_without_new_writes() {
        let store = Store::new();
        let signal = Signal::new();
        let transport = MockTransport::mounted();
        let sent = transport.sent.clone();
        let mut scheduler = TransmissionScheduler::new(&store, &signal, transport, &quick_config());
        while !store.is_attached() {
            block_on(scheduler.tick());
        }
        let before = sent.lock().unwrap().len();

        for _ in 0..3 {
            block_on(scheduler.tick());
            assert!(signal_raised_for(&signal, store.generation()));
        }
        assert_eq!(sent.lock().unwrap().len(), before + 3);
    }

    #[test]
    fn test_suspend_detaches_but_keeps_transmitting() {
        let store = Store::new();
        let signal = Signal::new();
        let mut scheduler =
            TransmissionScheduler::new(&store, &signal, MockTransport::mounted(), &quick_config());
        while !store.is_attached() {
            block_on(scheduler.tick());
        }

        scheduler.transport_mut().suspended = true;
        let sent_before = scheduler.transport().sent.lock().unwrap().len();
        assert!(matches!(
            block_on(scheduler.tick()),
            TickOutcome::Transmitted(_)
        ));
        assert!(!store.is_attached());
        assert_eq!(scheduler.phase(), LinkPhase::Detached);
        assert_eq!(
            scheduler.transport().sent.lock().unwrap().len(),
            sent_before + 1
        );

        // Resume triggers a fresh handshake
        scheduler.transport_mut().suspended = false;
        assert_eq!(block_on(scheduler.tick()), TickOutcome::Handshaking);
    }

    #[test]
    fn test_unmount_freezes_handshake_progress() {
        let store = Store::new();
        let signal = Signal::new();
        let mut scheduler =
            TransmissionScheduler::new(&store, &signal, MockTransport::mounted(), &quick_config());
        block_on(scheduler.tick());
        let phase = scheduler.phase();

        scheduler.transport_mut().mounted = false;
        for _ in 0..10 {
            assert_eq!(block_on(scheduler.tick()), TickOutcome::Unmounted);
        }
        assert_eq!(scheduler.phase(), phase);
    }

    #[test]
    fn test_transport_errors_do_not_stop_signalling() {
        let store = Store::new();
        let signal = Signal::new();
        let mut transport = MockTransport::mounted();
        transport.fail = true;
        let mut scheduler = TransmissionScheduler::new(&store, &signal, transport, &quick_config());
        while !store.is_attached() {
            block_on(scheduler.tick());
        }

        let generation = store.replace(Report::neutral());
        assert_eq!(
            block_on(scheduler.tick()),
            TickOutcome::Transmitted(generation)
        );
        assert!(signal_raised_for(&signal, generation));
    }
}
