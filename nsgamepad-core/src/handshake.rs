//! Connection handshake state machine.
//!
//! The target host only notices a freshly attached controller after it has
//! seen an input transition, so every attachment starts with a fixed
//! sequence: neutral report, settle, wake button down, short hold, wake
//! button up, short hold. Delays are counted in scheduler ticks so that the
//! machine never sleeps inside a tick.

use embassy_time::Duration;

use crate::report::{Button, Report};

/// Delays between the frames of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandshakeConfig {
    /// Wait after the neutral frame, before pressing the wake button.
    pub settle: Duration,
    /// How long the wake button stays pressed.
    pub press_hold: Duration,
    /// Wait after releasing the wake button, before reporting attached.
    pub release_hold: Duration,
}

impl HandshakeConfig {
    pub const DEFAULT: Self = Self {
        settle: Duration::from_millis(1000),
        press_hold: Duration::from_millis(100),
        release_hold: Duration::from_millis(100),
    };
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Number of whole ticks covering `delay`, never less than one.
#[must_use]
pub fn ticks_for(delay: Duration, period: Duration) -> u32 {
    let period = period.as_ticks().max(1);
    let ticks = delay.as_ticks().div_ceil(period).max(1);
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// The handshake delays converted to tick counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandshakeTiming {
    pub settle_ticks: u32,
    pub press_ticks: u32,
    pub release_ticks: u32,
}

impl HandshakeTiming {
    pub fn new(config: &HandshakeConfig, period: Duration) -> Self {
        Self {
            settle_ticks: ticks_for(config.settle, period),
            press_ticks: ticks_for(config.press_hold, period),
            release_ticks: ticks_for(config.release_hold, period),
        }
    }

    /// Ticks from leaving `Detached` to reaching `Attached`, both inclusive.
    #[must_use]
    pub const fn total_ticks(&self) -> u32 {
        1u32.saturating_add(self.settle_ticks)
            .saturating_add(self.press_ticks)
            .saturating_add(self.release_ticks)
    }
}

/// Which frame of the handshake was sent last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakeStep {
    NeutralSent,
    WakePressed,
    WakeReleased,
}

/// Connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkPhase {
    Detached,
    Handshaking {
        step: HandshakeStep,
        /// Ticks left before the next step.
        remaining: u32,
    },
    Attached,
}

/// What the scheduler must do on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakeAction {
    /// Steady state: transmit the store snapshot.
    None,
    /// Handshake started: reset the shared report and send this neutral frame.
    Begin(Report),
    /// Send this handshake frame instead of the snapshot.
    Send(Report),
    /// Handshake still waiting; send nothing this tick.
    Hold,
    /// Handshake done: set the connection flag, then transmit the snapshot.
    Attach,
    /// Host suspended us: clear the connection flag, then transmit the snapshot.
    Detach,
}

/// Per-attachment handshake driver, advanced once per mounted tick.
#[derive(Debug, Clone)]
pub struct Handshake {
    phase: LinkPhase,
    timing: HandshakeTiming,
}

impl Handshake {
    pub fn new(timing: HandshakeTiming) -> Self {
        Self {
            phase: LinkPhase::Detached,
            timing,
        }
    }

    #[must_use]
    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    #[must_use]
    pub fn timing(&self) -> HandshakeTiming {
        self.timing
    }

    /// Neutral frame with only the wake button toggled.
    fn wake_frame(pressed: bool) -> Report {
        let mut report = Report::neutral();
        if pressed {
            report.press(Button::WAKE);
        }
        report
    }

    /// Evaluate one tick. Call only while the device is mounted.
    ///
    /// `attached` is the connection flag as currently held by the store.
    pub fn advance(&mut self, suspended: bool, attached: bool) -> HandshakeAction {
        match self.phase {
            LinkPhase::Detached => {
                if suspended || attached {
                    return HandshakeAction::None;
                }
                debug!("handshake: neutral frame");
                self.phase = LinkPhase::Handshaking {
                    step: HandshakeStep::NeutralSent,
                    remaining: self.timing.settle_ticks,
                };
                HandshakeAction::Begin(Report::neutral())
            }
            LinkPhase::Handshaking { step, remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining > 0 {
                    self.phase = LinkPhase::Handshaking { step, remaining };
                    return HandshakeAction::Hold;
                }
                match step {
                    HandshakeStep::NeutralSent => {
                        debug!("handshake: wake button down");
                        self.phase = LinkPhase::Handshaking {
                            step: HandshakeStep::WakePressed,
                            remaining: self.timing.press_ticks,
                        };
                        HandshakeAction::Send(Self::wake_frame(true))
                    }
                    HandshakeStep::WakePressed => {
                        debug!("handshake: wake button up");
                        self.phase = LinkPhase::Handshaking {
                            step: HandshakeStep::WakeReleased,
                            remaining: self.timing.release_ticks,
                        };
                        HandshakeAction::Send(Self::wake_frame(false))
                    }
                    HandshakeStep::WakeReleased => {
                        self.phase = LinkPhase::Attached;
                        HandshakeAction::Attach
                    }
                }
            }
            LinkPhase::Attached => {
                if suspended && attached {
                    self.phase = LinkPhase::Detached;
                    HandshakeAction::Detach
                } else {
                    HandshakeAction::None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn quick() -> Handshake {
        Handshake::new(HandshakeTiming {
            settle_ticks: 3,
            press_ticks: 2,
            release_ticks: 2,
        })
    }

    #[test]
    fn test_default_timing_at_10ms() {
        let timing = HandshakeTiming::new(&HandshakeConfig::DEFAULT, Duration::from_millis(10));
        assert_eq!(timing.settle_ticks, 100);
        assert_eq!(timing.press_ticks, 10);
        assert_eq!(timing.release_ticks, 10);
        assert_eq!(timing.total_ticks(), 121);
    }

    #[test]
    fn test_ticks_for_rounds_up_and_never_zero() {
        let period = Duration::from_millis(10);
        assert_eq!(ticks_for(Duration::from_millis(15), period), 2);
        assert_eq!(ticks_for(Duration::from_millis(0), period), 1);
        assert_eq!(ticks_for(Duration::from_millis(10), period), 1);
    }

    #[test]
    fn test_total_ticks_saturates_on_huge_delays() {
        let period = Duration::from_ticks(1);
        let huge = Duration::from_ticks(u64::MAX);
        let timing = HandshakeTiming::new(
            &HandshakeConfig {
                settle: huge,
                press_hold: huge,
                release_hold: huge,
            },
            period,
        );
        assert_eq!(timing.settle_ticks, u32::MAX);
        assert_eq!(timing.total_ticks(), u32::MAX);
    }

    #[test]
    fn test_full_sequence() {
        let mut handshake = quick();
        let mut actions = Vec::new();
        let mut attached = false;

        for _ in 0..handshake.timing().total_ticks() {
            let action = handshake.advance(false, attached);
            if action == HandshakeAction::Attach {
                attached = true;
            }
            actions.push(action);
        }

        let mut pressed = Report::neutral();
        pressed.press(Button::Y);
        assert_eq!(
            actions,
            [
                HandshakeAction::Begin(Report::neutral()),
                HandshakeAction::Hold,
                HandshakeAction::Hold,
                HandshakeAction::Send(pressed),
                HandshakeAction::Hold,
                HandshakeAction::Send(Report::neutral()),
                HandshakeAction::Hold,
                HandshakeAction::Attach,
            ]
        );
        assert_eq!(handshake.phase(), LinkPhase::Attached);
        assert_eq!(handshake.advance(false, true), HandshakeAction::None);
    }

    #[test]
    fn test_suspended_host_does_not_start_handshake() {
        let mut handshake = quick();
        assert_eq!(handshake.advance(true, false), HandshakeAction::None);
        assert_eq!(handshake.phase(), LinkPhase::Detached);
    }

    #[test]
    fn test_handshake_completes_even_if_suspended_midway() {
        let mut handshake = quick();
        handshake.advance(false, false);
        let mut last = HandshakeAction::None;
        for _ in 1..handshake.timing().total_ticks() {
            last = handshake.advance(true, false);
        }
        assert_eq!(last, HandshakeAction::Attach);
    }

    #[test]
    fn test_suspend_detaches_and_resume_reruns_handshake() {
        let mut handshake = quick();
        for _ in 0..handshake.timing().total_ticks() {
            handshake.advance(false, false);
        }
        assert_eq!(handshake.phase(), LinkPhase::Attached);

        assert_eq!(handshake.advance(true, true), HandshakeAction::Detach);
        assert_eq!(handshake.phase(), LinkPhase::Detached);

        // Still suspended: stay detached
        assert_eq!(handshake.advance(true, false), HandshakeAction::None);
        // Resumed: run the whole sequence again
        assert_eq!(
            handshake.advance(false, false),
            HandshakeAction::Begin(Report::neutral())
        );
    }
}
