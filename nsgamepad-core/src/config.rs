//! Runtime configuration of the transmission core.

use embassy_time::Duration;

use crate::handshake::HandshakeConfig;

/// Timing knobs for the scheduler, the handshake and submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidConfig {
    /// Nominal distance between two scheduler ticks.
    pub tick_period: Duration,
    /// Longest time `submit` waits for the tick that sends its report.
    pub submit_timeout: Duration,
    pub handshake: HandshakeConfig,
}

impl HidConfig {
    /// 10 ms ticks, 1 s submit bound, 1 s / 100 ms / 100 ms handshake.
    pub const DEFAULT: Self = Self {
        tick_period: Duration::from_millis(10),
        submit_timeout: Duration::from_millis(1000),
        handshake: HandshakeConfig::DEFAULT,
    };

    #[must_use]
    pub const fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    #[must_use]
    pub const fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_handshake(mut self, handshake: HandshakeConfig) -> Self {
        self.handshake = handshake;
        self
    }
}

impl Default for HidConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
