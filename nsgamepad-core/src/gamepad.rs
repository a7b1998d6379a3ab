//! Gamepad: logical controller state that producers edit and then submit.
//!
//! Edits only touch the local report; nothing reaches the host until
//! [`Gamepad::update`] (or one of the click helpers) submits it.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};

use crate::command::{Command, ReleaseTarget};
use crate::report::{Button, DpadDirection, Report, StickSide};
use crate::submit::{SubmitError, Submitter};

/// Pause after each edge of a click when the caller does not pick one.
pub const DEFAULT_CLICK_DELAY: Duration = Duration::from_millis(100);

pub struct Gamepad<'a, M: RawMutex, const N: usize> {
    report: Report,
    submitter: Submitter<'a, M, N>,
}

impl<'a, M: RawMutex, const N: usize> Gamepad<'a, M, N> {
    /// Start from the neutral report.
    pub fn new(submitter: Submitter<'a, M, N>) -> Self {
        Self {
            report: Report::neutral(),
            submitter,
        }
    }

    /// Local (not necessarily submitted) state.
    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn is_attached(&self) -> bool {
        self.submitter.is_attached()
    }

    pub fn press(&mut self, button: Button) {
        info!("press button {:?}", button);
        self.report.press(button);
    }

    pub fn release(&mut self, button: Button) {
        info!("release button {:?}", button);
        self.report.release(button);
    }

    pub fn release_all(&mut self) {
        info!("release all buttons");
        self.report.release_all();
    }

    pub fn set_dpad(&mut self, direction: DpadDirection) {
        info!("set dpad {:?}", direction);
        self.report.set_dpad(direction);
    }

    pub fn set_axis(&mut self, side: StickSide, x: u8, y: u8) {
        info!("set {:?} stick to ({}, {})", side, x, y);
        self.report.set_axis(side, x, y);
    }

    pub fn left_axis(&mut self, x: u8, y: u8) {
        self.set_axis(StickSide::Left, x, y);
    }

    pub fn right_axis(&mut self, x: u8, y: u8) {
        self.set_axis(StickSide::Right, x, y);
    }

    /// Submit the local report and wait for it to be transmitted.
    pub async fn update(&self) -> Result<(), SubmitError> {
        self.submitter.submit(self.report).await
    }

    /// Press, wait `delay`, release, wait `delay`.
    ///
    /// The button is released locally even if the press could not be
    /// delivered; the first error is returned.
    pub async fn click(&mut self, button: Button, delay: Duration) -> Result<(), SubmitError> {
        self.press(button);
        let pressed = self.update().await;
        Timer::after(delay).await;
        self.release(button);
        let released = self.update().await;
        Timer::after(delay).await;
        pressed.and(released)
    }

    /// Hold a D-pad direction for `delay`, then return to centered.
    pub async fn dpad_click(
        &mut self,
        direction: DpadDirection,
        delay: Duration,
    ) -> Result<(), SubmitError> {
        self.set_dpad(direction);
        let held = self.update().await;
        Timer::after(delay).await;
        self.set_dpad(DpadDirection::Centered);
        let centered = self.update().await;
        Timer::after(delay).await;
        held.and(centered)
    }

    /// Apply a parsed console command.
    ///
    /// Commands that do not touch the controller (`help`, `usbinfo`) are a no-op.
    pub async fn execute(&mut self, command: &Command) -> Result<(), SubmitError> {
        match command {
            Command::Help | Command::UsbInfo => Ok(()),
            Command::Press(buttons) => {
                for &button in buttons {
                    self.press(button);
                }
                self.update().await
            }
            Command::Release(targets) => {
                for target in targets {
                    match *target {
                        ReleaseTarget::All => self.release_all(),
                        ReleaseTarget::Button(button) => self.release(button),
                    }
                }
                self.update().await
            }
            Command::Click { buttons, delay } => {
                for &button in buttons {
                    self.click(button, *delay).await?;
                }
                Ok(())
            }
            Command::SetDpad(direction) => {
                self.set_dpad(*direction);
                self.update().await
            }
            Command::Dpad { directions, delay } => {
                for &direction in directions {
                    self.dpad_click(direction, *delay).await?;
                }
                Ok(())
            }
            Command::Stick { side, x, y } => {
                self.set_axis(*side, *x, *y);
                self.update().await
            }
        }
    }
}
