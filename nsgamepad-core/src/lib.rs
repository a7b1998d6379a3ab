//! Platform-agnostic core of a USB Nintendo Switch gamepad emulator.
//!
//! Producers edit a [`Gamepad`] and submit it; a periodic
//! [`TransmissionScheduler`] is the only path from the shared report to the
//! USB transport. Nothing here touches hardware, so the whole pipeline runs
//! on host for testing with a mock transport.
//!
//! # Overview
//!
//! - [`report`]: the 8-byte input report, button/D-pad/stick vocabulary
//! - [`store`]: shared report with a write generation ([`ReportStore`])
//! - [`completion`]: per-tick "transmitted up to generation N" signal
//! - [`handshake`]: console wake-up sequence as a per-tick state machine
//! - [`scheduler`]: periodic transmission task ([`TransmissionScheduler`])
//! - [`submit`]: blocking-until-sent submission API ([`Submitter`])
//! - [`gamepad`]: press/release/click helpers on top of a submitter
//! - [`command`]: console command parser
//! - [`transport`]: HID transport trait ([`HidTransport`])
//! - [`link`]: USB bus callbacks folded into mounted/suspended flags
//!
//! # Example
//!
//! ```rust
//! use nsgamepad_core::{parse_command, Button, Command, Report};
//!
//! let mut report = Report::neutral();
//! report.press(Button::A);
//! assert_eq!(report.to_bytes()[0], 0x04);
//!
//! assert!(matches!(parse_command("click A -d 50"), Ok(Command::Click { .. })));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log and format through defmt (for embedded logging)
//! - **`log`**: Log through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod command;
pub mod completion;
pub mod config;
pub mod gamepad;
pub mod handshake;
pub mod link;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod submit;
pub mod transport;

// Re-export main types at crate root
pub use command::{parse_command, parse_line, Command, CommandError, ReleaseTarget, MAX_LINE_LENGTH};
pub use completion::{CompletionSignal, CompletionWaiter};
pub use config::HidConfig;
pub use gamepad::{Gamepad, DEFAULT_CLICK_DELAY};
pub use handshake::{HandshakeConfig, LinkPhase};
pub use link::UsbLinkState;
pub use report::{Button, ButtonMask, DpadDirection, EncodeError, Report, StickSide, AXIS_CENTER};
pub use scheduler::{TickOutcome, TransmissionScheduler};
pub use store::{Generation, ReportStore};
pub use submit::{SubmitError, Submitter};
pub use transport::{HidTransport, TransportError};
