//! Nintendo Switch compatible USB gamepad for RP2040.
//!
//! This crate provides the embedded side of the gamepad: the embassy-usb
//! HID transport and the UART console that feeds commands to the
//! platform-agnostic core.

#![no_std]

// Re-export core types for convenience
pub use nsgamepad_core::{
    Button, Command, CommandError, CompletionSignal, DpadDirection, Gamepad, HidConfig,
    HidTransport, Report, ReportStore, StickSide, SubmitError, Submitter, TransmissionScheduler,
    TransportError, UsbLinkState, MAX_LINE_LENGTH,
};

pub mod console;
pub mod usb_output;

pub use console::Console;
pub use usb_output::{
    configure_usb_hid, GamepadRequestHandler, UsbHidTransport, UsbStateHandler,
};
