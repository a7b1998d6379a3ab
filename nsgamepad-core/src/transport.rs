//! HID transport trait and error types.

use core::future::Future;

use crate::report::Report;

/// Error type for transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (not configured, or suspended).
    NotReady,
    /// Host did not poll the endpoint in time.
    Timeout,
}

/// Device-stack side of the gamepad.
///
/// Reports the bus state that drives the handshake and accepts finished
/// reports. There is no acknowledgment channel: a successful `transmit`
/// only means the report was handed to the stack.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait HidTransport {
    /// Host has configured the device.
    fn is_mounted(&self) -> bool;

    /// Bus is suspended.
    fn is_suspended(&self) -> bool;

    /// Push one report to the host.
    fn transmit(&mut self, report: &Report) -> impl Future<Output = Result<(), TransportError>>;
}
