//! USB HID transport for the Switch gamepad report.

use defmt::{debug, info};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::{with_timeout, Duration};
use embassy_usb::class::hid::{HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Handler};
use nsgamepad_core::{HidTransport, Report, TransportError, UsbLinkState};

/// USB driver used by the gamepad.
pub type UsbDriver<'d> = Driver<'d, USB>;

/// HORI vendor ID; the console only runs its wake-up quirk for this identity.
pub const USB_VID: u16 = 0x0F0D;
/// HORIPAD for Nintendo Switch.
pub const USB_PID: u16 = 0x00C1;
pub const USB_DEVICE_RELEASE: u16 = 0x0572;
pub const USB_MANUFACTURER: &str = "HORI CO.,LTD.";
pub const USB_PRODUCT: &str = "HORIPAD S";

/// Host polling interval of the interrupt IN endpoint.
pub const POLL_MS: u8 = 10;

/// HID report descriptor of the Switch gamepad.
///
/// Layout matches [`Report::to_bytes`]:
/// - 14 buttons + 2 bits padding
/// - 4-bit hat switch with null state + 4 bits padding
/// - X, Y, Z, Rz axes (unsigned 8-bit)
/// - 1 constant filler byte
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Buttons (14 buttons) ---
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x35, 0x00, //   Physical Minimum (0)
    0x45, 0x01, //   Physical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x0E, //   Report Count (14)
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x0E, //   Usage Maximum (Button 14)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x01, //   Input (Constant) - padding
    //
    // --- D-pad (hat switch) ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x25, 0x07, //   Logical Maximum (7)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x65, 0x14, //   Unit (Degrees)
    0x09, 0x39, //   Usage (Hat Switch)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x65, 0x00, //   Unit (None)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x01, //   Input (Constant) - padding
    //
    // --- Sticks ---
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x46, 0xFF, 0x00, //   Physical Maximum (255)
    0x09, 0x30, //   Usage (X) - left stick X
    0x09, 0x31, //   Usage (Y) - left stick Y
    0x09, 0x32, //   Usage (Z) - right stick X
    0x09, 0x35, //   Usage (Rz) - right stick Y
    0x75, 0x08, //   Report Size (8)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Filler ---
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x01, //   Input (Constant)
    //
    0xC0, // End Collection
];

/// USB device state handler.
///
/// Mirrors the stack's configured/suspended callbacks into a [`UsbLinkState`].
pub struct UsbStateHandler {
    link: &'static UsbLinkState,
}

impl UsbStateHandler {
    pub fn new(link: &'static UsbLinkState) -> Self {
        Self { link }
    }
}

impl Handler for UsbStateHandler {
    fn enabled(&mut self, enabled: bool) {
        info!("USB {}", if enabled { "enabled" } else { "disabled" });
        self.link.on_enabled(enabled);
    }

    fn reset(&mut self) {
        debug!("USB bus reset");
        self.link.on_reset();
    }

    fn addressed(&mut self, addr: u8) {
        debug!("USB address set to {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        info!("USB {}", if configured { "mounted" } else { "unmounted" });
        self.link.on_configured(configured);
    }

    fn suspended(&mut self, suspended: bool) {
        info!("USB {}", if suspended { "suspended" } else { "resumed" });
        self.link.on_suspended(suspended);
    }
}

/// HID request handler (handles SET_REPORT, etc.).
///
/// The gamepad has no output reports, so requests are acknowledged and ignored.
pub struct GamepadRequestHandler;

impl RequestHandler for GamepadRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, _id: ReportId, _data: &[u8]) -> OutResponse {
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, duration_ms: u32) {
        debug!("HID set idle {} ms", duration_ms);
    }

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

/// USB HID gamepad transport.
///
/// Wraps an embassy-usb HID writer. Each write is bounded so a host that
/// stops polling cannot stall the scheduler.
pub struct UsbHidTransport<'d> {
    writer: HidWriter<'d, UsbDriver<'d>, { Report::LEN }>,
    link: &'d UsbLinkState,
    write_timeout: Duration,
}

impl<'d> UsbHidTransport<'d> {
    pub fn new(
        writer: HidWriter<'d, UsbDriver<'d>, { Report::LEN }>,
        link: &'d UsbLinkState,
        write_timeout: Duration,
    ) -> Self {
        Self {
            writer,
            link,
            write_timeout,
        }
    }
}

impl<'d> HidTransport for UsbHidTransport<'d> {
    fn is_mounted(&self) -> bool {
        self.link.is_mounted()
    }

    fn is_suspended(&self) -> bool {
        self.link.is_suspended()
    }

    async fn transmit(&mut self, report: &Report) -> Result<(), TransportError> {
        if !self.link.is_mounted() || self.link.is_suspended() {
            return Err(TransportError::NotReady);
        }

        match with_timeout(self.write_timeout, self.writer.write(&report.to_bytes())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(EndpointError::Disabled)) => Err(TransportError::NotReady),
            Ok(Err(EndpointError::BufferOverflow)) => Err(TransportError::Io),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the HID writer for use by the transport.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, UsbDriver<'d>>,
    state: &'d mut State<'d>,
    request_handler: &'d mut GamepadRequestHandler,
) -> HidWriter<'d, UsbDriver<'d>, { Report::LEN }> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: Some(request_handler),
        poll_ms: POLL_MS,
        max_packet_size: 64,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
