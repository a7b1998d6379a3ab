#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{UART1, USB};
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use static_cell::StaticCell;
use usb_nsgamepad::console::BAUD_RATE;
use usb_nsgamepad::usb_output::{
    USB_DEVICE_RELEASE, USB_MANUFACTURER, USB_PID, USB_PRODUCT, USB_VID,
};
use usb_nsgamepad::{
    configure_usb_hid, CompletionSignal, Console, Gamepad, GamepadRequestHandler, HidConfig,
    ReportStore, Submitter, TransmissionScheduler, UsbHidTransport, UsbLinkState,
    UsbStateHandler,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Concurrent submissions that may wait for a tick at once.
const WAITERS: usize = 4;

const CONFIG: HidConfig = HidConfig::DEFAULT;

/// Shared report, written by producers and read by the scheduler.
static STORE: ReportStore<CriticalSectionRawMutex> = ReportStore::new();

/// Raised by the scheduler after every mounted tick.
static COMPLETION: CompletionSignal<CriticalSectionRawMutex, WAITERS> = CompletionSignal::new();

/// Mounted/suspended flags, written by the USB stack.
static USB_LINK: UsbLinkState = UsbLinkState::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<GamepadRequestHandler> = StaticCell::new();
static STATE_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("USB NS gamepad starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BAUD_RATE;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    // The console only wakes up HORI-identified pads
    let mut usb_config = UsbConfig::new(USB_VID, USB_PID);
    usb_config.device_release = USB_DEVICE_RELEASE;
    usb_config.manufacturer = Some(USB_MANUFACTURER);
    usb_config.product = Some(USB_PRODUCT);
    usb_config.serial_number = None;
    usb_config.max_power = 250;
    usb_config.max_packet_size_0 = 64;
    // Plain single-interface device, no IAD
    usb_config.device_class = 0x00;
    usb_config.device_sub_class = 0x00;
    usb_config.device_protocol = 0x00;
    usb_config.composite_with_iads = false;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );
    builder.handler(STATE_HANDLER.init(UsbStateHandler::new(&USB_LINK)));

    // Configure HID class
    let hid_state = HID_STATE.init(State::new());
    let hid_writer = configure_usb_hid(&mut builder, hid_state, REQUEST_HANDLER.init(GamepadRequestHandler));

    // Build the USB device
    let usb_device = builder.build();

    let transport = UsbHidTransport::new(hid_writer, &USB_LINK, CONFIG.tick_period);
    let scheduler = TransmissionScheduler::new(&STORE, &COMPLETION, transport, &CONFIG);

    let gamepad = Gamepad::new(Submitter::new(&STORE, &COMPLETION, CONFIG.submit_timeout));
    let console = Console::new(tx, rx, gamepad, &USB_LINK, CONFIG);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(scheduler_task(scheduler).unwrap());
    spawner.spawn(console_task(console).unwrap());

    info!("USB NS gamepad initialized, waiting for host...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Scheduler task - the only writer to the HID endpoint.
#[embassy_executor::task]
async fn scheduler_task(
    mut scheduler: TransmissionScheduler<
        'static,
        CriticalSectionRawMutex,
        UsbHidTransport<'static>,
        WAITERS,
    >,
) {
    scheduler.run().await
}

/// Console task - reads commands from UART and submits them.
#[embassy_executor::task]
async fn console_task(mut console: Console<'static, WAITERS>) {
    console.run().await
}
