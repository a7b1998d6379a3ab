//! UART command console.
//!
//! Reads one command per line, runs it against the gamepad and prints the
//! outcome. See [`nsgamepad_core::command`] for the grammar.
//!
//! # Pins
//!
//! Uses UART1 at 115200 baud:
//! - GPIO 8: TX
//! - GPIO 9: RX

use core::fmt::Write as _;

use defmt::{info, warn};
use embassy_rp::uart::{Async, Error as UartError, UartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::{String, Vec};
use nsgamepad_core::command::{parse_line, Command, CommandError, HELP};
use nsgamepad_core::{Gamepad, HidConfig, SubmitError, UsbLinkState, MAX_LINE_LENGTH};

use crate::usb_output::USB_PRODUCT;

pub const BAUD_RATE: u32 = 115_200;

const PROMPT: &str = "> ";

/// Why a line could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LineError {
    /// Line longer than [`MAX_LINE_LENGTH`]; the rest was discarded.
    Overflow,
    /// UART framing, parity, break or overrun.
    Uart,
}

impl From<UartError> for LineError {
    fn from(_: UartError) -> Self {
        LineError::Uart
    }
}

pub struct Console<'d, const N: usize> {
    tx: UartTx<'d, Async>,
    rx: UartRx<'d, Async>,
    buffer: Vec<u8, MAX_LINE_LENGTH>,
    gamepad: Gamepad<'d, CriticalSectionRawMutex, N>,
    link: &'d UsbLinkState,
    config: HidConfig,
}

impl<'d, const N: usize> Console<'d, N> {
    pub fn new(
        tx: UartTx<'d, Async>,
        rx: UartRx<'d, Async>,
        gamepad: Gamepad<'d, CriticalSectionRawMutex, N>,
        link: &'d UsbLinkState,
        config: HidConfig,
    ) -> Self {
        Self {
            tx,
            rx,
            buffer: Vec::new(),
            gamepad,
            link,
            config,
        }
    }

    /// Serve commands forever.
    pub async fn run(&mut self) -> ! {
        self.write_str("\r\nNS gamepad console, type 'help' for commands\r\n")
            .await;
        self.write_str(PROMPT).await;
        loop {
            match self.read_line().await {
                // CRLF terminals end every line with an empty one
                Ok(()) if self.buffer.is_empty() => continue,
                Ok(()) => self.handle_line().await,
                Err(LineError::Overflow) => {
                    warn!("console line too long");
                    self.write_str("error: line too long\r\n").await;
                }
                Err(LineError::Uart) => {
                    warn!("console UART error");
                    self.write_str("\r\n[RX error]\r\n").await;
                }
            }
            self.write_str(PROMPT).await;
        }
    }

    async fn handle_line(&mut self) {
        let command = match parse_line(&self.buffer) {
            Ok(command) => command,
            Err(e) => {
                warn!("rejected console line: {:?}", e);
                self.write_str(describe_command_error(e)).await;
                return;
            }
        };

        match command {
            Command::Help => self.write_str(HELP).await,
            Command::UsbInfo => self.write_usb_info().await,
            _ => {
                let result = self.gamepad.execute(&command).await;
                self.write_str(describe_submit_result(result)).await;
            }
        }
    }

    async fn write_usb_info(&mut self) {
        let mut text: String<256> = String::new();
        let connected = self.link.is_enabled();
        let mounted = self.link.is_mounted();
        let suspended = self.link.is_suspended();
        let attached = self.gamepad.is_attached();
        let period = self.config.tick_period.as_millis();
        info!(
            "usbinfo: mounted={} suspended={} attached={}",
            mounted, suspended, attached
        );
        // Capacity covers the longest possible output
        let _ = write!(
            text,
            "USB info:\r\n  Device HID name: {}\r\n  Device mount state: {}\r\n  Device connection state: {}\r\n  Device suspension state: {}\r\n  Gamepad connected: {}\r\n  Polling tick period: {} ms\r\n",
            USB_PRODUCT,
            if mounted { "mounted" } else { "unmounted" },
            if connected { "connected" } else { "unconnected" },
            if suspended { "suspended" } else { "not suspended" },
            attached,
            period,
        );
        self.write_str(&text).await;
    }

    /// Read bytes until a line ending is found or the buffer is full.
    ///
    /// If a line exceeds the buffer capacity, the rest of the line is
    /// discarded so the tail is not parsed as a new command.
    async fn read_line(&mut self) -> Result<(), LineError> {
        self.buffer.clear();

        loop {
            let mut byte = [0u8; 1];
            self.rx.read(&mut byte).await?;

            if byte[0] == b'\n' || byte[0] == b'\r' {
                return Ok(());
            }

            if self.buffer.push(byte[0]).is_err() {
                loop {
                    self.rx.read(&mut byte).await?;
                    if byte[0] == b'\n' || byte[0] == b'\r' {
                        break;
                    }
                }
                return Err(LineError::Overflow);
            }
        }
    }

    async fn write_str(&mut self, s: &str) {
        // Nobody to report a console write failure to
        let _ = self.tx.write(s.as_bytes()).await;
    }
}

fn describe_command_error(err: CommandError) -> &'static str {
    match err {
        CommandError::Empty => "",
        CommandError::Encoding => "error: invalid characters\r\n",
        CommandError::UnknownCommand => "error: unknown command, try 'help'\r\n",
        CommandError::MissingArgument => "error: missing argument\r\n",
        CommandError::TooManyArguments => "error: too many arguments\r\n",
        CommandError::InvalidNumber => "error: invalid number\r\n",
        CommandError::Encode(nsgamepad_core::EncodeError::UnknownButton) => {
            "error: unknown button\r\n"
        }
        CommandError::Encode(nsgamepad_core::EncodeError::UnknownDirection) => {
            "error: unknown dpad direction\r\n"
        }
        CommandError::Encode(nsgamepad_core::EncodeError::UnknownStick) => {
            "error: unknown stick, use left or right\r\n"
        }
    }
}

fn describe_submit_result(result: Result<(), SubmitError>) -> &'static str {
    match result {
        Ok(()) => "ok\r\n",
        Err(SubmitError::NotAttached) => "error: gamepad not attached\r\n",
        Err(SubmitError::DeliveryUncertain) => "warning: delivery uncertain\r\n",
        Err(SubmitError::Busy) => "error: too many pending submissions\r\n",
    }
}
