//! Console command parser.
//!
//! One command per line, whitespace separated:
//!
//! ```text
//! help
//! usbinfo
//! press <button>...
//! release <button|all>...
//! click <button>... [-d <ms>]
//! setdpad <U|UR|R|DR|D|DL|L|UL|0>
//! dpad <direction>... [-d <ms>]
//! stick <left|right> <x> <y>
//! ```
//!
//! Names are matched case-insensitively. A line with any unknown name or
//! malformed number is rejected as a whole.

use embassy_time::Duration;
use heapless::Vec;

use crate::gamepad::DEFAULT_CLICK_DELAY;
use crate::report::{Button, DpadDirection, EncodeError, StickSide};

/// Maximum line length accepted by the console (excluding the newline).
pub const MAX_LINE_LENGTH: usize = 128;

/// Maximum number of buttons or directions in one command.
pub const MAX_ARGS: usize = 16;

/// Help text listing every command.
pub const HELP: &str = "\
Available commands:\r\n\
  help                          - Show this help\r\n\
  usbinfo                       - Show USB and gamepad state\r\n\
  press <button>...             - Press buttons\r\n\
  release <button|all>...       - Release buttons\r\n\
  click <button>... [-d <ms>]   - Press & release buttons (default 100 ms)\r\n\
  setdpad <dir>                 - Set dpad direction, 0 = centered\r\n\
  dpad <dir>... [-d <ms>]       - Set & unset dpad directions\r\n\
  stick <left|right> <x> <y>    - Move a stick, 128 = centered\r\n\
Buttons: Y B A X L R ZL ZR Minus Plus LStick RStick Home Capture\r\n\
Directions: U UR R DR D DL L UL 0\r\n";

/// What a `release` argument refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReleaseTarget {
    Button(Button),
    All,
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Command {
    Help,
    UsbInfo,
    Press(Vec<Button, MAX_ARGS>),
    Release(Vec<ReleaseTarget, MAX_ARGS>),
    Click {
        buttons: Vec<Button, MAX_ARGS>,
        delay: Duration,
    },
    SetDpad(DpadDirection),
    Dpad {
        directions: Vec<DpadDirection, MAX_ARGS>,
        delay: Duration,
    },
    Stick {
        side: StickSide,
        x: u8,
        y: u8,
    },
}

/// Error type for console parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Blank line.
    Empty,
    /// Line is not valid UTF-8.
    Encoding,
    /// First word is not a known command.
    UnknownCommand,
    /// A required argument is missing.
    MissingArgument,
    /// More arguments than the command accepts.
    TooManyArguments,
    /// A number could not be parsed or is out of range.
    InvalidNumber,
    /// A button, direction or stick name is unknown.
    Encode(EncodeError),
}

impl From<EncodeError> for CommandError {
    fn from(err: EncodeError) -> Self {
        CommandError::Encode(err)
    }
}

/// Parse a raw console line, tolerating a trailing CR and/or LF.
pub fn parse_line(line: &[u8]) -> Result<Command, CommandError> {
    let line = core::str::from_utf8(strip_line_ending(line)).map_err(|_| CommandError::Encoding)?;
    parse_command(line)
}

/// Parse one command line.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let name = words.next().ok_or(CommandError::Empty)?;

    match name {
        "help" => no_more(words).map(|()| Command::Help),
        "usbinfo" => no_more(words).map(|()| Command::UsbInfo),
        "press" => Ok(Command::Press(collect_buttons(words)?)),
        "release" => {
            let mut targets = Vec::new();
            for word in words {
                let target = if word.eq_ignore_ascii_case("all") {
                    ReleaseTarget::All
                } else {
                    ReleaseTarget::Button(Button::from_name(word)?)
                };
                targets
                    .push(target)
                    .map_err(|_| CommandError::TooManyArguments)?;
            }
            if targets.is_empty() {
                return Err(CommandError::MissingArgument);
            }
            Ok(Command::Release(targets))
        }
        "click" => {
            let (names, delay) = split_delay(words)?;
            Ok(Command::Click {
                buttons: collect_buttons(names.iter().copied())?,
                delay,
            })
        }
        "setdpad" => {
            let direction = DpadDirection::from_name(words.next().ok_or(CommandError::MissingArgument)?)?;
            no_more(words)?;
            Ok(Command::SetDpad(direction))
        }
        "dpad" => {
            let (names, delay) = split_delay(words)?;
            let mut directions = Vec::new();
            for name in names {
                directions
                    .push(DpadDirection::from_name(name)?)
                    .map_err(|_| CommandError::TooManyArguments)?;
            }
            if directions.is_empty() {
                return Err(CommandError::MissingArgument);
            }
            Ok(Command::Dpad { directions, delay })
        }
        "stick" => {
            let side = StickSide::from_name(words.next().ok_or(CommandError::MissingArgument)?)?;
            let x = parse_u8(words.next().ok_or(CommandError::MissingArgument)?)?;
            let y = parse_u8(words.next().ok_or(CommandError::MissingArgument)?)?;
            no_more(words)?;
            Ok(Command::Stick { side, x, y })
        }
        _ => Err(CommandError::UnknownCommand),
    }
}

fn no_more<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<(), CommandError> {
    match words.next() {
        Some(_) => Err(CommandError::TooManyArguments),
        None => Ok(()),
    }
}

fn collect_buttons<'a>(
    words: impl Iterator<Item = &'a str>,
) -> Result<Vec<Button, MAX_ARGS>, CommandError> {
    let mut buttons = Vec::new();
    for word in words {
        buttons
            .push(Button::from_name(word)?)
            .map_err(|_| CommandError::TooManyArguments)?;
    }
    if buttons.is_empty() {
        return Err(CommandError::MissingArgument);
    }
    Ok(buttons)
}

/// Separate positional names from an optional `-d <ms>` / `--delay <ms>`.
fn split_delay<'a>(
    mut words: impl Iterator<Item = &'a str>,
) -> Result<(Vec<&'a str, MAX_ARGS>, Duration), CommandError> {
    let mut names = Vec::new();
    let mut delay = DEFAULT_CLICK_DELAY;

    while let Some(word) = words.next() {
        if word == "-d" || word == "--delay" {
            let ms = words.next().ok_or(CommandError::MissingArgument)?;
            delay = Duration::from_millis(parse_u32(ms)?.into());
        } else {
            names
                .push(word)
                .map_err(|_| CommandError::TooManyArguments)?;
        }
    }
    Ok((names, delay))
}

fn parse_u32(s: &str) -> Result<u32, CommandError> {
    s.parse::<u32>().map_err(|_| CommandError::InvalidNumber)
}

/// Decimal, or hex with a `0x` prefix.
fn parse_u8(s: &str) -> Result<u8, CommandError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|_| CommandError::InvalidNumber)
}

/// Strip trailing CR and/or LF from a line.
#[inline]
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buttons(list: &[Button]) -> Vec<Button, MAX_ARGS> {
        Vec::from_slice(list).unwrap()
    }

    #[test]
    fn test_parse_press_multiple() {
        assert_eq!(
            parse_command("press A b ZL"),
            Ok(Command::Press(buttons(&[Button::A, Button::B, Button::ZL])))
        );
    }

    #[test]
    fn test_parse_press_requires_button() {
        assert_eq!(parse_command("press"), Err(CommandError::MissingArgument));
    }

    #[test]
    fn test_parse_unknown_button_rejects_line() {
        assert_eq!(
            parse_command("press A Reserved1"),
            Err(CommandError::Encode(EncodeError::UnknownButton))
        );
    }

    #[test]
    fn test_parse_release_all_and_buttons() {
        let Ok(Command::Release(targets)) = parse_command("release X all") else {
            panic!("expected release");
        };
        assert_eq!(
            targets.as_slice(),
            &[ReleaseTarget::Button(Button::X), ReleaseTarget::All]
        );
    }

    #[test]
    fn test_parse_click_default_delay() {
        assert_eq!(
            parse_command("click Home"),
            Ok(Command::Click {
                buttons: buttons(&[Button::Home]),
                delay: Duration::from_millis(100),
            })
        );
    }

    #[test]
    fn test_parse_click_with_delay_anywhere() {
        let expected = Ok(Command::Click {
            buttons: buttons(&[Button::A, Button::B]),
            delay: Duration::from_millis(250),
        });
        assert_eq!(parse_command("click A B -d 250"), expected);
        assert_eq!(parse_command("click --delay 250 A B"), expected);
    }

    #[test]
    fn test_parse_click_bad_delay() {
        assert_eq!(
            parse_command("click A -d soon"),
            Err(CommandError::InvalidNumber)
        );
        assert_eq!(
            parse_command("click A -d"),
            Err(CommandError::MissingArgument)
        );
    }

    #[test]
    fn test_parse_setdpad() {
        assert_eq!(
            parse_command("setdpad DL"),
            Ok(Command::SetDpad(DpadDirection::DownLeft))
        );
        assert_eq!(
            parse_command("setdpad 0"),
            Ok(Command::SetDpad(DpadDirection::Centered))
        );
        assert_eq!(
            parse_command("setdpad north"),
            Err(CommandError::Encode(EncodeError::UnknownDirection))
        );
        assert_eq!(
            parse_command("setdpad U D"),
            Err(CommandError::TooManyArguments)
        );
    }

    #[test]
    fn test_parse_dpad_sequence() {
        let Ok(Command::Dpad { directions, delay }) = parse_command("dpad U R D -d 50") else {
            panic!("expected dpad");
        };
        assert_eq!(
            directions.as_slice(),
            &[DpadDirection::Up, DpadDirection::Right, DpadDirection::Down]
        );
        assert_eq!(delay, Duration::from_millis(50));
    }

    #[test]
    fn test_parse_stick() {
        assert_eq!(
            parse_command("stick right 0x80 255"),
            Ok(Command::Stick {
                side: StickSide::Right,
                x: 0x80,
                y: 255
            })
        );
        assert_eq!(
            parse_command("stick left 256 0"),
            Err(CommandError::InvalidNumber)
        );
        assert_eq!(
            parse_command("stick up 0 0"),
            Err(CommandError::Encode(EncodeError::UnknownStick))
        );
        assert_eq!(
            parse_command("stick left 0"),
            Err(CommandError::MissingArgument)
        );
    }

    #[test]
    fn test_parse_too_many_buttons() {
        assert_eq!(
            parse_command("press A A A A A A A A A A A A A A A A A"),
            Err(CommandError::TooManyArguments)
        );
    }

    #[test]
    fn test_parse_empty_and_unknown() {
        assert_eq!(parse_command(""), Err(CommandError::Empty));
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(parse_command("jump"), Err(CommandError::UnknownCommand));
        assert_eq!(parse_command("help me"), Err(CommandError::TooManyArguments));
    }

    #[test]
    fn test_parse_line_strips_endings() {
        assert_eq!(parse_line(b"usbinfo\r\n"), Ok(Command::UsbInfo));
        assert_eq!(parse_line(b"help\n"), Ok(Command::Help));
        assert_eq!(parse_line(b"\r\n"), Err(CommandError::Empty));
        assert_eq!(parse_line(&[0xFF, 0xFE]), Err(CommandError::Encoding));
    }
}
