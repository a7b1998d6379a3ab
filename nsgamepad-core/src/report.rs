//! HID input report and the encoder that maps logical inputs onto it.
//!
//! The wire layout is fixed (little-endian, packed):
//!
//! | Offset | Size | Field       |
//! |--------|------|-------------|
//! | 0      | 2    | buttons     |
//! | 2      | 1    | D-pad (hat) |
//! | 3      | 1    | left X      |
//! | 4      | 1    | left Y      |
//! | 5      | 1    | right X     |
//! | 6      | 1    | right Y     |
//! | 7      | 1    | filler      |

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Neutral value for every analog axis.
pub const AXIS_CENTER: u8 = 0x80;

/// Error returned when a logical input does not name a real control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Button identifier or name outside the 14-button table.
    UnknownButton,
    /// D-pad value or name that is not a compass octant or centered.
    UnknownDirection,
    /// Stick selector that is neither left nor right.
    UnknownStick,
}

/// One of the 14 physical buttons, numbered by its bit in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Button {
    Y = 0,
    B,
    A,
    X,
    L,
    R,
    ZL,
    ZR,
    Minus,
    Plus,
    LStick,
    RStick,
    Home,
    Capture,
}

impl Button {
    /// Every button, in bit order.
    pub const ALL: [Button; 14] = [
        Button::Y,
        Button::B,
        Button::A,
        Button::X,
        Button::L,
        Button::R,
        Button::ZL,
        Button::ZR,
        Button::Minus,
        Button::Plus,
        Button::LStick,
        Button::RStick,
        Button::Home,
        Button::Capture,
    ];

    /// Button pressed once during the connection handshake.
    pub const WAKE: Button = Button::Y;

    /// Bit index inside the button mask.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Single-bit mask for this button.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> ButtonMask {
        ButtonMask(1 << self as u16)
    }

    /// Display name shared by the console and any other front end.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Button::Y => "Y",
            Button::B => "B",
            Button::A => "A",
            Button::X => "X",
            Button::L => "L",
            Button::R => "R",
            Button::ZL => "ZL",
            Button::ZR => "ZR",
            Button::Minus => "Minus",
            Button::Plus => "Plus",
            Button::LStick => "LStick",
            Button::RStick => "RStick",
            Button::Home => "Home",
            Button::Capture => "Capture",
        }
    }

    /// Look a button up by display name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self, EncodeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .ok_or(EncodeError::UnknownButton)
    }
}

impl TryFrom<u8> for Button {
    type Error = EncodeError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(EncodeError::UnknownButton)
    }
}

/// Raw 16-bit button field.
///
/// Bits 0-13 are the buttons of [`Button`]; bits 14-15 are reserved. The
/// encoder never sets the reserved bits, but a raw report may carry them.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonMask(pub u16);

impl ButtonMask {
    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Bits that correspond to real buttons.
    pub const DEFINED: Self = Self(0x3FFF);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: ButtonMask) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Get the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Button> for ButtonMask {
    fn from(button: Button) -> Self {
        button.mask()
    }
}

impl BitOr for ButtonMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ButtonMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ButtonMask {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ButtonMask {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for ButtonMask {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Hat switch position: eight clockwise octants starting at up, or centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DpadDirection {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
    Centered = 0xF,
}

impl DpadDirection {
    pub const ALL: [DpadDirection; 9] = [
        DpadDirection::Up,
        DpadDirection::UpRight,
        DpadDirection::Right,
        DpadDirection::DownRight,
        DpadDirection::Down,
        DpadDirection::DownLeft,
        DpadDirection::Left,
        DpadDirection::UpLeft,
        DpadDirection::Centered,
    ];

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Short compass name; `"0"` means centered.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            DpadDirection::Up => "U",
            DpadDirection::UpRight => "UR",
            DpadDirection::Right => "R",
            DpadDirection::DownRight => "DR",
            DpadDirection::Down => "D",
            DpadDirection::DownLeft => "DL",
            DpadDirection::Left => "L",
            DpadDirection::UpLeft => "UL",
            DpadDirection::Centered => "0",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, EncodeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .ok_or(EncodeError::UnknownDirection)
    }
}

impl TryFrom<u8> for DpadDirection {
    type Error = EncodeError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.raw() == raw)
            .ok_or(EncodeError::UnknownDirection)
    }
}

/// Which analog stick an axis pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StickSide {
    Left,
    Right,
}

impl StickSide {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            StickSide::Left => "left",
            StickSide::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, EncodeError> {
        if name.eq_ignore_ascii_case("left") {
            Ok(StickSide::Left)
        } else if name.eq_ignore_ascii_case("right") {
            Ok(StickSide::Right)
        } else {
            Err(EncodeError::UnknownStick)
        }
    }
}

impl TryFrom<u8> for StickSide {
    type Error = EncodeError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(StickSide::Left),
            1 => Ok(StickSide::Right),
            _ => Err(EncodeError::UnknownStick),
        }
    }
}

/// Complete HID input report.
///
/// Fields are public so that any byte pattern can be submitted as-is; the
/// encoder methods are the only path that keeps the report well-formed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub buttons: ButtonMask,
    /// Low nibble carries the hat value.
    pub dpad: u8,
    pub left_x: u8,
    pub left_y: u8,
    pub right_x: u8,
    pub right_y: u8,
    pub filler: u8,
}

impl Default for Report {
    fn default() -> Self {
        Self::neutral()
    }
}

impl Report {
    /// Size of the report on the wire, filler byte included.
    pub const LEN: usize = 8;

    /// No buttons, D-pad centered, both sticks centered.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: ButtonMask::NONE,
            dpad: DpadDirection::Centered as u8,
            left_x: AXIS_CENTER,
            left_y: AXIS_CENTER,
            right_x: AXIS_CENTER,
            right_y: AXIS_CENTER,
            filler: 0,
        }
    }

    #[inline]
    pub fn press(&mut self, button: Button) {
        self.buttons |= button.mask();
    }

    #[inline]
    pub fn release(&mut self, button: Button) {
        self.buttons &= !button.mask();
    }

    /// Clear the whole button mask, reserved bits included.
    #[inline]
    pub fn release_all(&mut self) {
        self.buttons = ButtonMask::NONE;
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(&self, button: Button) -> bool {
        self.buttons.contains(button.mask())
    }

    #[inline]
    pub fn set_dpad(&mut self, direction: DpadDirection) {
        self.dpad = direction.raw();
    }

    /// Decode the hat nibble, or `None` if it holds an undefined value.
    pub fn dpad_direction(&self) -> Option<DpadDirection> {
        DpadDirection::try_from(self.dpad & 0x0F).ok()
    }

    pub fn set_axis(&mut self, side: StickSide, x: u8, y: u8) {
        match side {
            StickSide::Left => {
                self.left_x = x;
                self.left_y = y;
            }
            StickSide::Right => {
                self.right_x = x;
                self.right_y = y;
            }
        }
    }

    #[must_use]
    pub const fn axis(&self, side: StickSide) -> (u8, u8) {
        match side {
            StickSide::Left => (self.left_x, self.left_y),
            StickSide::Right => (self.right_x, self.right_y),
        }
    }

    /// Serialize to the wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let buttons = self.buttons.raw().to_le_bytes();
        [
            buttons[0],
            buttons[1],
            self.dpad,
            self.left_x,
            self.left_y,
            self.right_x,
            self.right_y,
            self.filler,
        ]
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Self {
        Self {
            buttons: ButtonMask(u16::from_le_bytes([bytes[0], bytes[1]])),
            dpad: bytes[2],
            left_x: bytes[3],
            left_y: bytes[4],
            right_x: bytes[5],
            right_y: bytes[6],
            filler: bytes[7],
        }
    }
}
