#![no_std]
//! Driver for seven segment LED displays built around a MAX7219, like the common
//! 8 digit modules. The chip is reached either by bit-banging three GPIO lines (clock,
//! chip select, data) or through a hardware SPI device.
//!
//! It requires pins implementing [`embedded_hal::digital::OutputPin`] or a
//! [`embedded_hal::spi::SpiDevice`], plus a delay implementing
//! [`embedded_hal::delay::DelayNs`].
//!
//! Usage:
//! ```ignore
//! use max7219_7seg::{sync_display::Max7219, transport::BitBang, Alignment};
//!
//! // Any three push-pull outputs will do, wired to CLK, CS and DIN of the module.
//! let transport = BitBang::new(clk, cs, din);
//! let mut delay = hal::Delay::new();
//!
//! let mut display = Max7219::new(transport, &mut delay)
//!     .with_digits(8)
//!     .init()
//!     .unwrap();
//! display.display_text_aligned("HELLO", Alignment::Left).unwrap();
//! display.display_int(42, Alignment::RightZeros).unwrap();
//!
//! display.end().unwrap();
//! let (clk, cs, din) = display.release().release();
//! ```
//!
//! With hardware SPI the device must run in [`transport::MODE`] (mode 0, MSB first,
//! chip select active low); see [`transport::SpiConfig`] for the clock setup.
//!
//! There is no way to read anything back from the chip, every write is fire and forget.

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    };
}

pub mod font;
mod layout;
pub mod sync_display;
pub mod transport;

#[cfg(feature = "async")]
pub mod async_display;

/// Number of digit registers on the chip.
pub const MAX_DIGITS: u8 = 8;

/// Lowest brightness.
pub const INTENSITY_MIN: u8 = 0x00;
/// Brightness set by `init`.
pub const INTENSITY_DEFAULT: u8 = 0x08;
/// Highest brightness, anything above is clamped to this.
pub const INTENSITY_MAX: u8 = 0x0F;

/// Bit 7 of a segment byte lights the decimal point.
pub const DP_BIT: u8 = 0x80;

/// Control registers of the chip. Digit registers are `0x01..=0x08`.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Noop = 0x00,
    DecodeMode = 0x09,
    Intensity = 0x0A,
    ScanLimit = 0x0B,
    /// Written `0` enters shutdown, `1` is normal operation.
    Shutdown = 0x0C,
    /// Forces every segment on without touching the digit registers.
    DisplayTest = 0x0F,
}

impl Register {
    /// Address of the register holding digit `index`, 0 being the rightmost. `None`
    /// past the last digit.
    pub fn digit(index: u8) -> Option<u8> {
        (index < MAX_DIGITS).then(|| index + 1)
    }
}

impl From<Register> for u8 {
    fn from(register: Register) -> u8 {
        register as u8
    }
}

/// Which digits the chip runs through its internal Code B font.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeMode {
    /// Raw segment bits for every digit.
    NoDecode = 0x00,
    CodeBDigit0 = 0x01,
    CodeBDigits3_0 = 0x0F,
    CodeBDigits7_0 = 0xFF,
}

/// Placement of text and numbers on the display.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alignment {
    Left,
    Right,
    /// Right aligned, padded with zeros. Only meaningful for numbers: aligned text
    /// rendering ignores it and writes nothing.
    RightZeros,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecimalPoint {
    Off = 0x00,
    On = DP_BIT,
}

impl From<bool> for DecimalPoint {
    fn from(on: bool) -> Self {
        if on {
            DecimalPoint::On
        } else {
            DecimalPoint::Off
        }
    }
}

/// Lifecycle of a controller. Nothing stops calls outside `Active`, the chip simply
/// ignores or misrenders them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    Active,
    Ended,
}
