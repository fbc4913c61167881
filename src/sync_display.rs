use embedded_hal::delay::DelayNs;

use ufmt_write::uWrite;

use crate::font::{self, CodeB};
use crate::layout::{self, Cell, Cells, Field, Pad};
use crate::transport::{Frame, Transport};
use crate::{
    Alignment, DecimalPoint, DecodeMode, Register, State, INTENSITY_DEFAULT, INTENSITY_MAX,
    MAX_DIGITS,
};

/// API to write to the display.
pub struct Max7219<'a, T, D>
where
    T: Transport,
    D: DelayNs,
{
    transport: T,
    delay: &'a mut D,
    digits: u8,
    decode_mode: DecodeMode,
    intensity: u8,
    shutdown: bool,
    display_test: bool,
    comm_delay: u16,
    state: State,
}

impl<'a, T, D> Max7219<'a, T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Create new instance for eight digits without decoding.
    pub fn new(transport: T, delay: &'a mut D) -> Self {
        Self {
            transport,
            delay,
            digits: MAX_DIGITS,
            decode_mode: DecodeMode::NoDecode,
            intensity: INTENSITY_DEFAULT,
            shutdown: true,
            display_test: false,
            comm_delay: 0,
            state: State::Uninitialized,
        }
    }

    /// Number of digits wired up, clamped to `1..=8`. Becomes the scan limit, so it
    /// only applies before [`Self::init`] and is ignored afterwards.
    pub fn with_digits(mut self, digits: u8) -> Self {
        if self.state == State::Uninitialized {
            self.digits = digits.clamp(1, MAX_DIGITS);
        }
        self
    }

    /// Only applies before init, like [`Self::with_digits`].
    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        if self.state == State::Uninitialized {
            self.decode_mode = mode;
        }
        self
    }

    /// Microseconds each clock level is held on bit-banged lines. 0 runs as fast as
    /// the pins toggle.
    pub fn with_comm_delay(mut self, micros: u16) -> Self {
        self.comm_delay = micros;
        self
    }

    /// Starts the session and brings the chip into a known state: scan limit and
    /// decode mode as configured, out of shutdown and test mode, all digits blank,
    /// default brightness.
    pub fn init(mut self) -> Result<Self, T::Error> {
        self.transport.begin()?;
        // Give the chip time to settle before the first frame.
        self.delay.delay_ms(50);

        debug!(
            "max7219: init {=u8} digits, {}",
            self.digits,
            self.decode_mode
        );
        self.write(Register::ScanLimit, self.digits - 1)?;
        self.write(Register::DecodeMode, self.decode_mode as u8)?;
        self.set_shutdown(false)?;
        self.set_display_test(false)?;
        self.clear()?;
        self.set_brightness(INTENSITY_DEFAULT)?;
        self.state = State::Active;
        Ok(self)
    }

    /// Ends the session: bit-banged lines are pulled low, a hardware bus is let go.
    pub fn end(&mut self) -> Result<(), T::Error> {
        self.transport.end()?;
        self.state = State::Ended;
        debug!("max7219: ended");
        Ok(())
    }

    /// Give the transport back.
    pub fn release(self) -> T {
        self.transport
    }

    fn write(&mut self, register: impl Into<u8>, data: u8) -> Result<(), T::Error> {
        let frame = Frame::new(register.into(), data);
        self.transport
            .write_frame(frame, &mut *self.delay, self.comm_delay)
    }

    fn write_digit(&mut self, digit: u8, data: u8) -> Result<(), T::Error> {
        match Register::digit(digit) {
            Some(register) if digit < self.digits => self.write(register, data),
            _ => Ok(()),
        }
    }

    /// Blank every digit.
    pub fn clear(&mut self) -> Result<(), T::Error> {
        for digit in 0..self.digits {
            self.write_digit(digit, 0x00)?;
        }
        Ok(())
    }

    /// Write a raw segment byte, `dp a b c d e f g`. Digit 0 is the rightmost.
    pub fn set_segments(&mut self, digit: u8, segments: u8) -> Result<(), T::Error> {
        self.write_digit(digit, segments)
    }

    /// Display an ASCII character. Anything outside `' '..='z'` is blank.
    pub fn display_char(
        &mut self,
        digit: u8,
        character: u8,
        dp: DecimalPoint,
    ) -> Result<(), T::Error> {
        self.write_digit(digit, font::glyph(character) | dp as u8)
    }

    /// Display a Code B glyph. Only readable on digits in decode mode.
    pub fn display_bcd_char(
        &mut self,
        digit: u8,
        code: CodeB,
        dp: DecimalPoint,
    ) -> Result<(), T::Error> {
        self.write_digit(digit, code as u8 | dp as u8)
    }

    fn draw(&mut self, cells: Cells<'_>) -> Result<(), T::Error> {
        for Cell { digit, character, dp } in cells {
            let code = if character.is_ascii() {
                character as u8
            } else {
                0
            };
            self.display_char(digit, code, dp)?;
        }
        Ok(())
    }

    /// Write string to display, starting at the leftmost digit.
    ///
    /// A `.` following a character lights that character's decimal point. Meant for
    /// text already formatted to the display width; digits past the end of `text`
    /// are left alone.
    pub fn display_text(&mut self, text: &str) -> Result<(), T::Error> {
        self.draw(Cells::fixed(text, self.digits))
    }

    /// Write string to display with the given alignment, dropping what does not fit.
    ///
    /// [`Alignment::Right`] only touches as many digits as the text needs, clear the
    /// display first for a clean result. [`Alignment::RightZeros`] writes nothing.
    pub fn display_text_aligned(
        &mut self,
        text: &str,
        alignment: Alignment,
    ) -> Result<(), T::Error> {
        self.draw(Cells::aligned(text, self.digits, alignment))
    }

    /// Write string to display in Code B, starting at the leftmost digit.
    pub fn display_bcd_text(&mut self, text: &str) -> Result<(), T::Error> {
        for cell in Cells::fixed(text, self.digits) {
            self.display_bcd_char(cell.digit, CodeB::from_char(cell.character), cell.dp)?;
        }
        Ok(())
    }

    /// Display a number across all digits. Numbers with more digits than the display
    /// keep their leading digits.
    pub fn display_int(&mut self, number: u32, alignment: Alignment) -> Result<(), T::Error> {
        let field = layout::number(number, self.digits, Pad::whole(alignment));
        self.display_text(field.as_str())
    }

    /// Split the display in two halves and show one number in each, `upper` on the
    /// left.
    pub fn display_two_fields(
        &mut self,
        upper: u16,
        lower: u16,
        alignment: Alignment,
    ) -> Result<(), T::Error> {
        let half = self.digits / 2;
        let pad = Pad::half(alignment);
        let mut text = Field::new();
        let _ = text.push_str(&layout::number(upper.into(), half, pad));
        let _ = text.push_str(&layout::number(lower.into(), half, pad));
        self.display_text(text.as_str())
    }

    /// Brightness from `0x00` to `0x0F`, higher values are clamped.
    pub fn set_brightness(&mut self, level: u8) -> Result<(), T::Error> {
        let level = level.min(INTENSITY_MAX);
        self.write(Register::Intensity, level)?;
        self.intensity = level;
        Ok(())
    }

    /// Turn shutdown (power saving) mode on or off.
    ///
    /// The register is inverted: `0` shuts down, `1` is normal operation.
    pub fn set_shutdown(&mut self, on: bool) -> Result<(), T::Error> {
        self.write(Register::Shutdown, if on { 0 } else { 1 })?;
        self.shutdown = on;
        Ok(())
    }

    /// Light every segment without changing what the digits hold.
    pub fn set_display_test(&mut self, on: bool) -> Result<(), T::Error> {
        self.write(Register::DisplayTest, on as u8)?;
        self.display_test = on;
        Ok(())
    }

    pub fn set_comm_delay(&mut self, micros: u16) {
        self.comm_delay = micros;
    }

    pub fn comm_delay(&self) -> u16 {
        self.comm_delay
    }

    pub fn is_hardware_spi(&self) -> bool {
        T::HARDWARE
    }

    pub fn digits(&self) -> u8 {
        self.digits
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub fn is_display_test(&self) -> bool {
        self.display_test
    }

    pub fn state(&self) -> State {
        self.state
    }
}

impl<'a, T, D> uWrite for Max7219<'a, T, D>
where
    T: Transport,
    D: DelayNs,
{
    type Error = T::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.display_text(s)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;

    use super::*;
    use crate::transport::{HardwareSpi, SpiConfig};
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        spi::{Mock as SpiMock, Transaction},
    };

    fn frame(register: u8, data: u8) -> [Transaction<u8>; 3] {
        [
            Transaction::transaction_start(),
            Transaction::write_vec(vec![register, data]),
            Transaction::transaction_end(),
        ]
    }

    #[test]
    fn init_sequence_over_spi() {
        let mut expected = vec![];
        expected.extend(frame(0x0B, 0x03));
        expected.extend(frame(0x09, 0xFF));
        expected.extend(frame(0x0C, 0x01));
        expected.extend(frame(0x0F, 0x00));
        for register in 1..=4 {
            expected.extend(frame(register, 0x00));
        }
        expected.extend(frame(0x0A, 0x08));

        let mut spi = SpiMock::new(&expected);
        let mut delay = NoopDelay::new();
        let transport = HardwareSpi::new(spi.clone(), SpiConfig::default());
        let display = Max7219::new(transport, &mut delay)
            .with_digits(4)
            .with_decode_mode(DecodeMode::CodeBDigits7_0)
            .init()
            .unwrap();

        assert!(display.is_hardware_spi());
        assert_eq!(display.state(), State::Active);
        assert!(!display.is_shutdown());
        spi.done();
    }

    #[test]
    fn brightness_is_clamped() {
        let mut spi = SpiMock::new(&frame(0x0A, 0x0F));
        let mut delay = NoopDelay::new();
        let transport = HardwareSpi::new(spi.clone(), SpiConfig::default());
        let mut display = Max7219::new(transport, &mut delay);

        display.set_brightness(0xFF).unwrap();
        assert_eq!(display.intensity(), INTENSITY_MAX);
        spi.done();
    }

    #[test]
    fn shutdown_register_is_inverted() {
        let mut expected = vec![];
        expected.extend(frame(0x0C, 0x00));
        expected.extend(frame(0x0C, 0x01));
        let mut spi = SpiMock::new(&expected);
        let mut delay = NoopDelay::new();
        let transport = HardwareSpi::new(spi.clone(), SpiConfig::default());
        let mut display = Max7219::new(transport, &mut delay);

        display.set_shutdown(true).unwrap();
        assert!(display.is_shutdown());
        display.set_shutdown(false).unwrap();
        assert!(!display.is_shutdown());
        spi.done();
    }

    #[test]
    fn ufmt_renders_through_display_text() {
        let mut expected = vec![];
        expected.extend(frame(0x08, font::glyph(b'4')));
        expected.extend(frame(0x07, font::glyph(b'2')));
        let mut spi = SpiMock::new(&expected);
        let mut delay = NoopDelay::new();
        let transport = HardwareSpi::new(spi.clone(), SpiConfig::default());
        let mut display = Max7219::new(transport, &mut delay);

        ufmt::uwrite!(display, "{}", 42).unwrap();
        spi.done();
    }
}
