use embedded_hal::digital::OutputPin;
use embedded_hal_async::{delay::DelayNs, spi::SpiDevice};

use crate::font::{self, CodeB};
use crate::layout::{self, Cell, Cells, Field, Pad};
use crate::transport::{bits, BitBang, Frame, HardwareSpi};
use crate::{
    Alignment, DecimalPoint, DecodeMode, Register, State, INTENSITY_DEFAULT, INTENSITY_MAX,
    MAX_DIGITS,
};

/// Async counterpart of [`crate::transport::Transport`].
#[allow(async_fn_in_trait)]
pub trait AsyncTransport {
    type Error;

    const HARDWARE: bool;

    async fn begin(&mut self) -> Result<(), Self::Error>;

    async fn write_frame<D: DelayNs>(
        &mut self,
        frame: Frame,
        delay: &mut D,
        comm_delay_us: u16,
    ) -> Result<(), Self::Error>;

    async fn end(&mut self) -> Result<(), Self::Error>;
}

impl<CLK, CS, DIN> AsyncTransport for BitBang<CLK, CS, DIN>
where
    CLK: OutputPin,
    CS: OutputPin<Error = CLK::Error>,
    DIN: OutputPin<Error = CLK::Error>,
{
    type Error = CLK::Error;

    const HARDWARE: bool = false;

    async fn begin(&mut self) -> Result<(), Self::Error> {
        debug!("bit-bang: lines idle");
        self.idle()
    }

    async fn write_frame<D: DelayNs>(
        &mut self,
        frame: Frame,
        delay: &mut D,
        comm_delay_us: u16,
    ) -> Result<(), Self::Error> {
        self.select()?;
        for bit in bits(frame) {
            self.clock_high(bit)?;
            delay.delay_us(comm_delay_us.into()).await;
            self.clock_low()?;
            delay.delay_us(comm_delay_us.into()).await;
        }
        self.deselect()
    }

    async fn end(&mut self) -> Result<(), Self::Error> {
        debug!("bit-bang: lines low");
        self.all_low()
    }
}

impl<SPI: SpiDevice> AsyncTransport for HardwareSpi<SPI> {
    type Error = SPI::Error;

    const HARDWARE: bool = true;

    async fn begin(&mut self) -> Result<(), Self::Error> {
        self.open();
        Ok(())
    }

    async fn write_frame<D: DelayNs>(
        &mut self,
        frame: Frame,
        _delay: &mut D,
        _comm_delay_us: u16,
    ) -> Result<(), Self::Error> {
        self.spi_mut().write(&frame.to_bytes()).await
    }

    async fn end(&mut self) -> Result<(), Self::Error> {
        self.close();
        Ok(())
    }
}

/// API to write to the display.
pub struct Max7219<'a, T, D>
where
    T: AsyncTransport,
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
    T: AsyncTransport,
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

    pub fn with_comm_delay(mut self, micros: u16) -> Self {
        self.comm_delay = micros;
        self
    }

    /// Initializes the chip, see [`crate::sync_display::Max7219::init`].
    pub async fn init(mut self) -> Result<Self, T::Error> {
        self.transport.begin().await?;
        self.delay.delay_ms(50).await;

        debug!(
            "max7219: init {=u8} digits, {}",
            self.digits,
            self.decode_mode
        );
        self.write(Register::ScanLimit, self.digits - 1).await?;
        self.write(Register::DecodeMode, self.decode_mode as u8)
            .await?;
        self.set_shutdown(false).await?;
        self.set_display_test(false).await?;
        self.clear().await?;
        self.set_brightness(INTENSITY_DEFAULT).await?;
        self.state = State::Active;
        Ok(self)
    }

    pub async fn end(&mut self) -> Result<(), T::Error> {
        self.transport.end().await?;
        self.state = State::Ended;
        debug!("max7219: ended");
        Ok(())
    }

    pub fn release(self) -> T {
        self.transport
    }

    async fn write(&mut self, register: impl Into<u8>, data: u8) -> Result<(), T::Error> {
        let frame = Frame::new(register.into(), data);
        self.transport
            .write_frame(frame, &mut *self.delay, self.comm_delay)
            .await
    }

    async fn write_digit(&mut self, digit: u8, data: u8) -> Result<(), T::Error> {
        match Register::digit(digit) {
            Some(register) if digit < self.digits => self.write(register, data).await,
            _ => Ok(()),
        }
    }

    pub async fn clear(&mut self) -> Result<(), T::Error> {
        for digit in 0..self.digits {
            self.write_digit(digit, 0x00).await?;
        }
        Ok(())
    }

    pub async fn set_segments(&mut self, digit: u8, segments: u8) -> Result<(), T::Error> {
        self.write_digit(digit, segments).await
    }

    pub async fn display_char(
        &mut self,
        digit: u8,
        character: u8,
        dp: DecimalPoint,
    ) -> Result<(), T::Error> {
        self.write_digit(digit, font::glyph(character) | dp as u8)
            .await
    }

    pub async fn display_bcd_char(
        &mut self,
        digit: u8,
        code: CodeB,
        dp: DecimalPoint,
    ) -> Result<(), T::Error> {
        self.write_digit(digit, code as u8 | dp as u8).await
    }

    async fn draw(&mut self, cells: Cells<'_>) -> Result<(), T::Error> {
        for Cell { digit, character, dp } in cells {
            let code = if character.is_ascii() {
                character as u8
            } else {
                0
            };
            self.display_char(digit, code, dp).await?;
        }
        Ok(())
    }

    pub async fn display_text(&mut self, text: &str) -> Result<(), T::Error> {
        self.draw(Cells::fixed(text, self.digits)).await
    }

    pub async fn display_text_aligned(
        &mut self,
        text: &str,
        alignment: Alignment,
    ) -> Result<(), T::Error> {
        self.draw(Cells::aligned(text, self.digits, alignment))
            .await
    }

    pub async fn display_bcd_text(&mut self, text: &str) -> Result<(), T::Error> {
        for cell in Cells::fixed(text, self.digits) {
            self.display_bcd_char(cell.digit, CodeB::from_char(cell.character), cell.dp)
                .await?;
        }
        Ok(())
    }

    pub async fn display_int(&mut self, number: u32, alignment: Alignment) -> Result<(), T::Error> {
        let field = layout::number(number, self.digits, Pad::whole(alignment));
        self.display_text(field.as_str()).await
    }

    pub async fn display_two_fields(
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
        self.display_text(text.as_str()).await
    }

    pub async fn set_brightness(&mut self, level: u8) -> Result<(), T::Error> {
        let level = level.min(INTENSITY_MAX);
        self.write(Register::Intensity, level).await?;
        self.intensity = level;
        Ok(())
    }

    /// `0` in the shutdown register shuts down, `1` is normal operation.
    pub async fn set_shutdown(&mut self, on: bool) -> Result<(), T::Error> {
        self.write(Register::Shutdown, if on { 0 } else { 1 })
            .await?;
        self.shutdown = on;
        Ok(())
    }

    pub async fn set_display_test(&mut self, on: bool) -> Result<(), T::Error> {
        self.write(Register::DisplayTest, on as u8).await?;
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
