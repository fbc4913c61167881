//! The two ways of getting a register write to the chip: bit-banged GPIO lines or a
//! hardware SPI device.
//!
//! Every write is a 16 bit frame, register address first, most significant bit first.
//! The chip latches it on the rising edge of chip select. Nothing is ever read back.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Mode, SpiDevice, MODE_0};

/// Clock polarity and phase the chip expects.
pub const MODE: Mode = MODE_0;

/// Core clock the SPI divider is derived from.
pub const CORE_CLOCK_HZ: u32 = 250_000_000;
/// Slowest clock the divider can produce.
pub const MIN_CLOCK_HZ: u32 = 30_500;
/// Fastest clock the divider can produce.
pub const MAX_CLOCK_HZ: u32 = 125_000_000;
/// Divider used when no frequency is requested, 3.9 MHz on a 250 MHz core.
pub const DEFAULT_CLOCK_DIVIDER: u16 = 64;
/// Largest value the divider field takes.
pub const MAX_CLOCK_DIVIDER: u16 = 0x0FFF;

/// One register write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub register: u8,
    pub data: u8,
}

impl Frame {
    pub fn new(register: u8, data: u8) -> Self {
        Self { register, data }
    }

    pub fn to_bytes(self) -> [u8; 2] {
        [self.register, self.data]
    }
}

/// Something that can deliver frames to the chip.
///
/// `begin` and `end` bracket a session; frames are only sent in between.
pub trait Transport {
    type Error;

    /// `true` for a hardware SPI bus, `false` for bit-banged lines.
    const HARDWARE: bool;

    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Send one frame. `comm_delay_us` is the time each clock level is held on
    /// bit-banged lines, hardware buses ignore it.
    fn write_frame<D: DelayNs>(
        &mut self,
        frame: Frame,
        delay: &mut D,
        comm_delay_us: u16,
    ) -> Result<(), Self::Error>;

    fn end(&mut self) -> Result<(), Self::Error>;
}

/// Three GPIO lines driven by software.
pub struct BitBang<CLK, CS, DIN> {
    clk: CLK,
    cs: CS,
    din: DIN,
}

impl<CLK, CS, DIN> BitBang<CLK, CS, DIN> {
    /// Pins must already be configured as push-pull outputs.
    pub fn new(clk: CLK, cs: CS, din: DIN) -> Self {
        Self { clk, cs, din }
    }

    /// Give the pins back as `(clk, cs, din)`.
    pub fn release(self) -> (CLK, CS, DIN) {
        (self.clk, self.cs, self.din)
    }
}

impl<CLK, CS, DIN> BitBang<CLK, CS, DIN>
where
    CLK: OutputPin,
    CS: OutputPin<Error = CLK::Error>,
    DIN: OutputPin<Error = CLK::Error>,
{
    /// Put data on the line and raise the clock; the chip samples on the rising edge.
    pub(crate) fn clock_high(&mut self, bit: bool) -> Result<(), CLK::Error> {
        if bit {
            self.din.set_high()?;
        } else {
            self.din.set_low()?;
        }
        self.clk.set_high()
    }

    pub(crate) fn clock_low(&mut self) -> Result<(), CLK::Error> {
        self.clk.set_low()
    }

    pub(crate) fn select(&mut self) -> Result<(), CLK::Error> {
        self.cs.set_low()
    }

    pub(crate) fn deselect(&mut self) -> Result<(), CLK::Error> {
        self.cs.set_high()
    }

    pub(crate) fn idle(&mut self) -> Result<(), CLK::Error> {
        self.clk.set_low()?;
        self.din.set_low()?;
        self.cs.set_high()
    }

    pub(crate) fn all_low(&mut self) -> Result<(), CLK::Error> {
        self.cs.set_low()?;
        self.clk.set_low()?;
        self.din.set_low()
    }
}

/// Bits of a frame in the order they go out.
pub(crate) fn bits(frame: Frame) -> impl Iterator<Item = bool> {
    let word = u16::from_be_bytes(frame.to_bytes());
    (0..16).rev().map(move |n| word & (1 << n) != 0)
}

impl<CLK, CS, DIN> Transport for BitBang<CLK, CS, DIN>
where
    CLK: OutputPin,
    CS: OutputPin<Error = CLK::Error>,
    DIN: OutputPin<Error = CLK::Error>,
{
    type Error = CLK::Error;

    const HARDWARE: bool = false;

    fn begin(&mut self) -> Result<(), Self::Error> {
        debug!("bit-bang: lines idle");
        self.idle()
    }

    fn write_frame<D: DelayNs>(
        &mut self,
        frame: Frame,
        delay: &mut D,
        comm_delay_us: u16,
    ) -> Result<(), Self::Error> {
        self.select()?;
        for bit in bits(frame) {
            self.clock_high(bit)?;
            delay.delay_us(comm_delay_us.into());
            self.clock_low()?;
            delay.delay_us(comm_delay_us.into());
        }
        self.deselect()
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        debug!("bit-bang: lines low");
        self.all_low()
    }
}

/// Which of the two hardware chip enable lines the chip hangs off.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelect {
    Ce0,
    Ce1,
}

/// Bus setup for the hardware path.
///
/// The SPI device itself is set up by the HAL; this records what it has to be set up
/// with: [`MODE`], MSB first, chip select active low, and the clock below.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    kilohertz: u32,
    chip_select: ChipSelect,
}

impl SpiConfig {
    /// `kilohertz` of 0 picks [`DEFAULT_CLOCK_DIVIDER`].
    pub fn new(kilohertz: u32, chip_select: ChipSelect) -> Self {
        Self {
            kilohertz,
            chip_select,
        }
    }

    pub fn kilohertz(&self) -> u32 {
        self.kilohertz
    }

    pub fn chip_select(&self) -> ChipSelect {
        self.chip_select
    }

    /// Divider of [`CORE_CLOCK_HZ`] giving the closest clock not above the requested one.
    pub fn clock_divider(&self) -> u16 {
        if self.kilohertz == 0 {
            return DEFAULT_CLOCK_DIVIDER;
        }
        let hz = self
            .kilohertz
            .saturating_mul(1000)
            .clamp(MIN_CLOCK_HZ, MAX_CLOCK_HZ);
        let divider = (CORE_CLOCK_HZ + 2 * hz - 1) / (2 * hz) - 1;
        divider.min(MAX_CLOCK_DIVIDER.into()) as u16
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::new(5000, ChipSelect::Ce0)
    }
}

/// A hardware SPI device.
pub struct HardwareSpi<SPI> {
    spi: SPI,
    config: SpiConfig,
    open: bool,
}

impl<SPI> HardwareSpi<SPI> {
    /// Wraps an SPI device the HAL already configured. This crate cannot touch the
    /// peripheral, so the HAL must set it up from `config`: clock divider from
    /// [`SpiConfig::clock_divider`], chip enable from [`SpiConfig::chip_select`],
    /// [`MODE`], MSB first and chip select active low. `config` is kept for
    /// [`Self::config`] and logging only.
    pub fn new(spi: SPI, config: SpiConfig) -> Self {
        Self {
            spi,
            config,
            open: false,
        }
    }

    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    /// Between `begin` and `end`.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    pub(crate) fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    pub(crate) fn open(&mut self) {
        debug!(
            "spi: open, divider {=u16}, {}",
            self.config.clock_divider(),
            self.config.chip_select
        );
        self.open = true;
    }

    pub(crate) fn close(&mut self) {
        debug!("spi: closed");
        self.open = false;
    }
}

impl<SPI: SpiDevice> Transport for HardwareSpi<SPI> {
    type Error = SPI::Error;

    const HARDWARE: bool = true;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.open();
        Ok(())
    }

    fn write_frame<D: DelayNs>(
        &mut self,
        frame: Frame,
        _delay: &mut D,
        _comm_delay_us: u16,
    ) -> Result<(), Self::Error> {
        self.spi_mut().write(&frame.to_bytes())
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        self.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;
    use std::vec::Vec;

    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
        spi::{Mock as SpiMock, Transaction as SpiTransaction},
    };

    fn level(bit: bool) -> PinTransaction {
        PinTransaction::set(if bit { PinState::High } else { PinState::Low })
    }

    #[test]
    fn frame_bits_are_msb_first() {
        let got: Vec<bool> = bits(Frame::new(0x0B, 0x81)).collect();
        let mut expected = vec![false, false, false, false, true, false, true, true];
        expected.extend([true, false, false, false, false, false, false, true]);
        assert_eq!(got, expected);
    }

    #[test]
    fn bit_bang_shifts_frame_inside_chip_select() {
        let frame = Frame::new(0x0A, 0x0F);

        let cs_expect = [level(false), level(true)];
        let mut clk_expect = Vec::new();
        let mut din_expect = Vec::new();
        for bit in bits(frame) {
            din_expect.push(level(bit));
            clk_expect.push(level(true));
            clk_expect.push(level(false));
        }

        let mut clk = PinMock::new(&clk_expect);
        let mut cs = PinMock::new(&cs_expect);
        let mut din = PinMock::new(&din_expect);

        let mut transport = BitBang::new(clk.clone(), cs.clone(), din.clone());
        transport
            .write_frame(frame, &mut NoopDelay::new(), 0)
            .unwrap();

        clk.done();
        cs.done();
        din.done();
    }

    #[test]
    fn bit_bang_session_levels() {
        // begin idles, end pulls everything low
        let mut clk = PinMock::new(&[level(false), level(false)]);
        let mut cs = PinMock::new(&[level(true), level(false)]);
        let mut din = PinMock::new(&[level(false), level(false)]);

        let mut transport = BitBang::new(clk.clone(), cs.clone(), din.clone());
        transport.begin().unwrap();
        transport.end().unwrap();

        clk.done();
        cs.done();
        din.done();
    }

    #[test]
    fn hardware_spi_writes_two_bytes() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x0C, 0x01]),
            SpiTransaction::transaction_end(),
        ];
        let mut spi = SpiMock::new(&expectations);
        let mut transport = HardwareSpi::new(spi.clone(), SpiConfig::default());

        transport.begin().unwrap();
        assert!(transport.is_open());
        transport
            .write_frame(Frame::new(0x0C, 0x01), &mut NoopDelay::new(), 100)
            .unwrap();
        transport.end().unwrap();
        assert!(!transport.is_open());

        spi.done();
    }

    #[test]
    fn hardware_spi_hands_config_to_the_hal() {
        let mut spi = SpiMock::<u8>::new(&[]);
        let transport = HardwareSpi::new(spi.clone(), SpiConfig::new(1000, ChipSelect::Ce1));
        assert!(!transport.is_open());
        assert_eq!(transport.config().chip_select(), ChipSelect::Ce1);
        assert_eq!(transport.config().kilohertz(), 1000);
        // 250 MHz / (2 * 1 MHz) = 125
        assert_eq!(transport.config().clock_divider(), 124);
        assert_eq!(MODE, MODE_0);
        spi.done();
    }

    #[test]
    fn clock_divider_from_kilohertz() {
        assert_eq!(SpiConfig::new(0, ChipSelect::Ce0).clock_divider(), 64);
        // 250 MHz / (2 * 5 MHz) = 25
        assert_eq!(SpiConfig::new(5000, ChipSelect::Ce0).clock_divider(), 24);
        // Rounded up so the clock never exceeds the request.
        assert_eq!(SpiConfig::new(3000, ChipSelect::Ce1).clock_divider(), 41);
        // Clamped to 125 MHz and 30.5 kHz.
        assert_eq!(SpiConfig::new(500_000, ChipSelect::Ce0).clock_divider(), 0);
        assert_eq!(
            SpiConfig::new(1, ChipSelect::Ce0).clock_divider(),
            MAX_CLOCK_DIVIDER
        );
    }
}
