use core::convert::Infallible;

use embassy_futures::block_on;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction};

use max7219_7seg::async_display::{AsyncTransport, Max7219};
use max7219_7seg::font;
use max7219_7seg::transport::{BitBang, ChipSelect, Frame, HardwareSpi, SpiConfig};
use max7219_7seg::{Alignment, State};

struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

fn level(high: bool) -> PinTransaction {
    PinTransaction::set(if high { PinState::High } else { PinState::Low })
}

#[derive(Default)]
struct Recorder {
    frames: Vec<(u8, u8)>,
}

impl AsyncTransport for Recorder {
    type Error = Infallible;

    const HARDWARE: bool = false;

    async fn begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn write_frame<D: DelayNs>(
        &mut self,
        frame: Frame,
        _delay: &mut D,
        _comm_delay_us: u16,
    ) -> Result<(), Self::Error> {
        self.frames.push((frame.register, frame.data));
        Ok(())
    }

    async fn end(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[test]
fn init_and_text() {
    let mut delay = NoDelay;
    let recorder = block_on(async {
        let mut display = Max7219::new(Recorder::default(), &mut delay)
            .with_digits(4)
            .init()
            .await
            .unwrap();
        assert_eq!(display.state(), State::Active);
        display
            .display_text_aligned("1.5", Alignment::Right)
            .await
            .unwrap();
        display.end().await.unwrap();
        assert_eq!(display.state(), State::Ended);
        display.release()
    });

    let mut expected = vec![(0x0B, 3), (0x09, 0x00), (0x0C, 1), (0x0F, 0)];
    expected.extend((1..=4).map(|r| (r, 0x00)));
    expected.push((0x0A, 0x08));
    expected.push((2, font::glyph(b'1') | 0x80));
    expected.push((1, font::glyph(b'5')));
    assert_eq!(recorder.frames, expected);
}

#[test]
fn integer_over_spi() {
    let mut expected = Vec::new();
    for (register, c) in (1..=4).rev().zip(b"0042".iter()) {
        expected.push(Transaction::transaction_start());
        expected.push(Transaction::write_vec(vec![register, font::glyph(*c)]));
        expected.push(Transaction::transaction_end());
    }
    let mut spi = SpiMock::new(&expected);
    let mut delay = NoDelay;
    let transport = HardwareSpi::new(spi.clone(), SpiConfig::new(1000, ChipSelect::Ce1));

    block_on(async {
        let mut display = Max7219::new(transport, &mut delay).with_digits(4);
        assert!(display.is_hardware_spi());
        display
            .display_int(42, Alignment::RightZeros)
            .await
            .unwrap();
    });
    spi.done();
}

#[test]
fn bit_bang_shifts_frame_inside_chip_select() {
    let frame = Frame::new(0x0A, 0x0F);
    let word = u16::from_be_bytes(frame.to_bytes());

    let cs_expect = [level(false), level(true)];
    let mut clk_expect = Vec::new();
    let mut din_expect = Vec::new();
    for shift in (0..16).rev() {
        din_expect.push(level(word >> shift & 1 == 1));
        clk_expect.push(level(true));
        clk_expect.push(level(false));
    }

    let mut clk = PinMock::new(&clk_expect);
    let mut cs = PinMock::new(&cs_expect);
    let mut din = PinMock::new(&din_expect);
    let mut delay = NoDelay;

    let mut transport = BitBang::new(clk.clone(), cs.clone(), din.clone());
    block_on(AsyncTransport::write_frame(&mut transport, frame, &mut delay, 0)).unwrap();

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
    block_on(async {
        AsyncTransport::begin(&mut transport).await.unwrap();
        AsyncTransport::end(&mut transport).await.unwrap();
    });

    clk.done();
    cs.done();
    din.done();
}
