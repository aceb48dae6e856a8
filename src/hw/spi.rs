// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial Peripheral Interface (SPI) abstraction layer.
//!
//! - `SpiBus` wraps a configured HAL SPI instance with 8-bit words.
//! - `ChipSelect` is an active-low GPIO output wrapper for manual CS control.
//! - `EncoderSpi` pairs the two and implements [`AngleBus`] for the absolute encoder.

use stm32f7xx_hal::{
    gpio::{self, Output, PinState, PushPull},
    prelude::*,
    spi::{self, Enabled, Mode, Phase, Polarity, Spi},
};

use crate::sensing::AngleBus;

/// SPI mode of the absolute encoder: clock idles low, data captured on the falling edge.
pub const ENCODER_SPI_MODE: Mode = Mode {
    polarity: Polarity::IdleLow,
    phase: Phase::CaptureOnSecondTransition,
};

/// Wrapper around an enabled HAL SPI instance (8-bit words).
pub struct SpiBus<I, P> {
    spi: Spi<I, P, Enabled<u8>>,
}

impl<I, P> SpiBus<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(spi: Spi<I, P, Enabled<u8>>) -> Self {
        Self { spi }
    }

    /// Perform a blocking, full-duplex transfer of one byte.
    pub fn transfer_byte(&mut self, byte: u8) -> Result<u8, spi::Error> {
        let mut tmp = [byte];
        self.spi.transfer(&mut tmp)?;
        Ok(tmp[0])
    }

    /// Transfer a byte buffer in-place.
    pub fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), spi::Error> {
        for b in buf.iter_mut() {
            *b = self.transfer_byte(*b)?;
        }
        Ok(())
    }

    /// Full-duplex 16-bit exchange, most significant byte first.
    pub fn transfer_word(&mut self, word: u16) -> Result<u16, spi::Error> {
        let mut buf = word.to_be_bytes();
        self.transfer_in_place(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
}

/// Manual chip-select line, active-low, generic over any GPIO pin.
pub struct ChipSelect<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> ChipSelect<P, N> {
    /// Create an active-low chip select and set to the inactive state (i.e., high).
    pub fn active_low<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        let mut pin = pin.into_push_pull_output();
        pin.set_state(PinState::High);
        Self { pin }
    }

    /// Assert the chip select.
    #[inline]
    pub fn select(&mut self) {
        self.pin.set_low();
    }

    /// Deassert the chip select.
    #[inline]
    pub fn deselect(&mut self) {
        self.pin.set_high();
    }
}

/// Absolute encoder link: one SPI bus plus its chip-select.
///
/// The bus must already be enabled in [`ENCODER_SPI_MODE`] at the configured clock.
pub struct EncoderSpi<I, P, const CS_P: char, const CS_N: u8> {
    bus: SpiBus<I, P>,
    cs: ChipSelect<CS_P, CS_N>,
}

impl<I, P, const CS_P: char, const CS_N: u8> EncoderSpi<I, P, CS_P, CS_N>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(bus: SpiBus<I, P>, cs: ChipSelect<CS_P, CS_N>) -> Self {
        Self { bus, cs }
    }
}

impl<I, P, const CS_P: char, const CS_N: u8> AngleBus for EncoderSpi<I, P, CS_P, CS_N>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    type Error = spi::Error;

    fn start(&mut self) -> Result<(), spi::Error> {
        self.cs.deselect();
        Ok(())
    }

    #[inline]
    fn select(&mut self) {
        self.cs.select();
    }

    #[inline]
    fn deselect(&mut self) {
        self.cs.deselect();
    }

    #[inline]
    fn exchange(&mut self, word: u16) -> Result<u16, spi::Error> {
        self.bus.transfer_word(word)
    }
}
