// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 16-bit single-turn absolute encoder read over a synchronous serial bus.
//!
//! Each read asserts chip-select, clocks out a don't-care zero word while the sensor clocks back
//! its current angle code, then deasserts chip-select. The `[0, 360)` reading is passed through
//! an [`AngleUnwrapper`] so that multi-turn motion comes out continuous.

use crate::config::AbsoluteConfig;
use crate::sensing::{rate, AngleSensor, AngleUnwrapper};

/// Codes per revolution of a 16-bit sensor.
pub const COUNTS_PER_REV: f32 = 65536.0;

/// Command word sent while reading. The sensor ignores it.
const READ_COMMAND: u16 = 0x0000;

/// Error type for `AbsoluteEncoder` operations.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// A read was attempted before `start_bus`.
    NotStarted,
    /// The underlying bus transfer failed.
    Bus(E),
}

/// Bus plus chip-select needed to talk to the sensor.
///
/// Implemented by the board layer on top of the HAL SPI peripheral.
pub trait AngleBus {
    type Error;

    /// Put the bus in the sensor's mode and deassert chip-select.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Assert chip-select.
    fn select(&mut self);

    /// Deassert chip-select.
    fn deselect(&mut self);

    /// Full-duplex exchange of one 16-bit word.
    fn exchange(&mut self, word: u16) -> Result<u16, Self::Error>;
}

/// Absolute encoder with software unwrapping.
pub struct AbsoluteEncoder<B> {
    bus: B,
    unwrapper: AngleUnwrapper,
    started: bool,
    /// Unwrapped angle at the previous `get_speed` call.
    previous_angle_deg: Option<f32>,
}

impl<B: AngleBus> AbsoluteEncoder<B> {
    pub fn new(bus: B, config: AbsoluteConfig) -> Self {
        Self {
            bus,
            unwrapper: AngleUnwrapper::new(config.wrap_margin_deg),
            started: false,
            previous_angle_deg: None,
        }
    }

    /// Release the bus.
    pub fn free(self) -> B {
        self.bus
    }

    /// Prepare the bus and chip-select. Must run once before any read.
    pub fn start_bus(&mut self) -> Result<(), Error<B::Error>> {
        self.bus.start().map_err(Error::Bus)?;
        self.started = true;
        debug!("absolute encoder bus started");
        Ok(())
    }

    /// Convert a raw code into degrees in `[0, 360)`.
    #[inline]
    pub fn raw_to_deg(raw: u16) -> f32 {
        raw as f32 * (360.0 / COUNTS_PER_REV)
    }

    /// Read the raw 16-bit angle code. Chip-select is released even if the transfer fails.
    fn read_raw(&mut self) -> Result<u16, Error<B::Error>> {
        if !self.started {
            return Err(Error::NotStarted);
        }

        self.bus.select();
        let result = self.bus.exchange(READ_COMMAND);
        self.bus.deselect();

        result.map_err(Error::Bus)
    }

    /// Read the sensor and return the unwrapped, unbounded angle (deg).
    ///
    /// A failed read drops the speed reference, so the next `get_speed` returns 0.0 instead of
    /// dividing a multi-tick change by one tick.
    pub fn get_angle(&mut self) -> Result<f32, Error<B::Error>> {
        let raw = match self.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                self.previous_angle_deg = None;
                return Err(e);
            }
        };
        Ok(self.unwrapper.update(Self::raw_to_deg(raw)))
    }

    /// Speed between the unwrapped angles seen at this call and the previous one (deg/s).
    ///
    /// Does not touch the bus: call after `get_angle` within the same tick. The first call
    /// returns 0.0.
    pub fn get_speed(&mut self, time_step_s: f32) -> Result<f32, Error<B::Error>> {
        if !self.started {
            return Err(Error::NotStarted);
        }

        let angle = self.unwrapper.angle_deg();
        let speed = match self.previous_angle_deg {
            None => {
                self.previous_angle_deg = Some(angle);
                0.0
            }
            Some(previous) => match rate(angle - previous, time_step_s) {
                Some(speed) => {
                    self.previous_angle_deg = Some(angle);
                    speed
                }
                None => 0.0,
            },
        };
        Ok(speed)
    }

    /// Net 0°/360° crossings seen so far.
    #[inline]
    pub fn crossings(&self) -> i32 {
        self.unwrapper.crossings()
    }

    /// Mutable access to the bus.
    #[inline]
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

impl<B: AngleBus> AngleSensor for AbsoluteEncoder<B> {
    type Error = Error<B::Error>;

    #[inline]
    fn angle_deg(&mut self) -> Result<f32, Self::Error> {
        self.get_angle()
    }

    #[inline]
    fn speed_deg_per_s(&mut self, time_step_s: f32) -> Result<f32, Self::Error> {
        self.get_speed(time_step_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug, PartialEq, Eq)]
    struct Fault;

    /// Scripted bus: returns `words` in order, fails once the script runs out.
    struct FakeBus {
        words: [u16; 8],
        next: usize,
        len: usize,
        selected: bool,
        selects: usize,
        sent: Option<u16>,
        started: bool,
        /// Exchange index that fails once without consuming a word.
        fail_at: Option<usize>,
        exchanges: usize,
    }

    impl FakeBus {
        fn with(script: &[u16]) -> Self {
            let mut words = [0u16; 8];
            words[..script.len()].copy_from_slice(script);
            Self {
                words,
                next: 0,
                len: script.len(),
                selected: false,
                selects: 0,
                sent: None,
                started: false,
                fail_at: None,
                exchanges: 0,
            }
        }

        fn failing_at(mut self, exchange: usize) -> Self {
            self.fail_at = Some(exchange);
            self
        }
    }

    impl AngleBus for FakeBus {
        type Error = Fault;

        fn start(&mut self) -> Result<(), Fault> {
            self.started = true;
            self.selected = false;
            Ok(())
        }

        fn select(&mut self) {
            self.selected = true;
            self.selects += 1;
        }

        fn deselect(&mut self) {
            self.selected = false;
        }

        fn exchange(&mut self, word: u16) -> Result<u16, Fault> {
            assert!(self.selected, "transfer outside chip-select");
            self.sent = Some(word);
            let index = self.exchanges;
            self.exchanges += 1;
            if self.fail_at == Some(index) || self.next >= self.len {
                return Err(Fault);
            }
            let w = self.words[self.next];
            self.next += 1;
            Ok(w)
        }
    }

    fn code(deg: f32) -> u16 {
        (deg / 360.0 * COUNTS_PER_REV) as u16
    }

    #[test]
    fn read_before_start_fails() {
        let mut enc = AbsoluteEncoder::new(FakeBus::with(&[0]), AbsoluteConfig::default());
        assert_eq!(enc.get_angle(), Err(Error::NotStarted));
        assert_eq!(enc.get_speed(0.001), Err(Error::NotStarted));
        assert_eq!(enc.bus_mut().selects, 0);
    }

    #[test]
    fn raw_scale() {
        assert_eq!(AbsoluteEncoder::<FakeBus>::raw_to_deg(0), 0.0);
        assert_eq!(AbsoluteEncoder::<FakeBus>::raw_to_deg(16384), 90.0);
        assert!(AbsoluteEncoder::<FakeBus>::raw_to_deg(u16::MAX) < 360.0);
    }

    #[test]
    fn read_sends_zero_word_under_chip_select() {
        let mut enc = AbsoluteEncoder::new(FakeBus::with(&[32768]), AbsoluteConfig::default());
        enc.start_bus().unwrap();
        assert_eq!(enc.get_angle(), Ok(180.0));

        let bus = enc.free();
        assert!(bus.started);
        assert!(!bus.selected);
        assert_eq!(bus.sent, Some(0x0000));
    }

    #[test]
    fn bus_error_releases_chip_select() {
        let mut enc = AbsoluteEncoder::new(FakeBus::with(&[]), AbsoluteConfig::default());
        enc.start_bus().unwrap();
        assert_eq!(enc.get_angle(), Err(Error::Bus(Fault)));
        assert!(!enc.bus_mut().selected);
    }

    #[test]
    fn unwraps_forward_crossing() {
        let script = [code(350.0), code(5.0)];
        let mut enc = AbsoluteEncoder::new(FakeBus::with(&script), AbsoluteConfig::default());
        enc.start_bus().unwrap();

        let a0 = enc.get_angle().unwrap();
        let a1 = enc.get_angle().unwrap();
        assert_relative_eq!(a1 - a0, 15.0, epsilon = 0.01);
        assert_eq!(enc.crossings(), 1);
    }

    #[test]
    fn speed_from_unwrapped_angle() {
        let script = [code(350.0), code(5.0), code(5.0)];
        let mut enc = AbsoluteEncoder::new(FakeBus::with(&script), AbsoluteConfig::default());
        enc.start_bus().unwrap();

        enc.get_angle().unwrap();
        assert_eq!(enc.get_speed(0.01), Ok(0.0));

        enc.get_angle().unwrap();
        assert_relative_eq!(enc.get_speed(0.01).unwrap(), 1500.0, epsilon = 1.0);

        enc.get_angle().unwrap();
        assert_eq!(enc.get_speed(0.01), Ok(0.0));
    }

    #[test]
    fn failed_read_resets_speed_reference() {
        // 1° per tick at 1 ms; the third exchange fails.
        let script = [code(10.0), code(11.0), code(13.0), code(14.0)];
        let bus = FakeBus::with(&script).failing_at(2);
        let mut enc = AbsoluteEncoder::new(bus, AbsoluteConfig::default());
        enc.start_bus().unwrap();

        enc.get_angle().unwrap();
        assert_eq!(enc.get_speed(0.001), Ok(0.0));

        enc.get_angle().unwrap();
        assert_relative_eq!(enc.get_speed(0.001).unwrap(), 1000.0, epsilon = 1.0);

        assert_eq!(enc.get_angle(), Err(Error::Bus(Fault)));

        // Two ticks of motion after the fault must not read as one.
        enc.get_angle().unwrap();
        assert_eq!(enc.get_speed(0.001), Ok(0.0));

        enc.get_angle().unwrap();
        assert_relative_eq!(enc.get_speed(0.001).unwrap(), 1000.0, epsilon = 1.0);
    }

    #[test]
    fn sensor_trait_delegates() {
        let mut enc = AbsoluteEncoder::new(FakeBus::with(&[16384]), AbsoluteConfig::default());
        enc.start_bus().unwrap();
        assert_eq!(enc.angle_deg(), Ok(90.0));
    }
}
