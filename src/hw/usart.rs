// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer for servo telemetry.
//!
//! Prints plain ASCII lines to the debug terminal. Floats are printed as fixed-point with three
//! decimals so that `core::fmt` float formatting stays out of the image.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* <baud_rate>
//! ```

use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

use crate::sensing::SensingSample;

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }

    pub fn print_u32(&mut self, mut n: u32) {
        let mut buf = [0u8; 10];
        let mut i = buf.len();
        if n == 0 {
            self.write_byte(b'0');
            return;
        }
        while n > 0 {
            i -= 1;
            buf[i] = b'0' + (n % 10) as u8;
            n /= 10;
        }
        for &b in &buf[i..] {
            self.write_byte(b);
        }
    }

    /// Print `value` with three decimals, e.g. `-12.345`. Non-finite values print as `nan`.
    pub fn print_milli(&mut self, value: f32) {
        if !value.is_finite() {
            self.write_str("nan");
            return;
        }
        // `as` saturates, which is fine for telemetry.
        let milli = (value * 1000.0) as i32;
        if milli < 0 {
            self.write_byte(b'-');
        }
        let milli = milli.unsigned_abs();
        self.print_u32(milli / 1000);
        self.write_byte(b'.');
        let frac = milli % 1000;
        self.write_byte(b'0' + (frac / 100) as u8);
        self.write_byte(b'0' + (frac / 10 % 10) as u8);
        self.write_byte(b'0' + (frac % 10) as u8);
    }

    /// One telemetry line: `tgt=<deg> ang=<deg> spd=<deg/s> cmd=<mA>`.
    pub fn telemetry(&mut self, target_deg: f32, sample: &SensingSample, command_ma: f32) {
        self.write_str("tgt=");
        self.print_milli(target_deg);
        self.write_str(" ang=");
        self.print_milli(sample.angle_filtered_deg);
        self.write_str(" spd=");
        self.print_milli(sample.speed_filtered_deg_per_s);
        self.write_str(" cmd=");
        self.print_milli(command_ma);
        self.write_str("\r\n");
    }
}
