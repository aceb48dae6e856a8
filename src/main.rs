// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Servo firmware for the STM32F777 board.
//!
//! Closes the position loop at 1 kHz on the quadrature encoder (PA0/PA1, EXTI0/EXTI1), or on the
//! SPI4 absolute encoder with feature `absolute-encoder`, and prints telemetry on USART1.

#![no_main]
#![no_std]

use cortex_m::delay::Delay;
use cortex_m_rt::entry;
#[cfg(feature = "rtt")]
use defmt_rtt as _;
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use position_servo::config::ControllerConfig;
use position_servo::control::{PositionController, ServoLoop};
use position_servo::hw::{ServoPins, Usart};
use position_servo::sensing::Unfiltered;

#[cfg(not(feature = "absolute-encoder"))]
use {
    core::cell::RefCell,
    cortex_m::interrupt::Mutex,
    hal::pac::interrupt,
    position_servo::config::QuadratureConfig,
    position_servo::hw::{quadrature, QuadraturePins},
    position_servo::sensing::{QuadratureEncoder, QuadratureState},
};

#[cfg(feature = "absolute-encoder")]
use {
    hal::spi::Spi,
    position_servo::config::AbsoluteConfig,
    position_servo::hw::{ChipSelect, EncoderSpi, SpiBus, ENCODER_SPI_MODE},
    position_servo::sensing::AbsoluteEncoder,
};

/// Control period (ms)
const TICK_MS: u32 = 1;
const DT_S: f32 = TICK_MS as f32 / 1000.0;

/// Print one telemetry line every this many ticks.
const TELEMETRY_EVERY: u32 = 100;

/// Shaft target after boot (deg)
const TARGET_DEG: f32 = 90.0;

/// Gains for the bench motor: mA/deg, mA/deg per tick, mA·s/deg.
const KP: f32 = 20.0;
const KI: f32 = 0.05;
const KD: f32 = 0.5;

#[cfg(not(feature = "absolute-encoder"))]
static QUADRATURE: QuadratureState = QuadratureState::new();

#[cfg(not(feature = "absolute-encoder"))]
static QUADRATURE_PINS: Mutex<RefCell<Option<QuadraturePins>>> = Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let mut apb2 = rcc.apb2;
    let mut delay = Delay::new(cp.SYST, clocks.sysclk().raw());

    let pins = ServoPins::new(dp.GPIOA, dp.GPIOE);

    // USART1 (DBG)
    let usart_cfg = Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (pins.usart1.tx, pins.usart1.rx), &clocks, usart_cfg);
    let mut usart = Usart::new(serial);
    usart.println("position servo up");

    #[cfg(not(feature = "absolute-encoder"))]
    let sensor = {
        let mut syscfg = dp.SYSCFG;
        let mut inputs =
            QuadraturePins::new(pins.encoder.a, pins.encoder.b, &mut syscfg, &mut apb2, dp.EXTI);
        let mut encoder = QuadratureEncoder::new(&QUADRATURE, QuadratureConfig::default());
        encoder.start(&mut inputs);

        cortex_m::interrupt::free(|cs| QUADRATURE_PINS.borrow(cs).replace(Some(inputs)));
        // SAFETY: the EXTI handlers can reach the pins from here on.
        unsafe { quadrature::unmask() };
        encoder
    };

    #[cfg(feature = "absolute-encoder")]
    let sensor = {
        let config = AbsoluteConfig::default();
        let spi4 = Spi::new(dp.SPI4, (pins.spi4.sck, pins.spi4.miso, pins.spi4.mosi)).enable::<u8>(
            ENCODER_SPI_MODE,
            config.spi_clock_hz.Hz(),
            &clocks,
            &mut apb2,
        );
        let link = EncoderSpi::new(SpiBus::new(spi4), ChipSelect::active_low(pins.spi4.cs));
        let mut encoder = AbsoluteEncoder::new(link, config);
        if encoder.start_bus().is_err() {
            // Every read would fail; park with the output at 0 mA.
            usart.println("encoder bus start failed, halting");
            usart.flush();
            loop {
                cortex_m::asm::wfi();
            }
        }
        encoder
    };

    let controller = PositionController::new(ControllerConfig::default().with_gains(KP, KI, KD));
    let mut servo = ServoLoop::new(sensor, Unfiltered, controller);
    servo.set_target_deg(TARGET_DEG);

    let mut tick: u32 = 0;
    let mut read_failures: u32 = 0;
    loop {
        let command_ma = match servo.step(DT_S) {
            Ok(command_ma) => command_ma,
            Err(_) => {
                read_failures = read_failures.saturating_add(1);
                0.0
            }
        };

        // The current amplifier driver takes `command_ma` from here.
        tick = tick.wrapping_add(1);
        if tick % TELEMETRY_EVERY == 0 {
            usart.telemetry(servo.target_deg(), servo.last_sample(), command_ma);
            if read_failures > 0 {
                usart.write_str("encoder read failed x");
                usart.print_u32(read_failures);
                usart.write_str("\r\n");
                read_failures = 0;
            }
        }

        delay.delay_ms(TICK_MS);
    }
}

#[cfg(not(feature = "absolute-encoder"))]
fn on_quadrature_edge() {
    cortex_m::interrupt::free(|cs| {
        if let Some(inputs) = QUADRATURE_PINS.borrow(cs).borrow_mut().as_mut() {
            inputs.service(&QUADRATURE);
        }
    });
}

#[cfg(not(feature = "absolute-encoder"))]
#[interrupt]
fn EXTI0() {
    on_quadrature_edge();
}

#[cfg(not(feature = "absolute-encoder"))]
#[interrupt]
fn EXTI1() {
    on_quadrature_edge();
}
