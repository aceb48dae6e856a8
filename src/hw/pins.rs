// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 servo board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpioe, Alternate, Floating, Input, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins used by the servo. Construct this once at startup using:
///
/// ```ignore
/// let pins = ServoPins::new(dp.GPIOA, dp.GPIOE);
/// ```
pub struct ServoPins {
    pub usart1: Usart1Pins,
    pub spi4: Spi4Pins,
    pub encoder: EncoderPins,
}

pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// SPI4 SCK/MISO/MOSI and the absolute encoder CS
pub struct Spi4Pins {
    pub sck: gpioe::PE12<Alternate<5>>,
    pub miso: gpioe::PE13<Alternate<5>>,
    pub mosi: gpioe::PE14<Alternate<5>>,
    pub cs: gpioe::PE4<Output<PushPull>>,
}

/// Quadrature channels, sampled from EXTI0/EXTI1
pub struct EncoderPins {
    pub a: gpioa::PA0<Input<Floating>>,
    pub b: gpioa::PA1<Input<Floating>>,
}

impl ServoPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpioe: pac::GPIOE) -> Self {
        let gpioa = gpioa.split();
        let gpioe = gpioe.split();

        Self {
            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            spi4: Spi4Pins {
                sck: gpioe.pe12.into_alternate::<5>(),
                miso: gpioe.pe13.into_alternate::<5>(),
                mosi: gpioe.pe14.into_alternate::<5>(),
                cs: gpioe.pe4.into_push_pull_output(),
            },

            encoder: EncoderPins {
                a: gpioa.pa0.into_floating_input(),
                b: gpioa.pa1.into_floating_input(),
            },
        }
    }
}
