// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod pins;
pub mod quadrature;
pub mod spi;
pub mod usart;

pub use pins::ServoPins;
pub use quadrature::QuadraturePins;
pub use spi::{ChipSelect, EncoderSpi, SpiBus, ENCODER_SPI_MODE};
pub use usart::Usart;
