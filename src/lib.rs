// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Position Servo Firmware
//!
//! This crate contains the real-time core of a single-axis motor position servo: it turns a
//! measured shaft angle into a motor current command (mA) that drives the shaft to a reference
//! angle, with friction/deadzone compensation. The board layer targets an STM32F777 MCU.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`sensing`] | Quadrature decoding, absolute encoder unwrapping, sensing samples |
//! | [`control`] | PID law, friction shaping, strategies, servo loop |
//! | [`config`] | Tuning constants and configuration structs |
//! | `hw` | MCU-level wrappers around USART, SPI, EXTI (feature `board`) |
//!
//! ## Features
//!
//! - `board` - STM32F7 HAL wrappers and the firmware binary.
//! - `defmt` - Log through `defmt` instead of compiling logging out.
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features board --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod config;
pub mod control;
pub mod sensing;

#[cfg(feature = "board")]
pub mod hw;
