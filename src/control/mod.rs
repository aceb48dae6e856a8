// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! This module turns a sensing sample and a position reference into a motor current command.
//!
//! ## Modules
//!
//! - [`pid`] - PID law with derivative on measurement and integral clamping.
//! - [`friction`] - Deadzone/friction shapers (linear remap, hysteresis floor).
//! - [`strategy`] - Interchangeable control policies behind one trait.
//! - [`position_controller`] - Per-tick controller owning its state.
//! - [`servo_loop`] - Sensor + filter + controller for one axis.

pub mod friction;
pub mod pid;
pub mod position_controller;
pub mod servo_loop;
pub mod strategy;

pub use friction::{HysteresisFloor, LinearRemap};
pub use pid::{ControllerState, Pid};
pub use position_controller::PositionController;
pub use servo_loop::{ServoLoop, ServoMode};
pub use strategy::{
    BasicPid, PidWithHysteresisFloor, PidWithStaticFriction, PositionControlStrategy,
    ReferencePassthroughWithFloor, Strategy, TickInput,
};
