// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Closed-loop position servo for a single axis.
//!
//! This wraps an [`AngleSensor`], the external low-pass stage ([`SampleFilter`]) and a
//! [`PositionController`], and provides a periodic `step()` that returns the current command
//! for the actuation driver.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! servo.set_target_deg(90.0);
//!
//! loop {
//!     let command_ma = servo.step(dt_seconds)?;
//!     amplifier.set_current_ma(command_ma);
//!     delay.delay_ms(1_u32);
//! }
//! ```

use micromath::F32Ext;

use crate::control::{PositionControlStrategy, PositionController, Strategy};
use crate::sensing::{AngleSensor, SampleFilter, SensingSample, Unfiltered};

/// Operating mode of the servo loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoMode {
    /// Regular closed-loop control toward the target angle.
    PositionControl,

    /// Output forced to 0 mA. Sensing keeps running.
    Disabled,
}

/// Sensor, filter and controller for one axis.
pub struct ServoLoop<S, F = Unfiltered, C = Strategy> {
    sensor: S,
    filter: F,
    controller: PositionController<C>,
    mode: ServoMode,

    /// Commanded shaft angle (deg)
    target_deg: f32,

    last_sample: SensingSample,
    last_command_ma: f32,
}

impl<S, F, C> ServoLoop<S, F, C>
where
    S: AngleSensor,
    F: SampleFilter,
    C: PositionControlStrategy,
{
    pub fn new(sensor: S, filter: F, controller: PositionController<C>) -> Self {
        Self {
            sensor,
            filter,
            controller,
            mode: ServoMode::PositionControl,
            target_deg: 0.0,
            last_sample: SensingSample::default(),
            last_command_ma: 0.0,
        }
    }

    /// Set a new target angle (deg). Controller state is left untouched.
    pub fn set_target_deg(&mut self, deg: f32) {
        self.target_deg = deg;
    }

    #[inline]
    pub fn target_deg(&self) -> f32 {
        self.target_deg
    }

    /// Force the output to zero.
    pub fn disable(&mut self) {
        self.mode = ServoMode::Disabled;
        self.last_command_ma = 0.0;
    }

    /// Re-enable position control.
    pub fn enable(&mut self) {
        self.mode = ServoMode::PositionControl;
    }

    #[inline]
    pub fn mode(&self) -> ServoMode {
        self.mode
    }

    /// Run one control tick.
    ///
    /// `dt` is the time since the previous call (s), e.g. 0.001 for a 1 kHz loop. The sensor is read
    /// on every tick, including while disabled, so that its speed window stays one tick wide.
    pub fn step(&mut self, dt: f32) -> Result<f32, S::Error> {
        let angle = self.sensor.angle_deg()?;
        let speed = self.sensor.speed_deg_per_s(dt)?;
        let sample = self.filter.filter(angle, speed);
        self.last_sample = sample;

        let command = match self.mode {
            ServoMode::Disabled => 0.0,
            ServoMode::PositionControl => self.controller.update(&sample, self.target_deg),
        };
        self.last_command_ma = command;

        Ok(command)
    }

    /// Returns true if the filtered angle is within `tolerance_deg` of the target.
    pub fn on_target(&self, tolerance_deg: f32) -> bool {
        (self.last_sample.angle_filtered_deg - self.target_deg).abs() <= tolerance_deg
    }

    #[inline]
    pub fn last_sample(&self) -> &SensingSample {
        &self.last_sample
    }

    #[inline]
    pub fn last_command_ma(&self) -> f32 {
        self.last_command_ma
    }

    #[inline]
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    #[inline]
    pub fn controller(&self) -> &PositionController<C> {
        &self.controller
    }

    #[inline]
    pub fn controller_mut(&mut self) -> &mut PositionController<C> {
        &mut self.controller
    }
}
