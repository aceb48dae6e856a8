// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Deadzone and friction compensation applied to the raw control law.
//!
//! Small commands near zero do not break static friction: the shaft stays put while the
//! integrator winds up. Both shapers below lift any nonzero demand above a floor, keeping its
//! sign.

use micromath::F32Ext;

use crate::config::FloorConfig;

/// Re-apply the sign of `like` to a non-negative magnitude.
#[inline]
fn with_sign_of(magnitude: f32, like: f32) -> f32 {
    if like < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Maps `|law|` from `[0, max]` onto `[floor, max]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearRemap {
    floor_ma: f32,
    max_ma: f32,
}

impl LinearRemap {
    /// `floor_ma` is limited to `[0, max_ma]`.
    pub fn new(floor_ma: f32, max_ma: f32) -> Self {
        let max_ma = if max_ma > 0.0 { max_ma } else { 0.0 };
        let mut floor_ma = if floor_ma > 0.0 { floor_ma } else { 0.0 };
        if floor_ma > max_ma {
            floor_ma = max_ma;
        }
        Self { floor_ma, max_ma }
    }

    #[inline]
    pub fn floor_ma(&self) -> f32 {
        self.floor_ma
    }

    /// Shape one control law value. Zero stays zero; `±max` stays `±max`.
    pub fn apply(&self, law: f32) -> f32 {
        if law == 0.0 || self.max_ma == 0.0 {
            return 0.0;
        }

        let magnitude = law.abs();
        if magnitude >= self.max_ma {
            return with_sign_of(self.max_ma, law);
        }

        let fraction = magnitude / self.max_ma;
        let mut remapped = self.floor_ma + fraction * (self.max_ma - self.floor_ma);
        if remapped > self.max_ma {
            remapped = self.max_ma;
        }
        with_sign_of(remapped, law)
    }
}

/// Static/dynamic friction floor with hysteresis on motion state.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HysteresisFloor {
    config: FloorConfig,
}

impl HysteresisFloor {
    pub fn new(config: FloorConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &FloorConfig {
        &self.config
    }

    /// Pick the floor for this tick.
    ///
    /// Static when the shaft is near-stationary or the demand just changed sign, dynamic
    /// otherwise.
    pub fn select_floor(&self, law: f32, previous_command: f32, motion_speed: f32) -> f32 {
        let reversing = previous_command * law < 0.0;
        let stationary = motion_speed.abs() < self.config.speed_threshold_deg_per_s;

        if stationary || reversing {
            self.config.static_floor_ma
        } else {
            self.config.dynamic_floor_ma
        }
    }

    /// Shape one control law value.
    pub fn apply(&self, law: f32, previous_command: f32, motion_speed: f32) -> f32 {
        if let Some(deadband) = self.config.hard_deadband_ma {
            if law.abs() < deadband {
                return 0.0;
            }
        }
        if law == 0.0 {
            return 0.0;
        }

        let floor = self.select_floor(law, previous_command, motion_speed);
        let magnitude = law.abs();
        let magnitude = if magnitude > floor { magnitude } else { floor };
        with_sign_of(magnitude, law)
    }
}
