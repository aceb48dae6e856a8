// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Discrete PID law for shaft position.
//!
//! Works in `no_std` and does not allocate memory. The integrator lives in a separate
//! [`ControllerState`] so that one set of gains never hides state from its owner.

use crate::config::{ControllerConfig, MAX_CURRENT_COMMAND_MA};

/// Values the position controller carries from one tick to the next.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerState {
    /// Integral of position error scaled by `ki` (mA)
    pub integral_term_ma: f32,
    /// Last emitted command (mA)
    pub previous_command_ma: f32,
    /// Speed seen on the last tick (deg/s)
    pub previous_speed_deg_per_s: f32,
}

/// PID controller with tunable gains and output clamping.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pid {
    /// Proportional gain
    kp: f32,
    /// Integral gain
    ki: f32,
    /// Derivative gain
    kd: f32,

    /// Output clamp
    out_min: f32,
    out_max: f32,

    /// Integral anti-windup clamp
    int_min: f32,
    int_max: f32,
}

impl Pid {
    /// Create a new PID controller.
    ///
    /// `kp`, `ki`, `kd` are the gain constants. Output limits default to the full current range
    /// and the integral to a third of it.
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,

            out_min: -MAX_CURRENT_COMMAND_MA,
            out_max: MAX_CURRENT_COMMAND_MA,

            int_min: -MAX_CURRENT_COMMAND_MA / 3.0,
            int_max: MAX_CURRENT_COMMAND_MA / 3.0,
        }
    }

    /// Build from gains and symmetric limits in a `ControllerConfig`.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.kp, config.ki, config.kd)
            .with_output_limits(-config.max_command_ma, config.max_command_ma)
            .with_integral_limits(-config.integral_limit_ma, config.integral_limit_ma)
    }

    /// Set output limits.
    pub fn with_output_limits(mut self, min: f32, max: f32) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    /// Set integral limits for anti-windup.
    pub fn with_integral_limits(mut self, min: f32, max: f32) -> Self {
        self.int_min = min;
        self.int_max = max;
        self
    }

    #[inline]
    pub fn output_limits(&self) -> (f32, f32) {
        (self.out_min, self.out_max)
    }

    #[inline]
    pub fn integral_limits(&self) -> (f32, f32) {
        (self.int_min, self.int_max)
    }

    /// Run the law for one tick.
    ///
    /// `setpoint`: desired angle (deg)
    /// `measurement`: measured angle (deg)
    /// `measured_rate`: measured speed (deg/s)
    ///
    /// The integrator advances by `error * ki` per call; the sample period is folded into `ki`.
    /// Returns the clamped control law (mA). A non-finite error or rate yields 0.0 and leaves
    /// the integrator untouched.
    pub fn update(
        &self,
        state: &mut ControllerState,
        setpoint: f32,
        measurement: f32,
        measured_rate: f32,
    ) -> f32 {
        let error = setpoint - measurement;
        if !error.is_finite() || !measured_rate.is_finite() {
            return 0.0;
        }

        // ----- P term -----
        let p = self.kp * error;

        // ----- I term -----
        state.integral_term_ma = saturate(
            state.integral_term_ma + error * self.ki,
            self.int_min,
            self.int_max,
        );
        let i = state.integral_term_ma;

        // ----- D term (on measurement, no kick on setpoint steps) -----
        let d = -measured_rate * self.kd;

        // ----- Output clamp -----
        saturate(p + i + d, self.out_min, self.out_max)
    }
}

/// Clamp without the panic `f32::clamp` raises on inverted bounds. NaN maps to 0.0.
#[inline]
pub fn saturate(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    let mut out = value;
    if out > max {
        out = max;
    }
    if out < min {
        out = min;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn proportional_only() {
        let pid = Pid::new(2.0, 0.0, 0.0);
        let mut state = ControllerState::default();
        assert_relative_eq!(pid.update(&mut state, 10.0, 5.0, 0.0), 10.0);
        assert_eq!(state.integral_term_ma, 0.0);
    }

    #[test]
    fn integral_accumulates_per_tick() {
        let pid = Pid::new(0.0, 0.5, 0.0);
        let mut state = ControllerState::default();
        pid.update(&mut state, 4.0, 0.0, 0.0);
        let out = pid.update(&mut state, 4.0, 0.0, 0.0);
        assert_relative_eq!(out, 4.0);
        assert_relative_eq!(state.integral_term_ma, 4.0);
    }

    #[test]
    fn integral_is_clamped() {
        let pid = Pid::new(0.0, 100.0, 0.0);
        let mut state = ControllerState::default();
        for _ in 0..1000 {
            pid.update(&mut state, 1000.0, 0.0, 0.0);
        }
        assert_eq!(state.integral_term_ma, MAX_CURRENT_COMMAND_MA / 3.0);

        for _ in 0..1000 {
            pid.update(&mut state, -1000.0, 0.0, 0.0);
        }
        assert_eq!(state.integral_term_ma, -MAX_CURRENT_COMMAND_MA / 3.0);
    }

    #[test]
    fn derivative_acts_on_measured_rate() {
        let pid = Pid::new(0.0, 0.0, 2.0);
        let mut state = ControllerState::default();
        assert_relative_eq!(pid.update(&mut state, 50.0, 50.0, 100.0), -200.0);
        assert_relative_eq!(pid.update(&mut state, 50.0, 50.0, -100.0), 200.0);
    }

    #[test]
    fn output_saturates_exactly() {
        let pid = Pid::new(1000.0, 0.0, 0.0);
        let mut state = ControllerState::default();
        assert_eq!(pid.update(&mut state, 90.0, 0.0, 0.0), MAX_CURRENT_COMMAND_MA);
        assert_eq!(pid.update(&mut state, -90.0, 0.0, 0.0), -MAX_CURRENT_COMMAND_MA);
    }

    #[test]
    fn from_config_limits() {
        let cfg = ControllerConfig::default()
            .with_max_command(1200.0)
            .with_integral_limit(300.0);
        let pid = Pid::from_config(&cfg);
        assert_eq!(pid.output_limits(), (-1200.0, 1200.0));
        assert_eq!(pid.integral_limits(), (-300.0, 300.0));
    }

    #[test]
    fn saturate_tolerates_inverted_bounds() {
        assert_eq!(saturate(5.0, 1.0, -1.0), 1.0);
        assert_eq!(saturate(0.5, -1.0, 1.0), 0.5);
    }

    #[test]
    fn saturate_maps_nan_to_zero() {
        assert_eq!(saturate(f32::NAN, -1.0, 1.0), 0.0);
        assert_eq!(saturate(f32::INFINITY, -1.0, 1.0), 1.0);
    }

    #[test]
    fn non_finite_input_leaves_integrator_alone() {
        let pid = Pid::new(10.0, 1.0, 1.0);
        let mut state = ControllerState::default();
        pid.update(&mut state, 5.0, 0.0, 0.0);
        let before = state.integral_term_ma;

        assert_eq!(pid.update(&mut state, 0.0, f32::NAN, 0.0), 0.0);
        assert_eq!(pid.update(&mut state, 0.0, 0.0, f32::INFINITY), 0.0);
        assert_eq!(state.integral_term_ma, before);
    }
}
