// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Position controller: sensing sample + reference in, bounded current command out.
//!
//! Call [`PositionController::update`] exactly once per control tick. The controller owns its
//! [`ControllerState`]; nothing about it is global, so several axes (or several tests) each get
//! their own.
//!
//! The integrator is never cleared implicitly. After a large reference step it is bounded only
//! by the integral clamp; [`PositionController::reset_integral`] is there for callers that want
//! to clear it on re-homing.

use crate::config::{ControllerConfig, SignalSource};
use crate::control::pid::{saturate, ControllerState, Pid};
use crate::control::strategy::{PositionControlStrategy, Strategy, TickInput};
use crate::sensing::SensingSample;

/// Position controller with a pluggable compensation policy.
pub struct PositionController<S = Strategy> {
    pid: Pid,
    strategy: S,
    state: ControllerState,

    angle_source: SignalSource,
    speed_source: SignalSource,
    motion_speed_source: SignalSource,
}

impl PositionController<Strategy> {
    /// Build a controller with the policy named in `config.strategy`.
    pub fn new(config: ControllerConfig) -> Self {
        let strategy = Strategy::from_config(&config);
        Self::with_strategy(config, strategy)
    }
}

impl<S: PositionControlStrategy> PositionController<S> {
    /// Build a controller around an explicit policy. `config.strategy` is ignored.
    pub fn with_strategy(config: ControllerConfig, strategy: S) -> Self {
        debug!(
            "position controller: kp={} ki={} kd={} max={}mA",
            config.kp,
            config.ki,
            config.kd,
            config.max_command_ma
        );
        Self {
            pid: Pid::from_config(&config),
            strategy,
            state: ControllerState::default(),
            angle_source: config.angle_source,
            speed_source: config.speed_source,
            motion_speed_source: config.motion_speed_source,
        }
    }

    /// Run one control tick and return the current command (mA), bounded to the output limits.
    pub fn update(&mut self, sensing: &SensingSample, position_reference_deg: f32) -> f32 {
        let input = TickInput {
            reference_deg: position_reference_deg,
            angle_deg: sensing.angle(self.angle_source),
            speed_deg_per_s: sensing.speed(self.speed_source),
            motion_speed_deg_per_s: sensing.speed(self.motion_speed_source),
        };

        let (min, max) = self.pid.output_limits();
        let command = saturate(
            self.strategy.command(&self.pid, &mut self.state, &input),
            min,
            max,
        );

        self.state.previous_command_ma = command;
        if input.speed_deg_per_s.is_finite() {
            self.state.previous_speed_deg_per_s = input.speed_deg_per_s;
        }

        command
    }

    /// Clear the integrator. Previous command/speed are kept for the friction logic.
    pub fn reset_integral(&mut self) {
        self.state.integral_term_ma = 0.0;
    }

    #[inline]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[inline]
    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    #[inline]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Symmetric output bound (mA).
    #[inline]
    pub fn max_command_ma(&self) -> f32 {
        self.pid.output_limits().1
    }
}
