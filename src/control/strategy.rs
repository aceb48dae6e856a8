// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interchangeable position control policies.
//!
//! Every policy sees the same per-tick input and the same `ControllerState`, so the
//! compensation heuristic can be swapped without touching the control loop or the sensors.
//!
//! | Policy | Law | Shaping |
//! | ------ | --- | ------- |
//! | [`BasicPid`] | PID | none |
//! | [`PidWithStaticFriction`] | PID | linear remap onto `[floor, MAX]` |
//! | [`PidWithHysteresisFloor`] | PID | static/dynamic floor + deadband |
//! | [`ReferencePassthroughWithFloor`] | reference as mA | static/dynamic floor + deadband |

use crate::config::{ControllerConfig, StrategyConfig};
use crate::control::friction::{HysteresisFloor, LinearRemap};
use crate::control::pid::{saturate, ControllerState, Pid};

/// Signals a policy needs for one tick, already resolved to the configured sources.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickInput {
    pub reference_deg: f32,
    pub angle_deg: f32,
    /// Speed for the derivative term.
    pub speed_deg_per_s: f32,
    /// Speed for deciding whether the shaft is moving.
    pub motion_speed_deg_per_s: f32,
}

/// A position control policy.
///
/// Implementations may advance `state.integral_term_ma`; the controller itself records
/// `previous_command_ma` and `previous_speed_deg_per_s` after every tick.
pub trait PositionControlStrategy {
    fn command(&self, pid: &Pid, state: &mut ControllerState, input: &TickInput) -> f32;
}

/// Clamped PID, applied directly.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BasicPid;

impl PositionControlStrategy for BasicPid {
    fn command(&self, pid: &Pid, state: &mut ControllerState, input: &TickInput) -> f32 {
        pid.update(
            state,
            input.reference_deg,
            input.angle_deg,
            input.speed_deg_per_s,
        )
    }
}

/// PID with every nonzero demand pushed past the deadzone by a linear remap.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidWithStaticFriction {
    remap: LinearRemap,
}

impl PidWithStaticFriction {
    pub fn new(deadzone_floor_ma: f32, max_command_ma: f32) -> Self {
        Self {
            remap: LinearRemap::new(deadzone_floor_ma, max_command_ma),
        }
    }
}

impl PositionControlStrategy for PidWithStaticFriction {
    fn command(&self, pid: &Pid, state: &mut ControllerState, input: &TickInput) -> f32 {
        let law = BasicPid.command(pid, state, input);
        self.remap.apply(law)
    }
}

/// PID with a static/dynamic friction floor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidWithHysteresisFloor {
    floor: HysteresisFloor,
}

impl PidWithHysteresisFloor {
    pub fn new(floor: HysteresisFloor) -> Self {
        Self { floor }
    }
}

impl PositionControlStrategy for PidWithHysteresisFloor {
    fn command(&self, pid: &Pid, state: &mut ControllerState, input: &TickInput) -> f32 {
        let law = BasicPid.command(pid, state, input);
        self.floor.apply(
            law,
            state.previous_command_ma,
            input.motion_speed_deg_per_s,
        )
    }
}

/// Open-loop friction characterization: the reference is a current demand (mA).
///
/// The demand is clamped to the output limits and shaped by the friction floor. The PID and
/// its integrator are bypassed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReferencePassthroughWithFloor {
    floor: HysteresisFloor,
}

impl ReferencePassthroughWithFloor {
    pub fn new(floor: HysteresisFloor) -> Self {
        Self { floor }
    }
}

impl PositionControlStrategy for ReferencePassthroughWithFloor {
    fn command(&self, pid: &Pid, state: &mut ControllerState, input: &TickInput) -> f32 {
        let (min, max) = pid.output_limits();
        let law = saturate(input.reference_deg, min, max);
        self.floor.apply(
            law,
            state.previous_command_ma,
            input.motion_speed_deg_per_s,
        )
    }
}

/// Configuration-selected policy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Strategy {
    Basic(BasicPid),
    StaticFriction(PidWithStaticFriction),
    HysteresisFloor(PidWithHysteresisFloor),
    Passthrough(ReferencePassthroughWithFloor),
}

impl Strategy {
    pub fn from_config(config: &ControllerConfig) -> Self {
        match config.strategy {
            StrategyConfig::BasicPid => Strategy::Basic(BasicPid),
            StrategyConfig::PidWithStaticFriction { deadzone_floor_ma } => Strategy::StaticFriction(
                PidWithStaticFriction::new(deadzone_floor_ma, config.max_command_ma),
            ),
            StrategyConfig::PidWithHysteresisFloor(floor) => {
                Strategy::HysteresisFloor(PidWithHysteresisFloor::new(HysteresisFloor::new(floor)))
            }
            StrategyConfig::ReferencePassthroughWithFloor(floor) => Strategy::Passthrough(
                ReferencePassthroughWithFloor::new(HysteresisFloor::new(floor)),
            ),
        }
    }
}

impl PositionControlStrategy for Strategy {
    #[inline]
    fn command(&self, pid: &Pid, state: &mut ControllerState, input: &TickInput) -> f32 {
        match self {
            Strategy::Basic(s) => s.command(pid, state, input),
            Strategy::StaticFriction(s) => s.command(pid, state, input),
            Strategy::HysteresisFloor(s) => s.command(pid, state, input),
            Strategy::Passthrough(s) => s.command(pid, state, input),
        }
    }
}
