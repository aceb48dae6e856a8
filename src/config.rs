// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Tuning constants and configuration structs.
//!
//! Everything here is plain data with `Default` values and `with_*` builders. Nothing is
//! persisted; a board binary builds its configuration in code at startup.

/// Saturation limit of the current command (mA).
pub const MAX_CURRENT_COMMAND_MA: f32 = 5000.0;

/// Minimum command produced by the linear remap strategy for any nonzero demand (mA).
pub const DEADZONE_FLOOR_MA: f32 = 50.0;

/// Floor used when the shaft is near-stationary or has just reversed (mA).
pub const STATIC_FRICTION_FLOOR_MA: f32 = 150.0;

/// Floor used while the shaft is already moving in the commanded direction (mA).
pub const DYNAMIC_FRICTION_FLOOR_MA: f32 = 50.0;

/// Below this speed the shaft counts as stationary for floor selection (deg/s).
pub const FLOOR_SWITCH_SPEED_DEG_PER_S: f32 = 200.0;

/// Control laws smaller than this are forced to exactly zero (mA).
pub const HARD_DEADBAND_MA: f32 = 10.0;

/// Incremental encoder resolution (bits per revolution).
pub const ENCODER_RESOLUTION_BITS: u8 = 12;

/// Absolute encoder SPI clock (Hz).
pub const SPI_CLOCK_HZ: u32 = 1_000_000;

/// Distance from the 0°/360° boundary inside which a jump counts as a wrap (deg).
pub const WRAP_MARGIN_DEG: f32 = 20.0;

/// Which version of a measured signal a consumer reads from a `SensingSample`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalSource {
    /// Raw sensor output.
    Raw,
    /// Externally low-pass filtered.
    Filtered,
    /// Heavier low-pass filter. Only meaningful for speed.
    SuperFiltered,
}

/// Parameters of the hysteresis friction floor.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FloorConfig {
    pub static_floor_ma: f32,
    pub dynamic_floor_ma: f32,
    pub speed_threshold_deg_per_s: f32,
    /// `None` disables the hard deadband.
    pub hard_deadband_ma: Option<f32>,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            static_floor_ma: STATIC_FRICTION_FLOOR_MA,
            dynamic_floor_ma: DYNAMIC_FRICTION_FLOOR_MA,
            speed_threshold_deg_per_s: FLOOR_SWITCH_SPEED_DEG_PER_S,
            hard_deadband_ma: Some(HARD_DEADBAND_MA),
        }
    }
}

impl FloorConfig {
    pub fn with_floors(mut self, static_floor_ma: f32, dynamic_floor_ma: f32) -> Self {
        self.static_floor_ma = static_floor_ma;
        self.dynamic_floor_ma = dynamic_floor_ma;
        self
    }

    pub fn with_speed_threshold(mut self, deg_per_s: f32) -> Self {
        self.speed_threshold_deg_per_s = deg_per_s;
        self
    }

    pub fn with_hard_deadband(mut self, deadband_ma: Option<f32>) -> Self {
        self.hard_deadband_ma = deadband_ma;
        self
    }
}

/// Selects the compensation policy wrapped around the control law.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StrategyConfig {
    /// Plain clamped PID, no friction compensation.
    BasicPid,
    /// PID followed by a linear remap of `[0, MAX]` onto `[deadzone_floor_ma, MAX]`.
    PidWithStaticFriction { deadzone_floor_ma: f32 },
    /// PID followed by the static/dynamic floor with hysteresis.
    PidWithHysteresisFloor(FloorConfig),
    /// The reference is taken as a current demand (mA) and only the floor is applied.
    ReferencePassthroughWithFloor(FloorConfig),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::PidWithStaticFriction {
            deadzone_floor_ma: DEADZONE_FLOOR_MA,
        }
    }
}

/// Full position controller configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Proportional gain (mA/deg)
    pub kp: f32,
    /// Integral gain (mA/deg per tick)
    pub ki: f32,
    /// Derivative-on-measurement gain (mA per deg/s)
    pub kd: f32,

    pub max_command_ma: f32,
    pub integral_limit_ma: f32,

    /// Angle fed to the error computation.
    pub angle_source: SignalSource,
    /// Speed fed to the derivative term.
    pub speed_source: SignalSource,
    /// Speed used to decide whether the shaft is moving (floor selection).
    pub motion_speed_source: SignalSource,

    pub strategy: StrategyConfig,
}

impl Default for ControllerConfig {
    /// Gains default to zero: an untuned controller commands nothing.
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            max_command_ma: MAX_CURRENT_COMMAND_MA,
            integral_limit_ma: MAX_CURRENT_COMMAND_MA / 3.0,
            angle_source: SignalSource::Filtered,
            speed_source: SignalSource::Filtered,
            motion_speed_source: SignalSource::Filtered,
            strategy: StrategyConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Set the PID gains.
    pub fn with_gains(mut self, kp: f32, ki: f32, kd: f32) -> Self {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self
    }

    /// Set the symmetric output limit.
    pub fn with_max_command(mut self, max_command_ma: f32) -> Self {
        self.max_command_ma = max_command_ma;
        self
    }

    /// Set the symmetric integral clamp.
    pub fn with_integral_limit(mut self, integral_limit_ma: f32) -> Self {
        self.integral_limit_ma = integral_limit_ma;
        self
    }

    pub fn with_angle_source(mut self, source: SignalSource) -> Self {
        self.angle_source = source;
        self
    }

    pub fn with_speed_source(mut self, source: SignalSource) -> Self {
        self.speed_source = source;
        self
    }

    pub fn with_motion_speed_source(mut self, source: SignalSource) -> Self {
        self.motion_speed_source = source;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Incremental (quadrature) encoder configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureConfig {
    pub resolution_bits: u8,
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            resolution_bits: ENCODER_RESOLUTION_BITS,
        }
    }
}

impl QuadratureConfig {
    /// Angle represented by a single count (deg).
    ///
    /// Valid resolutions are 1..=31 bits; values outside are clamped into that range.
    #[inline]
    pub fn degrees_per_count(&self) -> f32 {
        let bits = self.resolution_bits.clamp(1, 31);
        360.0 / (1u32 << bits) as f32
    }
}

/// Absolute (SPI) encoder configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AbsoluteConfig {
    pub spi_clock_hz: u32,
    pub wrap_margin_deg: f32,
}

impl Default for AbsoluteConfig {
    fn default() -> Self {
        Self {
            spi_clock_hz: SPI_CLOCK_HZ,
            wrap_margin_deg: WRAP_MARGIN_DEG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = ControllerConfig::default();
        assert_eq!(cfg.max_command_ma, 5000.0);
        assert_eq!(cfg.integral_limit_ma, 5000.0 / 3.0);
        assert_eq!(
            cfg.strategy,
            StrategyConfig::PidWithStaticFriction {
                deadzone_floor_ma: 50.0
            }
        );
    }

    #[test]
    fn twelve_bit_counts() {
        let cfg = QuadratureConfig::default();
        assert_eq!(cfg.degrees_per_count() * 4096.0, 360.0);
    }

    #[test]
    fn out_of_range_resolution_is_clamped() {
        let at = |bits| QuadratureConfig {
            resolution_bits: bits,
        }
        .degrees_per_count();
        assert_eq!(at(0), 180.0);
        assert_eq!(at(64), at(31));
        assert_eq!(at(u8::MAX), at(31));
        assert!(at(31) > 0.0);
    }

    #[test]
    fn builders_chain() {
        let cfg = ControllerConfig::default()
            .with_gains(10.0, 0.1, 0.5)
            .with_max_command(1000.0)
            .with_angle_source(SignalSource::Raw);
        assert_eq!(cfg.kp, 10.0);
        assert_eq!(cfg.kd, 0.5);
        assert_eq!(cfg.max_command_ma, 1000.0);
        assert_eq!(cfg.angle_source, SignalSource::Raw);
        assert_eq!(cfg.speed_source, SignalSource::Filtered);
    }
}
