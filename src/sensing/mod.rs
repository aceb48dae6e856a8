// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Angle and Speed Sensing
//!
//! Turns a physical transducer into an unbounded shaft angle (deg) and a signed speed (deg/s).
//!
//! ## Modules
//!
//! - [`shared`] - Interrupt-safe counter cell.
//! - [`quadrature`] - Interrupt-driven A/B quadrature decoder.
//! - [`unwrap`] - Software unwrapping of a bounded 0..360° reading.
//! - [`absolute`] - 16-bit absolute encoder read over SPI.

pub mod absolute;
pub mod quadrature;
pub mod shared;
pub mod unwrap;

pub use absolute::{AbsoluteEncoder, AngleBus};
pub use quadrature::{Phase, QuadratureEncoder, QuadratureInputs, QuadratureState};
pub use shared::SharedCount;
pub use unwrap::AngleUnwrapper;

use crate::config::SignalSource;

/// One tick's worth of measurements handed to the position controller.
///
/// The `*_filtered` fields are produced by an external low-pass stage and are read-only here.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensingSample {
    pub angle_deg: f32,
    pub speed_deg_per_s: f32,

    pub angle_filtered_deg: f32,
    pub speed_filtered_deg_per_s: f32,
    pub speed_super_filtered_deg_per_s: f32,
}

impl SensingSample {
    /// Build a sample whose filtered fields mirror the raw measurement.
    pub fn unfiltered(angle_deg: f32, speed_deg_per_s: f32) -> Self {
        Self {
            angle_deg,
            speed_deg_per_s,
            angle_filtered_deg: angle_deg,
            speed_filtered_deg_per_s: speed_deg_per_s,
            speed_super_filtered_deg_per_s: speed_deg_per_s,
        }
    }

    /// Angle as seen through `source`. There is no super-filtered angle; it maps to filtered.
    #[inline]
    pub fn angle(&self, source: SignalSource) -> f32 {
        match source {
            SignalSource::Raw => self.angle_deg,
            SignalSource::Filtered | SignalSource::SuperFiltered => self.angle_filtered_deg,
        }
    }

    /// Speed as seen through `source`.
    #[inline]
    pub fn speed(&self, source: SignalSource) -> f32 {
        match source {
            SignalSource::Raw => self.speed_deg_per_s,
            SignalSource::Filtered => self.speed_filtered_deg_per_s,
            SignalSource::SuperFiltered => self.speed_super_filtered_deg_per_s,
        }
    }
}

/// Common polling interface of both encoder back-ends.
pub trait AngleSensor {
    type Error;

    /// Unbounded shaft angle (deg).
    fn angle_deg(&mut self) -> Result<f32, Self::Error>;

    /// Speed since the previous call (deg/s). Call exactly once per sampling interval.
    fn speed_deg_per_s(&mut self, time_step_s: f32) -> Result<f32, Self::Error>;
}

/// Seam for the external low-pass filter that fills in the `*_filtered` fields.
pub trait SampleFilter {
    fn filter(&mut self, angle_deg: f32, speed_deg_per_s: f32) -> SensingSample;
}

/// Pass-through filter: filtered fields equal the raw measurement.
#[derive(Copy, Clone, Debug, Default)]
pub struct Unfiltered;

impl SampleFilter for Unfiltered {
    #[inline]
    fn filter(&mut self, angle_deg: f32, speed_deg_per_s: f32) -> SensingSample {
        SensingSample::unfiltered(angle_deg, speed_deg_per_s)
    }
}

/// Speed from two successive positions. Non-positive or non-finite steps give zero.
#[inline]
pub(crate) fn rate(delta_deg: f32, time_step_s: f32) -> Option<f32> {
    if time_step_s.is_finite() && time_step_s > 0.0 {
        Some(delta_deg / time_step_s)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_selection() {
        let s = SensingSample {
            angle_deg: 1.0,
            speed_deg_per_s: 2.0,
            angle_filtered_deg: 3.0,
            speed_filtered_deg_per_s: 4.0,
            speed_super_filtered_deg_per_s: 5.0,
        };
        assert_eq!(s.angle(SignalSource::Raw), 1.0);
        assert_eq!(s.angle(SignalSource::Filtered), 3.0);
        assert_eq!(s.speed(SignalSource::Raw), 2.0);
        assert_eq!(s.speed(SignalSource::Filtered), 4.0);
        assert_eq!(s.speed(SignalSource::SuperFiltered), 5.0);
    }

    #[test]
    fn unfiltered_mirrors_raw() {
        let s = Unfiltered.filter(12.5, -30.0);
        assert_eq!(s.angle_filtered_deg, 12.5);
        assert_eq!(s.speed_super_filtered_deg_per_s, -30.0);
    }

    #[test]
    fn rate_rejects_bad_steps() {
        assert_eq!(rate(1.0, 0.0), None);
        assert_eq!(rate(1.0, -0.1), None);
        assert_eq!(rate(1.0, f32::NAN), None);
        assert_eq!(rate(1.0, 0.5), Some(2.0));
    }
}
