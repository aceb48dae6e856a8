// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Continuous angle from a bounded `[0, 360)` reading.
//!
//! A jump from within `margin` of the top of the range to within `margin` of the bottom is a
//! forward wrap (+360°), and the mirror image is a backward wrap (-360°). Any other jump is
//! taken at face value. This assumes successive samples are close together: a genuine
//! rotation of more than `360 - 2 * margin` degrees between two samples is misread.

use crate::config::WRAP_MARGIN_DEG;

const FULL_TURN_DEG: f32 = 360.0;

/// Running unwrapper for a single-turn absolute angle.
#[derive(Copy, Clone, Debug)]
pub struct AngleUnwrapper {
    margin_deg: f32,
    previous_raw_deg: Option<f32>,
    accumulated_deg: f32,
    /// Net boundary crossings (+1 forward, -1 backward).
    crossings: i32,
}

impl AngleUnwrapper {
    pub fn new(margin_deg: f32) -> Self {
        Self {
            margin_deg,
            previous_raw_deg: None,
            accumulated_deg: 0.0,
            crossings: 0,
        }
    }

    /// Feed a raw reading in `[0, 360)` and return the unwrapped angle.
    ///
    /// The first reading seeds the accumulator.
    pub fn update(&mut self, raw_deg: f32) -> f32 {
        let previous = match self.previous_raw_deg {
            Some(previous) => previous,
            None => {
                self.previous_raw_deg = Some(raw_deg);
                self.accumulated_deg = raw_deg;
                return self.accumulated_deg;
            }
        };

        let top = FULL_TURN_DEG - self.margin_deg;
        let mut delta = raw_deg - previous;

        if previous > top && raw_deg < self.margin_deg {
            delta += FULL_TURN_DEG;
            self.crossings = self.crossings.wrapping_add(1);
            trace!("unwrap: forward crossing, {} turns", self.crossings);
        } else if previous < self.margin_deg && raw_deg > top {
            delta -= FULL_TURN_DEG;
            self.crossings = self.crossings.wrapping_sub(1);
            trace!("unwrap: backward crossing, {} turns", self.crossings);
        }

        self.accumulated_deg += delta;
        self.previous_raw_deg = Some(raw_deg);
        self.accumulated_deg
    }

    /// Last unwrapped angle (deg). Zero before the first reading.
    #[inline]
    pub fn angle_deg(&self) -> f32 {
        self.accumulated_deg
    }

    #[inline]
    pub fn crossings(&self) -> i32 {
        self.crossings
    }

    /// Forget history; the next reading re-seeds the accumulator.
    pub fn reset(&mut self) {
        self.previous_raw_deg = None;
        self.accumulated_deg = 0.0;
        self.crossings = 0;
    }
}

impl Default for AngleUnwrapper {
    fn default() -> Self {
        Self::new(WRAP_MARGIN_DEG)
    }
}
