// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-driven quadrature decoding.
//!
//! The decoder is split in two halves:
//!
//! - [`QuadratureState`] lives in a `static` and is advanced by the edge interrupt through
//!   [`QuadratureState::on_edge`]. It only does integer work.
//! - [`QuadratureEncoder`] is owned by the control loop and converts the shared count into an
//!   angle (deg) and a speed (deg/s).
//!
//! Typical usage pattern:
//!
//! ```ignore
//! static QUAD: QuadratureState = QuadratureState::new();
//!
//! // In the EXTI handler for either channel:
//! QUAD.on_edge(a_is_high, b_is_high);
//!
//! // In the control loop:
//! let mut enc = QuadratureEncoder::new(&QUAD, QuadratureConfig::default());
//! enc.start(&mut pins);
//! loop {
//!     let angle = enc.get_angle();
//!     let speed = enc.get_speed(0.001);
//! }
//! ```

use core::convert::Infallible;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::config::QuadratureConfig;
use crate::sensing::{rate, AngleSensor, SharedCount};

/// One of the four A/B level patterns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Phase {
    /// A high, B high
    A = 1,
    /// A high, B low
    B = 2,
    /// A low, B low
    C = 3,
    /// A low, B high
    D = 4,
}

impl Phase {
    /// Map channel levels (`true` = high) to a phase.
    #[inline]
    pub fn from_levels(a: bool, b: bool) -> Self {
        match (a, b) {
            (true, true) => Phase::A,
            (true, false) => Phase::B,
            (false, false) => Phase::C,
            (false, true) => Phase::D,
        }
    }

    /// Channel levels that produce this phase.
    #[inline]
    pub fn levels(self) -> (bool, bool) {
        match self {
            Phase::A => (true, true),
            Phase::B => (true, false),
            Phase::C => (false, false),
            Phase::D => (false, true),
        }
    }

    #[inline]
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(Phase::A),
            2 => Some(Phase::B),
            3 => Some(Phase::C),
            4 => Some(Phase::D),
            _ => None,
        }
    }

    /// Successor in the counting-up cycle A -> B -> C -> D -> A.
    #[inline]
    pub fn next(self) -> Self {
        match self {
            Phase::A => Phase::B,
            Phase::B => Phase::C,
            Phase::C => Phase::D,
            Phase::D => Phase::A,
        }
    }

    /// Predecessor in the counting-up cycle.
    #[inline]
    pub fn prev(self) -> Self {
        match self {
            Phase::A => Phase::D,
            Phase::B => Phase::A,
            Phase::C => Phase::B,
            Phase::D => Phase::C,
        }
    }
}

/// Classification of one observed phase change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// One quarter-cycle up.
    Forward,
    /// One quarter-cycle down.
    Backward,
    /// Same phase again, or no previous phase to compare with.
    Hold,
    /// Two quarter-cycles in one edge: an edge was missed and the direction is unknown.
    Skipped,
}

impl Transition {
    /// Classify `previous -> current`.
    #[inline]
    pub fn between(previous: Option<Phase>, current: Phase) -> Self {
        match previous {
            None => Transition::Hold,
            Some(p) if p == current => Transition::Hold,
            Some(p) if p.next() == current => Transition::Forward,
            Some(p) if p.prev() == current => Transition::Backward,
            Some(_) => Transition::Skipped,
        }
    }
}

/// Decoder state shared with the edge interrupt.
///
/// The interrupt is the only writer of every field. A skipped transition leaves the count
/// untouched (the direction cannot be recovered) and is tallied in `missed_edges`.
pub struct QuadratureState {
    count: SharedCount,
    /// 0 until the first phase is observed.
    phase: AtomicU8,
    missed: AtomicU32,
}

impl QuadratureState {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// State whose counter starts from a known value.
    pub const fn starting_at(count: i32) -> Self {
        Self {
            count: SharedCount::new(count),
            phase: AtomicU8::new(0),
            missed: AtomicU32::new(0),
        }
    }

    /// Edge interrupt body. Reads both channel levels (`true` = high) and steps the counter.
    #[inline]
    pub fn on_edge(&self, a: bool, b: bool) {
        let current = Phase::from_levels(a, b);
        let previous = Phase::from_bits(self.phase.load(Ordering::Relaxed));

        match Transition::between(previous, current) {
            Transition::Forward => self.count.store(self.count.fetch().wrapping_add(1)),
            Transition::Backward => self.count.store(self.count.fetch().wrapping_sub(1)),
            Transition::Skipped => {
                let missed = self.missed.load(Ordering::Relaxed);
                self.missed.store(missed.wrapping_add(1), Ordering::Relaxed);
            }
            Transition::Hold => {}
        }

        self.phase.store(current as u8, Ordering::Relaxed);
    }

    /// Record the current phase without counting. Must run before edge interrupts are enabled.
    #[inline]
    pub fn latch(&self, a: bool, b: bool) {
        self.phase
            .store(Phase::from_levels(a, b) as u8, Ordering::Relaxed);
    }

    /// Raw signed count.
    #[inline]
    pub fn count(&self) -> i32 {
        self.count.fetch()
    }

    /// Last observed phase, if any.
    #[inline]
    pub fn phase(&self) -> Option<Phase> {
        Phase::from_bits(self.phase.load(Ordering::Relaxed))
    }

    /// Number of skipped transitions seen so far.
    #[inline]
    pub fn missed_edges(&self) -> u32 {
        self.missed.load(Ordering::Relaxed)
    }
}

impl Default for QuadratureState {
    fn default() -> Self {
        Self::new()
    }
}

/// Board hook for the two encoder channels.
pub trait QuadratureInputs {
    /// Current `(A, B)` levels, `true` = high.
    fn levels(&mut self) -> (bool, bool);

    /// Attach change-triggered (both edges) interrupts to both channels.
    fn enable_edge_interrupts(&mut self);
}

/// Control-loop side of the quadrature decoder.
pub struct QuadratureEncoder<'a> {
    state: &'a QuadratureState,
    degrees_per_count: f32,

    /// Raw count that maps to 0°.
    zero_count: i32,
    /// Raw count at the previous `get_speed` call.
    previous_count: i32,
    /// Missed-edge tally already reported.
    reported_missed: u32,
}

impl<'a> QuadratureEncoder<'a> {
    pub fn new(state: &'a QuadratureState, config: QuadratureConfig) -> Self {
        let count = state.count();
        Self {
            state,
            degrees_per_count: config.degrees_per_count(),
            zero_count: 0,
            previous_count: count,
            reported_missed: state.missed_edges(),
        }
    }

    /// Latch the current channel phase and attach the edge interrupts.
    pub fn start<P: QuadratureInputs>(&mut self, inputs: &mut P) {
        let (a, b) = inputs.levels();
        self.state.latch(a, b);
        self.previous_count = self.state.count();
        inputs.enable_edge_interrupts();
        debug!("quadrature started in phase {}", Phase::from_levels(a, b) as u8);
    }

    /// Signed count relative to the zero point.
    #[inline]
    pub fn position(&self) -> i32 {
        self.state.count().wrapping_sub(self.zero_count)
    }

    /// Unbounded shaft angle (deg).
    #[inline]
    pub fn get_angle(&self) -> f32 {
        self.position() as f32 * self.degrees_per_count
    }

    /// Speed over the interval since the previous call (deg/s).
    ///
    /// Mutates the count snapshot, so it must be called exactly once per sampling interval. A
    /// non-positive or non-finite `time_step_s` returns 0.0 and keeps the snapshot.
    pub fn get_speed(&mut self, time_step_s: f32) -> f32 {
        self.report_missed_edges();

        let count = self.state.count();
        let delta = count.wrapping_sub(self.previous_count);
        match rate(delta as f32 * self.degrees_per_count, time_step_s) {
            Some(speed) => {
                self.previous_count = count;
                speed
            }
            None => 0.0,
        }
    }

    /// Make the current position read as 0°.
    pub fn zero(&mut self) {
        let count = self.state.count();
        self.zero_count = count;
        self.previous_count = count;
    }

    /// Skipped transitions observed so far.
    #[inline]
    pub fn missed_edges(&self) -> u32 {
        self.state.missed_edges()
    }

    #[inline]
    pub fn degrees_per_count(&self) -> f32 {
        self.degrees_per_count
    }

    fn report_missed_edges(&mut self) {
        let missed = self.state.missed_edges();
        if missed != self.reported_missed {
            warn!(
                "quadrature: {} edge(s) missed, {} total",
                missed.wrapping_sub(self.reported_missed),
                missed
            );
            self.reported_missed = missed;
        }
    }
}

impl AngleSensor for QuadratureEncoder<'_> {
    type Error = Infallible;

    #[inline]
    fn angle_deg(&mut self) -> Result<f32, Self::Error> {
        Ok(self.get_angle())
    }

    #[inline]
    fn speed_deg_per_s(&mut self, time_step_s: f32) -> Result<f32, Self::Error> {
        Ok(self.get_speed(time_step_s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Feed a phase sequence through the edge handler and return the count delta.
    fn decode(seq: &[Phase]) -> i32 {
        let state = QuadratureState::new();
        let before = state.count();
        for p in seq {
            let (a, b) = p.levels();
            state.on_edge(a, b);
        }
        state.count().wrapping_sub(before)
    }

    fn forward_cycle(quarters: usize) -> [Phase; 64] {
        let mut seq = [Phase::A; 64];
        let mut p = Phase::A;
        for slot in seq.iter_mut().take(quarters + 1) {
            *slot = p;
            p = p.next();
        }
        seq
    }

    struct FakeInputs {
        levels: (bool, bool),
        enabled: bool,
    }

    impl QuadratureInputs for FakeInputs {
        fn levels(&mut self) -> (bool, bool) {
            self.levels
        }

        fn enable_edge_interrupts(&mut self) {
            self.enabled = true;
        }
    }

    #[test]
    fn level_table() {
        assert_eq!(Phase::from_levels(true, true), Phase::A);
        assert_eq!(Phase::from_levels(true, false), Phase::B);
        assert_eq!(Phase::from_levels(false, false), Phase::C);
        assert_eq!(Phase::from_levels(false, true), Phase::D);
        assert_eq!(Phase::A as u8, 1);
        assert_eq!(Phase::D as u8, 4);
    }

    #[test]
    fn forward_cycle_counts_up() {
        // First entry only seeds the phase, every following one is a quarter-cycle.
        for quarters in [1usize, 3, 4, 9, 40] {
            let seq = forward_cycle(quarters);
            assert_eq!(decode(&seq[..=quarters]), quarters as i32);
        }
    }

    #[test]
    fn reverse_is_exact_negation() {
        for quarters in [1usize, 4, 7, 63] {
            let seq = forward_cycle(quarters);
            let fwd = &seq[..=quarters];
            let mut rev = [Phase::A; 64];
            for (dst, src) in rev.iter_mut().zip(fwd.iter().rev()) {
                *dst = *src;
            }
            assert_eq!(decode(&rev[..=quarters]), -decode(fwd));
        }
    }

    #[test]
    fn skipped_transition_is_lossy_and_tallied() {
        let state = QuadratureState::new();
        for p in [Phase::A, Phase::B, Phase::D, Phase::A] {
            let (a, b) = p.levels();
            state.on_edge(a, b);
        }
        // A->B counts, B->D is skipped, D->A counts.
        assert_eq!(state.count(), 2);
        assert_eq!(state.missed_edges(), 1);
        assert_eq!(state.phase(), Some(Phase::A));
    }

    #[test]
    fn repeated_phase_holds() {
        let state = QuadratureState::new();
        for _ in 0..5 {
            state.on_edge(true, false);
        }
        assert_eq!(state.count(), 0);
        assert_eq!(state.missed_edges(), 0);
    }

    #[test]
    fn counter_wraps() {
        let state = QuadratureState::starting_at(i32::MAX);
        state.latch(true, true);
        state.on_edge(true, false);
        assert_eq!(state.count(), i32::MIN);
    }

    #[test]
    fn angle_scale_exact() {
        let bits = 12u8;
        let config = QuadratureConfig {
            resolution_bits: bits,
        };
        let n = 1i32 << bits;
        for c in [0, 1, n - 1, n, -1] {
            let state = QuadratureState::starting_at(c);
            let enc = QuadratureEncoder::new(&state, config);
            assert_eq!(enc.get_angle(), c as f32 * 360.0 / n as f32);
        }
        let state = QuadratureState::starting_at(n);
        assert_eq!(QuadratureEncoder::new(&state, config).get_angle(), 360.0);
    }

    #[test]
    fn start_latches_phase_and_enables() {
        let state = QuadratureState::new();
        let mut enc = QuadratureEncoder::new(&state, QuadratureConfig::default());
        let mut inputs = FakeInputs {
            levels: (false, false),
            enabled: false,
        };
        enc.start(&mut inputs);
        assert!(inputs.enabled);
        assert_eq!(state.phase(), Some(Phase::C));

        // The very first edge is decoded against the latched phase.
        state.on_edge(false, true);
        assert_eq!(enc.position(), 1);
    }

    #[test]
    fn speed_uses_snapshot() {
        let state = QuadratureState::new();
        let mut enc = QuadratureEncoder::new(&state, QuadratureConfig::default());
        state.latch(true, true);

        let mut p = Phase::A;
        for _ in 0..16 {
            p = p.next();
            let (a, b) = p.levels();
            state.on_edge(a, b);
        }
        // 16 counts of 360/4096 deg over 10 ms.
        assert_relative_eq!(enc.get_speed(0.01), 16.0 * 360.0 / 4096.0 / 0.01, epsilon = 1e-3);
        // No motion since the last call.
        assert_eq!(enc.get_speed(0.01), 0.0);
    }

    #[test]
    fn speed_across_counter_wrap() {
        let state = QuadratureState::starting_at(i32::MAX - 1);
        let mut enc = QuadratureEncoder::new(&state, QuadratureConfig::default());
        state.latch(true, true);

        let mut p = Phase::A;
        for _ in 0..4 {
            p = p.next();
            let (a, b) = p.levels();
            state.on_edge(a, b);
        }
        assert_eq!(state.count(), i32::MIN + 2);
        assert_relative_eq!(enc.get_speed(0.01), 4.0 * 360.0 / 4096.0 / 0.01, epsilon = 1e-3);
    }

    #[test]
    fn bad_time_step_keeps_snapshot() {
        let state = QuadratureState::new();
        let mut enc = QuadratureEncoder::new(&state, QuadratureConfig::default());
        state.latch(true, true);
        state.on_edge(false, true);
        state.on_edge(false, false);

        assert_eq!(enc.get_speed(0.0), 0.0);
        assert_relative_eq!(enc.get_speed(1.0), -2.0 * 360.0 / 4096.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_rebases_angle() {
        let state = QuadratureState::starting_at(100);
        let mut enc = QuadratureEncoder::new(&state, QuadratureConfig::default());
        enc.zero();
        assert_eq!(enc.get_angle(), 0.0);
        state.latch(true, true);
        state.on_edge(true, false);
        assert_eq!(enc.position(), 1);
    }

    #[test]
    fn sensor_trait_is_infallible() {
        let state = QuadratureState::starting_at(1024);
        let mut enc = QuadratureEncoder::new(&state, QuadratureConfig::default());
        assert_eq!(enc.angle_deg(), Ok(90.0));
    }
}
