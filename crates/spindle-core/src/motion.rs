#![forbid(unsafe_code)]

//! 1D scroll motion state and fixed-tick friction integration.
//!
//! [`MotionState`] is the single mutable record every phase of the engine
//! reads or writes: gestures fold deltas into `current`, the integrator
//! advances `current`/`previous`/`velocity` once per fixed tick, the
//! virtualizer jump-translates all positional scalars at a wrap seam, and
//! render output reads only `offset`.
//!
//! The integrator applies exponential friction decay:
//!
//!   decay = 1 − (1 − friction)^(dt / 1000)
//!   v'    = v × (1 − decay)
//!
//! With the default friction of 0.75, the per-tick factor at 60 Hz is
//! `0.25^(1/60) ≈ 0.977`, so a velocity of 8 decays below the settle
//! threshold in roughly 290 fixed ticks (just under five seconds).
//!
//! # Invariants
//!
//! 1. `offset` is always a convex interpolation between `previous` and
//!    `current` (written by [`MotionState::interpolate`] with alpha in
//!    [0.0, 1.0]).
//! 2. Velocity decay is monotonic and never changes sign: `(1 − decay)` is
//!    in (0.0, 1.0) for any positive dt and friction in (0.0, 1.0).
//! 3. [`MotionState::translate`] shifts the four positional scalars
//!    together and leaves `velocity`/`direction` untouched, so a wrap jump
//!    cannot perturb the simulation.

/// Friction coefficient applied per simulated second.
pub const DEFAULT_FRICTION: f64 = 0.75;

/// Velocity magnitude below which motion counts as settled.
pub const SETTLE_THRESHOLD: f64 = 0.01;

/// Sign of a displacement: -1, 0, or +1.
///
/// Unlike `f64::signum`, a zero displacement maps to 0.
#[inline]
#[must_use]
fn sign(n: f64) -> i8 {
    if n > 0.0 {
        1
    } else if n < 0.0 {
        -1
    } else {
        0
    }
}

/// Mutable record of one axis of scroll motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// Position after the most recent fixed tick.
    pub current: f64,
    /// Position before the most recent fixed tick.
    pub previous: f64,
    /// Interpolated render position (the only field render code reads).
    pub offset: f64,
    /// Position the motion is heading toward.
    pub target: f64,
    /// Residual velocity in units per fixed tick.
    pub velocity: f64,
    /// Sign of the last displacement: -1, 0, or +1.
    pub direction: i8,
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionState {
    /// A motion state at rest at the strip origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: 0.0,
            previous: 0.0,
            offset: 0.0,
            target: 0.0,
            velocity: 0.0,
            direction: 1,
        }
    }

    /// Shift all positional scalars by a uniform delta.
    ///
    /// Used by the loop virtualizer to jump-correct position at a wrap seam;
    /// the shift is invisible because every positional field moves together.
    pub fn translate(&mut self, delta: f64) {
        self.current += delta;
        self.previous += delta;
        self.offset += delta;
        self.target += delta;
    }

    /// Write the interpolated render position for the given blend factor.
    ///
    /// `alpha` is the scheduler's accumulator remainder in [0.0, 1.0]:
    /// 0.0 renders at `previous`, 1.0 renders at `current`.
    pub fn interpolate(&mut self, alpha: f64) {
        self.offset = self.current * alpha + self.previous * (1.0 - alpha);
    }

    /// Whether residual velocity has decayed below [`SETTLE_THRESHOLD`].
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.velocity.abs() < SETTLE_THRESHOLD
    }

    /// Reset every field to the initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Advances a [`MotionState`] once per fixed simulation tick.
#[derive(Debug, Clone, Copy)]
pub struct MotionIntegrator {
    friction: f64,
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self::new(DEFAULT_FRICTION)
    }
}

impl MotionIntegrator {
    /// Create an integrator with the given friction coefficient.
    ///
    /// Friction is clamped to (0.0, 1.0) exclusive; values outside that
    /// range would either never decay or decay instantly.
    #[must_use]
    pub fn new(friction: f64) -> Self {
        Self {
            friction: friction.clamp(f64::EPSILON, 1.0 - f64::EPSILON),
        }
    }

    /// The active friction coefficient.
    #[inline]
    #[must_use]
    pub const fn friction(&self) -> f64 {
        self.friction
    }

    /// Advance the state by one fixed tick of `dt_ms` milliseconds.
    ///
    /// Pure with respect to everything but `state`; called exactly once per
    /// fixed tick and never skipped.
    pub fn advance(&self, state: &mut MotionState, dt_ms: f64) {
        let decay = 1.0 - (1.0 - self.friction).powf(dt_ms / 1000.0);
        let integrated = state.velocity * (1.0 - decay);
        let displacement = state.current + integrated - state.previous;

        state.velocity = integrated;
        state.previous = state.current;
        state.current += integrated;
        state.direction = sign(displacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT_60HZ: f64 = 1000.0 / 60.0;

    #[test]
    fn initial_state_is_at_rest() {
        let state = MotionState::new();
        assert_eq!(state.current, 0.0);
        assert_eq!(state.velocity, 0.0);
        assert_eq!(state.direction, 1);
        assert!(state.is_settled());
    }

    #[test]
    fn translate_shifts_positions_only() {
        let mut state = MotionState {
            current: 10.0,
            previous: 8.0,
            offset: 9.0,
            target: 12.0,
            velocity: 2.0,
            direction: 1,
        };
        state.translate(-100.0);

        assert_eq!(state.current, -90.0);
        assert_eq!(state.previous, -92.0);
        assert_eq!(state.offset, -91.0);
        assert_eq!(state.target, -88.0);
        assert_eq!(state.velocity, 2.0);
        assert_eq!(state.direction, 1);
    }

    #[test]
    fn interpolate_is_convex() {
        let mut state = MotionState {
            current: 20.0,
            previous: 10.0,
            ..MotionState::new()
        };

        state.interpolate(0.0);
        assert_eq!(state.offset, 10.0);
        state.interpolate(1.0);
        assert_eq!(state.offset, 20.0);
        state.interpolate(0.25);
        assert!((state.offset - 12.5).abs() < 1e-12);
    }

    #[test]
    fn one_tick_matches_closed_form() {
        // Scenario: current=100, previous=100, velocity=8, friction=0.75,
        // dt=16.67ms.
        let mut state = MotionState {
            current: 100.0,
            previous: 100.0,
            velocity: 8.0,
            direction: 1,
            ..MotionState::new()
        };
        let integrator = MotionIntegrator::new(0.75);
        integrator.advance(&mut state, 16.67);

        let expected_velocity = 8.0 * (1.0 - 0.75_f64).powf(16.67 / 1000.0);
        assert!((state.velocity - expected_velocity).abs() < 1e-6);
        assert!((state.current - (100.0 + expected_velocity)).abs() < 1e-6);
        assert_eq!(state.previous, 100.0);
        assert_eq!(state.direction, 1);
    }

    #[test]
    fn decays_to_settled_within_bounded_ticks() {
        let mut state = MotionState {
            velocity: 8.0,
            ..MotionState::new()
        };
        let integrator = MotionIntegrator::new(0.75);

        let mut ticks = 0;
        while !state.is_settled() {
            integrator.advance(&mut state, DT_60HZ);
            ticks += 1;
            assert!(ticks < 1000, "velocity never settled");
        }
        // Closed form: n > ln(v0 / threshold) / -ln(0.25^(dt/1000)),
        // which is ~289.3 for v0=8, friction 0.75, dt=16.67ms.
        assert!((285..=295).contains(&ticks), "settled in {ticks} ticks");
    }

    #[test]
    fn direction_is_zero_at_rest() {
        let mut state = MotionState::new();
        let integrator = MotionIntegrator::default();
        integrator.advance(&mut state, DT_60HZ);
        assert_eq!(state.direction, 0);
    }

    #[test]
    fn negative_velocity_yields_negative_direction() {
        let mut state = MotionState {
            velocity: -5.0,
            ..MotionState::new()
        };
        let integrator = MotionIntegrator::default();
        integrator.advance(&mut state, DT_60HZ);
        assert_eq!(state.direction, -1);
        assert!(state.current < 0.0);
    }

    proptest! {
        /// Repeated integration drives |velocity| below the settle threshold
        /// in a bounded number of ticks, and velocity never changes sign.
        #[test]
        fn friction_converges_without_sign_change(
            v0 in 0.011_f64..1000.0,
            friction in 0.05_f64..0.95,
            flip in proptest::bool::ANY,
        ) {
            let v0 = if flip { -v0 } else { v0 };
            let mut state = MotionState { velocity: v0, ..MotionState::new() };
            let integrator = MotionIntegrator::new(friction);

            let start_sign = v0.signum();
            let mut ticks = 0_u32;
            while !state.is_settled() {
                integrator.advance(&mut state, DT_60HZ);
                ticks += 1;
                prop_assert!(ticks < 100_000, "did not converge");
                if state.velocity != 0.0 {
                    prop_assert_eq!(state.velocity.signum(), start_sign);
                }
            }
        }

        /// Velocity magnitude is monotonically non-increasing.
        #[test]
        fn velocity_decay_is_monotonic(v0 in -500.0_f64..500.0) {
            let mut state = MotionState { velocity: v0, ..MotionState::new() };
            let integrator = MotionIntegrator::default();

            let mut last = state.velocity.abs();
            for _ in 0..100 {
                integrator.advance(&mut state, DT_60HZ);
                prop_assert!(state.velocity.abs() <= last);
                last = state.velocity.abs();
            }
        }
    }
}
