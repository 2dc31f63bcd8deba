#![forbid(unsafe_code)]

//! Ordered, guarded per-tick transform pipeline.
//!
//! Independent systems contribute transform functions to named phases
//! without knowing about each other. A [`PhaseBuilder`] accumulates the
//! functions (and an optional guard predicate) for one phase and freezes
//! them into an immutable [`PhaseRunner`]; [`Pipeline::merge`] sorts the
//! runners by phase identifier and composes them into one executor.
//!
//! # Invariants
//!
//! 1. Phases execute in ascending [`Phase`] order regardless of
//!    registration order.
//! 2. Within a phase, transforms run in registration order, folding the
//!    state left to right.
//! 3. A guardless phase always runs; a declined guard passes the state
//!    through untouched.

use std::fmt;

/// One unit of per-tick work: consumes the state, returns the next state.
pub type TransformFn<S, C> = Box<dyn Fn(S, &C) -> S>;

/// Decides whether a phase runs this tick.
pub type GuardFn<S> = Box<dyn Fn(&S) -> bool>;

/// The four per-tick phases, in execution order.
///
/// The order is load-bearing: input deltas must be folded into motion
/// before the integrator runs, and the integrator must run before the
/// interpolated render offset is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Fold queued input events into the state.
    Input = 0,
    /// Advance the physics simulation one fixed step.
    Simulate = 1,
    /// Derive render output (interpolation, wrap, visibility).
    Render = 2,
    /// Clear per-tick dirty state.
    Cleanup = 3,
}

/// Accumulates the transforms and guard for one phase.
pub struct PhaseBuilder<S, C> {
    phase: Phase,
    transforms: Vec<TransformFn<S, C>>,
    guard: Option<GuardFn<S>>,
}

impl<S, C> PhaseBuilder<S, C> {
    /// Start configuring the given phase.
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            transforms: Vec::new(),
            guard: None,
        }
    }

    /// Append one transform to the phase.
    #[must_use]
    pub fn add(mut self, f: impl Fn(S, &C) -> S + 'static) -> Self {
        self.transforms.push(Box::new(f));
        self
    }

    /// Append a list of transforms, preserving their order.
    #[must_use]
    pub fn pipe(mut self, fs: Vec<TransformFn<S, C>>) -> Self {
        self.transforms.extend(fs);
        self
    }

    /// Gate the whole phase behind a predicate. When the predicate returns
    /// false the phase passes the state through untouched.
    #[must_use]
    pub fn run_if(mut self, predicate: impl Fn(&S) -> bool + 'static) -> Self {
        self.guard = Some(Box::new(predicate));
        self
    }

    /// Freeze into an immutable runner.
    #[must_use]
    pub fn runner(self) -> PhaseRunner<S, C> {
        PhaseRunner {
            phase: self.phase,
            transforms: self.transforms,
            guard: self.guard,
        }
    }
}

/// One frozen phase: identifier, ordered transforms, optional guard.
pub struct PhaseRunner<S, C> {
    phase: Phase,
    transforms: Vec<TransformFn<S, C>>,
    guard: Option<GuardFn<S>>,
}

impl<S, C> PhaseRunner<S, C> {
    /// The phase identifier used for ordering.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the phase: fold the transforms over the state, or pass the state
    /// through when the guard declines.
    pub fn execute(&self, state: S, ctx: &C) -> S {
        if let Some(guard) = &self.guard
            && !guard(&state)
        {
            return state;
        }
        self.transforms.iter().fold(state, |s, f| f(s, ctx))
    }
}

impl<S, C> fmt::Debug for PhaseRunner<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseRunner")
            .field("phase", &self.phase)
            .field("transforms", &self.transforms.len())
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// The merged executor: runners sorted by phase, composed sequentially.
pub struct Pipeline<S, C> {
    runners: Vec<PhaseRunner<S, C>>,
}

impl<S, C> Pipeline<S, C> {
    /// Merge runners into one executor, sorted by phase identifier.
    /// Registration order is irrelevant.
    #[must_use]
    pub fn merge(mut runners: Vec<PhaseRunner<S, C>>) -> Self {
        runners.sort_by_key(|r| r.phase);
        Self { runners }
    }

    /// Run every phase in order over the state.
    pub fn run(&self, state: S, ctx: &C) -> S {
        self.runners.iter().fold(state, |s, r| r.execute(s, ctx))
    }
}

impl<S, C> fmt::Debug for Pipeline<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("runners", &self.runners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(name: &'static str) -> impl Fn(Vec<&'static str>, &()) -> Vec<&'static str> {
        move |mut state, _| {
            state.push(name);
            state
        }
    }

    #[test]
    fn phases_execute_in_ascending_order() {
        // Registered deliberately out of order.
        let runners = vec![
            PhaseBuilder::new(Phase::Cleanup).add(log("cleanup")).runner(),
            PhaseBuilder::new(Phase::Render).add(log("render")).runner(),
            PhaseBuilder::new(Phase::Input).add(log("input")).runner(),
            PhaseBuilder::new(Phase::Simulate).add(log("simulate")).runner(),
        ];

        let pipeline = Pipeline::merge(runners);
        let trace = pipeline.run(Vec::new(), &());
        assert_eq!(trace, vec!["input", "simulate", "render", "cleanup"]);
    }

    #[test]
    fn transforms_fold_in_registration_order() {
        let runner = PhaseBuilder::new(Phase::Simulate)
            .add(|s: i32, _: &()| s + 1)
            .add(|s, _| s * 10)
            .runner();
        assert_eq!(runner.execute(1, &()), 20);
    }

    #[test]
    fn pipe_appends_in_order() {
        let fns: Vec<TransformFn<Vec<&'static str>, ()>> =
            vec![Box::new(log("a")), Box::new(log("b"))];
        let runner = PhaseBuilder::new(Phase::Input)
            .add(log("first"))
            .pipe(fns)
            .runner();
        assert_eq!(runner.execute(Vec::new(), &()), vec!["first", "a", "b"]);
    }

    #[test]
    fn declined_guard_passes_state_through() {
        let runner = PhaseBuilder::new(Phase::Input)
            .run_if(|_s: &i32| false)
            .add(|s, _: &()| s + 100)
            .runner();
        assert_eq!(runner.execute(7, &()), 7);
    }

    #[test]
    fn guard_sees_current_state() {
        let pipeline = Pipeline::merge(vec![
            PhaseBuilder::new(Phase::Input)
                .add(|s: i32, _: &()| s + 1)
                .runner(),
            PhaseBuilder::new(Phase::Simulate)
                .run_if(|s| *s > 0)
                .add(|s, _| s * 2)
                .runner(),
        ]);
        assert_eq!(pipeline.run(0, &()), 2);
        assert_eq!(pipeline.run(-5, &()), -4);
    }

    #[test]
    fn guardless_phase_always_runs() {
        let runner = PhaseBuilder::new(Phase::Render)
            .add(|s, _: &()| s + 1)
            .runner();
        assert_eq!(runner.execute(0, &()), 1);
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let pipeline: Pipeline<i32, ()> = Pipeline::merge(Vec::new());
        assert_eq!(pipeline.run(42, &()), 42);
    }

    #[test]
    fn context_reaches_every_transform() {
        let runner = PhaseBuilder::new(Phase::Simulate)
            .add(|s: f64, dt: &f64| s + dt)
            .add(|s, dt| s + dt)
            .runner();
        assert!((runner.execute(0.0, &16.0) - 32.0).abs() < 1e-12);
    }
}
