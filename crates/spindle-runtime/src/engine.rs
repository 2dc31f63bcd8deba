#![forbid(unsafe_code)]

//! The composition root: host events in, render values out.
//!
//! [`Engine`] owns the full engine state and the four-phase pipeline that
//! transforms it each tick:
//!
//! - **Input** folds queued drag/wheel events into the motion state;
//!   guarded by the `INTERACTED` flag so idle frames skip it entirely.
//! - **Simulate** advances the friction integrator one fixed step.
//! - **Render** interpolates the render offset, runs the loop
//!   virtualizer, and refreshes visibility records.
//! - **Cleanup** clears the per-tick interaction flag.
//!
//! The Input and Simulate phases run once per fixed step owed by the
//! scheduler; Render and Cleanup run once per display frame with the
//! interpolation alpha.
//!
//! The engine emits values, never markup: the host reads the scroll
//! offset, per-slot assignments, and visibility transitions and applies
//! them however it renders. A 16-bit-lane bitmap is reserved for future
//! protocol state and deliberately unused.

use spindle_core::{
    Axis, BitSet16, DragTracker, EngineFlags, GestureEvent, GesturePhase, LayoutMetrics,
    MotionIntegrator, MotionState, PointerSample, SlotPool, ViewportRect, WheelNormalizer,
};
use tracing::{debug, info};

use crate::config::{ConfigError, EngineConfig};
use crate::pipeline::{Phase, PhaseBuilder, Pipeline};
use crate::scheduler::{FrameScheduler, TimeParams};
use crate::sequencer::{SequenceDirection, SequenceHandle, SequencerError, StepFn, TaskSequencer};
use crate::virtualizer::LoopVirtualizer;
use crate::visibility::{VisibilityRecord, VisibilityTracker};

/// Word count of the reserved protocol bitmap: 65,535 16-bit lanes cover
/// the full logical cell space.
const PROTOCOL_WORDS: usize = 65_535;

/// Everything a host event can say to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Pointer pressed.
    PointerDown(PointerSample),
    /// Pointer moved while (possibly) pressed.
    PointerMove(PointerSample),
    /// Pointer released.
    PointerUp(PointerSample),
    /// Pointer capture lost; treated as a release.
    PointerCancel(PointerSample),
    /// Wheel tick.
    Wheel {
        /// Horizontal wheel delta.
        delta_x: f64,
        /// Vertical wheel delta.
        delta_y: f64,
        /// Host display-clock timestamp.
        timestamp_ms: f64,
    },
    /// The host surface was resized.
    Resize(ViewportRect),
    /// The host surface became visible or hidden.
    Visibility(bool),
}

/// One slot's current content assignment, for the host to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    /// Pool identity.
    pub real_index: usize,
    /// Logical content index.
    pub virtual_index: i64,
    /// Wrap copy: -1, 0, or +1.
    pub viewport_offset: i8,
}

/// The shared state threaded by value through every phase function.
#[derive(Debug, Clone)]
pub struct EngineState {
    /// The single scroll axis motion record.
    pub motion: MotionState,
    /// Friction integrator for the Simulate phase.
    pub integrator: MotionIntegrator,
    /// Layout bundle; replaced wholesale on resize.
    pub metrics: LayoutMetrics,
    /// The pooled slots.
    pub pool: SlotPool,
    /// Seam detection and remapping.
    pub virtualizer: LoopVirtualizer,
    /// Per-slot enter/exit detection.
    pub tracker: VisibilityTracker,
    /// Per-tick dirty flags.
    pub flags: EngineFlags,
    /// Drag events queued since the last Input phase.
    pub drag_events: Vec<GestureEvent>,
    /// Wheel events queued since the last Input phase.
    pub wheel_events: Vec<GestureEvent>,
    /// Reserved protocol bitmap; allocated, never consulted yet.
    pub protocol: BitSet16,
}

impl EngineState {
    fn new(config: &EngineConfig, viewport: ViewportRect) -> Self {
        let metrics = LayoutMetrics::compute(&config.layout, viewport);
        Self {
            motion: MotionState::new(),
            integrator: MotionIntegrator::new(config.friction),
            pool: SlotPool::new(metrics.total_slots),
            virtualizer: LoopVirtualizer::new(config.joint_safety),
            tracker: VisibilityTracker::new(&metrics, config.joint_safety),
            metrics,
            flags: EngineFlags::empty(),
            drag_events: Vec::new(),
            wheel_events: Vec::new(),
            protocol: BitSet16::empty(PROTOCOL_WORDS),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase functions
// ---------------------------------------------------------------------------

fn process_drag(mut state: EngineState, _t: &TimeParams) -> EngineState {
    let events = std::mem::take(&mut state.drag_events);
    for event in events {
        match event.phase {
            GesturePhase::Initialize => state.motion.velocity = 0.0,
            GesturePhase::Update => state.motion.current += event.delta,
            GesturePhase::Finalize => state.motion.velocity = event.delta,
        }
    }
    state
}

fn process_wheel(mut state: EngineState, _t: &TimeParams) -> EngineState {
    let events = std::mem::take(&mut state.wheel_events);
    for event in events {
        state.motion.velocity = event.delta;
    }
    state
}

fn integrate(mut state: EngineState, t: &TimeParams) -> EngineState {
    state.integrator.advance(&mut state.motion, t.dt);
    state
}

fn lerp(mut state: EngineState, t: &TimeParams) -> EngineState {
    state.motion.interpolate(t.alpha);
    state
}

fn virtualize(mut state: EngineState, _t: &TimeParams) -> EngineState {
    let metrics = state.metrics;
    state
        .virtualizer
        .tick(&mut state.motion, &metrics, &mut state.pool);
    state
}

fn track_visibility(mut state: EngineState, _t: &TimeParams) -> EngineState {
    let offset = state.motion.offset;
    state.tracker.tick(offset, &state.pool);
    state
}

fn clear_interaction(mut state: EngineState, _t: &TimeParams) -> EngineState {
    // A frame can owe zero fixed steps; queued events must keep the flag
    // raised until an Input phase has actually drained them.
    if state.drag_events.is_empty() && state.wheel_events.is_empty() {
        state.flags.remove(EngineFlags::INTERACTED);
    }
    state
}

fn is_interacted(state: &EngineState) -> bool {
    state.flags.contains(EngineFlags::INTERACTED)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Composition root owning state, pipelines, gesture trackers, and the
/// frame scheduler.
pub struct Engine {
    config: EngineConfig,
    scheduler: FrameScheduler,
    /// Input + Simulate, run once per owed fixed step.
    update_pipeline: Pipeline<EngineState, TimeParams>,
    /// Render + Cleanup, run once per display frame.
    render_pipeline: Pipeline<EngineState, TimeParams>,
    drag: DragTracker,
    wheel: WheelNormalizer,
    sequencer: TaskSequencer,
    state: Option<EngineState>,
}

impl Engine {
    /// Build an engine for the given config and initial viewport.
    ///
    /// # Errors
    /// Fails eagerly on an invalid fps or friction, an empty viewport, or
    /// a bad sequencer capacity.
    pub fn new(config: EngineConfig, viewport: ViewportRect) -> Result<Self, ConfigError> {
        config.validate()?;
        if viewport.is_empty() {
            return Err(ConfigError::EmptyViewport);
        }
        let scheduler = FrameScheduler::new(config.fps)?;
        let sequencer = TaskSequencer::new(config.sequencer_capacity)
            .map_err(|_| ConfigError::InvalidSequencerCapacity(config.sequencer_capacity))?;

        let update_pipeline = Pipeline::merge(vec![
            PhaseBuilder::new(Phase::Input)
                .run_if(is_interacted)
                .add(process_drag)
                .add(process_wheel)
                .runner(),
            PhaseBuilder::new(Phase::Simulate).add(integrate).runner(),
        ]);
        let render_pipeline = Pipeline::merge(vec![
            PhaseBuilder::new(Phase::Render)
                .add(lerp)
                .add(virtualize)
                .add(track_visibility)
                .runner(),
            PhaseBuilder::new(Phase::Cleanup).add(clear_interaction).runner(),
        ]);

        let state = EngineState::new(&config, viewport);
        Ok(Self {
            drag: DragTracker::new(Axis::Vertical, config.gesture),
            wheel: WheelNormalizer::new(Axis::Vertical),
            config,
            scheduler,
            update_pipeline,
            render_pipeline,
            sequencer,
            state: Some(state),
        })
    }

    /// Begin consuming frames.
    pub fn start(&mut self) {
        info!(fps = self.config.fps, "engine start");
        self.scheduler.start();
    }

    /// Stop consuming frames. Idempotent.
    pub fn stop(&mut self) {
        info!("engine stop");
        self.scheduler.stop();
    }

    /// Whether frames are currently consumed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Stop and drop all queued input. Deferred groups are not drained;
    /// cancel them individually if their work must not survive a restart.
    pub fn shutdown(&mut self) {
        self.stop();
        self.drag.reset();
        if let Some(state) = &mut self.state {
            state.drag_events.clear();
            state.wheel_events.clear();
            state.flags = EngineFlags::empty();
        }
    }

    /// Feed one host event into the engine.
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::PointerDown(sample) => {
                let gesture = self.drag.pointer_down(sample);
                self.queue_drag(gesture);
                self.with_flags(|flags| flags.insert(EngineFlags::GESTURE_RUNNING));
            }
            HostEvent::PointerMove(sample) => {
                if let Some(gesture) = self.drag.pointer_move(sample) {
                    self.queue_drag(gesture);
                }
            }
            HostEvent::PointerUp(sample) | HostEvent::PointerCancel(sample) => {
                let gesture = self.drag.pointer_up(sample);
                self.queue_drag(gesture);
                self.with_flags(|flags| flags.remove(EngineFlags::GESTURE_RUNNING));
            }
            HostEvent::Wheel {
                delta_x, delta_y, ..
            } => {
                let gesture = self.wheel.wheel(delta_x, delta_y);
                if let Some(state) = &mut self.state {
                    state.wheel_events.push(gesture);
                    state.flags.insert(EngineFlags::INTERACTED);
                }
            }
            HostEvent::Resize(viewport) => self.resize(viewport),
            HostEvent::Visibility(visible) => self.scheduler.set_visible(visible),
        }
    }

    /// Consume one display callback. Returns whether a frame ran.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> bool {
        let Some(plan) = self.scheduler.on_frame(timestamp_ms) else {
            return false;
        };
        let Some(mut state) = self.state.take() else {
            return false;
        };

        let step = TimeParams {
            t: timestamp_ms,
            dt: self.scheduler.fixed_step_ms(),
            alpha: 0.0,
        };
        for _ in 0..plan.steps {
            state = self.update_pipeline.run(state, &step);
        }

        let render = TimeParams {
            alpha: plan.alpha,
            ..step
        };
        state = self.render_pipeline.run(state, &render);

        self.state = Some(state);
        self.sequencer.tick();
        true
    }

    /// The interpolated scroll offset for the host to apply.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.state.as_ref().map_or(0.0, |s| s.motion.offset)
    }

    /// Whether residual motion has decayed below the settle threshold.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.as_ref().is_none_or(|s| s.motion.is_settled())
    }

    /// The current layout bundle.
    #[must_use]
    pub fn metrics(&self) -> Option<&LayoutMetrics> {
        self.state.as_ref().map(|s| &s.metrics)
    }

    /// Current per-slot content assignments.
    #[must_use]
    pub fn slot_assignments(&self) -> Vec<SlotAssignment> {
        let Some(state) = &self.state else {
            return Vec::new();
        };
        state
            .pool
            .slots()
            .iter()
            .map(|s| SlotAssignment {
                real_index: s.real_index,
                virtual_index: s.virtual_index,
                viewport_offset: s.viewport_offset,
            })
            .collect()
    }

    /// Drain the visibility transitions observed since the last call.
    pub fn take_visibility_records(&mut self) -> Vec<VisibilityRecord> {
        self.state
            .as_mut()
            .map_or_else(Vec::new, |s| s.tracker.take_records())
    }

    /// Whether the just-finished interaction was a drag rather than a
    /// click. Consuming clears the flag.
    pub fn take_click_suppression(&mut self) -> bool {
        self.drag.take_click_suppression()
    }

    /// Defer a group of steps to future frames, one step per frame.
    ///
    /// # Errors
    /// Returns [`SequencerError::Full`] when the ring is out of slots.
    pub fn enqueue_deferred(
        &mut self,
        steps: Vec<StepFn>,
        direction: SequenceDirection,
    ) -> Result<SequenceHandle, SequencerError> {
        self.sequencer.enqueue(steps, direction)
    }

    /// Skip a deferred group's remaining steps.
    pub fn cancel_deferred(&mut self, handle: SequenceHandle) {
        self.sequencer.cancel(handle);
    }

    fn queue_drag(&mut self, gesture: GestureEvent) {
        if let Some(state) = &mut self.state {
            state.drag_events.push(gesture);
            state.flags.insert(EngineFlags::INTERACTED);
        }
    }

    fn with_flags(&mut self, f: impl FnOnce(&mut EngineFlags)) {
        if let Some(state) = &mut self.state {
            f(&mut state.flags);
        }
    }

    /// Rebuild all layout-derived state wholesale. Partial updates do not
    /// exist; an empty rectangle is ignored.
    fn resize(&mut self, viewport: ViewportRect) {
        if viewport.is_empty() {
            debug!(?viewport, "ignoring empty resize");
            return;
        }
        debug!(?viewport, "rebuilding layout state");
        self.state = Some(EngineState::new(&self.config, viewport));
        self.drag.reset();
    }
}
